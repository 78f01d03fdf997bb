// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

//! Classification of symbol table entries as kernel entry points.

use crate::filter::{ConditionalIter, ItemPredicate};
use core::iter::FusedIterator;
use elf::{Elf64File, Elf64Shdr, Elf64Sym, Elf64SymIterator, Elf64Word};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// Where a symbol is defined, as seen by a [`KernelPredicate`].
#[derive(Debug, Clone, Copy)]
pub struct SymbolPlacement {
    section: Option<(Elf64Word, Elf64Shdr)>,
    text_index: Option<Elf64Word>,
}

impl SymbolPlacement {
    fn of(elf: &Elf64File<'_>, sym: &Elf64Sym, text_index: Option<Elf64Word>) -> Self {
        let shndx = Elf64Word::from(sym.st_shndx);
        let section = if shndx == Elf64Shdr::SHN_UNDEF || shndx >= Elf64Shdr::SHN_LORESERVE {
            None
        } else {
            elf.shdr(shndx).ok().map(|shdr| (shndx, shdr))
        };
        Self {
            section,
            text_index,
        }
    }

    /// Header of the section the symbol is defined in. `None` for
    /// undefined symbols and reserved section indices.
    pub fn shdr(&self) -> Option<&Elf64Shdr> {
        self.section.as_ref().map(|(_, shdr)| shdr)
    }

    /// Index of the section the symbol is defined in.
    pub fn shndx(&self) -> Option<Elf64Word> {
        self.section.map(|(shndx, _)| shndx)
    }

    /// Whether the symbol is defined in the code object's text section.
    pub fn in_text(&self) -> bool {
        self.text_index.is_some() && self.shndx() == self.text_index
    }
}

/// Decides whether a symbol denotes a kernel.
pub type KernelPredicate = fn(&Elf64Sym, &SymbolPlacement) -> bool;

/// The default [`KernelPredicate`]: an `STT_AMDGPU_HSA_KERNEL` symbol
/// defined in the text section. Only these carry a kernel descriptor.
pub fn is_kernel_sym(sym: &Elf64Sym, placement: &SymbolPlacement) -> bool {
    sym.st_type() == Elf64Sym::STT_AMDGPU_HSA_KERNEL && placement.in_text()
}

/// A symbol table entry classified as a kernel entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSym(Elf64Sym);

impl KernelSym {
    /// The underlying symbol table entry.
    pub fn sym(&self) -> &Elf64Sym {
        &self.0
    }

    /// Address of the kernel's first byte.
    pub fn value(&self) -> u64 {
        self.0.st_value
    }

    /// Size of the kernel in bytes, as recorded in the symbol table.
    pub fn size(&self) -> u64 {
        self.0.st_size
    }

    /// Index of the section the kernel is defined in.
    pub fn shndx(&self) -> u16 {
        self.0.st_shndx
    }
}

/// [`ItemPredicate`] selecting the kernel symbols of an ELF file.
#[derive(Debug, Clone, Copy)]
pub struct KernelFilter<'a> {
    elf: &'a Elf64File<'a>,
    predicate: KernelPredicate,
    text_index: Option<Elf64Word>,
}

impl<'a> KernelFilter<'a> {
    /// `text_index` is the index of the section kernel code lives in, if
    /// the file has one.
    pub fn new(
        elf: &'a Elf64File<'a>,
        predicate: KernelPredicate,
        text_index: Option<Elf64Word>,
    ) -> Self {
        Self {
            elf,
            predicate,
            text_index,
        }
    }

    pub fn placement(&self, sym: &Elf64Sym) -> SymbolPlacement {
        SymbolPlacement::of(self.elf, sym, self.text_index)
    }

    /// Returns `sym` as a [`KernelSym`] if it denotes a kernel.
    pub fn classify(&self, sym: Elf64Sym) -> Option<KernelSym> {
        self.matches(&sym).then_some(KernelSym(sym))
    }
}

impl ItemPredicate<Elf64Sym> for KernelFilter<'_> {
    fn matches(&self, sym: &Elf64Sym) -> bool {
        (self.predicate)(sym, &self.placement(sym))
    }
}

/// Iterator over the kernel symbols of a symbol table, in table order.
#[derive(Debug, Clone)]
pub struct KernelSymIter<'a> {
    inner: ConditionalIter<Elf64SymIterator<'a>, KernelFilter<'a>>,
}

impl<'a> KernelSymIter<'a> {
    pub fn new(filter: KernelFilter<'a>) -> Self {
        Self {
            inner: ConditionalIter::new(filter.elf.syms_iter(), filter),
        }
    }

    /// Symbol table index of the symbol that follows the last yielded
    /// kernel.
    pub fn position(&self) -> u32 {
        self.inner.base().position()
    }
}

impl Iterator for KernelSymIter<'_> {
    type Item = KernelSym;

    fn next(&mut self) -> Option<KernelSym> {
        self.inner.next().map(KernelSym)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl FusedIterator for KernelSymIter<'_> {}

/// Size of the AMD kernel code header placed at the start of each kernel.
pub const AMD_KERNEL_CODE_SIZE: usize = 256;

/// The fixed-layout kernel descriptor (`amd_kernel_code_t`) at the start
/// of a kernel's code. Its fields are not interpreted here, it is exposed
/// as raw bytes.
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct AmdKernelCode {
    raw: [u8; AMD_KERNEL_CODE_SIZE],
}

impl AmdKernelCode {
    pub fn as_bytes(&self) -> &[u8; AMD_KERNEL_CODE_SIZE] {
        &self.raw
    }
}
