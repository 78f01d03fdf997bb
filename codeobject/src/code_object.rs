// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

//! Read-only view of an HSA code object.

use crate::config::CodeObjectConfig;
use crate::error::CodeObjectError;
use crate::kernel::{AmdKernelCode, KernelFilter, KernelSym, KernelSymIter};
use crate::note::{
    CodeObjectVersion, ElfNote, IsaNote, NoteIter, AMD_NOTE_NAME, NT_AMDGPU_HSA_CODE_OBJECT_VERSION,
    NT_AMDGPU_HSA_ISA,
};
use crate::view::view_as;
use alloc::vec::Vec;
use core::ffi;
use elf::{Elf64AddrRange, Elf64File, Elf64Off, Elf64Shdr, Elf64Word};

fn find_section(elf: &Elf64File<'_>, name: &str) -> Option<(Elf64Word, Elf64Shdr)> {
    elf.shdrs_iter().find(|(_, shdr)| {
        elf.section_name(shdr)
            .is_ok_and(|sh_name| sh_name.to_bytes() == name.as_bytes())
    })
}

/// Positions of the kernels, computed once when the code object is
/// opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KernelMarkers {
    /// Symbol table indices of the kernel symbols, in table order.
    sym_indices: Vec<Elf64Word>,
    /// Sorted, deduplicated offsets into the text section at which a kernel
    /// starts, followed by the size of the text section.
    code_bounds: Vec<Elf64Off>,
}

impl KernelMarkers {
    fn collect(filter: KernelFilter<'_>, text: Option<Elf64Shdr>, text_name: &str) -> Self {
        let mut markers = Self::default();

        let mut kernels = KernelSymIter::new(filter);
        while let Some(kernel) = kernels.next() {
            markers.sym_indices.push(kernels.position() - 1);

            let Some(text) = text else {
                continue;
            };
            match kernel
                .value()
                .checked_sub(text.sh_addr)
                .filter(|offset| *offset < text.sh_size)
            {
                Some(offset) => markers.code_bounds.push(offset),
                None => log::warn!(
                    "kernel at {:#x} lies outside of section {}",
                    kernel.value(),
                    text_name
                ),
            }
        }

        if let Some(text) = text {
            markers.code_bounds.push(text.sh_size);
            markers.code_bounds.sort_unstable();
            markers.code_bounds.dedup();
        }

        markers
    }
}

/// An HSA code object: an AMDGPU ELF file, its notes, and the kernels its
/// symbol table defines.
///
/// Nothing is copied out of the file buffer. Everything is computed at
/// construction time, so a code object may be shared between threads and
/// traversed concurrently.
#[derive(Debug)]
pub struct HsaCodeObject<'a> {
    elf: Elf64File<'a>,
    config: CodeObjectConfig,
    text_index: Option<Elf64Word>,
    markers: KernelMarkers,
}

impl<'a> HsaCodeObject<'a> {
    /// Parses `buf` as a code object with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::Elf`] if `buf` is not a valid AMDGPU
    /// ELF64 file.
    pub fn read(buf: &'a [u8]) -> Result<Self, CodeObjectError> {
        Self::read_with_config(buf, CodeObjectConfig::default())
    }

    /// Parses `buf` as a code object.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::Elf`] if `buf` is not a valid AMDGPU
    /// ELF64 file.
    pub fn read_with_config(
        buf: &'a [u8],
        config: CodeObjectConfig,
    ) -> Result<Self, CodeObjectError> {
        let elf = Elf64File::read(buf)?;
        Ok(Self::with_config(elf, config))
    }

    /// Wraps an already parsed ELF file.
    pub fn new(elf: Elf64File<'a>) -> Self {
        Self::with_config(elf, CodeObjectConfig::default())
    }

    pub fn with_config(elf: Elf64File<'a>, config: CodeObjectConfig) -> Self {
        let text = find_section(&elf, config.text_section);
        let text_index = text.map(|(index, _)| index);
        let filter = KernelFilter::new(&elf, config.kernel_predicate, text_index);
        let markers =
            KernelMarkers::collect(filter, text.map(|(_, shdr)| shdr), config.text_section);
        log::debug!(
            "code object: {} sections, {} symbols, {} kernels, {} code markers",
            elf.shnum(),
            elf.symtab().map_or(0, |symtab| symtab.len()),
            markers.sym_indices.len(),
            markers.code_bounds.len()
        );
        Self {
            elf,
            config,
            text_index,
            markers,
        }
    }

    pub fn elf(&self) -> &Elf64File<'a> {
        &self.elf
    }

    pub fn config(&self) -> &CodeObjectConfig {
        &self.config
    }

    // Notes

    /// Iterator over the records of the note section. A code object
    /// without a note section has no notes.
    pub fn notes(&self) -> NoteIter<'a> {
        self.note_section()
            .and_then(|shdr| self.section_data(&shdr))
            .map_or_else(|_| NoteIter::end(), NoteIter::new)
    }

    /// The first note with the given name and type.
    pub fn find_note(&self, name: &[u8], note_type: u32) -> Option<ElfNote<'a>> {
        self.notes()
            .find(|note| note.note_type() == note_type && note.name_matches(name))
    }

    /// The code object version recorded by the toolchain.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::NotFound`] if there is no version note and
    /// [`CodeObjectError::TooSmall`] if its description is too short.
    pub fn code_object_version(&self) -> Result<&'a CodeObjectVersion, CodeObjectError> {
        self.find_note(AMD_NOTE_NAME, NT_AMDGPU_HSA_CODE_OBJECT_VERSION)
            .ok_or(CodeObjectError::NotFound)?
            .desc_as()
    }

    /// The instruction set the code object targets.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::NotFound`] if there is no ISA note, or the
    /// error of [`IsaNote::parse`].
    pub fn isa(&self) -> Result<IsaNote<'a>, CodeObjectError> {
        let note = self
            .find_note(AMD_NOTE_NAME, NT_AMDGPU_HSA_ISA)
            .ok_or(CodeObjectError::NotFound)?;
        IsaNote::parse(note.desc())
    }

    // Kernels

    /// The filter classifying this code object's symbols.
    pub fn kernel_filter(&self) -> KernelFilter<'_> {
        KernelFilter::new(&self.elf, self.config.kernel_predicate, self.text_index)
    }

    /// Iterator over the kernel symbols, in symbol table order.
    pub fn kernels(&self) -> KernelSymIter<'_> {
        KernelSymIter::new(self.kernel_filter())
    }

    pub fn kernel_count(&self) -> usize {
        self.markers.sym_indices.len()
    }

    /// Symbol table indices of the kernels, in table order.
    pub fn kernel_indices(&self) -> &[Elf64Word] {
        &self.markers.sym_indices
    }

    /// Offsets into the text section at which kernels start, sorted, with
    /// the size of the text section as the last element. Empty if the code
    /// object has no text section.
    pub fn kernel_markers(&self) -> &[Elf64Off] {
        &self.markers.code_bounds
    }

    /// The `n`-th kernel in symbol table order.
    pub fn kernel_at(&self, n: usize) -> Option<KernelSym> {
        let index = *self.markers.sym_indices.get(n)?;
        let sym = self.elf.symtab()?.read_sym(index).ok()?;
        self.kernel_filter().classify(sym)
    }

    /// # Errors
    ///
    /// Returns [`CodeObjectError::Elf`] if the name is not a valid string
    /// table entry.
    pub fn kernel_name(&self, kernel: &KernelSym) -> Result<&'a ffi::CStr, CodeObjectError> {
        Ok(self.elf.symbol_name(kernel.sym())?)
    }

    /// The `size` bytes of machine code starting at the kernel's address.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::NotFound`] if there is no text section and
    /// [`CodeObjectError::OutOfBounds`] if the kernel does not lie within
    /// its contents.
    pub fn kernel_code(&self, kernel: &KernelSym) -> Result<&'a [u8], CodeObjectError> {
        let text = self.text_section()?;
        let code = Elf64AddrRange::try_from((kernel.value(), kernel.size()))
            .map_err(|_| CodeObjectError::OutOfBounds)?;
        if !text.addr_range()?.contains(&code) {
            return Err(CodeObjectError::OutOfBounds);
        }
        self.text_bytes(&text, code.vaddr_begin - text.sh_addr, code.len())
    }

    /// The bytes from the kernel's address up to the start of the next
    /// kernel in address order, or the end of the text section. Useful
    /// when the recorded symbol size is zero.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::NotFound`] if there is no text section and
    /// [`CodeObjectError::OutOfBounds`] if the kernel does not start within
    /// it.
    pub fn kernel_extent(&self, kernel: &KernelSym) -> Result<&'a [u8], CodeObjectError> {
        let text = self.text_section()?;
        let offset = kernel
            .value()
            .checked_sub(text.sh_addr)
            .filter(|offset| *offset < text.sh_size)
            .ok_or(CodeObjectError::OutOfBounds)?;

        let bounds = &self.markers.code_bounds;
        let next = bounds.partition_point(|bound| *bound <= offset);
        let end = bounds.get(next).copied().unwrap_or(text.sh_size);
        self.text_bytes(&text, offset, end - offset)
    }

    /// The kernel descriptor at the start of the kernel's code.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::kernel_code`], and
    /// [`CodeObjectError::TooSmall`] if the kernel is shorter than a
    /// descriptor.
    pub fn kernel_descriptor(
        &self,
        kernel: &KernelSym,
    ) -> Result<&'a AmdKernelCode, CodeObjectError> {
        view_as(self.kernel_code(kernel)?)
    }

    fn text_bytes(
        &self,
        text: &Elf64Shdr,
        offset: Elf64Off,
        len: u64,
    ) -> Result<&'a [u8], CodeObjectError> {
        let data = self.section_data(text)?;
        let begin = usize::try_from(offset).map_err(|_| CodeObjectError::OutOfBounds)?;
        let len = usize::try_from(len).map_err(|_| CodeObjectError::OutOfBounds)?;
        let end = begin.checked_add(len).ok_or(CodeObjectError::OutOfBounds)?;
        data.get(begin..end).ok_or(CodeObjectError::OutOfBounds)
    }

    // Sections

    /// The first section named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::NotFound`] if there is no such section.
    pub fn section_by_name(&self, name: &str) -> Result<Elf64Shdr, CodeObjectError> {
        find_section(&self.elf, name)
            .map(|(_, shdr)| shdr)
            .ok_or(CodeObjectError::NotFound)
    }

    /// Index of the first section named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::NotFound`] if there is no such section.
    pub fn section_index_by_name(&self, name: &str) -> Result<Elf64Word, CodeObjectError> {
        find_section(&self.elf, name)
            .map(|(index, _)| index)
            .ok_or(CodeObjectError::NotFound)
    }

    pub fn text_section(&self) -> Result<Elf64Shdr, CodeObjectError> {
        self.section_by_name(self.config.text_section)
    }

    pub fn text_section_index(&self) -> Result<Elf64Word, CodeObjectError> {
        self.section_index_by_name(self.config.text_section)
    }

    pub fn note_section(&self) -> Result<Elf64Shdr, CodeObjectError> {
        self.section_by_name(self.config.note_section)
    }

    pub fn note_section_index(&self) -> Result<Elf64Word, CodeObjectError> {
        self.section_index_by_name(self.config.note_section)
    }

    /// File contents of a section. `SHT_NOBITS` sections have none.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::Elf`] if `shdr` does not describe a part
    /// of this file.
    pub fn section_data(&self, shdr: &Elf64Shdr) -> Result<&'a [u8], CodeObjectError> {
        Ok(self.elf.section_data(shdr)?)
    }
}
