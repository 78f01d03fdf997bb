// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023-2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use super::types::*;
use super::ElfError;

use core::ffi;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// Represents an ELF64 string table ([`Elf64Strtab`]) containing strings
/// used within the ELF file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Strtab<'a> {
    strtab_buf: &'a [u8],
}

impl<'a> Elf64Strtab<'a> {
    /// Creates a new [`Elf64Strtab`] instance from the provided string table buffer
    pub fn new(strtab_buf: &'a [u8]) -> Self {
        Self { strtab_buf }
    }

    /// Retrieves a string from the string table by its index.
    ///
    /// # Returns
    ///
    /// - [`Result<&'a ffi::CStr, ElfError>`]: A [`Result`] containing the string as a CStr reference
    ///   if found, or an [`ElfError`] if the index is out of bounds or the string is not
    ///   NUL-terminated within the table.
    pub fn get_str(&self, index: Elf64Word) -> Result<&'a ffi::CStr, ElfError> {
        let index = usize::try_from(index).map_err(|_| ElfError::InvalidStrtabString)?;
        let tail = self
            .strtab_buf
            .get(index..)
            .filter(|tail| !tail.is_empty())
            .ok_or(ElfError::InvalidStrtabString)?;

        ffi::CStr::from_bytes_until_nul(tail).map_err(|_| ElfError::InvalidStrtabString)
    }
}

/// On-disk layout of an ELF64 symbol table entry.
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawElf64Sym {
    st_name: LeWord,
    st_info: Elf64char,
    st_other: Elf64char,
    st_shndx: LeHalf,
    st_value: LeXword,
    st_size: LeXword,
}

/// Represents an ELF64 symbol ([`Elf64Sym`]) within the symbol table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Elf64Sym {
    /// Name of the symbol as an index into the string table
    pub st_name: Elf64Word,
    /// Symbol type and binding attributes
    pub st_info: Elf64char,
    /// Symbol visibility
    pub st_other: Elf64char,
    /// Section index associated with the symbol
    pub st_shndx: Elf64Half,
    /// Value or address of the symbol
    pub st_value: Elf64Addr,
    /// Size of the symbol in bytes
    pub st_size: Elf64Xword,
}

impl Elf64Sym {
    pub const STT_NOTYPE: Elf64char = 0;
    pub const STT_OBJECT: Elf64char = 1;
    pub const STT_FUNC: Elf64char = 2;
    pub const STT_SECTION: Elf64char = 3;
    /// AMDGPU specific type of HSA kernel entry points (`STT_LOOS`).
    pub const STT_AMDGPU_HSA_KERNEL: Elf64char = 10;

    pub const STB_LOCAL: Elf64char = 0;
    pub const STB_GLOBAL: Elf64char = 1;
    pub const STB_WEAK: Elf64char = 2;

    /// Size of an ELF64 symbol table entry in bytes.
    pub const SIZE: usize = core::mem::size_of::<RawElf64Sym>();

    /// Reads an [`Elf64Sym`] from the provided buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidSymbolEntrySize`] if `buf` is shorter than
    /// [`Self::SIZE`].
    pub fn read(buf: &[u8]) -> Result<Self, ElfError> {
        let (raw, _) =
            RawElf64Sym::read_from_prefix(buf).map_err(|_| ElfError::InvalidSymbolEntrySize)?;
        Ok(Self {
            st_name: raw.st_name.get(),
            st_info: raw.st_info,
            st_other: raw.st_other,
            st_shndx: raw.st_shndx.get(),
            st_value: raw.st_value.get(),
            st_size: raw.st_size.get(),
        })
    }

    /// Builds the `st_info` byte from a binding and a type.
    pub const fn make_info(bind: Elf64char, typ: Elf64char) -> Elf64char {
        (bind << 4) | (typ & 0xf)
    }

    /// The symbol type (`STT_*`).
    pub fn st_type(&self) -> Elf64char {
        self.st_info & 0xf
    }

    /// The symbol binding (`STB_*`).
    pub fn st_bind(&self) -> Elf64char {
        self.st_info >> 4
    }
}

/// Represents an ELF64 symbol table ([`Elf64Symtab`]) containing
/// symbols used within the ELF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Symtab<'a> {
    /// The underlying buffer containing the symbol table data
    syms_buf: &'a [u8],
    /// Size of each symbol entry in bytes
    entsize: usize,
    /// Number of symbols in the symbol table
    syms_num: Elf64Word,
}

impl<'a> Elf64Symtab<'a> {
    /// Indicates an undefined symbol
    pub const STN_UNDEF: Elf64Word = 0;

    /// Creates a new [`Elf64Symtab`] instance from the provided symbol table buffer.
    ///
    /// Trailing bytes not making up a complete entry are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidSymbolEntrySize`] if `entsize` is smaller
    /// than an [`Elf64Sym`], or [`ElfError::InvalidSymbolIndex`] if the
    /// number of entries does not fit an [`Elf64Word`].
    pub fn new(syms_buf: &'a [u8], entsize: Elf64Xword) -> Result<Self, ElfError> {
        let entsize = usize::try_from(entsize).map_err(|_| ElfError::InvalidSymbolEntrySize)?;
        if entsize < Elf64Sym::SIZE {
            return Err(ElfError::InvalidSymbolEntrySize);
        }
        let syms_num = syms_buf.len() / entsize;
        let syms_num = Elf64Word::try_from(syms_num).map_err(|_| ElfError::InvalidSymbolIndex)?;
        Ok(Self {
            syms_buf,
            entsize,
            syms_num,
        })
    }

    /// Number of entries in the table, including the null symbol.
    pub fn len(&self) -> Elf64Word {
        self.syms_num
    }

    pub fn is_empty(&self) -> bool {
        self.syms_num == 0
    }

    /// Reads a symbol from the symbol table by its index.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidSymbolIndex`] if `i` is out of bounds.
    pub fn read_sym(&self, i: Elf64Word) -> Result<Elf64Sym, ElfError> {
        if i >= self.syms_num {
            return Err(ElfError::InvalidSymbolIndex);
        }
        let i = usize::try_from(i).map_err(|_| ElfError::InvalidSymbolIndex)?;
        let sym_off = i
            .checked_mul(self.entsize)
            .ok_or(ElfError::InvalidSymbolIndex)?;
        let sym_buf = self
            .syms_buf
            .get(sym_off..)
            .ok_or(ElfError::InvalidSymbolIndex)?;
        Elf64Sym::read(sym_buf)
    }

    /// Creates an iterator over all entries of the table, in table order.
    pub fn iter(&self) -> Elf64SymIterator<'a> {
        Elf64SymIterator {
            symtab: Some(*self),
            next: 0,
        }
    }
}

/// Iterator over the entries of an [`Elf64Symtab`].
///
/// Copying the iterator captures its position, a copy replays the same
/// sequence of symbols.
#[derive(Debug, Clone, Copy, Default)]
pub struct Elf64SymIterator<'a> {
    symtab: Option<Elf64Symtab<'a>>,
    next: Elf64Word,
}

impl Elf64SymIterator<'_> {
    /// An iterator yielding no symbols, for files without a symbol table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table index of the symbol the next call to `next()` returns.
    pub fn position(&self) -> Elf64Word {
        self.next
    }
}

impl Iterator for Elf64SymIterator<'_> {
    type Item = Elf64Sym;

    fn next(&mut self) -> Option<Self::Item> {
        let symtab = self.symtab.as_ref()?;
        let sym = symtab.read_sym(self.next).ok()?;
        self.next += 1;
        Some(sym)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .symtab
            .as_ref()
            .map_or(0, |symtab| symtab.len().saturating_sub(self.next));
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl core::iter::FusedIterator for Elf64SymIterator<'_> {}
