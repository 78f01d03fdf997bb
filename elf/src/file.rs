// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023 SUSE LLC
//
// vim: ts=4 sw=4 et

use super::types::*;
use super::{
    Elf64FileRange, Elf64Hdr, Elf64Shdr, Elf64ShdrIterator, Elf64Strtab, Elf64Sym,
    Elf64SymIterator, Elf64Symtab, ElfError,
};

use core::ffi;

/// This struct represents a parsed 64-bit ELF file. It provides checked
/// access to the file's section table, the section name string table and
/// the symbol table.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Elf64File<'a> {
    /// Buffer containing the ELF file data
    elf_file_buf: &'a [u8],
    /// The ELF file header
    elf_hdr: Elf64Hdr,
    /// The section header string table may not be present
    sh_strtab: Option<Elf64Strtab<'a>>,
    /// The `SHT_SYMTAB` symbol table along with its linked string table
    symtab: Option<(Elf64Symtab<'a>, Elf64Strtab<'a>)>,
}

impl<'a> Elf64File<'a> {
    /// This method takes a byte buffer containing the ELF file data and parses
    /// it into an [`Elf64File`] struct, providing access to the ELF file's information.
    ///
    /// All section headers are verified once here, so that subsequent
    /// accesses only need to check the indices they are passed.
    ///
    /// # Errors
    ///
    /// Returns an [`ElfError`] if there are issues parsing the ELF file.
    pub fn read(elf_file_buf: &'a [u8]) -> Result<Self, ElfError> {
        let mut elf_hdr = Elf64Hdr::read(elf_file_buf)?;

        let shdr_size = usize::from(elf_hdr.e_shentsize);
        if (elf_hdr.e_shoff != 0 || elf_hdr.e_shnum != 0) && shdr_size < Elf64Shdr::SIZE {
            return Err(ElfError::InvalidShdrSize);
        }
        if elf_hdr.e_shnum == 0 && elf_hdr.e_shoff != 0 {
            // The number of section headers is stored in the first section header's
            // ->sh_size member.
            elf_hdr.e_shnum = 1;
            Self::check_section_header_table_bounds(&elf_hdr, elf_file_buf.len())?;
            let shdr0 = Self::read_shdr_from_file(elf_file_buf, &elf_hdr, 0)?;
            elf_hdr.e_shnum =
                Elf64Word::try_from(shdr0.sh_size).map_err(|_| ElfError::InvalidSectionIndex)?;
        }
        Self::check_section_header_table_bounds(&elf_hdr, elf_file_buf.len())?;

        // If ->e_shstrndx == SHN_XINDEX, the actual strndx is stored in first
        // section header table's ->sh_link member.
        if elf_hdr.e_shstrndx == Elf64Shdr::SHN_XINDEX {
            if elf_hdr.e_shnum == 0 {
                return Err(ElfError::InvalidSectionIndex);
            }
            let shdr0 = Self::read_shdr_from_file(elf_file_buf, &elf_hdr, 0)?;
            elf_hdr.e_shstrndx = shdr0.sh_link;
        }
        if elf_hdr.e_shstrndx != Elf64Shdr::SHN_UNDEF && elf_hdr.e_shstrndx >= elf_hdr.e_shnum {
            return Err(ElfError::InvalidSectionIndex);
        }

        let mut sh_strtab = None;
        let mut symtab_shdr = None;
        for i in 0..elf_hdr.e_shnum {
            let shdr = Self::read_shdr_from_file(elf_file_buf, &elf_hdr, i)?;
            Self::verify_shdr(&shdr, elf_file_buf.len(), elf_hdr.e_shnum)?;

            if elf_hdr.e_shstrndx != Elf64Shdr::SHN_UNDEF && i == elf_hdr.e_shstrndx {
                if shdr.sh_type != Elf64Shdr::SHT_STRTAB {
                    return Err(ElfError::IncompatibleSectionType);
                }
                sh_strtab = Some(Elf64Strtab::new(Self::section_buf(elf_file_buf, &shdr)?));
            }

            // Only the first SHT_SYMTAB is considered, there is at most one
            // in well-formed files.
            if shdr.sh_type == Elf64Shdr::SHT_SYMTAB && symtab_shdr.is_none() {
                symtab_shdr = Some(shdr);
            }
        }

        let symtab = match symtab_shdr {
            Some(shdr) => {
                let syms_buf = Self::section_buf(elf_file_buf, &shdr)?;
                let symtab = Elf64Symtab::new(syms_buf, shdr.sh_entsize)?;

                let strtab_shdr = Self::read_shdr_from_file(elf_file_buf, &elf_hdr, shdr.sh_link)?;
                if strtab_shdr.sh_type != Elf64Shdr::SHT_STRTAB {
                    return Err(ElfError::IncompatibleSectionType);
                }
                let strtab = Elf64Strtab::new(Self::section_buf(elf_file_buf, &strtab_shdr)?);
                Some((symtab, strtab))
            }
            None => None,
        };

        Ok(Self {
            elf_file_buf,
            elf_hdr,
            sh_strtab,
            symtab,
        })
    }

    /// Checks if the section header table is within the ELF file bounds.
    ///
    /// # Errors
    ///
    /// Returns an [`Err<ElfError>`] if the section header table is out of bounds.
    fn check_section_header_table_bounds(
        elf_hdr: &Elf64Hdr,
        elf_file_buf_len: usize,
    ) -> Result<(), ElfError> {
        let shdrs_off = usize::try_from(elf_hdr.e_shoff).map_err(|_| ElfError::FileTooShort)?;
        let shdr_size = usize::from(elf_hdr.e_shentsize);
        let shdrs_num = usize::try_from(elf_hdr.e_shnum).map_err(|_| ElfError::FileTooShort)?;
        let shdrs_size = shdrs_num
            .checked_mul(shdr_size)
            .ok_or(ElfError::FileTooShort)?;
        let shdrs_end = shdrs_off
            .checked_add(shdrs_size)
            .ok_or(ElfError::FileTooShort)?;
        if shdrs_end > elf_file_buf_len {
            return Err(ElfError::FileTooShort);
        }
        Ok(())
    }

    /// Reads an ELF Section Header (Shdr) from the provided ELF file buffer
    /// based on the given index `i` and the ELF file header `elf_hdr`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidSectionIndex`] if `i` is not below
    /// `e_shnum`, or [`ElfError::FileTooShort`] if the header lies outside
    /// the buffer.
    fn read_shdr_from_file(
        elf_file_buf: &'a [u8],
        elf_hdr: &Elf64Hdr,
        i: Elf64Word,
    ) -> Result<Elf64Shdr, ElfError> {
        if i >= elf_hdr.e_shnum {
            return Err(ElfError::InvalidSectionIndex);
        }
        let shdrs_off = usize::try_from(elf_hdr.e_shoff).map_err(|_| ElfError::FileTooShort)?;
        let shdr_size = usize::from(elf_hdr.e_shentsize);
        let i = usize::try_from(i).map_err(|_| ElfError::InvalidSectionIndex)?;
        let shdr_off = i
            .checked_mul(shdr_size)
            .and_then(|off| off.checked_add(shdrs_off))
            .ok_or(ElfError::FileTooShort)?;
        let shdr_buf = elf_file_buf
            .get(shdr_off..)
            .ok_or(ElfError::FileTooShort)?;
        Elf64Shdr::read(shdr_buf)
    }

    /// Verifies the integrity of an ELF Section Header (Shdr).
    ///
    /// Beyond [`Elf64Shdr::verify`], this checks that linked section indices
    /// are in range and that the section's content lies within the file.
    ///
    /// # Errors
    ///
    /// Returns an [`Err<ElfError>`] if the Shdr is invalid.
    fn verify_shdr(
        shdr: &Elf64Shdr,
        elf_file_buf_len: usize,
        shnum: Elf64Word,
    ) -> Result<(), ElfError> {
        if shdr.sh_type == Elf64Shdr::SHT_NULL {
            return Ok(());
        }

        shdr.verify()?;

        if shdr.sh_link >= shnum
            || shdr.sh_flags.contains(super::Elf64ShdrFlags::INFO_LINK) && shdr.sh_info >= shnum
        {
            return Err(ElfError::InvalidSectionIndex);
        }

        let file_range = shdr.file_range()?;
        if file_range.offset_end > elf_file_buf_len {
            return Err(ElfError::FileTooShort);
        }

        Ok(())
    }

    fn section_buf(elf_file_buf: &'a [u8], shdr: &Elf64Shdr) -> Result<&'a [u8], ElfError> {
        let range = shdr.file_range()?;
        elf_file_buf
            .get(range.offset_begin..range.offset_end)
            .ok_or(ElfError::FileTooShort)
    }

    /// The parsed ELF file header.
    pub fn header(&self) -> &Elf64Hdr {
        &self.elf_hdr
    }

    /// The whole underlying file buffer.
    pub fn file_buf(&self) -> &'a [u8] {
        self.elf_file_buf
    }

    /// Number of entries in the section header table.
    pub fn shnum(&self) -> Elf64Word {
        self.elf_hdr.e_shnum
    }

    /// Reads the section header at index `i`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidSectionIndex`] if `i` is out of range.
    pub fn shdr(&self, i: Elf64Word) -> Result<Elf64Shdr, ElfError> {
        Self::read_shdr_from_file(self.elf_file_buf, &self.elf_hdr, i)
    }

    /// Creates an iterator over the ELF Section Headers (Shdrs) in the ELF
    /// file, paired with their indices.
    pub fn shdrs_iter(&self) -> Elf64ShdrIterator<'_> {
        Elf64ShdrIterator::new(self)
    }

    /// Looks up the name of a section in the section name string table.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidStrtabString`] if the file has no section
    /// name string table or `sh_name` does not reference a valid string.
    pub fn section_name(&self, shdr: &Elf64Shdr) -> Result<&'a ffi::CStr, ElfError> {
        self.sh_strtab
            .as_ref()
            .ok_or(ElfError::InvalidStrtabString)?
            .get_str(shdr.sh_name)
    }

    /// Returns the file content of a section. `SHT_NOBITS` sections yield an
    /// empty slice.
    ///
    /// # Errors
    ///
    /// Returns an [`ElfError`] if the section's file range is not within the
    /// file buffer, which can only happen for headers not taken from this
    /// file.
    pub fn section_data(&self, shdr: &Elf64Shdr) -> Result<&'a [u8], ElfError> {
        Self::section_buf(self.elf_file_buf, shdr)
    }

    /// Bounds-checked access to raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidFileRange`] if `range` is not within the
    /// file buffer.
    pub fn file_bytes(&self, range: Elf64FileRange) -> Result<&'a [u8], ElfError> {
        self.elf_file_buf
            .get(range.offset_begin..range.offset_end)
            .ok_or(ElfError::InvalidFileRange)
    }

    /// The file's `SHT_SYMTAB` symbol table, if any.
    pub fn symtab(&self) -> Option<&Elf64Symtab<'a>> {
        self.symtab.as_ref().map(|(symtab, _)| symtab)
    }

    /// Creates an iterator over all entries of the symbol table. Files
    /// without a symbol table yield no symbols.
    pub fn syms_iter(&self) -> Elf64SymIterator<'a> {
        self.symtab
            .as_ref()
            .map_or_else(Elf64SymIterator::empty, |(symtab, _)| symtab.iter())
    }

    /// Looks up the name of a symbol in the symbol table's string table.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidStrtabString`] if there is no symbol table
    /// or `st_name` does not reference a valid string.
    pub fn symbol_name(&self, sym: &Elf64Sym) -> Result<&'a ffi::CStr, ElfError> {
        self.symtab
            .as_ref()
            .ok_or(ElfError::InvalidStrtabString)?
            .1
            .get_str(sym.st_name)
    }
}
