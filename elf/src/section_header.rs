// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023-2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use super::types::*;
use super::Elf64AddrRange;
use super::Elf64File;
use super::Elf64FileRange;
use super::ElfError;
use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

bitflags! {
    /// Flags associated with ELF64 section header (e.g.,
    /// writable, executable, contains null-terminated string, etc.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Elf64ShdrFlags : Elf64Xword {
        const WRITE            = 0x001;
        const ALLOC            = 0x002;
        const EXECINSTR        = 0x004;
        const MERGE            = 0x010;
        const STRINGS          = 0x020;
        const INFO_LINK        = 0x040;
        const LINK_ORDER       = 0x080;
        const OS_NONCONFORMING = 0x100;
        const GROUP            = 0x200;
        const TLS              = 0x400;
        const COMPRESSED       = 0x800;
    }
}

/// On-disk layout of an ELF64 section header.
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawElf64Shdr {
    sh_name: LeWord,
    sh_type: LeWord,
    sh_flags: LeXword,
    sh_addr: LeXword,
    sh_offset: LeXword,
    sh_size: LeXword,
    sh_link: LeWord,
    sh_info: LeWord,
    sh_addralign: LeXword,
    sh_entsize: LeXword,
}

/// An ELF64 section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Shdr {
    /// Name of the section as an index into the section name string table
    pub sh_name: Elf64Word,
    pub sh_type: Elf64Word,
    pub sh_flags: Elf64ShdrFlags,
    pub sh_addr: Elf64Addr,
    pub sh_offset: Elf64Off,
    /// Size of the section
    pub sh_size: Elf64Xword,
    /// Link to another section
    pub sh_link: Elf64Word,
    /// Additional section information
    pub sh_info: Elf64Word,
    /// Address alignment constraint
    pub sh_addralign: Elf64Xword,
    /// Size of each entry
    pub sh_entsize: Elf64Xword,
}

impl Elf64Shdr {
    /// Represents an undefined section index
    pub const SHN_UNDEF: Elf64Word = 0;

    /// First index of the reserved section index range
    pub const SHN_LORESERVE: Elf64Word = 0xff00;

    /// Represents an absolute section index
    pub const SHN_ABS: Elf64Word = 0xfff1;

    /// Represents an extended section index
    pub const SHN_XINDEX: Elf64Word = 0xffff;

    /// Represents a null section type
    pub const SHT_NULL: Elf64Word = 0;

    /// Represents a section holding program defined data, e.g. code
    pub const SHT_PROGBITS: Elf64Word = 1;

    /// Represents a symbol table section type
    pub const SHT_SYMTAB: Elf64Word = 2;

    /// Represents a string table section type
    pub const SHT_STRTAB: Elf64Word = 3;

    /// Represents a note section type
    pub const SHT_NOTE: Elf64Word = 7;

    /// Represents a section with no associated data in the ELF file
    pub const SHT_NOBITS: Elf64Word = 8;

    /// Size of an ELF64 section header in bytes.
    pub const SIZE: usize = core::mem::size_of::<RawElf64Shdr>();

    /// Reads a section header from a byte buffer and returns an [`Elf64Shdr`] instance.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidShdrSize`] if `shdr_buf` is shorter than
    /// [`Self::SIZE`].
    pub fn read(shdr_buf: &[u8]) -> Result<Self, ElfError> {
        let (raw, _) =
            RawElf64Shdr::read_from_prefix(shdr_buf).map_err(|_| ElfError::InvalidShdrSize)?;

        Ok(Self {
            sh_name: raw.sh_name.get(),
            sh_type: raw.sh_type.get(),
            sh_flags: Elf64ShdrFlags::from_bits_truncate(raw.sh_flags.get()),
            sh_addr: raw.sh_addr.get(),
            sh_offset: raw.sh_offset.get(),
            sh_size: raw.sh_size.get(),
            sh_link: raw.sh_link.get(),
            sh_info: raw.sh_info.get(),
            sh_addralign: raw.sh_addralign.get(),
            sh_entsize: raw.sh_entsize.get(),
        })
    }

    /// Verifies the integrity of the ELF section header.
    ///
    /// # Errors
    /// Returns an [`Err`] variant of [`ElfError`] if validation fails.
    ///
    /// - If `sh_type` is `SHT_NULL`, the section is considered valid.
    /// - For sections with file content (not `SHT_NOBITS`), it checks the file range.
    /// - For allocated sections (`ALLOC` flag), it checks the address range and alignment.
    /// - Returns [`Ok`] if all checks pass.
    pub fn verify(&self) -> Result<(), ElfError> {
        if self.sh_type == Self::SHT_NULL {
            return Ok(());
        }

        self.file_range()?;

        if self.sh_flags.contains(Elf64ShdrFlags::ALLOC) {
            self.addr_range()?;

            if self.sh_addralign != 0 {
                if !self.sh_addralign.is_power_of_two() {
                    return Err(ElfError::InvalidAddressAlignment);
                }
                if self.sh_addr & (self.sh_addralign - 1) != 0 {
                    return Err(ElfError::InvalidAddressAlignment);
                }
            }
        }

        Ok(())
    }

    /// Returns the file range of the ELF section.
    ///
    /// `SHT_NOBITS` sections occupy no file content, their range is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidFileRange`] if `sh_offset + sh_size` overflows.
    pub fn file_range(&self) -> Result<Elf64FileRange, ElfError> {
        if self.sh_type != Self::SHT_NOBITS {
            Elf64FileRange::try_from((self.sh_offset, self.sh_size))
        } else {
            Elf64FileRange::try_from((self.sh_offset, 0))
        }
    }

    /// Returns the virtual address range covered by the section.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidAddressRange`] if `sh_addr + sh_size` overflows.
    pub fn addr_range(&self) -> Result<Elf64AddrRange, ElfError> {
        Elf64AddrRange::try_from((self.sh_addr, self.sh_size))
    }

    /// Whether the section holds executable machine instructions.
    pub fn is_executable(&self) -> bool {
        self.sh_flags.contains(Elf64ShdrFlags::EXECINSTR)
    }
}

/// Represents an iterator over section headers in an ELF64 file
#[derive(Debug, Clone)]
pub struct Elf64ShdrIterator<'a> {
    /// The ELF64 file from which section headers are being iterated
    elf_file: &'a Elf64File<'a>,
    /// Next index to be retrieved
    next: Elf64Word,
}

impl<'a> Elf64ShdrIterator<'a> {
    /// Creates a new [`Elf64ShdrIterator`] instance for iterating section headers
    /// in an ELF64 file.
    pub fn new(elf_file: &'a Elf64File<'a>) -> Self {
        Self { elf_file, next: 0 }
    }
}

impl Iterator for Elf64ShdrIterator<'_> {
    /// Pairs of section index and section header.
    type Item = (Elf64Word, Elf64Shdr);

    /// Retrieves the next section header from the ELF64 file.
    ///
    /// All section headers were bounds checked when the file was read, so
    /// iteration only ends once `e_shnum` headers have been returned.
    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next;
        if cur >= self.elf_file.shnum() {
            return None;
        }
        self.next += 1;
        self.elf_file.shdr(cur).ok().map(|shdr| (cur, shdr))
    }
}
