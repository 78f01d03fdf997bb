// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023-2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use super::types::*;
use super::ElfError;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// On-disk layout of the ELF64 file header.
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawElf64Hdr {
    e_ident: [Elf64char; 16],
    e_type: LeHalf,
    e_machine: LeHalf,
    e_version: LeWord,
    e_entry: LeXword,
    e_phoff: LeXword,
    e_shoff: LeXword,
    e_flags: LeWord,
    e_ehsize: LeHalf,
    e_phentsize: LeHalf,
    e_phnum: LeHalf,
    e_shentsize: LeHalf,
    e_shnum: LeHalf,
    e_shstrndx: LeHalf,
}

/// Header of the ELF64 file, including fields describing properties such
/// as type, machine architecture and the location of the section header
/// table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Hdr {
    /// An array of 16 bytes representing the ELF identification, including the ELF magic number
    pub e_ident: [Elf64char; 16],
    /// The type of ELF file
    pub e_type: Elf64Half,
    /// The target architecture of the ELF file
    pub e_machine: Elf64Half,
    /// The version of the ELF file
    pub e_version: Elf64Word,
    /// The virtual address of the program entry point
    pub e_entry: Elf64Addr,
    /// The file offset to the start of the program header table
    pub e_phoff: Elf64Off,
    /// The file offset to the start of the section header table
    pub e_shoff: Elf64Off,
    /// Processor-specific flags, for AMDGPU the target GPU and feature bits
    pub e_flags: Elf64Word,
    /// The size of the ELF header
    pub e_ehsize: Elf64Half,
    /// The size of a program header entry
    pub e_phentsize: Elf64Half,
    /// The number of program header entries
    pub e_phnum: Elf64Half,
    /// The size of a section header entry
    pub e_shentsize: Elf64Half,
    /// The number of section header entries (overflowed to a Word-sized entry when needed)
    pub e_shnum: Elf64Word, // The actual Elf64Hdr entry is Elf64Half, on overflow it's read from section
    // table entry zero
    /// The section header table index of the section name string table
    pub e_shstrndx: Elf64Word, // The actual Elf64Hdr entry is Elf64Half, on overflow it's read from section
                               // table entry zero
}

impl Elf64Hdr {
    const EI_MAG0: usize = 0;
    const EI_CLASS: usize = 4;
    const EI_DATA: usize = 5;
    const EI_VERSION: usize = 6;
    const EI_OSABI: usize = 7;
    pub const EI_ABIVERSION: usize = 8;

    const ELFMAG: [Elf64char; 4] = [0x7f, b'E', b'L', b'F'];

    const ELFCLASS64: Elf64char = 2;

    const ELFDATA2LSB: Elf64char = 1;

    pub const ELFOSABI_NONE: Elf64char = 0;
    pub const ELFOSABI_GNU: Elf64char = 3;
    pub const ELFOSABI_AMDGPU_HSA: Elf64char = 64;
    pub const ELFOSABI_AMDGPU_PAL: Elf64char = 65;
    pub const ELFOSABI_AMDGPU_MESA3D: Elf64char = 66;

    pub const ET_REL: Elf64Half = 1;
    pub const ET_EXEC: Elf64Half = 2;
    pub const ET_DYN: Elf64Half = 3;

    pub const EM_AMDGPU: Elf64Half = 224;

    pub const EV_CURRENT: Elf64Word = 1;

    /// Size of the ELF64 header in bytes.
    pub const SIZE: usize = core::mem::size_of::<RawElf64Hdr>();

    /// Reads an ELF64 header from a byte buffer.
    ///
    /// This function reads an ELF64 header from the provided byte buffer and performs various
    /// checks to verify that the file is a little-endian 64-bit AMDGPU object.
    ///
    /// # Errors
    ///
    /// This function may return the following errors:
    ///
    /// - [`ElfError::FileTooShort`]: The provided buffer is too short to contain a valid ELF header.
    /// - [`ElfError::UnrecognizedMagic`]: The ELF magic number in the identification section is unrecognized.
    /// - [`ElfError::UnsupportedClass`]: The ELF file class (64-bit) is not supported.
    /// - [`ElfError::UnsupportedEndianess`]: The endianness of the ELF file is not supported.
    /// - [`ElfError::UnsupportedVersion`]: The version of the ELF file is not supported.
    /// - [`ElfError::UnsupportedOsAbi`]: The ELF file uses an unsupported OS/ABI.
    /// - [`ElfError::UnsupportedType`]: The file is neither relocatable, executable nor shared.
    /// - [`ElfError::UnsupportedMachine`]: The file does not target AMDGPU.
    pub fn read(buf: &[u8]) -> Result<Self, ElfError> {
        // Examine the e_ident[] magic.
        let e_ident = buf
            .get(..16)
            .and_then(|ident| <[Elf64char; 16]>::try_from(ident).ok())
            .ok_or(ElfError::FileTooShort)?;
        if e_ident[Self::EI_MAG0..(Self::EI_MAG0 + Self::ELFMAG.len())] != Self::ELFMAG {
            return Err(ElfError::UnrecognizedMagic);
        } else if e_ident[Self::EI_CLASS] != Self::ELFCLASS64 {
            return Err(ElfError::UnsupportedClass);
        } else if e_ident[Self::EI_DATA] != Self::ELFDATA2LSB {
            return Err(ElfError::UnsupportedEndianess);
        } else if Elf64Word::from(e_ident[Self::EI_VERSION]) != Self::EV_CURRENT {
            return Err(ElfError::UnsupportedVersion);
        } else if !matches!(
            e_ident[Self::EI_OSABI],
            Self::ELFOSABI_NONE
                | Self::ELFOSABI_GNU
                | Self::ELFOSABI_AMDGPU_HSA
                | Self::ELFOSABI_AMDGPU_PAL
                | Self::ELFOSABI_AMDGPU_MESA3D
        ) {
            return Err(ElfError::UnsupportedOsAbi);
        }

        // ELF file is confirmed to be of ELFCLASS64, so the total header size
        // should equal 64 bytes.
        let (raw, _) = RawElf64Hdr::read_from_prefix(buf).map_err(|_| ElfError::FileTooShort)?;

        let e_type = raw.e_type.get();
        let e_machine = raw.e_machine.get();
        let e_version = raw.e_version.get();
        if !matches!(e_type, Self::ET_REL | Self::ET_EXEC | Self::ET_DYN) {
            return Err(ElfError::UnsupportedType);
        }
        if e_machine != Self::EM_AMDGPU {
            return Err(ElfError::UnsupportedMachine);
        }
        if e_version != Self::EV_CURRENT {
            return Err(ElfError::UnsupportedVersion);
        }

        Ok(Self {
            e_ident,
            e_type,
            e_machine,
            e_version,
            e_entry: raw.e_entry.get(),
            e_phoff: raw.e_phoff.get(),
            e_shoff: raw.e_shoff.get(),
            e_flags: raw.e_flags.get(),
            e_ehsize: raw.e_ehsize.get(),
            e_phentsize: raw.e_phentsize.get(),
            e_phnum: raw.e_phnum.get(),
            e_shentsize: raw.e_shentsize.get(),
            e_shnum: Elf64Word::from(raw.e_shnum.get()),
            e_shstrndx: Elf64Word::from(raw.e_shstrndx.get()),
        })
    }

    /// The OS/ABI identification byte.
    pub fn os_abi(&self) -> Elf64char {
        self.e_ident[Self::EI_OSABI]
    }

    /// The ABI version byte; for HSA code objects this encodes the code
    /// object version.
    pub fn abi_version(&self) -> Elf64char {
        self.e_ident[Self::EI_ABIVERSION]
    }
}
