// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023-2024 SUSE LLC
//
// vim: ts=4 sw=4 et

/// Errors while working with ELF files, e.g. truncated tables, out of
/// bounds section ranges, invalid ELF type or endianness. The
/// [`fmt::Display`] trait is implemented to allow formatting error
/// instances.
///
/// # Examples
///
/// ```rust
/// use elf::ElfError;
///
/// let error = ElfError::InvalidSectionIndex;
/// let error_message = error.to_string();
///
/// assert_eq!(error_message, "invalid ELF section index");
/// ```
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    FileTooShort,

    InvalidAddressRange,
    InvalidAddressAlignment,
    InvalidFileRange,

    UnrecognizedMagic,
    UnsupportedClass,
    UnsupportedEndianess,
    UnsupportedOsAbi,
    UnsupportedType,
    UnsupportedMachine,
    UnsupportedVersion,
    InvalidShdrSize,

    InvalidSectionIndex,
    IncompatibleSectionType,

    InvalidStrtabString,

    InvalidSymbolEntrySize,
    InvalidSymbolIndex,
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileTooShort => {
                write!(f, "ELF file too short")
            }

            Self::InvalidAddressRange => {
                write!(f, "invalid ELF address range")
            }
            Self::InvalidAddressAlignment => {
                write!(f, "invalid ELF address alignment")
            }
            Self::InvalidFileRange => {
                write!(f, "invalid ELF file range")
            }

            Self::UnrecognizedMagic => {
                write!(f, "unrecognized ELF magic")
            }
            Self::UnsupportedClass => {
                write!(f, "unsupported ELF class")
            }
            Self::UnsupportedEndianess => {
                write!(f, "unsupported ELF endianess")
            }
            Self::UnsupportedOsAbi => {
                write!(f, "unsupported ELF ABI")
            }
            Self::UnsupportedType => {
                write!(f, "unsupported ELF file type")
            }
            Self::UnsupportedMachine => {
                write!(f, "unsupported ELF machine")
            }
            Self::UnsupportedVersion => {
                write!(f, "unsupported ELF version")
            }
            Self::InvalidShdrSize => {
                write!(f, "invalid ELF section header size")
            }

            Self::InvalidSectionIndex => {
                write!(f, "invalid ELF section index")
            }
            Self::IncompatibleSectionType => {
                write!(f, "unexpected ELF section type")
            }

            Self::InvalidStrtabString => {
                write!(f, "invalid ELF strtab string")
            }

            Self::InvalidSymbolEntrySize => {
                write!(f, "invalid ELF symbol entry size")
            }
            Self::InvalidSymbolIndex => {
                write!(f, "invalid ELF symbol index")
            }
        }
    }
}
