// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use core::fmt;
use elf::ElfError;

/// Errors reported while reading a code object. All of them are expected
/// outcomes for corrupt input and are returned, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeObjectError {
    /// The ELF container itself is malformed.
    Elf(ElfError),
    /// A record claims more bytes than remain in its buffer, or the buffer
    /// is shorter than the record's minimum size.
    Truncated,
    /// A payload is shorter than the type it is to be viewed as.
    TooSmall,
    /// A named section or note is absent.
    NotFound,
    /// A symbol's address range is not contained in its code section.
    OutOfBounds,
}

impl From<ElfError> for CodeObjectError {
    fn from(err: ElfError) -> Self {
        Self::Elf(err)
    }
}

impl fmt::Display for CodeObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elf(err) => write!(f, "malformed code object: {err}"),
            Self::Truncated => write!(f, "truncated code object record"),
            Self::TooSmall => write!(f, "code object payload too small"),
            Self::NotFound => write!(f, "code object section not found"),
            Self::OutOfBounds => write!(f, "symbol outside of its code section"),
        }
    }
}
