// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023-2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use super::types::*;
use super::ElfError;

/// A byte range within the ELF file buffer, `[offset_begin, offset_end)`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64FileRange {
    pub offset_begin: usize,
    pub offset_end: usize,
}

impl Elf64FileRange {
    /// Number of bytes covered by the range.
    pub fn len(&self) -> usize {
        self.offset_end - self.offset_begin
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<(Elf64Off, Elf64Xword)> for Elf64FileRange {
    type Error = ElfError;

    /// Tries to create an [`Elf64FileRange`] from a tuple of [`(Elf64Off, Elf64Xword)`].
    ///
    /// # Errors
    ///
    /// Returns an [`ElfError::InvalidFileRange`] if either value does not fit
    /// a `usize` or the calculation of `offset_end` overflows.
    fn try_from(value: (Elf64Off, Elf64Xword)) -> Result<Self, Self::Error> {
        let offset_begin = usize::try_from(value.0).map_err(|_| ElfError::InvalidFileRange)?;
        let size = usize::try_from(value.1).map_err(|_| ElfError::InvalidFileRange)?;
        let offset_end = offset_begin
            .checked_add(size)
            .ok_or(ElfError::InvalidFileRange)?;
        Ok(Self {
            offset_begin,
            offset_end,
        })
    }
}
