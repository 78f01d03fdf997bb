// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023-2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use super::types::*;
use super::ElfError;

/// Represents a 64-bit ELF virtual address range.
///
/// In mathematical notation, the range is [vaddr_begin, vaddr_end)
#[derive(PartialEq, Eq, Debug, Default, Clone, Copy)]
pub struct Elf64AddrRange {
    pub vaddr_begin: Elf64Addr,
    pub vaddr_end: Elf64Addr,
}

impl Elf64AddrRange {
    /// Returns the length of the virtual address range, calculated as the
    /// difference between `vaddr_end` and `vaddr_begin`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use elf::Elf64AddrRange;
    ///
    /// let range = Elf64AddrRange {
    ///     vaddr_begin: 0x1000,
    ///     vaddr_end: 0x1100,
    /// };
    ///
    /// assert_eq!(range.len(), 0x100);
    /// ```
    pub fn len(&self) -> Elf64Xword {
        self.vaddr_end - self.vaddr_begin
    }

    /// Checks if the virtual address range is empty, i.e.
    /// if its length is zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks whether `other` lies completely within this range. An empty
    /// `other` is contained if its start address is within `[vaddr_begin,
    /// vaddr_end]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use elf::Elf64AddrRange;
    ///
    /// let text = Elf64AddrRange::try_from((0x1000, 0x100)).unwrap();
    /// assert!(text.contains(&Elf64AddrRange::try_from((0x1080, 0x80)).unwrap()));
    /// assert!(!text.contains(&Elf64AddrRange::try_from((0x1080, 0x81)).unwrap()));
    /// ```
    pub fn contains(&self, other: &Elf64AddrRange) -> bool {
        self.vaddr_begin <= other.vaddr_begin && other.vaddr_end <= self.vaddr_end
    }
}

impl TryFrom<(Elf64Addr, Elf64Xword)> for Elf64AddrRange {
    type Error = ElfError;

    /// Tries to create an [`Elf64AddrRange`] from a tuple of [`(Elf64Addr, Elf64Xword)`].
    ///
    /// # Errors
    ///
    /// Returns an [`ElfError::InvalidAddressRange`] if the calculation of `vaddr_end`
    /// overflows.
    fn try_from(value: (Elf64Addr, Elf64Xword)) -> Result<Self, Self::Error> {
        let vaddr_begin = value.0;
        let size = value.1;
        let vaddr_end = vaddr_begin
            .checked_add(size)
            .ok_or(ElfError::InvalidAddressRange)?;
        Ok(Self {
            vaddr_begin,
            vaddr_end,
        })
    }
}
