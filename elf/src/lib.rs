// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023 SUSE LLC
//
// vim: ts=4 sw=4 et

//! Read-only, bounds-checked view of little-endian ELF64 AMDGPU objects:
//! the file header, the section header table, string tables and the
//! symbol table.

#![no_std]

mod addr_range;
mod error;
mod file;
mod file_range;
mod header;
mod section_header;
mod syms;
mod types;

pub use addr_range::Elf64AddrRange;
pub use error::ElfError;
pub use file::Elf64File;
pub use file_range::Elf64FileRange;
pub use header::Elf64Hdr;
pub use section_header::{Elf64Shdr, Elf64ShdrFlags, Elf64ShdrIterator};
pub use syms::{Elf64Strtab, Elf64Sym, Elf64SymIterator, Elf64Symtab};
pub use types::*;

#[cfg(test)]
mod tests;
