// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

//! Reader for HSA code objects, the AMDGPU ELF files produced by GPU
//! compilers.
//!
//! [`HsaCodeObject`] borrows the file buffer and exposes the records of the
//! note section, the kernel symbols of the symbol table and the machine
//! code of each kernel, all without copying. Malformed input is reported
//! through [`CodeObjectError`] and never panics.

#![no_std]

extern crate alloc;

mod code_object;
mod config;
mod error;
mod filter;
mod kernel;
mod note;
mod varsize;
mod view;

#[cfg(test)]
mod test_utils;

pub use code_object::HsaCodeObject;
pub use config::{CodeObjectConfig, NOTE_SECTION_NAME, TEXT_SECTION_NAME};
pub use error::CodeObjectError;
pub use filter::{ConditionalIter, ItemPredicate};
pub use kernel::{
    is_kernel_sym, AmdKernelCode, KernelFilter, KernelPredicate, KernelSym, KernelSymIter,
    SymbolPlacement, AMD_KERNEL_CODE_SIZE,
};
pub use note::{
    CodeObjectVersion, ElfNote, IsaHeader, IsaNote, NoteIter, AMD_NOTE_NAME,
    NT_AMDGPU_HSA_CODE_OBJECT_VERSION, NT_AMDGPU_HSA_ISA,
};
pub use varsize::{VarSizeIter, VarSizeRecord};
pub use view::view_as;

pub use elf;
