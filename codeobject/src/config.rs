// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use crate::kernel::{is_kernel_sym, KernelPredicate};

/// Name of the section holding kernel machine code.
pub const TEXT_SECTION_NAME: &str = ".text";
/// Name of the section holding the code object notes.
pub const NOTE_SECTION_NAME: &str = ".note";

/// Knobs for reading a code object. The defaults match the layout the
/// AMDGPU toolchain produces.
#[derive(Debug, Clone, Copy)]
pub struct CodeObjectConfig {
    /// Section kernel code is resolved against.
    pub text_section: &'static str,
    /// Section the notes are read from.
    pub note_section: &'static str,
    /// Decides which symbols are kernels.
    pub kernel_predicate: KernelPredicate,
}

impl Default for CodeObjectConfig {
    fn default() -> Self {
        Self {
            text_section: TEXT_SECTION_NAME,
            note_section: NOTE_SECTION_NAME,
            kernel_predicate: is_kernel_sym,
        }
    }
}
