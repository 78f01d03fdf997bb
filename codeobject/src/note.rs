// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

//! Records of the code object NOTE section and the typed descriptors the
//! AMDGPU toolchain stores in them.

use crate::error::CodeObjectError;
use crate::varsize::{VarSizeIter, VarSizeRecord};
use crate::view::view_as;
use core::mem::size_of;
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// Note name used by the AMDGPU toolchain.
pub const AMD_NOTE_NAME: &[u8] = b"AMD";

/// Note type of [`CodeObjectVersion`] descriptors.
pub const NT_AMDGPU_HSA_CODE_OBJECT_VERSION: u32 = 1;
/// Note type of [`IsaNote`] descriptors.
pub const NT_AMDGPU_HSA_ISA: u32 = 3;

/// Alignment of the name and description fields.
const NOTE_ALIGN: usize = 4;

fn align_up(n: usize) -> usize {
    n.checked_add(NOTE_ALIGN - 1)
        .map_or(usize::MAX, |n| n & !(NOTE_ALIGN - 1))
}

fn word_to_usize(n: u32) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct NoteHeader {
    n_namesz: U32<LittleEndian>,
    n_descsz: U32<LittleEndian>,
    n_type: U32<LittleEndian>,
}

/// A single record of a NOTE section: a 12 byte header, followed by the
/// name and the description, each padded to a multiple of 4 bytes.
#[derive(Debug, Clone, Copy)]
pub struct ElfNote<'a> {
    hdr: &'a NoteHeader,
    name: &'a [u8],
    desc: &'a [u8],
}

impl<'a> ElfNote<'a> {
    /// Size of the fixed note header.
    pub const HEADER_SIZE: usize = size_of::<NoteHeader>();

    pub fn namesz(&self) -> u32 {
        self.hdr.n_namesz.get()
    }

    pub fn descsz(&self) -> u32 {
        self.hdr.n_descsz.get()
    }

    pub fn note_type(&self) -> u32 {
        self.hdr.n_type.get()
    }

    /// The name, without alignment padding. It usually carries a NUL
    /// terminator.
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// The description, without alignment padding.
    pub fn desc(&self) -> &'a [u8] {
        self.desc
    }

    /// Compares the name against `name`, ignoring trailing NUL bytes on
    /// both sides.
    pub fn name_matches(&self, name: &[u8]) -> bool {
        trim_nul(self.name) == trim_nul(name)
    }

    /// Number of bytes the record occupies, padding included.
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE
            .saturating_add(align_up(self.name.len()))
            .saturating_add(align_up(self.desc.len()))
    }

    /// Views the description as a `D`.
    ///
    /// The caller is responsible for choosing a `D` that matches
    /// [`Self::note_type`]; only the size is checked here.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::TooSmall`] if the description is shorter
    /// than `D`.
    pub fn desc_as<D>(&self) -> Result<&'a D, CodeObjectError>
    where
        D: FromBytes + KnownLayout + Immutable + Unaligned,
    {
        view_as(self.desc)
    }
}

impl<'a> VarSizeRecord<'a> for ElfNote<'a> {
    const MIN_SIZE: usize = Self::HEADER_SIZE;

    fn total_size(buf: &[u8]) -> usize {
        match NoteHeader::ref_from_prefix(buf) {
            Ok((hdr, _)) => Self::HEADER_SIZE
                .saturating_add(align_up(word_to_usize(hdr.n_namesz.get())))
                .saturating_add(align_up(word_to_usize(hdr.n_descsz.get()))),
            Err(_) => Self::MIN_SIZE,
        }
    }

    fn parse(buf: &'a [u8]) -> Result<Self, CodeObjectError> {
        let (hdr, rest) = NoteHeader::ref_from_prefix(buf)
            .map_err(|_| CodeObjectError::Truncated)?;
        let namesz = word_to_usize(hdr.n_namesz.get());
        let descsz = word_to_usize(hdr.n_descsz.get());

        let name = rest.get(..namesz).ok_or(CodeObjectError::Truncated)?;
        let desc = rest
            .get(align_up(namesz)..)
            .and_then(|tail| tail.get(..descsz))
            .ok_or(CodeObjectError::Truncated)?;

        Ok(Self { hdr, name, desc })
    }
}

/// Iterator over the records of a NOTE section.
pub type NoteIter<'a> = VarSizeIter<'a, ElfNote<'a>>;

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let len = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    &bytes[..len]
}

/// Description of a [`NT_AMDGPU_HSA_CODE_OBJECT_VERSION`] note.
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CodeObjectVersion {
    major: U32<LittleEndian>,
    minor: U32<LittleEndian>,
}

impl CodeObjectVersion {
    pub fn major(&self) -> u32 {
        self.major.get()
    }

    pub fn minor(&self) -> u32 {
        self.minor.get()
    }
}

/// Fixed part of a [`NT_AMDGPU_HSA_ISA`] note description. The vendor and
/// architecture names follow it directly.
#[derive(Debug, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct IsaHeader {
    vendor_name_size: U16<LittleEndian>,
    architecture_name_size: U16<LittleEndian>,
    major: U32<LittleEndian>,
    minor: U32<LittleEndian>,
    stepping: U32<LittleEndian>,
}

/// Parsed description of a [`NT_AMDGPU_HSA_ISA`] note.
#[derive(Debug, Clone, Copy)]
pub struct IsaNote<'a> {
    hdr: &'a IsaHeader,
    vendor_name: &'a [u8],
    architecture_name: &'a [u8],
}

impl<'a> IsaNote<'a> {
    /// Parses an ISA note description.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::TooSmall`] if `desc` cannot hold the
    /// fixed header, and [`CodeObjectError::Truncated`] if the names it
    /// declares run past the end of `desc`.
    pub fn parse(desc: &'a [u8]) -> Result<Self, CodeObjectError> {
        let hdr: &IsaHeader = view_as(desc)?;
        let names = &desc[size_of::<IsaHeader>()..];
        let vendor_len = usize::from(hdr.vendor_name_size.get());
        let arch_len = usize::from(hdr.architecture_name_size.get());

        let vendor_name = names.get(..vendor_len).ok_or(CodeObjectError::Truncated)?;
        let architecture_name = names
            .get(vendor_len..vendor_len + arch_len)
            .ok_or(CodeObjectError::Truncated)?;

        Ok(Self {
            hdr,
            vendor_name,
            architecture_name,
        })
    }

    /// Vendor name, trailing NUL bytes removed.
    pub fn vendor_name(&self) -> &'a [u8] {
        trim_nul(self.vendor_name)
    }

    /// Architecture name, trailing NUL bytes removed.
    pub fn architecture_name(&self) -> &'a [u8] {
        trim_nul(self.architecture_name)
    }

    pub fn major(&self) -> u32 {
        self.hdr.major.get()
    }

    pub fn minor(&self) -> u32 {
        self.hdr.minor.get()
    }

    pub fn stepping(&self) -> u32 {
        self.hdr.stepping.get()
    }
}
