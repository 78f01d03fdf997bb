// SPDX-License-Identifier: (GPL-2.0-or-later OR MIT)
//
// Copyright (c) 2023 SUSE LLC
//
// vim: ts=4 sw=4 et

use zerocopy::byteorder::{LittleEndian, U16, U32, U64};

pub type Elf64Addr = u64;
pub type Elf64Off = u64;
pub type Elf64Half = u16;
pub type Elf64Word = u32;
pub type Elf64Xword = u64;
pub type Elf64char = u8;

/// On-disk little-endian encodings of the scalar ELF64 types.
pub(crate) type LeHalf = U16<LittleEndian>;
pub(crate) type LeWord = U32<LittleEndian>;
pub(crate) type LeXword = U64<LittleEndian>;
