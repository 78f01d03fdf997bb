// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use crate::error::CodeObjectError;
use core::mem::size_of;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// Views the leading `size_of::<D>()` bytes of `bytes` as a `D`.
///
/// The returned reference borrows from `bytes`, nothing is copied. `D` has
/// to be [`Unaligned`], so the view never depends on where the buffer
/// happens to be placed in memory; use the little-endian types from
/// [`zerocopy::byteorder`] for multi-byte fields.
///
/// # Errors
///
/// Returns [`CodeObjectError::TooSmall`] if `bytes` is shorter than `D`.
pub fn view_as<D>(bytes: &[u8]) -> Result<&D, CodeObjectError>
where
    D: FromBytes + KnownLayout + Immutable + Unaligned,
{
    if bytes.len() < size_of::<D>() {
        return Err(CodeObjectError::TooSmall);
    }
    D::ref_from_prefix(bytes)
        .map(|(view, _)| view)
        .map_err(|_| CodeObjectError::TooSmall)
}
