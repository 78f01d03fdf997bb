// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

//! Iteration over buffers of back-to-back, self-describing records of
//! varying size.

use crate::error::CodeObjectError;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr;

/// A record type whose encoded size is determined by its own header.
pub trait VarSizeRecord<'a>: Sized {
    /// The smallest number of bytes from which [`Self::total_size`] can be
    /// computed. Must be non-zero.
    const MIN_SIZE: usize;

    /// Number of bytes the record starting at `buf` occupies, including
    /// trailing padding. Only called with `buf.len() >= MIN_SIZE`, and the
    /// result must be at least `MIN_SIZE`. Implementations saturate
    /// instead of overflowing.
    fn total_size(buf: &[u8]) -> usize;

    /// Parses the record at the start of `buf`, which is known to hold at
    /// least `total_size(buf)` bytes.
    fn parse(buf: &'a [u8]) -> Result<Self, CodeObjectError>;
}

/// Forward iterator over the records of type `T` packed into a buffer.
///
/// The iterator only views the buffer; copying it captures the current
/// position, and iterating a copy reproduces the same records. Iteration
/// ends at the first record whose claimed size exceeds the remaining bytes,
/// without yielding it.
pub struct VarSizeIter<'a, T> {
    buf: &'a [u8],
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: VarSizeRecord<'a>> VarSizeIter<'a, T> {
    /// Creates an iterator over the records in `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            _record: PhantomData,
        }
    }

    /// The end iterator, viewing no bytes.
    pub fn end() -> Self {
        Self::new(&[])
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.buf
    }

    fn record_size(&self) -> Option<usize> {
        if self.buf.len() < T::MIN_SIZE {
            return None;
        }
        let size = T::total_size(self.buf);
        debug_assert!(size >= T::MIN_SIZE && size > 0);
        Some(size.max(T::MIN_SIZE))
    }

    /// Whether a complete record starts at the current position.
    pub fn valid(&self) -> bool {
        self.record_size().is_some_and(|size| self.buf.len() >= size)
    }

    /// Whether a record header starts at the current position but claims
    /// more bytes than remain. Shorter leftovers, such as section alignment
    /// padding, are not truncated records.
    pub fn truncated(&self) -> bool {
        self.record_size().is_some_and(|size| self.buf.len() < size)
    }

    /// Returns the record at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`CodeObjectError::Truncated`] if no complete record starts
    /// at the current position, including at the end.
    pub fn get(&self) -> Result<T, CodeObjectError> {
        if !self.valid() {
            return Err(CodeObjectError::Truncated);
        }
        T::parse(self.buf)
    }

    /// Moves past the current record. An invalid position turns into the
    /// end iterator, and the end iterator stays where it is.
    pub fn advance(&mut self) {
        match self.record_size() {
            Some(size) if self.buf.len() >= size => {
                self.buf = &self.buf[size.min(self.buf.len())..];
            }
            _ => self.buf = &[],
        }
    }
}

impl<'a, T: VarSizeRecord<'a>> Iterator for VarSizeIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.get() {
            Ok(record) => {
                self.advance();
                Some(record)
            }
            Err(err) => {
                if self.truncated() {
                    log::warn!(
                        "stopping record iteration with {} bytes left: {}",
                        self.buf.len(),
                        err
                    );
                } else if !self.buf.is_empty() {
                    log::debug!("ignoring {} trailing bytes", self.buf.len());
                }
                self.buf = &[];
                None
            }
        }
    }
}

impl<'a, T: VarSizeRecord<'a>> FusedIterator for VarSizeIter<'a, T> {}

impl<T> Clone for VarSizeIter<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for VarSizeIter<'_, T> {}

/// Two iterators are equal when both are at the end, or when they view the
/// same number of bytes at the same address.
impl<T> PartialEq for VarSizeIter<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.buf.len() == other.buf.len()
            && (self.buf.is_empty() || ptr::eq(self.buf.as_ptr(), other.buf.as_ptr()))
    }
}

impl<T> Eq for VarSizeIter<'_, T> {}

impl<T> fmt::Debug for VarSizeIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VarSizeIter")
            .field("remaining", &self.buf.len())
            .finish()
    }
}
