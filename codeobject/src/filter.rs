// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 SUSE LLC
//
// vim: ts=4 sw=4 et

use core::iter::FusedIterator;

/// A test applied to the items of a [`ConditionalIter`].
pub trait ItemPredicate<T> {
    fn matches(&self, item: &T) -> bool;
}

impl<T, F: Fn(&T) -> bool> ItemPredicate<T> for F {
    fn matches(&self, item: &T) -> bool {
        self(item)
    }
}

/// Iterator adaptor yielding only the items of `I` for which the
/// predicate `P` holds.
///
/// Each call to `next()` consumes as many base items as needed to find
/// the next match, so a full traversal evaluates the predicate once per
/// base item.
#[derive(Debug, Clone)]
pub struct ConditionalIter<I, P> {
    iter: I,
    predicate: P,
}

impl<I, P> ConditionalIter<I, P>
where
    I: Iterator,
    P: ItemPredicate<I::Item>,
{
    pub fn new(iter: I, predicate: P) -> Self {
        Self { iter, predicate }
    }

    /// The underlying iterator, positioned after the last yielded item.
    pub fn base(&self) -> &I {
        &self.iter
    }
}

impl<I, P> Iterator for ConditionalIter<I, P>
where
    I: Iterator,
    P: ItemPredicate<I::Item>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        loop {
            let item = self.iter.next()?;
            if self.predicate.matches(&item) {
                return Some(item);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.iter.size_hint().1)
    }
}

impl<I, P> FusedIterator for ConditionalIter<I, P>
where
    I: FusedIterator,
    P: ItemPredicate<I::Item>,
{
}
