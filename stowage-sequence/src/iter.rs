// Copyright 2026 stowage Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::iter::FusedIterator;

use stowage_common::error::{Error, Result};

use crate::sequence::Sequence;

/// Borrowing iterator over a [`Sequence`], head to tail. Reversible.
#[derive(Debug)]
pub struct Iter<'a, T> {
    sequence: &'a Sequence<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(sequence: &'a Sequence<T>) -> Self {
        Self {
            sequence,
            front: 0,
            back: sequence.len(),
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            sequence: self.sequence,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.sequence.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.sequence.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over a [`Sequence`], head to tail. Reversible.
#[derive(Debug)]
pub struct IterMut<'a, T> {
    front: std::slice::IterMut<'a, Option<T>>,
    back: std::slice::IterMut<'a, Option<T>>,
    remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
    /// `front` is the run starting at the head, `back` the run wrapped to the start of the buffer.
    pub(crate) fn new(front: &'a mut [Option<T>], back: &'a mut [Option<T>], remaining: usize) -> Self {
        Self {
            front: front.iter_mut(),
            back: back.iter_mut(),
            remaining,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = match self.front.next() {
            Some(slot) => slot,
            None => self.back.next()?,
        };
        self.remaining -= 1;
        slot.as_mut()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = match self.back.next_back() {
            Some(slot) => slot,
            None => self.front.next_back()?,
        };
        self.remaining -= 1;
        slot.as_mut()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator over a [`Sequence`], head to tail. Reversible.
#[derive(Debug)]
pub struct IntoIter<T> {
    sequence: Sequence<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(sequence: Sequence<T>) -> Self {
        Self { sequence }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.sequence.try_dequeue()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.sequence.len(), Some(self.sequence.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.sequence.try_drop_last()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

/// A detached, fail-fast position in a [`Sequence`].
///
/// A cursor does not borrow the sequence. It remembers the version of the sequence it was created from, and every
/// call to [`Cursor::next`] checks that version again. Any structural change in between, including capacity changes
/// and clears, turns the next call into an [`stowage_common::error::ErrorKind::Modified`] error.
#[derive(Debug, Clone)]
pub struct Cursor {
    version: u64,
    front: usize,
    back: usize,
    reverse: bool,
}

impl Cursor {
    pub(crate) fn new(version: u64, len: usize, reverse: bool) -> Self {
        Self {
            version,
            front: 0,
            back: len,
            reverse,
        }
    }

    /// Returns the next element, `Ok(None)` when the walk is complete.
    pub fn next<'a, T>(&mut self, sequence: &'a Sequence<T>) -> Result<Option<&'a T>> {
        if sequence.version() != self.version {
            return Err(Error::modified(self.version, sequence.version()));
        }
        if self.front == self.back {
            return Ok(None);
        }
        let index = if self.reverse {
            self.back -= 1;
            self.back
        } else {
            self.front += 1;
            self.front - 1
        };
        Ok(sequence.get(index))
    }

    /// Returns `true` if the cursor walks from tail to head.
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Number of elements the cursor has not visited yet.
    pub fn remaining(&self) -> usize {
        self.back - self.front
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use stowage_common::error::ErrorKind;

    use super::*;
    use crate::sequence::SequenceMode;

    fn wrapped() -> Sequence<u64> {
        let mut sequence = Sequence::<u64>::builder().with_capacity(6).build().unwrap();
        for i in 0..6 {
            sequence.enqueue(i).unwrap();
        }
        sequence.dequeue_range(4).unwrap();
        for i in 6..9 {
            sequence.enqueue(i).unwrap();
        }
        // [6][7][8][ ][4][5]
        sequence
    }

    #[test]
    fn test_iter_wraps() {
        let sequence = wrapped();
        assert_eq!(sequence.head(), 4);
        assert_eq!(sequence.iter().copied().collect_vec(), vec![4, 5, 6, 7, 8]);
        assert_eq!(sequence.iter().rev().copied().collect_vec(), vec![8, 7, 6, 5, 4]);
        assert_eq!(sequence.iter().len(), 5);

        let mut iter = sequence.iter();
        assert_eq!(iter.next(), Some(&4));
        assert_eq!(iter.next_back(), Some(&8));
        assert_eq!(iter.copied().collect_vec(), vec![5, 6, 7]);
    }

    #[test]
    fn test_iter_mut_wraps() {
        let mut sequence = wrapped();
        for item in sequence.iter_mut() {
            *item *= 10;
        }
        assert_eq!(sequence.to_vec(), vec![40, 50, 60, 70, 80]);

        let version = sequence.version();
        let mut iter = sequence.iter_mut();
        assert_eq!(iter.len(), 5);
        *iter.next_back().unwrap() = 0;
        assert_eq!(iter.len(), 4);
        assert_eq!(sequence.to_vec(), vec![40, 50, 60, 70, 0]);
        assert_ne!(sequence.version(), version);
    }

    #[test]
    fn test_into_iter() {
        let sequence = wrapped();
        assert_eq!(sequence.clone().into_iter().collect_vec(), vec![4, 5, 6, 7, 8]);
        assert_eq!(sequence.into_iter().rev().collect_vec(), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_cursor_walks_both_ways() {
        let sequence = Sequence::from_vec(vec!['a', 'b', 'c'], SequenceMode::Stack);

        let mut cursor = sequence.cursor();
        let mut forward = vec![];
        while let Some(c) = cursor.next(&sequence).unwrap() {
            forward.push(*c);
        }
        assert_eq!(forward, vec!['a', 'b', 'c']);
        assert_eq!(cursor.remaining(), 0);

        let mut cursor = sequence.reverse_cursor();
        assert!(cursor.is_reverse());
        let mut backward = vec![];
        while let Some(c) = cursor.next(&sequence).unwrap() {
            backward.push(*c);
        }
        assert_eq!(backward, vec!['c', 'b', 'a']);
    }

    #[test]
    fn test_cursor_fails_after_mutation() {
        let mut sequence = wrapped();

        let mut cursor = sequence.cursor();
        assert_eq!(cursor.next(&sequence).unwrap(), Some(&4));
        sequence.enqueue(9).unwrap();
        let err = cursor.next(&sequence).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Modified);

        let mut cursor = sequence.reverse_cursor();
        assert_eq!(cursor.next(&sequence).unwrap(), Some(&9));
        sequence.set_capacity(sequence.capacity() + 1).unwrap();
        assert_eq!(cursor.next(&sequence).unwrap_err().kind(), ErrorKind::Modified);

        let mut cursor = sequence.cursor();
        sequence.clear();
        assert_eq!(cursor.next(&sequence).unwrap_err().kind(), ErrorKind::Modified);
    }
}
