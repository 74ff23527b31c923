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

use std::{
    fmt::Debug,
    ops::{Deref, DerefMut},
};

use stowage_common::error::Result;

use crate::sequence::{Sequence, SequenceMode};

/// Callback receiving the batch of elements a [`FixedSequence`] evicts.
pub trait EvictListener<T>: FnMut(Vec<T>) + Send + 'static {}
impl<T, F> EvictListener<T> for F where F: FnMut(Vec<T>) + Send + 'static {}

/// A [`Sequence`] bounded by a maximum size, evicting its oldest elements in batches.
///
/// [`FixedSequence::fixed_add`] adds like [`Sequence::add`]. If the length then exceeds the maximum size,
/// `max(overhead, len - maximum_size)` elements are removed from the oldest end: the head of a queue or the tail of a
/// stack. An overhead of 0 evicts exactly the overflow. The evicted batch, in head-to-tail order, is handed to the
/// evict listener.
///
/// The wrapped sequence stays reachable through `Deref`. Adding through it bypasses the bound until the next
/// `fixed_add` or [`FixedSequence::set_maximum_size`].
pub struct FixedSequence<T> {
    sequence: Sequence<T>,
    maximum_size: usize,
    overhead: usize,
    evict_listener: Option<Box<dyn EvictListener<T>>>,
}

impl<T: Debug> Debug for FixedSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedSequence")
            .field("sequence", &self.sequence)
            .field("maximum_size", &self.maximum_size)
            .field("overhead", &self.overhead)
            .finish()
    }
}

impl<T> FixedSequence<T> {
    /// Create an empty fixed-size sequence.
    pub fn new(maximum_size: usize, overhead: usize, mode: SequenceMode) -> Self {
        Self::with_sequence(Sequence::with_mode(mode), maximum_size, overhead)
    }

    /// Bound an existing sequence. Nothing is evicted until the next add.
    pub fn with_sequence(sequence: Sequence<T>, maximum_size: usize, overhead: usize) -> Self {
        Self {
            sequence,
            maximum_size,
            overhead,
            evict_listener: None,
        }
    }

    /// Set the listener receiving evicted batches.
    pub fn with_evict_listener(mut self, listener: impl EvictListener<T>) -> Self {
        self.evict_listener = Some(Box::new(listener));
        self
    }

    /// Returns the maximum size.
    pub fn maximum_size(&self) -> usize {
        self.maximum_size
    }

    /// Returns the eviction overhead.
    pub fn overhead(&self) -> usize {
        self.overhead
    }

    /// Set the maximum size, evicting right away if the sequence is now too long.
    ///
    /// Returns the number of evicted elements.
    pub fn set_maximum_size(&mut self, maximum_size: usize) -> Result<usize> {
        self.maximum_size = maximum_size;
        self.evict_overflow()
    }

    /// Set the eviction overhead used by later evictions.
    pub fn set_overhead(&mut self, overhead: usize) {
        self.overhead = overhead;
    }

    /// Add an element, then evict if the maximum size is exceeded.
    ///
    /// Returns the number of evicted elements.
    pub fn fixed_add(&mut self, item: T) -> Result<usize> {
        self.sequence.add(item)?;
        self.evict_overflow()
    }

    /// Unwrap the inner sequence.
    pub fn into_inner(self) -> Sequence<T> {
        self.sequence
    }

    fn evict_overflow(&mut self) -> Result<usize> {
        let len = self.sequence.len();
        if len <= self.maximum_size {
            return Ok(0);
        }

        let count = self.overhead.max(len - self.maximum_size).min(len);
        let batch = match self.sequence.mode() {
            SequenceMode::Queue => self.sequence.dequeue_range(count)?,
            SequenceMode::Stack => self.sequence.drop_range(count)?,
        };
        tracing::debug!(
            "[fixed-sequence]: evict {} elements, len: {} => {}, maximum size: {}",
            count,
            len,
            self.sequence.len(),
            self.maximum_size
        );

        if let Some(listener) = self.evict_listener.as_mut() {
            listener(batch);
        }
        Ok(count)
    }
}

impl<T> Deref for FixedSequence<T> {
    type Target = Sequence<T>;

    fn deref(&self) -> &Self::Target {
        &self.sequence
    }
}

impl<T> DerefMut for FixedSequence<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.sequence
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<Vec<T>>>>, impl EvictListener<T>) {
        let batches = Arc::new(Mutex::new(vec![]));
        let b = batches.clone();
        (batches, move |batch: Vec<T>| b.lock().unwrap().push(batch))
    }

    #[test_log::test]
    fn test_queue_single_eviction() {
        let (batches, listener) = recorder::<i32>();
        let mut log = FixedSequence::new(3, 0, SequenceMode::Queue).with_evict_listener(listener);

        for i in 0..3 {
            assert_eq!(log.fixed_add(i).unwrap(), 0);
        }
        assert_eq!(log.fixed_add(3).unwrap(), 1);
        assert_eq!(log.fixed_add(4).unwrap(), 1);

        assert_eq!(log.to_vec(), vec![2, 3, 4]);
        assert_eq!(*batches.lock().unwrap(), vec![vec![0], vec![1]]);
    }

    #[test_log::test]
    fn test_queue_batch_eviction() {
        let (batches, listener) = recorder::<i32>();
        let mut log = FixedSequence::new(4, 3, SequenceMode::Queue).with_evict_listener(listener);

        for i in 0..5 {
            log.fixed_add(i).unwrap();
        }
        assert_eq!(log.to_vec(), vec![3, 4]);
        assert_eq!(*batches.lock().unwrap(), vec![vec![0, 1, 2]]);
    }

    #[test_log::test]
    fn test_stack_evicts_from_tail() {
        let (batches, listener) = recorder::<char>();
        let mut log = FixedSequence::new(2, 2, SequenceMode::Stack).with_evict_listener(listener);

        log.fixed_add('a').unwrap();
        log.fixed_add('b').unwrap();
        log.fixed_add('c').unwrap();

        assert_eq!(log.to_vec(), vec!['c']);
        assert_eq!(log.newest().unwrap(), &'c');
        assert_eq!(*batches.lock().unwrap(), vec![vec!['b', 'a']]);
    }

    #[test_log::test]
    fn test_shrink_maximum_size() {
        let (batches, listener) = recorder::<i32>();
        let mut log = FixedSequence::new(10, 1, SequenceMode::Queue).with_evict_listener(listener);
        for i in 0..8 {
            log.fixed_add(i).unwrap();
        }

        assert_eq!(log.set_maximum_size(5).unwrap(), 3);
        assert_eq!(log.to_vec(), vec![3, 4, 5, 6, 7]);
        assert_eq!(log.maximum_size(), 5);

        log.set_overhead(0);
        assert_eq!(log.overhead(), 0);
        assert_eq!(log.fixed_add(8).unwrap(), 1);
        assert_eq!(*batches.lock().unwrap(), vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_overhead_larger_than_len() {
        let mut log = FixedSequence::new(0, 5, SequenceMode::Queue);
        assert_eq!(log.fixed_add(1).unwrap(), 1);
        assert!(log.is_empty());

        // Adding through the wrapped sequence bypasses the bound until the next fixed add.
        log.enqueue(2).unwrap();
        log.enqueue(3).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.fixed_add(4).unwrap(), 3);
        assert_eq!(log.into_inner().len(), 0);
    }
}
