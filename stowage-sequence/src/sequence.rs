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
    ops::{Index, IndexMut, Range},
};

use stowage_common::{
    error::{Error, ErrorKind, Result},
    strict_assert, strict_assert_eq,
};

use crate::iter::{Cursor, IntoIter, Iter, IterMut};

/// Decides how the sequence interprets its two ends.
///
/// The physical ring is the same in both modes: `push` prepends at the head, `enqueue` appends at the tail, and
/// `dequeue` / `pop` remove from the head. The mode only chooses which end is "newest" and where elements are packed
/// after a reallocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceMode {
    /// First in, first out. The newest element sits next to the tail.
    #[default]
    Queue,
    /// Last in, first out. The newest element sits at the head.
    Stack,
}

/// Builder for [`Sequence`].
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    capacity: usize,
    grow_factor: f64,
    mode: SequenceMode,
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceBuilder {
    /// Create a builder with the default capacity, grow factor and queue mode.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            grow_factor: DEFAULT_GROW_FACTOR,
            mode: SequenceMode::Queue,
        }
    }

    /// Set the initial capacity.
    ///
    /// The default value is 16.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the factor the capacity is multiplied with when the sequence is full. Must be greater than 1.
    ///
    /// The default value is 2.0.
    pub fn with_grow_factor(mut self, grow_factor: f64) -> Self {
        self.grow_factor = grow_factor;
        self
    }

    /// Set the sequence mode.
    pub fn with_mode(mut self, mode: SequenceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the sequence with the given configuration.
    pub fn build<T>(self) -> Result<Sequence<T>> {
        validate_grow_factor(self.grow_factor)?;
        let maximum = Sequence::<T>::max_capacity();
        if self.capacity > maximum {
            return Err(Error::capacity_overflow(self.capacity, maximum));
        }
        Ok(Sequence::from_parts(self.capacity, self.grow_factor, self.mode))
    }
}

/// Default initial capacity of a [`Sequence`].
pub const DEFAULT_CAPACITY: usize = 16;
/// Default grow factor of a [`Sequence`].
pub const DEFAULT_GROW_FACTOR: f64 = 2.0;

pub(crate) fn validate_grow_factor(grow_factor: f64) -> Result<()> {
    if !grow_factor.is_finite() || grow_factor <= 1.0 {
        return Err(Error::invalid_argument("grow factor must be a finite number greater than 1")
            .with_context("grow_factor", grow_factor));
    }
    Ok(())
}

/// A double-ended sequence over one resizable ring buffer.
///
/// [`Sequence`] serves as a queue, a stack and an indexable list at the same time:
///
/// - `enqueue` / `push` add at the tail / head in amortized O(1).
/// - `dequeue` (alias `pop`) / `drop_last` remove from the head / tail in O(1).
/// - `insert` / `remove_at` work at any position in O(n), moving whichever side of the position is shorter.
///
/// Every structural mutation increases [`Sequence::version`]. Detached [`Cursor`]s remember the version they started
/// with and fail with [`ErrorKind::Modified`] once it changes.
///
/// The sequence is not synchronized. Share it between threads behind a lock.
#[derive(Clone)]
pub struct Sequence<T> {
    /// Heap-allocated ring buffer. Slots outside of the live range are always `None`.
    buffer: Box<[Option<T>]>,

    /// Logical index 0.
    head: usize,
    /// One past the last element, the next slot `enqueue` writes to.
    tail: usize,

    len: usize,

    grow_factor: f64,
    mode: SequenceMode,

    version: u64,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sequence<T> {
    /// Create an empty queue-mode sequence with the default capacity.
    pub fn new() -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_GROW_FACTOR, SequenceMode::Queue)
    }

    /// Create an empty stack-mode sequence with the default capacity.
    pub fn stack() -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_GROW_FACTOR, SequenceMode::Stack)
    }

    /// Create an empty sequence with the given mode and the default capacity.
    pub fn with_mode(mode: SequenceMode) -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_GROW_FACTOR, mode)
    }

    /// Create an empty queue-mode sequence with the given capacity.
    ///
    /// Use [`Sequence::builder`] to get [`ErrorKind::CapacityOverflow`] back instead.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is greater than [`Sequence::max_capacity`].
    pub fn with_capacity(capacity: usize) -> Self {
        let maximum = Self::max_capacity();
        if capacity > maximum {
            panic!("{}", Error::capacity_overflow(capacity, maximum));
        }
        Self::from_parts(capacity, DEFAULT_GROW_FACTOR, SequenceMode::Queue)
    }

    /// Create a builder.
    pub fn builder() -> SequenceBuilder {
        SequenceBuilder::new()
    }

    /// Create a full sequence from a vector. Index 0 of the vector becomes the head.
    pub fn from_vec(items: Vec<T>, mode: SequenceMode) -> Self {
        let len = items.len();
        let buffer = items.into_iter().map(Some).collect::<Vec<_>>().into_boxed_slice();
        Self {
            buffer,
            head: 0,
            tail: 0,
            len,
            grow_factor: DEFAULT_GROW_FACTOR,
            mode,
            version: 0,
        }
    }

    /// `capacity` must not exceed [`Sequence::max_capacity`].
    pub(crate) fn from_parts(capacity: usize, grow_factor: f64, mode: SequenceMode) -> Self {
        Self {
            buffer: Self::slots(capacity),
            head: 0,
            tail: 0,
            len: 0,
            grow_factor,
            mode,
            version: 0,
        }
    }

    /// The largest capacity a sequence of `T` can be grown to.
    pub fn max_capacity() -> usize {
        isize::MAX as usize / std::mem::size_of::<Option<T>>().max(1)
    }

    /// Returns the element count.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there is no element in the sequence.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of the ring buffer.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the structural version. It changes on every mutation.
    #[inline(always)]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the sequence mode.
    pub fn mode(&self) -> SequenceMode {
        self.mode
    }

    /// Returns `true` if the sequence is in stack mode.
    pub fn is_stack(&self) -> bool {
        self.mode == SequenceMode::Stack
    }

    /// Returns the grow factor.
    pub fn grow_factor(&self) -> f64 {
        self.grow_factor
    }

    /// Set the grow factor used by later reallocations.
    pub fn set_grow_factor(&mut self, grow_factor: f64) -> Result<()> {
        validate_grow_factor(grow_factor)?;
        self.grow_factor = grow_factor;
        Ok(())
    }

    /// Physical head index.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Physical tail index.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Append an element at the tail.
    pub fn enqueue(&mut self, item: T) -> Result<()> {
        self.grow_if_full()?;

        strict_assert!(self.buffer[self.tail].is_none());
        self.buffer[self.tail] = Some(item);
        self.tail = self.next_pos(self.tail);
        self.len += 1;
        self.touch();

        self.check_invariants();
        Ok(())
    }

    /// Prepend an element at the head.
    pub fn push(&mut self, item: T) -> Result<()> {
        self.grow_if_full()?;

        self.head = self.prev_pos(self.head);
        strict_assert!(self.buffer[self.head].is_none());
        self.buffer[self.head] = Some(item);
        self.len += 1;
        self.touch();

        self.check_invariants();
        Ok(())
    }

    /// Add an element at the end the mode treats as newest: the tail of a queue, the head of a stack.
    pub fn add(&mut self, item: T) -> Result<()> {
        match self.mode {
            SequenceMode::Queue => self.enqueue(item),
            SequenceMode::Stack => self.push(item),
        }
    }

    /// Remove and return the head element.
    pub fn dequeue(&mut self) -> Result<T> {
        self.try_dequeue().ok_or_else(Error::empty)
    }

    /// Remove and return the head element, or `None` if the sequence is empty.
    pub fn try_dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let item = self.take_slot(self.head);
        self.head = self.next_pos(self.head);
        self.len -= 1;
        self.touch();

        self.check_invariants();
        Some(item)
    }

    /// Remove and return the head element. Same as [`Sequence::dequeue`], named for stack usage.
    pub fn pop(&mut self) -> Result<T> {
        self.dequeue()
    }

    /// Remove and return the head element, or `None` if the sequence is empty.
    pub fn try_pop(&mut self) -> Option<T> {
        self.try_dequeue()
    }

    /// Remove and return the element the mode serves next. Both modes serve the head.
    pub fn take(&mut self) -> Result<T> {
        self.dequeue()
    }

    /// Remove and return the element next to the tail.
    pub fn drop_last(&mut self) -> Result<T> {
        self.try_drop_last().ok_or_else(Error::empty)
    }

    /// Remove and return the element next to the tail, or `None` if the sequence is empty.
    pub fn try_drop_last(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.tail = self.prev_pos(self.tail);
        let item = self.take_slot(self.tail);
        self.len -= 1;
        self.touch();

        self.check_invariants();
        Some(item)
    }

    /// Returns the head element.
    pub fn peek(&self) -> Result<&T> {
        self.try_peek().ok_or_else(Error::empty)
    }

    /// Returns the head element, or `None` if the sequence is empty.
    pub fn try_peek(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the element next to the tail.
    pub fn poke(&self) -> Result<&T> {
        self.try_poke().ok_or_else(Error::empty)
    }

    /// Returns the element next to the tail, or `None` if the sequence is empty.
    pub fn try_poke(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Returns the most recently added element as interpreted by the mode.
    pub fn newest(&self) -> Result<&T> {
        match self.mode {
            SequenceMode::Queue => self.poke(),
            SequenceMode::Stack => self.peek(),
        }
    }

    /// Returns the least recently added element as interpreted by the mode.
    pub fn oldest(&self) -> Result<&T> {
        match self.mode {
            SequenceMode::Queue => self.peek(),
            SequenceMode::Stack => self.poke(),
        }
    }

    /// Returns the element at the logical `index`. Index 0 is the head.
    pub fn peek_at(&self, index: usize) -> Result<&T> {
        self.get(index).ok_or_else(|| Error::out_of_range("index", index, self.len))
    }

    /// Returns the element at the logical `index`, or `None` if it is out of range.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.buffer[self.physical(index)].as_ref()
    }

    /// Returns the mutable element at the logical `index`, or `None` if it is out of range.
    ///
    /// Borrowing an element mutably counts as a mutation and bumps the version.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        self.touch();
        let pos = self.physical(index);
        self.buffer[pos].as_mut()
    }

    /// Replace the element at the logical `index`, returning the old one.
    pub fn set(&mut self, index: usize, item: T) -> Result<T> {
        if index >= self.len {
            return Err(Error::out_of_range("index", index, self.len));
        }
        let pos = self.physical(index);
        let old = self.take_slot(pos);
        self.buffer[pos] = Some(item);
        self.touch();
        Ok(old)
    }

    /// Insert an element at the logical `index`, `0 <= index <= len`.
    ///
    /// Only the shorter run on either side of `index` is moved.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if index > self.len {
            return Err(Error::out_of_range("index", index, self.len));
        }
        if index == 0 {
            return self.push(item);
        }
        if index == self.len {
            return self.enqueue(item);
        }

        self.grow_if_full()?;

        if index < self.len - index {
            //     ↓ head    ↓ index
            // [ ][a][b][c][d][e][f][ ]  =>  [a][b][c][ ][d][e][f][ ]
            self.head = self.prev_pos(self.head);
            for i in 0..index {
                let from = self.physical(i + 1);
                let to = self.physical(i);
                self.buffer[to] = self.buffer[from].take();
            }
        } else {
            //        ↓ index     ↓ tail
            // [a][b][c][d][e][ ][ ]  =>  [a][b][ ][c][d][e][ ]
            for i in (index..self.len).rev() {
                let from = self.physical(i);
                let to = self.physical(i + 1);
                self.buffer[to] = self.buffer[from].take();
            }
            self.tail = self.next_pos(self.tail);
        }

        let pos = self.physical(index);
        strict_assert!(self.buffer[pos].is_none());
        self.buffer[pos] = Some(item);
        self.len += 1;
        self.touch();

        self.check_invariants();
        Ok(())
    }

    /// Remove and return the element at the logical `index`.
    ///
    /// Only the shorter run on either side of `index` is moved.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(Error::out_of_range("index", index, self.len));
        }

        let item = self.take_slot(self.physical(index));

        if index < self.len - 1 - index {
            for i in (0..index).rev() {
                let from = self.physical(i);
                let to = self.physical(i + 1);
                self.buffer[to] = self.buffer[from].take();
            }
            self.head = self.next_pos(self.head);
        } else {
            for i in index + 1..self.len {
                let from = self.physical(i);
                let to = self.physical(i - 1);
                self.buffer[to] = self.buffer[from].take();
            }
            self.tail = self.prev_pos(self.tail);
        }
        self.len -= 1;
        self.touch();

        self.check_invariants();
        Ok(item)
    }

    /// Remove `count` elements from the head. The returned vector starts with the former head.
    pub fn dequeue_range(&mut self, count: usize) -> Result<Vec<T>> {
        if count > self.len {
            return Err(Error::out_of_range("count", count, self.len));
        }

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.take_slot(self.head));
            self.head = self.next_pos(self.head);
        }
        self.len -= count;
        self.touch();

        self.check_invariants();
        Ok(items)
    }

    /// Remove `count` elements from the tail. The returned vector keeps the head-to-tail order.
    pub fn drop_range(&mut self, count: usize) -> Result<Vec<T>> {
        if count > self.len {
            return Err(Error::out_of_range("count", count, self.len));
        }

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            self.tail = self.prev_pos(self.tail);
            items.push(self.take_slot(self.tail));
        }
        items.reverse();
        self.len -= count;
        self.touch();

        self.check_invariants();
        Ok(items)
    }

    /// Remove all elements, returned in head-to-tail order.
    pub fn drain_all(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.len);
        while let Some(item) = self.try_dequeue() {
            items.push(item);
        }
        items
    }

    /// Remove all elements. The capacity is kept.
    pub fn clear(&mut self) {
        for i in 0..self.len {
            let pos = self.physical(i);
            self.buffer[pos] = None;
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
        self.touch();
    }

    /// Reallocate the ring buffer with exactly `capacity` slots.
    ///
    /// Fails if `capacity` is less than the current length or greater than [`Sequence::max_capacity`].
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity < self.len {
            return Err(Error::new(ErrorKind::OutOfRange, "capacity less than length")
                .with_context("capacity", capacity)
                .with_context("bound", self.len));
        }
        let maximum = Self::max_capacity();
        if capacity > maximum {
            return Err(Error::capacity_overflow(capacity, maximum));
        }
        if capacity != self.capacity() {
            self.reallocate(capacity);
        }
        Ok(())
    }

    /// Make sure the sequence holds at least `capacity` slots, growing by the grow factor if needed.
    pub fn ensure_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.capacity() {
            self.grow(capacity)?;
        }
        Ok(())
    }

    /// Shrink the capacity to the current length.
    pub fn trim_to_size(&mut self) -> Result<()> {
        self.set_capacity(self.len)
    }

    /// Returns `true` if the sequence contains an element equal to `item`.
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|x| x == item)
    }

    /// Returns the logical index of the first element matching the predicate.
    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().position(predicate)
    }

    /// Copy the elements into a vector in head-to-tail order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Iterate from head to tail. Reverse it for tail to head.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Mutably iterate from head to tail. Bumps the version.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.touch();
        let len = self.len;
        let (front, back) = self.live_ranges();
        let (left, right) = self.buffer.split_at_mut(front.start);
        let front = &mut right[..front.end - front.start];
        let back = &mut left[back];
        IterMut::new(front, back, len)
    }

    /// Create a detached cursor walking from head to tail.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.version, self.len, false)
    }

    /// Create a detached cursor walking from tail to head.
    pub fn reverse_cursor(&self) -> Cursor {
        Cursor::new(self.version, self.len, true)
    }

    /// Physical ranges holding the live elements: the run starting at the head and the wrapped run, if any.
    pub(crate) fn live_ranges(&self) -> (Range<usize>, Range<usize>) {
        if self.len == 0 {
            (0..0, 0..0)
        } else if self.head < self.tail {
            (self.head..self.tail, 0..0)
        } else {
            (self.head..self.capacity(), 0..self.tail)
        }
    }

    pub(crate) fn raw_parts(&self) -> (&[Option<T>], usize, usize, usize) {
        (&self.buffer, self.head, self.tail, self.len)
    }

    pub(crate) fn from_raw_parts(
        buffer: Box<[Option<T>]>,
        head: usize,
        tail: usize,
        len: usize,
        grow_factor: f64,
        mode: SequenceMode,
    ) -> Self {
        let sequence = Self {
            buffer,
            head,
            tail,
            len,
            grow_factor,
            mode,
            version: 0,
        };
        sequence.check_invariants();
        sequence
    }

    fn grow_if_full(&mut self) -> Result<()> {
        if self.len == self.capacity() {
            self.grow(self.len + 1)?;
        }
        Ok(())
    }

    /// Grow to `max(ceil(capacity * grow_factor), required)`, capped by [`Sequence::max_capacity`].
    fn grow(&mut self, required: usize) -> Result<()> {
        let maximum = Self::max_capacity();
        if required > maximum {
            return Err(Error::capacity_overflow(required, maximum));
        }

        let scaled = (self.capacity() as f64 * self.grow_factor).ceil();
        let capacity = if scaled >= maximum as f64 {
            maximum
        } else {
            scaled as usize
        };
        self.reallocate(capacity.max(required));
        Ok(())
    }

    /// Move the live elements into a new buffer: packed from slot 0 for a queue, packed against the end for a stack.
    fn reallocate(&mut self, capacity: usize) {
        strict_assert!(capacity >= self.len);

        let old = self.capacity();
        let mut buffer = Self::slots(capacity);
        let offset = match self.mode {
            SequenceMode::Queue => 0,
            SequenceMode::Stack => capacity - self.len,
        };
        for i in 0..self.len {
            let pos = self.physical(i);
            buffer[offset + i] = self.buffer[pos].take();
        }

        self.buffer = buffer;
        self.head = if capacity == 0 { 0 } else { offset % capacity };
        self.tail = if capacity == 0 { 0 } else { (offset + self.len) % capacity };
        self.touch();

        tracing::trace!(
            "[sequence]: reallocate ring buffer capacity: {} => {}, len: {}",
            old,
            capacity,
            self.len
        );
        self.check_invariants();
    }

    #[inline(always)]
    fn physical(&self, index: usize) -> usize {
        strict_assert!(index < self.capacity());
        let pos = self.head + index;
        if pos >= self.capacity() {
            pos - self.capacity()
        } else {
            pos
        }
    }

    #[inline(always)]
    fn next_pos(&self, pos: usize) -> usize {
        if pos + 1 == self.capacity() {
            0
        } else {
            pos + 1
        }
    }

    #[inline(always)]
    fn prev_pos(&self, pos: usize) -> usize {
        if pos == 0 {
            self.capacity() - 1
        } else {
            pos - 1
        }
    }

    fn take_slot(&mut self, pos: usize) -> T {
        match self.buffer[pos].take() {
            Some(item) => item,
            None => unreachable!("[sequence]: live slot {pos} is vacant"),
        }
    }

    #[inline(always)]
    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[inline(always)]
    fn check_invariants(&self) {
        strict_assert!(self.len <= self.capacity());
        if self.capacity() == 0 {
            strict_assert_eq!((self.head, self.tail), (0, 0));
        } else {
            strict_assert!(self.head < self.capacity() && self.tail < self.capacity());
            strict_assert_eq!((self.head + self.len) % self.capacity(), self.tail);
        }
    }

    fn slots(capacity: usize) -> Box<[Option<T>]> {
        std::iter::repeat_with(|| None)
            .take(capacity)
            .collect::<Vec<_>>()
            .into_boxed_slice()
    }
}

impl<T: Debug> Debug for Sequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Sequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T> Index<usize> for Sequence<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(item) => item,
            None => panic!("index {index} out of range for sequence of length {}", self.len),
        }
    }
}

impl<T> IndexMut<usize> for Sequence<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let len = self.len;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("index {index} out of range for sequence of length {len}"),
        }
    }
}

impl<T> From<Vec<T>> for Sequence<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items, SequenceMode::Queue)
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect(), SequenceMode::Queue)
    }
}

impl<T> Extend<T> for Sequence<T> {
    /// Adds every item with [`Sequence::add`].
    ///
    /// # Panics
    ///
    /// Panics if the capacity overflows.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            if let Err(e) = self.add(item) {
                panic!("{e}");
            }
        }
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Sequence<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use itertools::Itertools;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    fn assert_ring<T>(sequence: &Sequence<T>) {
        let enumerated = sequence.iter().count();
        assert_eq!(enumerated, sequence.len());
        let wrapped_or_boundary = sequence.is_empty() || sequence.len() == sequence.capacity();
        assert_eq!(sequence.head() == sequence.tail(), wrapped_or_boundary);
    }

    #[test]
    fn test_enqueue_grow_dequeue() {
        let mut sequence = Sequence::<i32>::builder().with_capacity(4).with_grow_factor(2.0).build().unwrap();
        for i in 1..=5 {
            sequence.enqueue(i).unwrap();
        }
        assert!(sequence.capacity() >= 5);
        assert_eq!(sequence.to_vec(), vec![1, 2, 3, 4, 5]);

        assert_eq!(sequence.dequeue().unwrap(), 1);
        assert_eq!(sequence.dequeue().unwrap(), 2);
        assert_eq!(sequence.to_vec(), vec![3, 4, 5]);
        assert_ring(&sequence);
    }

    #[test]
    fn test_fifo_and_lifo() {
        let mut queue = Sequence::new();
        let mut stack = Sequence::stack();
        for i in 0..100 {
            queue.add(i).unwrap();
            stack.add(i).unwrap();
        }
        let dequeued = (0..100).map(|_| queue.take().unwrap()).collect_vec();
        let popped = (0..100).map(|_| stack.pop().unwrap()).collect_vec();
        assert_eq!(dequeued, (0..100).collect_vec());
        assert_eq!(popped, (0..100).rev().collect_vec());
    }

    #[test]
    fn test_empty_errors() {
        let mut sequence = Sequence::<u64>::with_capacity(0);
        assert_eq!(sequence.dequeue().unwrap_err().kind(), ErrorKind::Empty);
        assert_eq!(sequence.drop_last().unwrap_err().kind(), ErrorKind::Empty);
        assert_eq!(sequence.peek().unwrap_err().kind(), ErrorKind::Empty);
        assert_eq!(sequence.poke().unwrap_err().kind(), ErrorKind::Empty);
        assert_eq!(sequence.try_dequeue(), None);
        assert_eq!(sequence.try_pop(), None);
        assert_eq!(sequence.try_drop_last(), None);

        sequence.enqueue(7).unwrap();
        assert_eq!(sequence.capacity(), 1);
        assert_eq!(sequence.peek().unwrap(), &7);
        assert_eq!(sequence.poke().unwrap(), &7);
        assert_ring(&sequence);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut sequence: Sequence<_> = (0..4).collect();
        let err = sequence.peek_at(4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(err.context_value("index"), Some("4"));
        assert_eq!(err.context_value("bound"), Some("4"));

        assert_eq!(sequence.insert(5, 0).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(sequence.remove_at(4).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(sequence.dequeue_range(5).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(sequence.drop_range(5).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(sequence.set_capacity(3).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(sequence.set(9, 0).unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(sequence.to_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_invalid_grow_factor() {
        for factor in [1.0, 0.5, f64::NAN, f64::INFINITY] {
            let err = Sequence::<u8>::builder().with_grow_factor(factor).build::<u8>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert!(Sequence::<u8>::new().set_grow_factor(1.0).is_err());
    }

    #[test]
    fn test_capacity_overflow() {
        let mut sequence = Sequence::<u64>::new();
        let err = sequence.ensure_capacity(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityOverflow);
        assert!(err.kind().is_invalid_operation());
        assert_eq!(
            sequence.set_capacity(usize::MAX).unwrap_err().kind(),
            ErrorKind::CapacityOverflow
        );
        assert_eq!(
            Sequence::<u64>::builder().with_capacity(usize::MAX).build::<u64>().unwrap_err().kind(),
            ErrorKind::CapacityOverflow
        );
    }

    #[test]
    #[should_panic(expected = "Capacity overflow")]
    fn test_with_capacity_panics_beyond_max_capacity() {
        let _ = Sequence::<u64>::with_capacity(Sequence::<u64>::max_capacity() + 1);
    }

    #[test]
    fn test_insert_moves_shorter_side() {
        // [0][1][2][3][4][5][6][ ]
        let mut sequence = Sequence::<i32>::builder().with_capacity(8).build().unwrap();
        for i in 0..7 {
            sequence.enqueue(i).unwrap();
        }

        // Near the head: the head moves back and wraps to the end of the buffer.
        sequence.insert(1, 10).unwrap();
        assert_eq!(sequence.head(), 7);
        assert_eq!(sequence.tail(), 7);
        assert_eq!(sequence.to_vec(), vec![0, 10, 1, 2, 3, 4, 5, 6]);

        // Full, so the insertion reallocates first.
        sequence.insert(6, 20).unwrap();
        assert_eq!(sequence.capacity(), 16);
        assert_eq!(sequence.to_vec(), vec![0, 10, 1, 2, 3, 4, 20, 5, 6]);
        assert_eq!(sequence.head(), 0);
        assert_eq!(sequence.tail(), 9);
        assert_ring(&sequence);
    }

    #[test]
    fn test_remove_at_moves_shorter_side() {
        let mut sequence = Sequence::<i32>::builder().with_capacity(8).build().unwrap();
        for i in 0..8 {
            sequence.enqueue(i).unwrap();
        }
        // Wrap the live range around the end of the buffer.
        sequence.dequeue_range(3).unwrap();
        sequence.enqueue(8).unwrap();
        sequence.enqueue(9).unwrap();
        assert_eq!(sequence.head(), 3);
        assert_eq!(sequence.tail(), 2);

        assert_eq!(sequence.remove_at(1).unwrap(), 4);
        assert_eq!(sequence.head(), 4);
        assert_eq!(sequence.remove_at(4).unwrap(), 8);
        assert_eq!(sequence.tail(), 1);
        assert_eq!(sequence.to_vec(), vec![3, 5, 6, 7, 9]);
        assert_ring(&sequence);
    }

    #[test]
    fn test_ranges() {
        let mut sequence: Sequence<_> = (0..10).collect();
        assert_eq!(sequence.dequeue_range(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(sequence.drop_range(3).unwrap(), vec![7, 8, 9]);
        assert_eq!(sequence.dequeue_range(0).unwrap(), Vec::<i32>::new());
        assert_eq!(sequence.to_vec(), vec![3, 4, 5, 6]);
        assert_eq!(sequence.drain_all(), vec![3, 4, 5, 6]);
        assert!(sequence.is_empty());
        assert_ring(&sequence);
    }

    #[test]
    fn test_stack_reallocation_packs_against_end() {
        let mut stack = Sequence::<i32>::builder()
            .with_capacity(2)
            .with_mode(SequenceMode::Stack)
            .build()
            .unwrap();
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        stack.push(3).unwrap();
        assert_eq!(stack.capacity(), 4);
        assert_eq!(stack.head(), 1);
        assert_eq!(stack.tail(), 0);
        assert_eq!(stack.to_vec(), vec![3, 2, 1]);
        assert_eq!(stack.newest().unwrap(), &3);
        assert_eq!(stack.oldest().unwrap(), &1);

        let mut queue = Sequence::<i32>::builder().with_capacity(2).build().unwrap();
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();
        queue.enqueue(3).unwrap();
        assert_eq!(queue.head(), 0);
        assert_eq!(queue.tail(), 3);
        assert_eq!(queue.newest().unwrap(), &3);
        assert_eq!(queue.oldest().unwrap(), &1);
    }

    #[test]
    fn test_capacity_management() {
        let mut sequence: Sequence<_> = Sequence::with_capacity(32);
        sequence.extend(0..5);
        let version = sequence.version();

        sequence.trim_to_size().unwrap();
        assert_eq!(sequence.capacity(), 5);
        assert_ne!(sequence.version(), version);
        assert_ring(&sequence);

        let version = sequence.version();
        sequence.ensure_capacity(4).unwrap();
        assert_eq!(sequence.version(), version);

        sequence.ensure_capacity(6).unwrap();
        assert_eq!(sequence.capacity(), 10);
        assert_eq!(sequence.to_vec(), vec![0, 1, 2, 3, 4]);

        sequence.clear();
        assert_eq!(sequence.capacity(), 10);
        sequence.trim_to_size().unwrap();
        assert_eq!(sequence.capacity(), 0);
        sequence.push(1).unwrap();
        assert_eq!(sequence.to_vec(), vec![1]);
    }

    #[test]
    fn test_version_changes_on_every_mutation() {
        let mut sequence = Sequence::new();
        let mut last = sequence.version();
        let mut check = |sequence: &Sequence<u64>| {
            assert_ne!(sequence.version(), last);
            last = sequence.version();
        };

        sequence.enqueue(1).unwrap();
        check(&sequence);
        sequence.push(0).unwrap();
        check(&sequence);
        sequence.insert(1, 5).unwrap();
        check(&sequence);
        sequence.set(1, 6).unwrap();
        check(&sequence);
        sequence.remove_at(1).unwrap();
        check(&sequence);
        sequence.dequeue().unwrap();
        check(&sequence);
        sequence.drop_last().unwrap();
        check(&sequence);
        sequence.set_capacity(3).unwrap();
        check(&sequence);
        sequence.clear();
        check(&sequence);
    }

    #[test]
    fn test_in_place_writes_invalidate_cursors() {
        let mut sequence = Sequence::from_vec(vec![1, 2, 3], SequenceMode::Queue);
        let mut cursor = sequence.cursor();
        assert_eq!(cursor.next(&sequence).unwrap(), Some(&1));
        sequence[1] = 42;
        assert_eq!(cursor.next(&sequence).unwrap_err().kind(), ErrorKind::Modified);

        let mut cursor = sequence.cursor();
        *sequence.get_mut(0).unwrap() = 7;
        assert_eq!(cursor.next(&sequence).unwrap_err().kind(), ErrorKind::Modified);

        let version = sequence.version();
        assert!(sequence.get_mut(3).is_none());
        assert_eq!(sequence.version(), version);

        let mut cursor = sequence.reverse_cursor();
        for item in &mut sequence {
            *item += 1;
        }
        assert_eq!(cursor.next(&sequence).unwrap_err().kind(), ErrorKind::Modified);
        assert_eq!(sequence.to_vec(), vec![8, 43, 4]);
    }

    #[test]
    fn test_index_operators() {
        let mut sequence = Sequence::stack();
        sequence.extend(["a", "b", "c"]);
        assert_eq!(sequence[0], "c");
        sequence[2] = "z";
        assert_eq!(sequence.to_vec(), vec!["c", "b", "z"]);
        assert!(sequence.contains(&"z"));
        assert_eq!(sequence.position(|s| *s == "b"), Some(1));
        assert_eq!(format!("{sequence:?}"), r#"["c", "b", "z"]"#);
    }

    #[test]
    #[should_panic]
    fn test_index_operator_panics_out_of_range() {
        let sequence: Sequence<u8> = Sequence::new();
        let _ = sequence[0];
    }

    #[test]
    fn test_round_trip_from_vec() {
        let mut stack = Sequence::stack();
        for i in 0..20 {
            stack.push(i).unwrap();
        }
        stack.remove_at(3).unwrap();

        let copy = Sequence::from_vec(stack.to_vec(), stack.mode());
        assert_eq!(copy, stack);
        assert_eq!(copy.mode(), SequenceMode::Stack);
        assert!(copy.iter().rev().eq(stack.iter().rev()));
    }

    #[test_log::test]
    fn test_against_vec_deque() {
        const OPS: usize = 20_000;

        let mut rng = SmallRng::seed_from_u64(114514);
        let mut sequence = Sequence::<u64>::builder().with_capacity(1).with_grow_factor(1.5).build().unwrap();
        let mut model = VecDeque::new();

        for i in 0..OPS as u64 {
            match rng.random_range(0..10) {
                0 | 1 => {
                    sequence.enqueue(i).unwrap();
                    model.push_back(i);
                }
                2 | 3 => {
                    sequence.push(i).unwrap();
                    model.push_front(i);
                }
                4 => assert_eq!(sequence.try_dequeue(), model.pop_front()),
                5 => assert_eq!(sequence.try_drop_last(), model.pop_back()),
                6 => {
                    let index = rng.random_range(0..=model.len());
                    sequence.insert(index, i).unwrap();
                    model.insert(index, i);
                }
                7 => {
                    if !model.is_empty() {
                        let index = rng.random_range(0..model.len());
                        assert_eq!(sequence.remove_at(index).unwrap(), model.remove(index).unwrap());
                    }
                }
                8 => {
                    let count = rng.random_range(0..=model.len().min(4));
                    let expected = model.drain(..count).collect_vec();
                    assert_eq!(sequence.dequeue_range(count).unwrap(), expected);
                }
                _ => {
                    if rng.random_bool(0.1) {
                        sequence.trim_to_size().unwrap();
                    } else if !model.is_empty() {
                        let index = rng.random_range(0..model.len());
                        assert_eq!(sequence.peek_at(index).unwrap(), &model[index]);
                    }
                }
            }

            assert_eq!(sequence.len(), model.len());
            assert_ring(&sequence);
        }

        assert!(sequence.iter().eq(model.iter()));
        assert!(sequence.iter().rev().eq(model.iter().rev()));
    }
}
