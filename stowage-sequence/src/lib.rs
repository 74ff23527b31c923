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

//! A double-ended sequence over one resizable ring buffer.
//!
//! [`Sequence`] is a queue, a stack and an indexable list at once. Both ends take amortized O(1) insertions and O(1)
//! removals. Arbitrary positions take O(n), moving whichever side of the position holds fewer elements.
//!
//! ```text
//!          ↓ tail       ↓ head
//! [o][o][ ][ ][ ][ ][ ][x][x][x]
//!
//! push    => writes before the head
//! enqueue => writes at the tail
//! dequeue => reads the head
//! drop    => reads before the tail
//! ```
//!
//! [`FixedSequence`] bounds a sequence and evicts its oldest elements in batches.

mod fixed;
mod iter;
mod sequence;
mod snapshot;

pub use crate::{
    fixed::{EvictListener, FixedSequence},
    iter::{Cursor, IntoIter, Iter, IterMut},
    sequence::{Sequence, SequenceBuilder, SequenceMode, DEFAULT_CAPACITY, DEFAULT_GROW_FACTOR},
    snapshot::SequenceSnapshot,
};
