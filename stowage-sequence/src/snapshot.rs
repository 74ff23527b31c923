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

use stowage_common::error::{Error, Result};

use crate::sequence::{validate_grow_factor, Sequence, SequenceMode};

/// Plain snapshot of a [`Sequence`]: the raw ring buffer and the indices into it.
///
/// Restoring a snapshot rebuilds a sequence with the same physical layout, so it grows, wraps and enumerates exactly
/// like the original.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceSnapshot<T> {
    /// Ring buffer slots. Vacant slots are `None`.
    pub buffer: Vec<Option<T>>,
    /// Physical head index.
    pub head: usize,
    /// Physical tail index.
    pub tail: usize,
    /// Element count.
    pub len: usize,
    /// Grow factor.
    pub grow_factor: f64,
    /// Sequence mode.
    pub mode: SequenceMode,
}

impl<T: Clone> Sequence<T> {
    /// Take a snapshot of the sequence.
    pub fn snapshot(&self) -> SequenceSnapshot<T> {
        let (buffer, head, tail, len) = self.raw_parts();
        SequenceSnapshot {
            buffer: buffer.to_vec(),
            head,
            tail,
            len,
            grow_factor: self.grow_factor(),
            mode: self.mode(),
        }
    }
}

impl<T> Sequence<T> {
    /// Rebuild a sequence from a snapshot. The version of the restored sequence starts over.
    pub fn restore(snapshot: SequenceSnapshot<T>) -> Result<Self> {
        let SequenceSnapshot {
            buffer,
            head,
            tail,
            len,
            grow_factor,
            mode,
        } = snapshot;

        validate_grow_factor(grow_factor)?;

        let capacity = buffer.len();
        if len > capacity {
            return Err(Error::out_of_range("len", len, capacity));
        }
        if capacity == 0 {
            if head != 0 || tail != 0 {
                return Err(malformed("indices of an empty buffer must be 0", head, tail, len));
            }
        } else {
            if head >= capacity {
                return Err(Error::out_of_range("head", head, capacity));
            }
            if tail >= capacity {
                return Err(Error::out_of_range("tail", tail, capacity));
            }
            if (head + len) % capacity != tail {
                return Err(malformed("tail does not follow head by len", head, tail, len));
            }
            let occupied = (0..capacity).all(|pos| {
                let offset = (pos + capacity - head) % capacity;
                buffer[pos].is_some() == (offset < len)
            });
            if !occupied {
                return Err(malformed("occupied slots do not match the live range", head, tail, len));
            }
        }

        Ok(Sequence::from_raw_parts(
            buffer.into_boxed_slice(),
            head,
            tail,
            len,
            grow_factor,
            mode,
        ))
    }
}

fn malformed(message: &'static str, head: usize, tail: usize, len: usize) -> Error {
    Error::invalid_argument(format!("malformed sequence snapshot: {message}"))
        .with_context("head", head)
        .with_context("tail", tail)
        .with_context("len", len)
}
