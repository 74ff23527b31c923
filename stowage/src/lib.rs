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

//! stowage - ring buffer sequences and owner-counted caches.
//!
//! - [`Sequence`] is a double-ended sequence over one resizable ring buffer, usable as a queue, a stack and an
//!   indexable list. [`FixedSequence`] bounds it and evicts the oldest items on overflow.
//! - [`OwnerCache`] caches values together with the owners using them and drops an entry once its last owner is gone.
//!
//! ```
//! use std::sync::Arc;
//!
//! use stowage::{OwnerCache, Sequence};
//!
//! let mut queue = Sequence::new();
//! queue.enqueue(1).unwrap();
//! queue.enqueue(2).unwrap();
//! assert_eq!(queue.dequeue().unwrap(), 1);
//!
//! let cache: OwnerCache<String, String, String> = OwnerCache::new();
//! let owner = Arc::new("owner".to_string());
//! let value = cache
//!     .add_owner("key".to_string(), &owner, |_| Some(Arc::new("value".to_string())), false)
//!     .unwrap();
//! assert_eq!(value.as_str(), "value");
//! assert!(cache.remove_owner("key", &owner).unwrap());
//! assert!(cache.try_get_value("key").unwrap().is_none());
//! ```

mod prelude;
pub use prelude::*;
