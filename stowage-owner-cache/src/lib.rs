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

//! An owner-counted cache.
//!
//! Values are cached by key together with the set of owners using them. Owners join with
//! [`OwnerCache::get_or_add()`] or [`OwnerCache::add_owner()`] and leave with [`OwnerCache::remove_owner()`]; when the
//! last owner leaves, the entry is removed.
//!
//! Owners and values may be held weakly (see [`EntryOptions`]). A weakly held owner counts only while some other
//! [`std::sync::Arc`] to it exists. Dead entries are removed on lookups, on [`OwnerCache::prune()`], or by a background
//! pruner configured with [`OwnerCacheBuilder::with_prune_interval()`].

mod cache;
mod entry;
mod listener;
mod pruner;
mod reference;

mod prelude;
pub use prelude::*;
