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

use std::sync::Arc;

use stowage_common::code::{Key, Owner, Value};

use crate::entry::OwnerCacheEntry;

/// Hooks of a single owner-cache entry.
///
/// All hooks are called while the entry is locked. A hook must not call back into the entry or its cache, such calls
/// fail with [`stowage_common::error::ErrorKind::Reentrant`].
pub trait EntryListener: Send + Sync + 'static {
    /// Associated key type.
    type Key;
    /// Associated owner type.
    type Owner;
    /// Associated value type.
    type Value;

    /// Called when the entry is attached to a cache with its first owner and value.
    #[expect(unused_variables)]
    fn on_added(&self, key: &Self::Key, value: &Arc<Self::Value>)
    where
        Self::Key: Key,
        Self::Value: Value,
    {
    }

    /// Called when the entry leaves its cache. `value` is `None` if the value was already collected.
    #[expect(unused_variables)]
    fn on_removed(&self, key: &Self::Key, value: Option<&Arc<Self::Value>>)
    where
        Self::Key: Key,
        Self::Value: Value,
    {
    }

    /// Called when an owner is recorded.
    #[expect(unused_variables)]
    fn on_owner_added(&self, key: &Self::Key, owner: &Arc<Self::Owner>)
    where
        Self::Key: Key,
        Self::Owner: Owner,
    {
    }

    /// Called when a live owner is released.
    #[expect(unused_variables)]
    fn on_owner_removed(&self, key: &Self::Key, owner: &Arc<Self::Owner>)
    where
        Self::Key: Key,
        Self::Owner: Owner,
    {
    }

    /// Called when the value is replaced. `old` is `None` if the previous value was already collected.
    #[expect(unused_variables)]
    fn on_value_replaced(&self, key: &Self::Key, old: Option<&Arc<Self::Value>>, new: &Arc<Self::Value>)
    where
        Self::Key: Key,
        Self::Value: Value,
    {
    }
}

/// Hooks of an owner cache.
///
/// Unlike [`EntryListener`], the hooks are called after the cache lock is released, so they may use the cache freely.
pub trait CacheEventListener: Send + Sync + 'static {
    /// Associated key type.
    type Key;
    /// Associated owner type.
    type Owner;
    /// Associated value type.
    type Value;

    /// Called after a new entry is attached to the cache.
    #[expect(unused_variables)]
    fn after_added(&self, key: &Self::Key, entry: &Arc<OwnerCacheEntry<Self::Key, Self::Owner, Self::Value>>)
    where
        Self::Key: Key,
        Self::Owner: Owner,
        Self::Value: Value,
    {
    }

    /// Called after an entry is removed from the cache, with the value it held if it is still alive.
    #[expect(unused_variables)]
    fn after_removed(&self, key: &Self::Key, value: Option<Arc<Self::Value>>)
    where
        Self::Key: Key,
        Self::Value: Value,
    {
    }
}
