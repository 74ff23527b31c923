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
    sync::{Arc, Weak},
};

use bitflags::bitflags;
use stowage_common::{
    code::{Key, Owner, Value},
    error::{Error, Result},
    lock::{CheckedMutex, CheckedMutexGuard},
};

use crate::{
    listener::EntryListener,
    reference::{ByAddress, Held, OwnerEquality},
};

bitflags! {
    /// Options of an owner-cache entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntryOptions: u8 {
        /// Owners are held weakly and stop counting once they are dropped everywhere else.
        const HOLD_WEAK_OWNERS = 0b001;
        /// The value is held weakly and the entry dies once it is dropped everywhere else.
        const HOLD_WEAK_VALUE = 0b010;
        /// Collected owner references are dropped on every mutation instead of on explicit prunes.
        const PRUNE_ON_EVERY_MUTATION = 0b100;
    }
}

/// Lifecycle state of an owner-cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// The entry has been created but never attached to a cache.
    Unattached,
    /// The entry is indexed by a cache.
    Attached,
    /// The entry has left its cache. Terminal.
    Removed,
}

/// The cache side of an attached entry.
pub(crate) trait EntryHost<K>: Send + Sync + 'static {
    /// Remove the entry indexed by `key` if it is no longer alive.
    fn remove_if_dead(&self, key: &K) -> Result<()>;
}

enum Phase<K> {
    Unattached,
    Attached(Weak<dyn EntryHost<K>>),
    Removed,
}

impl<K> Phase<K> {
    fn state(&self) -> EntryState {
        match self {
            Phase::Unattached => EntryState::Unattached,
            Phase::Attached(_) => EntryState::Attached,
            Phase::Removed => EntryState::Removed,
        }
    }
}

/// Mutable part of an entry, guarded by the entry lock.
pub(crate) struct EntryCore<K, O, V> {
    phase: Phase<K>,
    owners: Vec<Held<O>>,
    value: Option<Held<V>>,
    options: EntryOptions,
}

impl<K, O, V> EntryCore<K, O, V> {
    pub(crate) fn is_alive(&self) -> bool {
        self.value.as_ref().is_some_and(Held::is_live) && self.has_live_owner()
    }

    pub(crate) fn has_live_owner(&self) -> bool {
        self.owners.iter().any(Held::is_live)
    }

    pub(crate) fn value(&self) -> Option<Arc<V>> {
        self.value.as_ref().and_then(Held::upgrade)
    }

    pub(crate) fn live_owners(&self) -> Vec<Arc<O>> {
        self.owners.iter().filter_map(Held::upgrade).collect()
    }

    /// Drop references to collected owners, regardless of the options.
    pub(crate) fn prune(&mut self) {
        self.owners.retain(Held::is_live);
    }

    /// Drop references to collected owners if the entry prunes on every mutation.
    pub(crate) fn sweep(&mut self) {
        if self.options.contains(EntryOptions::PRUNE_ON_EVERY_MUTATION) {
            self.prune();
        }
    }

    fn host_if_dead(&self) -> Option<Arc<dyn EntryHost<K>>> {
        match &self.phase {
            Phase::Attached(host) if !self.is_alive() => host.upgrade(),
            _ => None,
        }
    }
}

/// An owner-counted entry: a key, a value and the set of owners keeping the value alive.
///
/// The entry is alive while its value is reachable and at least one owner is reachable. Strongly held owners and
/// values are always reachable; weakly held ones are reachable until every other [`Arc`] to them is dropped.
///
/// Entries are usually created by the cache. An entry can also be created upfront with
/// [`OwnerCacheEntry::builder()`] and handed to the cache by an entry factory, which is how per-entry options,
/// owner equality and hooks are customized.
pub struct OwnerCacheEntry<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    key: K,
    core: CheckedMutex<EntryCore<K, O, V>>,
    owner_equality: Arc<dyn OwnerEquality<O>>,
    listener: Option<Arc<dyn EntryListener<Key = K, Owner = O, Value = V>>>,
}

impl<K, O, V> Debug for OwnerCacheEntry<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("OwnerCacheEntry");
        s.field("key", &self.key);
        if let Ok(core) = self.core.lock() {
            s.field("state", &core.phase.state())
                .field("owners", &core.owners)
                .field("value", &core.value)
                .field("options", &core.options);
        }
        s.finish()
    }
}

/// Builder of [`OwnerCacheEntry`].
pub struct OwnerCacheEntryBuilder<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    key: K,
    options: EntryOptions,
    owner_equality: Arc<dyn OwnerEquality<O>>,
    listener: Option<Arc<dyn EntryListener<Key = K, Owner = O, Value = V>>>,
}

impl<K, O, V> OwnerCacheEntryBuilder<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    /// Create a builder for an entry of `key`.
    pub fn new(key: K) -> Self {
        Self {
            key,
            options: EntryOptions::empty(),
            owner_equality: Arc::new(ByAddress),
            listener: None,
        }
    }

    /// Set the entry options.
    pub fn with_options(mut self, options: EntryOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how owners are compared. [`ByAddress`] by default.
    pub fn with_owner_equality(mut self, owner_equality: impl OwnerEquality<O>) -> Self {
        self.owner_equality = Arc::new(owner_equality);
        self
    }

    /// Set the hooks of the entry.
    pub fn with_listener(mut self, listener: impl EntryListener<Key = K, Owner = O, Value = V>) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Build the unattached entry.
    pub fn build(self) -> Arc<OwnerCacheEntry<K, O, V>> {
        Arc::new(OwnerCacheEntry {
            key: self.key,
            core: CheckedMutex::new(
                "owner cache entry",
                EntryCore {
                    phase: Phase::Unattached,
                    owners: vec![],
                    value: None,
                    options: self.options,
                },
            ),
            owner_equality: self.owner_equality,
            listener: self.listener,
        })
    }
}

impl<K, O, V> OwnerCacheEntry<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    /// Create an unattached entry with default options.
    pub fn new(key: K) -> Arc<Self> {
        Self::builder(key).build()
    }

    /// Create a builder for an entry of `key`.
    pub fn builder(key: K) -> OwnerCacheEntryBuilder<K, O, V> {
        OwnerCacheEntryBuilder::new(key)
    }

    /// Get the key of the entry.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Get the lifecycle state of the entry.
    pub fn state(&self) -> Result<EntryState> {
        Ok(self.core.lock()?.phase.state())
    }

    /// Get the options of the entry.
    pub fn options(&self) -> Result<EntryOptions> {
        Ok(self.core.lock()?.options)
    }

    /// Get the value if it is still reachable.
    pub fn value(&self) -> Result<Option<Arc<V>>> {
        Ok(self.core.lock()?.value())
    }

    /// Get the reachable owners.
    pub fn owners(&self) -> Result<Vec<Arc<O>>> {
        Ok(self.core.lock()?.live_owners())
    }

    /// Get the count of reachable owners.
    pub fn owner_count(&self) -> Result<usize> {
        Ok(self.core.lock()?.owners.iter().filter(|owner| owner.is_live()).count())
    }

    /// Returns `true` if `owner` is one of the reachable owners of the entry.
    pub fn contains_owner(&self, owner: &Arc<O>) -> Result<bool> {
        let core = self.core.lock()?;
        Ok(self.position_locked(&core, owner).is_some())
    }

    /// Returns `true` if the value and at least one owner are reachable.
    pub fn is_alive(&self) -> Result<bool> {
        Ok(self.core.lock()?.is_alive())
    }

    /// Hold owners weakly or strongly from now on.
    ///
    /// If the entry dies because of the switch, it is removed from its cache.
    pub fn set_hold_weak_owners(&self, weak: bool) -> Result<()> {
        self.update_options(EntryOptions::HOLD_WEAK_OWNERS, weak)
    }

    /// Hold the value weakly or strongly from now on.
    ///
    /// If the entry dies because of the switch, it is removed from its cache.
    pub fn set_hold_weak_value(&self, weak: bool) -> Result<()> {
        self.update_options(EntryOptions::HOLD_WEAK_VALUE, weak)
    }

    /// Enable or disable dropping collected owner references on every mutation.
    pub fn set_prune_on_every_mutation(&self, enabled: bool) -> Result<()> {
        self.update_options(EntryOptions::PRUNE_ON_EVERY_MUTATION, enabled)
    }

    /// Drop references to collected owners and report whether the entry is still alive.
    ///
    /// A dead attached entry is removed from its cache. A removed entry reports `false`.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::entry::prune"))]
    pub fn prune(&self) -> Result<bool> {
        let (alive, host) = {
            let mut core = self.core.lock()?;
            if matches!(core.phase, Phase::Removed) {
                return Ok(false);
            }
            core.prune();
            (core.is_alive(), core.host_if_dead())
        };
        if let Some(host) = host {
            tracing::trace!("[owner-cache]: entry {:?} found dead on prune", self.key);
            host.remove_if_dead(&self.key)?;
        }
        Ok(alive)
    }

    fn update_options(&self, option: EntryOptions, enabled: bool) -> Result<()> {
        let (garbage_owners, garbage_value) = {
            let mut core = self.core.lock()?;
            self.check_not_removed(&core)?;

            core.options.set(option, enabled);
            let weak_owners = core.options.contains(EntryOptions::HOLD_WEAK_OWNERS);
            let weak_value = core.options.contains(EntryOptions::HOLD_WEAK_VALUE);
            let owners = core
                .owners
                .iter_mut()
                .filter_map(|owner| owner.set_weak(weak_owners))
                .collect::<Vec<_>>();
            let value = core.value.as_mut().and_then(|value| value.set_weak(weak_value));
            core.sweep();
            (owners, value)
        };
        tracing::trace!(
            "[owner-cache]: entry {:?} set option {:?} to {}",
            self.key,
            option,
            enabled
        );

        // Released strong references may have been the last ones.
        drop(garbage_owners);
        drop(garbage_value);
        let host = self.core.lock()?.host_if_dead();
        match host {
            Some(host) => host.remove_if_dead(&self.key),
            None => Ok(()),
        }
    }

    pub(crate) fn lock_core(&self) -> Result<CheckedMutexGuard<'_, EntryCore<K, O, V>>> {
        self.core.lock()
    }

    fn check_not_removed(&self, core: &EntryCore<K, O, V>) -> Result<()> {
        match core.phase {
            Phase::Removed => Err(Error::entry_removed(&self.key)),
            _ => Ok(()),
        }
    }

    fn position_locked(&self, core: &EntryCore<K, O, V>, owner: &Arc<O>) -> Option<usize> {
        core.owners.iter().position(|held| {
            held.upgrade()
                .is_some_and(|held| self.owner_equality.equals(&held, owner))
        })
    }

    fn weak_owners(core: &EntryCore<K, O, V>) -> bool {
        core.options.contains(EntryOptions::HOLD_WEAK_OWNERS)
    }

    /// Attach the entry to `host` with its first owner and value.
    pub(crate) fn attach_locked(
        &self,
        core: &mut EntryCore<K, O, V>,
        host: Weak<dyn EntryHost<K>>,
        owner: &Arc<O>,
        value: &Arc<V>,
    ) -> Result<()> {
        match core.phase {
            Phase::Attached(_) => return Err(Error::already_attached(&self.key)),
            Phase::Removed => return Err(Error::entry_removed(&self.key)),
            Phase::Unattached => {}
        }

        core.phase = Phase::Attached(host);
        core.value = Some(Held::new(
            value,
            core.options.contains(EntryOptions::HOLD_WEAK_VALUE),
        ));
        core.owners.clear();
        core.owners.push(Held::new(owner, Self::weak_owners(core)));

        tracing::trace!("[owner-cache]: entry {:?} attached", self.key);
        if let Some(listener) = self.listener.as_ref() {
            listener.on_added(&self.key, value);
            listener.on_owner_added(&self.key, owner);
        }
        Ok(())
    }

    /// Record `owner`. Returns `false` if an equal owner is already recorded.
    pub(crate) fn add_owner_locked(&self, core: &mut EntryCore<K, O, V>, owner: &Arc<O>) -> Result<bool> {
        self.check_not_removed(core)?;
        core.sweep();

        if self.position_locked(core, owner).is_some() {
            return Ok(false);
        }
        let weak = Self::weak_owners(core);
        core.owners.push(Held::new(owner, weak));

        tracing::trace!("[owner-cache]: entry {:?} added an owner", self.key);
        if let Some(listener) = self.listener.as_ref() {
            listener.on_owner_added(&self.key, owner);
        }
        Ok(true)
    }

    /// Release the recorded owner equal to `owner`. Returns the released owner if there was one.
    pub(crate) fn remove_owner_locked(&self, core: &mut EntryCore<K, O, V>, owner: &Arc<O>) -> Result<Option<Arc<O>>> {
        self.check_not_removed(core)?;
        core.sweep();

        let Some(released) = self
            .position_locked(core, owner)
            .and_then(|pos| core.owners.remove(pos).upgrade())
        else {
            return Ok(None);
        };

        tracing::trace!("[owner-cache]: entry {:?} removed an owner", self.key);
        if let Some(listener) = self.listener.as_ref() {
            listener.on_owner_removed(&self.key, &released);
        }
        Ok(Some(released))
    }

    /// Replace the value. Returns the previous value if it was still reachable.
    pub(crate) fn replace_value_locked(&self, core: &mut EntryCore<K, O, V>, value: &Arc<V>) -> Result<Option<Arc<V>>> {
        self.check_not_removed(core)?;
        core.sweep();

        let held = Held::new(value, core.options.contains(EntryOptions::HOLD_WEAK_VALUE));
        let old = core.value.replace(held).and_then(|old| old.upgrade());

        tracing::trace!("[owner-cache]: entry {:?} replaced its value", self.key);
        if let Some(listener) = self.listener.as_ref() {
            listener.on_value_replaced(&self.key, old.as_ref(), value);
        }
        Ok(old)
    }

    /// Move the entry into the terminal state, releasing its owners and value.
    ///
    /// Returns the reachable value and owners, so the caller can drop them after unlocking. Detaching a removed entry
    /// is a no-op.
    pub(crate) fn detach_locked(&self, core: &mut EntryCore<K, O, V>) -> (Option<Arc<V>>, Vec<Arc<O>>) {
        if matches!(core.phase, Phase::Removed) {
            return (None, vec![]);
        }
        core.phase = Phase::Removed;

        let owners = core.live_owners();
        core.owners.clear();
        let value = core.value.take().and_then(|value| value.upgrade());

        tracing::trace!("[owner-cache]: entry {:?} detached", self.key);
        if let Some(listener) = self.listener.as_ref() {
            for owner in owners.iter() {
                listener.on_owner_removed(&self.key, owner);
            }
            listener.on_removed(&self.key, value.as_ref());
        }
        (value, owners)
    }
}
