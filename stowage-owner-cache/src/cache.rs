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
    hash::Hash,
    sync::{Arc, OnceLock, Weak},
    time::Duration,
};

use equivalent::Equivalent;
use hashbrown::HashMap;
use itertools::Itertools;
use stowage_common::{
    code::{DefaultHashBuilder, HashBuilder, Key, Owner, Value},
    error::{Error, Result},
    lock::CheckedMutex,
};

use crate::{
    entry::{EntryHost, EntryOptions, OwnerCacheEntry},
    listener::CacheEventListener,
    pruner::{Prune, Pruner},
};

/// Creates the entry for a key that is not cached yet.
///
/// The created entry must be unattached and must carry the requested key.
pub trait EntryFactory<K, O, V>: Send + Sync + 'static
where
    K: Key,
    O: Owner,
    V: Value,
{
    /// Create an unattached entry for `key`.
    fn create(&self, key: &K) -> Arc<OwnerCacheEntry<K, O, V>>;
}

impl<K, O, V, F> EntryFactory<K, O, V> for F
where
    K: Key,
    O: Owner,
    V: Value,
    F: Fn(&K) -> Arc<OwnerCacheEntry<K, O, V>> + Send + Sync + 'static,
{
    fn create(&self, key: &K) -> Arc<OwnerCacheEntry<K, O, V>> {
        self(key)
    }
}

/// Result of [`OwnerCache::try_add_owner()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddOwnerOutcome {
    /// The owner was recorded.
    Added,
    /// The owner was already recorded. Nothing changed.
    AlreadyPresent,
    /// There is no live entry for the key, or the predicate rejected its value.
    Rejected,
}

type Entries<K, O, V, S> = HashMap<K, Arc<OwnerCacheEntry<K, O, V>>, S>;

enum CacheEvent<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    Added(K, Arc<OwnerCacheEntry<K, O, V>>),
    Removed(K, Option<Arc<V>>),
}

/// Work deferred until the cache lock is released: event hooks and dropping released references.
struct Deferred<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    events: Vec<CacheEvent<K, O, V>>,
    owners: Vec<Arc<O>>,
    values: Vec<Arc<V>>,
}

impl<K, O, V> Deferred<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    fn new() -> Self {
        Self {
            events: vec![],
            owners: vec![],
            values: vec![],
        }
    }

    fn release(self, listener: Option<&Arc<dyn CacheEventListener<Key = K, Owner = O, Value = V>>>) {
        for event in self.events {
            match (event, listener) {
                (CacheEvent::Added(key, entry), Some(listener)) => listener.after_added(&key, &entry),
                (CacheEvent::Removed(key, value), Some(listener)) => listener.after_removed(&key, value),
                (_, None) => {}
            }
        }
        drop(self.owners);
        drop(self.values);
    }
}

struct CacheInner<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    entries: CheckedMutex<Entries<K, O, V, S>>,
    entry_factory: Arc<dyn EntryFactory<K, O, V>>,
    event_listener: Option<Arc<dyn CacheEventListener<Key = K, Owner = O, Value = V>>>,
    always_add_if_value_alive: bool,
    this: Weak<Self>,
    pruner: OnceLock<Pruner>,
}

impl<K, O, V, S> CacheInner<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    fn run<R>(&self, f: impl FnOnce(&Self, &mut Deferred<K, O, V>) -> Result<R>) -> Result<R> {
        let mut deferred = Deferred::new();
        let res = f(self, &mut deferred);
        deferred.release(self.event_listener.as_ref());
        res
    }

    fn host(&self) -> Weak<dyn EntryHost<K>> {
        self.this.clone()
    }

    fn produce<F>(f: F, current: Option<Arc<V>>) -> Result<Arc<V>>
    where
        F: FnOnce(Option<Arc<V>>) -> Option<Arc<V>>,
    {
        f(current).ok_or_else(|| {
            Error::invalid_argument("value factory returned no value").with_context("delegate", "add_or_replace_value")
        })
    }

    /// Remove the entry of `key` from the index and detach it.
    fn remove_locked<Q>(
        &self,
        entries: &mut Entries<K, O, V, S>,
        key: &Q,
        deferred: &mut Deferred<K, O, V>,
    ) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let Some((key, entry)) = entries.remove_entry(key) else {
            return Ok(false);
        };
        let (value, owners) = {
            let mut core = entry.lock_core()?;
            entry.detach_locked(&mut core)
        };
        tracing::debug!("[owner-cache]: remove entry {:?}", key);
        deferred.owners.extend(owners);
        deferred.events.push(CacheEvent::Removed(key, value));
        Ok(true)
    }

    fn get_or_add<F>(
        &self,
        key: K,
        owner: &Arc<O>,
        f: F,
        force_replace: bool,
        deferred: &mut Deferred<K, O, V>,
    ) -> Result<(Arc<OwnerCacheEntry<K, O, V>>, Arc<V>)>
    where
        F: FnOnce(Option<Arc<V>>) -> Option<Arc<V>>,
    {
        let mut entries = self.entries.lock()?;

        if let Some(entry) = entries.get(&key).cloned() {
            let mut core = entry.lock_core()?;
            core.sweep();
            let value = match core.value() {
                Some(current) if !force_replace && (core.is_alive() || self.always_add_if_value_alive) => current,
                current => {
                    let value = Self::produce(f, current)?;
                    deferred.values.extend(entry.replace_value_locked(&mut core, &value)?);
                    value
                }
            };
            entry.add_owner_locked(&mut core, owner)?;
            drop(core);
            return Ok((entry, value));
        }

        let entry = self.entry_factory.create(&key);
        if entry.key() != &key {
            return Err(
                Error::invalid_argument("entry factory created an entry for another key")
                    .with_context("expected", format!("{key:?}"))
                    .with_context("actual", format!("{:?}", entry.key())),
            );
        }
        let value = Self::produce(f, None)?;
        {
            let mut core = entry.lock_core()?;
            entry.attach_locked(&mut core, self.host(), owner, &value)?;
        }
        tracing::debug!("[owner-cache]: add entry {:?}", key);
        entries.insert(key.clone(), entry.clone());
        deferred.events.push(CacheEvent::Added(key, entry.clone()));
        Ok((entry, value))
    }

    fn try_add_owner<Q, P>(
        &self,
        key: &Q,
        owner: &Arc<O>,
        predicate: P,
        deferred: &mut Deferred<K, O, V>,
    ) -> Result<AddOwnerOutcome>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        P: FnOnce(&Arc<V>) -> bool,
    {
        let mut entries = self.entries.lock()?;
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(AddOwnerOutcome::Rejected);
        };

        let outcome = {
            let mut core = entry.lock_core()?;
            core.sweep();
            let value = core.value();
            let outcome = match &value {
                Some(value) if core.is_alive() => match predicate(value) {
                    false => Some(AddOwnerOutcome::Rejected),
                    true => match entry.add_owner_locked(&mut core, owner)? {
                        true => Some(AddOwnerOutcome::Added),
                        false => Some(AddOwnerOutcome::AlreadyPresent),
                    },
                },
                _ => None,
            };
            deferred.values.extend(value);
            outcome
        };

        match outcome {
            Some(outcome) => Ok(outcome),
            None => {
                self.remove_locked(&mut entries, key, deferred)?;
                Ok(AddOwnerOutcome::Rejected)
            }
        }
    }

    fn remove_owner<Q>(&self, key: &Q, owner: &Arc<O>, deferred: &mut Deferred<K, O, V>) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let mut entries = self.entries.lock()?;
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(false);
        };

        let (released, alive) = {
            let mut core = entry.lock_core()?;
            let released = entry.remove_owner_locked(&mut core, owner)?;
            (released, core.is_alive())
        };
        let removed = released.is_some();
        deferred.owners.extend(released);

        if !alive {
            self.remove_locked(&mut entries, key, deferred)?;
        }
        Ok(removed)
    }

    fn try_replace<Q, F>(&self, key: &Q, f: F, deferred: &mut Deferred<K, O, V>) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        F: FnOnce(Option<Arc<V>>) -> Option<Arc<V>>,
    {
        let mut entries = self.entries.lock()?;
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(false);
        };

        let replaced = {
            let mut core = entry.lock_core()?;
            core.sweep();
            match core.has_live_owner() {
                true => {
                    let value = Self::produce(f, core.value())?;
                    deferred.values.extend(entry.replace_value_locked(&mut core, &value)?);
                    deferred.values.push(value);
                    true
                }
                false => false,
            }
        };

        if !replaced {
            self.remove_locked(&mut entries, key, deferred)?;
        }
        Ok(replaced)
    }

    fn try_remove<Q, P>(&self, key: &Q, predicate: P, deferred: &mut Deferred<K, O, V>) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        P: FnOnce(Option<&Arc<V>>) -> bool,
    {
        let mut entries = self.entries.lock()?;
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(false);
        };

        let value = entry.lock_core()?.value();
        let accepted = predicate(value.as_ref());
        deferred.values.extend(value);
        match accepted {
            true => self.remove_locked(&mut entries, key, deferred),
            false => Ok(false),
        }
    }

    fn try_get_value<Q>(&self, key: &Q, deferred: &mut Deferred<K, O, V>) -> Result<Option<(Vec<Arc<O>>, Arc<V>)>>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let mut entries = self.entries.lock()?;
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(None);
        };

        let (owners, value) = {
            let mut core = entry.lock_core()?;
            core.sweep();
            (core.live_owners(), core.value())
        };
        match value {
            Some(value) if !owners.is_empty() => Ok(Some((owners, value))),
            value => {
                deferred.owners.extend(owners);
                deferred.values.extend(value);
                self.remove_locked(&mut entries, key, deferred)?;
                Ok(None)
            }
        }
    }

    fn try_get_entry<Q>(
        &self,
        key: &Q,
        deferred: &mut Deferred<K, O, V>,
    ) -> Result<Option<Arc<OwnerCacheEntry<K, O, V>>>>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let mut entries = self.entries.lock()?;
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(None);
        };

        let alive = {
            let mut core = entry.lock_core()?;
            core.sweep();
            core.is_alive()
        };
        match alive {
            true => Ok(Some(entry)),
            false => {
                self.remove_locked(&mut entries, key, deferred)?;
                Ok(None)
            }
        }
    }

    fn remove<Q>(&self, key: &Q, deferred: &mut Deferred<K, O, V>) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let mut entries = self.entries.lock()?;
        self.remove_locked(&mut entries, key, deferred)
    }

    fn clear(&self, deferred: &mut Deferred<K, O, V>) -> Result<()> {
        let mut entries = self.entries.lock()?;
        let keys = entries.keys().cloned().collect_vec();
        for key in keys.iter() {
            self.remove_locked(&mut entries, key, deferred)?;
        }
        Ok(())
    }

    fn prune_dead(&self, deferred: &mut Deferred<K, O, V>) -> Result<usize> {
        let mut entries = self.entries.lock()?;
        let mut dead = vec![];
        for (key, entry) in entries.iter() {
            let mut core = entry.lock_core()?;
            core.prune();
            if !core.is_alive() {
                dead.push(key.clone());
            }
        }
        for key in dead.iter() {
            self.remove_locked(&mut entries, key, deferred)?;
        }
        if !dead.is_empty() {
            tracing::debug!("[owner-cache]: pruned {} dead entries", dead.len());
        }
        Ok(dead.len())
    }
}

impl<K, O, V, S> EntryHost<K> for CacheInner<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    fn remove_if_dead(&self, key: &K) -> Result<()> {
        self.run(|inner, deferred| {
            let mut entries = inner.entries.lock()?;
            let Some(entry) = entries.get(key).cloned() else {
                return Ok(());
            };
            let alive = entry.lock_core()?.is_alive();
            if !alive {
                inner.remove_locked(&mut entries, key, deferred)?;
            }
            Ok(())
        })
    }
}

impl<K, O, V, S> Prune for CacheInner<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    fn prune(&self) -> Result<usize> {
        self.run(|inner, deferred| inner.prune_dead(deferred))
    }
}

impl<K, O, V, S> Drop for CacheInner<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    fn drop(&mut self) {
        // Outstanding entry handles must observe the removal.
        for (_, entry) in self.entries.get_mut().drain() {
            if let Ok(mut core) = entry.lock_core() {
                let released = entry.detach_locked(&mut core);
                drop(core);
                drop(released);
            }
        }
    }
}

/// Builder of [`OwnerCache`].
pub struct OwnerCacheBuilder<K, O, V, S = DefaultHashBuilder>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    hash_builder: S,
    entry_factory: Option<Arc<dyn EntryFactory<K, O, V>>>,
    entry_options: EntryOptions,
    event_listener: Option<Arc<dyn CacheEventListener<Key = K, Owner = O, Value = V>>>,
    always_add_if_value_alive: bool,
    prune_interval: Option<Duration>,
}

impl<K, O, V> Default for OwnerCacheBuilder<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, O, V> OwnerCacheBuilder<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            hash_builder: DefaultHashBuilder::default(),
            entry_factory: None,
            entry_options: EntryOptions::empty(),
            event_listener: None,
            always_add_if_value_alive: false,
            prune_interval: None,
        }
    }
}

impl<K, O, V, S> OwnerCacheBuilder<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    /// Set the hash builder of the key index.
    pub fn with_hash_builder<OS>(self, hash_builder: OS) -> OwnerCacheBuilder<K, O, V, OS>
    where
        OS: HashBuilder,
    {
        OwnerCacheBuilder {
            hash_builder,
            entry_factory: self.entry_factory,
            entry_options: self.entry_options,
            event_listener: self.event_listener,
            always_add_if_value_alive: self.always_add_if_value_alive,
            prune_interval: self.prune_interval,
        }
    }

    /// Set the factory that creates entries for new keys.
    ///
    /// A custom factory decides the entry options itself, [`OwnerCacheBuilder::with_entry_options()`] is ignored.
    pub fn with_entry_factory(mut self, entry_factory: impl EntryFactory<K, O, V>) -> Self {
        self.entry_factory = Some(Arc::new(entry_factory));
        self
    }

    /// Set the options of the entries created by the default entry factory.
    ///
    /// The default value is [`EntryOptions::empty()`]: owners and values are held strongly.
    pub fn with_entry_options(mut self, entry_options: EntryOptions) -> Self {
        self.entry_options = entry_options;
        self
    }

    /// Set the cache event listener.
    pub fn with_event_listener(
        mut self,
        event_listener: impl CacheEventListener<Key = K, Owner = O, Value = V>,
    ) -> Self {
        self.event_listener = Some(Arc::new(event_listener));
        self
    }

    /// Reuse the value of an entry whose owners are all gone, as long as the value itself is still alive.
    ///
    /// Otherwise the value factory is called with the stale value to produce a new one.
    ///
    /// The default value is `false`.
    pub fn with_always_add_if_value_alive(mut self, always_add_if_value_alive: bool) -> Self {
        self.always_add_if_value_alive = always_add_if_value_alive;
        self
    }

    /// Prune dead entries periodically on a background thread.
    ///
    /// The default is no background pruning.
    pub fn with_prune_interval(mut self, prune_interval: Duration) -> Self {
        self.prune_interval = Some(prune_interval);
        self
    }

    /// Build the owner cache with the given configuration.
    ///
    /// Fails only if the background pruner cannot be spawned.
    pub fn build(self) -> Result<OwnerCache<K, O, V, S>> {
        let prune_interval = self.prune_interval;
        let cache = self.assemble();
        if let Some(interval) = prune_interval {
            let pruner = Pruner::spawn(Arc::downgrade(&cache.inner), interval)?;
            let _ = cache.inner.pruner.set(pruner);
        }
        Ok(cache)
    }

    fn assemble(self) -> OwnerCache<K, O, V, S> {
        let entry_options = self.entry_options;
        let entry_factory: Arc<dyn EntryFactory<K, O, V>> = match self.entry_factory {
            Some(entry_factory) => entry_factory,
            None => Arc::new(move |key: &K| {
                OwnerCacheEntry::<K, O, V>::builder(key.clone())
                    .with_options(entry_options)
                    .build()
            }),
        };
        let inner = Arc::new_cyclic(|this| CacheInner {
            entries: CheckedMutex::new("owner cache", HashMap::with_hasher(self.hash_builder)),
            entry_factory,
            event_listener: self.event_listener,
            always_add_if_value_alive: self.always_add_if_value_alive,
            this: this.clone(),
            pruner: OnceLock::new(),
        });
        OwnerCache { inner }
    }
}

/// A thread-safe cache of values kept alive by their owners.
///
/// Each key maps to an [`OwnerCacheEntry`] holding a value and the set of owners using it. An entry stays cached
/// while its value and at least one of its owners are alive; once the last owner leaves, the entry is removed.
///
/// Locking is two-level. Cache operations take the index lock and then the lock of the entry they touch, always in
/// that order. Entry accessors and setters such as [`OwnerCacheEntry::value`] or
/// [`OwnerCacheEntry::set_hold_weak_owners`] take only the entry lock. If such a call leaves the entry dead, the
/// entry is handed back to the cache after its lock is released, and the cache re-checks liveness under both locks
/// before removing it.
///
/// Value factories, predicates and [`crate::EntryListener`] hooks run under the locks and must not call back into the
/// cache or the entry; such calls fail with [`stowage_common::error::ErrorKind::Reentrant`]. [`CacheEventListener`]
/// hooks run after every lock is released.
///
/// [`OwnerCache`] is a cheap handle; clones share the same cache.
pub struct OwnerCache<K, O, V, S = DefaultHashBuilder>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    inner: Arc<CacheInner<K, O, V, S>>,
}

impl<K, O, V, S> Clone for OwnerCache<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, O, V, S> Debug for OwnerCache<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerCache")
            .field("len", &self.len().ok())
            .field("always_add_if_value_alive", &self.inner.always_add_if_value_alive)
            .field("pruner", &self.inner.pruner.get().is_some())
            .finish()
    }
}

impl<K, O, V> Default for OwnerCache<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, O, V> OwnerCache<K, O, V>
where
    K: Key,
    O: Owner,
    V: Value,
{
    /// Create an owner cache with the default configuration.
    pub fn new() -> Self {
        OwnerCacheBuilder::new().assemble()
    }

    /// Create a builder of the owner cache.
    pub fn builder() -> OwnerCacheBuilder<K, O, V> {
        OwnerCacheBuilder::new()
    }
}

impl<K, O, V, S> OwnerCache<K, O, V, S>
where
    K: Key,
    O: Owner,
    V: Value,
    S: HashBuilder,
{
    /// Get the entry of `key` and record `owner` on it, creating the entry if needed.
    ///
    /// `f` produces the value. It receives the current value if there is one and is called when:
    ///
    /// - the key is not cached,
    /// - `force_replace` is set,
    /// - the cached entry has no live owner left and cannot reuse its value (see
    ///   [`OwnerCacheBuilder::with_always_add_if_value_alive()`]), or its value is gone.
    ///
    /// Returning `None` from `f` fails with [`stowage_common::error::ErrorKind::InvalidArgument`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::get_or_add"))]
    pub fn get_or_add<F>(
        &self,
        key: K,
        owner: &Arc<O>,
        f: F,
        force_replace: bool,
    ) -> Result<Arc<OwnerCacheEntry<K, O, V>>>
    where
        F: FnOnce(Option<Arc<V>>) -> Option<Arc<V>>,
    {
        self.inner
            .run(|inner, deferred| inner.get_or_add(key, owner, f, force_replace, deferred))
            .map(|(entry, _)| entry)
    }

    /// Same as [`OwnerCache::get_or_add()`], but returns the value the owner now shares.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::add_owner"))]
    pub fn add_owner<F>(&self, key: K, owner: &Arc<O>, f: F, force_replace: bool) -> Result<Arc<V>>
    where
        F: FnOnce(Option<Arc<V>>) -> Option<Arc<V>>,
    {
        self.inner
            .run(|inner, deferred| inner.get_or_add(key, owner, f, force_replace, deferred))
            .map(|(_, value)| value)
    }

    /// Record `owner` on the live entry of `key`, never creating one.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::try_add_owner"))]
    pub fn try_add_owner<Q>(&self, key: &Q, owner: &Arc<O>) -> Result<AddOwnerOutcome>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.inner
            .run(|inner, deferred| inner.try_add_owner(key, owner, |_| true, deferred))
    }

    /// Record `owner` on the live entry of `key` if `predicate` accepts its value, never creating an entry.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::try_add_owner_if"))]
    pub fn try_add_owner_if<Q, P>(&self, key: &Q, owner: &Arc<O>, predicate: P) -> Result<AddOwnerOutcome>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        P: FnOnce(&Arc<V>) -> bool,
    {
        self.inner
            .run(|inner, deferred| inner.try_add_owner(key, owner, predicate, deferred))
    }

    /// Release `owner` from the entry of `key`. The entry is removed once it is no longer alive.
    ///
    /// Returns `true` if the owner was recorded.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::remove_owner"))]
    pub fn remove_owner<Q>(&self, key: &Q, owner: &Arc<O>) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.inner
            .run(|inner, deferred| inner.remove_owner(key, owner, deferred))
    }

    /// Replace the value of the entry of `key` with the one `f` produces from the current value.
    ///
    /// Returns `false` if there is no entry or it has no live owner left, in which case it is removed.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::try_replace"))]
    pub fn try_replace<Q, F>(&self, key: &Q, f: F) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        F: FnOnce(Option<Arc<V>>) -> Option<Arc<V>>,
    {
        self.inner.run(|inner, deferred| inner.try_replace(key, f, deferred))
    }

    /// Remove the entry of `key` unconditionally.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::remove"))]
    pub fn remove<Q>(&self, key: &Q) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.inner.run(|inner, deferred| inner.remove(key, deferred))
    }

    /// Remove the entry of `key` if `predicate` accepts its value. The value is `None` if it is gone.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::try_remove"))]
    pub fn try_remove<Q, P>(&self, key: &Q, predicate: P) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        P: FnOnce(Option<&Arc<V>>) -> bool,
    {
        self.inner
            .run(|inner, deferred| inner.try_remove(key, predicate, deferred))
    }

    /// Get the live owners and the value of `key`.
    ///
    /// An entry found dead is removed and reported as missing.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::try_get_value"))]
    pub fn try_get_value<Q>(&self, key: &Q) -> Result<Option<(Vec<Arc<O>>, Arc<V>)>>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.inner.run(|inner, deferred| inner.try_get_value(key, deferred))
    }

    /// Get the live entry of `key`.
    ///
    /// An entry found dead is removed and reported as missing.
    pub fn try_get_entry<Q>(&self, key: &Q) -> Result<Option<Arc<OwnerCacheEntry<K, O, V>>>>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.inner.run(|inner, deferred| inner.try_get_entry(key, deferred))
    }

    /// Remove all entries.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::clear"))]
    pub fn clear(&self) -> Result<()> {
        self.inner.run(|inner, deferred| inner.clear(deferred))
    }

    /// Drop collected owner references of all entries and remove the dead entries.
    ///
    /// Returns the count of removed entries.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "stowage::owner_cache::prune"))]
    pub fn prune(&self) -> Result<usize> {
        Prune::prune(self.inner.as_ref())
    }

    /// Get the count of indexed entries, including dead entries not pruned yet.
    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.entries.lock()?.len())
    }

    /// Returns `true` if no entry is indexed.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.inner.entries.lock()?.is_empty())
    }

    /// Returns `true` if an entry of `key` is indexed. The entry may be dead.
    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        Ok(self.inner.entries.lock()?.contains_key(key))
    }

    /// Get the keys of the indexed entries, in no particular order.
    pub fn keys(&self) -> Result<Vec<K>> {
        Ok(self.inner.entries.lock()?.keys().cloned().collect_vec())
    }
}
