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

//! Behavior test for the owner-counted cache through the public facade.

use std::{collections::HashSet, sync::Arc};

use itertools::Itertools;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use stowage::{AddOwnerOutcome, EntryOptions, EntryState, OwnerCache};

type Cache = OwnerCache<String, String, String>;

fn produce(v: &'static str) -> impl FnOnce(Option<Arc<String>>) -> Option<Arc<String>> {
    move |_| Some(Arc::new(v.to_string()))
}

#[test_log::test]
fn test_owners_share_one_value() {
    let cache = Cache::new();
    let a = Arc::new("owner-a".to_string());
    let b = Arc::new("owner-b".to_string());

    let entry = cache.get_or_add("k".to_string(), &a, produce("v1"), false).unwrap();
    assert_eq!(entry.value().unwrap().unwrap().as_str(), "v1");
    assert_eq!(entry.owners().unwrap().len(), 1);
    assert!(entry.contains_owner(&a).unwrap());

    let value = cache.add_owner("k".to_string(), &b, produce("v1"), false).unwrap();
    assert_eq!(value.as_str(), "v1");
    let owners = entry.owners().unwrap();
    assert_eq!(owners.len(), 2);
    assert!(owners.iter().any(|o| Arc::ptr_eq(o, &a)));
    assert!(owners.iter().any(|o| Arc::ptr_eq(o, &b)));

    assert!(cache.remove_owner("k", &a).unwrap());
    assert!(entry.is_alive().unwrap());

    assert!(cache.remove_owner("k", &b).unwrap());
    assert_eq!(entry.state().unwrap(), EntryState::Removed);
    assert!(cache.try_get_value("k").unwrap().is_none());
}

#[test_log::test]
fn test_weak_owner_is_pruned() {
    let cache = Cache::builder()
        .with_entry_options(EntryOptions::HOLD_WEAK_OWNERS)
        .build()
        .unwrap();
    let owner = Arc::new("owner".to_string());
    let entry = cache.get_or_add("k".to_string(), &owner, produce("v"), false).unwrap();

    // Releasing the last external strong reference collects the owner.
    drop(owner);
    assert_eq!(cache.prune().unwrap(), 1);
    assert!(!entry.is_alive().unwrap());
    assert_eq!(entry.state().unwrap(), EntryState::Removed);
    assert!(!cache.contains_key("k").unwrap());
}

#[test_log::test]
fn test_owner_is_not_duplicated() {
    let cache = Cache::new();
    let a = Arc::new("owner".to_string());

    let entry = cache.get_or_add("k".to_string(), &a, produce("v"), false).unwrap();
    cache.add_owner("k".to_string(), &a, produce("v"), false).unwrap();
    assert_eq!(entry.owner_count().unwrap(), 1);
    assert_eq!(cache.try_add_owner("k", &a).unwrap(), AddOwnerOutcome::AlreadyPresent);
    assert_eq!(entry.owner_count().unwrap(), 1);
}

#[test_log::test]
fn test_liveness_follows_owners() {
    let mut rng = SmallRng::seed_from_u64(114514);
    let cache = Cache::new();
    let owners = (0..6).map(|i| Arc::new(format!("owner-{i}"))).collect_vec();
    let mut model = HashSet::new();

    for _ in 0..5000 {
        let i = rng.random_range(0..owners.len());
        match rng.random_bool(0.5) {
            true => {
                let value = cache.add_owner("k".to_string(), &owners[i], produce("v"), false).unwrap();
                assert_eq!(value.as_str(), "v");
                model.insert(i);
            }
            false => {
                assert_eq!(cache.remove_owner("k", &owners[i]).unwrap(), model.remove(&i));
            }
        }

        match cache.try_get_value("k").unwrap() {
            Some((live, _)) => {
                assert!(!model.is_empty());
                assert_eq!(live.len(), model.len());
            }
            None => assert!(model.is_empty()),
        }
    }
}
