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

/// A strong or weak reference held by an owner-cache entry.
pub(crate) enum Held<T> {
    Strong(Arc<T>),
    Weak(Weak<T>),
}

impl<T> Debug for Held<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Held::Strong(_) => write!(f, "Strong"),
            Held::Weak(w) => write!(f, "Weak(live: {})", w.strong_count() > 0),
        }
    }
}

impl<T> Held<T> {
    pub(crate) fn new(target: &Arc<T>, weak: bool) -> Self {
        match weak {
            true => Held::Weak(Arc::downgrade(target)),
            false => Held::Strong(target.clone()),
        }
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<T>> {
        match self {
            Held::Strong(target) => Some(target.clone()),
            Held::Weak(target) => target.upgrade(),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        match self {
            Held::Strong(_) => true,
            Held::Weak(target) => target.strong_count() > 0,
        }
    }

    /// Switch between strong and weak holding.
    ///
    /// Returns the strong reference released by a downgrade so the caller can drop it outside of its lock. A weak
    /// reference whose target is gone stays weak.
    pub(crate) fn set_weak(&mut self, weak: bool) -> Option<Arc<T>> {
        match self {
            Held::Strong(target) if weak => {
                let downgraded = Held::Weak(Arc::downgrade(target));
                match std::mem::replace(self, downgraded) {
                    Held::Strong(target) => Some(target),
                    Held::Weak(_) => None,
                }
            }
            Held::Weak(target) if !weak => {
                if let Some(target) = target.upgrade() {
                    *self = Held::Strong(target);
                }
                None
            }
            _ => None,
        }
    }
}

/// Decides whether two owners are the same owner.
pub trait OwnerEquality<O>: Send + Sync + 'static {
    /// Returns `true` if `a` and `b` are the same owner.
    fn equals(&self, a: &O, b: &O) -> bool;
}

/// Owners are the same if they are the same object. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByAddress;

impl<O> OwnerEquality<O> for ByAddress {
    fn equals(&self, a: &O, b: &O) -> bool {
        std::ptr::eq(a, b)
    }
}

/// Owners are the same if they compare equal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByValue;

impl<O: PartialEq> OwnerEquality<O> for ByValue {
    fn equals(&self, a: &O, b: &O) -> bool {
        a == b
    }
}
