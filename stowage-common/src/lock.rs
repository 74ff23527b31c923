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
    cell::RefCell,
    fmt::Debug,
    ops::{Deref, DerefMut},
};

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Error, Result};

thread_local! {
    /// Addresses of the checked mutexes held by the current thread.
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// A [`parking_lot::Mutex`] that knows which checked mutexes the current thread holds.
///
/// Locking a [`CheckedMutex`] again from the thread that already holds it returns an
/// [`crate::error::ErrorKind::Reentrant`] error instead of deadlocking. Callbacks that run under the lock
/// and call back into the owning structure hit this path.
pub struct CheckedMutex<T> {
    name: &'static str,
    inner: Mutex<T>,
}

impl<T> Debug for CheckedMutex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckedMutex")
            .field("name", &self.name)
            .field("held", &self.is_held_by_current_thread())
            .finish()
    }
}

impl<T> CheckedMutex<T> {
    /// Create a new checked mutex. `name` shows up in re-entry errors.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            inner: Mutex::new(value),
        }
    }

    /// Acquire the lock, blocking the current thread until it is available.
    pub fn lock(&self) -> Result<CheckedMutexGuard<'_, T>> {
        let addr = self.addr();
        if self.is_held_by_current_thread() {
            return Err(Error::reentrant(self.name));
        }
        let guard = self.inner.lock();
        HELD.with(|held| held.borrow_mut().push(addr));
        Ok(CheckedMutexGuard { guard, addr })
    }

    /// Returns `true` if the current thread holds this lock.
    pub fn is_held_by_current_thread(&self) -> bool {
        let addr = self.addr();
        HELD.with(|held| held.borrow().contains(&addr))
    }

    /// Get the name of the lock.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the mutable reference of the protected data without locking.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    fn addr(&self) -> usize {
        self as *const Self as *const () as usize
    }
}

/// RAII guard of a [`CheckedMutex`].
pub struct CheckedMutexGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    addr: usize,
}

impl<T> Deref for CheckedMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T> DerefMut for CheckedMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl<T> Drop for CheckedMutexGuard<'_, T> {
    fn drop(&mut self) {
        // The thread local may already be gone while the thread is shutting down.
        let _ = HELD.try_with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|addr| *addr == self.addr) {
                held.swap_remove(pos);
            }
        });
    }
}
