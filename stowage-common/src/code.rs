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

use std::{fmt::Debug, hash::BuildHasher, hash::Hash};

/// Key of an owner-counted cache entry.
///
/// Keys are cloned once into the index and once into the entry itself.
pub trait Key: Send + Sync + 'static + Hash + Eq + Clone + Debug {}
impl<T: Send + Sync + 'static + Hash + Eq + Clone + Debug> Key for T {}

/// An object whose presence keeps a cached value alive.
pub trait Owner: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Owner for T {}

/// Value of an owner-counted cache entry.
pub trait Value: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Value for T {}

/// Hash builder used to index cache keys.
pub trait HashBuilder: BuildHasher + Send + Sync + 'static {}
impl<T> HashBuilder for T where T: BuildHasher + Send + Sync + 'static {}

/// The default hash builder of the owner-counted cache.
pub type DefaultHashBuilder = std::hash::RandomState;
