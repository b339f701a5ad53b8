// Copyright 2022 Datafuse Labs.
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

use std::hash::Hash;
use std::sync::Arc;

// The cache accessor, crate users usually working on this interface while manipulating caches
pub trait CacheAccessor<K, V>
where K: Eq + Hash
{
    fn get(&self, k: &K) -> Option<Arc<V>>;
    fn put(&self, key: K, value: Arc<V>);
    fn evict(&self, k: &K) -> bool;
    fn contains_key(&self, k: &K) -> bool;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counters of a cache since its creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    /// Loader executions, successful or not.
    pub loads: u64,
    pub load_failures: u64,
    pub evictions: u64,
}
