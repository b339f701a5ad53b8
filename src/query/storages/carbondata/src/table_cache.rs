// Copyright 2021 Datafuse Labs
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

use std::future::Future;
use std::sync::Arc;

use carbonsplit_common_exception::Result;
use carbonsplit_query_config::InnerCarbonConfig;
use carbonsplit_storages_common_cache::CacheAccessor;
use carbonsplit_storages_common_cache::CacheStatistics;
use carbonsplit_storages_common_cache::SingleFlightCache;
use carbonsplit_storages_common_cache::TableCacheKey;

use crate::CarbonTable;

/// Parsed carbon tables keyed by `(schema, table, location)`.
///
/// Shared by every planning call of a connector; populated on first use.
pub struct CarbonTableCache {
    inner: SingleFlightCache<TableCacheKey, CarbonTable>,
}

impl CarbonTableCache {
    pub fn new(capacity: usize) -> Self {
        CarbonTableCache {
            inner: SingleFlightCache::new("carbon_table_cache", capacity),
        }
    }

    pub fn create(settings: &InnerCarbonConfig) -> Arc<Self> {
        Arc::new(Self::new(settings.table_cache_capacity))
    }

    #[async_backtrace::framed]
    pub async fn get_or_load<F, Fut>(&self, key: TableCacheKey, loader: F) -> Result<Arc<CarbonTable>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CarbonTable>>,
    {
        self.inner.get_or_load(key, loader).await
    }

    pub fn get(&self, key: &TableCacheKey) -> Option<Arc<CarbonTable>> {
        self.inner.get(key)
    }

    pub fn invalidate(&self, key: &TableCacheKey) -> bool {
        self.inner.evict(key)
    }

    /// Drops the table under every location it was cached for.
    pub fn invalidate_table(&self, schema_name: &str, table_name: &str) -> usize {
        self.inner
            .invalidate_if(|key| key.is_table(schema_name, table_name))
    }

    pub fn clear(&self) {
        self.inner.clear()
    }

    pub fn contains(&self, key: &TableCacheKey) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.inner.statistics()
    }
}
