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

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_storages_common_cache::CacheAccessor;
use carbonsplit_storages_common_cache::SingleFlightCache;
use carbonsplit_storages_common_cache::TableCacheKey;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;

type TestCache = SingleFlightCache<TableCacheKey, String>;

fn orders_key() -> TableCacheKey {
    TableCacheKey::new("sales", "orders", "hdfs://x/sales/orders")
}

async fn wait_for_misses(cache: &TestCache, misses: u64) {
    while cache.statistics().misses < misses {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_run_loader_once() -> Result<()> {
    let cache = Arc::new(TestCache::new("test", 0));
    let executions = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        let executions = executions.clone();
        let release = release.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_load(orders_key(), || async move {
                    executions.fetch_add(1, Ordering::SeqCst);
                    release.notified().await;
                    Ok("handle of sales.orders".to_string())
                })
                .await
        }));
    }

    wait_for_misses(&cache, 16).await;
    release.notify_one();

    let mut handles_seen = Vec::new();
    for handle in handles {
        handles_seen.push(handle.await.expect("task panicked")?);
    }

    assert_eq!(executions.load(Ordering::SeqCst), 1);
    let first = handles_seen[0].clone();
    assert!(handles_seen.iter().all(|h| Arc::ptr_eq(h, &first)));
    assert_eq!(cache.statistics().loads, 1);
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_waiters_share_failure_and_failure_is_not_cached() -> Result<()> {
    let cache = Arc::new(TestCache::new("test", 0));
    let executions = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = cache.clone();
        let executions = executions.clone();
        let release = release.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_load(orders_key(), || async move {
                    executions.fetch_add(1, Ordering::SeqCst);
                    release.notified().await;
                    Err::<String, _>(ErrorCode::StorageOther("manifest unreadable"))
                })
                .await
        }));
    }

    wait_for_misses(&cache, 4).await;
    release.notify_one();

    for handle in handles {
        let err = handle.await.expect("task panicked").unwrap_err();
        assert_eq!(err.code(), ErrorCode::STORAGE_OTHER);
        assert_eq!(err.message(), "manifest unreadable");
    }
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert!(!cache.contains_key(&orders_key()));

    // The next caller retries.
    let value = cache
        .get_or_load(orders_key(), || async { Ok("reloaded".to_string()) })
        .await?;
    assert_eq!(value.as_str(), "reloaded");
    assert_eq!(cache.statistics().loads, 2);
    assert_eq!(cache.statistics().load_failures, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_leader_releases_the_key() -> Result<()> {
    let cache = TestCache::new("test", 0);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        cache.get_or_load(orders_key(), || async {
            futures::future::pending::<()>().await;
            Ok("never".to_string())
        }),
    )
    .await;
    assert!(abandoned.is_err());

    let value = cache
        .get_or_load(orders_key(), || async { Ok("loaded".to_string()) })
        .await?;
    assert_eq!(value.as_str(), "loaded");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_relocated_table_is_a_different_entry() -> Result<()> {
    let cache = TestCache::new("test", 0);

    let old = cache
        .get_or_load(orders_key(), || async { Ok("old".to_string()) })
        .await?;
    let moved = TableCacheKey::new("sales", "orders", "s3://bucket/sales/orders");
    let new = cache
        .get_or_load(moved.clone(), || async { Ok("new".to_string()) })
        .await?;

    assert_eq!(old.as_str(), "old");
    assert_eq!(new.as_str(), "new");

    let removed = cache.invalidate_if(|k| k.is_table("sales", "orders"));
    assert_eq!(removed, 2);
    assert!(cache.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_capacity_evicts_least_recently_used() -> Result<()> {
    let cache = TestCache::new("test", 2);
    let a = TableCacheKey::new("s", "a", "loc_a");
    let b = TableCacheKey::new("s", "b", "loc_b");
    let c = TableCacheKey::new("s", "c", "loc_c");

    cache.get_or_load(a.clone(), || async { Ok("a".to_string()) }).await?;
    cache.get_or_load(b.clone(), || async { Ok("b".to_string()) }).await?;
    // Touch `a`, so `b` becomes the eviction victim.
    assert!(cache.get(&a).is_some());
    cache.get_or_load(c.clone(), || async { Ok("c".to_string()) }).await?;

    assert_eq!(cache.len(), 2);
    assert!(cache.contains_key(&a));
    assert!(!cache.contains_key(&b));
    assert!(cache.contains_key(&c));
    assert_eq!(cache.statistics().evictions, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalidation_during_load_is_respected() -> Result<()> {
    let cache = Arc::new(TestCache::new("test", 0));
    let release = Arc::new(Notify::new());

    let loading = {
        let cache = cache.clone();
        let release = release.clone();
        tokio::spawn(async move {
            cache
                .get_or_load(orders_key(), || async move {
                    release.notified().await;
                    Ok("stale".to_string())
                })
                .await
        })
    };

    wait_for_misses(&cache, 1).await;
    assert!(cache.evict(&orders_key()));
    release.notify_one();

    let value = loading.await.expect("task panicked")?;
    assert_eq!(value.as_str(), "stale");
    assert!(!cache.contains_key(&orders_key()));
    Ok(())
}

#[test]
fn test_put_and_get() {
    let cache = TestCache::new("test", 0);
    cache.put(orders_key(), Arc::new("handle".to_string()));
    assert_eq!(cache.get(&orders_key()).as_deref().map(String::as_str), Some("handle"));
    assert_eq!(orders_key().to_string(), "sales.orders@hdfs://x/sales/orders");
    cache.clear();
    assert!(cache.get(&orders_key()).is_none());
}
