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

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use futures::channel::oneshot;
use futures::future::Shared;
use futures::FutureExt;
use log::debug;
use log::warn;
use parking_lot::RwLock;

use crate::CacheAccessor;
use crate::CacheStatistics;

type LoadResult<V> = Result<Arc<V>>;
type LoadWaiter<V> = Shared<oneshot::Receiver<LoadResult<V>>>;

enum Slot<V> {
    Ready {
        value: Arc<V>,
        last_access: AtomicU64,
    },
    Loading {
        id: u64,
        waiter: LoadWaiter<V>,
    },
}

enum Flight<V> {
    Hit(Arc<V>),
    Wait(LoadWaiter<V>),
    Lead(u64, oneshot::Sender<LoadResult<V>>),
}

/// An in-memory cache whose entries are populated on demand.
///
/// For a given key at most one loader runs at a time: concurrent callers of
/// [`SingleFlightCache::get_or_load`] wait for the running load and all of
/// them observe its outcome. A failed load is handed to the waiters but never
/// stored, the next caller runs the loader again.
///
/// Populated entries are served under a shared lock. When `capacity` is not
/// zero, the least recently used populated entry is evicted on overflow.
pub struct SingleFlightCache<K, V> {
    name: String,
    capacity: usize,
    slots: RwLock<HashMap<K, Slot<V>>>,

    clock: AtomicU64,
    next_load_id: AtomicU64,

    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync,
    V: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        SingleFlightCache {
            name: name.into(),
            capacity,
            slots: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            next_load_id: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the cached value of `key`, running `loader` when it is absent.
    pub async fn get_or_load<F, Fut>(&self, key: K, loader: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let mut loader = Some(loader);
        let mut counted = false;

        loop {
            let flight = self.enter(&key, &mut counted);

            match flight {
                Flight::Hit(value) => return Ok(value),
                Flight::Wait(waiter) => match waiter.await {
                    Ok(result) => return result,
                    // The leading caller was dropped before it finished, compete again.
                    Err(_canceled) => continue,
                },
                Flight::Lead(id, sender) => {
                    let Some(loader) = loader.take() else {
                        return Err(ErrorCode::Internal(format!(
                            "cache {}: loader of {} already consumed",
                            self.name, key
                        )));
                    };

                    let guard = LoadingGuard {
                        cache: self,
                        key: &key,
                        id,
                    };

                    debug!("cache {}: loading {}", self.name, key);
                    self.loads.fetch_add(1, Ordering::Relaxed);
                    let result = loader().await.map(Arc::new);

                    match &result {
                        Ok(value) => self.complete(&key, id, value.clone()),
                        Err(cause) => {
                            self.load_failures.fetch_add(1, Ordering::Relaxed);
                            warn!("cache {}: load of {} failed: {}", self.name, key, cause);
                        }
                    }

                    drop(guard);
                    // Waiters may all be gone already.
                    let _ = sender.send(result.clone());
                    return result;
                }
            }
        }
    }

    /// Drop every entry, populated or loading, whose key matches `predicate`.
    pub fn invalidate_if<P>(&self, predicate: P) -> usize
    where P: Fn(&K) -> bool {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|k, _| !predicate(k));
        let removed = before - slots.len();
        if removed > 0 {
            debug!("cache {}: invalidated {} entries", self.name, removed);
        }
        removed
    }

    pub fn clear(&self) {
        self.slots.write().clear();
    }

    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn enter(&self, key: &K, counted: &mut bool) -> Flight<V> {
        if let Some(value) = self.get_ready(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Flight::Hit(value);
        }

        let mut slots = self.slots.write();
        match slots.get(key) {
            Some(Slot::Ready { value, last_access }) => {
                last_access.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Flight::Hit(value.clone())
            }
            Some(Slot::Loading { waiter, .. }) => {
                self.count_miss(counted);
                Flight::Wait(waiter.clone())
            }
            None => {
                self.count_miss(counted);
                let id = self.next_load_id.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = oneshot::channel();
                slots.insert(key.clone(), Slot::Loading {
                    id,
                    waiter: receiver.shared(),
                });
                Flight::Lead(id, sender)
            }
        }
    }

    fn count_miss(&self, counted: &mut bool) {
        if !*counted {
            *counted = true;
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn get_ready(&self, key: &K) -> Option<Arc<V>> {
        let slots = self.slots.read();
        match slots.get(key) {
            Some(Slot::Ready { value, last_access }) => {
                last_access.store(self.tick(), Ordering::Relaxed);
                Some(value.clone())
            }
            _ => None,
        }
    }

    // Publish a loaded value, unless the key was invalidated while loading.
    fn complete(&self, key: &K, id: u64, value: Arc<V>) {
        let mut slots = self.slots.write();
        let ours = matches!(slots.get(key), Some(Slot::Loading { id: current, .. }) if *current == id);
        if !ours {
            debug!(
                "cache {}: {} invalidated while loading, result not kept",
                self.name, key
            );
            return;
        }

        slots.insert(key.clone(), Slot::Ready {
            value,
            last_access: AtomicU64::new(self.tick()),
        });
        self.evict_overflow(&mut slots, key);
    }

    fn evict_overflow(&self, slots: &mut HashMap<K, Slot<V>>, keep: &K) {
        if self.capacity == 0 {
            return;
        }

        loop {
            let ready = slots
                .values()
                .filter(|slot| matches!(slot, Slot::Ready { .. }))
                .count();
            if ready <= self.capacity {
                return;
            }

            let victim = slots
                .iter()
                .filter(|(k, _)| *k != keep)
                .filter_map(|(k, slot)| match slot {
                    Slot::Ready { last_access, .. } => {
                        Some((last_access.load(Ordering::Relaxed), k.clone()))
                    }
                    Slot::Loading { .. } => None,
                })
                .min_by_key(|(access, _)| *access)
                .map(|(_, k)| k);

            match victim {
                None => return,
                Some(victim) => {
                    debug!("cache {}: evict {}", self.name, victim);
                    slots.remove(&victim);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl<K, V> CacheAccessor<K, V> for SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync,
    V: Send + Sync + 'static,
{
    fn get(&self, k: &K) -> Option<Arc<V>> {
        self.get_ready(k)
    }

    fn put(&self, key: K, value: Arc<V>) {
        let mut slots = self.slots.write();
        slots.insert(key.clone(), Slot::Ready {
            value,
            last_access: AtomicU64::new(self.tick()),
        });
        self.evict_overflow(&mut slots, &key);
    }

    fn evict(&self, k: &K) -> bool {
        self.slots.write().remove(k).is_some()
    }

    fn contains_key(&self, k: &K) -> bool {
        matches!(self.slots.read().get(k), Some(Slot::Ready { .. }))
    }

    fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }
}

// Releases the loading slot of a leader, including when its future is dropped mid-load.
struct LoadingGuard<'a, K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync,
    V: Send + Sync + 'static,
{
    cache: &'a SingleFlightCache<K, V>,
    key: &'a K,
    id: u64,
}

impl<K, V> Drop for LoadingGuard<'_, K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync,
    V: Send + Sync + 'static,
{
    fn drop(&mut self) {
        let mut slots = self.cache.slots.write();
        let ours = matches!(slots.get(self.key), Some(Slot::Loading { id, .. }) if *id == self.id);
        if ours {
            slots.remove(self.key);
        }
    }
}
