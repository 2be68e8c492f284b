//! Bounded, time-expiring cache
//!
//! Owned by a source provider to avoid re-validating or re-downloading the
//! same link within a short window. Holds at most `capacity` entries; the
//! oldest insertion is evicted first.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// A capacity-bounded map whose entries expire after `ttl`
pub struct TtlCache<K, V> {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
    order: VecDeque<K>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a live entry
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.order.retain(|k| k != key);
        self.entries.remove(key).map(|e| e.value)
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl
    }

    fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => self.is_expired(entry, now),
            None => return None,
        };
        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    fn insert_at(&mut self, key: K, value: V, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        } else {
            while self.entries.len() >= self.capacity {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    fn purge_expired_at(&mut self, now: Instant) -> usize {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_get_and_expiry() {
        let mut cache = TtlCache::new(5, TTL);
        let start = Instant::now();
        cache.insert_at("a".to_string(), 1, start);

        assert_eq!(cache.get_at(&"a".to_string(), start + Duration::from_secs(299)), Some(1));
        assert_eq!(cache.get_at(&"a".to_string(), start + TTL), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = TtlCache::new(2, TTL);
        let now = Instant::now();
        cache.insert_at(1, "one", now);
        cache.insert_at(2, "two", now);
        cache.insert_at(3, "three", now);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&1, now), None);
        assert_eq!(cache.get_at(&2, now), Some("two"));
        assert_eq!(cache.get_at(&3, now), Some("three"));
    }

    #[test]
    fn test_reinsert_refreshes_position() {
        let mut cache = TtlCache::new(2, TTL);
        let now = Instant::now();
        cache.insert_at(1, "one", now);
        cache.insert_at(2, "two", now);
        cache.insert_at(1, "uno", now);
        cache.insert_at(3, "three", now);

        assert_eq!(cache.get_at(&1, now), Some("uno"));
        assert_eq!(cache.get_at(&2, now), None);
    }

    #[test]
    fn test_purge_expired() {
        let mut cache = TtlCache::new(5, TTL);
        let start = Instant::now();
        cache.insert_at("old", 1, start);
        cache.insert_at("new", 2, start + Duration::from_secs(200));

        assert_eq!(cache.purge_expired_at(start + Duration::from_secs(350)), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&"new", start + Duration::from_secs(350)), Some(2));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = TtlCache::new(0, TTL);
        cache.insert("a", 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }
}
