//! Bounded least-recently-used cache owned by the goalkeeper

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Snap a value to a cache grid of `step` units
pub fn quantize(v: f32, step: f32) -> i32 {
    (v / step).round() as i32
}

/// Fixed-capacity map that evicts the least recently used entry
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    /// Front = least recently used
    order: VecDeque<K>,
    hits: u64,
    misses: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some(value) => {
                let value = value.clone();
                self.touch(key);
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    /// Cached value, or compute and store it
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    fn touch(&mut self, key: &K) {
        if let Some(idx) = self.order.iter().position(|k| k == key)
            && let Some(k) = self.order.remove(idx)
        {
            self.order.push_back(k);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_exceeds_capacity() {
        let mut cache = BoundedCache::new(4);
        for i in 0..100 {
            cache.insert(i, i * 2);
            assert!(cache.len() <= 4);
        }
        assert_eq!(cache.get(&99), Some(198));
        assert_eq!(cache.get(&0), None);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        // Touch "a" so "b" is the oldest
        assert_eq!(cache.get(&"a"), Some(1));
        cache.insert("c", 3);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_get_or_insert_computes_once() {
        let mut cache = BoundedCache::new(8);
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_insert_with((quantize(1.01, 0.05), quantize(0.49, 0.05)), || {
                calls += 1;
                0.5
            });
        }
        assert_eq!(calls, 1);
        assert!(cache.hit_rate() > 0.5);
    }

    #[test]
    fn test_quantize_groups_nearby_values() {
        assert_eq!(quantize(1.0, 0.05), quantize(1.01, 0.05));
        assert_ne!(quantize(1.0, 0.05), quantize(1.1, 0.05));
        assert_eq!(quantize(-0.01, 0.05), 0);
        assert_eq!(quantize(-30.1, 0.25), quantize(-29.95, 0.25));
        assert_ne!(quantize(1.0 / 60.0, 1e-4), quantize(1.0 / 30.0, 1e-4));
    }
}
