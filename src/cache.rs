use std::cell::Cell;

use crate::reference::Ref;
use crate::utils::{pair, triple, KeyHash};

struct Entry<K, V> {
    key: K,
    value: V,
}

/// Direct-mapped computed table.
///
/// Each key hashes to exactly one slot; a newer entry simply overwrites the
/// older one. The full key is stored, so a hash collision is a miss and never
/// a wrong answer.
pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new table of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }
}

impl<K, V> Cache<K, V>
where
    K: KeyHash + Eq,
{
    fn index(&self, key: &K) -> usize {
        (key.key_hash() & self.bitmask) as usize
    }

    /// Get the cached result.
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.data[self.index(key)] {
            Some(entry) if &entry.key == key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Insert a result into the cache.
    pub fn insert(&mut self, key: K, value: V) {
        let index = self.index(&key);
        self.data[index] = Some(Entry { key, value });
    }
}

impl KeyHash for Ref {
    fn key_hash(&self) -> u64 {
        self.as_lit()
    }
}

impl KeyHash for (Ref, Ref) {
    fn key_hash(&self) -> u64 {
        pair(self.0.as_lit(), self.1.as_lit())
    }
}

impl KeyHash for (Ref, Ref, Ref) {
    fn key_hash(&self) -> u64 {
        triple(self.0.as_lit(), self.1.as_lit(), self.2.as_lit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_keys() {
        let (a, b, c) = (Ref::positive(2), Ref::positive(3), -Ref::positive(3));
        let mut cache = Cache::new(4);

        cache.insert((a, b, c), b);
        cache.insert((a, c, b), c);
        assert_eq!(cache.get(&(a, b, c)), Some(&b));
        assert_eq!(cache.get(&(a, c, b)), Some(&c));
        assert_eq!(cache.get(&(b, a, c)), None);

        cache.clear();
        assert_eq!(cache.get(&(a, b, c)), None);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_collision_is_a_miss() {
        // With a single slot every key collides.
        let mut cache = Cache::<(u64, u64), i32>::new(0);
        cache.insert((1, 2), 10);
        cache.insert((5, 7), 20);
        assert_eq!(cache.get(&(1, 2)), None);
        assert_eq!(cache.get(&(5, 7)), Some(&20));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }
}
