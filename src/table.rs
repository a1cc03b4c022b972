use std::cmp::min;

use crate::utils::KeyHash;

struct Entry<T> {
    value: T,
    next: usize,
}

/// Hash-consing table: every distinct value is stored once and addressed by
/// a stable index.
///
/// Values live in a flat vector; collisions are chained through `next`
/// indices, with `0` as the end-of-chain marker. Index `0` is a sentry and
/// never holds a value.
pub struct Table<T> {
    data: Vec<Entry<T>>,
    capacity: usize,
    buckets: Vec<usize>,
    bitmask: u64,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table able to hold `2^bits` values.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data = Vec::with_capacity(min(capacity, 1 << 16));
        data.push(Entry {
            value: T::default(),
            next: 0,
        });

        let buckets_bits = min(bits, 16);
        let buckets_size = 1 << buckets_bits;

        Self {
            data,
            capacity,
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
        }
    }
}

impl<T> Table<T> {
    /// Maximal number of stored values (including the sentry).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored values.
    pub fn size(&self) -> usize {
        self.data.len() - 1
    }

    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next
    }

    /// Append a value without deduplication and return its index.
    pub fn add(&mut self, value: T) -> usize {
        if self.data.len() >= self.capacity {
            panic!("Storage is full");
        }
        self.data.push(Entry { value, next: 0 });
        self.data.len() - 1
    }
}

impl<T> Table<T>
where
    T: KeyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.key_hash() & self.bitmask) as usize
    }

    /// Return the index of `value`, inserting it first if it is new.
    pub fn put(&mut self, value: T) -> usize {
        let bucket = self.bucket_index(&value);
        let mut index = self.buckets[bucket];

        if index == 0 {
            let i = self.add(value);
            self.buckets[bucket] = i;
            return i;
        }

        loop {
            if &value == self.value(index) {
                return index;
            }
            let next = self.next(index);
            if next == 0 {
                let i = self.add(value);
                self.data[index].next = i;
                return i;
            }
            index = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
    struct Item(i32);

    impl KeyHash for Item {
        fn key_hash(&self) -> u64 {
            self.0.unsigned_abs() as u64
        }
    }

    #[test]
    fn test_add() {
        let mut table = Table::new(2);
        let index = table.add(Item(42));
        assert_eq!(index, 1);
        assert_eq!(table.value(index), &Item(42));
        assert_eq!(table.next(index), 0);
    }

    #[test]
    #[should_panic(expected = "Storage is full")]
    fn test_add_too_much() {
        let mut table = Table::new(2);
        table.add(Item(1));
        table.add(Item(2));
        table.add(Item(3));
        table.add(Item(4));
    }

    #[test]
    fn test_put_deduplicates() {
        let mut table = Table::new(4);
        let a = table.put(Item(5));
        let b = table.put(Item(5));
        assert_eq!(a, b);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn test_put_chains_collisions() {
        let mut table = Table::new(2);
        let index1 = table.put(Item(5));
        let index2 = table.put(Item(-5));
        assert_ne!(index1, index2);
        assert_eq!(table.value(index1), &Item(5));
        assert_eq!(table.value(index2), &Item(-5));
        assert_eq!(table.next(index1), index2);
    }
}
