/// Szudzik's [elegant pairing][szudzik] of two integers, with wrapping
/// arithmetic so that large node literals never overflow.
///
/// The result only selects a bucket or a cache slot; callers always compare
/// full keys afterwards.
///
/// [szudzik]: http://szudzik.com/ElegantPairing.pdf
pub fn pair(x: u64, y: u64) -> u64 {
    if x >= y {
        x.wrapping_mul(x).wrapping_add(x).wrapping_add(y)
    } else {
        y.wrapping_mul(y).wrapping_add(x)
    }
}

pub fn triple(x: u64, y: u64, z: u64) -> u64 {
    pair(pair(x, y), z)
}

/// Slot selector for [`Table`][crate::table::Table] buckets and
/// [`Cache`][crate::cache::Cache] entries.
pub trait KeyHash {
    fn key_hash(&self) -> u64;
}

impl KeyHash for (u64, u64) {
    fn key_hash(&self) -> u64 {
        pair(self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_enumerates_shells() {
        // Shell `m` holds every pair with max(x, y) == m, numbered m^2..(m+1)^2.
        for m in 0..16u64 {
            let mut codes = (0..=m)
                .flat_map(|k| [pair(k, m), pair(m, k)])
                .collect::<Vec<_>>();
            codes.sort_unstable();
            codes.dedup();
            assert_eq!(codes, (m * m..(m + 1) * (m + 1)).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_pair_is_asymmetric() {
        assert_eq!(pair(2, 5), 27);
        assert_eq!(pair(5, 2), 32);
    }

    #[test]
    fn test_wrapping() {
        let x = u64::MAX - 7;
        assert_eq!(pair(x, 0), x.wrapping_mul(x).wrapping_add(x));
        let _ = triple(x, x - 1, x - 2);
    }
}
