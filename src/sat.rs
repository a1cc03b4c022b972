use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Returns one satisfying assignment of `f` restricted to `vars`, as signed
    /// literals in increasing variable order.
    ///
    /// The walk prefers the low branch at every node, and variables that do
    /// not occur on the chosen path are set to false. The result is therefore
    /// a fixed function of `f` and `vars`.
    ///
    /// Returns `None` if `f` is the constant false function.
    pub fn pick_minterm(&self, f: Ref, vars: &[u32]) -> Option<Vec<i32>> {
        if self.is_zero(f) {
            return None;
        }

        let mut path = HashMap::new();
        let mut current = f;
        while !self.is_one(current) {
            let v = self.variable(current.index());
            let low = self.low_node(current);
            if !self.is_zero(low) {
                path.insert(v, false);
                current = low;
            } else {
                path.insert(v, true);
                current = self.high_node(current);
            }
        }

        let mut vars = vars.to_vec();
        vars.sort_unstable();
        vars.dedup();
        Some(
            vars.into_iter()
                .map(|v| {
                    if path.get(&v).copied().unwrap_or(false) {
                        v as i32
                    } else {
                        -(v as i32)
                    }
                })
                .collect(),
        )
    }

    /// Number of satisfying assignments of `f` over variables `1..=num_vars`.
    pub fn sat_count(&self, f: Ref, num_vars: usize) -> BigUint {
        let max = BigUint::from(1u32) << num_vars;
        let mut cache = HashMap::new();
        self.sat_count_(f, &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let low = self.low(node.index());
        let high = self.high(node.index());

        let count_low = self.sat_count_(low, max, cache);
        let count_high = self.sat_count_(high, max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }
}
