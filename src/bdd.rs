use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::trace;

use crate::cache::Cache;
use crate::config::BddConfig;
use crate::reference::Ref;
use crate::table::Table;
use crate::utils::{pair, triple, KeyHash};

/// Decision node: `variable ? high : low`.
///
/// The terminal node has variable `0`. Decision variables start at `1`, and
/// smaller variables are closer to the root.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::INVALID,
            high: Ref::INVALID,
        }
    }
}

impl KeyHash for Node {
    fn key_hash(&self) -> u64 {
        triple(self.variable as u64, self.low.as_lit(), self.high.as_lit())
    }
}

type Storage = Table<Node>;

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum OpKey {
    Ite(Ref, Ref, Ref),
    Exists(Ref, Ref),
    AndExists(Ref, Ref, Ref),
}

impl KeyHash for OpKey {
    fn key_hash(&self) -> u64 {
        match self {
            OpKey::Ite(f, g, h) => triple(f.as_lit(), g.as_lit(), h.as_lit()),
            OpKey::Exists(f, c) => triple(1, f.as_lit(), c.as_lit()),
            OpKey::AndExists(f, g, c) => pair(triple(f.as_lit(), g.as_lit(), c.as_lit()), 2),
        }
    }
}

/// BDD manager with complemented edges.
///
/// Every function built through one manager shares its node table, so two
/// [`Ref`]s denote the same boolean function iff they are equal.
pub struct Bdd {
    storage: RefCell<Storage>,
    cache: RefCell<Cache<OpKey, Ref>>,
    size_cache: RefCell<Cache<Ref, u64>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn with_config(config: BddConfig) -> Self {
        assert!(
            config.storage_bits <= 31,
            "Storage bits should be in the range 0..=31"
        );

        let mut storage = Storage::new(config.storage_bits);

        // Allocate the terminal node:
        let one = storage.add(Node::default());
        assert_eq!(one, 1);
        let one = Ref::positive(one as u32);

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            size_cache: RefCell::new(Cache::new(config.cache_bits)),
            zero: -one,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("capacity", &storage.capacity())
            .field("size", &storage.size())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    pub fn variable(&self, index: u32) -> u32 {
        self.storage.borrow().value(index as usize).variable
    }
    pub fn low(&self, index: u32) -> Ref {
        self.storage.borrow().value(index as usize).low
    }
    pub fn high(&self, index: u32) -> Ref {
        self.storage.borrow().value(index as usize).high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        self.is_zero(node) || self.is_one(node)
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        // Handle duplicates
        if low == high {
            return low;
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        });
        Ref::positive(i as u32)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero, self.one)
    }

    /// Conjunction of signed literals, `+v` for `v` and `-v` for `¬v`.
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&v| std::cmp::Reverse(v.abs()));
        trace!("cube(literals = {:?})", literals);
        let mut current = self.one;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            current = if lit < 0 {
                self.mk_node(lit.unsigned_abs(), current, self.zero)
            } else {
                self.mk_node(lit as u32, self.zero, current)
            };
        }
        current
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        let i = node.index();
        if self.is_terminal(node) || v < self.variable(i) {
            return (node, node);
        }
        assert_eq!(v, self.variable(i));
        if node.is_negated() {
            (-self.low(i), -self.high(i))
        } else {
            (self.low(i), self.high(i))
        }
    }

    /// If-then-else: `(f ∧ g) ∨ (¬f ∧ h)`, the operation every other
    /// connective is built from.
    ///
    /// ```
    /// use bdd_mc::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let (sel, a, b) = (bdd.mk_var(1), bdd.mk_var(2), bdd.mk_var(3));
    /// let mux = bdd.apply_ite(sel, a, b);
    /// let expected = bdd.apply_and(bdd.apply_imply(sel, a), bdd.apply_imply(-sel, b));
    /// assert_eq!(mux, expected);
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        trace!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        let (mut f, mut g, mut h) = (f, g, h);
        loop {
            if let Some(res) = self.ite_shortcut(f, g, h) {
                return res;
            }
            match self.ite_rewrite(f, g, h) {
                Some(args) => (f, g, h) = args,
                None => break,
            }
        }

        // Cache only regular `f` and `g`; the complement moves to the result.
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let negate = g.is_negated();
        if negate {
            g = -g;
            h = -h;
        }

        let key = OpKey::Ite(f, g, h);
        let cached = self.cache.borrow().get(&key).copied();
        let res = match cached {
            Some(res) => res,
            None => {
                let m = [g, h]
                    .into_iter()
                    .filter(|&r| !self.is_terminal(r))
                    .map(|r| self.variable(r.index()))
                    .fold(self.variable(f.index()), u32::min);
                let (f0, f1) = self.top_cofactors(f, m);
                let (g0, g1) = self.top_cofactors(g, m);
                let (h0, h1) = self.top_cofactors(h, m);
                let res = self.mk_node(m, self.apply_ite(f0, g0, h0), self.apply_ite(f1, g1, h1));
                self.cache.borrow_mut().insert(key, res);
                res
            }
        };

        if negate {
            -res
        } else {
            res
        }
    }

    /// ITE results that need no recursion.
    fn ite_shortcut(&self, f: Ref, g: Ref, h: Ref) -> Option<Ref> {
        let (one, zero) = (self.one, self.zero);
        if f == one || g == h {
            Some(g)
        } else if f == zero {
            Some(h)
        } else if (g, h) == (one, zero) {
            Some(f)
        } else if (g, h) == (zero, one) {
            Some(-f)
        } else if g == one && h == -f {
            Some(one)
        } else if g == -f && h == zero {
            Some(zero)
        } else {
            None
        }
    }

    /// One step towards the standard form of an ITE triple, or `None` once
    /// the arguments are standard.
    fn ite_rewrite(&self, f: Ref, g: Ref, h: Ref) -> Option<(Ref, Ref, Ref)> {
        let (one, zero) = (self.one, self.zero);

        // Branches equal to `f` or `~f` are constants.
        if g == f {
            return Some((f, one, h));
        }
        if g == -f {
            return Some((f, zero, h));
        }
        if h == f {
            return Some((f, g, zero));
        }
        if h == -f {
            return Some((f, g, one));
        }

        // Symmetric forms: the condition gets the lowest top variable.
        let below_f = |r: Ref| !self.is_terminal(r) && self.variable(r.index()) < self.variable(f.index());
        if g == one && below_f(h) {
            Some((h, one, f))
        } else if h == zero && below_f(g) {
            Some((g, f, zero))
        } else if h == one && below_f(g) {
            Some((-g, -f, one))
        } else if g == zero && below_f(h) {
            Some((-h, zero, -f))
        } else {
            None
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node);
            if self.is_zero(res) {
                break;
            }
        }
        res
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node);
            if self.is_one(res) {
                break;
            }
        }
        res
    }

    /// Drop the leading variables of a positive `cube` that are above `v`.
    fn skip_cube_above(&self, mut cube: Ref, v: u32) -> Ref {
        while !self.is_one(cube) && self.variable(cube.index()) < v {
            cube = self.high_node(cube);
        }
        cube
    }

    /// Existential quantification `∃vars. f`.
    pub fn exists(&self, f: Ref, vars: &[u32]) -> Ref {
        let cube = self.cube(vars.iter().map(|&v| v as i32));
        self.exists_cube(f, cube)
    }

    /// Existential quantification over the variables of a positive cube.
    pub fn exists_cube(&self, f: Ref, cube: Ref) -> Ref {
        if self.is_terminal(f) || self.is_one(cube) {
            return f;
        }

        let v = self.variable(f.index());
        let cube = self.skip_cube_above(cube, v);
        if self.is_one(cube) {
            return f;
        }

        let key = OpKey::Exists(f, cube);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, v);
        let res = if self.variable(cube.index()) == v {
            let rest = self.high_node(cube);
            let e = self.exists_cube(f0, rest);
            if self.is_one(e) {
                e
            } else {
                let t = self.exists_cube(f1, rest);
                self.apply_or(e, t)
            }
        } else {
            let e = self.exists_cube(f0, cube);
            let t = self.exists_cube(f1, cube);
            self.mk_node(v, e, t)
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    /// Relational product `∃vars. f ∧ g`, without building `f ∧ g` first.
    pub fn rel_product(&self, f: Ref, g: Ref, vars: &[u32]) -> Ref {
        let cube = self.cube(vars.iter().map(|&v| v as i32));
        self.and_exists(f, g, cube)
    }

    fn and_exists(&self, f: Ref, g: Ref, cube: Ref) -> Ref {
        if self.is_zero(f) || self.is_zero(g) || f == -g {
            return self.zero;
        }
        if self.is_one(f) || f == g {
            return self.exists_cube(g, cube);
        }
        if self.is_one(g) {
            return self.exists_cube(f, cube);
        }
        if self.is_one(cube) {
            return self.apply_and(f, g);
        }

        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        let m = self.variable(f.index()).min(self.variable(g.index()));
        let cube = self.skip_cube_above(cube, m);
        if self.is_one(cube) {
            return self.apply_and(f, g);
        }

        let key = OpKey::AndExists(f, g, cube);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let res = if self.variable(cube.index()) == m {
            let rest = self.high_node(cube);
            let e = self.and_exists(f0, g0, rest);
            if self.is_one(e) {
                e
            } else {
                let t = self.and_exists(f1, g1, rest);
                self.apply_or(e, t)
            }
        } else {
            let e = self.and_exists(f0, g0, cube);
            let t = self.and_exists(f1, g1, cube);
            self.mk_node(m, e, t)
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    /// Replace every variable `v` in `f` by `mapping[v]` (when present).
    ///
    /// The mapping need not preserve the variable order.
    pub fn rename_vars(&self, f: Ref, mapping: &HashMap<u32, u32>) -> Ref {
        let mut cache = HashMap::new();
        self.rename_vars_(f, mapping, &mut cache)
    }

    fn rename_vars_(&self, f: Ref, mapping: &HashMap<u32, u32>, cache: &mut HashMap<Ref, Ref>) -> Ref {
        if self.is_terminal(f) {
            return f;
        }
        if f.is_negated() {
            return -self.rename_vars_(-f, mapping, cache);
        }
        if let Some(&res) = cache.get(&f) {
            return res;
        }

        let i = f.index();
        let v = self.variable(i);
        let low = self.rename_vars_(self.low(i), mapping, cache);
        let high = self.rename_vars_(self.high(i), mapping, cache);
        let w = mapping.get(&v).copied().unwrap_or(v);
        let res = self.apply_ite(self.mk_var(w), high, low);

        cache.insert(f, res);
        res
    }

    fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes reachable from `f`, the terminal included.
    pub fn size(&self, f: Ref) -> u64 {
        if let Some(&size) = self.size_cache.borrow().get(&f) {
            return size;
        }
        let size = self.descendants([f]).len() as u64;
        self.size_cache.borrow_mut().insert(f, size);
        size
    }
}
