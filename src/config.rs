/// Sizing of the BDD manager tables.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BddConfig {
    /// The unique table holds up to `2^storage_bits` nodes.
    pub storage_bits: usize,
    /// The computed table has `2^cache_bits` slots.
    pub cache_bits: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 20,
            cache_bits: 16,
        }
    }
}

impl BddConfig {
    /// Sets the storage size; the cache is capped to it.
    pub fn with_storage_bits(mut self, storage_bits: usize) -> Self {
        self.storage_bits = storage_bits;
        self.cache_bits = self.cache_bits.min(storage_bits);
        self
    }

    pub fn with_cache_bits(mut self, cache_bits: usize) -> Self {
        self.cache_bits = cache_bits;
        self
    }
}

/// Knobs of a checking session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CheckerConfig {
    /// Retry bound of the knot search in reactivity checking. Running out of
    /// attempts is reported as an internal inconsistency.
    pub max_knot_attempts: usize,
    /// Memoize propositional formula evaluations for the session.
    pub cache_formulas: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_knot_attempts: 100,
            cache_formulas: true,
        }
    }
}

impl CheckerConfig {
    pub fn with_max_knot_attempts(mut self, max_knot_attempts: usize) -> Self {
        self.max_knot_attempts = max_knot_attempts;
        self
    }

    pub fn with_cache_formulas(mut self, cache_formulas: bool) -> Self {
        self.cache_formulas = cache_formulas;
        self
    }
}
