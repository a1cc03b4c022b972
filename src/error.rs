use log::warn;
use thiserror::Error;

/// Failures of the symbolic engine or of model construction.
///
/// These abort a whole checking run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("variable `{0}` is declared twice")]
    DuplicateVariable(String),

    #[error("variable `{name}` has an empty domain {lo}..={hi}")]
    EmptyDomain { name: String, lo: i64, hi: i64 },

    #[error("domain of `{name}` needs {bits} bits, at most {max} are supported")]
    DomainTooWide { name: String, bits: usize, max: usize },

    #[error("value {value} is outside the domain of `{name}`")]
    OutOfDomain { name: String, value: i64 },

    #[error("`{0}` is not a boolean variable")]
    NotBoolean(String),

    #[error("`{0}` is a boolean variable and cannot be compared as an integer")]
    NotInteger(String),

    #[error("input variable `{0}` cannot appear in a state predicate")]
    InputInStatePredicate(String),

    #[error("temporal operator in `{0}` cannot be evaluated as a state predicate")]
    TemporalOperator(String),

    #[error("engine failure: {0}")]
    Other(String),
}

/// A fixpoint invariant that holds by construction was observed broken.
///
/// This points at a defect in the engine or in the algorithms, never at the
/// property being checked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    #[error("state in EG has no successor inside EG")]
    EmptyEgSuccessor,

    #[error("no knot found after {attempts} attempts")]
    KnotNotFound { attempts: usize },

    #[error("witness cycle does not close back on its first state")]
    BrokenCycle,

    #[error("tried to pick a state from an empty set")]
    EmptyPick,

    #[error("witness state lies outside every reachability layer")]
    UnreachableState,
}

impl Inconsistency {
    /// Log and convert into a [`CheckError`].
    pub(crate) fn report(self) -> CheckError {
        warn!("{}", self);
        self.into()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("internal inconsistency: {0}")]
    Inconsistency(#[from] Inconsistency),
}

pub type Result<T, E = CheckError> = std::result::Result<T, E>;
