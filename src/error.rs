//! Error types for nfv-bench
//!
//! Two classes of failure exist: forgiving ones (a single field or key is
//! skipped and logged) and fail-fast ones (an experiment cannot be built).
//! Only the fail-fast class, plus the strict variants of the forgiving
//! entry points, surface as `Error`.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// nfv-bench error types
#[derive(Error, Debug)]
pub enum Error {
    /// A required field of an experiment definition is absent
    #[error("Experiment '{experiment}' is missing required field '{field}'")]
    MissingField {
        /// Experiment name, or `<unnamed>` if the name itself is missing
        experiment: String,
        /// Name of the missing field
        field: String,
    },

    /// A field of an experiment definition has the wrong shape
    #[error("Experiment '{experiment}' has invalid field '{field}': {reason}")]
    InvalidField {
        /// Experiment name
        experiment: String,
        /// Name of the offending field
        field: String,
        /// What was wrong with it
        reason: String,
    },

    /// Range macro without `min`/`max`, or with an unusable step
    #[error("Malformed range macro: {0}")]
    MalformedMacro(String),

    /// Parameter key that does not follow `ep::<kind>::<owner>::<field>`
    #[error("Invalid parameter key: {0}")]
    InvalidParameterKey(String),

    /// Two parameter groups produced the same key (strict collision policy)
    #[error("Parameter key collision: {0}\nTwo parameter groups define the same field for the same owner")]
    KeyCollision(String),

    /// `populate()` was called on an experiment that is already populated
    #[error("Experiment '{0}' is already populated")]
    AlreadyPopulated(String),

    /// Derived state was requested before `populate()`
    #[error("Experiment '{0}' has not been populated yet")]
    NotPopulated(String),

    /// The configuration space is too large to enumerate without a limit
    #[error("Configuration space of experiment '{0}' overflows usize\nSet max_experiments to enumerate a prefix of it")]
    SpaceTooLarge(String),

    /// The run-id counter cannot hand out `requested` more ids
    #[error("Run ids exhausted: cannot allocate {requested} ids starting at {next}")]
    RunIdsExhausted {
        /// Number of ids asked for
        requested: u64,
        /// Next free id when the allocation failed
        next: u64,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
