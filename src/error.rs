use thiserror::Error;

/// A single-violation report for `strict_mode` (§7 `StrictViolation`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrictViolation {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("duplicate object key: {0:?}")]
    DuplicateKey(String),
    #[error("empty object key")]
    EmptyKey,
    #[error("multiple top-level values")]
    MultipleTopLevelValues,
}

/// The crate's single error type, covering every §7 error kind.
#[derive(Debug, Error)]
pub enum RepairError {
    /// Non-string / null input at the public API boundary.
    #[error("invalid input: {detail}")]
    InputType { detail: String },

    /// A layer hit an internal invariant violation it could not convert
    /// into a skipped-action record (stack underflow, unreachable state).
    #[error("{layer} failed at position {position:?}: {detail}")]
    LayerFailure {
        layer: &'static str,
        position: Option<usize>,
        detail: String,
    },

    /// Every layer ran; L4 still refused the result.
    #[error("validation failed: {detail}")]
    Unrepairable { detail: String },

    /// `strict_mode` rejected the input.
    #[error("strict mode: {0}")]
    StrictViolation(#[from] StrictViolation),

    /// `from_file` I/O boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// L4's underlying strict decoder surfaced a parse error.
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RepairError {
    pub fn input_type(detail: impl Into<String>) -> Self {
        RepairError::InputType {
            detail: detail.into(),
        }
    }

    pub fn layer_failure(layer: &'static str, position: Option<usize>, detail: impl Into<String>) -> Self {
        RepairError::LayerFailure {
            layer,
            position,
            detail: detail.into(),
        }
    }

    pub fn unrepairable(detail: impl Into<String>) -> Self {
        RepairError::Unrepairable {
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepairError>;
