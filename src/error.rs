//! Error taxonomy for the chapter boundary detection pipeline.
//!
//! Only stage 1 failures and `IdentityConflict` are meant to propagate out of
//! [`crate::pipeline::Pipeline::extract_all`]. Everything else (a single
//! chapter's LM call failing, a pattern failing to compile, a uniqueness
//! violation) is isolated and folded into the per-chapter data instead of
//! aborting the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("language model call failed: {0}")]
    LMError(String),

    #[error("stage 1 returned duplicate chapter numbers: {0:?}")]
    IdentityConflict(Vec<u64>),
}

/// Per-pair failure recorded during stage 3 (validation). Never
/// propagated — always folded into a `BoundaryPair` with `is_valid =
/// false`. A zero-or-multiple match count (the uniqueness violation) isn't
/// one of these: it's the expected, common outcome of an underspecified LM
/// pattern, so it's represented directly as `is_valid = false` rather than
/// as an error variant.
#[derive(Debug, Error, Clone)]
pub enum BoundaryError {
    #[error("pattern failed to compile: {0}")]
    PatternCompileError(String),

    #[error("pattern match exceeded the per-line timeout")]
    PatternTimeoutError,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
