//! Error types for the codec
//!
//! Only the block-level wrappers can fail, and only on caller mistakes
//! (wrong slice sizes). Desynchronization and exhausted bulk buffers are
//! part of the normal streaming contract: they are reported through the
//! `synced` flag, the dropped-sample count and short consumed/written
//! counts, never as errors.

use thiserror::Error;

/// Errors returned by the block-level encode/decode wrappers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input slice has the wrong length for one block
    #[error("invalid input length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Output slice cannot hold one encoded or decoded block
    #[error("output buffer too small: need {needed} bytes, got {available}")]
    OutputTooSmall { needed: usize, available: usize },
}

/// Result type used by the block-level API
pub type CodecResult<T> = std::result::Result<T, CodecError>;
