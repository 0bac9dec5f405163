//! Shared error type.
//!
//! Sub-crates define their own error enums; the binary converts all of them
//! through `anyhow`.

use thiserror::Error;

/// The base error type for `rq-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `rq-core`.
pub type CoreResult<T> = Result<T, CoreError>;
