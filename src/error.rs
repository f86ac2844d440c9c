//! Error types for CFF encoding, solving and persistence

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the library layers.
#[derive(Debug, Error)]
pub enum CffError {
    /// The (d, t, n) triple cannot describe a meaningful cover-free family.
    #[error("Invalid parameters d={d}, t={t}, n={n}: {reason}")]
    InvalidParameters {
        d: usize,
        t: usize,
        n: usize,
        reason: String,
    },

    /// The formula would exceed the configured clause ceiling.
    #[error("Encoding too large: {clauses} clauses (limit {limit})")]
    EncodingTooLarge { clauses: u64, limit: u64 },

    /// A variable id does not fit the oracle's literal width.
    #[error("Variable id overflow while encoding d={d}, t={t}, n={n}")]
    VariableOverflow { d: usize, t: usize, n: usize },

    /// The SAT oracle failed to construct, accept clauses or solve.
    #[error("SAT oracle failure: {0}")]
    Oracle(String),

    /// The satisfying assignment does not match the variable layout.
    #[error("Malformed model: {0}")]
    MalformedModel(String),

    /// Brute-force verification refused to run on a family this large.
    #[error("Verifier ceiling exceeded: {blocks} blocks (max {max})")]
    VerifierLimit { blocks: usize, max: usize },

    /// The result store could not be read or written.
    #[error("Result store I/O error at {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The result store holds data that does not parse.
    #[error("Result store format error at {path}: {source}")]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenient Result alias for library code.
pub type Result<T> = std::result::Result<T, CffError>;

impl CffError {
    pub(crate) fn invalid(d: usize, t: usize, n: usize, reason: impl Into<String>) -> Self {
        CffError::InvalidParameters {
            d,
            t,
            n,
            reason: reason.into(),
        }
    }
}
