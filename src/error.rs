//! Error type shared by digest construction, parsing, and comparison.

use crate::config::Config;

/// Errors returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `finalize` was called without `force` before enough input was seen.
    #[error("insufficient data ({seen} bytes seen, at least {required} required)")]
    InsufficientData {
        /// Bytes fed so far.
        seen: u64,
        /// Minimum byte count for an unforced digest.
        required: u64,
    },
    /// A digest string could not be decoded.
    #[error("malformed digest: {0}")]
    MalformedDigest(&'static str),
    /// Two digests built under different configurations were compared.
    #[error("incompatible digests ({left} vs {right})")]
    IncompatibleDigests {
        /// Configuration of the left-hand digest.
        left: Config,
        /// Configuration of the right-hand digest.
        right: Config,
    },
    /// Reading input for a builder failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
