//! `tlsketch`: locality-sensitive similarity digests (TLSH-style).
//!
//! Exact cryptographic hashes change completely on any single-bit edit. A
//! TLSH digest instead summarizes the *shape* of a byte stream, so lightly
//! edited content yields digests a small [`TlshDigest::total_diff`] apart.
//!
//! Scope here is the digest itself: incremental construction, fixed-format
//! hex encoding, and a pairwise distance. Search indexes, clustering, and
//! file-walking belong in the caller.
//!
//! # Example
//!
//! ```rust
//! use tlsketch::{Config, Tlsh, TlshDigest};
//!
//! let text = "The best documentation is the UNIX source. After all, this is what \
//!             the system uses for documentation when it decides what to do next!";
//!
//! let mut builder = Tlsh::new(Config::compact());
//! builder.update_str(text);
//! let digest = builder.finalize(false).unwrap();
//!
//! let encoded = digest.to_hex();
//! assert_eq!(encoded.len(), 70);
//!
//! let decoded: TlshDigest = encoded.parse().unwrap();
//! assert_eq!(decoded.total_diff(&digest, true).unwrap(), 0);
//! ```
//!
//! # Notes
//!
//! - Input order matters: the checksum and histogram hash a rolling window.
//! - A builder must be fed by one writer at a time; finalized digests are
//!   `Copy` and can be shared freely.
//! - Digests are comparable only under the same [`Config`].

#![warn(missing_docs)]

pub mod config;
pub mod digest;
pub mod error;
mod quantize;
mod tables;
pub mod tlsh;

pub use config::{BucketCount, ChecksumLength, Config};
pub use digest::TlshDigest;
pub use error::{Error, Result};
pub use tlsh::{Tlsh, MIN_DATA_LENGTH};
