//! Digest configuration: bucket count and checksum width.
//!
//! The two axes are independent enumerations. Together they fix the encoded
//! string length, which is how [`Config::from_encoded_len`] recovers the
//! configuration of a hex digest.

use std::fmt;

/// Number of histogram buckets quantized into the digest body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BucketCount {
    /// 128 buckets (32 body bytes).
    #[default]
    Buckets128,
    /// 256 buckets (64 body bytes).
    Buckets256,
}

impl BucketCount {
    /// Number of buckets.
    pub const fn get(self) -> usize {
        match self {
            Self::Buckets128 => 128,
            Self::Buckets256 => 256,
        }
    }

    /// Body length in bytes (four 2-bit codes per byte).
    pub const fn body_len(self) -> usize {
        self.get() / 4
    }
}

/// Width of the rolling checksum carried in the digest header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChecksumLength {
    /// No checksum.
    None,
    /// One checksum byte.
    #[default]
    One,
    /// Three checksum bytes.
    Three,
}

impl ChecksumLength {
    /// Number of checksum bytes.
    pub const fn get(self) -> usize {
        match self {
            Self::None => 0,
            Self::One => 1,
            Self::Three => 3,
        }
    }
}

/// A bucket count / checksum width pairing.
///
/// Digests are only comparable when built under the same `Config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Histogram bucket count.
    pub buckets: BucketCount,
    /// Checksum width.
    pub checksum: ChecksumLength,
}

impl Config {
    /// Every supported configuration.
    pub const ALL: [Config; 6] = [
        Config::new(BucketCount::Buckets128, ChecksumLength::None),
        Config::new(BucketCount::Buckets128, ChecksumLength::One),
        Config::new(BucketCount::Buckets128, ChecksumLength::Three),
        Config::new(BucketCount::Buckets256, ChecksumLength::None),
        Config::new(BucketCount::Buckets256, ChecksumLength::One),
        Config::new(BucketCount::Buckets256, ChecksumLength::Three),
    ];

    /// Create a configuration.
    pub const fn new(buckets: BucketCount, checksum: ChecksumLength) -> Self {
        Self { buckets, checksum }
    }

    /// 128 buckets with a 1-byte checksum (the default).
    pub const fn compact() -> Self {
        Self::new(BucketCount::Buckets128, ChecksumLength::One)
    }

    /// 256 buckets with a 3-byte checksum.
    pub const fn high_accuracy() -> Self {
        Self::new(BucketCount::Buckets256, ChecksumLength::Three)
    }

    /// Length of the hex encoding for digests under this configuration.
    ///
    /// Checksum bytes, one length byte, one ratio byte, then the body; two
    /// hex characters per byte.
    pub const fn encoded_len(self) -> usize {
        (self.checksum.get() + 2 + self.buckets.body_len()) * 2
    }

    /// Infer the configuration from a hex digest length.
    pub fn from_encoded_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.encoded_len() == len)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buckets/{}-byte checksum",
            self.buckets.get(),
            self.checksum.get()
        )
    }
}
