//! Finalized digests: hex encoding, decoding, and distance.
//!
//! # Encoded layout
//!
//! ```text
//! checksum bytes | length code | ratio byte | body bytes
//! ```
//!
//! Checksum bytes and the length code are written nibble-swapped. The ratio
//! byte carries `ratio1` in its high nibble and `ratio2` in its low nibble.
//! Body bytes are written as stored. All fields are uppercase hex, so a
//! 128-bucket, 1-byte-checksum digest is 70 characters long.
//!
//! Newer TLSH tools prefix digests with a `T1` version tag; decoding accepts
//! either form.

use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::tables::packed_diff;

pub(crate) const MAX_CHECKSUM_LEN: usize = 3;
pub(crate) const MAX_BODY_LEN: usize = 64;

const VERSION_PREFIX: &str = "T1";
const LENGTH_RANGE: u32 = 256;
const RATIO_RANGE: u32 = 16;

/// An immutable similarity digest.
///
/// Produced by [`crate::Tlsh::finalize`] or parsed from its hex form. Lower
/// [`TlshDigest::total_diff`] means more similar input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TlshDigest {
    config: Config,
    checksum: [u8; MAX_CHECKSUM_LEN],
    length_code: u8,
    ratio1: u8,
    ratio2: u8,
    body: [u8; MAX_BODY_LEN],
}

impl TlshDigest {
    pub(crate) fn from_parts(
        config: Config,
        checksum: [u8; MAX_CHECKSUM_LEN],
        length_code: u8,
        ratio1: u8,
        ratio2: u8,
        body: [u8; MAX_BODY_LEN],
    ) -> Self {
        debug_assert!(ratio1 < 16 && ratio2 < 16);
        Self {
            config,
            checksum,
            length_code,
            ratio1,
            ratio2,
            body,
        }
    }

    /// Configuration the digest was built under.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Rolling checksum bytes (empty for checksum-less configurations).
    pub fn checksum(&self) -> &[u8] {
        &self.checksum[..self.config.checksum.get()]
    }

    /// Log-scale code of the input length.
    pub fn length_code(&self) -> u8 {
        self.length_code
    }

    /// The two 4-bit quartile ratios `(q1/q3, q2/q3)`.
    pub fn ratios(&self) -> (u8, u8) {
        (self.ratio1, self.ratio2)
    }

    /// Packed 2-bit bucket classes.
    pub fn body(&self) -> &[u8] {
        &self.body[..self.config.buckets.body_len()]
    }

    /// Uppercase hex encoding (same as `to_string()`).
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Hex encoding with the `T1` version prefix.
    pub fn to_versioned_string(&self) -> String {
        format!("{}{}", VERSION_PREFIX, self)
    }

    /// Parse a hex digest, inferring the configuration from its length.
    ///
    /// Accepts upper- or lowercase hex and an optional `T1` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.strip_prefix(VERSION_PREFIX).unwrap_or(s).as_bytes();
        let config = Config::from_encoded_len(hex.len())
            .ok_or(Error::MalformedDigest("unsupported digest length"))?;

        let bytes =
            hex::decode(hex).map_err(|_| Error::MalformedDigest("non-hex character"))?;

        let checksum_len = config.checksum.get();
        let mut checksum = [0u8; MAX_CHECKSUM_LEN];
        for (dst, &src) in checksum.iter_mut().zip(&bytes[..checksum_len]) {
            *dst = swap_nibbles(src);
        }
        let length_code = swap_nibbles(bytes[checksum_len]);
        let ratios = bytes[checksum_len + 1];
        let mut body = [0u8; MAX_BODY_LEN];
        let encoded_body = &bytes[checksum_len + 2..];
        body[..encoded_body.len()].copy_from_slice(encoded_body);

        Ok(Self::from_parts(
            config,
            checksum,
            length_code,
            ratios >> 4,
            ratios & 0x0F,
            body,
        ))
    }

    /// Weighted distance to `other`; 0 means indistinguishable.
    ///
    /// With `include_length`, differences in length code, quartile ratios, and
    /// checksum bytes are added to the body distance.
    pub fn total_diff(&self, other: &Self, include_length: bool) -> Result<u32> {
        if self.config != other.config {
            return Err(Error::IncompatibleDigests {
                left: self.config,
                right: other.config,
            });
        }

        let mut diff = 0;
        if include_length {
            let ldiff = mod_diff(self.length_code, other.length_code, LENGTH_RANGE);
            diff += if ldiff <= 1 { ldiff } else { ldiff * 12 };

            for (a, b) in [(self.ratio1, other.ratio1), (self.ratio2, other.ratio2)] {
                let qdiff = mod_diff(a, b, RATIO_RANGE);
                diff += if qdiff <= 1 { qdiff } else { (qdiff - 1) * 12 };
            }

            diff += self
                .checksum()
                .iter()
                .zip(other.checksum())
                .filter(|(a, b)| a != b)
                .count() as u32;
        }

        diff += self
            .body()
            .iter()
            .zip(other.body())
            .map(|(&a, &b)| packed_diff(a, b))
            .sum::<u32>();
        Ok(diff)
    }

    /// [`Self::total_diff`] with the header included.
    pub fn diff(&self, other: &Self) -> Result<u32> {
        self.total_diff(other, true)
    }
}

impl fmt::Display for TlshDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::with_capacity(self.config.encoded_len() / 2);
        bytes.extend(self.checksum().iter().map(|&c| swap_nibbles(c)));
        bytes.push(swap_nibbles(self.length_code));
        bytes.push(self.ratio1 << 4 | self.ratio2);
        bytes.extend_from_slice(self.body());
        f.write_str(&hex::encode_upper(bytes))
    }
}

impl FromStr for TlshDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TlshDigest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TlshDigest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn swap_nibbles(b: u8) -> u8 {
    b.rotate_left(4)
}

/// Circular distance between `x` and `y` on a ring of size `range`.
fn mod_diff(x: u8, y: u8, range: u32) -> u32 {
    let d = u32::from(x.abs_diff(y));
    d.min(range - d)
}
