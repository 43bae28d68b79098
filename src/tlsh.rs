//! Incremental TLSH-style digest builder.
//!
//! Bytes are pushed through a 5-byte rolling window. Every byte after the
//! fourth hashes six 3-byte selections of the window into a bucket histogram
//! and advances a rolling checksum, so the result depends on byte order and
//! not just byte content.

use std::io::{self, Read};

use crate::config::Config;
use crate::digest::{TlshDigest, MAX_BODY_LEN, MAX_CHECKSUM_LEN};
use crate::error::{Error, Result};
use crate::quantize::{self, Quartiles};
use crate::tables::pearson;

/// Fewest bytes accepted by an unforced [`Tlsh::finalize`].
pub const MIN_DATA_LENGTH: u64 = 50;

const WINDOW: usize = 5;

/// `(salt, i, j)`: hash the newest byte with the bytes `i` and `j` positions back.
const SELECTIONS: [(u8, usize, usize); 6] = [
    (2, 1, 2),
    (3, 1, 3),
    (5, 2, 3),
    (7, 2, 4),
    (11, 1, 4),
    (13, 3, 4),
];

const READ_CHUNK: usize = 8 * 1024;

/// Digest builder bound to one [`Config`].
///
/// Feed bytes in order with [`Tlsh::update`], then snapshot a digest with
/// [`Tlsh::finalize`]. Finalizing does not consume or mutate the builder.
#[derive(Debug, Clone)]
pub struct Tlsh {
    config: Config,
    len: u64,
    /// Most recent byte first.
    window: [u8; WINDOW],
    checksum: [u8; MAX_CHECKSUM_LEN],
    buckets: Vec<u32>,
}

impl Tlsh {
    /// Create an empty builder.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            len: 0,
            window: [0; WINDOW],
            checksum: [0; MAX_CHECKSUM_LEN],
            buckets: vec![0; config.buckets.get()],
        }
    }

    /// Configuration this builder was created with.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Total bytes fed since creation or the last reset.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if nothing has been fed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Feed bytes, in order.
    pub fn update(&mut self, data: &[u8]) {
        let checksum_len = self.config.checksum.get();
        for &byte in data {
            self.window.copy_within(0..WINDOW - 1, 1);
            self.window[0] = byte;
            self.len += 1;
            if self.len < WINDOW as u64 {
                continue;
            }

            let w = self.window;
            let mut prev = 0u8;
            for c in &mut self.checksum[..checksum_len] {
                *c = pearson(prev, w[0], w[1], *c);
                prev = *c;
            }

            for &(salt, i, j) in &SELECTIONS {
                let idx = pearson(salt, w[0], w[i], w[j]) as usize;
                // 128-bucket digests ignore the upper half of the index range.
                if let Some(count) = self.buckets.get_mut(idx) {
                    *count = count.saturating_add(1);
                }
            }
        }
    }

    /// Feed the UTF-8 bytes of `text`.
    pub fn update_str(&mut self, text: &str) {
        self.update(text.as_bytes());
    }

    /// Feed everything `reader` yields until EOF, returning the byte count.
    ///
    /// Each chunk is fed in full before the next read.
    pub fn update_reader<R: Read>(&mut self, mut reader: R) -> Result<u64> {
        let mut buf = [0u8; READ_CHUNK];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.update(&buf[..n]);
            total += n as u64;
        }
        tracing::trace!(bytes = total, "ingested reader");
        Ok(total)
    }

    /// Clear all accumulated state, keeping the configuration.
    pub fn reset(&mut self) {
        tracing::trace!(bytes = self.len, "reset builder");
        self.len = 0;
        self.window = [0; WINDOW];
        self.checksum = [0; MAX_CHECKSUM_LEN];
        self.buckets.fill(0);
    }

    /// Build a digest of everything fed so far.
    ///
    /// Fails with [`Error::InsufficientData`] when fewer than
    /// [`MIN_DATA_LENGTH`] bytes were fed, unless `force` is set.
    pub fn finalize(&self, force: bool) -> Result<TlshDigest> {
        if !force && self.len < MIN_DATA_LENGTH {
            return Err(Error::InsufficientData {
                seen: self.len,
                required: MIN_DATA_LENGTH,
            });
        }

        let quartiles = Quartiles::of(&self.buckets);
        let (ratio1, ratio2) = quartiles.ratios();
        let length_code = quantize::length_code(self.len);

        let mut body = [0u8; MAX_BODY_LEN];
        quantize::pack_body(
            &self.buckets,
            &quartiles,
            &mut body[..self.config.buckets.body_len()],
        );

        tracing::debug!(
            bytes = self.len,
            q1 = quartiles.q1,
            q2 = quartiles.q2,
            q3 = quartiles.q3,
            forced = force,
            "finalized digest"
        );

        Ok(TlshDigest::from_parts(
            self.config,
            self.checksum,
            length_code,
            ratio1,
            ratio2,
            body,
        ))
    }
}

impl Default for Tlsh {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};

    fn random_bytes(seed: u64, n: usize) -> Vec<u8> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut buf = vec![0u8; n];
        rng.fill_bytes(&mut buf);
        buf
    }

    #[test]
    fn empty_update_is_noop() {
        let mut t = Tlsh::default();
        t.update(b"");
        assert!(t.is_empty());
        assert!(t.buckets.iter().all(|&c| c == 0));
    }

    #[test]
    fn first_four_bytes_only_fill_window() {
        let mut t = Tlsh::new(Config::high_accuracy());
        t.update(b"abcd");
        assert_eq!(t.len(), 4);
        assert!(t.buckets.iter().all(|&c| c == 0));
        assert_eq!(t.checksum, [0; MAX_CHECKSUM_LEN]);

        t.update(b"e");
        assert_eq!(t.buckets.iter().map(|&c| u64::from(c)).sum::<u64>(), 6);
        assert_eq!(t.window, *b"edcba");
    }

    #[test]
    fn both_bucket_counts_hash_the_same_selections() {
        let data = random_bytes(10, 512);
        let mut wide = Tlsh::new(Config::high_accuracy());
        wide.update(&data);
        let mut narrow = Tlsh::new(Config::compact());
        narrow.update(&data);

        let per_byte = SELECTIONS.len() as u64;
        let total = |t: &Tlsh| t.buckets.iter().map(|&c| u64::from(c)).sum::<u64>();
        assert_eq!(total(&wide), (data.len() as u64 - 4) * per_byte);
        // the compact histogram is the lower half of the wide one
        assert_eq!(narrow.buckets[..], wide.buckets[..128]);
    }

    #[test]
    fn unused_checksum_bytes_stay_zero() {
        let mut t = Tlsh::new(Config::compact());
        t.update(&random_bytes(1, 256));
        assert_eq!(&t.checksum[1..], &[0, 0]);
    }

    #[test]
    fn counters_saturate() {
        let mut t = Tlsh::new(Config::high_accuracy());
        t.buckets.fill(u32::MAX - 1);
        t.update(&random_bytes(2, 64));
        assert!(t.buckets.iter().all(|&c| c >= u32::MAX - 1));
        assert!(t.finalize(false).is_ok());
    }

    #[test]
    fn below_threshold_requires_force() {
        let mut t = Tlsh::default();
        t.update(&random_bytes(3, 49));
        assert!(matches!(
            t.finalize(false),
            Err(Error::InsufficientData { seen: 49, required: 50 })
        ));
        assert!(t.finalize(true).is_ok());

        t.update(b"x");
        assert!(t.finalize(false).is_ok());
    }

    #[test]
    fn forced_empty_digest_is_degenerate_not_an_error() {
        let d = Tlsh::default().finalize(true).unwrap();
        assert_eq!(d.length_code(), 0);
        assert_eq!(d.ratios(), (0, 0));
        assert!(d.body().iter().all(|&b| b == 0));
    }

    #[test]
    fn finalize_is_repeatable() {
        let mut t = Tlsh::default();
        t.update(&random_bytes(4, 1000));
        assert_eq!(t.finalize(false).unwrap(), t.finalize(false).unwrap());
    }

    #[test]
    fn reset_matches_fresh_builder() {
        let data = random_bytes(5, 700);
        let mut reused = Tlsh::new(Config::high_accuracy());
        reused.update(&random_bytes(6, 300));
        reused.reset();
        assert!(reused.is_empty());
        reused.update(&data);

        let mut fresh = Tlsh::new(Config::high_accuracy());
        fresh.update(&data);
        assert_eq!(reused.finalize(false).unwrap(), fresh.finalize(false).unwrap());
    }

    #[test]
    fn order_matters() {
        let data = random_bytes(7, 512);
        let mut reversed = data.clone();
        reversed.reverse();

        let mut a = Tlsh::default();
        a.update(&data);
        let mut b = Tlsh::default();
        b.update(&reversed);
        assert_ne!(a.finalize(false).unwrap(), b.finalize(false).unwrap());
    }

    #[test]
    fn shared_builder_finalizes_from_many_threads() {
        let mut t = Tlsh::new(Config::high_accuracy());
        t.update(&random_bytes(9, 2048));
        let expected = t.finalize(false).unwrap();
        let t = &t;
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(move || t.finalize(false).unwrap()))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn reader_matches_update() {
        let data = random_bytes(8, 3 * READ_CHUNK + 17);
        let mut direct = Tlsh::default();
        direct.update(&data);

        let mut read = Tlsh::default();
        let n = read.update_reader(io::Cursor::new(&data)).unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(read.finalize(false).unwrap(), direct.finalize(false).unwrap());
    }

    #[test]
    fn reader_errors_propagate() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("boom"))
            }
        }
        let mut t = Tlsh::default();
        assert!(matches!(t.update_reader(Broken), Err(Error::Io(_))));
    }
}
