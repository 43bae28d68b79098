//! Header and body quantization applied when a builder is finalized.
//!
//! - the byte count collapses to a log-scale length code
//! - the bucket histogram is summarized by its quartiles and two 4-bit ratios
//! - each bucket is reduced to a 2-bit class relative to those quartiles

const LOG_1_5: f64 = 0.405_465_1;
const LOG_1_3: f64 = 0.262_364_26;
const LOG_1_1: f64 = 0.095_310_180;

/// Log-scale length code, finer below 656 bytes and coarser above 3199.
pub(crate) fn length_code(len: u64) -> u8 {
    if len == 0 {
        return 0;
    }
    let ln = f64::from(len as f32).ln();
    let code = if len <= 656 {
        (ln / LOG_1_5).floor()
    } else if len <= 3199 {
        (ln / LOG_1_3 - 8.727_77).floor()
    } else {
        (ln / LOG_1_1 - 62.547_2).floor()
    };
    (code as i64 & 0xFF) as u8
}

/// 25th, 50th, and 75th percentile bucket counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Quartiles {
    pub(crate) q1: u32,
    pub(crate) q2: u32,
    pub(crate) q3: u32,
}

impl Quartiles {
    pub(crate) fn of(buckets: &[u32]) -> Self {
        let n = buckets.len();
        let mut sorted = buckets.to_vec();
        sorted.sort_unstable();
        Self {
            q1: sorted[n / 4 - 1],
            q2: sorted[n / 2 - 1],
            q3: sorted[n - n / 4 - 1],
        }
    }

    /// `(q1, q2)` relative to `q3` as 4-bit bands; zero when `q3` is zero.
    pub(crate) fn ratios(&self) -> (u8, u8) {
        if self.q3 == 0 {
            return (0, 0);
        }
        (band(self.q1, self.q3), band(self.q2, self.q3))
    }

    fn classify(&self, count: u32) -> u8 {
        if count <= self.q1 {
            0
        } else if count <= self.q2 {
            1
        } else if count <= self.q3 {
            2
        } else {
            3
        }
    }
}

fn band(q: u32, q3: u32) -> u8 {
    let pct = (q as f32 * 100.0) / q3 as f32;
    (pct as u32 % 16) as u8
}

/// Pack 2-bit classes four to a byte.
///
/// Bucket `4i + j` occupies bits `2j..2j+2` of packed byte `i`, and packed
/// byte `i` is written to `body[body.len() - 1 - i]`.
pub(crate) fn pack_body(buckets: &[u32], quartiles: &Quartiles, body: &mut [u8]) {
    debug_assert_eq!(buckets.len(), body.len() * 4);
    let last = body.len() - 1;
    for (i, chunk) in buckets.chunks_exact(4).enumerate() {
        let packed = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (j, &count)| acc | (quartiles.classify(count) << (2 * j)));
        body[last - i] = packed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_code_steps() {
        let cases = [
            (0, 0),
            (1, 0),
            (2, 1),
            (4, 3),
            (5, 3),
            (50, 9),
            (437, 14),
            (438, 15),
            (656, 15),
            (657, 16),
            (3199, 22),
            (1 << 20, 82),
        ];
        for (len, code) in cases {
            assert_eq!(length_code(len), code, "len {len}");
        }
    }

    #[test]
    fn length_code_is_monotonic_over_small_sizes() {
        let mut prev = 0;
        for len in 1..5000u64 {
            let code = length_code(len);
            assert!(code >= prev, "len {len}: {code} < {prev}");
            prev = code;
        }
    }

    #[test]
    fn quartiles_use_lower_indices() {
        let buckets: Vec<u32> = (0..128).collect();
        let q = Quartiles::of(&buckets);
        assert_eq!(q, Quartiles { q1: 31, q2: 63, q3: 95 });
        assert_eq!(q.ratios(), (32 % 16, 66 % 16));
    }

    #[test]
    fn zero_histogram_has_zero_ratios_and_body() {
        let buckets = vec![0u32; 128];
        let q = Quartiles::of(&buckets);
        assert_eq!(q.ratios(), (0, 0));
        let mut body = [0xAAu8; 32];
        pack_body(&buckets, &q, &mut body);
        assert!(body.iter().all(|&b| b == 0));
    }

    #[test]
    fn body_is_packed_low_bits_first_and_reversed() {
        let q = Quartiles { q1: 1, q2: 2, q3: 3 };
        let mut buckets = vec![0u32; 8];
        // first packed byte: classes 0, 1, 2, 3
        buckets[..4].copy_from_slice(&[0, 2, 3, 4]);
        let mut body = [0u8; 2];
        pack_body(&buckets, &q, &mut body);
        assert_eq!(body, [0, 0b11_10_01_00]);
    }
}
