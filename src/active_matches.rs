//src/active_matches.rs

use bitvec::vec::BitVec;

use crate::config::LcaParams;
use crate::types::ReadBlock;

/// Indices of the matches of one read that take part in its assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveMatches {
    bits: BitVec,
}

impl ActiveMatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every match of the read is active.
    pub fn all(read: &ReadBlock) -> Self {
        Self {
            bits: BitVec::repeat(true, read.match_count()),
        }
    }

    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        let mut active = Self::new();
        for i in indices {
            active.set(i);
        }
        active
    }

    pub fn set(&mut self, index: usize) {
        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }
        self.bits.set(index, true);
    }

    pub fn cardinality(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Active indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Selects the matches of `read` that pass the score, expectation and
    /// identity filters for classification `cname`, then keeps only those
    /// within `top_percent` of the best bit score among them.
    pub fn compute(params: &LcaParams, read: &ReadBlock, cname: &str) -> Self {
        let mut active = Self::new();
        let mut best_score = 0f32;

        for (i, m) in read.matches.iter().enumerate() {
            if m.class_id(cname) == 0 {
                continue;
            }
            if m.bit_score < params.min_score || m.expected > params.max_expected {
                continue;
            }
            if m.percent_identity > 0.0 && m.percent_identity < params.min_percent_identity {
                continue;
            }
            active.set(i);
            best_score = best_score.max(m.bit_score);
        }

        let threshold = (1.0 - params.effective_top_percent() / 100.0) * best_score;
        let below: Vec<usize> = active
            .iter()
            .filter(|&i| read.matches[i].bit_score < threshold)
            .collect();
        for i in below {
            active.bits.set(i, false);
        }
        active
    }
}
