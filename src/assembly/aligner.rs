//src/assembly/aligner.rs

use bio::alignment::pairwise::{Aligner, MatchParams};
use bio::alignment::AlignmentOperation;

/// Decides whether a query sequence is contained, up to a minimum percent
/// identity, in a reference sequence.
pub trait ContainmentAligner {
    fn is_contained(&mut self, query: &[u8], reference: &[u8]) -> bool;
}

const MATCH: i32 = 1;
const MISMATCH: i32 = -1;
const GAP_OPEN: i32 = 0;
const GAP_EXTEND: i32 = -2;

/// Semi-global DNA aligner: the query is aligned end to end while leading and
/// trailing reference bases are free. Identity is the number of matching
/// columns over the number of alignment columns.
pub struct SemiGlobalAligner {
    min_percent_identity: f32,
    aligner: Aligner<MatchParams>,
}

impl SemiGlobalAligner {
    pub fn new(min_percent_identity: f32) -> Self {
        Self {
            min_percent_identity,
            aligner: Aligner::new(GAP_OPEN, GAP_EXTEND, MatchParams::new(MATCH, MISMATCH)),
        }
    }

    /// Aligns and returns the percent identity of the best alignment.
    pub fn align(&mut self, query: &[u8], reference: &[u8]) -> f32 {
        if query.is_empty() || reference.is_empty() {
            return 0.0;
        }
        let alignment = self.aligner.semiglobal(query, reference);
        let mut columns = 0usize;
        let mut matches = 0usize;
        for op in &alignment.operations {
            match op {
                AlignmentOperation::Match => {
                    matches += 1;
                    columns += 1;
                }
                AlignmentOperation::Subst | AlignmentOperation::Ins | AlignmentOperation::Del => columns += 1,
                AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
            }
        }
        if columns == 0 {
            return 0.0;
        }
        100.0 * matches as f32 / columns as f32
    }
}

impl ContainmentAligner for SemiGlobalAligner {
    fn is_contained(&mut self, query: &[u8], reference: &[u8]) -> bool {
        self.align(query, reference) >= self.min_percent_identity
    }
}

#[cfg(test)]
pub(crate) fn pseudo_random_dna(len: usize, seed: u64) -> String {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 33) as usize % 4] as char
        })
        .collect()
}

/// Copy of `seq` with a substitution at every given position.
#[cfg(test)]
pub(crate) fn mutate(seq: &str, positions: &[usize]) -> String {
    let mut bytes = seq.as_bytes().to_vec();
    for &p in positions {
        bytes[p] = match bytes[p] {
            b'A' => b'C',
            b'C' => b'G',
            b'G' => b'T',
            _ => b'A',
        };
    }
    String::from_utf8(bytes).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_substring_is_full_identity() {
        let reference = pseudo_random_dna(120, 7);
        let query = &reference[40..90];
        let mut aligner = SemiGlobalAligner::new(100.0);
        assert_eq!(aligner.align(query.as_bytes(), reference.as_bytes()), 100.0);
        assert!(aligner.is_contained(query.as_bytes(), reference.as_bytes()));
    }

    #[test]
    fn test_substitutions_lower_identity() {
        let reference = pseudo_random_dna(120, 11);
        let query = mutate(&reference[30..70], &[3, 10, 17, 24, 31, 38]);
        let mut aligner = SemiGlobalAligner::new(90.0);
        assert!((aligner.align(query.as_bytes(), reference.as_bytes()) - 85.0).abs() < 0.01);
        assert!(!aligner.is_contained(query.as_bytes(), reference.as_bytes()));

        let close = mutate(&reference[30..70], &[5, 25]);
        assert!((aligner.align(close.as_bytes(), reference.as_bytes()) - 95.0).abs() < 0.01);
        assert!(aligner.is_contained(close.as_bytes(), reference.as_bytes()));
    }

    #[test]
    fn test_reference_flanks_are_free() {
        // a query spanning the whole reference plus nothing else aligns fully
        let reference = pseudo_random_dna(60, 5);
        let mut aligner = SemiGlobalAligner::new(100.0);
        assert!(aligner.is_contained(reference.as_bytes(), reference.as_bytes()));
        assert!(aligner.is_contained(&reference.as_bytes()[..10], reference.as_bytes()));
        assert!(aligner.is_contained(&reference.as_bytes()[50..], reference.as_bytes()));
    }

    #[test]
    fn test_unrelated_sequences() {
        let reference = pseudo_random_dna(100, 3);
        let query = pseudo_random_dna(40, 99);
        let mut aligner = SemiGlobalAligner::new(90.0);
        assert!(!aligner.is_contained(query.as_bytes(), reference.as_bytes()));
        assert!(!aligner.is_contained(b"", reference.as_bytes()));
    }
}
