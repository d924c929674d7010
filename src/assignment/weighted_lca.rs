//src/assignment/weighted_lca.rs

use ahash::AHashMap;

use crate::active_matches::ActiveMatches;
use crate::tree::ClassificationTree;
use crate::types::{ClassId, ReadBlock, NOHITS_ID, UNASSIGNED_ID};

use super::{accumulate_ancestor_counts, heaviest_child, AssignmentAlgorithm};

/// LCA that only has to cover a given percentage of the eligible matches,
/// so a few stray hits elsewhere in the tree do not pull the assignment up.
///
/// Every eligible match weighs one. Starting at the root, the walk descends
/// into the heaviest child for as long as that child still carries at least
/// `percent_to_cover` of the total weight.
pub struct AssignmentUsingWeightedLca<'t> {
    cname: String,
    tree: &'t dyn ClassificationTree,
    percent_to_cover: f32,
    counts: AHashMap<ClassId, u32>,
}

impl<'t> AssignmentUsingWeightedLca<'t> {
    pub fn new(cname: &str, tree: &'t dyn ClassificationTree, percent_to_cover: f32) -> Self {
        Self {
            cname: cname.to_string(),
            tree,
            percent_to_cover: percent_to_cover.clamp(0.0, 100.0),
            counts: AHashMap::new(),
        }
    }
}

impl AssignmentAlgorithm for AssignmentUsingWeightedLca<'_> {
    fn compute_id(&mut self, active: &ActiveMatches, read: &ReadBlock) -> ClassId {
        if read.match_count() == 0 {
            return NOHITS_ID;
        }
        if active.is_empty() {
            return UNASSIGNED_ID;
        }

        let total = accumulate_ancestor_counts(self.tree, &self.cname, active, read, &mut self.counts);
        if total == 0 {
            return UNASSIGNED_ID;
        }
        let needed = ((self.percent_to_cover as f64 / 100.0) * total as f64).ceil().max(1.0) as u32;

        let mut node = self.tree.root();
        while let Some((child, count)) = heaviest_child(self.tree, node, &self.counts) {
            if count < needed {
                break;
            }
            node = child;
        }
        if node > 0 {
            node
        } else {
            UNASSIGNED_ID
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::AssignmentUsingLca;
    use crate::tree::test_tree;
    use crate::types::{MatchBlock, TAXONOMY};

    fn read_with(ids: &[ClassId]) -> ReadBlock {
        ids.iter().fold(ReadBlock::new("r"), |r, &id| {
            r.with_match(MatchBlock::new(100.0, 1e-10, 95.0).with_class(TAXONOMY, id))
        })
    }

    #[test]
    fn test_stray_hit_is_tolerated() {
        let tree = test_tree();
        let read = read_with(&[1000, 1000, 1000, 1000, 110]);
        let active = ActiveMatches::all(&read);

        let mut weighted = AssignmentUsingWeightedLca::new(TAXONOMY, &tree, 80.0);
        assert_eq!(weighted.compute_id(&active, &read), 1000);

        let mut naive = AssignmentUsingLca::new(TAXONOMY, &tree);
        assert_eq!(naive.compute_id(&active, &read), 2);
    }

    #[test]
    fn test_full_cover_equals_naive_lca() {
        let tree = test_tree();
        for ids in [&[1000, 101][..], &[1000, 110, 101], &[3, 1000], &[101]] {
            let read = read_with(ids);
            let active = ActiveMatches::all(&read);
            let mut weighted = AssignmentUsingWeightedLca::new(TAXONOMY, &tree, 100.0);
            let mut naive = AssignmentUsingLca::new(TAXONOMY, &tree);
            assert_eq!(
                weighted.compute_id(&active, &read),
                naive.compute_id(&active, &read),
                "{:?}",
                ids
            );
        }
    }

    #[test]
    fn test_ancestor_hits_are_not_folded() {
        // unlike the naive LCA, a hit on an ancestor keeps its weight there
        let tree = test_tree();
        let read = read_with(&[100, 1000]);
        let mut weighted = AssignmentUsingWeightedLca::new(TAXONOMY, &tree, 100.0);
        assert_eq!(weighted.compute_id(&ActiveMatches::all(&read), &read), 100);
    }

    #[test]
    fn test_below_threshold_stays_high() {
        let tree = test_tree();
        let read = read_with(&[1000, 1000, 1000, 110, 110]);
        let mut weighted = AssignmentUsingWeightedLca::new(TAXONOMY, &tree, 80.0);
        assert_eq!(weighted.compute_id(&ActiveMatches::all(&read), &read), 2);
    }
}
