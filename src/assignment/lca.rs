//src/assignment/lca.rs

use crate::active_matches::ActiveMatches;
use crate::address;
use crate::tree::ClassificationTree;
use crate::types::{ClassId, ReadBlock, NOHITS_ID, UNASSIGNED_ID};

use super::{eligible_class_ids, AssignmentAlgorithm};

/// Naive LCA: the deepest node whose address is a prefix of the addresses of
/// all eligible matches.
///
/// The address buffer is reused between calls; an instance must not be shared
/// between threads without external locking.
pub struct AssignmentUsingLca<'t> {
    cname: String,
    tree: &'t dyn ClassificationTree,
    addresses: Vec<&'t str>,
}

impl<'t> AssignmentUsingLca<'t> {
    pub fn new(cname: &str, tree: &'t dyn ClassificationTree) -> Self {
        Self {
            cname: cname.to_string(),
            tree,
            addresses: Vec::with_capacity(1000),
        }
    }

    fn collect_addresses(&mut self, active: &ActiveMatches, read: &ReadBlock, include_disabled: bool) {
        let tree = self.tree;
        for id in eligible_class_ids(tree, &self.cname, active, read, include_disabled) {
            if let Some(address) = tree.address(id) {
                self.addresses.push(address);
            }
        }
    }
}

impl AssignmentAlgorithm for AssignmentUsingLca<'_> {
    fn compute_id(&mut self, active: &ActiveMatches, read: &ReadBlock) -> ClassId {
        if read.match_count() == 0 {
            return NOHITS_ID;
        }
        if active.is_empty() {
            return UNASSIGNED_ID;
        }

        self.addresses.clear();
        self.collect_addresses(active, read, false);
        // only disabled taxa were hit, so use them
        if self.addresses.is_empty() {
            self.collect_addresses(active, read, true);
        }
        if self.addresses.is_empty() {
            return UNASSIGNED_ID;
        }

        address::remove_nested(&mut self.addresses);
        let prefix = address::longest_common_prefix(&self.addresses);
        match self.tree.address_to_id(&prefix) {
            Some(id) if id > 0 => id,
            _ => UNASSIGNED_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{test_tree, TaxonomyTree};
    use crate::types::{MatchBlock, TAXONOMY};

    fn read_with(ids: &[ClassId]) -> ReadBlock {
        ids.iter().fold(ReadBlock::new("r"), |r, &id| {
            r.with_match(MatchBlock::new(100.0, 1e-10, 95.0).with_class(TAXONOMY, id))
        })
    }

    fn assign(tree: &TaxonomyTree, ids: &[ClassId]) -> ClassId {
        let read = read_with(ids);
        let mut lca = AssignmentUsingLca::new(TAXONOMY, tree);
        lca.compute_id(&ActiveMatches::all(&read), &read)
    }

    #[test]
    fn test_zero_matches_is_nohits() {
        let tree = test_tree();
        let read = ReadBlock::new("empty");
        let mut lca = AssignmentUsingLca::new(TAXONOMY, &tree);
        assert_eq!(lca.compute_id(&ActiveMatches::from_indices([0]), &read), NOHITS_ID);
    }

    #[test]
    fn test_empty_active_set_is_unassigned() {
        let tree = test_tree();
        let read = read_with(&[1000]);
        let mut lca = AssignmentUsingLca::new(TAXONOMY, &tree);
        assert_eq!(lca.compute_id(&ActiveMatches::new(), &read), UNASSIGNED_ID);
    }

    #[test]
    fn test_lca_matches_graph_lca() {
        let tree = test_tree();
        assert_eq!(assign(&tree, &[1000]), 1000);
        assert_eq!(assign(&tree, &[1000, 101]), 10);
        assert_eq!(assign(&tree, &[1000, 110]), 2);
        assert_eq!(assign(&tree, &[1000, 3]), 1);
        assert_eq!(assign(&tree, &[100, 1000]), 1000);
        assert_eq!(assign(&tree, &[101, 101]), 101);
    }

    #[test]
    fn test_nested_scenario() {
        // 1.2.3 / 1.2.4 / 1.2.3.5 resolve to the node at 1.2
        let tree = TaxonomyTree::from_rows([
            (1, 1, "root", ""),
            (10, 1, "a", ""),
            (20, 10, "a.a", ""),
            (21, 10, "a.b", ""),
            (30, 21, "a.b.a", ""),
            (31, 21, "a.b.b", ""),
            (32, 21, "a.b.c", ""),
            (33, 21, "a.b.d", ""),
            (40, 32, "x", ""),
            (41, 32, "y", ""),
            (42, 32, "z", ""),
            (43, 32, "w", ""),
            (44, 32, "v", ""),
        ])
        .unwrap();
        assert_eq!(tree.address(32), Some("1.2.3"));
        assert_eq!(tree.address(33), Some("1.2.4"));
        assert_eq!(tree.address(44), Some("1.2.3.5"));
        assert_eq!(assign(&tree, &[32, 33, 44]), 21);
        assert_eq!(tree.address(21), Some("1.2"));
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let tree = test_tree();
        assert_eq!(assign(&tree, &[1000, 424242]), 1000);
        assert_eq!(assign(&tree, &[424242]), UNASSIGNED_ID);
        assert_eq!(assign(&tree, &[0, -5]), UNASSIGNED_ID);
    }

    #[test]
    fn test_disabled_only_as_fallback() {
        let mut tree = test_tree();
        tree.set_disabled(110, true);
        assert_eq!(assign(&tree, &[1000, 110]), 1000);
        assert_eq!(assign(&tree, &[110]), 110);
    }

    #[test]
    fn test_repeated_calls_are_idempotent() {
        let tree = test_tree();
        let read = read_with(&[1000, 101, 110]);
        let other = read_with(&[3]);
        let active = ActiveMatches::all(&read);
        let mut lca = AssignmentUsingLca::new(TAXONOMY, &tree);
        let first = lca.compute_id(&active, &read);
        lca.compute_id(&ActiveMatches::all(&other), &other);
        assert_eq!(lca.compute_id(&active, &read), first);
        assert_eq!(first, 2);
    }

    #[test]
    fn test_only_active_matches_count() {
        let tree = test_tree();
        let read = read_with(&[1000, 3]);
        let mut lca = AssignmentUsingLca::new(TAXONOMY, &tree);
        assert_eq!(lca.compute_id(&ActiveMatches::from_indices([0]), &read), 1000);
    }
}
