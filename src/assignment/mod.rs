pub mod lca;
pub mod tax_path;
pub mod weighted_lca;

use ahash::AHashMap;

use crate::active_matches::ActiveMatches;
use crate::config::AlgorithmKind;
use crate::tree::ClassificationTree;
use crate::types::{ClassId, ReadBlock};

pub use lca::AssignmentUsingLca;
pub use tax_path::{format_tax_path, PathFormat, TaxonPathAssignment};
pub use weighted_lca::AssignmentUsingWeightedLca;

/// Computes a single class id for a read from its active matches.
///
/// Implementations keep per-instance scratch buffers that are reused across
/// calls, hence `&mut self`: use one instance per thread.
pub trait AssignmentAlgorithm {
    fn compute_id(&mut self, active: &ActiveMatches, read: &ReadBlock) -> ClassId;
}

/// Instantiates the configured algorithm over classification `cname`.
pub fn create_assignment_algorithm<'t>(
    kind: AlgorithmKind,
    cname: &str,
    tree: &'t dyn ClassificationTree,
) -> Box<dyn AssignmentAlgorithm + 't> {
    match kind {
        AlgorithmKind::Lca => Box::new(AssignmentUsingLca::new(cname, tree)),
        AlgorithmKind::WeightedLca { percent_to_cover } => Box::new(
            AssignmentUsingWeightedLca::new(cname, tree, percent_to_cover),
        ),
        AlgorithmKind::TaxPath => Box::new(TaxonPathAssignment::new(cname, tree)),
    }
}

/// Class ids of the active matches that resolve to a tree node. Disabled
/// nodes are skipped unless `include_disabled` is set.
pub(crate) fn eligible_class_ids<'a>(
    tree: &'a dyn ClassificationTree,
    cname: &'a str,
    active: &'a ActiveMatches,
    read: &'a ReadBlock,
    include_disabled: bool,
) -> impl Iterator<Item = ClassId> + 'a {
    active
        .iter()
        .take_while(move |&i| i < read.match_count())
        .map(move |i| read.match_at(i).class_id(cname))
        .filter(move |&id| {
            id > 0 && tree.contains(id) && (include_disabled || !tree.is_disabled(id))
        })
}

/// Adds one to every node on the path from each eligible match up to the
/// root. Falls back to disabled nodes when nothing else counted. Returns the
/// number of matches that contributed.
pub(crate) fn accumulate_ancestor_counts(
    tree: &dyn ClassificationTree,
    cname: &str,
    active: &ActiveMatches,
    read: &ReadBlock,
    counts: &mut AHashMap<ClassId, u32>,
) -> u32 {
    counts.clear();
    for include_disabled in [false, true] {
        let mut total = 0u32;
        for id in eligible_class_ids(tree, cname, active, read, include_disabled) {
            total += 1;
            let mut node = Some(id);
            while let Some(v) = node {
                *counts.entry(v).or_insert(0) += 1;
                node = tree.parent(v);
            }
        }
        if total > 0 {
            return total;
        }
    }
    0
}

/// Among the children of `node`, the one with the strictly largest count,
/// first in child order on ties. `None` if no child has a positive count.
pub(crate) fn heaviest_child(
    tree: &dyn ClassificationTree,
    node: ClassId,
    counts: &AHashMap<ClassId, u32>,
) -> Option<(ClassId, u32)> {
    let mut best: Option<(ClassId, u32)> = None;
    for &child in tree.children(node) {
        let count = counts.get(&child).copied().unwrap_or(0);
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((child, count));
        }
    }
    best
}
