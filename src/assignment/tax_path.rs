//src/assignment/tax_path.rs

use ahash::AHashMap;
use std::fmt::Write;

use crate::active_matches::ActiveMatches;
use crate::tree::{ClassificationTree, TaxonomyTree};
use crate::types::{sentinel_name, ClassId, ReadBlock, TaxPathEntry, NOHITS_ID, UNASSIGNED_ID};

use super::{accumulate_ancestor_counts, heaviest_child, AssignmentAlgorithm};

/// Computes the assignment path of a read with percent support per node.
///
/// Each eligible match adds one to its node and every ancestor. The path
/// starts at the root and repeatedly moves to the child with the strictly
/// largest count (first child in tree order on ties), stopping when no child
/// has support. Percentages are therefore non-increasing along the path and
/// the root always has 100.
pub struct TaxonPathAssignment<'t> {
    cname: String,
    tree: &'t dyn ClassificationTree,
    counts: AHashMap<ClassId, u32>,
}

impl<'t> TaxonPathAssignment<'t> {
    pub fn new(cname: &str, tree: &'t dyn ClassificationTree) -> Self {
        Self {
            cname: cname.to_string(),
            tree,
            counts: AHashMap::new(),
        }
    }

    pub fn compute_tax_path(&mut self, active: &ActiveMatches, read: &ReadBlock) -> Vec<TaxPathEntry> {
        if read.match_count() == 0 {
            return vec![TaxPathEntry { class_id: NOHITS_ID, percent: 100 }];
        }

        let total = accumulate_ancestor_counts(self.tree, &self.cname, active, read, &mut self.counts);
        if total == 0 {
            return vec![TaxPathEntry { class_id: UNASSIGNED_ID, percent: 100 }];
        }

        let mut path = Vec::new();
        let mut node = Some(self.tree.root());
        while let Some(v) = node {
            let count = self.counts.get(&v).copied().unwrap_or(0);
            path.push(TaxPathEntry {
                class_id: v,
                percent: percent_of(count, total),
            });
            node = heaviest_child(self.tree, v, &self.counts).map(|(child, _)| child);
        }
        path
    }
}

fn percent_of(count: u32, total: u32) -> u32 {
    let percent = (100.0 * count as f64 / total as f64).round() as u32;
    percent.min(100)
}

impl AssignmentAlgorithm for TaxonPathAssignment<'_> {
    fn compute_id(&mut self, active: &ActiveMatches, read: &ReadBlock) -> ClassId {
        self.compute_tax_path(active, read)
            .last()
            .map(|entry| entry.class_id)
            .unwrap_or(UNASSIGNED_ID)
    }
}

/// How [`format_tax_path`] renders a path.
#[derive(Debug, Clone, Copy)]
pub struct PathFormat {
    pub show_ranks: bool,
    pub official_ranks_only: bool,
    pub show_taxon_ids: bool,
}

impl Default for PathFormat {
    fn default() -> Self {
        Self {
            show_ranks: true,
            official_ranks_only: true,
            show_taxon_ids: false,
        }
    }
}

/// Single-letter code of an official rank, `None` for anything else.
pub fn rank_letter(rank: &str) -> Option<char> {
    match rank.to_ascii_lowercase().as_str() {
        "superkingdom" | "domain" => Some('d'),
        "kingdom" => Some('k'),
        "phylum" => Some('p'),
        "class" => Some('c'),
        "order" => Some('o'),
        "family" => Some('f'),
        "genus" => Some('g'),
        "species" => Some('s'),
        _ => None,
    }
}

/// Renders one output line: `read; ;d__Bacteria; 100;p__Proteobacteria; 90;`.
/// The root is never printed.
pub fn format_tax_path(read_name: &str, path: &[TaxPathEntry], tree: &TaxonomyTree, format: PathFormat) -> String {
    let mut line = format!("{}; ;", read_name);
    for entry in path {
        if entry.class_id == tree.root() {
            continue;
        }
        let name = match sentinel_name(entry.class_id) {
            Some(label) => label.to_string(),
            None if format.show_taxon_ids => entry.class_id.to_string(),
            None => tree.name(entry.class_id).unwrap_or_default().to_string(),
        };
        let letter = tree.rank(entry.class_id).and_then(rank_letter);
        if format.official_ranks_only && letter.is_none() {
            continue;
        }
        match letter {
            Some(letter) if format.show_ranks => {
                let _ = write!(line, "{}__{}; {};", letter, name, entry.percent);
            }
            _ => {
                let _ = write!(line, " {}; {};", name, entry.percent);
            }
        }
    }
    line
}
