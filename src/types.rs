//src/types.rs

use ahash::AHashMap;

/// Identifier of a node in a classification (taxonomy or a functional tree).
/// Valid nodes are positive; the sentinels below are never tree nodes.
pub type ClassId = i32;

/// The read has no matches at all.
pub const NOHITS_ID: ClassId = -1;
/// The read has matches, but none of them led to an assignment.
pub const UNASSIGNED_ID: ClassId = -2;
/// The read was flagged as low complexity before assignment.
pub const LOW_COMPLEXITY_ID: ClassId = -3;

/// Name of the taxonomic classification.
pub const TAXONOMY: &str = "Taxonomy";

/// Human readable label for a sentinel id, `None` for ordinary ids.
pub fn sentinel_name(id: ClassId) -> Option<&'static str> {
    match id {
        NOHITS_ID => Some("No hits"),
        UNASSIGNED_ID => Some("Not assigned"),
        LOW_COMPLEXITY_ID => Some("Low complexity"),
        _ => None,
    }
}

/// One candidate reference match of a read.
#[derive(Debug, Clone, Default)]
pub struct MatchBlock {
    pub bit_score: f32,
    pub expected: f32,
    /// 0 when the aligner did not report an identity
    pub percent_identity: f32,
    /// classification name -> class id
    pub class_ids: AHashMap<String, ClassId>,
}

impl MatchBlock {
    pub fn new(bit_score: f32, expected: f32, percent_identity: f32) -> Self {
        Self {
            bit_score,
            expected,
            percent_identity,
            class_ids: AHashMap::new(),
        }
    }

    /// Builder style helper for attaching a class id under a classification.
    pub fn with_class(mut self, cname: &str, id: ClassId) -> Self {
        self.class_ids.insert(cname.to_string(), id);
        self
    }

    /// Class id of this match for the given classification, 0 if it has none.
    pub fn class_id(&self, cname: &str) -> ClassId {
        self.class_ids.get(cname).copied().unwrap_or(0)
    }
}

/// A read together with all of its candidate matches.
#[derive(Debug, Clone, Default)]
pub struct ReadBlock {
    pub name: String,
    pub sequence: Option<String>,
    /// 0 means "not computed"
    pub complexity: f32,
    pub matches: Vec<MatchBlock>,
}

impl ReadBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_match(mut self, m: MatchBlock) -> Self {
        self.matches.push(m);
        self
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn match_at(&self, i: usize) -> &MatchBlock {
        &self.matches[i]
    }
}

/// A minimal representation of a sequenced read, as fed to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub name: String,
    pub sequence: String,
}

impl ReadRecord {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }
}

/// One step of a percent-support path, root first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxPathEntry {
    pub class_id: ClassId,
    /// rounded, at most 100
    pub percent: u32,
}

/// An assembled sequence plus its descriptive header (without the leading `>`).
#[derive(Debug, Clone, PartialEq)]
pub struct Contig {
    pub header: String,
    pub sequence: String,
}

impl Contig {
    pub fn new(header: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            sequence: sequence.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_block_class_lookup() {
        let m = MatchBlock::new(80.0, 1e-5, 97.0).with_class(TAXONOMY, 562);
        assert_eq!(m.class_id(TAXONOMY), 562);
        assert_eq!(m.class_id("KEGG"), 0);
    }

    #[test]
    fn test_sentinels_are_not_tree_ids() {
        for id in [NOHITS_ID, UNASSIGNED_ID, LOW_COMPLEXITY_ID] {
            assert!(id <= 0);
            assert!(sentinel_name(id).is_some());
        }
        assert!(sentinel_name(2).is_none());
    }
}
