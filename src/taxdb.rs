//src/taxdb.rs

use ahash::AHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::Result;
use crate::tree::TaxonomyTree;
use crate::types::ClassId;

pub type ParentMap = AHashMap<ClassId, ClassId>;
pub type NameMap = AHashMap<ClassId, String>;
pub type RankMap = AHashMap<ClassId, String>;

/// Parses a taxDB file in the format:
/// ```text
/// <taxid>\t<parentid>\t<taxname>\t<rank>
/// ```
/// Returns:
/// - a `ParentMap` mapping child_taxid -> parent_taxid
/// - a `NameMap` mapping taxid -> taxname
/// - a `RankMap` mapping taxid -> rank
pub fn parse_taxdb<P: AsRef<Path>>(filepath: P) -> Result<(ParentMap, NameMap, RankMap)> {
    let file = File::open(filepath)?;
    parse_taxdb_reader(file)
}

pub fn parse_taxdb_reader<R: Read>(reader: R) -> Result<(ParentMap, NameMap, RankMap)> {
    let reader = BufReader::new(reader);

    let mut parent_map = ParentMap::new();
    let mut name_map = NameMap::new();
    let mut rank_map = RankMap::new();
    let mut skipped = 0usize;

    for line_result in reader.lines() {
        let line = line_result?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();

        // Skip malformed lines
        if parts.len() < 4 {
            skipped += 1;
            continue;
        }

        let taxid: ClassId = parts[0].trim().parse().unwrap_or(0);
        let parentid: ClassId = parts[1].trim().parse().unwrap_or(0);

        if taxid > 0 {
            parent_map.insert(taxid, parentid);
            name_map.insert(taxid, parts[2].trim().to_string());
            rank_map.insert(taxid, parts[3].trim().to_string());
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        log::warn!("Skipped {} malformed taxDB lines", skipped);
    }
    Ok((parent_map, name_map, rank_map))
}

/// Loads a taxDB file straight into an addressed tree.
pub fn load_taxonomy_tree<P: AsRef<Path>>(filepath: P) -> Result<TaxonomyTree> {
    let (parent_map, name_map, rank_map) = parse_taxdb(filepath)?;
    log::info!("Loaded {} taxa", parent_map.len());
    TaxonomyTree::from_parent_map(&parent_map, &name_map, &rank_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ClassificationTree;

    const TAXDB: &str = "1\t1\troot\tno rank\n\
                         2\t1\tBacteria\tsuperkingdom\n\
                         bogus line\n\
                         561\t2\tEscherichia\tgenus\n\
                         562\t561\tEscherichia coli\tspecies\n";

    #[test]
    fn test_parse_taxdb_reader() {
        let (parents, names, ranks) = parse_taxdb_reader(TAXDB.as_bytes()).unwrap();
        assert_eq!(parents.len(), 4);
        assert_eq!(parents[&562], 561);
        assert_eq!(names[&2], "Bacteria");
        assert_eq!(ranks[&561], "genus");
    }

    #[test]
    fn test_load_tree_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxDB");
        std::fs::write(&path, TAXDB).unwrap();

        let tree = load_taxonomy_tree(&path).unwrap();
        assert_eq!(tree.root(), 1);
        assert_eq!(tree.address(562), Some("1.1.1"));
    }
}
