//src/tree.rs

use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

use crate::address;
use crate::error::{Error, Result};
use crate::types::ClassId;

/// A fixed classification tree whose nodes carry unique addresses.
///
/// Implementations must be read-only after construction; assignment engines
/// on several threads share one tree.
pub trait ClassificationTree: Send + Sync {
    fn root(&self) -> ClassId;

    /// Root-to-node address of the node, `None` if the id is not in the tree.
    fn address(&self, id: ClassId) -> Option<&str>;

    /// Reverse of [`ClassificationTree::address`].
    fn address_to_id(&self, address: &str) -> Option<ClassId>;

    fn parent(&self, id: ClassId) -> Option<ClassId>;

    /// Children in a fixed order; empty for leaves and unknown ids.
    fn children(&self, id: ClassId) -> &[ClassId];

    /// Disabled nodes are only used when a read has nothing else.
    fn is_disabled(&self, id: ClassId) -> bool;

    fn contains(&self, id: ClassId) -> bool {
        self.address(id).is_some()
    }

    fn is_ancestor_or_self(&self, ancestor: ClassId, descendant: ClassId) -> bool {
        match (self.address(ancestor), self.address(descendant)) {
            (Some(a), Some(d)) => address::is_ancestor_or_self(a, d),
            _ => false,
        }
    }

    /// Ids from `id` up to and including the root.
    fn path_to_root(&self, id: ClassId) -> Vec<ClassId> {
        let mut path = Vec::new();
        if !self.contains(id) {
            return path;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node);
        }
        path
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    parent: Option<ClassId>,
    children: Vec<ClassId>,
    name: String,
    rank: String,
}

/// Arena-backed taxonomy with precomputed addresses.
#[derive(Debug, Clone)]
pub struct TaxonomyTree {
    nodes: Vec<TreeNode>,
    id2index: AHashMap<ClassId, usize>,
    addresses: Vec<String>,
    address2id: AHashMap<String, ClassId>,
    disabled: AHashSet<ClassId>,
    root: ClassId,
}

impl TaxonomyTree {
    /// Builds the tree from `child -> parent` edges. The root is the single
    /// node whose parent is itself, zero, or absent from the map. Children are
    /// ordered by ascending id so that addresses are reproducible.
    pub fn from_parent_map(
        parent_map: &AHashMap<ClassId, ClassId>,
        name_map: &AHashMap<ClassId, String>,
        rank_map: &AHashMap<ClassId, String>,
    ) -> Result<Self> {
        let mut ids: Vec<ClassId> = parent_map.keys().copied().collect();
        ids.sort_unstable();

        if let Some(&bad) = ids.iter().find(|&&id| id <= 0) {
            return Err(Error::InvalidTree(format!("non-positive node id {}", bad)));
        }

        let mut roots = Vec::new();
        for &id in &ids {
            let parent = parent_map[&id];
            if parent == id || parent <= 0 || !parent_map.contains_key(&parent) {
                roots.push(id);
            }
        }
        let root = match roots.as_slice() {
            [single] => *single,
            [] => return Err(Error::InvalidTree("no root node".to_string())),
            many => {
                return Err(Error::InvalidTree(format!(
                    "{} root candidates, e.g. {} and {}",
                    many.len(),
                    many[0],
                    many[1]
                )))
            }
        };

        let mut nodes = Vec::with_capacity(ids.len());
        let mut id2index = AHashMap::with_capacity(ids.len());
        for &id in &ids {
            id2index.insert(id, nodes.len());
            nodes.push(TreeNode {
                parent: if id == root { None } else { Some(parent_map[&id]) },
                children: Vec::new(),
                name: name_map.get(&id).cloned().unwrap_or_default(),
                rank: rank_map.get(&id).cloned().unwrap_or_default(),
            });
        }
        // ids are sorted, so children end up in ascending order
        for &id in &ids {
            if let Some(parent) = nodes[id2index[&id]].parent {
                let pi = id2index[&parent];
                nodes[pi].children.push(id);
            }
        }

        let mut addresses = vec![String::new(); nodes.len()];
        let mut address2id = AHashMap::with_capacity(nodes.len());
        let mut reached = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back(root);
        address2id.insert(String::new(), root);
        while let Some(id) = queue.pop_front() {
            reached += 1;
            let index = id2index[&id];
            let parent_address = addresses[index].clone();
            for (k, &child) in nodes[index].children.iter().enumerate() {
                let child_address = address::child_address(&parent_address, k);
                address2id.insert(child_address.clone(), child);
                addresses[id2index[&child]] = child_address;
                queue.push_back(child);
            }
        }
        if reached != nodes.len() {
            return Err(Error::InvalidTree(format!(
                "{} of {} nodes are not reachable from root {}",
                nodes.len() - reached,
                nodes.len(),
                root
            )));
        }

        log::debug!("Built classification tree with {} nodes, root {}", nodes.len(), root);

        Ok(Self {
            nodes,
            id2index,
            addresses,
            address2id,
            disabled: AHashSet::new(),
            root,
        })
    }

    /// Convenience constructor from `(id, parent, name, rank)` rows.
    pub fn from_rows<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ClassId, ClassId, &'a str, &'a str)>,
    {
        let mut parent_map = AHashMap::new();
        let mut name_map = AHashMap::new();
        let mut rank_map = AHashMap::new();
        for (id, parent, name, rank) in rows {
            parent_map.insert(id, parent);
            name_map.insert(id, name.to_string());
            rank_map.insert(id, rank.to_string());
        }
        Self::from_parent_map(&parent_map, &name_map, &rank_map)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    pub fn rank(&self, id: ClassId) -> Option<&str> {
        self.node(id).map(|n| n.rank.as_str())
    }

    pub fn set_disabled(&mut self, id: ClassId, disabled: bool) {
        if disabled {
            self.disabled.insert(id);
        } else {
            self.disabled.remove(&id);
        }
    }

    fn node(&self, id: ClassId) -> Option<&TreeNode> {
        self.id2index.get(&id).map(|&i| &self.nodes[i])
    }
}

impl ClassificationTree for TaxonomyTree {
    fn root(&self) -> ClassId {
        self.root
    }

    fn address(&self, id: ClassId) -> Option<&str> {
        self.id2index.get(&id).map(|&i| self.addresses[i].as_str())
    }

    fn address_to_id(&self, address: &str) -> Option<ClassId> {
        self.address2id.get(address).copied()
    }

    fn parent(&self, id: ClassId) -> Option<ClassId> {
        self.node(id).and_then(|n| n.parent)
    }

    fn children(&self, id: ClassId) -> &[ClassId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn is_disabled(&self, id: ClassId) -> bool {
        self.disabled.contains(&id)
    }
}

/// Small fixture used by unit tests across the crate:
///
/// ```text
/// 1 root
/// ├── 2 Bacteria
/// │   ├── 10 Proteobacteria
/// │   │   ├── 100 Escherichia
/// │   │   │   └── 1000 E. coli
/// │   │   └── 101 Salmonella
/// │   └── 11 Firmicutes
/// │       └── 110 Bacillus
/// └── 3 Archaea
/// ```
#[cfg(test)]
pub(crate) fn test_tree() -> TaxonomyTree {
    TaxonomyTree::from_rows([
        (1, 1, "root", "no rank"),
        (2, 1, "Bacteria", "superkingdom"),
        (3, 1, "Archaea", "superkingdom"),
        (10, 2, "Proteobacteria", "phylum"),
        (11, 2, "Firmicutes", "phylum"),
        (100, 10, "Escherichia", "genus"),
        (101, 10, "Salmonella", "genus"),
        (110, 11, "Bacillus", "genus"),
        (1000, 100, "Escherichia coli", "species"),
    ])
    .expect("fixture tree is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_follow_child_order() {
        let tree = test_tree();
        assert_eq!(tree.address(1), Some(""));
        assert_eq!(tree.address(2), Some("1"));
        assert_eq!(tree.address(3), Some("2"));
        assert_eq!(tree.address(10), Some("1.1"));
        assert_eq!(tree.address(101), Some("1.1.2"));
        assert_eq!(tree.address(1000), Some("1.1.1.1"));
        assert_eq!(tree.address(999), None);
        assert_eq!(tree.address_to_id("1.2.1"), Some(110));
    }

    #[test]
    fn test_structure_queries() {
        let tree = test_tree();
        assert_eq!(tree.root(), 1);
        assert_eq!(tree.children(10), &[100, 101]);
        assert_eq!(tree.parent(1000), Some(100));
        assert_eq!(tree.parent(1), None);
        assert!(tree.is_ancestor_or_self(2, 1000));
        assert!(!tree.is_ancestor_or_self(11, 1000));
        assert_eq!(tree.path_to_root(101), vec![101, 10, 2, 1]);
        assert_eq!(tree.name(110), Some("Bacillus"));
        assert_eq!(tree.rank(10), Some("phylum"));
    }

    #[test]
    fn test_rejects_two_roots() {
        let result = TaxonomyTree::from_rows([(1, 1, "a", ""), (2, 0, "b", "")]);
        assert!(matches!(result, Err(Error::InvalidTree(_))));
    }

    #[test]
    fn test_rejects_cycle() {
        let result = TaxonomyTree::from_rows([(1, 1, "r", ""), (2, 3, "x", ""), (3, 2, "y", "")]);
        assert!(matches!(result, Err(Error::InvalidTree(_))));
    }

    #[test]
    fn test_disabled_flag() {
        let mut tree = test_tree();
        assert!(!tree.is_disabled(101));
        tree.set_disabled(101, true);
        assert!(tree.is_disabled(101));
        tree.set_disabled(101, false);
        assert!(!tree.is_disabled(101));
    }
}
