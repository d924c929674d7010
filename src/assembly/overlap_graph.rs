//src/assembly/overlap_graph.rs

use ahash::{AHashMap, AHashSet};
use petgraph::graph::{Graph, NodeIndex};

use crate::error::Result;
use crate::progress::ProgressListener;
use crate::reads::is_valid_sequence;
use crate::types::ReadRecord;

/// One accepted input read. `id` is its position in [`OverlapGraphBuild::reads`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadData {
    pub id: usize,
    pub name: String,
    pub segment: String,
}

impl ReadData {
    pub fn len(&self) -> usize {
        self.segment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }
}

/// A read found inside a longer read, at `offset` within the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainedRead {
    pub read_id: usize,
    pub offset: usize,
}

/// Directed overlap graph over the non-contained reads.
///
/// Node weights are read ids, edge weights overlap lengths: an edge `a -> b`
/// means the suffix of `a` equals the prefix of `b` over that many bases.
/// There is at most one edge per ordered node pair and never a self-loop.
pub type OverlapGraph = Graph<usize, usize>;

/// Adds `source -> target`, keeping the longer overlap if the pair is
/// already connected. Self-loops are ignored.
pub fn add_overlap(graph: &mut OverlapGraph, source: NodeIndex, target: NodeIndex, overlap: usize) {
    if source == target {
        return;
    }
    match graph.find_edge(source, target) {
        Some(edge) if graph[edge] >= overlap => {}
        _ => {
            graph.update_edge(source, target, overlap);
        }
    }
}

/// Everything the later assembly stages need from the read set.
#[derive(Debug, Default, Clone)]
pub struct OverlapGraphBuild {
    pub graph: OverlapGraph,
    pub reads: Vec<ReadData>,
    /// Per read id, the reads it contains.
    pub contained: Vec<Vec<ContainedRead>>,
    pub skipped: usize,
}

impl OverlapGraphBuild {
    pub fn contained_count(&self) -> usize {
        self.contained.iter().map(Vec::len).sum()
    }

    /// Number of reads represented by a node: itself plus what it contains.
    pub fn coverage(&self, node: NodeIndex) -> usize {
        1 + self.contained[self.graph[node]].len()
    }
}

/// Builds the overlap graph of a read set.
///
/// Reads with an invalid sequence are skipped. A read that occurs exactly
/// inside another read is attached to its longest container (lowest id on
/// ties) and gets no node. Between the remaining reads, an edge `a -> b` is
/// added for the longest suffix of `a` that equals a prefix of `b`, provided
/// it is at least `min_overlap` long and shorter than both reads.
pub struct OverlapGraphBuilder {
    min_overlap: usize,
}

impl OverlapGraphBuilder {
    pub fn new(min_overlap: usize) -> Self {
        Self {
            min_overlap: min_overlap.max(1),
        }
    }

    pub fn apply(&self, records: &[ReadRecord], progress: &ProgressListener) -> Result<OverlapGraphBuild> {
        let mut build = OverlapGraphBuild::default();
        for record in records {
            if is_valid_sequence(&record.sequence) {
                build.reads.push(ReadData {
                    id: build.reads.len(),
                    name: record.name.clone(),
                    segment: record.sequence.to_ascii_uppercase(),
                });
            } else {
                build.skipped += 1;
            }
        }
        if build.skipped > 0 {
            log::warn!("Skipped {} reads without a valid sequence", build.skipped);
        }
        build.contained = vec![Vec::new(); build.reads.len()];

        let is_contained = self.detect_contained(&mut build, progress)?;
        let node_of = self.add_nodes(&mut build, &is_contained);
        self.add_overlaps(&mut build, &node_of, progress)?;

        log::info!(
            "Overlap graph: {} nodes, {} edges, {} contained reads",
            build.graph.node_count(),
            build.graph.edge_count(),
            build.contained_count()
        );
        Ok(build)
    }

    fn detect_contained(&self, build: &mut OverlapGraphBuild, progress: &ProgressListener) -> Result<Vec<bool>> {
        let reads = &build.reads;
        let k = self.min_overlap;
        progress.set_subtask("Detecting contained reads");
        progress.set_maximum(reads.len() as u64);

        // every k-mer position of every read
        let mut kmers: AHashMap<&[u8], Vec<(usize, usize)>> = AHashMap::new();
        for read in reads {
            let bytes = read.segment.as_bytes();
            if bytes.len() >= k {
                for pos in 0..=bytes.len() - k {
                    kmers.entry(&bytes[pos..pos + k]).or_default().push((read.id, pos));
                }
            }
        }

        let mut order: Vec<usize> = (0..reads.len()).collect();
        order.sort_by(|&a, &b| reads[b].len().cmp(&reads[a].len()).then(a.cmp(&b)));

        let mut is_contained = vec![false; reads.len()];
        let mut accepted = vec![false; reads.len()];
        let mut accepted_order: Vec<usize> = Vec::new();
        let mut found: Vec<(usize, usize, ContainedRead)> = Vec::new();

        for &r in &order {
            progress.increment()?;
            let query = reads[r].segment.as_bytes();
            // (container length, container id, offset) of the best container so far
            let mut best: Option<(usize, usize, usize)> = None;
            let mut consider = |container: usize, offset: usize| {
                let candidate = (reads[container].len(), container, offset);
                let better = match best {
                    None => true,
                    Some((len, id, off)) => {
                        candidate.0 > len || (candidate.0 == len && (container, offset) < (id, off))
                    }
                };
                if better {
                    best = Some(candidate);
                }
            };

            if query.len() >= k {
                if let Some(hits) = kmers.get(&query[..k]) {
                    for &(other, pos) in hits {
                        if !accepted[other] {
                            continue;
                        }
                        let text = reads[other].segment.as_bytes();
                        if pos + query.len() <= text.len() && &text[pos..pos + query.len()] == query {
                            consider(other, pos);
                        }
                    }
                }
            } else {
                for &other in &accepted_order {
                    if let Some(pos) = reads[other].segment.find(reads[r].segment.as_str()) {
                        consider(other, pos);
                    }
                }
            }

            match best {
                Some((_, container, offset)) => {
                    is_contained[r] = true;
                    found.push((container, r, ContainedRead { read_id: r, offset }));
                }
                None => {
                    accepted[r] = true;
                    accepted_order.push(r);
                }
            }
        }

        found.sort_by_key(|&(container, read, _)| (container, read));
        for (container, _, contained) in found {
            build.contained[container].push(contained);
        }
        Ok(is_contained)
    }

    fn add_nodes(&self, build: &mut OverlapGraphBuild, is_contained: &[bool]) -> Vec<Option<NodeIndex>> {
        let mut node_of = vec![None; build.reads.len()];
        for read in &build.reads {
            if !is_contained[read.id] {
                node_of[read.id] = Some(build.graph.add_node(read.id));
            }
        }
        node_of
    }

    fn add_overlaps(
        &self,
        build: &mut OverlapGraphBuild,
        node_of: &[Option<NodeIndex>],
        progress: &ProgressListener,
    ) -> Result<()> {
        let k = self.min_overlap;
        let reads = &build.reads;
        let graph = &mut build.graph;
        progress.set_subtask("Computing overlaps");
        progress.set_maximum(graph.node_count() as u64);

        let mut prefixes: AHashMap<&[u8], Vec<NodeIndex>> = AHashMap::new();
        for read in reads {
            if let Some(node) = node_of[read.id] {
                if read.len() >= k {
                    prefixes.entry(&read.segment.as_bytes()[..k]).or_default().push(node);
                }
            }
        }

        let mut linked: AHashSet<NodeIndex> = AHashSet::new();
        for source in graph.node_indices() {
            progress.increment()?;
            let a = reads[graph[source]].segment.as_bytes();
            if a.len() <= k {
                continue;
            }
            linked.clear();
            // ascending start means the first hit per target is the longest overlap
            for start in 1..=a.len() - k {
                let Some(targets) = prefixes.get(&a[start..start + k]) else {
                    continue;
                };
                let overlap = a.len() - start;
                for &target in targets {
                    if target == source || linked.contains(&target) {
                        continue;
                    }
                    let b = reads[graph[target]].segment.as_bytes();
                    if overlap < b.len() && a[start..] == b[..overlap] {
                        linked.insert(target);
                        add_overlap(graph, source, target, overlap);
                    }
                }
            }
        }
        Ok(())
    }
}
