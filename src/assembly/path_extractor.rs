//src/assembly/path_extractor.rs

use std::cmp::Ordering;

use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};

use crate::error::Result;
use crate::progress::ProgressListener;

use super::overlap_graph::OverlapGraphBuild;

/// Nodes of one path, in walking order.
pub type Path = Vec<NodeIndex>;

/// Decomposes the overlap graph into node-disjoint paths.
///
/// Every node picks its best outgoing and best incoming edge: longest
/// overlap first, then the neighbour representing more reads, then the
/// neighbour with the lower read id. An edge is followed only if it is the
/// best choice at both ends. Paths start at nodes without a followed
/// incoming edge, in node order; the remaining nodes lie on cycles, which are
/// opened at their first node. Every node ends up in exactly one path.
pub struct PathExtractor<'b> {
    build: &'b OverlapGraphBuild,
}

impl<'b> PathExtractor<'b> {
    pub fn new(build: &'b OverlapGraphBuild) -> Self {
        Self { build }
    }

    pub fn apply(&self, progress: &ProgressListener) -> Result<Vec<Path>> {
        let graph = &self.build.graph;
        let n = graph.node_count();
        progress.set_subtask("Extracting paths");
        progress.set_maximum(n as u64);

        let best_out: Vec<Option<NodeIndex>> = graph
            .node_indices()
            .map(|v| self.best(graph.edges_directed(v, Outgoing), |e| e.target()))
            .collect();
        let best_in: Vec<Option<NodeIndex>> = graph
            .node_indices()
            .map(|v| self.best(graph.edges_directed(v, Incoming), |e| e.source()))
            .collect();

        let mut next: Vec<Option<NodeIndex>> = vec![None; n];
        let mut has_prev = vec![false; n];
        for v in graph.node_indices() {
            if let Some(w) = best_out[v.index()] {
                if best_in[w.index()] == Some(v) {
                    next[v.index()] = Some(w);
                    has_prev[w.index()] = true;
                }
            }
        }

        let mut visited = vec![false; n];
        let mut paths = Vec::new();
        let starts = graph.node_indices().filter(|v| !has_prev[v.index()]);
        for start in starts.chain(graph.node_indices()) {
            if visited[start.index()] {
                continue;
            }
            let mut path = vec![start];
            visited[start.index()] = true;
            progress.increment()?;
            let mut current = start;
            while let Some(w) = next[current.index()] {
                if visited[w.index()] {
                    break;
                }
                visited[w.index()] = true;
                progress.increment()?;
                path.push(w);
                current = w;
            }
            paths.push(path);
        }

        log::debug!("Extracted {} paths from {} nodes", paths.len(), n);
        Ok(paths)
    }

    /// Best neighbour over a set of edges; `end` picks the neighbour side.
    fn best<'g, I, F>(&self, edges: I, end: F) -> Option<NodeIndex>
    where
        I: Iterator<Item = EdgeReference<'g, usize>>,
        F: Fn(&EdgeReference<'g, usize>) -> NodeIndex,
    {
        edges
            .max_by(|a, b| self.compare(*a.weight(), end(a), *b.weight(), end(b)))
            .map(|e| end(&e))
    }

    /// Orders candidate neighbours so that the preferred one is greatest.
    fn compare(&self, overlap_a: usize, node_a: NodeIndex, overlap_b: usize, node_b: NodeIndex) -> Ordering {
        let graph = &self.build.graph;
        overlap_a
            .cmp(&overlap_b)
            .then_with(|| self.build.coverage(node_a).cmp(&self.build.coverage(node_b)))
            .then_with(|| graph[node_b].cmp(&graph[node_a]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::overlap_graph::{add_overlap, OverlapGraph, OverlapGraphBuilder};
    use crate::types::ReadRecord;

    fn build_from(graph: OverlapGraph) -> OverlapGraphBuild {
        let n = graph.node_count();
        OverlapGraphBuild {
            graph,
            reads: Vec::new(),
            contained: vec![Vec::new(); n],
            skipped: 0,
        }
    }

    fn graph_with(n: usize, edges: &[(usize, usize, usize)]) -> OverlapGraph {
        let mut g = OverlapGraph::new();
        for id in 0..n {
            g.add_node(id);
        }
        for &(s, t, o) in edges {
            add_overlap(&mut g, NodeIndex::new(s), NodeIndex::new(t), o);
        }
        g
    }

    fn paths_of(build: &OverlapGraphBuild) -> Vec<Vec<usize>> {
        PathExtractor::new(build)
            .apply(&ProgressListener::silent())
            .unwrap()
            .into_iter()
            .map(|path| path.into_iter().map(NodeIndex::index).collect())
            .collect()
    }

    fn assert_partition(paths: &[Vec<usize>], n: usize) {
        let mut seen: Vec<usize> = paths.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_chain_and_isolated_node() {
        let reads = vec![
            ReadRecord::new("r1", "ACGTACGTAC"),
            ReadRecord::new("r2", "GTACGTACGG"),
            ReadRecord::new("r3", "CGGTTTT"),
        ];
        let build = OverlapGraphBuilder::new(5).apply(&reads, &ProgressListener::silent()).unwrap();
        assert_eq!(paths_of(&build), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_branch_follows_longest_overlap() {
        // 0 -> 1 (10) and 0 -> 2 (12); 1 becomes its own path
        let build = build_from(graph_with(3, &[(0, 1, 10), (0, 2, 12)]));
        let paths = paths_of(&build);
        assert_eq!(paths, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_incoming_conflict_is_resolved_at_the_target() {
        // both 0 and 1 prefer 2; 2 prefers 1 with the longer overlap
        let build = build_from(graph_with(3, &[(0, 2, 8), (1, 2, 9)]));
        assert_eq!(paths_of(&build), vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn test_ties_prefer_coverage_then_lower_id() {
        let mut build = build_from(graph_with(3, &[(0, 1, 10), (0, 2, 10)]));
        assert_eq!(paths_of(&build), vec![vec![0, 1], vec![2]]);

        build.contained[2].push(crate::assembly::overlap_graph::ContainedRead { read_id: 9, offset: 0 });
        assert_eq!(paths_of(&build), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_cycle_is_opened_once() {
        let build = build_from(graph_with(3, &[(0, 1, 5), (1, 2, 5), (2, 0, 5)]));
        let paths = paths_of(&build);
        assert_eq!(paths, vec![vec![0, 1, 2]]);
        assert_partition(&paths, 3);
    }

    #[test]
    fn test_paths_partition_the_graph() {
        let edges = [(0, 1, 6), (1, 2, 7), (3, 1, 9), (2, 4, 5), (4, 2, 5), (5, 5, 3)];
        let build = build_from(graph_with(6, &edges));
        assert_partition(&paths_of(&build), 6);
    }
}
