//src/assembly/contig_builder.rs

use petgraph::graph::NodeIndex;

use crate::error::Result;
use crate::progress::ProgressListener;
use crate::types::Contig;

use super::overlap_graph::OverlapGraphBuild;
use super::path_extractor::Path;

/// Filters applied to assembled paths.
#[derive(Debug, Clone, Copy)]
pub struct ContigFilter {
    pub min_reads: usize,
    pub min_av_coverage: f64,
    pub min_length: usize,
    pub allow_singletons: bool,
}

/// Contigs assembled from a set of paths, with bookkeeping on what was kept.
#[derive(Debug, Default, Clone)]
pub struct ContigBuild {
    pub contigs: Vec<Contig>,
    /// Kept contigs assembled from more than one node.
    pub count_contigs: usize,
    /// Kept single-node contigs that only passed because singletons are allowed.
    pub count_singletons: usize,
    pub rejected: usize,
}

/// Turns paths into contig sequences.
///
/// Consecutive reads are joined on their overlap. The per-base coverage
/// counts every path read and every read contained in one. A path is kept
/// if it spans at least `min_reads` reads (or is a lone node and singletons
/// are allowed), is at least `min_length` long and reaches
/// `min_av_coverage`.
pub struct ContigBuilder<'b> {
    build: &'b OverlapGraphBuild,
    filter: ContigFilter,
}

impl<'b> ContigBuilder<'b> {
    pub fn new(build: &'b OverlapGraphBuild, filter: ContigFilter) -> Self {
        Self { build, filter }
    }

    pub fn apply(&self, paths: &[Path], progress: &ProgressListener) -> Result<ContigBuild> {
        progress.set_subtask("Building contigs");
        progress.set_maximum(paths.len() as u64);

        let mut result = ContigBuild::default();
        for path in paths {
            progress.increment()?;
            let (sequence, reads, av_coverage) = self.assemble(path);

            if sequence.len() < self.filter.min_length || av_coverage < self.filter.min_av_coverage {
                result.rejected += 1;
                continue;
            }
            let singleton = reads < self.filter.min_reads;
            if singleton && !(path.len() == 1 && self.filter.allow_singletons) {
                result.rejected += 1;
                continue;
            }
            if singleton {
                result.count_singletons += 1;
            } else {
                result.count_contigs += 1;
            }

            let header = format!(
                "contig-{:06} length={} reads={} avCoverage={:.2}",
                result.contigs.len() + 1,
                sequence.len(),
                reads,
                av_coverage
            );
            result.contigs.push(Contig::new(header, sequence));
        }

        log::info!(
            "Built {} contigs and {} singletons, rejected {} paths",
            result.count_contigs,
            result.count_singletons,
            result.rejected
        );
        Ok(result)
    }

    /// Sequence, number of reads and average coverage of one path.
    fn assemble(&self, path: &[NodeIndex]) -> (String, usize, f64) {
        let graph = &self.build.graph;
        let reads = &self.build.reads;

        let mut sequence = String::new();
        let mut offsets = Vec::with_capacity(path.len());
        let mut previous: Option<NodeIndex> = None;
        for &node in path {
            let segment = &reads[graph[node]].segment;
            match previous {
                None => {
                    offsets.push(0);
                    sequence.push_str(segment);
                }
                Some(prev) => {
                    let overlap = graph
                        .find_edge(prev, node)
                        .map(|e| graph[e])
                        .expect("consecutive path nodes must be joined by an overlap edge");
                    offsets.push(sequence.len() - overlap);
                    sequence.push_str(&segment[overlap..]);
                }
            }
            previous = Some(node);
        }

        let mut coverage = vec![0u32; sequence.len()];
        let mut count = 0;
        let mut cover = |start: usize, len: usize| {
            let end = (start + len).min(coverage.len());
            for c in &mut coverage[start.min(end)..end] {
                *c += 1;
            }
        };
        for (&node, &offset) in path.iter().zip(&offsets) {
            let read_id = graph[node];
            cover(offset, reads[read_id].len());
            count += 1;
            for contained in &self.build.contained[read_id] {
                cover(offset + contained.offset, reads[contained.read_id].len());
                count += 1;
            }
        }

        let av_coverage = if coverage.is_empty() {
            0.0
        } else {
            coverage.iter().map(|&c| c as f64).sum::<f64>() / coverage.len() as f64
        };
        (sequence, count, av_coverage)
    }
}
