//src/assembly/mod.rs

//! Gene-centric assembly of the reads of one bin: overlap graph, path
//! extraction, contig building and removal of contained contigs.

mod aligner;
mod containment;
mod contig_builder;
mod overlap_graph;
mod path_extractor;
mod writer;

pub use aligner::{ContainmentAligner, SemiGlobalAligner};
pub use containment::{remove_contained_contigs, ContainmentResult};
pub use contig_builder::{ContigBuild, ContigBuilder, ContigFilter};
pub use overlap_graph::{add_overlap, ContainedRead, OverlapGraph, OverlapGraphBuild, OverlapGraphBuilder, ReadData};
pub use path_extractor::{Path, PathExtractor};
pub use writer::{write_contigs, write_overlap_graph};

use std::io::Write;

use crate::config::AssemblyParams;
use crate::error::Result;
use crate::progress::ProgressListener;
use crate::types::{Contig, ReadRecord};

/// Counts collected along one assembly run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssemblyStats {
    pub reads: usize,
    pub skipped_reads: usize,
    pub contained_reads: usize,
    pub nodes: usize,
    pub edges: usize,
    pub paths: usize,
    pub contigs: usize,
    pub singletons: usize,
    pub rejected_paths: usize,
    pub removed_contigs: usize,
}

/// Runs the assembly stages in order and keeps the intermediate results.
///
/// ```no_run
/// # use megan_rs::assembly::ReadAssembler;
/// # use megan_rs::{AssemblyParams, ProgressListener, ReadRecord};
/// # fn main() -> megan_rs::Result<()> {
/// let reads = vec![ReadRecord::new("r1", "ACGTACGTAC"), ReadRecord::new("r2", "GTACGTACGG")];
/// let progress = ProgressListener::silent();
/// let mut assembler = ReadAssembler::new("bin 1");
/// assembler.compute_overlap_graph(20, &reads, &progress)?;
/// assembler.compute_contigs(&AssemblyParams::default(), &progress)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ReadAssembler {
    label: String,
    build: OverlapGraphBuild,
    paths: Vec<Path>,
    contigs: Vec<Contig>,
    stats: AssemblyStats,
}

impl ReadAssembler {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Builds the overlap graph and extracts its paths.
    pub fn compute_overlap_graph(
        &mut self,
        min_overlap: usize,
        reads: &[ReadRecord],
        progress: &ProgressListener,
    ) -> Result<()> {
        self.build = OverlapGraphBuilder::new(min_overlap).apply(reads, progress)?;
        self.paths = PathExtractor::new(&self.build).apply(progress)?;
        self.contigs.clear();

        self.stats = AssemblyStats {
            reads: reads.len(),
            skipped_reads: self.build.skipped,
            contained_reads: self.build.contained_count(),
            nodes: self.build.graph.node_count(),
            edges: self.build.graph.edge_count(),
            paths: self.paths.len(),
            ..Default::default()
        };
        Ok(())
    }

    /// Assembles contigs from the paths, then drops contained ones.
    pub fn compute_contigs(&mut self, params: &AssemblyParams, progress: &ProgressListener) -> Result<&[Contig]> {
        let filter = ContigFilter {
            min_reads: params.min_reads,
            min_av_coverage: params.min_av_coverage,
            min_length: params.min_length,
            allow_singletons: params.allow_singletons,
        };
        let built = ContigBuilder::new(&self.build, filter).apply(&self.paths, progress)?;
        log::info!("Number of contigs: {}", built.contigs.len());

        let filtered = remove_contained_contigs(
            &built.contigs,
            params.max_percent_identity,
            params.worker_threads(),
            progress,
        )?;
        log::info!("Remaining contigs: {}", filtered.contigs.len());

        self.stats.contigs = built.count_contigs;
        self.stats.singletons = built.count_singletons;
        self.stats.rejected_paths = built.rejected;
        self.stats.removed_contigs = filtered.removed;
        self.contigs = filtered.contigs;
        Ok(&self.contigs)
    }

    pub fn write_overlap_graph<W: Write>(&self, writer: &mut W) -> Result<(usize, usize)> {
        write_overlap_graph(writer, &self.build, &self.label)
    }

    pub fn write_contigs<W: Write>(&self, writer: &mut W, progress: &ProgressListener) -> Result<()> {
        write_contigs(writer, &self.contigs, progress)
    }

    pub fn overlap_graph(&self) -> &OverlapGraphBuild {
        &self.build
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn stats(&self) -> &AssemblyStats {
        &self.stats
    }
}
