// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod progress;
pub mod address;
pub mod tree;
pub mod taxdb;
pub mod active_matches;
pub mod assignment;
pub mod reads;
pub mod assembly;

use rayon::prelude::*;

pub use crate::active_matches::ActiveMatches;
pub use crate::assembly::{AssemblyStats, ReadAssembler};
pub use crate::assignment::{create_assignment_algorithm, format_tax_path, AssignmentAlgorithm, PathFormat, TaxonPathAssignment};
pub use crate::config::{AlgorithmKind, AssemblyParams, LcaParams};
pub use crate::error::{Error, Result};
pub use crate::progress::{CancelHandle, ProgressListener};
pub use crate::tree::{ClassificationTree, TaxonomyTree};
pub use crate::types::{ClassId, Contig, MatchBlock, ReadBlock, ReadRecord, TaxPathEntry, LOW_COMPLEXITY_ID, NOHITS_ID, UNASSIGNED_ID};

/// Assignment of one read: the class id chosen by the configured algorithm
/// and the percent-support path from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadAssignment {
    pub read_name: String,
    pub class_id: ClassId,
    pub tax_path: Vec<TaxPathEntry>,
}

/// Per-read assignments, in input order.
#[derive(Debug, Default, Clone)]
pub struct AssignmentResults {
    pub assignments: Vec<ReadAssignment>,
    pub reads_in: usize,
    /// Reads that received a real class (not a sentinel).
    pub reads_assigned: usize,
}

impl AssignmentResults {
    /// Every read yields exactly one assignment, sentinels included.
    pub fn reads_out(&self) -> usize {
        self.assignments.len()
    }

    /// One formatted path line per read.
    pub fn tax_path_lines(&self, tree: &TaxonomyTree, format: PathFormat) -> Vec<String> {
        self.assignments
            .iter()
            .map(|a| format_tax_path(&a.read_name, &a.tax_path, tree, format))
            .collect()
    }
}

/// Assigns every read to a node of `tree` over classification `cname`.
///
/// Active matches are selected per read with `params`; reads whose
/// complexity falls below `params.min_complexity` go to `LOW_COMPLEXITY_ID`.
/// Reads are processed in parallel with one algorithm instance per worker.
pub fn assign_reads(
    tree: &TaxonomyTree,
    reads: &[ReadBlock],
    cname: &str,
    params: &LcaParams,
    progress: &ProgressListener,
) -> Result<AssignmentResults> {
    params.validate()?;
    progress.set_subtask("Assigning reads");
    progress.set_maximum(reads.len() as u64);

    let assignments = reads
        .par_iter()
        .map_init(
            || {
                // the path algorithm already yields the class id as its last entry
                let algorithm = match params.algorithm {
                    AlgorithmKind::TaxPath => None,
                    kind => Some(create_assignment_algorithm(kind, cname, tree)),
                };
                (algorithm, TaxonPathAssignment::new(cname, tree))
            },
            |(algorithm, path_algorithm), read| {
                progress.increment()?;
                if is_low_complexity(read, params) {
                    return Ok(ReadAssignment {
                        read_name: read.name.clone(),
                        class_id: LOW_COMPLEXITY_ID,
                        tax_path: vec![TaxPathEntry {
                            class_id: LOW_COMPLEXITY_ID,
                            percent: 100,
                        }],
                    });
                }
                let active = ActiveMatches::compute(params, read, cname);
                let tax_path = path_algorithm.compute_tax_path(&active, read);
                let class_id = match algorithm {
                    Some(algorithm) => algorithm.compute_id(&active, read),
                    None => tax_path.last().map_or(UNASSIGNED_ID, |entry| entry.class_id),
                };
                Ok(ReadAssignment {
                    read_name: read.name.clone(),
                    class_id,
                    tax_path,
                })
            },
        )
        .collect::<Result<Vec<_>>>()?;

    let reads_assigned = assignments.iter().filter(|a| a.class_id > 0).count();
    log::info!("Reads in: {}", reads.len());
    log::info!("Reads assigned: {}", reads_assigned);
    Ok(AssignmentResults {
        assignments,
        reads_in: reads.len(),
        reads_assigned,
    })
}

fn is_low_complexity(read: &ReadBlock, params: &LcaParams) -> bool {
    params.min_complexity > 0.0 && read.complexity > 0.0 && read.complexity + 0.01 < params.min_complexity
}

/// Assembles contigs from reads: overlap graph, paths, contigs, then removal
/// of contained contigs. At most `params.max_number_of_reads` reads are used.
pub fn assemble_reads(reads: &[ReadRecord], params: &AssemblyParams, progress: &ProgressListener) -> Result<ReadAssembler> {
    params.validate()?;
    let reads = match params.max_number_of_reads {
        Some(max) if reads.len() > max => {
            log::info!("Using the first {} of {} reads", max, reads.len());
            &reads[..max]
        }
        _ => reads,
    };
    log::info!("Assembling {} reads", reads.len());

    let mut assembler = ReadAssembler::new("reads");
    assembler.compute_overlap_graph(params.min_overlap, reads, progress)?;
    assembler.compute_contigs(params, progress)?;
    Ok(assembler)
}
