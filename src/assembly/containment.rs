//src/assembly/containment.rs

use bio::alphabets::dna::revcomp;
use bio::pattern_matching::horspool::Horspool;
use bitvec::vec::BitVec;
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::progress::ProgressListener;
use crate::types::Contig;

use super::aligner::{ContainmentAligner, SemiGlobalAligner};

/// Contigs left after [`remove_contained_contigs`].
#[derive(Debug, Default, Clone)]
pub struct ContainmentResult {
    pub contigs: Vec<Contig>,
    pub removed: usize,
}

/// Removes every contig that is contained in a longer (or equally long,
/// earlier sorted) contig, on either strand.
///
/// With `max_percent_identity >= 100` containment means an exact substring;
/// below that a semi-global alignment must reach the given identity.
/// Contigs are ordered by decreasing length, then header, and candidate `i`
/// is only tested against `j < i`. Exact containment is transitive, so an
/// exact search skips contigs already removed; an approximate one compares
/// against every longer contig, removed or not. Survivors are renamed
/// `Contig-NNNNNN` followed by the `length=...` part of their old header.
pub fn remove_contained_contigs(
    contigs: &[Contig],
    max_percent_identity: f32,
    threads: usize,
    progress: &ProgressListener,
) -> Result<ContainmentResult> {
    let mut sorted: Vec<&Contig> = contigs.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.header.cmp(&b.header)));

    progress.set_subtask("Removing contained contigs");
    progress.set_maximum(sorted.len() as u64);

    let removed: RwLock<BitVec> = RwLock::new(BitVec::repeat(false, sorted.len()));
    if sorted.len() > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.clamp(1, sorted.len()))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        pool.install(|| {
            (1..sorted.len()).into_par_iter().try_for_each_init(
                || SemiGlobalAligner::new(max_percent_identity),
                |aligner, i| {
                    progress.check_cancelled()?;
                    if is_contained(i, &sorted, &removed, max_percent_identity, aligner) {
                        log::debug!("Removing contained {}", sorted[i].header);
                        removed.write().set(i, true);
                    }
                    progress.increment()
                },
            )
        })?;
    }

    let removed = removed.into_inner();
    let mut result = ContainmentResult {
        contigs: Vec::with_capacity(sorted.len()),
        removed: removed.count_ones(),
    };
    for (i, contig) in sorted.iter().enumerate() {
        if !removed[i] {
            let header = format!("Contig-{:06} {}", result.contigs.len() + 1, descriptor(&contig.header));
            result.contigs.push(Contig::new(header.trim_end(), contig.sequence.clone()));
        }
    }

    log::info!("Removed contigs: {}", result.removed);
    Ok(result)
}

fn is_contained<A: ContainmentAligner>(
    i: usize,
    sorted: &[&Contig],
    removed: &RwLock<BitVec>,
    max_percent_identity: f32,
    aligner: &mut A,
) -> bool {
    let query = sorted[i].sequence.as_bytes();
    if query.is_empty() {
        return false;
    }
    let reverse = revcomp(query);

    if max_percent_identity >= 100.0 {
        // one read lock per candidate; a contig removed later is merely searched in vain
        let skip = removed.read()[..i].to_bitvec();
        let forward = Horspool::new(query);
        let backward = Horspool::new(&reverse);
        (0..i)
            .filter(|&j| !skip[j])
            .map(|j| sorted[j].sequence.as_bytes())
            .filter(|text| text.len() >= query.len())
            .any(|text| forward.find_all(text).next().is_some() || backward.find_all(text).next().is_some())
    } else {
        (0..i)
            .map(|j| sorted[j].sequence.as_bytes())
            .any(|text| aligner.is_contained(query, text) || aligner.is_contained(&reverse, text))
    }
}

/// Old header from `length=` onwards, or the whole header without `>`.
fn descriptor(header: &str) -> &str {
    let header = header.trim_start_matches('>');
    match header.find("length=") {
        Some(pos) => &header[pos..],
        None => header,
    }
}
