//src/config.rs

use crate::error::{Error, Result};

/// Which assignment strategy a driver instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlgorithmKind {
    /// Naive LCA over the addresses of all eligible matches.
    #[default]
    Lca,
    /// Deepest node that still covers the given percentage of matches.
    WeightedLca { percent_to_cover: f32 },
    /// Tip of the heaviest-child percent-support path.
    TaxPath,
}

/// Parameters for selecting active matches and running the assignment.
#[derive(Debug, Clone)]
pub struct LcaParams {
    pub min_score: f32,
    pub max_expected: f32,
    /// 0 is treated as 0.0001
    pub top_percent: f32,
    pub min_percent_identity: f32,
    /// 0 disables the low-complexity check
    pub min_complexity: f32,
    pub algorithm: AlgorithmKind,
}

impl Default for LcaParams {
    fn default() -> Self {
        Self {
            min_score: 50.0,
            max_expected: 0.01,
            top_percent: 10.0,
            min_percent_identity: 0.0,
            min_complexity: 0.0,
            algorithm: AlgorithmKind::Lca,
        }
    }
}

impl LcaParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.top_percent) {
            return Err(Error::InvalidParameter(format!(
                "top percent must be in [0,100], got {}",
                self.top_percent
            )));
        }
        if let AlgorithmKind::WeightedLca { percent_to_cover } = self.algorithm {
            if !(percent_to_cover > 0.0 && percent_to_cover <= 100.0) {
                return Err(Error::InvalidParameter(format!(
                    "percent to cover must be in (0,100], got {}",
                    percent_to_cover
                )));
            }
        }
        Ok(())
    }

    /// The top-percent value actually applied during match selection.
    pub fn effective_top_percent(&self) -> f32 {
        if self.top_percent == 0.0 {
            0.0001
        } else {
            self.top_percent
        }
    }
}

/// Parameters of the gene-centric assembler.
#[derive(Debug, Clone)]
pub struct AssemblyParams {
    pub min_overlap: usize,
    pub min_reads: usize,
    pub min_length: usize,
    pub min_av_coverage: f64,
    /// 100 means exact containment, below that containment is tested by alignment
    pub max_percent_identity: f32,
    pub max_number_of_reads: Option<usize>,
    pub allow_singletons: bool,
    /// None uses cores - 1, at least one
    pub threads: Option<usize>,
    pub max_parse_errors: usize,
}

impl Default for AssemblyParams {
    fn default() -> Self {
        Self {
            min_overlap: 20,
            min_reads: 2,
            min_length: 0,
            min_av_coverage: 0.0,
            max_percent_identity: 100.0,
            max_number_of_reads: None,
            allow_singletons: false,
            threads: None,
            max_parse_errors: 1000,
        }
    }
}

impl AssemblyParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_overlap == 0 {
            return Err(Error::InvalidParameter("min overlap must be positive".into()));
        }
        if self.min_reads == 0 {
            return Err(Error::InvalidParameter("min reads must be positive".into()));
        }
        if !(0.0..=100.0).contains(&self.max_percent_identity) {
            return Err(Error::InvalidParameter(format!(
                "max percent identity must be in [0,100], got {}",
                self.max_percent_identity
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidParameter("thread count must be positive".into()));
        }
        Ok(())
    }

    /// Worker count for the containment filter.
    pub fn worker_threads(&self) -> usize {
        self.threads
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1))
            .max(1)
    }
}
