use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use megan_rs::reads::{read_match_table, read_sequences};
use megan_rs::taxdb::load_taxonomy_tree;
use megan_rs::types::TAXONOMY;
use megan_rs::{assemble_reads, assign_reads, AlgorithmKind, AssemblyParams, LcaParams, PathFormat, ProgressListener};

/// LCA taxonomic assignment and gene-centric read assembly
#[derive(Parser, Debug)]
#[command(name = "megan-rs", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assign reads to taxa from a match table
    Lca(LcaCmd),

    /// Assemble reads into contigs
    Assemble(AssembleCmd),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Algorithm {
    Lca,
    Weighted,
    Path,
}

#[derive(Args, Debug)]
struct LcaCmd {
    /// taxDB file: taxid, parent, name, rank separated by tabs
    #[arg(short, long, value_name = "FILE")]
    tree: PathBuf,

    /// Match table: read, class id, bit score, expected, percent identity
    #[arg(short, long, value_name = "FILE")]
    matches: PathBuf,

    /// Output file, stdout if absent
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Algorithm::Lca)]
    algorithm: Algorithm,

    /// Percent of matches the weighted LCA must cover
    #[arg(long, default_value_t = 80.0)]
    percent_to_cover: f32,

    #[arg(long, default_value_t = 50.0)]
    min_score: f32,

    #[arg(long, default_value_t = 0.01)]
    max_expected: f32,

    #[arg(long, default_value_t = 10.0)]
    top_percent: f32,

    #[arg(long, default_value_t = 0.0)]
    min_percent_identity: f32,

    /// Print `read<TAB>class id` instead of taxon paths
    #[arg(long)]
    ids: bool,

    /// Print taxon ids instead of names in paths
    #[arg(long)]
    show_taxon_ids: bool,

    /// Print every rank, not only the official ones
    #[arg(long)]
    all_ranks: bool,

    #[arg(long, default_value_t = 1000)]
    max_parse_errors: usize,
}

#[derive(Args, Debug)]
struct AssembleCmd {
    /// FASTA or FASTQ reads, optionally gzipped
    #[arg(short, long, value_name = "FILE")]
    reads: PathBuf,

    /// Contigs in FASTA format, stdout if absent
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the overlap graph in GML
    #[arg(long, value_name = "FILE")]
    graph: Option<PathBuf>,

    #[arg(long, default_value_t = 20)]
    min_overlap: usize,

    #[arg(long, default_value_t = 2)]
    min_reads: usize,

    #[arg(long, default_value_t = 0)]
    min_length: usize,

    #[arg(long, default_value_t = 0.0)]
    min_av_coverage: f64,

    /// 100 removes only exact contained contigs
    #[arg(long, default_value_t = 100.0)]
    max_percent_identity: f32,

    #[arg(long)]
    max_reads: Option<usize>,

    /// Report single-read contigs too
    #[arg(long)]
    singletons: bool,

    /// Worker threads, cores - 1 if absent
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    #[arg(long, default_value_t = 1000)]
    max_parse_errors: usize,
}

fn spinner(color: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template(&format!("{{spinner:.{}}} {{msg}}", color))
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner
}

fn output_writer(path: &Option<PathBuf>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn run_lca(cmd: LcaCmd) -> Result<(), Box<dyn std::error::Error>> {
    let spin = spinner("blue", "Loading taxonomy...");
    let tree = load_taxonomy_tree(&cmd.tree)?;
    spin.set_message("Loading matches...");
    let loaded = read_match_table(&cmd.matches, TAXONOMY, cmd.max_parse_errors)?;
    spin.finish_with_message(format!(
        "Loaded {} taxa and {} reads.",
        tree.len(),
        loaded.records.len()
    ));

    let params = LcaParams {
        min_score: cmd.min_score,
        max_expected: cmd.max_expected,
        top_percent: cmd.top_percent,
        min_percent_identity: cmd.min_percent_identity,
        algorithm: match cmd.algorithm {
            Algorithm::Lca => AlgorithmKind::Lca,
            Algorithm::Weighted => AlgorithmKind::WeightedLca {
                percent_to_cover: cmd.percent_to_cover,
            },
            Algorithm::Path => AlgorithmKind::TaxPath,
        },
        ..Default::default()
    };

    let progress = ProgressListener::with_bar("lca");
    let results = assign_reads(&tree, &loaded.records, TAXONOMY, &params, &progress)?;
    progress.finish();

    let spin = spinner("yellow", "Writing assignments...");
    let mut out = output_writer(&cmd.output)?;
    if cmd.ids {
        for a in &results.assignments {
            writeln!(out, "{}\t{}", a.read_name, a.class_id)?;
        }
    } else {
        let format = PathFormat {
            show_ranks: true,
            official_ranks_only: !cmd.all_ranks,
            show_taxon_ids: cmd.show_taxon_ids,
        };
        for line in results.tax_path_lines(&tree, format) {
            writeln!(out, "{}", line)?;
        }
    }
    out.flush()?;
    spin.finish_with_message(format!(
        "Assigned {} of {} reads.",
        results.reads_assigned, results.reads_in
    ));
    Ok(())
}

fn run_assemble(cmd: AssembleCmd) -> Result<(), Box<dyn std::error::Error>> {
    let spin = spinner("blue", "Loading reads...");
    let loaded = read_sequences(&cmd.reads, cmd.max_parse_errors)?;
    spin.finish_with_message(format!(
        "Loaded {} reads ({} skipped).",
        loaded.records.len(),
        loaded.skipped
    ));

    let params = AssemblyParams {
        min_overlap: cmd.min_overlap,
        min_reads: cmd.min_reads,
        min_length: cmd.min_length,
        min_av_coverage: cmd.min_av_coverage,
        max_percent_identity: cmd.max_percent_identity,
        max_number_of_reads: cmd.max_reads,
        allow_singletons: cmd.singletons,
        threads: cmd.threads,
        max_parse_errors: cmd.max_parse_errors,
    };

    let progress = ProgressListener::with_bar("assemble");
    let assembler = assemble_reads(&loaded.records, &params, &progress)?;
    progress.finish();

    let spin = spinner("yellow", "Writing output files...");
    if let Some(path) = &cmd.graph {
        let mut w = BufWriter::new(File::create(path)?);
        let (nodes, edges) = assembler.write_overlap_graph(&mut w)?;
        log::info!("Wrote overlap graph with {} nodes and {} edges", nodes, edges);
    }
    let mut out = output_writer(&cmd.output)?;
    assembler.write_contigs(&mut out, &ProgressListener::silent())?;
    spin.finish_with_message(format!("Wrote {} contigs.", assembler.contigs().len()));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Lca(cmd) => run_lca(cmd),
        Commands::Assemble(cmd) => run_assemble(cmd),
    }
}
