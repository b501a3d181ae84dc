use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use covsearch::config::{SearchConfig, StrandMode};
use covsearch::model;
use covsearch::pipeline;
use covsearch::report;
use covsearch::sequence;

#[derive(Parser)]
#[command(name = "covsearch")]
#[command(version = "0.1.0")]
#[command(about = "Covariance-model homology search over nucleotide databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a calibrated covariance model against a FASTA database
    Search(SearchArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Query covariance model file
    #[arg(short, long)]
    model: PathBuf,
    /// Target sequence database, FASTA
    #[arg(short, long)]
    target: PathBuf,
    #[arg(short, long)]
    out: Option<PathBuf>,
    #[arg(short = 'n', long, default_value_t = 0)]
    num_threads: usize,
    /// E-value reporting threshold
    #[arg(short = 'E', long, default_value_t = 10.0)]
    evalue: f64,
    /// E-value inclusion threshold
    #[arg(long = "incE", default_value_t = 0.01)]
    inc_e: f64,
    /// Search only the top (input) strand
    #[arg(long, default_value_t = false)]
    toponly: bool,
    /// Search only the bottom (reverse-complement) strand
    #[arg(long, default_value_t = false)]
    bottomonly: bool,
    /// Turn off all filters: maximum sensitivity, slowest
    #[arg(long, default_value_t = false)]
    max: bool,
    /// Skip the linear-filter passes, keep the envelope gate
    #[arg(long, default_value_t = false)]
    nohmm: bool,
    /// Skip alignment output, report the hit table only
    #[arg(long, default_value_t = false)]
    noali: bool,
    // Expected filter survival fractions.
    #[arg(long, default_value_t = 0.35)]
    f1: f64,
    #[arg(long, default_value_t = 0.15)]
    f2: f64,
    #[arg(long, default_value_t = 0.0008)]
    f3: f64,
    #[arg(long, default_value_t = 0.0008)]
    f4: f64,
    #[arg(long, default_value_t = 1e-4)]
    f5: f64,
    #[arg(long, short = 'v', default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => run_search(args),
    }
}

fn run_search(args: SearchArgs) -> Result<()> {
    anyhow::ensure!(
        !(args.toponly && args.bottomonly),
        "--toponly and --bottomonly are mutually exclusive"
    );
    anyhow::ensure!(
        !(args.max && args.nohmm),
        "--max and --nohmm are mutually exclusive"
    );

    let cm = model::file::read_model(&args.model)
        .with_context(|| format!("Failed to read model {:?}", args.model))?;

    let seqs = sequence::read_fasta_db(&args.target)
        .with_context(|| format!("Failed to read target database {:?}", args.target))?;
    anyhow::ensure!(!seqs.is_empty(), "Target database {:?} is empty", args.target);

    let strands = if args.toponly {
        StrandMode::TopOnly
    } else if args.bottomonly {
        StrandMode::BottomOnly
    } else {
        StrandMode::Both
    };

    let cfg = SearchConfig {
        num_threads: args.num_threads,
        f1_ssv: args.f1,
        f2_vit: args.f2,
        f3_fwd: args.f3,
        f4_gfwd: args.f4,
        f5_cyk: args.f5,
        e_report: args.evalue,
        inc_e: args.inc_e,
        do_alignments: !args.noali,
        strands,
        skip_filters: args.max,
        skip_hmm: args.nohmm,
        verbose: args.verbose,
        ..Default::default()
    };

    let results = pipeline::search(&cm, &seqs, &cfg)?;
    report::write_report(&cm, &cfg, &results, args.out.as_ref())?;
    Ok(())
}
