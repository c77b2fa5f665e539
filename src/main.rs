use clap::Parser;
use labelgtc::io::{read_covering_set, read_gene_tree, read_species_tree, write_resolutions};
use labelgtc::resolve::LabelGtc;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

/// Resolve a binary gene tree against a species tree and a covering set of
/// trusted subtrees.
#[derive(Parser, Debug)]
#[command(name = "labelgtc", version, about = "Binary gene tree resolution by duplication/loss reconciliation")]
struct Args {
    /// Path to the species tree (Newick)
    #[arg(short = 's', long = "species")]
    species: PathBuf,

    /// Path to the gene tree (Newick)
    #[arg(short = 'g', long = "gene")]
    gene: PathBuf,

    /// Path to the covering set of trees (one Newick subtree per line)
    #[arg(short = 'c', long = "cst")]
    cst: PathBuf,

    /// Confidence threshold in [0, 1] for binarizing branch support
    #[arg(short = 'T', long = "threshold", default_value_t = 0.7)]
    threshold: f64,

    /// Maximum number of alternative resolutions to return
    #[arg(short = 'l', long = "limit", default_value_t = 1)]
    limit: usize,

    /// Output path for resolved trees (one Newick per line). Use `-` for
    /// stdout, or a `.gz` suffix for gzip compression
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Quiet mode: suppresses progress logging
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let t0 = Instant::now();
    let species = match read_species_tree(&args.species) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to read species tree {:?}: {e}", args.species);
            return ExitCode::from(2);
        }
    };
    let gene = match read_gene_tree(&args.gene) {
        Ok(g) => g,
        Err(e) => {
            log::error!("failed to read gene tree {:?}: {e}", args.gene);
            return ExitCode::from(2);
        }
    };
    let cst = match read_covering_set(&args.cst) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to read covering set {:?}: {e}", args.cst);
            return ExitCode::from(2);
        }
    };
    log::info!(
        "read inputs in {:.3}s ({} covering-set entries)",
        t0.elapsed().as_secs_f64(),
        cst.len()
    );

    let mut engine = match LabelGtc::with_limit(species, gene, cst, args.threshold, args.limit) {
        Ok(e) => e,
        Err(e) => {
            log::error!("invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    let t1 = Instant::now();
    if let Err(e) = engine.resolve() {
        log::error!("resolution failed: {e}");
        return ExitCode::from(3);
    }
    log::info!(
        "resolved via {} in {:.3}s, {} alternative(s)",
        engine.regime().map(|r| r.as_str()).unwrap_or("unknown"),
        t1.elapsed().as_secs_f64(),
        engine.resolutions().len()
    );

    if let Err(e) = write_resolutions(&args.output, engine.resolutions()) {
        log::error!("failed to write output {:?}: {e}", args.output);
        return ExitCode::from(4);
    }

    ExitCode::SUCCESS
}
