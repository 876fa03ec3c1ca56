//! Command-line front end for the evaluation pipeline.
//!
//! `generate` builds the per-corpus font manifests, `baseline` writes the
//! served-stylesheet partition table, and `sweep` drives the optimizer
//! across every family and partition count, printing one chart URL per
//! corpus.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::task::JoinSet;

use optift_eval::{
    attach_fonts, default_families, default_sources, fetch_archive, manifest,
    write_baseline_table, write_manifest, BenchmarkSweep, CorpusAssembler, EvalError, Result,
    SweepConfig, DEFAULT_STYLESHEET_URL,
};

#[derive(Parser, Debug)]
#[command(name = "optift-eval", version, about = "Evaluation harness for the optift optimizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build font manifests from the documentation corpora.
    Generate(GenerateArgs),
    /// Write the served-stylesheet baseline partition table.
    Baseline {
        /// Stylesheet to parse `unicode-range` declarations from.
        #[arg(long, default_value = DEFAULT_STYLESHEET_URL)]
        url: String,
        /// Target file for the partition table.
        #[arg(long, default_value = "google_fonts_baseline.inc")]
        out: PathBuf,
    },
    /// Run the full benchmark sweep and print one chart URL per corpus.
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory probed for font files.
    #[arg(long, default_value = ".")]
    font_dir: PathBuf,
    /// Directory generated manifests are written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    generate: GenerateArgs,
    /// Path to the optimizer binary.
    #[arg(long, default_value = "build/optift")]
    optimizer: PathBuf,
    /// Output directory handed to the optimizer.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// Partition counts to sweep, comma-separated.
    #[arg(long, value_delimiter = ',')]
    partitions: Option<Vec<u32>>,
}

async fn generate(args: &GenerateArgs) -> Result<()> {
    let families = default_families();
    let sources = default_sources();
    let source_names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
    manifest::remove_generated_manifests(&args.out_dir, &source_names, &families)?;

    let assembler = CorpusAssembler::new();
    let mut tasks = JoinSet::new();
    for source in sources {
        let assembler = assembler.clone();
        tasks.spawn(async move {
            let archive = fetch_archive(&source.archive_url).await?;
            let corpus = assembler
                .assemble_from_zip(&archive, &source.entry_prefix)
                .await?;
            Ok::<_, EvalError>((source, corpus))
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let (source, corpus) = joined??;
        for family in &families {
            let manifest = attach_fonts(&args.font_dir, family, corpus.clone())?;
            let path = args.out_dir.join(manifest::manifest_file_name(&source.name, family));
            write_manifest(&path, &manifest)?;
        }
        log::info!("{} posts generated", source.name);
    }
    Ok(())
}

async fn run_sweep(args: &SweepArgs) -> Result<()> {
    generate(&args.generate).await?;

    let families = default_families();
    let sources = default_sources();
    let mut config = SweepConfig::new(args.optimizer.clone(), args.output_dir.clone());
    if let Some(partitions) = &args.partitions {
        config = config.partition_counts(partitions.clone());
    }
    let sweep = BenchmarkSweep::new(config);

    let mut urls = Vec::new();
    for source in &sources {
        let manifests = manifest::manifest_paths(&args.generate.out_dir, &source.name, &families);
        let aggregator = sweep.sweep(&manifests).await?;
        urls.push(aggregator.chart_url());
    }

    let source_names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
    manifest::remove_generated_manifests(&args.generate.out_dir, &source_names, &families)?;
    for url in urls {
        println!("{url}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Generate(args) => generate(args).await,
        Commands::Baseline { url, out } => write_baseline_table(url, out).await,
        Commands::Sweep(args) => run_sweep(args).await,
    };
    if let Err(err) = outcome {
        eprintln!("error: {err}");
        let code = match err {
            EvalError::OptimizerExit { code } => code,
            _ => 1,
        };
        std::process::exit(code);
    }
}
