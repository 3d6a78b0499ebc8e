//! bm25-matrix command line: builds BM25 artifacts from a folder of labeled
//! `.txt` documents and verifies previously written artifacts.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::{path::PathBuf, process::ExitCode, time::Instant};

use anyhow::Context;
use bm25_matrix::{
    ingest::{load_folder, LoadOptions},
    persist::{self, ArtifactWriter, FsArtifactWriter},
    vectorizer::DEFAULT_MATRIX_NAME,
    Bm25Vectorizer, Stoplist, VectorizerConfig,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_INPUT_DIR: &str = "allData";
const DEFAULT_OUTPUT_DIR: &str = "uk_us_outputs";
const DEFAULT_LABELS: [&str; 2] = ["UK", "US"];

/// Build a BM25-weighted document-term matrix from labeled text files
#[derive(Parser, Debug)]
#[command(name = "bm25-matrix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        env = "BM25_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the matrix and write every artifact (default if no command specified)
    Build(BuildArgs),

    /// Check that an artifact directory is complete and self-consistent
    Verify {
        /// Artifact directory
        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct BuildArgs {
    /// Folder holding `<LABEL>_*.txt` documents
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    input: Option<PathBuf>,

    /// Artifact directory, created when missing
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output: Option<PathBuf>,

    /// Configuration file (TOML); flags below override it
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum number of documents a term must appear in
    #[arg(long = "min-df", value_name = "N")]
    min_df: Option<u64>,

    /// Maximum fraction of documents a term may appear in
    #[arg(long = "max-df", value_name = "FRACTION")]
    max_df: Option<f64>,

    /// Vocabulary size cap
    #[arg(long = "max-features", value_name = "N")]
    max_features: Option<usize>,

    /// BM25 saturation parameter
    #[arg(long = "k1", value_name = "K1")]
    k1: Option<f64>,

    /// BM25 length normalization strength
    #[arg(long = "b", value_name = "B")]
    b: Option<f64>,

    /// Stopword file, one word per line, replaces the English list
    #[arg(long = "stopwords", value_name = "FILE", conflicts_with = "no_stopwords")]
    stopwords: Option<PathBuf>,

    /// Disable stopword removal
    #[arg(long = "no-stopwords", action = ArgAction::SetTrue)]
    no_stopwords: bool,

    /// Accepted label prefix (repeatable); UK and US when omitted
    #[arg(long = "label", value_name = "PREFIX", action = ArgAction::Append)]
    labels: Vec<String>,

    /// Accept every `<PREFIX>_` file as its own category
    #[arg(long = "any-label", action = ArgAction::SetTrue, conflicts_with = "labels")]
    any_label: bool,

    /// Name recorded in the stats table
    #[arg(long = "matrix-name", value_name = "NAME")]
    matrix_name: Option<String>,
}

impl BuildArgs {
    fn load_options(&self) -> LoadOptions {
        let options = LoadOptions::default();
        if self.any_label {
            options
        } else if self.labels.is_empty() {
            options.with_labels(&DEFAULT_LABELS)
        } else {
            options.with_labels(&self.labels)
        }
    }

    fn vectorizer_config(&self) -> anyhow::Result<VectorizerConfig> {
        let mut config = match &self.config {
            Some(path) => VectorizerConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => VectorizerConfig::default(),
        };
        if let Some(v) = self.min_df {
            config.min_df = v;
        }
        if let Some(v) = self.max_df {
            config.max_df = v;
        }
        if let Some(v) = self.max_features {
            config.max_features = v;
        }
        if let Some(v) = self.k1 {
            config.bm25.k1 = v;
        }
        if let Some(v) = self.b {
            config.bm25.b = v;
        }
        if self.no_stopwords {
            config.stoplist = Stoplist::empty();
        } else if let Some(path) = &self.stopwords {
            config.stoplist = Stoplist::from_file(path)
                .with_context(|| format!("failed to load stopwords {}", path.display()))?;
        }
        Ok(config)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run_build(args: BuildArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let input = args.input.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
    let output = args.output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let config = args.vectorizer_config()?;

    let corpus = load_folder(&input, &args.load_options()).with_context(|| format!("failed to load {}", input.display()))?;

    let vectorizer = Bm25Vectorizer::new(config)
        .context("invalid configuration")?
        .with_matrix_name(args.matrix_name.as_deref().unwrap_or(DEFAULT_MATRIX_NAME));
    let result = vectorizer.fit_transform(&corpus).context("matrix build failed")?;
    let paths = FsArtifactWriter::new(&output)
        .write(&result)
        .with_context(|| format!("failed to write artifacts to {}", output.display()))?;

    let s = &result.stats;
    println!("matrix:    {}", s.matrix_name);
    println!("shape:     {} x {}", s.num_documents, s.num_features);
    println!("nnz:       {}", s.nnz);
    println!("sparsity:  {:.4}%", s.sparsity_percent);
    println!("classes:   {}", result.label_encoding.classes().join(", "));
    println!("artifacts: {}", paths.matrix.parent().unwrap_or(&output).display());
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "build finished");
    Ok(())
}

fn run_verify(output: PathBuf) -> anyhow::Result<()> {
    let report = persist::verify(&output).with_context(|| format!("verification of {} failed", output.display()))?;
    println!("shape:     {} x {}", report.shape.0, report.shape.1);
    println!("nnz:       {}", report.nnz);
    println!("sparsity:  {:.4}%", report.sparsity_percent);
    for (label, count) in &report.label_counts {
        println!("label {label}: {count}");
    }
    println!("all artifacts consistent");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command.unwrap_or_else(|| Commands::Build(BuildArgs::default())) {
        Commands::Build(args) => run_build(args),
        Commands::Verify { output } => run_verify(output),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
