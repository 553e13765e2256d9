//! termsguard CLI
//!
//! ```bash
//! # Analyze a policy document
//! termsguard analyze --rules rules.json policy.txt
//!
//! # Pipe from stdin, JSON report
//! cat policy.txt | termsguard analyze --format json
//!
//! # Inspect the front half of the pipeline
//! termsguard tag policy.txt
//! termsguard distill policy.txt
//!
//! # Prebuild a LanceDB rule index (lancedb feature)
//! termsguard index-rules --out data/lance
//! ```
//!
//! ## Exit codes
//!
//! - 0: no violations
//! - 1: violations found
//! - 2: candidate matches found but not adjudicated
//! - 3: error

mod display;
#[cfg(feature = "lancedb")]
mod index;
mod setup;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use termsguard_ai::AdjudicatorConfig;
use termsguard_core::{AnalysisResult, OntologyIndex, Outcome, PipelineConfig, segment};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "termsguard")]
#[command(version)]
#[command(about = "Flag Terms of Service and Privacy Policy clauses that conflict with privacy law", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document against the rule corpus
    Analyze {
        /// Document to analyze (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Report format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Segment a document and show the domains tagged on each clause
    Tag {
        /// Document to tag (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Pipeline config file (JSON)
        #[arg(long, env = "TERMSGUARD_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Segment a document and show the distilled form of each clause
    Distill {
        /// Document to distill (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Pipeline config file (JSON)
        #[arg(long, env = "TERMSGUARD_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Embed the rule corpus into a LanceDB `rules` table
    #[cfg(feature = "lancedb")]
    IndexRules {
        /// LanceDB directory to write
        #[arg(long, env = "TERMSGUARD_INDEX")]
        out: PathBuf,

        #[command(flatten)]
        models: ModelArgs,
    },
}

/// Rule corpus, pipeline config and local models.
#[derive(Args)]
struct ModelArgs {
    /// Rule corpus (JSON array)
    #[arg(long, env = "TERMSGUARD_RULES", default_value = "data/rules.json")]
    rules: PathBuf,

    /// Pipeline config file (JSON); built-in defaults when absent
    #[arg(long, env = "TERMSGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// ONNX sentence-embedding model directory (onnx feature)
    #[arg(long, env = "TERMSGUARD_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// ONNX zero-shot NLI model directory enabling the noise gate (onnx feature)
    #[arg(long, env = "TERMSGUARD_CLASSIFIER_DIR")]
    classifier_dir: Option<PathBuf>,

    /// Prebuilt LanceDB rule index (lancedb feature)
    #[arg(long, env = "TERMSGUARD_INDEX")]
    index: Option<PathBuf>,
}

/// Adjudicator connection.
#[derive(Args)]
struct LlmArgs {
    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Model name passed to Ollama
    #[arg(long, env = "OLLAMA_MODEL", default_value = "mistral:latest")]
    llm_model: String,

    /// Per-attempt timeout in seconds
    #[arg(long, default_value_t = 150)]
    llm_timeout: u64,

    /// Retries after the first attempt
    #[arg(long, default_value_t = 1)]
    llm_retries: usize,
}

impl LlmArgs {
    fn adjudicator_config(&self) -> AdjudicatorConfig {
        AdjudicatorConfig {
            url: self.ollama_url.clone(),
            model: self.llm_model.clone(),
            timeout_secs: self.llm_timeout,
            max_retries: self.llm_retries,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    tracing::info!("termsguard v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze {
            input,
            format,
            models,
            llm,
        } => analyze_command(input, format, &models, &llm).await,
        Commands::Tag { input, config } => {
            tag_command(input, config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Distill { input, config } => {
            distill_command(input, config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        #[cfg(feature = "lancedb")]
        Commands::IndexRules { out, models } => {
            let stats = index::run_index_pipeline(&models, &out).await?;
            eprintln!(
                "Indexed {} rules into {} in {:.1}s",
                stats.rows,
                out.display(),
                stats.elapsed_secs
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn analyze_command(
    input: Option<PathBuf>,
    format: OutputFormat,
    models: &ModelArgs,
    llm: &LlmArgs,
) -> Result<ExitCode> {
    let text = read_input(input)?;
    let config = load_config(models.config.as_deref())?;
    let ctx = setup::build_context(models, &llm.adjudicator_config(), config).await?;

    let result = ctx.analyze(&text).await.context("analysis failed")?;
    match format {
        OutputFormat::Text => display::print_report(&result, Utc::now()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("serializing report")?
            );
        }
    }
    Ok(exit_code(&result))
}

fn tag_command(input: Option<PathBuf>, config: Option<&Path>) -> Result<()> {
    let text = read_input(input)?;
    let config = load_config(config)?;
    let ontology = OntologyIndex::builtin().context("compiling ontology")?;

    let clauses = segment(&text, config.segmenter, config.min_clause_chars);
    for (i, clause) in clauses.iter().enumerate() {
        let hits = ontology.matches(&clause.text);
        let domains = ontology.tag(&clause.text);
        display::print_tagged_clause(i + 1, &clause.text, &domains, &hits);
    }
    eprintln!("{} clause(s)", clauses.len());
    Ok(())
}

fn distill_command(input: Option<PathBuf>, config: Option<&Path>) -> Result<()> {
    let text = read_input(input)?;
    let config = load_config(config)?;
    let tagger = termsguard_core::HeuristicTagger;

    for (i, clause) in segment(&text, config.segmenter, config.min_clause_chars)
        .iter()
        .enumerate()
    {
        let distilled = termsguard_core::distill(&tagger, &clause.text);
        println!("[{}] {}", i + 1, clause.text);
        println!("    -> {distilled}");
    }
    Ok(())
}

fn exit_code(result: &AnalysisResult) -> ExitCode {
    match result.outcome {
        Outcome::Unadjudicated { .. } => ExitCode::from(2),
        _ if result.violations.is_empty() => ExitCode::SUCCESS,
        _ => ExitCode::from(1),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading pipeline config from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn read_input(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading document from {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading document from stdin")?;
            Ok(buffer)
        }
    }
}
