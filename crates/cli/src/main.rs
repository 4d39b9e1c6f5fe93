use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RunConfig;

mod commands;
mod config;
mod output;
mod prompts;

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Retrieval-augmented application security review", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout carries model output)
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file path (default: ./triage.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a vector store from a capture, a source tree or a text file
    Index {
        #[command(subcommand)]
        source: IndexSource,
    },

    /// Ask a question over an indexed store, streaming the answer
    Ask(AskArgs),

    /// Analyze session captures record by record, or re-rank a prior run
    Analyze {
        #[command(subcommand)]
        stage: AnalyzeStage,
    },

    /// Review every source file with the model and index the findings
    Scan {
        #[command(subcommand)]
        target: ScanTarget,
    },

    /// Agentic static review of a source tree
    Audit(AuditArgs),

    /// Agentic probe of a single URL
    Probe(ProbeArgs),

    /// Two-step question chain
    Chain(ChainArgs),
}

#[derive(Subcommand)]
enum IndexSource {
    /// Index a logged HTTP session capture
    Session {
        /// Capture file to parse
        capture: PathBuf,

        /// Store snapshot path
        #[arg(long, default_value = "stores/session.json")]
        store: PathBuf,
    },

    /// Index the reviewable source files of a checked-out tree
    Repo {
        /// Root of the tree
        dir: PathBuf,

        /// Store snapshot path
        #[arg(long, default_value = "stores/repo.json")]
        store: PathBuf,
    },

    /// Index one plain-text document
    Text {
        /// UTF-8 text file
        file: PathBuf,

        /// Store snapshot path
        #[arg(long, default_value = "stores/text.json")]
        store: PathBuf,
    },
}

#[derive(Args)]
struct AskArgs {
    /// The question to answer over retrieved context
    question: String,

    /// Store snapshot to search
    #[arg(long, default_value = "stores/session.json")]
    store: PathBuf,

    /// Number of chunks to retrieve (default from config)
    #[arg(long, short = 'k')]
    k: Option<usize>,

    /// Also write the full answer to this file
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum AnalyzeStage {
    /// One model call per capture record; failures skip the record
    Session {
        /// Capture file to parse
        capture: PathBuf,

        /// Write the accumulated report here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Prioritize the endpoints from a previous batch report
    Prioritize {
        /// Report produced by `analyze session --out`
        analysis: PathBuf,
    },
}

#[derive(Subcommand)]
enum ScanTarget {
    /// Per-file review of a source tree, findings indexed for retrieval
    Repo {
        /// Root of the tree
        dir: PathBuf,

        /// Store snapshot path for the review results
        #[arg(long, default_value = "stores/scan-results.json")]
        store: PathBuf,
    },
}

#[derive(Args)]
struct AuditArgs {
    /// Directory to audit
    dir: PathBuf,
}

#[derive(Args)]
struct ProbeArgs {
    /// URL to probe
    url: String,
}

#[derive(Args)]
struct ChainArgs {
    /// First question
    question: String,

    /// Follow-up question answered with the first answer as context
    next_question: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = RunConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Index { source } => match source {
            IndexSource::Session { capture, store } => {
                commands::index::session(&config, &capture, &store).await?
            }
            IndexSource::Repo { dir, store } => {
                commands::index::repo(&config, &dir, &store).await?
            }
            IndexSource::Text { file, store } => {
                commands::index::text(&config, &file, &store).await?
            }
        },
        Commands::Ask(args) => {
            let k = args.k.unwrap_or(config.retrieval_k);
            commands::ask::run(&config, &args.question, &args.store, k, args.out.as_deref())
                .await?
        }
        Commands::Analyze { stage } => match stage {
            AnalyzeStage::Session { capture, out } => {
                commands::analyze::session(&config, &capture, out.as_deref()).await?
            }
            AnalyzeStage::Prioritize { analysis } => {
                commands::analyze::prioritize(&config, &analysis).await?
            }
        },
        Commands::Scan { target } => match target {
            ScanTarget::Repo { dir, store } => {
                commands::scan::repo(&config, &dir, &store).await?
            }
        },
        Commands::Audit(args) => commands::agents::audit(&config, &args.dir).await?,
        Commands::Probe(args) => commands::agents::probe(&config, &args.url).await?,
        Commands::Chain(args) => {
            commands::ask::chain(&config, &args.question, &args.next_question).await?
        }
    }

    Ok(())
}
