//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands;
use hanging_protocols::config::GlobalConfig;
use hanging_protocols::output::OutputMode;

/// hangproto - Hanging protocol selection for imaging studies
#[derive(Parser, Debug)]
#[command(
    name = "hangproto",
    version,
    about = "Hanging protocol selection for imaging studies",
    long_about = "Rank a library of hanging protocols against a study.\n\n\
                  The best protocol decides the screen layout; each viewport is\n\
                  then filled with the best image from the study or a prior."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the default config and create the protocol library
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Select a protocol for a study and place images in its viewports
    Match(MatchArgs),

    /// Summarize protocol documents
    Inspect {
        /// Protocol documents (JSON or TOML) or directories of them
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show version
    Version,
}

/// Arguments of `hangproto match`
#[derive(clap::Args, Debug)]
pub struct MatchArgs {
    /// Study metadata document (JSON)
    #[arg(short, long)]
    pub study: PathBuf,

    /// Prior study metadata document, most recent first
    #[arg(short, long = "prior")]
    pub priors: Vec<PathBuf>,

    /// Prior study UID, loaded from the study directory when referenced
    #[arg(long = "prior-uid")]
    pub prior_uids: Vec<String>,

    /// Protocol library directory
    #[arg(long)]
    pub protocols: Option<PathBuf>,

    /// Study metadata directory for `--prior-uid`
    #[arg(long)]
    pub studies: Option<PathBuf>,

    /// Id of the fallback protocol
    #[arg(long)]
    pub default_protocol: Option<String>,

    /// Show every ranked protocol and failed rule
    #[arg(short, long)]
    pub details: bool,
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = GlobalConfig::load();
    let output_mode = if cli.json || config.output.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Some(Command::Match(args)) => {
            let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            runtime.block_on(commands::match_study(&args, &config, output_mode))
        },
        Some(Command::Init { force }) => commands::init(force, output_mode),
        Some(Command::Inspect { files }) => commands::inspect(&files, output_mode),
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": hanging_protocols::VERSION
                    })
                );
            } else {
                println!("hangproto v{}", hanging_protocols::VERSION);
            }
            Ok(())
        },
        None => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": hanging_protocols::VERSION,
                        "hint": "Use --help for usage"
                    })
                );
            } else {
                println!("hangproto v{}", hanging_protocols::VERSION);
                println!("\nRun 'hangproto --help' for usage");
                println!("Run 'hangproto match --study STUDY.json' to select a protocol");
            }
            Ok(())
        },
    }
}
