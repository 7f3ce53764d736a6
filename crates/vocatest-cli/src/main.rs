//! vocatest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "vocatest", version, about = "Vocabulary quiz assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a generator transcript into quiz questions
    Parse {
        /// Path to the transcript text file
        #[arg(long)]
        transcript: PathBuf,

        /// Print the parsed questions as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Strict mode: expect exactly one question for this word
        #[arg(long, requires = "translation")]
        word: Option<String>,

        /// Translation of the strict-mode word
        #[arg(long, requires = "word")]
        translation: Option<String>,
    },

    /// Run an interactive quiz over a parsed transcript
    Quiz {
        /// Path to the transcript text file
        #[arg(long)]
        transcript: PathBuf,

        /// Enforce per-question answer deadlines
        #[arg(long)]
        timed: bool,

        /// Owner id to run the session under
        #[arg(long)]
        owner: Option<i64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vocatest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            transcript,
            json,
            word,
            translation,
        } => commands::parse::execute(transcript, json, word, translation),
        Commands::Quiz {
            transcript,
            timed,
            owner,
            config,
        } => commands::quiz::execute(transcript, timed, owner, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
