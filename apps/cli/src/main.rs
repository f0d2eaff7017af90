//! palabra command-line interface
//!
//! Turns Spanish recordings into word clip databases and manages the
//! speaker labels stored in them.

mod commands;
mod exit_codes;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use exit_codes::ExitCode;
use palabra_config::Config;

/// palabra - Spanish pronunciation clip extraction
#[derive(Parser, Debug)]
#[command(name = "palabra")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./config.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract words from a recording into a JSON database
    Process(ProcessArgs),
    /// Set speaker names in an existing database
    LabelSpeakers {
        /// Database file
        database: PathBuf,

        /// Speaker label as ID=NAME[:GENDER[:REGION]], e.g. 1=Lucía:F:Bogotá
        #[arg(short, long = "speaker", required = true)]
        speakers: Vec<String>,
    },
    /// Per-speaker statistics and word boundary report for a database
    AnalyzeSpeakers {
        /// Database file
        database: PathBuf,
    },
    /// Show configuration and available engines
    Info {
        /// Check that models and backends can be found
        #[arg(long)]
        check_dependencies: bool,
    },
    /// Show version information
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Input WAV file
    pub audio_file: PathBuf,

    /// Database path (defaults to the audio path with a .json extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Speaker mapping JSON: a list of intervals or a "start-end" object
    #[arg(long)]
    pub speaker_map: Option<PathBuf>,

    /// Transcription language code
    #[arg(short, long)]
    pub language: Option<String>,

    /// Replay word timings from a JSON transcript instead of running Whisper
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Extract a WAV clip per kept word into this directory
    #[arg(long)]
    pub clips_dir: Option<PathBuf>,

    /// Attribute words with diarization (reads <audio>.rttm next to the file)
    #[arg(long)]
    pub diarize: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = run(cli);
    std::process::exit(exit_code.as_i32());
}

fn run(cli: Cli) -> ExitCode {
    if let Commands::Version = cli.command {
        commands::version(cli.json);
        return ExitCode::Success;
    }

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::InvalidArguments;
        }
    };

    if let Err(e) = logging::init(&config.logging, cli.verbose, cli.quiet) {
        eprintln!("error: {e:#}");
        return ExitCode::GeneralError;
    }

    let session_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
    let span = tracing::info_span!("session", session_id = %session_id);
    let _enter = span.enter();

    match cli.command {
        Commands::Process(args) => commands::process(args, config, cli.json),
        Commands::LabelSpeakers { database, speakers } => {
            commands::label_speakers(&database, &speakers, &config, cli.json)
        }
        Commands::AnalyzeSpeakers { database } => {
            commands::analyze_speakers(&database, &config, cli.json)
        }
        Commands::Info { check_dependencies } => {
            commands::info(&config, check_dependencies, cli.json)
        }
        Commands::Version => unreachable!("handled before configuration is loaded"),
    }
}
