use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use conflict_engine::{
    expand_occurrences, AcademicTerm, ConflictService, EngineConfig, InMemoryStore,
    RecurrenceEvaluator, SessionDraft, SessionId, SessionRepository,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "conflicts",
    version,
    about = "Timetable conflict reports over a JSON snapshot"
)]
struct Cli {
    /// Timetable snapshot (JSON)
    #[arg(short, long, global = true, default_value = "timetable.json")]
    snapshot: PathBuf,

    /// Engine configuration (TOML): parity epoch and academic term
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Compact JSON output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Every conflicting pair of sessions
    All,
    /// Pairs sharing a room, tagged ROOM only
    Rooms,
    /// Conflicts involving one session
    Session {
        /// Session id
        id: i64,
    },
    /// Evaluate an unsaved session without storing it
    Candidate {
        /// Session draft (JSON). Use "-" for stdin.
        input: String,
    },
    /// Calendar dates a session meets on within the academic term
    Occurrences {
        /// Session id
        id: i64,
        /// Term start (YYYY-MM-DD), overrides the configured term
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Term end (YYYY-MM-DD), overrides the configured term
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OccurrenceReport {
    session_id: SessionId,
    term: AcademicTerm,
    dates: Vec<NaiveDate>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let store = load_snapshot(&cli.snapshot)?;
    let service = ConflictService::in_memory(store.clone(), &config);

    match cli.command {
        Command::All => emit(&service.all_conflicts()?, cli.compact),
        Command::Rooms => emit(&service.room_conflicts()?, cli.compact),
        Command::Session { id } => emit(&service.conflicts_for_session(SessionId(id))?, cli.compact),
        Command::Candidate { input } => {
            let raw = read_input(&input)?;
            let draft: SessionDraft =
                serde_json::from_str(&raw).context("Failed to parse session draft JSON")?;
            emit(&service.conflicts_for_candidate(&draft)?, cli.compact)
        }
        Command::Occurrences { id, from, to } => {
            let term = match (from, to, config.term) {
                (Some(start), Some(end), _) => AcademicTerm::new(start, end)?,
                (None, None, Some(term)) => term,
                (None, None, None) => {
                    bail!("No academic term: pass --from and --to or set [term] in the config")
                }
                _ => bail!("--from and --to must be given together"),
            };
            let session = store
                .find_session(SessionId(id))?
                .with_context(|| format!("Session {id} not found"))?;
            let evaluator = RecurrenceEvaluator::new(config.parity_epoch);
            let dates = expand_occurrences(&session, &term, &evaluator)?;
            emit(
                &OccurrenceReport {
                    session_id: session.id(),
                    term,
                    dates,
                },
                cli.compact,
            )
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        debug!("no config file, using defaults");
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = EngineConfig::from_toml_str(&raw)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    debug!(path = %path.display(), epoch = %config.parity_epoch, "config loaded");
    Ok(config)
}

fn load_snapshot(path: &Path) -> Result<InMemoryStore> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let store = InMemoryStore::from_json(&raw)
        .with_context(|| format!("Invalid snapshot {}", path.display()))?;
    debug!(path = %path.display(), "snapshot loaded");
    Ok(store)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}

fn emit<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{out}");
    Ok(())
}
