//! Gauntlet command-line entry point.
//!
//! Runs a series of games between two UCI engines and records every result
//! in a SQLite database. With an opening book, each opening is played twice
//! with colors swapped; without one, a fixed number of games is played
//! alternating colors each game.

mod book;
mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use gauntlet::cancel::CancelToken;
use gauntlet::limit::MoveLimit;
use gauntlet::openings::OpeningSet;
use gauntlet::recorder::{Outcome, ResultRecorder};
use gauntlet::scheduler::{GameError, MatchScheduler, Seat};
use gauntlet::storage::SqliteSink;
use gauntlet::uci_client::UciClient;
use gauntlet_chess::ChessOracle;

use config::HarnessConfig;

/// How long the handshake may take before an engine is written off.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "gauntlet")]
#[command(about = "Automated match harness for UCI chess engines")]
struct Cli {
    /// Run identifier tagging every recorded result
    invocation_id: String,

    /// First participant as NAME:ENGINE_PATH
    #[arg(value_parser = parse_engine_spec)]
    engine1: EngineSpec,

    /// Second participant as NAME:ENGINE_PATH
    #[arg(value_parser = parse_engine_spec)]
    engine2: EngineSpec,

    /// Opening book (tab-separated; third column holds the move prefix).
    /// Each opening is played twice with colors swapped.
    #[arg(short, long)]
    openings: Option<PathBuf>,

    /// Result database path
    #[arg(long, default_value = "results.db")]
    db: PathBuf,

    /// Thinking time per move in milliseconds
    #[arg(long, default_value_t = 100, conflicts_with = "depth")]
    movetime: u64,

    /// Fixed search depth per move, instead of a thinking time
    #[arg(long)]
    depth: Option<u32>,

    /// Number of games to play when no opening book is given
    #[arg(short, long, default_value_t = 10)]
    games: u32,
}

/// One participant on the command line: display name plus executable.
#[derive(Debug, Clone)]
struct EngineSpec {
    name: String,
    path: PathBuf,
}

fn parse_engine_spec(value: &str) -> Result<EngineSpec, String> {
    let (name, path) = value
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:ENGINE_PATH, got '{value}'"))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME:ENGINE_PATH, got '{value}'"));
    }
    Ok(EngineSpec {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

/// A live engine plus everything needed to bring it back after a fault.
struct EngineSlot {
    name: String,
    path: PathBuf,
    options: BTreeMap<String, String>,
    client: UciClient,
}

impl EngineSlot {
    /// Spawns, handshakes and configures an engine. Failure here is fatal
    /// to the run.
    fn connect(spec: &EngineSpec, options: BTreeMap<String, String>) -> anyhow::Result<Self> {
        let client = Self::handshake(&spec.path, &options)
            .with_context(|| format!("starting engine '{}'", spec.name))?;
        tracing::info!(
            name = %spec.name,
            reported = client.reported_name().unwrap_or("<unreported>"),
            "engine ready"
        );
        Ok(Self {
            name: spec.name.clone(),
            path: spec.path.clone(),
            options,
            client,
        })
    }

    /// Replaces the subprocess after a fault: shut down whatever is left,
    /// spawn fresh, handshake and re-apply options.
    fn reconnect(&mut self) -> anyhow::Result<()> {
        let _ = self.client.shutdown();
        self.client = Self::handshake(&self.path, &self.options)
            .with_context(|| format!("restarting engine '{}'", self.name))?;
        tracing::info!(name = %self.name, "engine restarted");
        Ok(())
    }

    fn handshake(
        path: &PathBuf,
        options: &BTreeMap<String, String>,
    ) -> Result<UciClient, gauntlet::uci_client::UciError> {
        let mut client = UciClient::spawn(path)?;
        client.init(HANDSHAKE_TIMEOUT)?;
        client.configure(options)?;
        Ok(client)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = HarnessConfig::load().context("loading gauntlet.toml")?;

    let limit = match cli.depth {
        Some(depth) => MoveLimit::depth(depth)?,
        None => MoveLimit::move_time(Duration::from_millis(cli.movetime))?,
    };

    let openings = match &cli.openings {
        Some(path) => book::load(path)
            .with_context(|| format!("loading opening book {}", path.display()))?,
        None => OpeningSet::start_only(),
    };
    let prefixes: Vec<Vec<String>> = openings.iter().map(<[String]>::to_vec).collect();

    // (opening index, colors swapped) per game.
    let schedule: Vec<(usize, bool)> = if cli.openings.is_some() {
        (0..prefixes.len())
            .flat_map(|i| [(i, false), (i, true)])
            .collect()
    } else {
        (0..cli.games as usize).map(|g| (0, g % 2 == 1)).collect()
    };

    let sink = SqliteSink::open(&cli.db)
        .with_context(|| format!("opening result database {}", cli.db.display()))?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, finishing the current move");
            cancel.cancel();
        })
        .context("installing interrupt handler")?;
    }

    let mut first = EngineSlot::connect(&cli.engine1, config.options_for(&cli.engine1.name))?;
    let mut second = EngineSlot::connect(&cli.engine2, config.options_for(&cli.engine2.name))?;

    let scheduler = MatchScheduler::new(
        ChessOracle::new(),
        limit,
        ResultRecorder::new(Some(cli.invocation_id.clone())),
        cancel.clone(),
    );

    let mut first_wins = 0u32;
    let mut second_wins = 0u32;
    let mut draws = 0u32;
    let mut aborted = 0u32;

    for (game_no, (opening_idx, swapped)) in schedule.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        let opening = &prefixes[*opening_idx];

        let report = {
            let (white, black) = if *swapped {
                (&mut second, &mut first)
            } else {
                (&mut first, &mut second)
            };
            scheduler.play_game(
                Seat::new(white.name.clone(), &mut white.client),
                Seat::new(black.name.clone(), &mut black.client),
                opening,
            )?
        };

        match report.result.outcome {
            Outcome::Draw => draws += 1,
            Outcome::Aborted => aborted += 1,
            Outcome::WhiteWins | Outcome::BlackWins => {
                if report.result.winner_name() == first.name {
                    first_wins += 1;
                } else {
                    second_wins += 1;
                }
            }
        }

        tracing::info!(
            game = game_no + 1,
            total = schedule.len(),
            outcome = report.result.outcome.as_score(),
            moves = report.result.moves.len(),
            "game finished"
        );

        // A finished game that fails to persist ends the run non-zero;
        // silently dropping results would defeat the harness's purpose.
        scheduler
            .recorder()
            .persist(&sink, &report.result)
            .context("persisting match result")?;

        if let Some(error) = report.abort {
            tracing::warn!(error = %error, "game aborted");
            if matches!(error, GameError::Cancelled) {
                break;
            }
            // Engine state is unknown after a fault; start both fresh.
            first.reconnect()?;
            second.reconnect()?;
        }
    }

    let _ = first.client.shutdown();
    let _ = second.client.shutdown();

    println!(
        "{}: {} wins | {}: {} wins | draws: {} | aborted: {}",
        first.name, first_wins, second.name, second_wins, draws, aborted
    );

    Ok(())
}
