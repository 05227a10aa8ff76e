//! EWN-Rust: an MCTS-RAVE engine for the modified EinStein würfelt nicht.
//!
//! ## Usage
//!
//! - `ewn-rust` - Play a short self-play demo
//! - `ewn-rust agent` - Speak the text protocol on stdin/stdout
//! - `ewn-rust demo` - Play a self-play game to the end
//!
//! Logs go to stderr; `RUST_LOG` overrides `--log-level`.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use ewn_rust::board::Board;
use ewn_rust::config::SearchConfig;
use ewn_rust::constants::DEFAULT_TIME_LIMIT_SECS;
use ewn_rust::mcts::Mcts;
use ewn_rust::protocol::AgentEngine;

/// EWN-Rust: anytime MCTS engine for EinStein würfelt nicht
#[derive(Parser)]
#[command(name = "ewn-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    search: SearchArgs,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SearchArgs {
    /// Seconds of thinking per move
    #[arg(long, default_value_t = DEFAULT_TIME_LIMIT_SECS, global = true)]
    time_limit: f64,

    /// Playout threads (0 = one per core)
    #[arg(long, default_value_t = 0, global = true)]
    threads: usize,

    /// Random playouts per child of each expanded node
    #[arg(long, global = true)]
    trials: Option<u32>,

    /// Seed for reproducible searches
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent protocol on stdin/stdout
    Agent,
    /// Let the engine play itself from the standard opening
    Demo {
        /// Stop after this many plies
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
    },
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(())
}

impl SearchArgs {
    fn time_limit(&self) -> Result<Duration> {
        if !self.time_limit.is_finite() || self.time_limit <= 0.0 {
            bail!("--time-limit must be a positive number of seconds");
        }
        match Duration::try_from_secs_f64(self.time_limit) {
            Ok(limit) => Ok(limit),
            Err(e) => bail!("--time-limit {} is out of range: {e}", self.time_limit),
        }
    }

    fn config(&self) -> SearchConfig {
        let mut config = SearchConfig::default().with_threads(self.threads);
        if let Some(trials) = self.trials {
            config = config.with_trials(trials);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let time_limit = cli.search.time_limit()?;
    let config = cli.search.config();
    config.validate().context("invalid search configuration")?;

    match cli.command {
        Some(Commands::Agent) => {
            let mut engine = AgentEngine::new(config, time_limit)?;
            engine.run().context("agent protocol loop failed")?;
        }
        Some(Commands::Demo { max_plies }) => run_demo(config, time_limit, max_plies)?,
        None => run_demo(config, time_limit, 6)?,
    }
    Ok(())
}

fn run_demo(config: SearchConfig, time_limit: Duration, max_plies: usize) -> Result<()> {
    println!("EWN-Rust: MCTS-RAVE self-play\n");

    let mut board = Board::standard();
    let mut mcts = Mcts::new(board, config)?;
    println!("{board}");

    for turn in 1..=max_plies {
        if board.is_completed() {
            break;
        }
        let mover = board.next_turn();
        let ply = mcts.best_ply(time_limit)?;
        let search = *mcts.last_search();

        mcts.advance(&ply)?;
        board.apply_ply(&ply);

        info!(
            turn,
            %mover,
            %ply,
            iterations = search.iterations,
            rollouts = search.rollouts,
            distance = board.total_distance(),
            "move played"
        );
        println!("{turn}. {mover} plays {ply}");
        println!("{board}");
    }

    if board.is_completed() {
        match board.winner() {
            Some(color) => println!("Winner: {color}"),
            None => println!("Draw"),
        }
    } else {
        println!("Stopped before the end of the game");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(time_limit: f64) -> SearchArgs {
        SearchArgs {
            time_limit,
            threads: 0,
            trials: None,
            seed: None,
        }
    }

    #[test]
    fn test_time_limit_flag() {
        assert_eq!(
            search_args(0.25).time_limit().unwrap(),
            Duration::from_millis(250)
        );
        assert!(search_args(0.0).time_limit().is_err());
        assert!(search_args(-3.0).time_limit().is_err());
        assert!(search_args(f64::INFINITY).time_limit().is_err());
        assert!(search_args(1e20).time_limit().is_err());
    }

    #[test]
    fn test_cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "ewn-rust", "demo", "--time-limit", "2", "--trials", "10", "--seed", "5",
        ])
        .unwrap();
        let config = cli.search.config();
        assert_eq!(config.trials_per_sim, 10);
        assert_eq!(config.seed, Some(5));
        assert!(matches!(cli.command, Some(Commands::Demo { max_plies: 200 })));
    }
}
