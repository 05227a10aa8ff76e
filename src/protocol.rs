//! Line-oriented agent protocol.
//!
//! A GTP-style text protocol for driving the engine from a referee or a
//! terminal. Every command may start with a numeric id; replies are
//! `=[id] text` on success and `?[id] message` on failure, followed by an
//! empty line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`
//! - `quit`
//! - `clear_board` - Reset to the standard opening
//! - `set_board <42 cells> <red|blue>` - Load a position (`R0`..`B5`, `__`)
//! - `play <row> <col> <num> <h|v|d>` or `play pass` - Record a move
//! - `genmove [seconds]` - Search, play and print a move
//! - `showboard` - Print the current board
//!
//! `play` and `genmove` re-root the search tree instead of rebuilding it, so
//! statistics gathered on earlier turns carry over.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use tracing::info;

use crate::board::{Board, Ply};
use crate::config::SearchConfig;
use crate::game::GameState;
use crate::mcts::{Mcts, MctsError};

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "genmove",
    "known_command",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "set_board",
    "showboard",
    "version",
];

/// Agent state: the current position and the search tree built on it.
pub struct AgentEngine {
    board: Board,
    mcts: Mcts<Board>,
    time_limit: Duration,
}

impl AgentEngine {
    /// Create an engine on the standard opening.
    pub fn new(config: SearchConfig, time_limit: Duration) -> Result<Self, MctsError> {
        let board = Board::standard();
        Ok(Self {
            board,
            mcts: Mcts::new(board, config)?,
            time_limit,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Run the command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];
            let (success, message) = self.execute(&command, args);

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(stdout, "{prefix}{id_str} {message}\n")?;
            stdout.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command id from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "1".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => match args.first() {
                Some(cmd) => {
                    let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                    (true, known.to_string())
                }
                None => (false, "missing argument".to_string()),
            },

            "quit" => (true, String::new()),

            "clear_board" => {
                self.load(Board::standard());
                (true, String::new())
            }

            "set_board" => match args.join(" ").parse::<Board>() {
                Ok(board) => {
                    self.load(board);
                    (true, String::new())
                }
                Err(e) => (false, e.to_string()),
            },

            "showboard" => (true, format!("\n{}{} to move", self.board, self.board.next_turn())),

            "play" => {
                if args.is_empty() {
                    return (false, "missing arguments".to_string());
                }
                let ply = match args.join(" ").parse::<Ply>() {
                    Ok(ply) => ply,
                    Err(e) => return (false, e.to_string()),
                };
                match self.commit(&ply) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                let time_limit = match args.first() {
                    None => self.time_limit,
                    Some(arg) => match parse_seconds(arg) {
                        Some(limit) => limit,
                        None => return (false, "invalid time limit".to_string()),
                    },
                };
                if self.board.is_completed() {
                    return (false, "game is over".to_string());
                }

                let result = self
                    .mcts
                    .best_ply(time_limit)
                    .and_then(|ply| self.commit(&ply).map(|()| ply));
                match result {
                    Ok(ply) => {
                        let search = self.mcts.last_search();
                        info!(
                            %ply,
                            iterations = search.iterations,
                            rollouts = search.rollouts,
                            "genmove"
                        );
                        (true, ply.to_string())
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    /// Play `ply` on the board and move the search root along with it.
    fn commit(&mut self, ply: &Ply) -> Result<(), MctsError> {
        self.mcts.advance(ply)?;
        self.board = self.board.apply(ply);
        Ok(())
    }

    fn load(&mut self, board: Board) {
        self.board = board;
        self.mcts.reset(board);
    }
}

/// A positive number of seconds that fits in a [`Duration`].
fn parse_seconds(arg: &str) -> Option<Duration> {
    let secs = arg.parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|limit| !limit.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AgentEngine {
        let config = SearchConfig::for_testing().with_max_iterations(5);
        AgentEngine::new(config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = AgentEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = AgentEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut engine = engine();
        let (success, response) = engine.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "ewn-rust");
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine();

        let (success, response) = engine.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = engine.execute("known_command", &["boardsize"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_play_and_clear() {
        let mut engine = engine();

        let (success, _) = engine.execute("play", &["0", "1", "1", "d"]);
        assert!(success);
        assert_eq!(engine.board().next_turn(), crate::game::Color::Blue);

        let (success, _) = engine.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(*engine.board(), Board::standard());
    }

    #[test]
    fn test_illegal_play_rejected() {
        let mut engine = engine();
        // The corner cube is boxed in by its own cubes.
        let (success, _) = engine.execute("play", &["0", "0", "0", "h"]);
        assert!(!success);
        assert_eq!(*engine.board(), Board::standard());

        let (success, _) = engine.execute("play", &["nonsense"]);
        assert!(!success);
    }

    #[test]
    fn test_genmove_plays_a_legal_move() {
        let mut engine = engine();
        let before = *engine.board();
        let (success, response) = engine.execute("genmove", &["10"]);
        assert!(success, "{response}");

        let ply: Ply = response.parse().unwrap();
        assert!(before.legal_plies().contains(&ply));
        assert_eq!(*engine.board(), before.apply(&ply));
        assert_eq!(engine.mcts.root().board(), engine.board());
    }

    #[test]
    fn test_set_board() {
        let mut engine = engine();
        let text = format!("{} blue", Board::standard());
        let args: Vec<&str> = text.split_whitespace().collect();
        let (success, _) = engine.execute("set_board", &args);
        assert!(success);
        assert_eq!(engine.board().next_turn(), crate::game::Color::Blue);

        let (success, _) = engine.execute("set_board", &["R0", "B0"]);
        assert!(!success);
    }

    #[test]
    fn test_genmove_rejects_bad_time() {
        let mut engine = engine();
        let (success, _) = engine.execute("genmove", &["-1"]);
        assert!(!success);
        let (success, _) = engine.execute("genmove", &["abc"]);
        assert!(!success);
        let (success, _) = engine.execute("genmove", &["1e20"]);
        assert!(!success);
        let (success, _) = engine.execute("genmove", &["0"]);
        assert!(!success);
        assert_eq!(*engine.board(), Board::standard());
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("0.5"), Some(Duration::from_millis(500)));
        assert_eq!(parse_seconds("-1"), None);
        assert_eq!(parse_seconds("NaN"), None);
        assert_eq!(parse_seconds("1e20"), None);
    }
}
