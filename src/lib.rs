//! EWN-Rust: an anytime MCTS engine for the modified EinStein würfelt nicht.
//!
//! Two players move numbered cubes toward the opposite corner of a 6x7 board.
//! The engine answers "which move now?" within a wall-clock budget using
//! Monte Carlo Tree Search with AMAF/RAVE statistics and a UCB selection rule
//! whose exploration constant shrinks as the game nears its end.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and engine parameters
//! - [`game`] - The [`GameState`](game::GameState) interface the search needs
//! - [`board`] - Board state, move generation and scoring for the game
//! - [`playout`] - Random game simulation
//! - [`ucb`] - UCB-RAVE scoring formulas
//! - [`node`] - Search tree nodes and their statistics
//! - [`config`] - Search configuration
//! - [`mcts`] - The search controller
//! - [`protocol`] - Text protocol for driving the engine
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//!
//! use ewn_rust::board::Board;
//! use ewn_rust::config::SearchConfig;
//! use ewn_rust::mcts::Mcts;
//!
//! let board = Board::standard();
//! let config = SearchConfig::for_testing().with_max_iterations(20);
//! let mut mcts = Mcts::new(board, config)?;
//!
//! let ply = mcts.best_ply(Duration::from_secs(5))?;
//! assert!(board.legal_plies().contains(&ply));
//!
//! // Keep the subtree under the chosen move for the next turn.
//! mcts.advance(&ply)?;
//! println!("Best move: {ply}");
//! # Ok::<(), ewn_rust::mcts::MctsError>(())
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod game;
pub mod mcts;
pub mod node;
pub mod playout;
pub mod protocol;
pub mod ucb;
