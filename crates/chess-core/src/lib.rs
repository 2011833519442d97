//! Chess rules, evaluation and search for the jackpot referee.
//!
//! Everything in this crate is pure: no I/O, no clocks other than the
//! deadline handed to [`search::search`], and no ambient randomness.

pub mod board;
pub mod error;
pub mod eval;
pub mod pgn;
pub mod search;
pub mod side;

pub use board::{BoardMove, DrawReason, Game, PlayedMove, TerminalStatus};
pub use error::BoardError;
pub use search::{search, SearchLimits, SearchResult};
pub use side::{GameResult, Side};
