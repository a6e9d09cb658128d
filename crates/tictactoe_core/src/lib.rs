//! Tic-tac-toe rules for the LLM tournament.
//!
//! Pure game logic with no I/O: a 3x3 board, turn order derived from the
//! move count, and win/draw detection.

pub mod board;
pub mod types;

pub use board::*;
pub use types::*;
