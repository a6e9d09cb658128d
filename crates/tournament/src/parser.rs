//! Parsing free-form model replies into moves
//!
//! Only the last non-blank line of a reply is considered, so models may
//! think out loud before answering. The line is matched against the
//! coordinate patterns in priority order; the first match wins:
//!
//! 1. labeled: `row 1, col 2` / `Row: 1 Column: 2`
//! 2. parenthesized: `(1,2)`
//! 3. comma pair: `1,2` / `1 , 2`
//! 4. space pair: `1 2`
//!
//! Captured values are then checked for numeric validity, negativity and
//! range, in that order, and the first failing check decides the reason.

use regex::Regex;
use std::sync::LazyLock;
use tictactoe_core::{Move, BOARD_SIZE};

use crate::records::InvalidReason;

static PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\brow\b[^\d-]*(-?\d+)[^\d-]*?\b(?:col|column)\b[^\d-]*(-?\d+)")
            .expect("labeled pattern"),
        Regex::new(r"\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)").expect("parenthesized pattern"),
        Regex::new(r"(-?\d+)\s*,\s*(-?\d+)").expect("comma pattern"),
        Regex::new(r"(-?\d+)\s+(-?\d+)").expect("space pattern"),
    ]
});

/// Last line of `reply` that is not whitespace-only.
pub fn last_non_blank_line(reply: &str) -> Option<&str> {
    reply.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

/// Extract the raw coordinate captures from a single line.
fn capture_pair(line: &str) -> Option<(&str, &str)> {
    PATTERNS.iter().find_map(|re| {
        let caps = re.captures(line)?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    })
}

/// A captured coordinate: its sign and magnitude. Magnitudes too large for
/// `u64` saturate, which still puts them outside the board.
fn coordinate(raw: &str) -> Result<(bool, u64), InvalidReason> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidReason::InvalidSyntax);
    }
    let magnitude = digits.parse::<u64>().unwrap_or(u64::MAX);
    Ok((negative && magnitude != 0, magnitude))
}

/// Parse a model reply into a move, or the reason it is not one.
///
/// Board occupancy is not checked here; the game decides legality.
pub fn parse_move(reply: &str) -> Result<Move, InvalidReason> {
    let line = last_non_blank_line(reply).ok_or(InvalidReason::Blank)?;
    let (raw_row, raw_col) = capture_pair(line).ok_or(InvalidReason::InvalidSyntax)?;

    let (row_negative, row) = coordinate(raw_row)?;
    let (col_negative, col) = coordinate(raw_col)?;

    if row_negative || col_negative {
        return Err(InvalidReason::NegativeCoordinates);
    }
    let limit = BOARD_SIZE as u64 - 1;
    if row > limit || col > limit {
        return Err(InvalidReason::OutsideBoard);
    }

    Ok(Move::new(row as usize, col as usize))
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;
