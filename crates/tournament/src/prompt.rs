//! Prompt construction for a move request

use tictactoe_core::{Game, Move};

use crate::client::{ChatMessage, PromptMode};

const VERBOSE_SYSTEM: &str = "You are playing tic-tac-toe on a 3x3 board. \
Rows and columns are numbered 0 to 2, with (0,0) in the top-left corner. \
Players take turns placing their marker in an empty cell; the first to get \
three in a row, column or diagonal wins. \
You may reason about the position before answering, but the LAST line of your \
reply must contain only your move as row,col (for example: 1,2).";

const MINIMAL_SYSTEM: &str = "You are playing tic-tac-toe on a 3x3 board with rows \
and columns numbered 0 to 2. Reply with only your move as row,col and nothing else.";

/// Empty cells as `(r,c), (r,c), ...`, in row-major order.
pub fn format_available(cells: &[Move]) -> String {
    cells
        .iter()
        .map(|m| format!("({},{})", m.row, m.col))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per committed move: `1. X played 1,1`.
pub fn format_history(game: &Game) -> String {
    if game.moves().is_empty() {
        return "No moves yet.".to_string();
    }
    game.moves()
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{}. {} played {},{}", i + 1, m.player, m.row, m.col))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the system and user messages asking the side to move for a move.
pub fn build_messages(game: &Game, mode: PromptMode) -> Vec<ChatMessage> {
    let player = game.current_player();
    let available = format_available(&game.empty_cells());

    let (system, user) = match mode {
        PromptMode::Verbose => (
            VERBOSE_SYSTEM,
            format!(
                "You are {player}.\n\nCurrent board ('.' is empty):\n{board}\n\n\
                 Move history:\n{history}\n\n\
                 Available moves: {available}\n\n\
                 Choose one of the available moves. End your reply with a final line \
                 containing only row,col.",
                board = game.board(),
                history = format_history(game),
            ),
        ),
        PromptMode::Minimal => (
            MINIMAL_SYSTEM,
            format!(
                "You are {player}.\n{board}\n\nMove history:\n{history}\n\n\
                 Available moves: {available}\n\nYour move (row,col):",
                board = game.board(),
                history = format_history(game),
            ),
        ),
    };

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
