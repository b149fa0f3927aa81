//! Chess game mode for Arena.
//!
//! Implements the [`arena_room::GameRules`] trait: standard piece
//! movement, check and pin enforcement, checkmate, stalemate, and the
//! basic material draws. Castling, en passant, and promotion are not
//! supported.

mod board;
mod game;
mod rules;

pub use board::{Board, Color, Piece, PieceKind, Square};
pub use game::{ChessConfig, ChessGame, ChessMove, ChessState};
pub use rules::{GameStatus, MoveError, game_status, in_check, square_attacked, validate_move};
