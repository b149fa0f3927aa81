//! Move legality and game-status evaluation.
//!
//! The supported move set deliberately leaves out castling, en passant,
//! and promotion. Draw detection covers stalemate and the basic
//! insufficient-material cases (bare kings, king plus one minor piece).

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, PieceKind, Square};

/// Why a move was rejected. Messages are safe to echo to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no piece at starting position")]
    EmptySource,

    #[error("not your piece")]
    NotYourPiece,

    #[error("must move to a different square")]
    SameSquare,

    #[error("cannot capture your own piece")]
    OwnPiece,

    #[error("illegal move for this piece")]
    IllegalShape,

    #[error("move leaves king in check")]
    KingInCheck,
}

/// Checks that moving `from` → `to` is fully legal for the side `turn`.
pub fn validate_move(
    board: &Board,
    from: Square,
    to: Square,
    turn: Color,
) -> Result<(), MoveError> {
    let piece = board.get(from).ok_or(MoveError::EmptySource)?;
    if piece.color != turn {
        return Err(MoveError::NotYourPiece);
    }
    if from == to {
        return Err(MoveError::SameSquare);
    }
    if let Some(target) = board.get(to) {
        if target.color == piece.color {
            return Err(MoveError::OwnPiece);
        }
    }
    if !pseudo_legal(board, from, to, piece) {
        return Err(MoveError::IllegalShape);
    }
    if !leaves_king_safe(board, from, to, piece.color) {
        return Err(MoveError::KingInCheck);
    }
    Ok(())
}

/// Movement-shape check, ignoring king safety.
fn pseudo_legal(board: &Board, from: Square, to: Square, piece: Piece) -> bool {
    match piece.kind {
        PieceKind::Pawn => pawn_move(board, from, to, piece.color),
        PieceKind::Knight => knight_move(from, to),
        PieceKind::Bishop => diagonal_clear(board, from, to),
        PieceKind::Rook => straight_clear(board, from, to),
        PieceKind::Queen => straight_clear(board, from, to) || diagonal_clear(board, from, to),
        PieceKind::King => king_move(board, from, to, piece.color),
    }
}

fn pawn_move(board: &Board, from: Square, to: Square, color: Color) -> bool {
    let dir: i8 = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let start_rank: u8 = match color {
        Color::White => 1,
        Color::Black => 6,
    };
    let dr = to.rank() as i8 - from.rank() as i8;

    if from.file() == to.file() {
        // Single push.
        if dr == dir {
            return !board.is_occupied(to);
        }
        // Double push from the starting rank.
        if from.rank() == start_rank && dr == 2 * dir {
            let Some(middle) = from.offset(0, dir) else {
                return false;
            };
            return !board.is_occupied(to) && !board.is_occupied(middle);
        }
        return false;
    }

    // Diagonal capture only.
    let df = (to.file() as i8 - from.file() as i8).abs();
    if df == 1 && dr == dir {
        return board.get(to).is_some_and(|p| p.color != color);
    }
    false
}

fn knight_move(from: Square, to: Square) -> bool {
    let df = (to.file() as i8 - from.file() as i8).abs();
    let dr = (to.rank() as i8 - from.rank() as i8).abs();
    (df == 2 && dr == 1) || (df == 1 && dr == 2)
}

fn king_move(board: &Board, from: Square, to: Square, color: Color) -> bool {
    let df = (to.file() as i8 - from.file() as i8).abs();
    let dr = (to.rank() as i8 - from.rank() as i8).abs();
    if df > 1 || dr > 1 {
        return false;
    }
    // Kings may never stand on adjacent squares.
    if let Some(enemy_king) = board.king(color.opposite()) {
        let kf = (enemy_king.file() as i8 - to.file() as i8).abs();
        let kr = (enemy_king.rank() as i8 - to.rank() as i8).abs();
        if kf <= 1 && kr <= 1 {
            return false;
        }
    }
    true
}

fn straight_clear(board: &Board, from: Square, to: Square) -> bool {
    if from.file() != to.file() && from.rank() != to.rank() {
        return false;
    }
    let df = (to.file() as i8 - from.file() as i8).signum();
    let dr = (to.rank() as i8 - from.rank() as i8).signum();
    path_clear(board, from, to, df, dr)
}

fn diagonal_clear(board: &Board, from: Square, to: Square) -> bool {
    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;
    if df.abs() != dr.abs() || df == 0 {
        return false;
    }
    path_clear(board, from, to, df.signum(), dr.signum())
}

/// True if every square strictly between `from` and `to` is empty,
/// stepping by `(df, dr)`.
fn path_clear(board: &Board, from: Square, to: Square, df: i8, dr: i8) -> bool {
    let mut cursor = from.offset(df, dr);
    while let Some(square) = cursor {
        if square == to {
            return true;
        }
        if board.is_occupied(square) {
            return false;
        }
        cursor = square.offset(df, dr);
    }
    // Walked off the board without reaching `to`; not a line move.
    false
}

/// Simulates the move and verifies the mover's own king is not left
/// attacked.
fn leaves_king_safe(board: &Board, from: Square, to: Square, color: Color) -> bool {
    let mut test = board.clone();
    test.shift(from, to);
    let Some(king) = test.king(color) else {
        return false;
    };
    !square_attacked(&test, king, color.opposite())
}

/// True if any piece of `by` attacks `square`.
pub fn square_attacked(board: &Board, square: Square, by: Color) -> bool {
    // Pawns attack diagonally toward the enemy side.
    let pawn_dir: i8 = match by {
        Color::White => -1,
        Color::Black => 1,
    };
    for df in [-1, 1] {
        if let Some(origin) = square.offset(df, pawn_dir) {
            if board.get(origin) == Some(Piece::new(by, PieceKind::Pawn)) {
                return true;
            }
        }
    }

    const KNIGHT_JUMPS: [(i8, i8); 8] = [
        (2, 1),
        (2, -1),
        (-2, 1),
        (-2, -1),
        (1, 2),
        (1, -2),
        (-1, 2),
        (-1, -2),
    ];
    for (df, dr) in KNIGHT_JUMPS {
        if let Some(origin) = square.offset(df, dr) {
            if board.get(origin) == Some(Piece::new(by, PieceKind::Knight)) {
                return true;
            }
        }
    }

    for df in -1..=1i8 {
        for dr in -1..=1i8 {
            if df == 0 && dr == 0 {
                continue;
            }
            if let Some(origin) = square.offset(df, dr) {
                if board.get(origin) == Some(Piece::new(by, PieceKind::King)) {
                    return true;
                }
            }
        }
    }

    for dir in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
        if sliding_attack(board, square, dir, by, &[PieceKind::Rook, PieceKind::Queen]) {
            return true;
        }
    }
    for dir in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        if sliding_attack(
            board,
            square,
            dir,
            by,
            &[PieceKind::Bishop, PieceKind::Queen],
        ) {
            return true;
        }
    }

    false
}

/// Scans outward from `square` along one direction for an attacking
/// slider; any occupied square ends the scan.
fn sliding_attack(
    board: &Board,
    square: Square,
    (df, dr): (i8, i8),
    by: Color,
    kinds: &[PieceKind],
) -> bool {
    let mut cursor = square.offset(df, dr);
    while let Some(candidate) = cursor {
        if let Some(piece) = board.get(candidate) {
            return piece.color == by && kinds.contains(&piece.kind);
        }
        cursor = candidate.offset(df, dr);
    }
    false
}

/// True if `color`'s king is attacked.
pub fn in_check(board: &Board, color: Color) -> bool {
    match board.king(color) {
        Some(king) => square_attacked(board, king, color.opposite()),
        None => false,
    }
}

/// True if `color` has at least one legal move.
pub fn has_legal_moves(board: &Board, color: Color) -> bool {
    for (from, piece) in board.pieces() {
        if piece.color != color {
            continue;
        }
        for to in Square::all() {
            if to != from && validate_move(board, from, to, color).is_ok() {
                return true;
            }
        }
    }
    false
}

/// The game status from the point of view of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameStatus {
    Playing,
    Check,
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate { .. } | GameStatus::Stalemate | GameStatus::InsufficientMaterial
        )
    }

    /// Short wire label for event payloads.
    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::Playing => "playing",
            GameStatus::Check => "check",
            GameStatus::Checkmate { .. } => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::InsufficientMaterial => "draw",
        }
    }
}

/// Evaluates the position for the side to move.
///
/// No legal moves means checkmate (if in check) or stalemate;
/// otherwise the basic material draws are checked before reporting
/// check or normal play.
pub fn game_status(board: &Board, to_move: Color) -> GameStatus {
    let check = in_check(board, to_move);
    if !has_legal_moves(board, to_move) {
        return if check {
            GameStatus::Checkmate {
                winner: to_move.opposite(),
            }
        } else {
            GameStatus::Stalemate
        };
    }
    if insufficient_material(board) {
        return GameStatus::InsufficientMaterial;
    }
    if check {
        GameStatus::Check
    } else {
        GameStatus::Playing
    }
}

/// Bare kings, or king plus a single minor piece against a bare king.
fn insufficient_material(board: &Board) -> bool {
    match board.piece_count() {
        2 => true,
        3 => board
            .pieces()
            .any(|(_, p)| matches!(p.kind, PieceKind::Knight | PieceKind::Bishop)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn piece(code: &str) -> Piece {
        code.parse().unwrap()
    }

    fn board_of(placements: &[(&str, &str)]) -> Board {
        let mut board = Board::empty();
        for &(square, code) in placements {
            board.put(sq(square), piece(code));
        }
        board
    }

    #[test]
    fn test_pawn_pushes() {
        let board = Board::initial();
        assert!(validate_move(&board, sq("e2"), sq("e3"), Color::White).is_ok());
        assert!(validate_move(&board, sq("e2"), sq("e4"), Color::White).is_ok());
        // Triple push and backward moves are out.
        assert_eq!(
            validate_move(&board, sq("e2"), sq("e5"), Color::White),
            Err(MoveError::IllegalShape)
        );
        assert_eq!(
            validate_move(&board, sq("e2"), sq("e1"), Color::White),
            Err(MoveError::OwnPiece)
        );
    }

    #[test]
    fn test_pawn_double_push_blocked() {
        let board = board_of(&[
            ("e2", "wp"),
            ("e3", "bn"),
            ("e1", "wk"),
            ("a8", "bk"),
        ]);
        assert_eq!(
            validate_move(&board, sq("e2"), sq("e4"), Color::White),
            Err(MoveError::IllegalShape)
        );
    }

    #[test]
    fn test_pawn_captures_diagonally_only() {
        let board = board_of(&[
            ("e4", "wp"),
            ("d5", "bp"),
            ("e5", "bp"),
            ("e1", "wk"),
            ("a8", "bk"),
        ]);
        assert!(validate_move(&board, sq("e4"), sq("d5"), Color::White).is_ok());
        // Straight into an occupied square is not a capture.
        assert_eq!(
            validate_move(&board, sq("e4"), sq("e5"), Color::White),
            Err(MoveError::IllegalShape)
        );
        // Diagonal without a target is not a move.
        assert_eq!(
            validate_move(&board, sq("e4"), sq("f5"), Color::White),
            Err(MoveError::IllegalShape)
        );
    }

    #[test]
    fn test_knight_jumps_over_pieces() {
        let board = Board::initial();
        assert!(validate_move(&board, sq("g1"), sq("f3"), Color::White).is_ok());
        assert_eq!(
            validate_move(&board, sq("g1"), sq("g3"), Color::White),
            Err(MoveError::IllegalShape)
        );
    }

    #[test]
    fn test_sliders_blocked_by_path() {
        let board = Board::initial();
        // Bishop and rook are boxed in at the start.
        assert_eq!(
            validate_move(&board, sq("f1"), sq("c4"), Color::White),
            Err(MoveError::IllegalShape)
        );
        assert_eq!(
            validate_move(&board, sq("a1"), sq("a5"), Color::White),
            Err(MoveError::IllegalShape)
        );
    }

    #[test]
    fn test_turn_and_source_checks() {
        let board = Board::initial();
        assert_eq!(
            validate_move(&board, sq("e4"), sq("e5"), Color::White),
            Err(MoveError::EmptySource)
        );
        assert_eq!(
            validate_move(&board, sq("e7"), sq("e5"), Color::White),
            Err(MoveError::NotYourPiece)
        );
        assert_eq!(
            validate_move(&board, sq("e2"), sq("e2"), Color::White),
            Err(MoveError::SameSquare)
        );
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        // The e-file knight shields the white king from the black rook.
        let board = board_of(&[
            ("e1", "wk"),
            ("e4", "wn"),
            ("e8", "br"),
            ("a8", "bk"),
        ]);
        assert_eq!(
            validate_move(&board, sq("e4"), sq("c5"), Color::White),
            Err(MoveError::KingInCheck)
        );
    }

    #[test]
    fn test_kings_never_adjacent() {
        let board = board_of(&[("e4", "wk"), ("e6", "bk")]);
        assert_eq!(
            validate_move(&board, sq("e4"), sq("e5"), Color::White),
            Err(MoveError::IllegalShape)
        );
        assert!(validate_move(&board, sq("e4"), sq("e3"), Color::White).is_ok());
    }

    #[test]
    fn test_square_attacked() {
        let board = board_of(&[("d4", "wq"), ("g7", "bp"), ("e1", "wk"), ("a8", "bk")]);
        assert!(square_attacked(&board, sq("d8"), Color::White));
        // The g7 pawn blocks the long diagonal.
        assert!(!square_attacked(&board, sq("h8"), Color::White));
        // Black pawns attack down-board.
        assert!(square_attacked(&board, sq("f6"), Color::Black));
        assert!(!square_attacked(&board, sq("g6"), Color::Black));
    }

    #[test]
    fn test_back_rank_checkmate() {
        let board = board_of(&[
            ("h8", "bk"),
            ("g7", "bp"),
            ("h7", "bp"),
            ("e8", "wr"),
            ("a1", "wk"),
        ]);
        assert!(in_check(&board, Color::Black));
        assert_eq!(
            game_status(&board, Color::Black),
            GameStatus::Checkmate {
                winner: Color::White
            }
        );
    }

    #[test]
    fn test_stalemate() {
        let board = board_of(&[("a8", "bk"), ("b6", "wk"), ("c7", "wq")]);
        assert!(!in_check(&board, Color::Black));
        assert_eq!(game_status(&board, Color::Black), GameStatus::Stalemate);
    }

    #[test]
    fn test_insufficient_material() {
        let kings = board_of(&[("e1", "wk"), ("e8", "bk")]);
        assert_eq!(
            game_status(&kings, Color::White),
            GameStatus::InsufficientMaterial
        );

        let king_knight = board_of(&[("e1", "wk"), ("e8", "bk"), ("c3", "wn")]);
        assert_eq!(
            game_status(&king_knight, Color::Black),
            GameStatus::InsufficientMaterial
        );

        // A rook is mating material.
        let king_rook = board_of(&[("e1", "wk"), ("e8", "bk"), ("a1", "wr")]);
        assert_eq!(game_status(&king_rook, Color::Black), GameStatus::Playing);
    }

    #[test]
    fn test_check_is_not_terminal() {
        let board = board_of(&[("e1", "wk"), ("e8", "br"), ("a8", "bk"), ("d2", "wq")]);
        let status = game_status(&board, Color::White);
        assert_eq!(status, GameStatus::Check);
        assert!(!status.is_terminal());
    }
}
