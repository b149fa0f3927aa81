//! `GameRules` implementation wiring chess into the room machinery.

use arena_protocol::{Outcome, PlayerId};
use arena_room::GameRules;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::board::{Board, Color, Square};
use crate::rules::{self, GameStatus};

/// Chess has no tunables yet; the type exists so variants can grow
/// some (clocks, handicaps) without touching the room layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessConfig;

/// A move submission: source and destination squares in algebraic
/// notation ({"from": "e2", "to": "e4"} on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
}

/// The authoritative state of one chess game.
#[derive(Debug, Clone, Serialize)]
pub struct ChessState {
    board: Board,
    to_move: Color,
    white: PlayerId,
    black: PlayerId,
    status: GameStatus,
    moves_played: u32,
}

impl ChessState {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn moves_played(&self) -> u32 {
        self.moves_played
    }

    /// The seat a player occupies, if any.
    pub fn seat(&self, player: PlayerId) -> Option<Color> {
        if player == self.white {
            Some(Color::White)
        } else if player == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The player occupying a seat.
    pub fn player(&self, color: Color) -> PlayerId {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// The chess game mode. First player in join order takes White.
pub struct ChessGame;

impl GameRules for ChessGame {
    type Config = ChessConfig;
    type State = ChessState;
    type Action = ChessMove;

    fn init(_config: &ChessConfig, players: &[PlayerId]) -> ChessState {
        let white = players.first().copied().unwrap_or(PlayerId(0));
        let black = players.get(1).copied().unwrap_or(white);
        ChessState {
            board: Board::initial(),
            to_move: Color::White,
            white,
            black,
            status: GameStatus::Playing,
            moves_played: 0,
        }
    }

    fn validate(state: &ChessState, player: PlayerId, action: &ChessMove) -> Result<(), String> {
        let seat = state
            .seat(player)
            .ok_or_else(|| "not seated at this board".to_string())?;
        if seat != state.to_move {
            return Err("not your turn".to_string());
        }
        rules::validate_move(&state.board, action.from, action.to, seat)
            .map_err(|e| e.to_string())
    }

    fn apply(state: &mut ChessState, player: PlayerId, action: ChessMove) -> serde_json::Value {
        let captured = state.board.shift(action.from, action.to);
        state.to_move = state.to_move.opposite();
        state.moves_played += 1;
        state.status = rules::game_status(&state.board, state.to_move);

        json!({
            "move": { "from": action.from, "to": action.to },
            "by": player,
            "captured": captured.map(|p| p.to_string()),
            "turn": state.to_move,
            "status": state.status.label(),
            "board": state.board,
        })
    }

    fn outcome(state: &ChessState) -> Option<(Outcome, String)> {
        match state.status {
            GameStatus::Checkmate { winner } => Some((
                Outcome::Win {
                    winner: state.player(winner),
                },
                "checkmate".to_string(),
            )),
            GameStatus::Stalemate => Some((Outcome::Draw, "stalemate".to_string())),
            GameStatus::InsufficientMaterial => {
                Some((Outcome::Draw, "insufficient material".to_string()))
            }
            GameStatus::Playing | GameStatus::Check => None,
        }
    }
}
