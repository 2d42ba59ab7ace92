//! Position loading and game-phase detection

use serde::{Deserialize, Serialize};
use shakmaty::{fen::Fen, CastlingMode, Chess, Color, Position, Role};

use crate::error::{Error, Result};
use crate::geometry::piece_value;

/// Non-pawn material (both sides, pawn units) at or below which the position
/// is treated as an endgame.
const ENDGAME_MATERIAL: u32 = 26;
/// Non-pawn material needed to still count as the opening.
const OPENING_MATERIAL: u32 = 56;
const OPENING_LAST_MOVE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    /// Classify by remaining non-pawn material and move number.
    pub fn detect(position: &Chess) -> Self {
        let material =
            non_pawn_material(position, Color::White) + non_pawn_material(position, Color::Black);
        let fullmoves = position.fullmoves().get();

        if material <= ENDGAME_MATERIAL {
            Phase::Endgame
        } else if material >= OPENING_MATERIAL && fullmoves <= OPENING_LAST_MOVE {
            Phase::Opening
        } else {
            Phase::Middlegame
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Middlegame => "middlegame",
            Phase::Endgame => "endgame",
        }
    }
}

fn non_pawn_material(position: &Chess, color: Color) -> u32 {
    let board = position.board();
    [Role::Knight, Role::Bishop, Role::Rook, Role::Queen]
        .into_iter()
        .map(|role| {
            let count = (board.by_role(role) & board.by_color(color)).count() as u32;
            count * piece_value(role).unwrap_or(0)
        })
        .sum()
}

/// Parse and validate a FEN string.
///
/// Text that is not FEN fails with [`Error::InvalidPosition`]; a well-formed
/// FEN describing an impossible position (missing kings, both sides in
/// check, pawns on the back rank...) fails with [`Error::IllegalPosition`].
pub fn load_fen(fen: &str) -> Result<Chess> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| Error::InvalidPosition(format!("{}: {}", fen.trim(), e)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| Error::IllegalPosition(format!("{}: {}", fen.trim(), e)))
}
