//! Piece activity (mobility, centralization) and development

use serde::{Deserialize, Serialize};
use shakmaty::{Bitboard, Board, Color, Piece, Role, Square};

use crate::geometry::{distance, pawn_attack_set};
use crate::notation;
use crate::position::Phase;
use crate::structure::{CastlingState, CastlingStates};

/// Band used for any role/phase pair without its own thresholds.
const DEFAULT_BAND: (u32, u32) = (3, 8);

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    Restricted,
    Normal,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieceActivity {
    #[serde(serialize_with = "notation::square::serialize")]
    pub square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub piece: Piece,
    pub mobility: u32,
    /// Chebyshev distance to the nearest of d4, e4, d5, e5.
    pub centralization: u32,
    pub assessment: Assessment,
}

/// `(restricted_below, active_above)` for a role in a phase.
pub fn mobility_band(role: Role, phase: Phase) -> (u32, u32) {
    match (role, phase) {
        (Role::Knight, Phase::Endgame) => (4, 6),
        (Role::Knight, _) => (3, 5),
        (Role::Bishop, Phase::Endgame) => (5, 8),
        (Role::Bishop, _) => (4, 7),
        (Role::Rook, Phase::Endgame) => (6, 10),
        (Role::Rook, _) => (4, 8),
        (Role::Queen, Phase::Middlegame) => (6, 14),
        (Role::Queen, Phase::Endgame) => (8, 16),
        _ => DEFAULT_BAND,
    }
}

pub fn classify(role: Role, phase: Phase, mobility: u32) -> Assessment {
    let (low, high) = mobility_band(role, phase);
    if mobility < low {
        Assessment::Restricted
    } else if mobility > high {
        Assessment::Active
    } else {
        Assessment::Normal
    }
}

/// Squares a piece of `color` may usefully go to: not friendly-occupied, not
/// swept by enemy pawns, not the friendly king's square.
pub fn mobility_area(board: &Board, color: Color) -> Bitboard {
    let mut area = !board.by_color(color) & !pawn_attack_set(board, !color);
    if let Some(king) = board.king_of(color) {
        area.discard(king);
    }
    area
}

pub fn centralization(square: Square) -> u32 {
    CENTER.iter().map(|&c| distance(square, c)).min().unwrap_or(0)
}

/// Activity of every knight, bishop, rook and queen, White first, each side
/// in square order.
pub fn activity(board: &Board, phase: Phase) -> Vec<PieceActivity> {
    let mut result = Vec::new();
    for color in [Color::White, Color::Black] {
        let area = mobility_area(board, color);
        for square in board.by_color(color) {
            let Some(piece) = board.piece_at(square) else {
                continue;
            };
            if matches!(piece.role, Role::Pawn | Role::King) {
                continue;
            }
            let mobility = (board.attacks_from(square) & area).count() as u32;
            result.push(PieceActivity {
                square,
                piece,
                mobility,
                centralization: centralization(square),
                assessment: classify(piece.role, phase, mobility),
            });
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentReport {
    /// Knights and bishops no longer on their starting squares.
    pub white_developed: u32,
    pub black_developed: u32,
    pub white_castled: bool,
    pub black_castled: bool,
}

fn minor_home_squares(color: Color) -> [(Square, Role); 4] {
    match color {
        Color::White => [
            (Square::B1, Role::Knight),
            (Square::G1, Role::Knight),
            (Square::C1, Role::Bishop),
            (Square::F1, Role::Bishop),
        ],
        Color::Black => [
            (Square::B8, Role::Knight),
            (Square::G8, Role::Knight),
            (Square::C8, Role::Bishop),
            (Square::F8, Role::Bishop),
        ],
    }
}

fn developed_minors(board: &Board, color: Color) -> u32 {
    let at_home = minor_home_squares(color)
        .into_iter()
        .filter(|&(sq, role)| board.piece_at(sq) == Some(Piece { color, role }))
        .count() as u32;
    let minors =
        (board.by_role(Role::Knight) | board.by_role(Role::Bishop)) & board.by_color(color);
    (minors.count() as u32).saturating_sub(at_home)
}

/// Development counts. Castling status comes from the shared
/// [`crate::structure::castling_state`] heuristic.
pub fn development(board: &Board, castling: &CastlingStates) -> DevelopmentReport {
    DevelopmentReport {
        white_developed: developed_minors(board, Color::White),
        black_developed: developed_minors(board, Color::Black),
        white_castled: castling.white != CastlingState::NotCastled,
        black_castled: castling.black != CastlingState::NotCastled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::load_fen;
    use crate::structure::castling_state;
    use shakmaty::Position;

    #[test]
    fn test_start_knights_have_two_squares() {
        let board = Board::default();
        let pieces = activity(&board, Phase::Opening);
        assert_eq!(pieces.len(), 14);
        let knight = pieces.iter().find(|p| p.square == Square::G1).unwrap();
        assert_eq!(knight.mobility, 2);
        assert_eq!(knight.assessment, Assessment::Restricted);
        let rook = pieces.iter().find(|p| p.square == Square::A1).unwrap();
        assert_eq!(rook.mobility, 0);
    }

    #[test]
    fn test_mobility_area_excludes_enemy_pawn_attacks() {
        // The e7 pawn covers d6 and f6.
        let pos = load_fen("4k3/4p3/8/8/4N3/8/8/4K3 w - - 0 1").unwrap();
        let pieces = activity(pos.board(), Phase::Endgame);
        let knight = &pieces[0];
        // Eight knight squares minus d6 and f6.
        assert_eq!(knight.mobility, 6);
        assert_eq!(knight.centralization, 0);
        assert_eq!(knight.assessment, Assessment::Normal);
    }

    #[test]
    fn test_endgame_tightens_knight_band() {
        assert_eq!(classify(Role::Knight, Phase::Middlegame, 6), Assessment::Active);
        assert_eq!(classify(Role::Knight, Phase::Endgame, 6), Assessment::Normal);
        assert_eq!(classify(Role::Knight, Phase::Endgame, 3), Assessment::Restricted);
    }

    #[test]
    fn test_default_band_for_opening_queen() {
        assert_eq!(mobility_band(Role::Queen, Phase::Opening), DEFAULT_BAND);
    }

    #[test]
    fn test_centralization_corner() {
        assert_eq!(centralization(Square::A1), 3);
        assert_eq!(centralization(Square::E5), 0);
    }

    #[test]
    fn test_development() {
        let board = Board::default();
        let report = development(&board, &castling_state(&board));
        assert_eq!(report.white_developed, 0);
        assert_eq!(report.black_developed, 0);
        assert!(!report.white_castled);

        let pos =
            load_fen("r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQ1RK1 b kq - 5 4")
                .unwrap();
        let report = development(pos.board(), &castling_state(pos.board()));
        assert_eq!(report.white_developed, 2);
        assert_eq!(report.black_developed, 3);
        assert!(report.white_castled);
        assert!(!report.black_castled);
    }
}
