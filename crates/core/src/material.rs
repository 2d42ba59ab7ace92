//! Material counting

use serde::{Deserialize, Serialize};
use shakmaty::{Bitboard, Board, Color, Piece, Role};

use crate::geometry::piece_value;

/// Piece counts for one side. The king is not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCount {
    pub pawns: u32,
    pub knights: u32,
    pub bishops: u32,
    pub rooks: u32,
    pub queens: u32,
}

impl MaterialCount {
    pub fn of(board: &Board, color: Color) -> Self {
        let count = |role| board.by_piece(Piece { color, role }).count() as u32;
        Self {
            pawns: count(Role::Pawn),
            knights: count(Role::Knight),
            bishops: count(Role::Bishop),
            rooks: count(Role::Rook),
            queens: count(Role::Queen),
        }
    }

    /// Total in pawn units.
    pub fn total(&self) -> u32 {
        [
            (self.pawns, Role::Pawn),
            (self.knights, Role::Knight),
            (self.bishops, Role::Bishop),
            (self.rooks, Role::Rook),
            (self.queens, Role::Queen),
        ]
        .into_iter()
        .map(|(n, role)| n * piece_value(role).unwrap_or(0))
        .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialReport {
    pub white: MaterialCount,
    pub black: MaterialCount,
    pub white_total: u32,
    pub black_total: u32,
    /// `white_total - black_total`, pawn units.
    pub imbalance: i32,
    /// White holds the bishop pair and Black does not.
    pub white_bishop_pair: bool,
    /// Black holds the bishop pair and White does not.
    pub black_bishop_pair: bool,
}

/// One bishop on a light square and one on a dark square.
pub fn has_bishop_pair(board: &Board, color: Color) -> bool {
    let bishops = board.by_piece(Piece { color, role: Role::Bishop });
    (bishops & Bitboard::LIGHT_SQUARES).any() && (bishops & Bitboard::DARK_SQUARES).any()
}

pub fn material(board: &Board) -> MaterialReport {
    let white = MaterialCount::of(board, Color::White);
    let black = MaterialCount::of(board, Color::Black);
    let white_total = white.total();
    let black_total = black.total();
    let white_pair = has_bishop_pair(board, Color::White);
    let black_pair = has_bishop_pair(board, Color::Black);

    MaterialReport {
        white,
        black,
        white_total,
        black_total,
        imbalance: white_total as i32 - black_total as i32,
        white_bishop_pair: white_pair && !black_pair,
        black_bishop_pair: black_pair && !white_pair,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::load_fen;
    use shakmaty::Position;

    #[test]
    fn test_starting_material() {
        let report = material(&Board::default());
        assert_eq!(report.white_total, 39);
        assert_eq!(report.black_total, 39);
        assert_eq!(report.imbalance, 0);
        assert!(!report.white_bishop_pair);
        assert!(!report.black_bishop_pair);
        assert!(has_bishop_pair(&Board::default(), Color::White));
    }

    #[test]
    fn test_imbalance_matches_manual_recount() {
        // White: Q, R, 2B, 5P = 9+5+6+5 = 25. Black: 2R, N, 6P = 10+3+6 = 19.
        let pos = load_fen("2r1k2r/pp2pppp/2n5/8/8/2B5/PPB2PPP/3QR1K1 w k - 0 20").unwrap();
        let report = material(pos.board());
        assert_eq!(report.white_total, 25);
        assert_eq!(report.black_total, 19);
        assert_eq!(report.imbalance, 6);
        assert!(report.white_bishop_pair);
        assert!(!report.black_bishop_pair);
    }

    #[test]
    fn test_same_colored_bishops_are_not_a_pair() {
        // Both white bishops on dark squares (c1, e3).
        let pos = load_fen("4k3/8/8/8/8/4B3/8/2B1K3 w - - 0 1").unwrap();
        assert!(!has_bishop_pair(pos.board(), Color::White));
    }
}
