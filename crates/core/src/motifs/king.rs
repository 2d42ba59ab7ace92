//! King-centred motifs: double check, back-rank weakness, exposed king

use shakmaty::{attacks, Board, Chess, Color, Position, Square};

use crate::geometry::{attackers, back_rank, distance, ray_between, relative_rank};
use crate::position::Phase;
use crate::structure::KingSafety;

use super::types::{BackRankWeakness, DoubleCheck, ExposedKing};

/// Shield pawns at or below this count leave the king open.
const EXPOSED_SHIELD_MAX: u32 = 1;
/// Enemy piece attacks on the king zone needed to call it exposed.
const EXPOSED_ATTACKS_MIN: u32 = 3;

pub fn find_double_check(pos: &Chess) -> Option<DoubleCheck> {
    let checkers = pos.checkers();
    if checkers.count() < 2 {
        return None;
    }
    let king_square = pos.board().king_of(pos.turn())?;
    Some(DoubleCheck {
        king_square,
        checking_squares: checkers.into_iter().collect(),
    })
}

/// A king boxed in on its back rank facing enemy heavy pieces, with the
/// back-rank squares that have a clear line to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackRankGuard {
    pub color: Color,
    pub king: Square,
    pub line_squares: Vec<Square>,
}

impl BackRankGuard {
    /// Whether the enemy can land on `square` without the king simply
    /// taking the intruder.
    fn king_covers(&self, board: &Board, square: Square) -> bool {
        distance(self.king, square) == 1 && attackers(board, square, !self.color).count() < 2
    }

    /// Friendly pieces other than the king defending `square`.
    pub fn guards_of(&self, board: &Board, square: Square) -> Vec<Square> {
        if self.king_covers(board, square) {
            return vec![self.king];
        }
        (attackers(board, square, self.color) & !board.kings()).into_iter().collect()
    }
}

pub fn back_rank_guard(board: &Board, color: Color) -> Option<BackRankGuard> {
    let king = board.king_of(color)?;
    if king.rank() != back_rank(color) {
        return None;
    }
    let enemy_heavy = (board.rooks() | board.queens()) & board.by_color(!color);
    if enemy_heavy.is_empty() {
        return None;
    }

    let has_luft = (attacks::king_attacks(king) & !board.by_color(color))
        .into_iter()
        .filter(|&sq| relative_rank(color, sq) == 1)
        .any(|sq| attackers(board, sq, !color).is_empty());
    if has_luft {
        return None;
    }

    let line_squares = Square::ALL
        .into_iter()
        .filter(|&sq| sq.rank() == king.rank() && sq != king)
        .filter(|&sq| !board.by_color(color).contains(sq))
        .filter(|&sq| {
            ray_between(sq, king)
                .is_some_and(|between| between.iter().all(|b| !board.occupied().contains(*b)))
        })
        .collect::<Vec<_>>();
    if line_squares.is_empty() {
        return None;
    }

    Some(BackRankGuard { color, king, line_squares })
}

pub fn find_back_rank_weaknesses(board: &Board) -> Vec<BackRankWeakness> {
    [Color::White, Color::Black]
        .into_iter()
        .filter_map(|color| {
            let guard = back_rank_guard(board, color)?;
            let entry_squares: Vec<Square> = guard
                .line_squares
                .iter()
                .copied()
                .filter(|&sq| guard.guards_of(board, sq).is_empty())
                .collect();
            if entry_squares.is_empty() {
                return None;
            }
            Some(BackRankWeakness {
                color,
                king_square: guard.king,
                rank: u32::from(guard.king.rank()) + 1,
                entry_squares,
            })
        })
        .collect()
}

/// Kings with a thin pawn shield and heavy enemy pressure on the squares
/// around them. Not reported in the endgame, where an active king is normal.
pub fn find_exposed_kings(safety: &[KingSafety], phase: Phase) -> Vec<ExposedKing> {
    if phase == Phase::Endgame {
        return Vec::new();
    }
    safety
        .iter()
        .filter(|k| k.shield_pawns <= EXPOSED_SHIELD_MAX && k.enemy_attacks >= EXPOSED_ATTACKS_MIN)
        .map(|k| ExposedKing {
            color: k.color,
            king_square: k.king_square,
            shield_pawns: k.shield_pawns,
            attacked_adjacent_squares: k.attacked_adjacent_squares,
            enemy_attacks: k.enemy_attacks,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::load_fen;
    use crate::structure::{castling_state, king_safety, square_control};

    #[test]
    fn test_double_check() {
        // Knight on f6 and rook on e1 both check the e8 king.
        let pos = load_fen("4k3/8/5N2/8/8/8/8/4RK2 b - - 0 1").unwrap();
        let double = find_double_check(&pos).unwrap();
        assert_eq!(double.king_square, Square::E8);
        assert_eq!(double.checking_squares, vec![Square::E1, Square::F6]);
    }

    #[test]
    fn test_single_check_is_not_double() {
        let pos = load_fen("4k3/8/8/8/8/8/8/4RK2 b - - 0 1").unwrap();
        assert!(find_double_check(&pos).is_none());
    }

    #[test]
    fn test_back_rank_weakness() {
        let pos = load_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let weaknesses = find_back_rank_weaknesses(pos.board());
        assert_eq!(weaknesses.len(), 1);
        let weakness = &weaknesses[0];
        assert_eq!(weakness.color, Color::Black);
        assert_eq!(weakness.king_square, Square::G8);
        assert_eq!(weakness.rank, 8);
        assert!(weakness.entry_squares.contains(&Square::A8));
        // f8 sits next to the king, which takes an unsupported intruder.
        assert!(!weakness.entry_squares.contains(&Square::F8));
    }

    #[test]
    fn test_luft_removes_weakness() {
        let pos = load_fen("6k1/5pp1/7p/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        assert!(find_back_rank_weaknesses(pos.board()).is_empty());
    }

    #[test]
    fn test_guarded_back_rank_is_not_weak() {
        // The d8 rook covers e8; the king covers f8 and h8.
        let pos = load_fen("3r2k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        assert!(find_back_rank_weaknesses(pos.board()).is_empty());
    }

    #[test]
    fn test_exposed_king() {
        // Black king on g8 with no pawns in front; knight and queen bear on
        // its zone.
        let pos = load_fen("6k1/8/5N2/7Q/8/8/1B6/6K1 b - - 0 1").unwrap();
        let board = pos.board();
        let control = square_control(board);
        let safety = king_safety(board, &control, &castling_state(board));
        let exposed = find_exposed_kings(&safety, Phase::Middlegame);
        assert_eq!(exposed.len(), 1);
        assert_eq!(exposed[0].color, Color::Black);
        assert!(find_exposed_kings(&safety, Phase::Endgame).is_empty());
    }
}
