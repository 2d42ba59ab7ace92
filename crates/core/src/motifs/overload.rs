//! Overloaded pieces
//!
//! A piece is overloaded when it is the only guard of two or more things at
//! once: attacked friendly pieces, back-rank squares that keep a boxed-in
//! king from being mated, or the square of a mate in one it alone prevents.

use std::collections::BTreeMap;

use shakmaty::{
    Bitboard, Board, CastlingMode, Chess, Color, EnPassantMode, FromSetup, Position, Role, Square,
};

use crate::config::MotifConfig;
use crate::geometry::{attackers, exchange_value, static_exchange, KING_EXCHANGE_VALUE};

use super::king::back_rank_guard;
use super::mates::MateProbe;
use super::types::{BackRankWeakness, MateThreat, OverloadedPiece};
use super::valuation::overload_value;

#[derive(Debug, Default)]
struct Duties {
    /// Defended square and what the attacker nets there once the guard leaves.
    pieces: Vec<(Square, i32)>,
    mating: Vec<Square>,
}

impl Duties {
    fn add_mating(&mut self, square: Square) {
        if !self.mating.contains(&square) {
            self.mating.push(square);
        }
    }

    fn squares(&self) -> Vec<Square> {
        let mut squares: Vec<Square> = self.pieces.iter().map(|&(sq, _)| sq).collect();
        squares.extend(&self.mating);
        squares.sort();
        squares.dedup();
        squares
    }
}

/// `weaknesses` and `threats` are the back-rank and mate-threat findings for
/// the same position. A side whose back rank is already breached, or that
/// already faces a mate in one, has no guard holding the mate off.
pub fn find_overloaded_pieces(
    pos: &Chess,
    weaknesses: &[BackRankWeakness],
    threats: &[MateThreat],
    config: &MotifConfig,
) -> Vec<OverloadedPiece> {
    let board = pos.board();
    let mut duties: BTreeMap<Square, Duties> = BTreeMap::new();

    for color in [Color::White, Color::Black] {
        collect_piece_duties(board, color, &mut duties);
        if !rank_breached(board, color, weaknesses) {
            collect_back_rank_duties(board, color, &mut duties);
        }
        let mated_in_one = threats.iter().any(|t| t.attacker == !color && t.plies == 1);
        if !mated_in_one {
            collect_mate_in_one_duties(pos, color, config, &mut duties);
        }
    }

    duties
        .into_iter()
        .filter_map(|(square, d)| {
            let squares = d.squares();
            if squares.len() < 2 {
                return None;
            }
            let piece = board.piece_at(square)?;
            let gains: Vec<i32> = d.pieces.iter().map(|&(_, gain)| gain).collect();
            let mating_relevant = !d.mating.is_empty();
            Some(OverloadedPiece {
                square,
                piece,
                duties: squares,
                mating_relevant,
                value: overload_value(&gains, mating_relevant),
            })
        })
        .collect()
}

/// Attacked pieces of `color` with exactly one defender that is not the king.
fn collect_piece_duties(board: &Board, color: Color, duties: &mut BTreeMap<Square, Duties>) {
    let occupied = board.occupied();
    for square in board.by_color(color) {
        let Some(role) = board.role_at(square) else {
            continue;
        };
        if role == Role::King || attackers(board, square, !color).is_empty() {
            continue;
        }
        let defenders = attackers(board, square, color);
        if defenders.count() != 1 {
            continue;
        }
        let Some(guard) = defenders.first() else {
            continue;
        };
        if board.role_at(guard) == Some(Role::King) {
            continue;
        }

        let mut without_guard = occupied;
        without_guard.discard(guard);
        let value = exchange_value(role, KING_EXCHANGE_VALUE);
        let gain = static_exchange(board, square, value, !color, without_guard);
        if gain > 0 {
            duties.entry(guard).or_default().pieces.push((square, gain));
        }
    }
}

/// An unguarded entry square of `color`'s back rank is already in reach of
/// an enemy rook or queen.
fn rank_breached(board: &Board, color: Color, weaknesses: &[BackRankWeakness]) -> bool {
    let enemy_heavy = (board.rooks() | board.queens()) & board.by_color(!color);
    weaknesses
        .iter()
        .filter(|w| w.color == color)
        .flat_map(|w| w.entry_squares.iter())
        .any(|&sq| (attackers(board, sq, !color) & enemy_heavy).any())
}

/// Back-rank squares that only one piece keeps covered and that an enemy
/// heavy piece would reach once that piece leaves.
fn collect_back_rank_duties(board: &Board, color: Color, duties: &mut BTreeMap<Square, Duties>) {
    let Some(guard) = back_rank_guard(board, color) else {
        return;
    };
    let enemy_heavy = (board.rooks() | board.queens()) & board.by_color(!color);
    for &square in &guard.line_squares {
        let guards = guard.guards_of(board, square);
        let [only] = guards.as_slice() else {
            continue;
        };
        if *only == guard.king {
            continue;
        }
        let mut without_guard = board.occupied();
        without_guard.discard(*only);
        if (board.attacks_to(square, !color, without_guard) & enemy_heavy).any() {
            duties.entry(*only).or_default().add_mating(square);
        }
    }
}

/// Pieces of `color` whose removal hands the opponent a mate in one. The
/// duty is the square the mating move lands on.
fn collect_mate_in_one_duties(
    pos: &Chess,
    color: Color,
    config: &MotifConfig,
    duties: &mut BTreeMap<Square, Duties>,
) {
    let board = pos.board();
    for square in board.by_color(color) & !board.kings() {
        let Some(lifted) = lift_guard(pos, square, color) else {
            continue;
        };
        let mut probe = MateProbe::new(1, config.mate_probe_nodes);
        if let Some(mate) = probe.find(&lifted).and_then(|line| line.first().map(|m| m.to())) {
            duties.entry(square).or_default().add_mating(mate);
        }
    }
}

/// `pos` without the piece on `square`, with `owner`'s opponent to move.
/// `None` when that leaves an impossible position (the owner's king left
/// in check by the lifted piece's absence).
fn lift_guard(pos: &Chess, square: Square, owner: Color) -> Option<Chess> {
    let mut setup = pos.to_setup(EnPassantMode::Legal);
    setup.board.discard_piece_at(square);
    setup.turn = !owner;
    setup.castling_rights = Bitboard::EMPTY;
    setup.ep_square = None;
    Chess::from_setup(setup, CastlingMode::Standard).ok()
}
