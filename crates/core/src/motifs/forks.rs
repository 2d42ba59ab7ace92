//! Forks
//!
//! A fork is one non-king piece attacking two or more enemy pieces that are
//! each worth taking: the king, anything worth more than the forker, or
//! anything undefended. Pawns are never counted as fork targets.

use shakmaty::{Board, Piece, Role, Square};

use crate::geometry::{attackers, capture_gain, exchange_value, KING_EXCHANGE_VALUE};

use super::rays::RayFindings;
use super::types::Fork;
use super::valuation::{fork_value, ForkTarget};

pub fn find_forks(board: &Board, rays: &RayFindings) -> Vec<Fork> {
    let mut forks = Vec::new();

    for (from, forker) in board.iter() {
        if forker.role == Role::King {
            continue;
        }
        let forker_value = exchange_value(forker.role, KING_EXCHANGE_VALUE);

        let mut target_squares = Vec::new();
        let mut targets = Vec::new();
        for square in board.attacks_from(from) & board.by_color(!forker.color) {
            let Some(target) = board.piece_at(square) else {
                continue;
            };
            let assessed = assess_target(board, square, target, forker, forker_value, rays);
            if let Some(fork_target) = assessed {
                target_squares.push(square);
                targets.push(fork_target);
            }
        }

        if targets.len() < 2 {
            continue;
        }

        let forker_risk = capture_gain(board, from, !forker.color);
        forks.push(Fork {
            forking_square: from,
            piece: forker,
            target_squares,
            value: fork_value(&targets, forker_risk),
        });
    }

    forks
}

fn assess_target(
    board: &Board,
    square: Square,
    target: Piece,
    forker: Piece,
    forker_value: i32,
    rays: &RayFindings,
) -> Option<ForkTarget> {
    if target.role == Role::Pawn {
        return None;
    }
    if target.role == Role::King {
        return Some(ForkTarget { is_king: true, gain: 0, pinned: false });
    }

    let value = exchange_value(target.role, KING_EXCHANGE_VALUE);
    let defended = attackers(board, square, target.color).any();
    if defended && value <= forker_value {
        return None;
    }

    let gain = if defended { value - forker_value } else { value };
    let pinned = rays
        .pin_on(square)
        .is_some_and(|pin| pin.pinning_piece.color == forker.color);

    Some(ForkTarget { is_king: false, gain, pinned })
}
