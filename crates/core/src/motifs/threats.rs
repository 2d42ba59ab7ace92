//! Hanging pieces, trapped pieces and capturable defenders

use shakmaty::{Bitboard, Board, Color, Role, Square};

use crate::geometry::{
    attackers, attackers_and_defenders, capture_gain, exchange_value, lowest_value_attacker,
    ray_between, static_exchange, KING_EXCHANGE_VALUE,
};

use super::rays::RayFindings;
use super::types::{CapturableDefender, HangingPiece, PinType, TrappedPiece};
use super::valuation::capturable_defender_value;

/// Attacked pieces that are undefended or lose the exchange on their square.
/// Kings are never hanging.
pub fn find_hanging_pieces(board: &Board) -> Vec<HangingPiece> {
    let mut hanging = Vec::new();

    for (square, piece) in board.iter() {
        if piece.role == Role::King {
            continue;
        }
        let set = attackers_and_defenders(board, square);
        let enemy = set.of(!piece.color);
        let Some((_, lowest)) = lowest_value_attacker(board, enemy) else {
            continue;
        };
        let defenders = set.of(piece.color);
        let exchange_gain = capture_gain(board, square, !piece.color);
        if defenders.any() && exchange_gain <= 0 {
            continue;
        }

        hanging.push(HangingPiece {
            square,
            piece,
            attackers: enemy.into_iter().collect(),
            defenders: defenders.into_iter().collect(),
            lowest_attacker_value: exchange_value(lowest, KING_EXCHANGE_VALUE),
            exchange_gain,
        });
    }

    hanging
}

/// Whether a piece of `role` and `color` standing on `square` under `occupied`
/// would lose material: attacked by something no more valuable, or attacked
/// and undefended.
fn is_threatened(
    board: &Board,
    square: Square,
    role: Role,
    color: Color,
    occupied: Bitboard,
) -> bool {
    let enemy = board.attacks_to(square, !color, occupied) & occupied & board.by_color(!color);
    if enemy.is_empty() {
        return false;
    }
    let value = exchange_value(role, KING_EXCHANGE_VALUE);
    let cheap_attacker = enemy
        .into_iter()
        .filter_map(|sq| board.role_at(sq))
        .any(|r| exchange_value(r, KING_EXCHANGE_VALUE) <= value);
    if cheap_attacker {
        return true;
    }
    let friends = board.attacks_to(square, color, occupied) & occupied & board.by_color(color);
    friends.is_empty()
}

/// Squares a pinned piece may still move to: along the line to its pinner,
/// the pinner's square included.
fn pin_line(pinned: Square, pinner: Square) -> Bitboard {
    let mut line: Bitboard = ray_between(pinned, pinner)
        .unwrap_or_default()
        .into_iter()
        .collect();
    line.add(pinner);
    line
}

/// Attacked knights, bishops, rooks and queens whose every move loses
/// material too.
pub fn find_trapped_pieces(board: &Board, rays: &RayFindings) -> Vec<TrappedPiece> {
    let occupied = board.occupied();
    let mut trapped = Vec::new();

    for (square, piece) in board.iter() {
        if matches!(piece.role, Role::Pawn | Role::King) {
            continue;
        }
        if !is_threatened(board, square, piece.role, piece.color, occupied) {
            continue;
        }

        let mut destinations =
            board.attacks_from(square) & !board.by_color(piece.color) & !board.kings();
        if let Some(pin) = rays.pin_on(square) {
            if pin.pin_type == PinType::Absolute {
                destinations &= pin_line(square, pin.pinning_square);
            }
        }

        let value = exchange_value(piece.role, KING_EXCHANGE_VALUE);
        let escapes = destinations.into_iter().any(|to| {
            if let Some(victim) = board.role_at(to) {
                if exchange_value(victim, KING_EXCHANGE_VALUE) >= value {
                    return true;
                }
            }
            let mut after = occupied;
            after.discard(square);
            after.add(to);
            // A captured piece no longer defends or attacks anything.
            let board_after = without_piece(board, to);
            !is_threatened(&board_after, to, piece.role, piece.color, after)
        });

        if !escapes {
            trapped.push(TrappedPiece {
                square,
                piece,
                escape_squares: destinations.into_iter().collect(),
            });
        }
    }

    trapped
}

fn without_piece(board: &Board, square: Square) -> Board {
    let mut board = board.clone();
    board.discard_piece_at(square);
    board
}

/// Defenders that can be taken without loss, after which the piece they
/// guard falls as well.
pub fn find_capturable_defenders(board: &Board) -> Vec<CapturableDefender> {
    let occupied = board.occupied();
    let mut found = Vec::new();

    for (defended_square, defended) in board.iter() {
        if defended.role == Role::King {
            continue;
        }
        let attacker = !defended.color;
        if attackers(board, defended_square, attacker).is_empty() {
            continue;
        }
        let value = exchange_value(defended.role, KING_EXCHANGE_VALUE);
        // Already lost as it stands; reported as hanging instead.
        if static_exchange(board, defended_square, value, attacker, occupied) > 0 {
            continue;
        }

        for defender_square in attackers(board, defended_square, defended.color) {
            let Some(defender) = board.piece_at(defender_square) else {
                continue;
            };
            if defender.role == Role::King {
                continue;
            }
            let defender_gain = capture_gain(board, defender_square, attacker);
            if defender_gain < 0 || attackers(board, defender_square, attacker).is_empty() {
                continue;
            }

            let mut without_defender = occupied;
            without_defender.discard(defender_square);
            let follow_up = static_exchange(
                &without_piece(board, defender_square),
                defended_square,
                value,
                attacker,
                without_defender,
            );
            if follow_up <= 0 {
                continue;
            }

            found.push(CapturableDefender {
                defender_square,
                defender,
                defended_square,
                value: capturable_defender_value(defender_gain, follow_up),
            });
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motifs::rays::scan_rays;
    use crate::position::load_fen;
    use shakmaty::Position;

    #[test]
    fn test_undefended_knight_hangs() {
        let pos = load_fen("4k3/8/8/3n4/8/8/8/3RK3 w - - 0 1").unwrap();
        let hanging = find_hanging_pieces(pos.board());
        assert_eq!(hanging.len(), 1);
        let knight = &hanging[0];
        assert_eq!(knight.square, Square::D5);
        assert_eq!(knight.attackers, vec![Square::D1]);
        assert_eq!(knight.lowest_attacker_value, 500);
        assert_eq!(knight.exchange_gain, 300);
    }

    #[test]
    fn test_defended_piece_attacked_by_cheaper_piece_hangs() {
        // Pawn takes the defended rook.
        let pos = load_fen("4k3/8/2p5/3r4/4P3/8/8/4K3 b - - 0 1").unwrap();
        let hanging = find_hanging_pieces(pos.board());
        let rook = hanging.iter().find(|h| h.square == Square::D5).unwrap();
        assert_eq!(rook.lowest_attacker_value, 100);
        assert_eq!(rook.exchange_gain, 400);
    }

    #[test]
    fn test_defended_equal_trade_is_not_hanging() {
        let pos = load_fen("4k3/8/2p5/3n4/8/4N3/8/4K3 w - - 0 1").unwrap();
        let hanging = find_hanging_pieces(pos.board());
        assert!(hanging.iter().all(|h| h.square != Square::D5));
    }

    #[test]
    fn test_lowest_attacker_matches_a_real_attacker() {
        let pos =
            load_fen("r3k2r/ppp2ppp/2n5/3qp3/4P3/2NB1Q2/PPP2PPP/R3K2R b KQkq - 0 10").unwrap();
        let board = pos.board();
        for hanging in find_hanging_pieces(board) {
            let matching = hanging.attackers.iter().any(|&sq| {
                let role = board.role_at(sq).unwrap();
                exchange_value(role, KING_EXCHANGE_VALUE) == hanging.lowest_attacker_value
            });
            assert!(matching, "{:?}", hanging);
        }
    }

    #[test]
    fn test_bishop_trapped_on_h7() {
        // The king attacks the bishop, g8 is covered by king and rook and
        // taking on g6 runs into the f7 pawn.
        let pos = load_fen("5r1k/5p1B/6p1/8/8/8/8/6K1 w - - 0 1").unwrap();
        let trapped = find_trapped_pieces(pos.board(), &scan_rays(&pos));
        assert_eq!(trapped.len(), 1);
        assert_eq!(trapped[0].square, Square::H7);
        assert_eq!(trapped[0].escape_squares, vec![Square::G6, Square::G8]);
    }

    #[test]
    fn test_free_piece_is_not_trapped() {
        let pos = load_fen("4k3/8/8/3n4/8/8/8/3RK3 w - - 0 1").unwrap();
        assert!(find_trapped_pieces(pos.board(), &scan_rays(&pos)).is_empty());
    }

    #[test]
    fn test_capturable_defender() {
        // The c6 knight alone guards the e5 bishop that the e2 rook attacks;
        // the b5 bishop takes the knight for free.
        let pos = load_fen("4k3/8/2n5/1B2b3/8/8/4R3/4K3 w - - 0 1").unwrap();
        let found = find_capturable_defenders(pos.board());
        assert_eq!(found.len(), 1);
        let capture = &found[0];
        assert_eq!(capture.defender_square, Square::C6);
        assert_eq!(capture.defended_square, Square::E5);
        assert!(capture.value.is_sound);
        assert!(capture.value.material_delta > 0);
    }
}
