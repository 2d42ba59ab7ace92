//! Ray geometry, attacker enumeration and exchange arithmetic
//!
//! Everything here is a pure function of a board snapshot. Attack sets come
//! from shakmaty; this module only adds the line walking and value ordering
//! the motif finders share.

use shakmaty::{attacks, Bitboard, Board, Color, File, Piece, Rank, Role, Square};

/// Centipawns per pawn unit.
pub const CENTIPAWNS: i32 = 100;

/// Value used when a king takes part in an exchange. The king has no
/// material value, so callers that need one pass this (or their own) value
/// explicitly.
pub const KING_EXCHANGE_VALUE: i32 = 10_000;

pub const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
pub const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ALL_DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Standard material value in pawn units. `None` for the king.
pub const fn piece_value(role: Role) -> Option<u32> {
    match role {
        Role::Pawn => Some(1),
        Role::Knight => Some(3),
        Role::Bishop => Some(3),
        Role::Rook => Some(5),
        Role::Queen => Some(9),
        Role::King => None,
    }
}

/// Value in centipawns, with the king's value supplied by the caller.
pub fn exchange_value(role: Role, king_value: i32) -> i32 {
    piece_value(role).map_or(king_value, |v| v as i32 * CENTIPAWNS)
}

/// Square from a raw index. Panics outside `0..=63`.
pub fn square_at(index: u32) -> Square {
    Square::new(index)
}

pub fn file_index(square: Square) -> i32 {
    u32::from(square.file()) as i32
}

pub fn rank_index(square: Square) -> i32 {
    u32::from(square.rank()) as i32
}

/// Rank index counted from `color`'s own back rank (0 = back rank).
pub fn relative_rank(color: Color, square: Square) -> i32 {
    match color {
        Color::White => rank_index(square),
        Color::Black => 7 - rank_index(square),
    }
}

pub fn back_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::First,
        Color::Black => Rank::Eighth,
    }
}

/// Chebyshev distance.
pub fn distance(a: Square, b: Square) -> u32 {
    let df = (file_index(a) - file_index(b)).unsigned_abs();
    let dr = (rank_index(a) - rank_index(b)).unsigned_abs();
    df.max(dr)
}

pub fn offset(square: Square, (df, dr): (i32, i32)) -> Option<Square> {
    let file = file_index(square) + df;
    let rank = rank_index(square) + dr;
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::from_coords(File::new(file as u32), Rank::new(rank as u32)))
    } else {
        None
    }
}

/// Unit step from `a` towards `b` if they share a rank, file or diagonal.
pub fn direction(a: Square, b: Square) -> Option<(i32, i32)> {
    if a == b {
        return None;
    }
    let df = file_index(b) - file_index(a);
    let dr = rank_index(b) - rank_index(a);
    if df == 0 || dr == 0 || df.abs() == dr.abs() {
        Some((df.signum(), dr.signum()))
    } else {
        None
    }
}

pub fn is_diagonal((df, dr): (i32, i32)) -> bool {
    df != 0 && dr != 0
}

/// Squares strictly between `a` and `b`, ordered from `a`. `None` when the
/// squares are not aligned.
pub fn ray_between(a: Square, b: Square) -> Option<Vec<Square>> {
    let dir = direction(a, b)?;
    let mut squares = Vec::new();
    let mut current = a;
    while let Some(next) = offset(current, dir) {
        if next == b {
            return Some(squares);
        }
        squares.push(next);
        current = next;
    }
    None
}

/// Directions a piece of this role slides along.
pub fn slider_directions(role: Role) -> &'static [(i32, i32)] {
    match role {
        Role::Bishop => &DIAGONAL,
        Role::Rook => &ORTHOGONAL,
        Role::Queen => &ALL_DIRECTIONS,
        _ => &[],
    }
}

/// First and second occupied squares met walking from `from` along `dir`
/// under the given occupancy. Passing an occupancy with a piece removed
/// answers "what would this ray see if that piece moved".
pub fn first_two_blockers(
    from: Square,
    dir: (i32, i32),
    occupied: Bitboard,
) -> (Option<Square>, Option<Square>) {
    let mut first = None;
    let mut current = from;
    while let Some(next) = offset(current, dir) {
        if occupied.contains(next) {
            if first.is_some() {
                return (first, Some(next));
            }
            first = Some(next);
        }
        current = next;
    }
    (first, None)
}

/// Every square attacked by `color`'s pawns.
pub fn pawn_attack_set(board: &Board, color: Color) -> Bitboard {
    board
        .by_piece(Piece { color, role: Role::Pawn })
        .into_iter()
        .fold(Bitboard::EMPTY, |acc, sq| acc | attacks::pawn_attacks(color, sq))
}

/// Pieces of `color` attacking `square` on the current board.
pub fn attackers(board: &Board, square: Square, color: Color) -> Bitboard {
    board.attacks_to(square, color, board.occupied())
}

/// Attackers of a square split by color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackSet {
    pub white: Bitboard,
    pub black: Bitboard,
}

impl AttackSet {
    pub fn of(&self, color: Color) -> Bitboard {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// Both colors' attackers of `square`; for an occupied square the owner's
/// side are its defenders.
pub fn attackers_and_defenders(board: &Board, square: Square) -> AttackSet {
    AttackSet {
        white: attackers(board, square, Color::White),
        black: attackers(board, square, Color::Black),
    }
}

/// The attacker with the lowest standard value.
///
/// Ties go to the lowest square index (a1, b1, ... h8). This is only a
/// deterministic ordering; it carries no chess meaning.
pub fn lowest_value_attacker(board: &Board, attackers: Bitboard) -> Option<(Square, Role)> {
    let mut best: Option<(Square, Role, i32)> = None;
    for sq in attackers {
        let Some(role) = board.role_at(sq) else {
            continue;
        };
        let value = exchange_value(role, KING_EXCHANGE_VALUE);
        if best.map_or(true, |(_, _, best_value)| value < best_value) {
            best = Some((sq, role, value));
        }
    }
    best.map(|(sq, role, _)| (sq, role))
}

/// Static exchange evaluation on `square` for `attacker`, who is assumed to
/// capture first. `target_value` is what stands on the square (centipawns).
///
/// Sliders hidden behind a capturing piece join in as that piece leaves the
/// occupancy, so batteries and x-ray recaptures are counted. Pins are not
/// considered. Result is the attacker's net gain in centipawns.
pub fn static_exchange(
    board: &Board,
    square: Square,
    target_value: i32,
    attacker: Color,
    occupied: Bitboard,
) -> i32 {
    let mut gains = [0i32; 34];
    let mut occ = occupied;
    let mut side = attacker;
    let mut depth = 0;
    gains[0] = target_value;

    let mut next = lowest_value_attacker(board, board.attacks_to(square, side, occ) & occ);
    if next.is_none() {
        return 0;
    }

    while let Some((from, role)) = next {
        depth += 1;
        gains[depth] = exchange_value(role, KING_EXCHANGE_VALUE) - gains[depth - 1];
        occ.discard(from);
        side = !side;
        next = if depth < 32 {
            lowest_value_attacker(board, board.attacks_to(square, side, occ) & occ)
        } else {
            None
        };
    }

    while depth > 1 {
        depth -= 1;
        gains[depth - 1] = -(-gains[depth - 1]).max(gains[depth]);
    }
    gains[0]
}

/// Net gain for `attacker` capturing whatever stands on `square` now.
pub fn capture_gain(board: &Board, square: Square, attacker: Color) -> i32 {
    match board.role_at(square) {
        Some(role) => static_exchange(
            board,
            square,
            exchange_value(role, KING_EXCHANGE_VALUE),
            attacker,
            board.occupied(),
        ),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{fen::Fen, CastlingMode, Chess, Position};

    fn board(fen: &str) -> Board {
        let fen: Fen = fen.parse().unwrap();
        let pos: Chess = fen.into_position(CastlingMode::Standard).unwrap();
        pos.board().clone()
    }

    #[test]
    fn test_ray_between_diagonal() {
        let ray = ray_between(Square::A1, Square::H8).unwrap();
        assert_eq!(ray.len(), 6);
        assert_eq!(ray.first(), Some(&Square::B2));
        assert_eq!(ray.last(), Some(&Square::G7));
    }

    #[test]
    fn test_ray_between_unaligned_and_adjacent() {
        assert_eq!(ray_between(Square::A1, Square::B3), None);
        assert_eq!(ray_between(Square::E4, Square::E4), None);
        assert_eq!(ray_between(Square::E4, Square::E5), Some(vec![]));
    }

    #[test]
    fn test_ray_between_is_ordered_from_origin() {
        let ray = ray_between(Square::H1, Square::A1).unwrap();
        assert_eq!(
            ray,
            vec![Square::G1, Square::F1, Square::E1, Square::D1, Square::C1, Square::B1]
        );
    }

    #[test]
    #[should_panic]
    fn test_square_out_of_range_panics() {
        square_at(64);
    }

    #[test]
    fn test_king_has_no_material_value() {
        assert_eq!(piece_value(Role::King), None);
        assert_eq!(exchange_value(Role::King, 4_000), 4_000);
        assert_eq!(exchange_value(Role::Rook, 4_000), 500);
    }

    #[test]
    fn test_pawn_attack_set_start() {
        let b = Board::default();
        let white = pawn_attack_set(&b, Color::White);
        assert_eq!(white.count(), 8);
        assert!(white.contains(Square::A3));
        assert!(white.contains(Square::H3));
    }

    #[test]
    fn test_lowest_value_attacker_prefers_cheaper_piece() {
        let b = board("4k3/8/8/3p4/8/2N5/8/3RK3 w - - 0 1");
        let set = attackers(&b, Square::D5, Color::White);
        assert_eq!(set.count(), 2);
        assert_eq!(lowest_value_attacker(&b, set), Some((Square::C3, Role::Knight)));
    }

    #[test]
    fn test_attackers_and_defenders_split_by_color() {
        // d5 pawn: hit by the c3 knight and d1 rook, held by the c6 pawn and
        // the e6 king.
        let b = board("8/8/2p1k3/3p4/8/2N5/8/3RK3 w - - 0 1");
        let set = attackers_and_defenders(&b, Square::D5);
        assert_eq!(set.white.into_iter().collect::<Vec<_>>(), vec![Square::D1, Square::C3]);
        assert_eq!(set.black.into_iter().collect::<Vec<_>>(), vec![Square::C6, Square::E6]);
        assert_eq!(set.of(Color::White), set.white);
        assert_eq!(set.of(Color::Black), set.black);

        let empty = attackers_and_defenders(&b, Square::H8);
        assert!(empty.white.is_empty() && empty.black.is_empty());
    }

    #[test]
    fn test_lowest_value_attacker_ties_by_board_order() {
        let b = board("4k3/8/8/3p4/8/2N1N3/8/4K3 w - - 0 1");
        let set = attackers(&b, Square::D5, Color::White);
        assert_eq!(lowest_value_attacker(&b, set), Some((Square::C3, Role::Knight)));
    }

    #[test]
    fn test_exchange_on_defended_pawn_by_queen_loses() {
        let b = board("4k3/8/2p5/3p4/8/8/8/3QK3 w - - 0 1");
        assert_eq!(capture_gain(&b, Square::D5, Color::White), -800);
    }

    #[test]
    fn test_exchange_on_undefended_piece_wins_it() {
        let b = board("4k3/8/8/3n4/8/8/8/3QK3 w - - 0 1");
        assert_eq!(capture_gain(&b, Square::D5, Color::White), 300);
    }

    #[test]
    fn test_exchange_counts_battery_behind_capturer() {
        // Qxd5 Rxd5 Rxd5: the rook behind the queen recaptures, net 100 - 900 + 500.
        let b = board("3rk3/8/8/3p4/8/8/3Q4/3RK3 w - - 0 1");
        assert_eq!(capture_gain(&b, Square::D5, Color::White), -300);
    }
}
