//! Square control, space, castling state and king safety
//!
//! The per-square tally built here is the shared input for space counting,
//! king safety and the exposed-king motif.

use serde::{Deserialize, Serialize};
use shakmaty::{attacks, Bitboard, Board, Color, Piece, Role, Square};

use crate::geometry::{back_rank, file_index, relative_rank};
use crate::notation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SquareControl {
    #[serde(serialize_with = "notation::square::serialize")]
    pub square: Square,
    pub white_pawn_attacks: u32,
    pub white_piece_attacks: u32,
    pub black_pawn_attacks: u32,
    pub black_piece_attacks: u32,
    #[serde(serialize_with = "notation::optional_piece::serialize")]
    pub occupied_by: Option<Piece>,
}

impl SquareControl {
    fn empty(square: Square, occupied_by: Option<Piece>) -> Self {
        Self {
            square,
            white_pawn_attacks: 0,
            white_piece_attacks: 0,
            black_pawn_attacks: 0,
            black_piece_attacks: 0,
            occupied_by,
        }
    }

    pub fn pawn_attacks(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_pawn_attacks,
            Color::Black => self.black_pawn_attacks,
        }
    }

    pub fn piece_attacks(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_piece_attacks,
            Color::Black => self.black_piece_attacks,
        }
    }

    pub fn attacks(&self, color: Color) -> u32 {
        self.pawn_attacks(color) + self.piece_attacks(color)
    }
}

/// Control tallies for all 64 squares, indexed by square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ControlMap {
    squares: Vec<SquareControl>,
}

impl ControlMap {
    pub fn at(&self, square: Square) -> &SquareControl {
        &self.squares[usize::from(square)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SquareControl> {
        self.squares.iter()
    }
}

pub fn square_control(board: &Board) -> ControlMap {
    let mut squares: Vec<SquareControl> = Square::ALL
        .into_iter()
        .map(|sq| SquareControl::empty(sq, board.piece_at(sq)))
        .collect();

    for (from, piece) in board.iter() {
        for target in board.attacks_from(from) {
            let tally = &mut squares[usize::from(target)];
            match (piece.color, piece.role == Role::Pawn) {
                (Color::White, true) => tally.white_pawn_attacks += 1,
                (Color::White, false) => tally.white_piece_attacks += 1,
                (Color::Black, true) => tally.black_pawn_attacks += 1,
                (Color::Black, false) => tally.black_piece_attacks += 1,
            }
        }
    }

    ControlMap { squares }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastlingState {
    Kingside,
    Queenside,
    NotCastled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingStates {
    pub white: CastlingState,
    pub black: CastlingState,
}

impl CastlingStates {
    pub fn of(&self, color: Color) -> CastlingState {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// Infer castling from where the king and rooks stand.
///
/// Both king safety and development read this value. It is a square-based
/// heuristic: a king that walked to g1 counts as castled. Computed once per
/// position and passed to both analyzers until a dedicated king-safety
/// model replaces it.
pub fn castling_state(board: &Board) -> CastlingStates {
    CastlingStates {
        white: infer_castling(board, Color::White),
        black: infer_castling(board, Color::Black),
    }
}

fn infer_castling(board: &Board, color: Color) -> CastlingState {
    let Some(king) = board.king_of(color) else {
        return CastlingState::NotCastled;
    };
    if king.rank() != back_rank(color) {
        return CastlingState::NotCastled;
    }

    let king_file = file_index(king);
    let home_rooks: Vec<i32> = (board.by_piece(Piece { color, role: Role::Rook })
        & Bitboard::from_rank(back_rank(color)))
    .into_iter()
    .map(file_index)
    .collect();

    if king_file >= 6 && home_rooks.iter().all(|&f| f < king_file) {
        CastlingState::Kingside
    } else if king_file <= 2 && home_rooks.iter().all(|&f| f > king_file) {
        CastlingState::Queenside
    } else {
        CastlingState::NotCastled
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceReport {
    pub white_space: u32,
    pub black_space: u32,
    pub white_occupation: u32,
    pub black_occupation: u32,
}

/// Space: squares on files c-f in the opponent's half where the side has
/// more attackers than the opponent. Occupation: own pieces (not pawns or
/// the king) standing in the opponent's half.
pub fn space(board: &Board, control: &ControlMap) -> SpaceReport {
    let space_for = |color: Color| {
        control
            .iter()
            .filter(|c| (2..=5).contains(&file_index(c.square)))
            .filter(|c| relative_rank(color, c.square) >= 4)
            .filter(|c| c.attacks(color) > c.attacks(!color))
            .count() as u32
    };
    let occupation_for = |color: Color| {
        board
            .by_color(color)
            .into_iter()
            .filter(|&sq| !matches!(board.role_at(sq), Some(Role::Pawn) | Some(Role::King)))
            .filter(|&sq| relative_rank(color, sq) >= 4)
            .count() as u32
    };

    SpaceReport {
        white_space: space_for(Color::White),
        black_space: space_for(Color::Black),
        white_occupation: occupation_for(Color::White),
        black_occupation: occupation_for(Color::Black),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KingSafety {
    #[serde(serialize_with = "notation::color::serialize")]
    pub color: Color,
    #[serde(serialize_with = "notation::square::serialize")]
    pub king_square: Square,
    pub castling: CastlingState,
    /// Own pawns on the king's file and its neighbours, one or two ranks ahead.
    pub shield_pawns: u32,
    /// Squares next to the king attacked by at least one enemy unit.
    pub attacked_adjacent_squares: u32,
    /// Sum of enemy piece (non-pawn) attacks on squares next to the king.
    pub enemy_attacks: u32,
    /// Files next to (and including) the king's file without own pawns.
    pub open_files_near_king: u32,
}

pub fn shield_pawns(board: &Board, color: Color, king: Square) -> u32 {
    let king_file = file_index(king);
    let king_rank = relative_rank(color, king);
    board
        .by_piece(Piece { color, role: Role::Pawn })
        .into_iter()
        .filter(|&sq| (file_index(sq) - king_file).abs() <= 1)
        .filter(|&sq| {
            let ahead = relative_rank(color, sq) - king_rank;
            ahead == 1 || ahead == 2
        })
        .count() as u32
}

pub fn king_safety(
    board: &Board,
    control: &ControlMap,
    castling: &CastlingStates,
) -> Vec<KingSafety> {
    [Color::White, Color::Black]
        .into_iter()
        .filter_map(|color| {
            let king = board.king_of(color)?;
            let zone = attacks::king_attacks(king);
            let enemy = !color;

            let attacked_adjacent_squares =
                zone.into_iter().filter(|&sq| control.at(sq).attacks(enemy) > 0).count() as u32;
            let enemy_attacks =
                zone.into_iter().map(|sq| control.at(sq).piece_attacks(enemy)).sum();

            let own_pawns = board.by_piece(Piece { color, role: Role::Pawn });
            let open_files_near_king = (file_index(king) - 1..=file_index(king) + 1)
                .filter(|f| (0..8).contains(f))
                .filter(|&f| {
                    !own_pawns.into_iter().any(|sq| file_index(sq) == f)
                })
                .count() as u32;

            Some(KingSafety {
                color,
                king_square: king,
                castling: castling.of(color),
                shield_pawns: shield_pawns(board, color, king),
                attacked_adjacent_squares,
                enemy_attacks,
                open_files_near_king,
            })
        })
        .collect()
}
