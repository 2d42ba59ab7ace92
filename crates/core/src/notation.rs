//! Move notation and serde helpers for shakmaty vocabulary types
//!
//! Reports are consumed as JSON by the coaching pipeline, so squares render as
//! `"e4"`, pieces as FEN letters (`"N"` white knight, `"n"` black knight) and
//! colors as `"white"` / `"black"`.

use serde::Serializer;
use shakmaty::{CastlingMode, Color, Move, Piece, Square};

/// UCI text for a move, castling written as the king's destination
/// (`e1g1`).
pub fn move_to_uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

pub mod square {
    use super::*;

    pub fn serialize<S: Serializer>(square: &Square, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(square)
    }
}

pub mod squares {
    use super::*;

    pub fn serialize<S: Serializer>(squares: &[Square], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(squares.iter().map(|sq| sq.to_string()))
    }
}

pub mod piece {
    use super::*;

    pub fn serialize<S: Serializer>(piece: &Piece, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&piece.char())
    }
}

pub mod optional_piece {
    use super::*;

    pub fn serialize<S: Serializer>(piece: &Option<Piece>, s: S) -> Result<S::Ok, S::Error> {
        match piece {
            Some(p) => s.serialize_some(&p.char().to_string()),
            None => s.serialize_none(),
        }
    }
}

pub mod color {
    use super::*;

    pub fn serialize<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(color_name(*color))
    }
}
