//! Game input

pub mod pgn;

pub use pgn::{parse_pgn_file, parse_pgn_string, PgnGame};
