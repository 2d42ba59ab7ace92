//! Chess Coach Core Library
//!
//! Static analysis of a single position: material, activity, structure,
//! king safety and tactical motifs, reported as serde-serializable data for
//! the coaching pipeline.

use serde::Serialize;
use shakmaty::{fen::Fen, Chess, Color, EnPassantMode, Position};

pub mod activity;
pub mod config;
pub mod error;
pub mod geometry;
pub mod material;
pub mod motifs;
pub mod notation;
pub mod parser;
pub mod position;
pub mod structure;

pub use activity::{activity, development, Assessment, DevelopmentReport, PieceActivity};
pub use config::MotifConfig;
pub use error::{Error, Result};
pub use material::{material, MaterialCount, MaterialReport};
pub use motifs::{MotifAnalyzer, MotifId, MotifKind, TacticValue, TacticalMotifs};
pub use position::{load_fen, Phase};
pub use structure::{
    castling_state, king_safety, space, square_control, CastlingState, KingSafety, SpaceReport,
};

/// Everything the analyzers have to say about one position
#[derive(Debug, Clone, Serialize)]
pub struct PositionReport {
    pub fen: String,
    #[serde(serialize_with = "notation::color::serialize")]
    pub side_to_move: Color,
    pub legal_move_count: u32,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub phase: Phase,
    pub material: MaterialReport,
    pub activity: Vec<PieceActivity>,
    pub space: SpaceReport,
    pub development: DevelopmentReport,
    pub king_safety: Vec<KingSafety>,
    pub motifs: TacticalMotifs,
}

/// Analyzes a chess position
pub fn analyze_position(
    position: &Chess,
    phase: Option<Phase>,
    config: &MotifConfig,
) -> PositionReport {
    let board = position.board();
    let phase = phase.unwrap_or_else(|| Phase::detect(position));

    let control = square_control(board);
    // One castling read feeds king safety, development and the motif scan.
    let castling = castling_state(board);
    let safety = king_safety(board, &control, &castling);

    PositionReport {
        fen: Fen::from_position(position, EnPassantMode::Legal).to_string(),
        side_to_move: position.turn(),
        legal_move_count: position.legal_moves().len() as u32,
        is_check: position.is_check(),
        is_checkmate: position.is_checkmate(),
        is_stalemate: position.is_stalemate(),
        phase,
        material: material(board),
        activity: activity(board, phase),
        space: space(board, &control),
        development: development(board, &castling),
        motifs: MotifAnalyzer::new(*config).analyze_with_safety(position, Some(phase), &safety),
        king_safety: safety,
    }
}

/// Parse a FEN and analyze it.
pub fn analyze_fen(fen: &str, config: &MotifConfig) -> Result<PositionReport> {
    let position = load_fen(fen)?;
    Ok(analyze_position(&position, None, config))
}

/// Creates the standard starting position
pub fn starting_position() -> Chess {
    Chess::default()
}
