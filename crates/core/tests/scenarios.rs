//! End-to-end position reports

use chess_coach_core::motifs::{MatePatternKind, PinType};
use chess_coach_core::{
    analyze_fen, analyze_position, load_fen, Error, MaterialCount, MotifConfig, Phase,
    PositionReport,
};
use pretty_assertions::assert_eq;
use shakmaty::{Chess, Color, Square};

fn analyze(fen: &str) -> PositionReport {
    analyze_fen(fen, &MotifConfig::default()).unwrap()
}

#[test]
fn start_position() {
    let report = analyze_position(&Chess::default(), None, &MotifConfig::default());

    assert_eq!(report.material.imbalance, 0);
    assert!(!report.material.white_bishop_pair);
    assert!(!report.material.black_bishop_pair);
    assert_eq!(report.development.white_developed, 0);
    assert_eq!(report.development.black_developed, 0);

    let motifs = &report.motifs;
    assert_eq!(motifs.pins.len(), 0);
    assert_eq!(motifs.forks.len(), 0);
    assert_eq!(motifs.hanging_pieces.len(), 0);
    assert!(motifs.mate_threats.is_empty());
}

#[test]
fn material_recount() {
    let report = analyze("r1bqk2r/pppp1ppp/2n2n2/4p3/1bB1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4");
    assert_eq!(
        report.material.white,
        MaterialCount { pawns: 8, knights: 2, bishops: 2, rooks: 2, queens: 1 }
    );
    assert_eq!(report.material.white_total, 39);
    assert_eq!(report.material.black_total, 39);
    assert_eq!(report.material.imbalance, 0);

    // Black is missing the b8 knight.
    let report = analyze("r1bqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    assert_eq!(report.material.black.knights, 1);
    assert_eq!(report.material.imbalance, 3);
}

#[test]
fn absolute_bishop_pin() {
    let report = analyze("4k3/8/2n5/1B6/8/8/8/4K3 b - - 0 1");
    let pins = &report.motifs.pins;
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].pinned_square, Square::C6);
    assert_eq!(pins[0].pinning_square, Square::B5);
    assert_eq!(pins[0].pinned_to_square, Square::E8);
    assert_eq!(pins[0].pin_type, PinType::Absolute);
}

#[test]
fn queen_fork_of_rook_and_bishop() {
    let report = analyze("4k3/r7/8/8/3Q3b/8/8/6K1 b - - 0 1");
    let fork = report
        .motifs
        .forks
        .iter()
        .find(|f| f.forking_square == Square::D4)
        .unwrap();
    assert!(fork.target_squares.contains(&Square::A7));
    assert!(fork.target_squares.contains(&Square::H4));
    assert!(fork.value.material_delta >= 300);
    assert!(fork.value.is_sound);
}

#[test]
fn back_rank_mate_is_named() {
    let report = analyze("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    assert!(report.is_checkmate);
    let pattern = report
        .motifs
        .mate_patterns
        .iter()
        .find(|p| p.kind == MatePatternKind::BackRank)
        .unwrap();
    assert_eq!(pattern.name, "back rank");
    assert_eq!(pattern.king_square, Square::G8);
}

#[test]
fn mate_threat_within_ply_bound() {
    let config = MotifConfig::default();
    let report = analyze_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", &config).unwrap();
    let threat = report
        .motifs
        .mate_threats
        .iter()
        .find(|t| t.attacker == Color::White)
        .unwrap();
    assert_eq!(threat.mating_move, "a1a8");
    assert!(threat.plies <= config.mate_probe_plies);
    assert_eq!(threat.line.len() as u32, threat.plies);
}

#[test]
fn reports_are_deterministic() {
    let fen = "r1bqk2r/pppp1ppp/2n2n2/1Bb1p3/4P3/5N2/PPPP1PPP/RNBQ1RK1 w kq - 4 5";
    let first = serde_json::to_string(&analyze(fen)).unwrap();
    let second = serde_json::to_string(&analyze(fen)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn bad_input_is_rejected() {
    let config = MotifConfig::default();
    assert!(matches!(analyze_fen("nonsense", &config), Err(Error::InvalidPosition(_))));
    assert!(matches!(
        analyze_fen("8/8/8/8/8/8/8/4K3 w - - 0 1", &config),
        Err(Error::IllegalPosition(_))
    ));
}

#[test]
fn explicit_phase_is_respected() {
    let pos = load_fen("6k1/8/5N2/7Q/8/8/1B6/6K1 b - - 0 1").unwrap();
    let config = MotifConfig::default();
    let middlegame = analyze_position(&pos, Some(Phase::Middlegame), &config);
    let endgame = analyze_position(&pos, Some(Phase::Endgame), &config);
    assert_eq!(middlegame.motifs.exposed_kings.len(), 1);
    assert!(endgame.motifs.exposed_kings.is_empty());
}
