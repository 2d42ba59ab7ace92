//! Motif aggregation

use std::collections::BTreeMap;

use shakmaty::{Chess, Position};

use crate::config::MotifConfig;
use crate::position::Phase;
use crate::structure::{castling_state, king_safety, square_control, KingSafety};

use super::forks::find_forks;
use super::king::{find_back_rank_weaknesses, find_double_check, find_exposed_kings};
use super::mates::{find_mate_patterns, find_mate_threats, standard_recognizers, MateRecognizer};
use super::overload::find_overloaded_pieces;
use super::rays::scan_rays;
use super::threats::{find_capturable_defenders, find_hanging_pieces, find_trapped_pieces};
use super::types::{MotifId, TacticalMotifs};
use super::valuation::link_related;

/// Runs every finder over one position and assembles the report.
pub struct MotifAnalyzer {
    config: MotifConfig,
    recognizers: Vec<Box<dyn MateRecognizer + Send + Sync>>,
}

impl MotifAnalyzer {
    pub fn new(config: MotifConfig) -> Self {
        Self::with_recognizers(config, standard_recognizers())
    }

    pub fn with_recognizers(
        config: MotifConfig,
        recognizers: Vec<Box<dyn MateRecognizer + Send + Sync>>,
    ) -> Self {
        Self {
            config: config.normalized(),
            recognizers,
        }
    }

    pub fn config(&self) -> &MotifConfig {
        &self.config
    }

    /// Analyze a position. The phase is detected when not given.
    pub fn analyze(&self, pos: &Chess, phase: Option<Phase>) -> TacticalMotifs {
        let board = pos.board();
        let control = square_control(board);
        let safety = king_safety(board, &control, &castling_state(board));
        self.analyze_with_safety(pos, phase, &safety)
    }

    /// Same as [`MotifAnalyzer::analyze`], reusing king-safety tallies the
    /// caller already computed for this position.
    pub fn analyze_with_safety(
        &self,
        pos: &Chess,
        phase: Option<Phase>,
        safety: &[KingSafety],
    ) -> TacticalMotifs {
        let board = pos.board();
        let phase = phase.unwrap_or_else(|| Phase::detect(pos));

        let rays = scan_rays(pos);
        let back_rank_weaknesses = find_back_rank_weaknesses(board);
        let mate_threats = find_mate_threats(pos, &self.config);
        let overloaded_pieces =
            find_overloaded_pieces(pos, &back_rank_weaknesses, &mate_threats, &self.config);

        let mut motifs = TacticalMotifs {
            forks: find_forks(board, &rays),
            hanging_pieces: find_hanging_pieces(board),
            double_checks: find_double_check(pos).into_iter().collect(),
            trapped_pieces: find_trapped_pieces(board, &rays),
            mate_patterns: find_mate_patterns(pos, &self.recognizers),
            mate_threats,
            back_rank_weaknesses,
            exposed_kings: find_exposed_kings(safety, phase),
            overloaded_pieces,
            capturable_defenders: find_capturable_defenders(board),
            pins: rays.pins,
            skewers: rays.skewers,
            discovered_attacks: rays.discovered_attacks,
            xray_attacks: rays.xray_attacks,
            xray_defenses: rays.xray_defenses,
            square_index: BTreeMap::new(),
        };

        link_related(&mut motifs, &self.config);
        motifs.square_index = index_squares(pos, &motifs);

        tracing::debug!(
            phase = phase.as_str(),
            pins = motifs.pins.len(),
            forks = motifs.forks.len(),
            skewers = motifs.skewers.len(),
            hanging = motifs.hanging_pieces.len(),
            trapped = motifs.trapped_pieces.len(),
            mate_threats = motifs.mate_threats.len(),
            overloaded = motifs.overloaded_pieces.len(),
            "motif analysis complete"
        );

        motifs
    }
}

impl Default for MotifAnalyzer {
    fn default() -> Self {
        Self::new(MotifConfig::default())
    }
}

/// Occupied square to every motif it takes part in.
fn index_squares(pos: &Chess, motifs: &TacticalMotifs) -> BTreeMap<String, Vec<MotifId>> {
    let occupied = pos.board().occupied();
    let mut index: BTreeMap<String, Vec<MotifId>> = BTreeMap::new();
    for (id, motif) in motifs.motifs() {
        for square in motif.squares() {
            if !occupied.contains(square) {
                continue;
            }
            let entry = index.entry(square.to_string()).or_default();
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motifs::types::MotifKind;
    use crate::position::load_fen;
    use shakmaty::Square;

    #[test]
    fn test_start_position_is_quiet() {
        let motifs = MotifAnalyzer::default().analyze(&Chess::default(), None);
        assert!(motifs.pins.is_empty());
        assert!(motifs.forks.is_empty());
        assert!(motifs.hanging_pieces.is_empty());
        assert!(motifs.mate_threats.is_empty());
        assert!(motifs.mate_patterns.is_empty());
    }

    #[test]
    fn test_square_index_points_back_to_motifs() {
        let pos = load_fen("4k3/r7/8/8/3Q3b/8/8/6K1 b - - 0 1").unwrap();
        let motifs = MotifAnalyzer::default().analyze(&pos, None);
        let fork = MotifId::new(MotifKind::Fork, 0);
        assert!(motifs.motifs_at(Square::D4).contains(&fork));
        assert!(motifs.motifs_at(Square::A7).contains(&fork));
        for (square, ids) in &motifs.square_index {
            let square: Square = square.parse().unwrap();
            assert!(pos.board().occupied().contains(square));
            for id in ids {
                assert!(motifs.get(*id).unwrap().squares().contains(&square));
            }
        }
    }

    #[test]
    fn test_chaining_links_fork_to_pin() {
        // The e5 knight forks the c6 rook, pinned against the a8 king by the
        // f3 queen, and the g6 rook.
        let fen = "k7/8/2r3r1/4N3/8/5Q2/8/7K b - - 0 1";
        let pos = load_fen(fen).unwrap();

        let plain = MotifAnalyzer::default().analyze(&pos, None);
        let fork = plain.forks.iter().find(|f| f.forking_square == Square::E5).unwrap();
        assert!(fork.value.related_motifs.is_empty());

        let config = MotifConfig::default().with_chaining(true, false);
        let chained = MotifAnalyzer::new(config).analyze(&pos, None);
        let fork = chained.forks.iter().find(|f| f.forking_square == Square::E5).unwrap();
        assert!(fork
            .value
            .related_motifs
            .iter()
            .any(|id| id.kind == MotifKind::Pin));
        // Links never move the balance.
        let plain_fork = plain.forks.iter().find(|f| f.forking_square == Square::E5).unwrap();
        assert_eq!(fork.value.material_delta, plain_fork.value.material_delta);
    }

    /// Black's d6 knight alone guards the b5 and f5 bishops (hit by the a4
    /// and e4 pawns) while White threatens Qxg7 mate against a back rank with
    /// open entry squares. The e4 pawn also forks d5 and f5.
    const OVERLOAD_CHAIN: &str = "6k1/5ppp/3n4/1b1n1b2/P3P3/2Q5/1B3PPP/6K1 w - - 0 1";

    /// The b5 bishop forks the a4 rook and the c6 knight, which is the only
    /// guard of the e5 bishop attacked by the e2 rook.
    const DEFENDER_CHAIN: &str = "4k3/8/2n5/1B2b3/r7/8/4R3/4K3 w - - 0 1";

    fn both_ways(fen: &str, tier2: bool) -> (TacticalMotifs, TacticalMotifs) {
        let pos = load_fen(fen).unwrap();
        let plain = MotifAnalyzer::default().analyze(&pos, None);
        let config = MotifConfig::default().with_chaining(true, tier2);
        let chained = MotifAnalyzer::new(config).analyze(&pos, None);
        (plain, chained)
    }

    fn related(motifs: &TacticalMotifs, id: MotifId) -> Vec<MotifKind> {
        let value = motifs.get(id).and_then(|m| m.value().cloned()).unwrap();
        value.related_motifs.iter().map(|r| r.kind).collect()
    }

    fn deltas(motifs: &TacticalMotifs) -> Vec<(MotifId, i32)> {
        motifs
            .motifs()
            .into_iter()
            .filter_map(|(id, m)| m.value().map(|v| (id, v.material_delta)))
            .collect()
    }

    #[test]
    fn test_overload_links_to_back_rank_and_mate_threat() {
        let (plain, chained) = both_ways(OVERLOAD_CHAIN, false);
        let knight = chained
            .overloaded_pieces
            .iter()
            .position(|o| o.square == Square::D6)
            .unwrap();
        let links = related(&chained, MotifId::new(MotifKind::OverloadedPiece, knight));
        assert!(links.contains(&MotifKind::BackRankWeakness));
        assert!(links.contains(&MotifKind::MateThreat));
        // Fork links are second order and stay off at tier 1.
        assert!(!links.contains(&MotifKind::Fork));

        let threat = chained
            .mate_threats
            .iter()
            .position(|t| t.attacker == shakmaty::Color::White)
            .unwrap();
        let links = related(&chained, MotifId::new(MotifKind::MateThreat, threat));
        assert!(links.contains(&MotifKind::BackRankWeakness));

        assert_eq!(deltas(&plain), deltas(&chained));
    }

    #[test]
    fn test_second_order_links_fork_and_overload() {
        let (plain, chained) = both_ways(OVERLOAD_CHAIN, true);
        let fork = chained
            .forks
            .iter()
            .position(|f| f.forking_square == Square::E4)
            .unwrap();
        assert!(related(&chained, MotifId::new(MotifKind::Fork, fork))
            .contains(&MotifKind::OverloadedPiece));

        let knight = chained
            .overloaded_pieces
            .iter()
            .position(|o| o.square == Square::D6)
            .unwrap();
        assert!(related(&chained, MotifId::new(MotifKind::OverloadedPiece, knight))
            .contains(&MotifKind::Fork));

        assert_eq!(deltas(&plain), deltas(&chained));
    }

    #[test]
    fn test_capturable_defender_links_to_hanging_piece() {
        let (plain, chained) = both_ways(DEFENDER_CHAIN, false);
        let capturable = chained
            .capturable_defenders
            .iter()
            .position(|c| c.defender_square == Square::C6 && c.defended_square == Square::E5)
            .unwrap();
        let links = related(&chained, MotifId::new(MotifKind::CapturableDefender, capturable));
        assert!(links.contains(&MotifKind::HangingPiece));

        let fork = chained
            .forks
            .iter()
            .position(|f| f.forking_square == Square::B5)
            .unwrap();
        assert!(!related(&chained, MotifId::new(MotifKind::Fork, fork))
            .contains(&MotifKind::CapturableDefender));

        assert_eq!(deltas(&plain), deltas(&chained));
    }

    #[test]
    fn test_second_order_links_fork_to_capturable_defender() {
        let (plain, chained) = both_ways(DEFENDER_CHAIN, true);
        let fork = chained
            .forks
            .iter()
            .position(|f| f.forking_square == Square::B5)
            .unwrap();
        assert_eq!(chained.forks[fork].target_squares, vec![Square::A4, Square::C6]);
        let links = related(&chained, MotifId::new(MotifKind::Fork, fork));
        assert!(links.contains(&MotifKind::CapturableDefender));
        assert!(links.contains(&MotifKind::Pin));

        assert_eq!(deltas(&plain), deltas(&chained));
    }

    #[test]
    fn test_shared_king_safety_matches_own() {
        let pos = load_fen(OVERLOAD_CHAIN).unwrap();
        let board = pos.board();
        let safety = king_safety(board, &square_control(board), &castling_state(board));
        let analyzer = MotifAnalyzer::default();
        assert_eq!(
            analyzer.analyze_with_safety(&pos, None, &safety),
            analyzer.analyze(&pos, None)
        );
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let pos =
            load_fen("r1bqk2r/pppp1ppp/2n2n2/1Bb1p3/4P3/5N2/PPPP1PPP/RNBQ1RK1 w kq - 4 5")
                .unwrap();
        let analyzer = MotifAnalyzer::default();
        assert_eq!(analyzer.analyze(&pos, None), analyzer.analyze(&pos, None));
    }
}
