//! Named mate patterns and the bounded forced-mate probe
//!
//! Recognizers look at a position that is already checkmate and name the
//! picture. Each one sits behind [`MateRecognizer`] so the set can be
//! swapped or audited on its own.

use shakmaty::{attacks, Bitboard, Board, Chess, Color, Move, Position, Role, Square};

use crate::config::MotifConfig;
use crate::geometry::{back_rank, direction, distance, file_index, is_diagonal, offset};
use crate::notation::move_to_uci;

use super::types::{MatePattern, MatePatternKind, MateThreat};
use super::valuation::mate_value;

/// What a recognizer gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct MateContext<'a> {
    pub board: &'a Board,
    /// The mated side.
    pub mated: Color,
    pub king: Square,
    pub checkers: Bitboard,
}

impl MateContext<'_> {
    fn single_checker(&self) -> Option<(Square, Role)> {
        if self.checkers.count() != 1 {
            return None;
        }
        let square = self.checkers.first()?;
        Some((square, self.board.role_at(square)?))
    }

    fn attacker(&self) -> Color {
        !self.mated
    }

    fn defended_by_attacker(&self, square: Square) -> Bitboard {
        self.board
            .attacks_to(square, self.attacker(), self.board.occupied())
            & self.board.by_color(self.attacker())
    }

    fn own_pieces(&self) -> Bitboard {
        self.board.by_color(self.mated)
    }
}

pub trait MateRecognizer {
    fn kind(&self) -> MatePatternKind;

    /// Squares of the attacking pieces that form the pattern, or `None` when
    /// the mate does not match.
    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>>;
}

/// Rook or queen mating along the king's own back rank.
pub struct BackRankMate;

impl MateRecognizer for BackRankMate {
    fn kind(&self) -> MatePatternKind {
        MatePatternKind::BackRank
    }

    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>> {
        let (checker, role) = ctx.single_checker()?;
        let rank = back_rank(ctx.mated);
        if ctx.king.rank() != rank || checker.rank() != rank {
            return None;
        }
        matches!(role, Role::Rook | Role::Queen).then(|| vec![checker])
    }
}

/// Knight mate with the king walled in by its own pieces.
pub struct SmotheredMate;

impl MateRecognizer for SmotheredMate {
    fn kind(&self) -> MatePatternKind {
        MatePatternKind::Smothered
    }

    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>> {
        let (checker, role) = ctx.single_checker()?;
        if role != Role::Knight {
            return None;
        }
        let zone = attacks::king_attacks(ctx.king);
        ((zone & ctx.own_pieces()) == zone).then(|| vec![checker])
    }
}

/// Rook next to a cornered king, protected by a knight.
pub struct ArabianMate;

impl MateRecognizer for ArabianMate {
    fn kind(&self) -> MatePatternKind {
        MatePatternKind::Arabian
    }

    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>> {
        let (checker, role) = ctx.single_checker()?;
        if role != Role::Rook || distance(checker, ctx.king) != 1 || !is_corner(ctx.king) {
            return None;
        }
        let knight = (ctx.defended_by_attacker(checker) & ctx.board.knights()).first()?;
        Some(vec![checker, knight])
    }
}

/// Rook or queen on an edge file with a knight sealing the king's exits and
/// a friendly piece blocking its way in.
pub struct AnastasiaMate;

impl MateRecognizer for AnastasiaMate {
    fn kind(&self) -> MatePatternKind {
        MatePatternKind::Anastasia
    }

    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>> {
        let (checker, role) = ctx.single_checker()?;
        let king_file = file_index(ctx.king);
        if !matches!(role, Role::Rook | Role::Queen) || !(king_file == 0 || king_file == 7) {
            return None;
        }
        if checker.file() != ctx.king.file() || is_corner(ctx.king) {
            return None;
        }
        let zone = attacks::king_attacks(ctx.king);
        if (zone & ctx.own_pieces()).is_empty() {
            return None;
        }
        let knight = (ctx.board.knights() & ctx.board.by_color(ctx.attacker()))
            .into_iter()
            .find(|&sq| (attacks::knight_attacks(sq) & zone).any())?;
        Some(vec![checker, knight])
    }
}

/// Two bishops on crossing diagonals.
pub struct BodenMate;

impl MateRecognizer for BodenMate {
    fn kind(&self) -> MatePatternKind {
        MatePatternKind::Boden
    }

    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>> {
        let (checker, role) = ctx.single_checker()?;
        if role != Role::Bishop {
            return None;
        }
        let zone = attacks::king_attacks(ctx.king);
        let occupied = ctx.board.occupied();
        let partner = (ctx.board.bishops() & ctx.board.by_color(ctx.attacker()))
            .into_iter()
            .filter(|&sq| sq != checker)
            .find(|&sq| (attacks::bishop_attacks(sq, occupied) & zone).any())?;
        // Crossing diagonals means opposite square colors.
        if checker.is_light() == partner.is_light() {
            return None;
        }
        Some(vec![checker, partner])
    }
}

/// Rook next to the king, guarded by a knight that a pawn guards in turn.
pub struct HookMate;

impl MateRecognizer for HookMate {
    fn kind(&self) -> MatePatternKind {
        MatePatternKind::Hook
    }

    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>> {
        let (checker, role) = ctx.single_checker()?;
        if role != Role::Rook || distance(checker, ctx.king) != 1 || is_corner(ctx.king) {
            return None;
        }
        for knight in ctx.defended_by_attacker(checker) & ctx.board.knights() {
            if let Some(pawn) = (ctx.defended_by_attacker(knight) & ctx.board.pawns()).first() {
                return Some(vec![checker, knight, pawn]);
            }
        }
        None
    }
}

/// Guarded queen diagonally next to the king, whose two squares away from the
/// queen are blocked by its own pieces.
pub struct DovetailMate;

impl MateRecognizer for DovetailMate {
    fn kind(&self) -> MatePatternKind {
        MatePatternKind::Dovetail
    }

    fn recognize(&self, ctx: &MateContext<'_>) -> Option<Vec<Square>> {
        let (checker, role) = ctx.single_checker()?;
        if role != Role::Queen || distance(checker, ctx.king) != 1 {
            return None;
        }
        let dir = direction(ctx.king, checker)?;
        if !is_diagonal(dir) || ctx.defended_by_attacker(checker).is_empty() {
            return None;
        }
        let (df, dr) = dir;
        let behind = [offset(ctx.king, (-df, 0)), offset(ctx.king, (0, -dr))];
        let blocked = behind
            .iter()
            .all(|sq| sq.map_or(false, |sq| ctx.own_pieces().contains(sq)));
        blocked.then(|| vec![checker])
    }
}

fn is_corner(square: Square) -> bool {
    matches!(square, Square::A1 | Square::H1 | Square::A8 | Square::H8)
}

pub fn standard_recognizers() -> Vec<Box<dyn MateRecognizer + Send + Sync>> {
    vec![
        Box::new(BackRankMate),
        Box::new(SmotheredMate),
        Box::new(ArabianMate),
        Box::new(AnastasiaMate),
        Box::new(BodenMate),
        Box::new(HookMate),
        Box::new(DovetailMate),
    ]
}

/// Name the mate on the board, if it is one.
pub fn find_mate_patterns(
    pos: &Chess,
    recognizers: &[Box<dyn MateRecognizer + Send + Sync>],
) -> Vec<MatePattern> {
    if !pos.is_checkmate() {
        return Vec::new();
    }
    let mated = pos.turn();
    let Some(king) = pos.board().king_of(mated) else {
        return Vec::new();
    };
    let ctx = MateContext {
        board: pos.board(),
        mated,
        king,
        checkers: pos.checkers(),
    };

    recognizers
        .iter()
        .filter_map(|r| {
            r.recognize(&ctx)
                .map(|squares| MatePattern::new(r.kind(), king, squares))
        })
        .collect()
}

/// Depth-first search for a forced mate through checking moves only.
#[derive(Debug, Clone)]
pub struct MateProbe {
    pub max_plies: u32,
    pub max_nodes: u64,
    nodes: u64,
    exhausted: bool,
}

impl MateProbe {
    pub fn new(max_plies: u32, max_nodes: u64) -> Self {
        Self { max_plies, max_nodes, nodes: 0, exhausted: false }
    }

    pub fn from_config(config: &MotifConfig) -> Self {
        Self::new(config.mate_probe_plies, config.mate_probe_nodes)
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Shortest forced mate for the side to move within the ply bound.
    /// `None` when there is none or the node budget runs out first.
    pub fn find(&mut self, pos: &Chess) -> Option<Vec<Move>> {
        self.nodes = 0;
        self.exhausted = false;
        let mut plies = 1;
        while plies <= self.max_plies {
            if let Some(line) = self.attack(pos, plies) {
                return Some(line);
            }
            if self.exhausted {
                tracing::trace!(nodes = self.nodes, plies, "mate probe budget exhausted");
                return None;
            }
            plies += 2;
        }
        None
    }

    fn spend(&mut self) -> bool {
        if self.nodes >= self.max_nodes {
            self.exhausted = true;
            return false;
        }
        self.nodes += 1;
        true
    }

    /// Mating side to move with `plies` left.
    fn attack(&mut self, pos: &Chess, plies: u32) -> Option<Vec<Move>> {
        for mv in pos.legal_moves() {
            if !self.spend() {
                return None;
            }
            let Ok(next) = pos.clone().play(mv.clone()) else {
                continue;
            };
            if !next.is_check() {
                continue;
            }
            if next.is_checkmate() {
                return Some(vec![mv]);
            }
            if plies < 3 {
                continue;
            }
            if let Some(rest) = self.defend(&next, plies - 1) {
                let mut line = vec![mv];
                line.extend(rest);
                return Some(line);
            }
            if self.exhausted {
                return None;
            }
        }
        None
    }

    /// Defending side to move: every reply must still lose. Returns the
    /// longest-resisting line.
    fn defend(&mut self, pos: &Chess, plies: u32) -> Option<Vec<Move>> {
        let replies = pos.legal_moves();
        if replies.is_empty() {
            return None;
        }
        let mut longest: Option<Vec<Move>> = None;
        for reply in replies {
            if !self.spend() {
                return None;
            }
            let Ok(next) = pos.clone().play(reply.clone()) else {
                return None;
            };
            let rest = self.attack(&next, plies - 1)?;
            if longest.as_ref().map_or(true, |l| rest.len() + 1 > l.len()) {
                let mut line = vec![reply];
                line.extend(rest);
                longest = Some(line);
            }
        }
        longest
    }
}

fn threat_from_line(attacker: Color, line: &[Move], immediate: bool) -> Option<MateThreat> {
    let first = line.first()?;
    let plies = line.len() as u32;
    Some(MateThreat {
        attacker,
        mating_move: move_to_uci(first),
        mating_from: first.from(),
        mating_square: first.to(),
        plies,
        line: line.iter().map(move_to_uci).collect(),
        immediate,
        value: mate_value(plies),
    })
}

/// Forced mates available to the side to move and, when it is not in check,
/// the opponent's standing threat.
pub fn find_mate_threats(pos: &Chess, config: &MotifConfig) -> Vec<MateThreat> {
    let mut threats = Vec::new();
    let mut probe = MateProbe::from_config(config);

    if let Some(line) = probe.find(pos) {
        threats.extend(threat_from_line(pos.turn(), &line, true));
    }

    if !pos.is_check() {
        if let Ok(swapped) = pos.clone().swap_turn() {
            if let Some(line) = probe.find(&swapped) {
                threats.extend(threat_from_line(swapped.turn(), &line, false));
            }
        }
    }

    threats
}
