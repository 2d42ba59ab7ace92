//! Motif records and the aggregate report

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use shakmaty::{Color, Piece, Square};

use crate::notation;

/// Tactics whose best-defence balance is at least this (centipawns) are
/// sound. Even trades count as sound.
pub const SOUNDNESS_TOLERANCE: i32 = -50;

/// Balance credited to a tactic that ends in forced mate.
pub const MATE_VALUE: i32 = 32_000;

/// The closed set of motif kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotifKind {
    Pin,
    Fork,
    Skewer,
    HangingPiece,
    DiscoveredAttack,
    DoubleCheck,
    TrappedPiece,
    MatePattern,
    MateThreat,
    BackRankWeakness,
    XRayAttack,
    XRayDefense,
    ExposedKing,
    OverloadedPiece,
    CapturableDefender,
}

impl MotifKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotifKind::Pin => "pin",
            MotifKind::Fork => "fork",
            MotifKind::Skewer => "skewer",
            MotifKind::HangingPiece => "hanging_piece",
            MotifKind::DiscoveredAttack => "discovered_attack",
            MotifKind::DoubleCheck => "double_check",
            MotifKind::TrappedPiece => "trapped_piece",
            MotifKind::MatePattern => "mate_pattern",
            MotifKind::MateThreat => "mate_threat",
            MotifKind::BackRankWeakness => "back_rank_weakness",
            MotifKind::XRayAttack => "xray_attack",
            MotifKind::XRayDefense => "xray_defense",
            MotifKind::ExposedKing => "exposed_king",
            MotifKind::OverloadedPiece => "overloaded_piece",
            MotifKind::CapturableDefender => "capturable_defender",
        }
    }
}

/// Position of a motif inside its kind's list, e.g. `fork#0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MotifId {
    pub kind: MotifKind,
    pub index: usize,
}

impl MotifId {
    pub fn new(kind: MotifKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for MotifId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.as_str(), self.index)
    }
}

impl Serialize for MotifId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Soundness judgment for tactics that win (or lose) material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TacticValue {
    /// Expected gain in centipawns for the side playing the tactic, assuming
    /// the opponent defends as well as possible.
    pub material_delta: i32,
    pub is_sound: bool,
    pub defense_notes: String,
    pub related_motifs: Vec<MotifId>,
}

impl TacticValue {
    pub fn new(material_delta: i32) -> Self {
        Self {
            material_delta,
            is_sound: material_delta >= SOUNDNESS_TOLERANCE,
            defense_notes: String::new(),
            related_motifs: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.defense_notes = notes.into();
        self
    }

    /// Add a link once; links never touch the balance.
    pub fn relate(&mut self, id: MotifId) {
        if !self.related_motifs.contains(&id) {
            self.related_motifs.push(id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinType {
    /// Pinned to the king: moving off the line is illegal.
    Absolute,
    /// Pinned to a piece worth at least as much as the pinned one.
    Relative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pin {
    #[serde(serialize_with = "notation::square::serialize")]
    pub pinned_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub pinned_piece: Piece,
    #[serde(serialize_with = "notation::square::serialize")]
    pub pinning_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub pinning_piece: Piece,
    #[serde(serialize_with = "notation::square::serialize")]
    pub pinned_to_square: Square,
    pub pin_type: PinType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fork {
    #[serde(serialize_with = "notation::square::serialize")]
    pub forking_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub piece: Piece,
    #[serde(serialize_with = "notation::squares::serialize")]
    pub target_squares: Vec<Square>,
    pub value: TacticValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skewer {
    #[serde(serialize_with = "notation::square::serialize")]
    pub attacker_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub attacker: Piece,
    #[serde(serialize_with = "notation::square::serialize")]
    pub front_square: Square,
    #[serde(serialize_with = "notation::square::serialize")]
    pub back_square: Square,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HangingPiece {
    #[serde(serialize_with = "notation::square::serialize")]
    pub square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub piece: Piece,
    #[serde(serialize_with = "notation::squares::serialize")]
    pub attackers: Vec<Square>,
    #[serde(serialize_with = "notation::squares::serialize")]
    pub defenders: Vec<Square>,
    /// Centipawn value of the cheapest attacker.
    pub lowest_attacker_value: i32,
    /// What the attacking side nets from the exchange on this square.
    pub exchange_gain: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredAttack {
    /// The piece whose move uncovers the line.
    #[serde(serialize_with = "notation::square::serialize")]
    pub moving_square: Square,
    #[serde(serialize_with = "notation::square::serialize")]
    pub slider_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub slider: Piece,
    #[serde(serialize_with = "notation::square::serialize")]
    pub target_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub target: Piece,
    pub is_check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoubleCheck {
    #[serde(serialize_with = "notation::square::serialize")]
    pub king_square: Square,
    #[serde(serialize_with = "notation::squares::serialize")]
    pub checking_squares: Vec<Square>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrappedPiece {
    #[serde(serialize_with = "notation::square::serialize")]
    pub square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub piece: Piece,
    /// Every square the piece could move to; all of them lose material.
    #[serde(serialize_with = "notation::squares::serialize")]
    pub escape_squares: Vec<Square>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatePatternKind {
    BackRank,
    Smothered,
    Arabian,
    Anastasia,
    Boden,
    Hook,
    Dovetail,
}

impl MatePatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatePatternKind::BackRank => "back rank",
            MatePatternKind::Smothered => "smothered",
            MatePatternKind::Arabian => "arabian",
            MatePatternKind::Anastasia => "anastasia",
            MatePatternKind::Boden => "boden",
            MatePatternKind::Hook => "hook",
            MatePatternKind::Dovetail => "dovetail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatePattern {
    pub name: String,
    pub kind: MatePatternKind,
    #[serde(serialize_with = "notation::square::serialize")]
    pub king_square: Square,
    #[serde(serialize_with = "notation::squares::serialize")]
    pub participating_squares: Vec<Square>,
}

impl MatePattern {
    pub fn new(
        kind: MatePatternKind,
        king_square: Square,
        participating_squares: Vec<Square>,
    ) -> Self {
        Self {
            name: kind.as_str().to_string(),
            kind,
            king_square,
            participating_squares,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MateThreat {
    /// Side that can force mate.
    #[serde(serialize_with = "notation::color::serialize")]
    pub attacker: Color,
    /// First move of the mating line, UCI.
    pub mating_move: String,
    #[serde(skip)]
    pub mating_from: Option<Square>,
    #[serde(serialize_with = "notation::square::serialize")]
    pub mating_square: Square,
    /// Length of the forced line in plies (1 = mate in one).
    pub plies: u32,
    /// Principal line found, UCI.
    pub line: Vec<String>,
    /// Whether the side to move owns the threat (false: it is the opponent's
    /// standing threat, found on the turn-swapped position).
    pub immediate: bool,
    pub value: TacticValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackRankWeakness {
    #[serde(serialize_with = "notation::color::serialize")]
    pub color: Color,
    #[serde(serialize_with = "notation::square::serialize")]
    pub king_square: Square,
    /// Rank number, 1 or 8.
    pub rank: u32,
    /// Back-rank squares with a clear line to the king that no defender covers.
    #[serde(serialize_with = "notation::squares::serialize")]
    pub entry_squares: Vec<Square>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XRay {
    #[serde(serialize_with = "notation::square::serialize")]
    pub slider_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub slider: Piece,
    #[serde(serialize_with = "notation::square::serialize")]
    pub through_square: Square,
    #[serde(serialize_with = "notation::square::serialize")]
    pub target_square: Square,
}

/// Slider aiming through its own piece at an enemy piece.
pub type XRayAttack = XRay;
/// Slider backing up a friendly piece through another friendly piece.
pub type XRayDefense = XRay;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposedKing {
    #[serde(serialize_with = "notation::color::serialize")]
    pub color: Color,
    #[serde(serialize_with = "notation::square::serialize")]
    pub king_square: Square,
    pub shield_pawns: u32,
    pub attacked_adjacent_squares: u32,
    pub enemy_attacks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverloadedPiece {
    #[serde(serialize_with = "notation::square::serialize")]
    pub square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub piece: Piece,
    /// Squares this piece alone holds: attacked pieces and mating squares.
    #[serde(serialize_with = "notation::squares::serialize")]
    pub duties: Vec<Square>,
    /// One of the duties guards against mate.
    pub mating_relevant: bool,
    pub value: TacticValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturableDefender {
    #[serde(serialize_with = "notation::square::serialize")]
    pub defender_square: Square,
    #[serde(serialize_with = "notation::piece::serialize")]
    pub defender: Piece,
    #[serde(serialize_with = "notation::square::serialize")]
    pub defended_square: Square,
    pub value: TacticValue,
}

/// Borrowed view of one motif, tagged by kind.
#[derive(Debug, Clone, Copy)]
pub enum Motif<'a> {
    Pin(&'a Pin),
    Fork(&'a Fork),
    Skewer(&'a Skewer),
    HangingPiece(&'a HangingPiece),
    DiscoveredAttack(&'a DiscoveredAttack),
    DoubleCheck(&'a DoubleCheck),
    TrappedPiece(&'a TrappedPiece),
    MatePattern(&'a MatePattern),
    MateThreat(&'a MateThreat),
    BackRankWeakness(&'a BackRankWeakness),
    XRayAttack(&'a XRay),
    XRayDefense(&'a XRay),
    ExposedKing(&'a ExposedKing),
    OverloadedPiece(&'a OverloadedPiece),
    CapturableDefender(&'a CapturableDefender),
}

impl Motif<'_> {
    pub fn kind(&self) -> MotifKind {
        match self {
            Motif::Pin(_) => MotifKind::Pin,
            Motif::Fork(_) => MotifKind::Fork,
            Motif::Skewer(_) => MotifKind::Skewer,
            Motif::HangingPiece(_) => MotifKind::HangingPiece,
            Motif::DiscoveredAttack(_) => MotifKind::DiscoveredAttack,
            Motif::DoubleCheck(_) => MotifKind::DoubleCheck,
            Motif::TrappedPiece(_) => MotifKind::TrappedPiece,
            Motif::MatePattern(_) => MotifKind::MatePattern,
            Motif::MateThreat(_) => MotifKind::MateThreat,
            Motif::BackRankWeakness(_) => MotifKind::BackRankWeakness,
            Motif::XRayAttack(_) => MotifKind::XRayAttack,
            Motif::XRayDefense(_) => MotifKind::XRayDefense,
            Motif::ExposedKing(_) => MotifKind::ExposedKing,
            Motif::OverloadedPiece(_) => MotifKind::OverloadedPiece,
            Motif::CapturableDefender(_) => MotifKind::CapturableDefender,
        }
    }

    /// Squares the motif is about.
    pub fn squares(&self) -> Vec<Square> {
        match self {
            Motif::Pin(p) => vec![p.pinning_square, p.pinned_square, p.pinned_to_square],
            Motif::Fork(f) => {
                let mut squares = vec![f.forking_square];
                squares.extend(&f.target_squares);
                squares
            }
            Motif::Skewer(s) => vec![s.attacker_square, s.front_square, s.back_square],
            Motif::HangingPiece(h) => {
                let mut squares = vec![h.square];
                squares.extend(&h.attackers);
                squares
            }
            Motif::DiscoveredAttack(d) => vec![d.moving_square, d.slider_square, d.target_square],
            Motif::DoubleCheck(d) => {
                let mut squares = vec![d.king_square];
                squares.extend(&d.checking_squares);
                squares
            }
            Motif::TrappedPiece(t) => vec![t.square],
            Motif::MatePattern(m) => {
                let mut squares = vec![m.king_square];
                squares.extend(&m.participating_squares);
                squares
            }
            Motif::MateThreat(m) => m.mating_from.into_iter().collect(),
            Motif::BackRankWeakness(b) => vec![b.king_square],
            Motif::XRayAttack(x) | Motif::XRayDefense(x) => {
                vec![x.slider_square, x.through_square, x.target_square]
            }
            Motif::ExposedKing(e) => vec![e.king_square],
            Motif::OverloadedPiece(o) => {
                let mut squares = vec![o.square];
                squares.extend(&o.duties);
                squares
            }
            Motif::CapturableDefender(c) => vec![c.defender_square, c.defended_square],
        }
    }

    pub fn value(&self) -> Option<&TacticValue> {
        match self {
            Motif::Fork(f) => Some(&f.value),
            Motif::MateThreat(m) => Some(&m.value),
            Motif::OverloadedPiece(o) => Some(&o.value),
            Motif::CapturableDefender(c) => Some(&c.value),
            _ => None,
        }
    }
}

/// Every motif found in one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TacticalMotifs {
    pub pins: Vec<Pin>,
    pub forks: Vec<Fork>,
    pub skewers: Vec<Skewer>,
    pub hanging_pieces: Vec<HangingPiece>,
    pub discovered_attacks: Vec<DiscoveredAttack>,
    pub double_checks: Vec<DoubleCheck>,
    pub trapped_pieces: Vec<TrappedPiece>,
    pub mate_patterns: Vec<MatePattern>,
    pub mate_threats: Vec<MateThreat>,
    pub back_rank_weaknesses: Vec<BackRankWeakness>,
    pub xray_attacks: Vec<XRayAttack>,
    pub xray_defenses: Vec<XRayDefense>,
    pub exposed_kings: Vec<ExposedKing>,
    pub overloaded_pieces: Vec<OverloadedPiece>,
    pub capturable_defenders: Vec<CapturableDefender>,
    /// Occupied square (algebraic) to the motifs it takes part in.
    pub square_index: BTreeMap<String, Vec<MotifId>>,
}

impl TacticalMotifs {
    /// All motifs in a fixed kind order, each list in detection order.
    pub fn motifs(&self) -> Vec<(MotifId, Motif<'_>)> {
        fn tag<'a, T>(
            out: &mut Vec<(MotifId, Motif<'a>)>,
            kind: MotifKind,
            items: &'a [T],
            wrap: fn(&'a T) -> Motif<'a>,
        ) {
            out.extend(items.iter().enumerate().map(|(i, m)| (MotifId::new(kind, i), wrap(m))));
        }

        let mut out = Vec::new();
        tag(&mut out, MotifKind::Pin, &self.pins, Motif::Pin);
        tag(&mut out, MotifKind::Fork, &self.forks, Motif::Fork);
        tag(&mut out, MotifKind::Skewer, &self.skewers, Motif::Skewer);
        tag(&mut out, MotifKind::HangingPiece, &self.hanging_pieces, Motif::HangingPiece);
        tag(
            &mut out,
            MotifKind::DiscoveredAttack,
            &self.discovered_attacks,
            Motif::DiscoveredAttack,
        );
        tag(&mut out, MotifKind::DoubleCheck, &self.double_checks, Motif::DoubleCheck);
        tag(&mut out, MotifKind::TrappedPiece, &self.trapped_pieces, Motif::TrappedPiece);
        tag(&mut out, MotifKind::MatePattern, &self.mate_patterns, Motif::MatePattern);
        tag(&mut out, MotifKind::MateThreat, &self.mate_threats, Motif::MateThreat);
        tag(
            &mut out,
            MotifKind::BackRankWeakness,
            &self.back_rank_weaknesses,
            Motif::BackRankWeakness,
        );
        tag(&mut out, MotifKind::XRayAttack, &self.xray_attacks, Motif::XRayAttack);
        tag(&mut out, MotifKind::XRayDefense, &self.xray_defenses, Motif::XRayDefense);
        tag(&mut out, MotifKind::ExposedKing, &self.exposed_kings, Motif::ExposedKing);
        tag(&mut out, MotifKind::OverloadedPiece, &self.overloaded_pieces, Motif::OverloadedPiece);
        tag(
            &mut out,
            MotifKind::CapturableDefender,
            &self.capturable_defenders,
            Motif::CapturableDefender,
        );
        out
    }

    pub fn get(&self, id: MotifId) -> Option<Motif<'_>> {
        self.motifs().into_iter().find(|(i, _)| *i == id).map(|(_, m)| m)
    }

    pub fn value_mut(&mut self, id: MotifId) -> Option<&mut TacticValue> {
        match id.kind {
            MotifKind::Fork => self.forks.get_mut(id.index).map(|f| &mut f.value),
            MotifKind::MateThreat => self.mate_threats.get_mut(id.index).map(|m| &mut m.value),
            MotifKind::OverloadedPiece => {
                self.overloaded_pieces.get_mut(id.index).map(|o| &mut o.value)
            }
            MotifKind::CapturableDefender => {
                self.capturable_defenders.get_mut(id.index).map(|c| &mut c.value)
            }
            _ => None,
        }
    }

    pub fn motifs_at(&self, square: Square) -> &[MotifId] {
        self.square_index
            .get(&square.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self) -> usize {
        self.motifs().len()
    }
}
