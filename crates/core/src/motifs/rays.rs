//! Single pass over every sliding-piece line
//!
//! Each bishop, rook and queen of either color walks its rays once. The first
//! two occupied squares on a ray decide whether the line is a pin, a skewer or
//! an x-ray. Discovered attacks reuse the same walk with the front piece
//! lifted off the occupancy bitboard.

use shakmaty::{Bitboard, Board, Chess, Piece, Position, Role, Square};

use crate::geometry::{attackers, first_two_blockers, piece_value, slider_directions};

use super::types::{DiscoveredAttack, Pin, PinType, Skewer, XRay};

/// Everything the ray walk produces, shared with the other finders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RayFindings {
    pub pins: Vec<Pin>,
    pub skewers: Vec<Skewer>,
    pub discovered_attacks: Vec<DiscoveredAttack>,
    pub xray_attacks: Vec<XRay>,
    pub xray_defenses: Vec<XRay>,
}

impl RayFindings {
    /// Pin holding the piece on `square`, if any.
    pub fn pin_on(&self, square: Square) -> Option<&Pin> {
        self.pins.iter().find(|p| p.pinned_square == square)
    }

    pub fn is_absolutely_pinned(&self, square: Square) -> bool {
        self.pins
            .iter()
            .any(|p| p.pinned_square == square && p.pin_type == PinType::Absolute)
    }
}

enum LineKind {
    Pin(PinType),
    Skewer,
}

/// Enemy piece in front of another enemy piece.
fn classify_line(near: Piece, far: Piece) -> Option<LineKind> {
    if near.role == Role::King {
        return Some(LineKind::Skewer);
    }
    if far.role == Role::King {
        return Some(LineKind::Pin(PinType::Absolute));
    }
    let near_value = piece_value(near.role)?;
    let far_value = piece_value(far.role)?;
    if far_value >= near_value {
        Some(LineKind::Pin(PinType::Relative))
    } else {
        Some(LineKind::Skewer)
    }
}

pub fn scan_rays(pos: &Chess) -> RayFindings {
    let board = pos.board();
    let occupied = board.occupied();
    let mut findings = RayFindings::default();

    for (from, slider) in board.iter() {
        for &dir in slider_directions(slider.role) {
            let (Some(near_sq), Some(far_sq)) = first_two_blockers(from, dir, occupied) else {
                continue;
            };
            let (Some(near), Some(far)) = (board.piece_at(near_sq), board.piece_at(far_sq)) else {
                continue;
            };

            let near_friendly = near.color == slider.color;
            let far_friendly = far.color == slider.color;

            match (near_friendly, far_friendly) {
                (false, false) => match classify_line(near, far) {
                    Some(LineKind::Pin(pin_type)) => findings.pins.push(Pin {
                        pinned_square: near_sq,
                        pinned_piece: near,
                        pinning_square: from,
                        pinning_piece: slider,
                        pinned_to_square: far_sq,
                        pin_type,
                    }),
                    Some(LineKind::Skewer) => findings.skewers.push(Skewer {
                        attacker_square: from,
                        attacker: slider,
                        front_square: near_sq,
                        back_square: far_sq,
                    }),
                    None => {}
                },
                (true, false) if far.role != Role::Pawn => findings.xray_attacks.push(XRay {
                    slider_square: from,
                    slider,
                    through_square: near_sq,
                    target_square: far_sq,
                }),
                (true, true) if far.role != Role::Pawn => findings.xray_defenses.push(XRay {
                    slider_square: from,
                    slider,
                    through_square: near_sq,
                    target_square: far_sq,
                }),
                _ => {}
            }

            if near_friendly {
                let discovered = discovered_attack(pos, from, slider, near_sq, dir, occupied);
                if let Some(discovered) = discovered {
                    findings.discovered_attacks.push(discovered);
                }
            }
        }
    }

    findings
}

/// Lift `candidate` off the board and look down the ray again.
fn discovered_attack(
    pos: &Chess,
    slider_square: Square,
    slider: Piece,
    candidate: Square,
    dir: (i32, i32),
    occupied: Bitboard,
) -> Option<DiscoveredAttack> {
    let board = pos.board();
    let mut lifted = occupied;
    lifted.discard(candidate);

    let (target_square, _) = first_two_blockers(slider_square, dir, lifted);
    let target_square = target_square?;
    let target = board.piece_at(target_square)?;
    if target.color == slider.color {
        return None;
    }

    let is_check = target.role == Role::King;
    if !is_check && is_defended(board, target_square, target) {
        return None;
    }

    // A candidate that cannot move reveals nothing this turn.
    if pos.turn() == slider.color
        && !pos.legal_moves().iter().any(|m| m.from() == Some(candidate))
    {
        return None;
    }

    Some(DiscoveredAttack {
        moving_square: candidate,
        slider_square,
        slider,
        target_square,
        target,
        is_check,
    })
}

fn is_defended(board: &Board, square: Square, piece: Piece) -> bool {
    attackers(board, square, piece.color).any()
}
