//! Soundness judgments and motif chaining
//!
//! Every balance here is seen from the side playing the tactic, after the
//! opponent's best single reply.

use crate::config::MotifConfig;

use super::types::{MotifId, MotifKind, TacticValue, TacticalMotifs, MATE_VALUE};

/// One piece hit by a fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkTarget {
    pub is_king: bool,
    /// What taking this target nets if it stays put.
    pub gain: i32,
    /// Pinned targets cannot step out of the fork.
    pub pinned: bool,
}

/// `forker_risk` is what the opponent nets by capturing the forking piece
/// (zero or less when it cannot be taken profitably).
pub fn fork_value(targets: &[ForkTarget], forker_risk: i32) -> TacticValue {
    let (mut delta, mut notes) = if targets.iter().any(|t| t.is_king) {
        let best = targets
            .iter()
            .filter(|t| !t.is_king)
            .map(|t| t.gain)
            .max()
            .unwrap_or(0);
        (best, "the king must answer the check first".to_string())
    } else {
        let saved = targets
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.pinned)
            .max_by_key(|(_, t)| t.gain)
            .map(|(i, _)| i);
        let remaining = targets
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != saved)
            .map(|(_, t)| t.gain)
            .max()
            .unwrap_or(0);
        let notes = match saved {
            Some(_) if targets.iter().any(|t| t.pinned) => {
                "the best target is moved away; a pinned target cannot follow"
            }
            Some(_) => "the most valuable target is moved away",
            None => "every target is pinned and none can escape",
        };
        (remaining, notes.to_string())
    };

    if forker_risk > 0 && -forker_risk < delta {
        delta = -forker_risk;
        notes = "capturing the forking piece refutes it".to_string();
    }

    TacticValue::new(delta).with_notes(notes)
}

/// `duty_gains` holds what the attacker nets on each defended piece once the
/// overloaded defender has been drawn away.
pub fn overload_value(duty_gains: &[i32], mating_relevant: bool) -> TacticValue {
    if mating_relevant {
        let delta = duty_gains.iter().copied().max().unwrap_or(0).max(0);
        TacticValue::new(delta).with_notes("leaving a duty opens a mating square")
    } else {
        let delta = duty_gains.iter().copied().min().unwrap_or(0);
        TacticValue::new(delta).with_notes("the defender can keep only one duty")
    }
}

pub fn capturable_defender_value(defender_gain: i32, follow_up_gain: i32) -> TacticValue {
    TacticValue::new(defender_gain + follow_up_gain)
        .with_notes("removing the defender leaves the defended piece en prise")
}

pub fn mate_value(plies: u32) -> TacticValue {
    TacticValue::new(MATE_VALUE).with_notes(format!("forced mate in {} plies", plies))
}

/// Fill `related_motifs` according to the chaining tiers. Balances are left
/// untouched.
pub fn link_related(motifs: &mut TacticalMotifs, config: &MotifConfig) {
    if !config.chain_tier1 {
        return;
    }
    let mut links = direct_links(motifs);
    if config.chain_tier2 {
        links.extend(second_order_links(motifs));
    }
    for (from, to) in links {
        if let Some(value) = motifs.value_mut(from) {
            value.relate(to);
        }
    }
}

fn direct_links(motifs: &TacticalMotifs) -> Vec<(MotifId, MotifId)> {
    let mut links = Vec::new();

    for (i, fork) in motifs.forks.iter().enumerate() {
        for (j, pin) in motifs.pins.iter().enumerate() {
            if pin.pinning_piece.color == fork.piece.color
                && fork.target_squares.contains(&pin.pinned_square)
            {
                links.push((MotifId::new(MotifKind::Fork, i), MotifId::new(MotifKind::Pin, j)));
            }
        }
    }

    for (i, overloaded) in motifs.overloaded_pieces.iter().enumerate() {
        let id = MotifId::new(MotifKind::OverloadedPiece, i);
        let color = overloaded.piece.color;
        for (j, weakness) in motifs.back_rank_weaknesses.iter().enumerate() {
            if weakness.color == color {
                links.push((id, MotifId::new(MotifKind::BackRankWeakness, j)));
            }
        }
        for (j, threat) in motifs.mate_threats.iter().enumerate() {
            if threat.attacker != color {
                links.push((id, MotifId::new(MotifKind::MateThreat, j)));
            }
        }
    }

    for (i, capturable) in motifs.capturable_defenders.iter().enumerate() {
        for (j, hanging) in motifs.hanging_pieces.iter().enumerate() {
            if hanging.square == capturable.defender_square
                || hanging.square == capturable.defended_square
            {
                links.push((
                    MotifId::new(MotifKind::CapturableDefender, i),
                    MotifId::new(MotifKind::HangingPiece, j),
                ));
            }
        }
    }

    for (i, threat) in motifs.mate_threats.iter().enumerate() {
        for (j, weakness) in motifs.back_rank_weaknesses.iter().enumerate() {
            if weakness.color != threat.attacker {
                links.push((
                    MotifId::new(MotifKind::MateThreat, i),
                    MotifId::new(MotifKind::BackRankWeakness, j),
                ));
            }
        }
    }

    links
}

fn second_order_links(motifs: &TacticalMotifs) -> Vec<(MotifId, MotifId)> {
    let mut links = Vec::new();

    for (i, fork) in motifs.forks.iter().enumerate() {
        let fork_id = MotifId::new(MotifKind::Fork, i);
        for (j, overloaded) in motifs.overloaded_pieces.iter().enumerate() {
            if overloaded.piece.color != fork.piece.color
                && overloaded.duties.iter().any(|d| fork.target_squares.contains(d))
            {
                let overload_id = MotifId::new(MotifKind::OverloadedPiece, j);
                links.push((fork_id, overload_id));
                links.push((overload_id, fork_id));
            }
        }
        // A fork that hits a defender which can be taken for free.
        for (j, capturable) in motifs.capturable_defenders.iter().enumerate() {
            if capturable.defender.color != fork.piece.color
                && fork.target_squares.contains(&capturable.defender_square)
            {
                links.push((fork_id, MotifId::new(MotifKind::CapturableDefender, j)));
            }
        }
    }

    links
}
