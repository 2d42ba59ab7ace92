//! Analysis configuration
//!
//! Flags are read from the process environment once, when the caller builds
//! the config at startup, and then passed explicitly into the analyzer.

use std::env;

pub const ENV_CHAINING: &str = "CHESS_COACH_MOTIF_CHAINING";
pub const ENV_CHAINING_TIER2: &str = "CHESS_COACH_MOTIF_CHAINING_TIER2";
pub const ENV_MATE_PLIES: &str = "CHESS_COACH_MATE_PLIES";
pub const ENV_MATE_NODES: &str = "CHESS_COACH_MATE_NODES";

pub const DEFAULT_MATE_PLIES: u32 = 3;
pub const DEFAULT_MATE_NODES: u64 = 200_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotifConfig {
    /// Link motifs to the motifs that directly enable them.
    pub chain_tier1: bool,
    /// Also link second-order relations. Inert without `chain_tier1`.
    pub chain_tier2: bool,
    /// Ply bound for the forced-mate probe (mating side plies are the odd ones).
    pub mate_probe_plies: u32,
    /// Node budget for the forced-mate probe.
    pub mate_probe_nodes: u64,
}

impl Default for MotifConfig {
    fn default() -> Self {
        Self {
            chain_tier1: false,
            chain_tier2: false,
            mate_probe_plies: DEFAULT_MATE_PLIES,
            mate_probe_nodes: DEFAULT_MATE_NODES,
        }
    }
}

impl MotifConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chain_tier1: env_flag(ENV_CHAINING),
            chain_tier2: env_flag(ENV_CHAINING_TIER2),
            mate_probe_plies: env_number(ENV_MATE_PLIES).unwrap_or(defaults.mate_probe_plies),
            mate_probe_nodes: env_number(ENV_MATE_NODES).unwrap_or(defaults.mate_probe_nodes),
        }
        .normalized()
    }

    pub fn with_chaining(mut self, tier1: bool, tier2: bool) -> Self {
        self.chain_tier1 = tier1;
        self.chain_tier2 = tier2;
        self.normalized()
    }

    /// Tier 2 without tier 1 is turned off rather than rejected.
    pub fn normalized(mut self) -> Self {
        if !self.chain_tier1 {
            self.chain_tier2 = false;
        }
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
