//! Tactical motif detection and valuation

mod analyzer;
mod forks;
mod king;
mod mates;
mod overload;
mod rays;
mod threats;
mod types;
mod valuation;

pub use analyzer::MotifAnalyzer;
pub use king::{back_rank_guard, BackRankGuard};
pub use mates::{
    standard_recognizers, AnastasiaMate, ArabianMate, BackRankMate, BodenMate, DovetailMate,
    HookMate, MateContext, MateProbe, MateRecognizer, SmotheredMate,
};
pub use rays::{scan_rays, RayFindings};
pub use types::*;
