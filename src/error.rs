//! Error types
//!
//! Configuration errors are fatal at startup: a core that cannot guarantee
//! every bin is reachable must refuse to serve plays. Simulation errors are
//! internal invariant violations and never carry a bin index.

use thiserror::Error;

use crate::sim::BallId;

/// Board, table or settings rejected before serving
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unusable fixed-point scale {0}: must be a power of ten small enough for the board to fit in i64")]
    InvalidScale(i64),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{rows} rows need {expected} multipliers, got {found}")]
    MultiplierCount {
        rows: u32,
        expected: usize,
        found: usize,
    },

    #[error("multiplier table is not symmetric: bin {index} pays {left}bp, bin {mirror} pays {right}bp")]
    AsymmetricMultipliers {
        index: usize,
        mirror: usize,
        left: u32,
        right: u32,
    },

    #[error("multiplier table has no house edge: expected value {expected_value:.4} >= 1")]
    NoHouseEdge { expected_value: f64 },

    #[error("bin {bin} is unreachable: sweep of {candidates} start offsets found no landing")]
    UnreachableBin { bin: usize, candidates: usize },

    #[error("landing offset {start_x} for bin {bin} failed verification: {reason}")]
    LandingVerification {
        bin: usize,
        start_x: i64,
        reason: String,
    },

    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// A ball failed to resolve into a bin
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("ball {ball} not captured after {steps} steps")]
    StepLimit { ball: BallId, steps: u32 },

    #[error("ball {ball} left the board at step {steps} without being captured")]
    Escaped { ball: BallId, steps: u32 },

    #[error("ball landed in bin {captured}, expected bin {expected}")]
    Mismatch { expected: usize, captured: usize },

    #[error("no bin with index {0}")]
    UnknownBin(usize),
}

/// Outcome generation failed; no bet may be accepted
#[derive(Debug, Error)]
pub enum OutcomeError {
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    #[error("wager must be positive")]
    ZeroWager,

    #[error("step pattern has {found} steps, board has {rows} rows")]
    PatternLength { rows: u32, found: usize },

    #[error("payout overflow for wager {wager}")]
    PayoutOverflow { wager: u64 },
}

/// Any error the core can surface
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimError),

    #[error(transparent)]
    Outcome(#[from] OutcomeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
