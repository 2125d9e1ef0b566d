//! Plinko core - authoritative outcomes with matching ball physics
//!
//! Core modules:
//! - `outcome`: Discrete random walk deciding the bin and payout
//! - `sim`: Deterministic fixed-point peg physics (board, balls, scheduler)
//! - `landing`: Verified start offsets that make the physics land in a chosen bin
//! - `game`: The facade tying outcome, landing table and physics together
//! - `settings`: Board, physics and payout configuration

pub mod error;
pub mod fixed;
pub mod game;
pub mod landing;
pub mod outcome;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, Error, OutcomeError, Result, SimError};
pub use fixed::{FixedScale, Fx};
pub use game::{Play, Plinko};
pub use landing::{LandingTable, SweepStats};
pub use outcome::{MultiplierTable, OutcomeGenerator, OutcomeRecord, Step};
pub use settings::Settings;

/// Default board configuration
pub mod consts {
    /// Peg rows, and left/right steps per outcome
    pub const DEFAULT_ROWS: u32 = 16;
    /// Largest supported row count (keeps the binomial weights in u64)
    pub const MAX_ROWS: u32 = 60;

    /// Board dimensions
    pub const BOARD_WIDTH: f64 = 800.0;
    pub const BOARD_HEIGHT: f64 = 800.0;

    /// Peg lattice
    pub const PEG_PITCH: f64 = 36.0;
    pub const ROW_PITCH: f64 = 35.0;
    pub const PEG_RADIUS: f64 = 4.0;
    pub const BALL_RADIUS: f64 = 7.0;

    /// Bins sit this far above the bottom of the board
    pub const BIN_FLOOR_OFFSET: f64 = 170.0;
    pub const BIN_PITCH: f64 = 36.0;

    /// Gravity added to the vertical velocity every tick (pixels/tick)
    pub const GRAVITY: f64 = 0.6;
    /// Peg bounce damping (arcade feel, not energy conserving)
    pub const HORIZONTAL_FRICTION: f64 = 0.4;
    pub const VERTICAL_FRICTION: f64 = 0.8;

    /// New balls start here, in the empty rows above the first peg row
    pub const DROP_HEIGHT: f64 = 50.0;
    /// A landing takes at most a few hundred ticks on the default board
    pub const MAX_STEPS: u32 = 2_000;

    /// Landing table sweep resolution (pixels)
    pub const SWEEP_STEP: f64 = 1.0;

    /// Multiplier scale: 10_000 basis points = 1x
    pub const MULTIPLIER_SCALE: u64 = 10_000;

    /// Payout multipliers for the 17 bins of the default board
    pub const DEFAULT_MULTIPLIERS: [f64; 17] = [
        16.0, 9.0, 2.0, 1.4, 1.4, 1.2, 1.1, 1.0, 0.5, 1.0, 1.1, 1.2, 1.4, 1.4, 2.0, 9.0, 16.0,
    ];
}
