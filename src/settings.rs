//! Board and physics settings
//!
//! Loaded from JSON; every field falls back to the default board when omitted.
//! Changing any physics or geometry value invalidates a built landing table,
//! so settings are validated once and the core is rebuilt from scratch.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::fixed::FixedScale;
use crate::outcome::MultiplierTable;

/// Board, physics and payout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Board ===
    /// Number of peg rows (and of left/right steps per outcome)
    pub rows: u32,
    /// Board width in pixels
    pub board_width: f64,
    /// Board height in pixels
    pub board_height: f64,
    /// Horizontal distance between neighbouring pegs
    pub peg_pitch: f64,
    /// Vertical distance between peg rows
    pub row_pitch: f64,
    pub peg_radius: f64,
    pub ball_radius: f64,

    // === Bins ===
    /// Distance between neighbouring bin centres
    pub bin_pitch: f64,
    /// Capture width of each bin (also used as its height)
    pub bin_width: f64,
    /// Height of the bin centres above the bottom of the board
    pub bin_floor_offset: f64,

    // === Physics ===
    /// Velocity added per tick, pixels/tick
    pub gravity: f64,
    /// Horizontal damping applied on every peg bounce
    pub horizontal_friction: f64,
    /// Vertical damping applied on every peg bounce
    pub vertical_friction: f64,
    /// Fixed-point scale factor for all physics state
    pub fixed_scale: FixedScale,
    /// Drop height of new balls
    pub drop_height: f64,
    /// Ticks a ball may fall before it counts as stuck
    pub max_steps: u32,

    // === Landing table ===
    /// Horizontal resolution of the start-offset sweep, pixels
    pub sweep_step: f64,

    // === Payouts ===
    /// Payout multipliers indexed by bin, left to right
    pub multipliers: Vec<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            peg_pitch: PEG_PITCH,
            row_pitch: ROW_PITCH,
            peg_radius: PEG_RADIUS,
            ball_radius: BALL_RADIUS,

            bin_pitch: BIN_PITCH,
            bin_width: BIN_PITCH,
            bin_floor_offset: BIN_FLOOR_OFFSET,

            gravity: GRAVITY,
            horizontal_friction: HORIZONTAL_FRICTION,
            vertical_friction: VERTICAL_FRICTION,
            fixed_scale: FixedScale::default(),
            drop_height: DROP_HEIGHT,
            max_steps: MAX_STEPS,

            sweep_step: SWEEP_STEP,

            multipliers: DEFAULT_MULTIPLIERS.to_vec(),
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of bins (one more than the row count)
    pub fn bin_count(&self) -> usize {
        self.rows as usize + 1
    }

    /// Build the payout table these settings describe
    pub fn multiplier_table(&self) -> Result<MultiplierTable, ConfigError> {
        MultiplierTable::from_multipliers(self.rows, &self.multipliers)
    }

    /// Reject settings the core cannot serve
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(invalid("rows", format!("must be in 1..={MAX_ROWS}, got {}", self.rows)));
        }

        for (name, value) in [
            ("board_width", self.board_width),
            ("board_height", self.board_height),
            ("peg_pitch", self.peg_pitch),
            ("row_pitch", self.row_pitch),
            ("peg_radius", self.peg_radius),
            ("ball_radius", self.ball_radius),
            ("bin_pitch", self.bin_pitch),
            ("bin_width", self.bin_width),
            ("gravity", self.gravity),
            ("sweep_step", self.sweep_step),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, format!("must be positive, got {value}")));
            }
        }

        for (name, value) in [
            ("horizontal_friction", self.horizontal_friction),
            ("vertical_friction", self.vertical_friction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(name, format!("must be in (0, 1], got {value}")));
            }
        }

        if self.bin_width > self.bin_pitch {
            return Err(invalid(
                "bin_width",
                format!("{} exceeds bin_pitch {}: bins would overlap", self.bin_width, self.bin_pitch),
            ));
        }

        let bins_span = self.bin_pitch * self.bin_count() as f64;
        if bins_span > self.board_width {
            return Err(invalid(
                "bin_pitch",
                format!("{} bins need {bins_span}px, board is {}px wide", self.bin_count(), self.board_width),
            ));
        }

        let bottom_row_y = (self.rows + 1) as f64 * self.row_pitch;
        let bin_top = self.board_height - self.bin_floor_offset - self.bin_width / 2.0;
        if bin_top <= bottom_row_y {
            return Err(invalid(
                "bin_floor_offset",
                format!("bin tops at y={bin_top} overlap the last peg row at y={bottom_row_y}"),
            ));
        }

        if !(self.drop_height >= 0.0 && self.drop_height < 2.0 * self.row_pitch) {
            return Err(invalid(
                "drop_height",
                format!("must lie in the empty drop space above the first peg row, got {}", self.drop_height),
            ));
        }

        if self.max_steps == 0 {
            return Err(invalid("max_steps", "must be positive".to_string()));
        }

        // Scaled coordinates, and the fastest a ball can fall, must stay well
        // inside i64 so sums like `pos + vel` and `center + width / 2` cannot overflow.
        let factor = self.fixed_scale.factor();
        let extent = self.board_width.max(self.board_height) + self.max_steps as f64 * self.gravity;
        if extent * factor as f64 * SCALE_HEADROOM >= i64::MAX as f64 {
            return Err(ConfigError::InvalidScale(factor));
        }

        if self.fixed_scale.scale(self.sweep_step) < 1 {
            return Err(invalid(
                "sweep_step",
                format!("{} is finer than the fixed-point grid 1/{factor}", self.sweep_step),
            ));
        }

        self.multiplier_table()?;
        Ok(())
    }
}

/// Margin kept between the largest scaled quantity and `i64::MAX`
const SCALE_HEADROOM: f64 = 16.0;

fn invalid(name: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidParameter { name, reason }
}
