//! Decimal fixed-point scaling for physics state
//!
//! Positions, velocities and board coordinates are stored as `i64` multiples
//! of `1 / factor`. Real values only appear where trigonometry needs them
//! (contact angle, distance), and are truncated back onto the grid right away.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A scaled integer quantity
pub type Fx = i64;

/// Default scale: four decimal places
pub const DEFAULT_SCALE: Fx = 10_000;

/// The fixed-point scale shared by every component of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct FixedScale(Fx);

impl FixedScale {
    /// Create a scale; the factor must be a positive power of ten
    pub fn new(factor: Fx) -> Result<Self, ConfigError> {
        let mut n = factor;
        while n > 1 && n % 10 == 0 {
            n /= 10;
        }
        if factor <= 0 || n != 1 {
            return Err(ConfigError::InvalidScale(factor));
        }
        Ok(Self(factor))
    }

    #[inline]
    pub fn factor(self) -> Fx {
        self.0
    }

    /// Real → scaled, truncating toward zero
    #[inline]
    pub fn scale(self, x: f64) -> Fx {
        (x * self.0 as f64) as Fx
    }

    /// Scaled → whole units, flooring
    #[inline]
    pub fn unscale(self, v: Fx) -> Fx {
        v.div_euclid(self.0)
    }

    /// Floor of a real-valued scaled quantity (a hypot distance, for instance)
    #[inline]
    pub fn unscale_real(self, v: f64) -> Fx {
        (v / self.0 as f64).floor() as Fx
    }

    /// Whole units → scaled
    #[inline]
    pub fn rescale(self, units: Fx) -> Fx {
        units * self.0
    }

    /// Round a scaled value down onto the whole-unit grid
    #[inline]
    pub fn snap(self, v: Fx) -> Fx {
        self.rescale(self.unscale(v))
    }

    /// Exact real value of a scaled quantity, for trig and rendering
    #[inline]
    pub fn to_real(self, v: Fx) -> f64 {
        v as f64 / self.0 as f64
    }
}

impl Default for FixedScale {
    fn default() -> Self {
        Self(DEFAULT_SCALE)
    }
}

impl TryFrom<i64> for FixedScale {
    type Error = ConfigError;

    fn try_from(factor: i64) -> Result<Self, Self::Error> {
        Self::new(factor)
    }
}

impl From<FixedScale> for i64 {
    fn from(scale: FixedScale) -> Self {
        scale.0
    }
}
