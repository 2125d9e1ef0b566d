//! Landing table: verified start offsets for every bin
//!
//! The outcome is decided before the ball is dropped. To make the physics
//! agree with it, candidate drop offsets are swept across the bin span once
//! at startup, each simulated to the end, and grouped by the bin they land in.
//! A board that leaves any bin without a verified offset is rejected.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SimError};
use crate::fixed::Fx;
use crate::sim::{Board, PhysicsParams, land};

/// Summary of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepStats {
    /// Offsets simulated
    pub candidates: usize,
    /// Offsets that ended in a bin
    pub landed: usize,
    /// Offsets that hit the step limit
    pub stalled: usize,
    /// Offsets that fell past every bin
    pub escaped: usize,
}

/// Start offsets grouped by the bin they land in
#[derive(Debug, Clone, PartialEq)]
pub struct LandingTable {
    /// Ascending offsets per bin
    entries: Vec<Vec<Fx>>,
    params: PhysicsParams,
    stats: SweepStats,
}

impl LandingTable {
    /// Sweep `board` at `sweep_step` (board units) and verify every entry.
    ///
    /// Only valid for the board and physics parameters given here; rebuild the
    /// table whenever either changes.
    pub fn build(
        board: &Board,
        params: &PhysicsParams,
        sweep_step: f64,
    ) -> Result<Self, ConfigError> {
        let fixed = board.fixed();
        let step = fixed.scale(sweep_step).max(1);
        let (left, right) = board.bin_span();

        let mut entries = vec![Vec::new(); board.bin_count()];
        let mut stats = SweepStats::default();

        let mut start_x = left;
        while start_x <= right {
            stats.candidates += 1;
            match land(board, params, start_x) {
                Ok(bin) => {
                    stats.landed += 1;
                    entries[bin].push(start_x);
                }
                Err(err @ SimError::Escaped { .. }) => {
                    stats.escaped += 1;
                    log::debug!("Discarding offset {start_x}: {err}");
                }
                Err(err) => {
                    stats.stalled += 1;
                    log::debug!("Discarding offset {start_x}: {err}");
                }
            }
            start_x += step;
        }

        if stats.stalled + stats.escaped > 0 {
            log::warn!(
                "Landing sweep discarded {} stalled and {} escaped offsets",
                stats.stalled,
                stats.escaped
            );
        }

        for (bin, offsets) in entries.iter().enumerate() {
            if offsets.is_empty() {
                log::error!("Bin {bin} is unreachable from {} offsets", stats.candidates);
                return Err(ConfigError::UnreachableBin {
                    bin,
                    candidates: stats.candidates,
                });
            }
            // Second pass: the table only ever serves offsets that replay
            for &start_x in offsets {
                match land(board, params, start_x) {
                    Ok(captured) if captured == bin => {}
                    Ok(captured) => {
                        return Err(ConfigError::LandingVerification {
                            bin,
                            start_x,
                            reason: format!("replay landed in bin {captured}"),
                        });
                    }
                    Err(err) => {
                        return Err(ConfigError::LandingVerification {
                            bin,
                            start_x,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }

        log::info!(
            "Landing table ready: {} bins, {} of {} offsets landed (min {} per bin)",
            entries.len(),
            stats.landed,
            stats.candidates,
            entries.iter().map(Vec::len).min().unwrap_or(0)
        );

        Ok(Self {
            entries,
            params: *params,
            stats,
        })
    }

    /// The canonical offset for `bin`: the median verified candidate
    pub fn lookup(&self, bin: usize) -> Result<Fx, SimError> {
        let offsets = self.candidates(bin)?;
        Ok(offsets[offsets.len() / 2])
    }

    /// A uniformly chosen verified offset for `bin`
    pub fn pick<R: Rng>(&self, bin: usize, rng: &mut R) -> Result<Fx, SimError> {
        let offsets = self.candidates(bin)?;
        Ok(offsets[rng.random_range(0..offsets.len())])
    }

    /// Every verified offset for `bin`, ascending
    pub fn candidates(&self, bin: usize) -> Result<&[Fx], SimError> {
        self.entries
            .get(bin)
            .map(Vec::as_slice)
            .ok_or(SimError::UnknownBin(bin))
    }

    /// Number of bins covered
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn stats(&self) -> SweepStats {
        self.stats
    }
}
