//! The Plinko facade
//!
//! Ties the three parts together: the outcome generator decides the bin, the
//! landing table supplies a start offset known to land there, and the physics
//! replays the drop for display. The outcome is authoritative; the physics is
//! only ever asked to confirm it.

use std::sync::Arc;

use rand::{Rng, TryRngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, SimError};
use crate::fixed::Fx;
use crate::landing::LandingTable;
use crate::outcome::{OutcomeGenerator, OutcomeRecord};
use crate::settings::Settings;
use crate::sim::{Board, DropTrace, PhysicsParams, Scheduler, trace};

/// A settled play plus the drop that shows it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub outcome: OutcomeRecord,
    /// Scaled start offset that lands in `outcome.bin_index`
    pub start_x: Fx,
    /// The same offset in board units
    pub point: f64,
}

/// Validated board, verified landing table and outcome generator
#[derive(Debug)]
pub struct Plinko {
    settings: Settings,
    board: Arc<Board>,
    params: PhysicsParams,
    landing: LandingTable,
    generator: OutcomeGenerator,
}

impl Plinko {
    /// Validate `settings`, lay out the board and sweep the landing table.
    ///
    /// Nothing is served until every bin has a verified offset.
    pub fn new(settings: Settings) -> Result<Self> {
        let board = Board::build(&settings)?;
        let params = PhysicsParams::from_settings(&settings);
        let landing = LandingTable::build(&board, &params, settings.sweep_step)?;
        let generator = OutcomeGenerator::new(board.multipliers().clone());

        log::info!(
            "Plinko ready: {} rows, {} bins, expected value {:.4}",
            board.rows(),
            board.bin_count(),
            generator.table().expected_value()
        );

        Ok(Self {
            settings,
            board: Arc::new(board),
            params,
            landing,
            generator,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn landing(&self) -> &LandingTable {
        &self.landing
    }

    pub fn generator(&self) -> &OutcomeGenerator {
        &self.generator
    }

    /// Draw the authoritative outcome for one play
    pub fn generate_outcome<R>(&self, rng: &mut R, wager: u64) -> Result<OutcomeRecord>
    where
        R: TryRngCore + ?Sized,
    {
        Ok(self.generator.next_outcome(rng, wager)?)
    }

    /// The canonical start offset for `bin`
    pub fn start_offset(&self, bin: usize) -> Result<Fx> {
        Ok(self.landing.lookup(bin)?)
    }

    /// Replay the canonical drop into `bin`.
    ///
    /// The trace always ends in `bin`; anything else is reported as a mismatch.
    pub fn simulate_drop(&self, bin: usize) -> Result<DropTrace> {
        let start_x = self.landing.lookup(bin)?;
        let drop = self.simulate_from(start_x)?;
        if drop.captured_bin != bin {
            log::error!(
                "Offset {start_x} landed in bin {} instead of {bin}",
                drop.captured_bin
            );
            return Err(SimError::Mismatch {
                expected: bin,
                captured: drop.captured_bin,
            }
            .into());
        }
        Ok(drop)
    }

    /// Run one ball from an arbitrary offset
    pub fn simulate_from(&self, start_x: Fx) -> Result<DropTrace> {
        trace(&self.board, &self.params, start_x).map_err(|err| {
            log::error!("Drop from {start_x} failed: {err}");
            Error::from(err)
        })
    }

    /// Settle a wager and choose a verified offset for its drop
    pub fn play<R: Rng>(&self, rng: &mut R, wager: u64) -> Result<Play> {
        let outcome = self.generator.next_outcome(rng, wager)?;
        let start_x = self.landing.pick(outcome.bin_index, rng)?;
        log::debug!(
            "Play: bin {} pays {} on {} from offset {start_x}",
            outcome.bin_index,
            outcome.payout,
            outcome.wager
        );
        Ok(Play {
            outcome,
            start_x,
            point: self.board.fixed().to_real(start_x),
        })
    }

    /// A fresh scheduler sharing this board
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Arc::clone(&self.board), self.params)
    }
}
