//! Fixed timestep scheduler
//!
//! Drives any number of independent balls, one update per ball per tick.
//! Balls never collide with each other; each only reads the shared board.

use std::sync::Arc;

use glam::{DVec2, I64Vec2};
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::state::{Ball, BallId, BallState, PhysicsParams};
use crate::error::SimError;
use crate::fixed::{FixedScale, Fx};

/// Something that happened to a ball during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BallEvent {
    /// The ball came to rest in a bin and left the active set
    Captured { id: BallId, bin: usize, start_x: Fx },
    /// The ball could not be resolved and was dropped
    Failed { id: BallId, error: SimError },
}

/// Position of an active ball, for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub id: BallId,
    pub pos: DVec2,
    pub color: u32,
}

/// Owns the active balls and advances them in lockstep
#[derive(Debug)]
pub struct Scheduler {
    board: Arc<Board>,
    params: PhysicsParams,
    /// Active balls, sorted by id for deterministic iteration
    balls: Vec<Ball>,
    next_id: BallId,
    time_ticks: u64,
    stopped: bool,
}

impl Scheduler {
    pub fn new(board: Arc<Board>, params: PhysicsParams) -> Self {
        Self {
            board,
            params,
            balls: Vec::new(),
            next_id: 1,
            time_ticks: 0,
            stopped: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Drop a new ball; allowed between any two ticks
    pub fn spawn(&mut self, start_x: Fx) -> Option<BallId> {
        if self.stopped {
            log::warn!("Ignoring drop at {start_x}: scheduler is stopped");
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.balls.push(Ball::new(id, start_x, &self.board));
        Some(id)
    }

    /// Advance every active ball by one timestep.
    ///
    /// Balls captured or failed during this tick are removed and reported.
    pub fn tick(&mut self) -> Vec<BallEvent> {
        if self.stopped {
            return Vec::new();
        }
        self.time_ticks += 1;

        let mut events = Vec::new();
        let board = &self.board;
        let params = &self.params;
        self.balls.retain_mut(|ball| match ball.step(board, params) {
            Ok(BallState::Falling) => true,
            Ok(BallState::Captured { bin }) => {
                events.push(BallEvent::Captured {
                    id: ball.id,
                    bin,
                    start_x: ball.start_x,
                });
                false
            }
            Err(error) => {
                log::error!("Dropping ball {} (start {}): {error}", ball.id, ball.start_x);
                events.push(BallEvent::Failed { id: ball.id, error });
                false
            }
        });
        events
    }

    /// Tick until no ball is left (or the scheduler is stopped)
    pub fn run_until_idle(&mut self) -> Vec<BallEvent> {
        let mut events = Vec::new();
        // Every ball terminates within max_steps, so this loop is bounded
        while !self.is_idle() {
            events.extend(self.tick());
        }
        events
    }

    /// Halt immediately; in-flight balls are discarded
    pub fn stop(&mut self) {
        if !self.balls.is_empty() {
            log::info!("Stopping scheduler with {} balls in flight", self.balls.len());
        }
        self.balls.clear();
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// True when there is nothing left to tick
    pub fn is_idle(&self) -> bool {
        self.stopped || self.balls.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.balls.len()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Current positions of every active ball
    pub fn snapshot(&self) -> Vec<BallSnapshot> {
        let fixed = self.board.fixed();
        self.balls
            .iter()
            .map(|ball| BallSnapshot {
                id: ball.id,
                pos: ball.position(fixed),
                color: ball.color,
            })
            .collect()
    }
}

/// Complete path of one simulated drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTrace {
    pub start_x: Fx,
    /// Scaled ball centre for every frame, starting at the drop point
    pub positions: Vec<I64Vec2>,
    pub captured_bin: usize,
    pub fixed: FixedScale,
}

impl DropTrace {
    /// Frame positions in board units
    pub fn frames(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.positions
            .iter()
            .map(|p| DVec2::new(self.fixed.to_real(p.x), self.fixed.to_real(p.y)))
    }

    /// Ticks taken to land
    pub fn ticks(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }
}

/// Run a single ball from `start_x` until a bin catches it
pub fn trace(board: &Board, params: &PhysicsParams, start_x: Fx) -> Result<DropTrace, SimError> {
    let mut ball = Ball::new(0, start_x, board);
    let mut positions = vec![ball.pos];
    loop {
        let state = ball.step(board, params)?;
        positions.push(ball.pos);
        if let BallState::Captured { bin } = state {
            return Ok(DropTrace {
                start_x,
                positions,
                captured_bin: bin,
                fixed: board.fixed(),
            });
        }
    }
}

/// Run a single ball without recording frames; used by the landing sweep
pub fn land(board: &Board, params: &PhysicsParams, start_x: Fx) -> Result<usize, SimError> {
    let mut ball = Ball::new(0, start_x, board);
    loop {
        if let BallState::Captured { bin } = ball.step(board, params)? {
            return Ok(bin);
        }
    }
}
