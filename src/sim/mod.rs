//! Deterministic simulation module
//!
//! All ball physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Scaled integer state; floats only inside a single collision test
//! - Stable iteration order (pegs by row, bins left to right, balls by ID)
//! - No rendering or platform dependencies

pub mod board;
pub mod collision;
pub mod state;
pub mod tick;

pub use board::{Bin, Board, FIRST_PEG_ROW, Peg};
pub use collision::{PegContact, ball_peg_contact, bounce_velocity, separation};
pub use state::{BALL_COLOR, Ball, BallId, BallState, PhysicsParams};
pub use tick::{BallEvent, BallSnapshot, DropTrace, Scheduler, land, trace};
