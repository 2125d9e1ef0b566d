//! Ball–peg collision detection and response
//!
//! Detection runs on scaled integer positions; only the distance and contact
//! angle are computed in floating point. The response is not a reflection:
//! the pre-bounce speed is redirected along the contact normal and damped per
//! axis.
//!
//! Landing tables are built by replaying this exact arithmetic. Any change to
//! the formulas or constants here invalidates every previously swept offset.

use glam::I64Vec2;

use crate::fixed::{FixedScale, Fx};

/// Contact between a ball and a peg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PegContact {
    /// Angle of the contact normal, pointing from the peg centre to the ball centre
    pub angle: f64,
    /// Centre-to-centre distance, scaled
    pub distance: f64,
}

/// Check a ball against one peg.
///
/// `reach` is the scaled sum of both radii.
#[inline]
pub fn ball_peg_contact(ball_pos: I64Vec2, peg_pos: I64Vec2, reach: Fx) -> Option<PegContact> {
    let delta = ball_pos - peg_pos;
    // hypot(dx, dy) >= max(|dx|, |dy|), so this rejection never changes the answer
    if delta.x.abs() >= reach || delta.y.abs() >= reach {
        return None;
    }

    let d = delta.as_dvec2();
    let distance = d.x.hypot(d.y);
    if distance < reach as f64 {
        Some(PegContact {
            angle: d.y.atan2(d.x),
            distance,
        })
    } else {
        None
    }
}

/// Velocity after bouncing off a peg.
///
/// The pre-bounce speed magnitude is redirected along the contact normal and
/// damped by the per-axis friction, then truncated back onto the grid.
#[inline]
pub fn bounce_velocity(
    velocity: I64Vec2,
    contact: &PegContact,
    horizontal_friction: f64,
    vertical_friction: f64,
) -> I64Vec2 {
    let v = velocity.as_dvec2();
    let speed = v.x.hypot(v.y);
    I64Vec2::new(
        (contact.angle.cos() * speed * horizontal_friction) as Fx,
        (contact.angle.sin() * speed * vertical_friction) as Fx,
    )
}

/// Displacement that pushes the ball out of the peg along the contact normal.
///
/// The overlap is measured in whole units against the floored distance, so
/// a ball is always pushed at least to the edge of the peg.
#[inline]
pub fn separation(contact: &PegContact, reach: Fx, fixed: FixedScale) -> I64Vec2 {
    let overlap = fixed.to_real(reach) - fixed.unscale_real(contact.distance) as f64;
    I64Vec2::new(
        fixed.scale(contact.angle.cos() * overlap),
        fixed.scale(contact.angle.sin() * overlap),
    )
}
