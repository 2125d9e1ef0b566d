//! Static board layout: a triangular peg lattice above a row of bins
//!
//! Built once from validated settings and shared read-only (behind an `Arc`)
//! by the landing table, the scheduler and every ball.

use glam::I64Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fixed::{FixedScale, Fx};
use crate::outcome::MultiplierTable;
use crate::settings::Settings;

/// The first peg row; rows above it are empty drop space
pub const FIRST_PEG_ROW: u32 = 2;

/// A fixed circular obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peg {
    /// Centre, scaled
    pub pos: I64Vec2,
    /// Radius, scaled
    pub radius: Fx,
    pub row: u32,
    pub col: u32,
}

/// A capture bucket at the bottom of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    pub index: usize,
    /// Centre, scaled
    pub center: I64Vec2,
    pub width: Fx,
    pub height: Fx,
    /// Payout in basis points (10_000 = 1x)
    pub multiplier_bp: u32,
}

impl Bin {
    #[inline]
    pub fn left(&self) -> Fx {
        self.center.x - self.width / 2
    }

    #[inline]
    pub fn right(&self) -> Fx {
        self.center.x + self.width / 2
    }

    #[inline]
    pub fn top(&self) -> Fx {
        self.center.y - self.height / 2
    }

    /// Capture test against a grid-snapped ball position.
    ///
    /// Edges are exclusive so neighbouring bins sharing an edge never both match.
    #[inline]
    pub fn captures(&self, snapped: I64Vec2, ball_radius: Fx) -> bool {
        snapped.x > self.left() && snapped.x < self.right() && snapped.y + ball_radius > self.top()
    }
}

/// Immutable peg and bin layout plus the fixed-point scale it was built with
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    fixed: FixedScale,
    rows: u32,
    width: Fx,
    height: Fx,
    drop_y: Fx,
    ball_radius: Fx,
    pegs: Vec<Peg>,
    bins: Vec<Bin>,
    multipliers: MultiplierTable,
}

impl Board {
    /// Lay out pegs and bins for validated settings
    pub fn build(settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let multipliers = settings.multiplier_table()?;
        let fixed = settings.fixed_scale;
        let mid = settings.board_width / 2.0;

        let mut pegs = Vec::new();
        for row in FIRST_PEG_ROW..=settings.rows + 1 {
            let y = row as f64 * settings.row_pitch;
            for col in 0..=row {
                let x = mid - settings.peg_pitch * (row as f64 / 2.0 - col as f64);
                pegs.push(Peg {
                    pos: I64Vec2::new(fixed.scale(x), fixed.scale(y)),
                    radius: fixed.scale(settings.peg_radius),
                    row,
                    col,
                });
            }
        }

        let bin_count = settings.bin_count();
        let center_offset = (bin_count - 1) as f64 / 2.0;
        let bin_y = settings.board_height - settings.bin_floor_offset;
        let bins = (0..bin_count)
            .map(|index| {
                let x = mid + settings.bin_pitch * (index as f64 - center_offset);
                Bin {
                    index,
                    center: I64Vec2::new(fixed.scale(x), fixed.scale(bin_y)),
                    width: fixed.scale(settings.bin_width),
                    height: fixed.scale(settings.bin_width),
                    multiplier_bp: multipliers.basis_points()[index],
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Built board: {} rows, {} pegs, {} bins, scale {}",
            settings.rows,
            pegs.len(),
            bins.len(),
            fixed.factor()
        );

        Ok(Self {
            fixed,
            rows: settings.rows,
            width: fixed.scale(settings.board_width),
            height: fixed.scale(settings.board_height),
            drop_y: fixed.scale(settings.drop_height),
            ball_radius: fixed.scale(settings.ball_radius),
            pegs,
            bins,
            multipliers,
        })
    }

    #[inline]
    pub fn fixed(&self) -> FixedScale {
        self.fixed
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn width(&self) -> Fx {
        self.width
    }

    pub fn height(&self) -> Fx {
        self.height
    }

    /// Starting height of new balls, scaled
    pub fn drop_y(&self) -> Fx {
        self.drop_y
    }

    pub fn ball_radius(&self) -> Fx {
        self.ball_radius
    }

    /// Pegs ordered by row, then column
    pub fn pegs(&self) -> &[Peg] {
        &self.pegs
    }

    /// Bins ordered left to right
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn bin(&self, index: usize) -> Option<&Bin> {
        self.bins.get(index)
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn multipliers(&self) -> &MultiplierTable {
        &self.multipliers
    }

    /// The bin physically centred on the board
    pub fn center_bin(&self) -> usize {
        self.rows as usize / 2
    }

    /// Left edge of the first bin and right edge of the last, scaled
    pub fn bin_span(&self) -> (Fx, Fx) {
        match (self.bins.first(), self.bins.last()) {
            (Some(first), Some(last)) => (first.left(), last.right()),
            _ => (0, self.width),
        }
    }

    /// First bin (left to right) that captures a ball at `pos`
    pub fn capture(&self, pos: I64Vec2, ball_radius: Fx) -> Option<usize> {
        let snapped = I64Vec2::new(self.fixed.snap(pos.x), self.fixed.snap(pos.y));
        self.bins
            .iter()
            .find(|bin| bin.captures(snapped, ball_radius))
            .map(|bin| bin.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_board() -> Board {
        Board::build(&Settings::default()).unwrap()
    }

    #[test]
    fn test_peg_lattice() {
        let board = default_board();
        // Rows 2..=17 hold 3..=18 pegs
        assert_eq!(board.pegs().len(), (3..=18).sum::<usize>());

        let first = board.pegs()[0];
        assert_eq!((first.row, first.col), (2, 0));
        assert_eq!(first.pos, I64Vec2::new(3_640_000, 700_000));
        assert_eq!(first.radius, 40_000);

        // Rows are centred under the midpoint
        for row in FIRST_PEG_ROW..=17 {
            let in_row: Vec<_> = board.pegs().iter().filter(|p| p.row == row).collect();
            assert_eq!(in_row.len(), row as usize + 1);
            let left = in_row.first().unwrap().pos.x;
            let right = in_row.last().unwrap().pos.x;
            assert_eq!(left + right, 2 * 4_000_000);
        }
    }

    #[test]
    fn test_bins_are_symmetric_and_disjoint() {
        let board = default_board();
        assert_eq!(board.bin_count(), 17);
        assert_eq!(board.center_bin(), 8);
        assert_eq!(board.bins()[8].center.x, 4_000_000);

        for pair in board.bins().windows(2) {
            assert!(pair[0].right() <= pair[1].left());
        }
        for bin in board.bins() {
            let mirror = &board.bins()[16 - bin.index];
            assert_eq!(bin.center.x + mirror.center.x, 2 * 4_000_000);
            assert_eq!(bin.multiplier_bp, mirror.multiplier_bp);
        }
        assert_eq!(board.bin_span(), (940_000, 7_060_000));
    }

    #[test]
    fn test_capture_uses_floored_position() {
        let board = default_board();
        let radius = board.ball_radius();
        let bin = board.bins()[8];
        let top = bin.top();

        // Bottom edge not yet past the top of the bin
        assert_eq!(board.capture(I64Vec2::new(4_000_000, top - radius), radius), None);
        // One whole unit lower it is
        assert_eq!(
            board.capture(I64Vec2::new(4_000_000, top - radius + 10_000), radius),
            Some(8)
        );
        // Fractional part is floored away before the test
        assert_eq!(board.capture(I64Vec2::new(4_000_000, top - radius + 9_999), radius), None);
    }

    #[test]
    fn test_shared_edge_captures_nothing() {
        let board = default_board();
        let radius = board.ball_radius();
        let edge = board.bins()[8].right();
        let y = board.bins()[8].top();
        assert_eq!(board.capture(I64Vec2::new(edge, y), radius), None);
        assert_eq!(board.capture(I64Vec2::new(edge + 10_000, y), radius), Some(9));
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let settings = Settings {
            rows: 12,
            ..Settings::default()
        };
        assert!(matches!(
            Board::build(&settings),
            Err(ConfigError::MultiplierCount { .. })
        ));
    }
}
