//! Authoritative outcome generation
//!
//! Each play is a random walk of `rows` independent left/right steps. The
//! number of right steps is the bin index, so bin probabilities follow the
//! binomial distribution and the multiplier table sets the house edge.
//!
//! Generation is a pure function of the random source: there is no hidden
//! state, and a seeded source replays the same outcomes.

use rand::TryRngCore;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ROWS, MULTIPLIER_SCALE};
use crate::error::{ConfigError, OutcomeError};

/// One step of the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

/// Payout multipliers in basis points, indexed by bin (0 = leftmost)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierTable {
    rows: u32,
    basis_points: Vec<u32>,
}

impl MultiplierTable {
    /// Validate a table of real multipliers for a board with `rows` rows
    pub fn from_multipliers(rows: u32, multipliers: &[f64]) -> Result<Self, ConfigError> {
        if let Some(bad) = multipliers.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
            return Err(ConfigError::InvalidParameter {
                name: "multipliers",
                reason: format!("multipliers must be positive, got {bad}"),
            });
        }
        let basis_points = multipliers
            .iter()
            .map(|m| (m * MULTIPLIER_SCALE as f64).round() as u32)
            .collect();
        Self::new(rows, basis_points)
    }

    /// Validate a table already expressed in basis points
    pub fn new(rows: u32, basis_points: Vec<u32>) -> Result<Self, ConfigError> {
        if rows == 0 || rows > MAX_ROWS {
            return Err(ConfigError::InvalidParameter {
                name: "rows",
                reason: format!("must be in 1..={MAX_ROWS}, got {rows}"),
            });
        }
        let expected = rows as usize + 1;
        if basis_points.len() != expected {
            return Err(ConfigError::MultiplierCount {
                rows,
                expected,
                found: basis_points.len(),
            });
        }
        if basis_points.contains(&0) {
            return Err(ConfigError::InvalidParameter {
                name: "multipliers",
                reason: "multipliers must be positive".to_string(),
            });
        }
        for index in 0..expected / 2 {
            let mirror = rows as usize - index;
            if basis_points[index] != basis_points[mirror] {
                return Err(ConfigError::AsymmetricMultipliers {
                    index,
                    mirror,
                    left: basis_points[index],
                    right: basis_points[mirror],
                });
            }
        }

        let table = Self { rows, basis_points };
        let expected_value = table.expected_value();
        if expected_value >= 1.0 {
            return Err(ConfigError::NoHouseEdge { expected_value });
        }
        Ok(table)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.basis_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basis_points.is_empty()
    }

    pub fn basis_points(&self) -> &[u32] {
        &self.basis_points
    }

    pub fn get(&self, bin: usize) -> Option<u32> {
        self.basis_points.get(bin).copied()
    }

    /// Multiplier for a bin as a real number (display only)
    pub fn multiplier(&self, bin: usize) -> Option<f64> {
        self.get(bin).map(|bp| bp as f64 / MULTIPLIER_SCALE as f64)
    }

    /// Expected return per unit wagered: Σ C(n, k) · m(k) / 2ⁿ
    pub fn expected_value(&self) -> f64 {
        let n = self.rows as u64;
        let mut coefficient: u128 = 1;
        let mut numerator: u128 = 0;
        for (k, &bp) in self.basis_points.iter().enumerate() {
            numerator += coefficient * bp as u128;
            // C(n, k+1) = C(n, k) · (n - k) / (k + 1), exact at every step
            coefficient = coefficient * (n - k as u64) as u128 / (k as u128 + 1);
        }
        let denominator = (1u128 << n) * MULTIPLIER_SCALE as u128;
        numerator as f64 / denominator as f64
    }
}

/// The authoritative result of one play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Bin index, equal to the number of right steps
    pub bin_index: usize,
    pub pattern: Vec<Step>,
    /// Payout multiplier in basis points
    pub multiplier_bp: u32,
    /// Stake in minor currency units
    pub wager: u64,
    /// Amount returned to the player, floored to minor units
    pub payout: u64,
    /// `payout - wager`
    pub profit: i64,
}

impl OutcomeRecord {
    pub fn multiplier(&self) -> f64 {
        self.multiplier_bp as f64 / MULTIPLIER_SCALE as f64
    }

    pub fn right_steps(&self) -> usize {
        self.pattern.iter().filter(|s| **s == Step::Right).count()
    }
}

/// Draws outcomes against a validated multiplier table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeGenerator {
    table: MultiplierTable,
}

impl OutcomeGenerator {
    pub fn new(table: MultiplierTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MultiplierTable {
        &self.table
    }

    pub fn rows(&self) -> u32 {
        self.table.rows()
    }

    /// Draw a fresh outcome.
    ///
    /// Fails closed: if the random source errors, no record is produced.
    pub fn next_outcome<R>(&self, rng: &mut R, wager: u64) -> Result<OutcomeRecord, OutcomeError>
    where
        R: TryRngCore + ?Sized,
    {
        if wager == 0 {
            return Err(OutcomeError::ZeroWager);
        }

        let mut pattern = Vec::with_capacity(self.rows() as usize);
        for _ in 0..self.rows() {
            let bits = rng
                .try_next_u32()
                .map_err(|e| OutcomeError::RandomSource(e.to_string()))?;
            // Top bit: one fair coin per step
            pattern.push(if bits >> 31 == 1 { Step::Right } else { Step::Left });
        }

        self.settle(pattern, wager)
    }

    /// Settle a known step pattern (replays and audits)
    pub fn settle(&self, pattern: Vec<Step>, wager: u64) -> Result<OutcomeRecord, OutcomeError> {
        if wager == 0 {
            return Err(OutcomeError::ZeroWager);
        }
        if pattern.len() != self.rows() as usize {
            return Err(OutcomeError::PatternLength {
                rows: self.rows(),
                found: pattern.len(),
            });
        }

        let bin_index = pattern.iter().filter(|s| **s == Step::Right).count();
        // Pattern length equals rows, so the index is always in the table
        let multiplier_bp = self.table.basis_points()[bin_index];

        let payout = wager as u128 * multiplier_bp as u128 / MULTIPLIER_SCALE as u128;
        let payout = u64::try_from(payout).map_err(|_| OutcomeError::PayoutOverflow { wager })?;
        let profit = i64::try_from(payout as i128 - wager as i128)
            .map_err(|_| OutcomeError::PayoutOverflow { wager })?;

        Ok(OutcomeRecord {
            bin_index,
            pattern,
            multiplier_bp,
            wager,
            payout,
            profit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_MULTIPLIERS;
    use proptest::prelude::*;
    use rand::{RngCore, SeedableRng};
    use rand_pcg::Pcg32;

    fn default_generator() -> OutcomeGenerator {
        OutcomeGenerator::new(MultiplierTable::from_multipliers(16, &DEFAULT_MULTIPLIERS).unwrap())
    }

    /// Always reports an unavailable source
    struct BrokenSource;

    impl TryRngCore for BrokenSource {
        type Error = std::io::Error;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Err(std::io::Error::other("entropy pool offline"))
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Err(std::io::Error::other("entropy pool offline"))
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> Result<(), Self::Error> {
            Err(std::io::Error::other("entropy pool offline"))
        }
    }

    /// Replays a fixed sequence of coin flips
    struct ScriptedCoins(Vec<bool>, usize);

    impl RngCore for ScriptedCoins {
        fn next_u32(&mut self) -> u32 {
            let right = self.0[self.1 % self.0.len()];
            self.1 += 1;
            if right { u32::MAX } else { 0 }
        }

        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn test_default_table_pays_under_one() {
        let table = default_generator().table().clone();
        let ev = table.expected_value();
        assert!(ev < 1.0);
        assert!((ev - 0.99).abs() < 0.001, "ev = {ev}");
        assert_eq!(table.multiplier(8), Some(0.5));
        assert_eq!(table.get(0), Some(160_000));
    }

    #[test]
    fn test_extreme_patterns() {
        let generator = default_generator();

        let all_right = generator.settle(vec![Step::Right; 16], 100).unwrap();
        assert_eq!(all_right.bin_index, 16);
        assert_eq!(all_right.multiplier(), 16.0);

        let all_left = generator.settle(vec![Step::Left; 16], 100).unwrap();
        assert_eq!(all_left.bin_index, 0);
        assert_eq!(all_left.multiplier(), 16.0);
    }

    #[test]
    fn test_even_split_lands_center_in_any_order() {
        let generator = default_generator();
        let mut alternating = Vec::new();
        for i in 0..16 {
            alternating.push(if i % 2 == 0 { Step::Left } else { Step::Right });
        }
        let mut blocked = vec![Step::Right; 8];
        blocked.extend([Step::Left; 8]);

        for pattern in [alternating, blocked] {
            let record = generator.settle(pattern, 1_000).unwrap();
            assert_eq!(record.bin_index, 8);
            assert_eq!(record.multiplier(), 0.5);
            assert_eq!(record.payout, 500);
            assert_eq!(record.profit, -500);
        }
    }

    #[test]
    fn test_scripted_source_drives_the_walk() {
        let generator = default_generator();
        let mut coins = ScriptedCoins(vec![true], 0);
        let record = generator.next_outcome(&mut coins, 250).unwrap();
        assert_eq!(record.bin_index, 16);
        assert_eq!(record.payout, 4_000);
        assert_eq!(record.profit, 3_750);

        let mut coins = ScriptedCoins(vec![false], 0);
        assert_eq!(generator.next_outcome(&mut coins, 1).unwrap().bin_index, 0);
    }

    #[test]
    fn test_payout_floors_to_minor_units() {
        let generator = default_generator();
        // 1.1x of 7 = 7.7 → 7
        let mut pattern = vec![Step::Right; 6];
        pattern.extend([Step::Left; 10]);
        let record = generator.settle(pattern, 7).unwrap();
        assert_eq!(record.multiplier_bp, 11_000);
        assert_eq!(record.payout, 7);
        assert_eq!(record.profit, 0);
    }

    #[test]
    fn test_fails_closed_without_randomness() {
        let generator = default_generator();
        let err = generator.next_outcome(&mut BrokenSource, 100).unwrap_err();
        assert!(matches!(err, OutcomeError::RandomSource(_)));
    }

    #[test]
    fn test_rejects_zero_wager_and_bad_patterns() {
        let generator = default_generator();
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(matches!(
            generator.next_outcome(&mut rng, 0),
            Err(OutcomeError::ZeroWager)
        ));
        assert!(matches!(
            generator.settle(vec![Step::Left; 15], 10),
            Err(OutcomeError::PatternLength { rows: 16, found: 15 })
        ));
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let generator = default_generator();
        let mut a = Pcg32::seed_from_u64(2024);
        let mut b = Pcg32::seed_from_u64(2024);
        for _ in 0..100 {
            assert_eq!(
                generator.next_outcome(&mut a, 10).unwrap(),
                generator.next_outcome(&mut b, 10).unwrap()
            );
        }
    }

    #[test]
    fn test_ten_thousand_draws_hold_the_walk_invariants() {
        let generator = default_generator();
        let mut rng = Pcg32::seed_from_u64(0xC0FFEE);
        let mut counts = [0usize; 17];
        for _ in 0..10_000 {
            let record = generator.next_outcome(&mut rng, 100).unwrap();
            assert!(record.bin_index <= 16);
            assert_eq!(record.pattern.len(), 16);
            assert_eq!(record.right_steps(), record.bin_index);
            counts[record.bin_index] += 1;
        }
        // Binomial: the centre bin is the most common by a wide margin
        let center = counts[8];
        assert!(counts.iter().all(|&c| c <= center));
        assert!(center > 1_500 && center < 2_400, "centre hits = {center}");
    }

    #[test]
    fn test_table_validation() {
        assert!(matches!(
            MultiplierTable::from_multipliers(2, &[2.0, 0.5, 1.0]),
            Err(ConfigError::AsymmetricMultipliers { index: 0, mirror: 2, .. })
        ));
        assert!(matches!(
            MultiplierTable::from_multipliers(2, &[2.0, 1.0, 2.0]),
            Err(ConfigError::NoHouseEdge { .. })
        ));
        assert!(matches!(
            MultiplierTable::from_multipliers(2, &[2.0, -1.0, 2.0]),
            Err(ConfigError::InvalidParameter { .. })
        ));
        assert!(MultiplierTable::from_multipliers(2, &[1.2, 0.6, 1.2]).is_ok());
    }

    proptest! {
        #[test]
        fn walk_invariants_hold_for_any_row_count(rows in 1u32..=24, seed in any::<u64>()) {
            let mut bp = vec![5_000u32; rows as usize + 1];
            bp[0] = 9_000;
            bp[rows as usize] = 9_000;
            let generator = OutcomeGenerator::new(MultiplierTable::new(rows, bp).unwrap());
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..50 {
                let record = generator.next_outcome(&mut rng, 1_000).unwrap();
                prop_assert!(record.bin_index <= rows as usize);
                prop_assert_eq!(record.pattern.len(), rows as usize);
                prop_assert_eq!(record.right_steps(), record.bin_index);
            }
        }

        #[test]
        fn multiplier_table_is_symmetric(bin in 0usize..=16) {
            let table = default_generator().table().clone();
            prop_assert_eq!(table.get(bin), table.get(16 - bin));
        }
    }
}
