//! WN8 score computation.
//!
//! Pure math over already-collected totals: actual-vs-expected ratios, the
//! published clamped-linear transforms, and the weighted sum. No I/O.

use crate::models::{AggregateStats, ExpectedTotals};

/// Compute an actual/expected ratio.
///
/// A zero or negative expected denominator yields 0, never a division fault.
pub fn ratio(actual: f64, expected: f64) -> f64 {
    if expected > 0.0 {
        actual / expected
    } else {
        0.0
    }
}

/// Compute the WN8 score from (corrected) actual totals and expected totals.
///
/// The constants are fixed by the published WN8 specification. The result is
/// not rounded or clamped; display scaling is the caller's concern.
pub fn wn8(actual: &AggregateStats, expected: &ExpectedTotals) -> f64 {
    let r_dmg = ratio(actual.damage_dealt as f64, expected.damage);
    let r_spot = ratio(actual.spotted as f64, expected.spot);
    let r_kill = ratio(actual.frags as f64, expected.frag);
    let r_def = ratio(actual.dropped_capture_points as f64, expected.defense);
    let r_win = ratio(actual.wins as f64, expected.win);

    let r_dmg_c = ((r_dmg - 0.22) / 0.78).max(0.0);
    let r_spot_c = ((r_spot - 0.38) / 0.62).min(r_dmg_c + 0.1).max(0.0);
    let r_kill_c = ((r_kill - 0.12) / 0.88).min(r_dmg_c + 0.2).max(0.0);
    let r_def_c = ((r_def - 0.10) / 0.90).min(r_dmg_c + 0.1).max(0.0);
    let r_win_c = ((r_win - 0.71) / 0.29).max(0.0);

    980.0 * r_dmg_c
        + 210.0 * r_dmg_c * r_kill_c
        + 155.0 * r_kill_c * r_spot_c
        + 75.0 * r_def_c * r_kill_c
        + 145.0 * r_win_c.min(1.8)
}

/// Win ratio in percent.
pub fn win_ratio(stats: &AggregateStats) -> f64 {
    if stats.battles == 0 {
        0.0
    } else {
        (stats.wins as f64 / stats.battles as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_zero_guard() {
        assert_eq!(ratio(100.0, 0.0), 0.0);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(100.0, -5.0), 0.0);
        assert_eq!(ratio(100.0, 50.0), 2.0);
    }

    #[test]
    fn test_wn8_exactly_average_performance() {
        // All five ratios at exactly 1.0 land on the canonical 1565.
        let actual = AggregateStats {
            battles: 1000,
            damage_dealt: 100_000,
            spotted: 1_000,
            frags: 800,
            dropped_capture_points: 500,
            wins: 490,
        };
        let expected = ExpectedTotals {
            damage: 100_000.0,
            spot: 1_000.0,
            frag: 800.0,
            defense: 500.0,
            win: 490.0,
        };

        let score = wn8(&actual, &expected);
        assert!((score - 1565.0).abs() < 1e-9);
    }

    #[test]
    fn test_wn8_damage_only() {
        // damage_dealt=1000 against exp_damage=1000 gives r_dmg_c = 1.0 and,
        // with everything else at zero, a score of exactly 980.
        let actual = AggregateStats {
            damage_dealt: 1000,
            ..Default::default()
        };
        let expected = ExpectedTotals {
            damage: 1000.0,
            ..Default::default()
        };

        let score = wn8(&actual, &expected);
        assert!((score - 980.0).abs() < 1e-9);
    }

    #[test]
    fn test_wn8_zero_expected_totals_scores_zero() {
        // An account playing only vehicles absent from the reference table
        // has all-zero expected totals, so every ratio and the score are 0.
        let actual = AggregateStats {
            battles: 500,
            damage_dealt: 400_000,
            spotted: 700,
            frags: 600,
            dropped_capture_points: 300,
            wins: 260,
        };

        let score = wn8(&actual, &ExpectedTotals::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_wn8_below_thresholds_clamps_to_zero() {
        // Performance far below the subtraction constants must clamp to 0,
        // never go negative.
        let actual = AggregateStats {
            battles: 100,
            damage_dealt: 100,
            spotted: 1,
            frags: 1,
            dropped_capture_points: 1,
            wins: 1,
        };
        let expected = ExpectedTotals {
            damage: 10_000.0,
            spot: 100.0,
            frag: 100.0,
            defense: 100.0,
            win: 50.0,
        };

        let score = wn8(&actual, &expected);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_wn8_win_contribution_is_capped() {
        // With every other ratio at zero, an absurd win ratio contributes at
        // most 145 * 1.8 = 261.
        let actual = AggregateStats {
            wins: 1_000_000,
            ..Default::default()
        };
        let expected = ExpectedTotals {
            win: 1.0,
            ..Default::default()
        };

        let score = wn8(&actual, &expected);
        assert!((score - 261.0).abs() < 1e-9);
    }

    #[test]
    fn test_wn8_spot_kill_defense_capped_by_damage() {
        // Spot/kill/defense transformed ratios are capped relative to the
        // damage ratio; with r_dmg_c = 0 they cannot exceed their caps even
        // on extreme inputs.
        let actual = AggregateStats {
            spotted: 1_000_000,
            frags: 1_000_000,
            dropped_capture_points: 1_000_000,
            ..Default::default()
        };
        let expected = ExpectedTotals {
            spot: 1.0,
            frag: 1.0,
            defense: 1.0,
            ..Default::default()
        };

        // r_dmg_c = 0, so r_spot_c <= 0.1, r_kill_c <= 0.2, r_def_c <= 0.1.
        let score = wn8(&actual, &expected);
        let max_possible = 155.0 * 0.2 * 0.1 + 75.0 * 0.1 * 0.2;
        assert!(score <= max_possible + 1e-9);
        assert!(score >= 0.0);
    }

    #[test]
    fn test_wn8_is_finite_for_extreme_inputs() {
        let actual = AggregateStats {
            battles: u64::MAX,
            damage_dealt: u64::MAX,
            spotted: u64::MAX,
            frags: u64::MAX,
            dropped_capture_points: u64::MAX,
            wins: u64::MAX,
        };
        let expected = ExpectedTotals {
            damage: 1.0,
            spot: 1.0,
            frag: 1.0,
            defense: 1.0,
            win: 1.0,
        };

        let score = wn8(&actual, &expected);
        assert!(score.is_finite());
        assert!(score >= 0.0);
    }

    #[test]
    fn test_win_ratio() {
        let stats = AggregateStats {
            battles: 1000,
            wins: 520,
            ..Default::default()
        };
        assert!((win_ratio(&stats) - 52.0).abs() < 1e-9);
    }

    #[test]
    fn test_win_ratio_zero_battles() {
        assert_eq!(win_ratio(&AggregateStats::default()), 0.0);
    }
}
