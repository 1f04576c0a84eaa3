pub const FLAT_INCOME_TAX_RATE: f64 = 0.15;

#[derive(Debug, Clone, Copy)]
pub struct TaxBracket {
    pub lower: f64,
    pub upper: Option<f64>,
    pub rate: f64,
}

pub const CAPITAL_GAINS_BRACKETS: [TaxBracket; 4] = [
    TaxBracket {
        lower: 0.0,
        upper: Some(5_000_000.0),
        rate: 0.15,
    },
    TaxBracket {
        lower: 5_000_000.0,
        upper: Some(10_000_000.0),
        rate: 0.175,
    },
    TaxBracket {
        lower: 10_000_000.0,
        upper: Some(30_000_000.0),
        rate: 0.20,
    },
    TaxBracket {
        lower: 30_000_000.0,
        upper: None,
        rate: 0.225,
    },
];

pub fn progressive_capital_gains(profit: f64) -> f64 {
    if profit <= 0.0 {
        return 0.0;
    }

    let mut tax = 0.0;
    for bracket in &CAPITAL_GAINS_BRACKETS {
        if profit <= bracket.lower {
            break;
        }
        let capped = match bracket.upper {
            Some(upper) => profit.min(upper),
            None => profit,
        };
        tax += (capped - bracket.lower) * bracket.rate;
    }
    tax
}

pub fn flat_income_tax(profit: f64) -> f64 {
    if profit > 0.0 {
        profit * FLAT_INCOME_TAX_RATE
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn no_tax_on_loss_or_break_even() {
        assert_approx(progressive_capital_gains(0.0), 0.0);
        assert_approx(progressive_capital_gains(-1_000_000.0), 0.0);
        assert_approx(flat_income_tax(0.0), 0.0);
        assert_approx(flat_income_tax(-500.0), 0.0);
    }

    #[test]
    fn first_bracket_is_flat_fifteen_percent() {
        assert_approx(progressive_capital_gains(1_000_000.0), 150_000.0);
        assert_approx(progressive_capital_gains(5_000_000.0), 750_000.0);
    }

    #[test]
    fn upper_brackets_tax_only_the_marginal_portion() {
        assert_approx(progressive_capital_gains(10_000_000.0), 1_625_000.0);
        assert_approx(progressive_capital_gains(30_000_000.0), 5_625_000.0);
        assert_approx(progressive_capital_gains(35_000_000.0), 6_750_000.0);
    }

    #[test]
    fn marginal_rate_never_applies_to_the_whole_amount() {
        // 7M at a flat 17.5% would be 1,225,000; marginal computation gives less.
        assert_approx(progressive_capital_gains(7_000_000.0), 1_100_000.0);
        assert_approx(progressive_capital_gains(12_345_678.0), 2_094_135.6);
    }

    #[test]
    fn tax_is_continuous_at_bracket_boundaries() {
        for boundary in [5_000_000.0, 10_000_000.0, 30_000_000.0] {
            let below = progressive_capital_gains(boundary - 1.0);
            let at = progressive_capital_gains(boundary);
            let above = progressive_capital_gains(boundary + 1.0);
            assert!(at - below < 0.30, "jump below boundary {boundary}");
            assert!(above - at < 0.30, "jump above boundary {boundary}");
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_tax_is_non_negative_and_below_top_rate(profit in -50_000_000i64..50_000_000) {
            let tax = progressive_capital_gains(profit as f64);
            prop_assert!(tax >= 0.0);
            prop_assert!(tax <= (profit as f64).max(0.0) * 0.225 + 1e-9);
        }

        #[test]
        fn prop_tax_is_monotonic_in_profit(profit in 0u64..50_000_000, bump in 1u64..1_000_000) {
            let lower = progressive_capital_gains(profit as f64);
            let higher = progressive_capital_gains((profit + bump) as f64);
            prop_assert!(higher >= lower);
        }
    }
}
