use super::tax::{FLAT_INCOME_TAX_RATE, flat_income_tax, progressive_capital_gains};
use super::types::{
    ConstructionFund, ConstructionOutcome, FinancedInputs, FinancedOutcome, FinancedResult,
    FixedIncomeProjection, MonthlyBalance, OwnCapitalInputs, OwnCapitalResult,
};

pub fn project_fixed_income(initial: f64, monthly_rate: f64, months: u32) -> FixedIncomeProjection {
    let mut series = Vec::with_capacity(months as usize + 1);
    let mut balance = initial;
    for month in 0..=months {
        series.push(MonthlyBalance { month, balance });
        if month < months {
            balance *= 1.0 + monthly_rate;
        }
    }

    let gross_final = balance;
    let tax_paid = flat_income_tax(gross_final - initial);

    FixedIncomeProjection {
        gross_final,
        tax_paid,
        net_final: gross_final - tax_paid,
        series,
    }
}

fn compound(amount: f64, monthly_rate: f64, months: u32) -> f64 {
    amount * (1.0 + monthly_rate).powf(f64::from(months))
}

pub fn simulate_construction_fund(
    fund_seed: f64,
    effective_cost: f64,
    monthly_rate: f64,
    months: u32,
) -> ConstructionFund {
    if fund_seed <= 0.0 || months == 0 {
        let series = (0..=months)
            .map(|month| MonthlyBalance {
                month,
                balance: 0.0,
            })
            .collect();
        return ConstructionFund {
            final_balance: 0.0,
            yield_tax: 0.0,
            series,
        };
    }

    let monthly_withdrawal = effective_cost / f64::from(months);
    let mut series = Vec::with_capacity(months as usize + 1);
    let mut balance = fund_seed;
    let mut yield_tax = 0.0;

    for month in 0..=months {
        // Reported balances are floored at zero; the running balance is not.
        series.push(MonthlyBalance {
            month,
            balance: balance.max(0.0),
        });
        if month < months {
            let monthly_yield = balance * monthly_rate;
            if monthly_yield > 0.0 {
                yield_tax += monthly_yield * FLAT_INCOME_TAX_RATE;
            }
            balance = balance + monthly_yield - monthly_withdrawal;
        }
    }

    let final_balance = series.last().map(|p| p.balance).unwrap_or(0.0);

    ConstructionFund {
        final_balance,
        yield_tax,
        series,
    }
}

pub fn evaluate_own_capital(params: &OwnCapitalInputs) -> OwnCapitalResult {
    let fixed_income =
        project_fixed_income(params.initial_investment, params.monthly_rate, params.months);

    let total_project_cost = params.land_cost + params.construction_cost;
    let surplus_invested = (params.initial_investment - total_project_cost).max(0.0);
    let surplus_final = if surplus_invested > 0.0 && params.months > 0 {
        compound(surplus_invested, params.monthly_rate, params.months)
    } else {
        surplus_invested
    };

    let effective_sale_price = params.sale_price * (1.0 + params.sale_price_variation);
    let effective_construction_cost =
        params.construction_cost * (1.0 + params.construction_cost_variation);

    // The fund is pre-financed at the nominal construction budget; withdrawals
    // track the adjusted actual cost.
    let fund = simulate_construction_fund(
        params.construction_cost,
        effective_construction_cost,
        params.monthly_rate,
        params.months,
    );

    let surplus_tax = flat_income_tax(surplus_final - surplus_invested);
    let income_tax = fund.yield_tax + surplus_tax;

    let house_total_cost = params.land_cost + effective_construction_cost;
    let sale_profit = effective_sale_price - house_total_cost;
    let sale_tax = if params.apply_sale_tax {
        progressive_capital_gains(sale_profit)
    } else {
        0.0
    };

    let net_result =
        (fund.final_balance + surplus_final + effective_sale_price) - (sale_tax + income_tax);
    let tax_shield = params.initial_investment * params.corporate_tax_rate;

    let monthly_withdrawal = if params.months > 0 {
        effective_construction_cost / f64::from(params.months)
    } else {
        0.0
    };

    OwnCapitalResult {
        fixed_income,
        construction: ConstructionOutcome {
            effective_sale_price,
            effective_construction_cost,
            monthly_withdrawal,
            surplus_invested,
            surplus_final,
            surplus_tax,
            fund,
            house_total_cost,
            sale_profit,
            sale_tax,
            income_tax,
            net_result,
            tax_shield,
        },
    }
}

pub fn evaluate_financed(params: &FinancedInputs) -> FinancedResult {
    // Own capital covers the land only; that is the competing allocation here.
    let fixed_income = project_fixed_income(params.land_cost, params.monthly_rate, params.months);

    let effective_sale_price = params.sale_price * (1.0 + params.sale_price_variation);
    let effective_construction_cost =
        params.construction_cost * (1.0 + params.construction_cost_variation);

    let fund = simulate_construction_fund(
        params.consortium_loan,
        effective_construction_cost,
        params.monthly_rate,
        params.months,
    );

    // Simple annual interest prorated by the construction term.
    let loan_term_years = f64::from(params.months) / 12.0;
    let loan_interest = params.consortium_loan * params.annual_interest_rate * loan_term_years;
    let loan_repayment = params.consortium_loan + loan_interest;

    let house_total_cost = params.land_cost + effective_construction_cost;
    let sale_profit = effective_sale_price - house_total_cost;
    let sale_tax = if params.apply_sale_tax {
        progressive_capital_gains(sale_profit)
    } else {
        0.0
    };

    let net_result =
        (effective_sale_price + fund.final_balance) - (loan_repayment + (sale_tax + fund.yield_tax));
    let tax_shield = params.land_cost * params.corporate_tax_rate;

    let monthly_withdrawal = if params.months > 0 {
        effective_construction_cost / f64::from(params.months)
    } else {
        0.0
    };

    FinancedResult {
        fixed_income,
        operation: FinancedOutcome {
            effective_sale_price,
            effective_construction_cost,
            monthly_withdrawal,
            fund,
            loan_interest,
            loan_repayment,
            house_total_cost,
            sale_profit,
            sale_tax,
            net_result,
            tax_shield,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    // Reference parameter set: 3.3M of capital against a 1M land + 2M build
    // project selling at 4.5M after 18 months, yields at 1.176% per month.
    fn sample_own_capital_inputs() -> OwnCapitalInputs {
        OwnCapitalInputs {
            initial_investment: 3_300_000.0,
            land_cost: 1_000_000.0,
            construction_cost: 2_000_000.0,
            sale_price: 4_500_000.0,
            monthly_rate: 0.01176,
            months: 18,
            corporate_tax_rate: 0.25,
            apply_sale_tax: true,
            sale_price_variation: 0.0,
            construction_cost_variation: 0.0,
        }
    }

    fn sample_financed_inputs() -> FinancedInputs {
        FinancedInputs {
            consortium_loan: 2_200_000.0,
            land_cost: 1_000_000.0,
            construction_cost: 2_200_000.0,
            sale_price: 4_500_000.0,
            monthly_rate: 0.01176,
            months: 18,
            annual_interest_rate: 0.095,
            corporate_tax_rate: 0.25,
            apply_sale_tax: true,
            sale_price_variation: 0.0,
            construction_cost_variation: 0.0,
        }
    }

    #[test]
    fn projector_zero_months_is_a_single_point_with_no_tax() {
        let projection = project_fixed_income(50_000.0, 0.01, 0);
        assert_eq!(projection.series.len(), 1);
        assert_eq!(projection.series[0].month, 0);
        assert_approx(projection.series[0].balance, 50_000.0);
        assert_approx(projection.gross_final, 50_000.0);
        assert_approx(projection.tax_paid, 0.0);
        assert_approx(projection.net_final, 50_000.0);
    }

    #[test]
    fn projector_compounds_monthly_and_taxes_profit_at_flat_rate() {
        let projection = project_fixed_income(3_300_000.0, 0.01176, 18);
        assert_eq!(projection.series.len(), 19);
        assert_approx(projection.series[0].balance, 3_300_000.0);
        assert_approx(projection.gross_final, 4_072_949.6352986344);
        assert_approx(projection.tax_paid, 115_942.4452947952);
        assert_approx(projection.net_final, 3_957_007.1900038393);
    }

    #[test]
    fn projector_zero_rate_conserves_the_principal() {
        let projection = project_fixed_income(1_000_000.0, 0.0, 24);
        assert_eq!(projection.series.len(), 25);
        assert_approx(projection.gross_final, 1_000_000.0);
        assert_approx(projection.tax_paid, 0.0);
        assert_approx(projection.net_final, 1_000_000.0);
    }

    #[test]
    fn projector_never_taxes_a_loss() {
        let projection = project_fixed_income(100_000.0, -0.02, 12);
        assert!(projection.gross_final < 100_000.0);
        assert_approx(projection.tax_paid, 0.0);
        assert_approx(projection.net_final, projection.gross_final);
    }

    #[test]
    fn fund_zero_seed_yields_a_zero_filled_series() {
        let fund = simulate_construction_fund(0.0, 1_000_000.0, 0.01, 12);
        assert_eq!(fund.series.len(), 13);
        assert!(fund.series.iter().all(|p| p.balance == 0.0));
        assert_approx(fund.final_balance, 0.0);
        assert_approx(fund.yield_tax, 0.0);
    }

    #[test]
    fn fund_zero_months_yields_a_single_zero_point() {
        let fund = simulate_construction_fund(1_000_000.0, 1_000_000.0, 0.01, 0);
        assert_eq!(fund.series.len(), 1);
        assert_approx(fund.series[0].balance, 0.0);
        assert_approx(fund.final_balance, 0.0);
        assert_approx(fund.yield_tax, 0.0);
    }

    #[test]
    fn fund_applies_yield_then_tax_then_withdrawal_each_month() {
        // Seed 1000 at 10%/month paying off 600 over 2 months:
        //   month 0 -> 1000;  yield 100, tax 15, withdraw 300 -> 800
        //   month 1 -> 800;   yield 80,  tax 12, withdraw 300 -> 580
        let fund = simulate_construction_fund(1_000.0, 600.0, 0.10, 2);
        assert_eq!(fund.series.len(), 3);
        assert_approx(fund.series[0].balance, 1_000.0);
        assert_approx(fund.series[1].balance, 800.0);
        assert_approx(fund.series[2].balance, 580.0);
        assert_approx(fund.final_balance, 580.0);
        assert_approx(fund.yield_tax, 27.0);
    }

    #[test]
    fn fund_zero_rate_is_pure_drawdown() {
        let fund = simulate_construction_fund(1_000.0, 900.0, 0.0, 10);
        assert_approx(fund.final_balance, 100.0);
        assert_approx(fund.yield_tax, 0.0);
    }

    #[test]
    fn fund_reports_clamped_balances_while_arithmetic_runs_negative() {
        let fund = simulate_construction_fund(100_000.0, 300_000.0, 0.01, 6);
        let expected = [100_000.0, 51_000.0, 1_510.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(fund.series.len(), expected.len());
        for (point, want) in fund.series.iter().zip(expected) {
            assert_approx(point.balance, want);
        }
        assert_approx(fund.final_balance, 0.0);
        // Months with a negative running balance accrue no yield tax.
        assert_approx(fund.yield_tax, 228.765);
    }

    #[test]
    fn own_capital_matches_the_reference_run_to_the_cent() {
        let result = evaluate_own_capital(&sample_own_capital_inputs());
        let construction = &result.construction;

        assert_approx(construction.surplus_invested, 300_000.0);
        assert_approx_tol(construction.surplus_final, 370_268.1486635121, 0.01);
        assert_approx_tol(construction.surplus_tax, 10_540.2222995268, 0.01);
        assert_approx(construction.fund.final_balance, 255_423.6912818124);
        assert_approx(construction.fund.yield_tax, 38_313.5536922717);
        assert_approx_tol(construction.income_tax, 48_853.7759917986, 0.01);
        assert_approx(construction.sale_profit, 1_500_000.0);
        assert_approx(construction.sale_tax, 225_000.0);
        assert_approx_tol(construction.net_result, 4_851_838.0639535263, 0.01);
        assert_approx(construction.tax_shield, 825_000.0);

        assert_approx(result.fixed_income.net_final, 3_957_007.1900038393);
        assert_approx(result.fixed_income.tax_paid, 115_942.4452947952);
    }

    #[test]
    fn own_capital_with_exact_project_cost_has_no_surplus() {
        let mut inputs = sample_own_capital_inputs();
        inputs.initial_investment = inputs.land_cost + inputs.construction_cost;

        let result = evaluate_own_capital(&inputs);
        assert_approx(result.construction.surplus_invested, 0.0);
        assert_approx(result.construction.surplus_final, 0.0);
        assert_approx(result.construction.surplus_tax, 0.0);
    }

    #[test]
    fn own_capital_sale_tax_flag_removes_only_the_sale_tax() {
        let taxed = evaluate_own_capital(&sample_own_capital_inputs());

        let mut inputs = sample_own_capital_inputs();
        inputs.apply_sale_tax = false;
        let untaxed = evaluate_own_capital(&inputs);

        assert_approx(untaxed.construction.sale_tax, 0.0);
        assert_approx_tol(
            untaxed.construction.net_result - taxed.construction.net_result,
            taxed.construction.sale_tax,
            1e-6,
        );
    }

    #[test]
    fn own_capital_sensitivity_deltas_shift_price_and_cost_but_not_the_seed() {
        let mut inputs = sample_own_capital_inputs();
        inputs.sale_price_variation = 0.10;
        inputs.construction_cost_variation = -0.05;

        let result = evaluate_own_capital(&inputs);
        let construction = &result.construction;
        assert_approx(construction.effective_sale_price, 4_950_000.0);
        assert_approx(construction.effective_construction_cost, 1_900_000.0);
        // Seed stays nominal: month zero of the fund is the unadjusted budget.
        assert_approx(construction.fund.series[0].balance, 2_000_000.0);
        assert_approx(
            construction.monthly_withdrawal,
            1_900_000.0 / 18.0,
        );
    }

    #[test]
    fn own_capital_zero_duration_degrades_gracefully() {
        let mut inputs = sample_own_capital_inputs();
        inputs.months = 0;

        let result = evaluate_own_capital(&inputs);
        assert_eq!(result.fixed_income.series.len(), 1);
        assert_eq!(result.construction.fund.series.len(), 1);
        assert_approx(result.construction.surplus_final, 300_000.0);
        assert_approx(result.construction.surplus_tax, 0.0);
        assert_approx(result.construction.monthly_withdrawal, 0.0);
    }

    #[test]
    fn financed_matches_the_reference_run_to_the_cent() {
        let result = evaluate_financed(&sample_financed_inputs());
        let operation = &result.operation;

        assert_approx(operation.loan_interest, 313_500.0);
        assert_approx(operation.loan_repayment, 2_513_500.0);
        assert_approx(operation.fund.final_balance, 280_966.0604099922);
        assert_approx(operation.fund.yield_tax, 42_144.9090614989);
        assert_approx(operation.sale_profit, 1_300_000.0);
        assert_approx(operation.sale_tax, 195_000.0);
        assert_approx(operation.net_result, 2_030_321.1513484931);
        assert_approx(operation.tax_shield, 250_000.0);

        // The competing allocation is the land cost in fixed income.
        assert_approx(result.fixed_income.series[0].balance, 1_000_000.0);
        assert_approx(result.fixed_income.gross_final, 1_234_227.1622117066);
        assert_approx(result.fixed_income.net_final, 1_199_093.0878799506);
    }

    #[test]
    fn financed_shield_covers_the_land_portion_only() {
        let mut inputs = sample_financed_inputs();
        inputs.land_cost = 800_000.0;
        let result = evaluate_financed(&inputs);
        assert_approx(result.operation.tax_shield, 200_000.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_fund_reported_balances_are_never_negative(
            seed in 0u32..5_000_000,
            cost in 0u32..8_000_000,
            rate_bp in 0u32..300,
            months in 0u32..60
        ) {
            let fund = simulate_construction_fund(
                seed as f64,
                cost as f64,
                rate_bp as f64 / 10_000.0,
                months,
            );
            prop_assert_eq!(fund.series.len(), months as usize + 1);
            prop_assert!(fund.series.iter().all(|p| p.balance >= 0.0));
            prop_assert!(fund.final_balance >= 0.0);
            prop_assert!(fund.yield_tax >= 0.0);
        }

        #[test]
        fn prop_projector_series_is_strictly_increasing_for_positive_rate(
            initial in 1u32..10_000_000,
            rate_bp in 1u32..500,
            months in 1u32..120
        ) {
            let projection = project_fixed_income(
                initial as f64,
                rate_bp as f64 / 10_000.0,
                months,
            );
            prop_assert_eq!(projection.series.len(), months as usize + 1);
            for pair in projection.series.windows(2) {
                prop_assert!(pair[1].balance > pair[0].balance);
            }
            prop_assert!(projection.gross_final > initial as f64);
            prop_assert!(projection.tax_paid > 0.0);
        }

        #[test]
        fn prop_surplus_is_zero_when_capital_exactly_covers_the_project(
            land in 0u32..5_000_000,
            construction in 0u32..5_000_000,
            rate_bp in 0u32..300,
            months in 0u32..60
        ) {
            let land = land as f64;
            let construction = construction as f64;
            let inputs = OwnCapitalInputs {
                initial_investment: land + construction,
                land_cost: land,
                construction_cost: construction,
                sale_price: 1_000_000.0,
                monthly_rate: rate_bp as f64 / 10_000.0,
                months,
                corporate_tax_rate: 0.25,
                apply_sale_tax: true,
                sale_price_variation: 0.0,
                construction_cost_variation: 0.0,
            };

            let result = evaluate_own_capital(&inputs);
            prop_assert_eq!(result.construction.surplus_invested, 0.0);
            prop_assert_eq!(result.construction.surplus_final, 0.0);
            prop_assert_eq!(result.construction.surplus_tax, 0.0);
        }

        #[test]
        fn prop_own_capital_net_is_monotonic_in_sale_price(
            sale in 100_000u32..20_000_000,
            bump in 1u32..5_000_000
        ) {
            let mut lower_inputs = sample_own_capital_inputs();
            lower_inputs.sale_price = sale as f64;
            let mut higher_inputs = sample_own_capital_inputs();
            higher_inputs.sale_price = (sale + bump) as f64;

            let lower = evaluate_own_capital(&lower_inputs);
            let higher = evaluate_own_capital(&higher_inputs);
            prop_assert!(
                higher.construction.net_result >= lower.construction.net_result
            );
        }

        #[test]
        fn prop_financed_interest_is_linear_in_the_principal(
            loan in 1u32..10_000_000
        ) {
            let mut single = sample_financed_inputs();
            single.consortium_loan = loan as f64;
            let mut double = sample_financed_inputs();
            double.consortium_loan = 2.0 * loan as f64;

            let one = evaluate_financed(&single);
            let two = evaluate_financed(&double);
            prop_assert!(
                (two.operation.loan_interest - 2.0 * one.operation.loan_interest).abs() <= 1e-6
            );
        }
    }
}
