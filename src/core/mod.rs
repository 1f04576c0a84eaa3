mod engine;
mod solver;
mod tax;
mod types;

pub use engine::{evaluate_financed, evaluate_own_capital, project_fixed_income,
    simulate_construction_fund};
pub use solver::{
    BreakEvenConfig, BreakEvenIteration, BreakEvenResult, SensitivitySweep, SweepCell,
    SweepConfig, run_sensitivity_sweep, solve_breakeven_sale_price,
};
pub use tax::{CAPITAL_GAINS_BRACKETS, FLAT_INCOME_TAX_RATE, TaxBracket, flat_income_tax,
    progressive_capital_gains};
pub use types::{
    ConstructionFund, ConstructionOutcome, FinancedInputs, FinancedOutcome, FinancedResult,
    FixedIncomeProjection, MonthlyBalance, OwnCapitalInputs, OwnCapitalResult,
};
