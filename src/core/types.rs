use serde::Serialize;

#[derive(Debug, Clone)]
pub struct OwnCapitalInputs {
    pub initial_investment: f64,
    pub land_cost: f64,
    pub construction_cost: f64,
    pub sale_price: f64,
    pub monthly_rate: f64,
    pub months: u32,
    pub corporate_tax_rate: f64,
    pub apply_sale_tax: bool,
    pub sale_price_variation: f64,
    pub construction_cost_variation: f64,
}

#[derive(Debug, Clone)]
pub struct FinancedInputs {
    pub consortium_loan: f64,
    pub land_cost: f64,
    pub construction_cost: f64,
    pub sale_price: f64,
    pub monthly_rate: f64,
    pub months: u32,
    pub annual_interest_rate: f64,
    pub corporate_tax_rate: f64,
    pub apply_sale_tax: bool,
    pub sale_price_variation: f64,
    pub construction_cost_variation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBalance {
    pub month: u32,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedIncomeProjection {
    pub gross_final: f64,
    pub tax_paid: f64,
    pub net_final: f64,
    pub series: Vec<MonthlyBalance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionFund {
    pub final_balance: f64,
    pub yield_tax: f64,
    pub series: Vec<MonthlyBalance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionOutcome {
    pub effective_sale_price: f64,
    pub effective_construction_cost: f64,
    pub monthly_withdrawal: f64,
    pub surplus_invested: f64,
    pub surplus_final: f64,
    pub surplus_tax: f64,
    pub fund: ConstructionFund,
    pub house_total_cost: f64,
    pub sale_profit: f64,
    pub sale_tax: f64,
    pub income_tax: f64,
    pub net_result: f64,
    pub tax_shield: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnCapitalResult {
    pub fixed_income: FixedIncomeProjection,
    pub construction: ConstructionOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancedOutcome {
    pub effective_sale_price: f64,
    pub effective_construction_cost: f64,
    pub monthly_withdrawal: f64,
    pub fund: ConstructionFund,
    pub loan_interest: f64,
    pub loan_repayment: f64,
    pub house_total_cost: f64,
    pub sale_profit: f64,
    pub sale_tax: f64,
    pub net_result: f64,
    pub tax_shield: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancedResult {
    pub fixed_income: FixedIncomeProjection,
    pub operation: FinancedOutcome,
}
