use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    BreakEvenConfig, BreakEvenResult, ConstructionOutcome, FinancedInputs, FinancedOutcome,
    FinancedResult, FixedIncomeProjection, OwnCapitalInputs, OwnCapitalResult, SensitivitySweep,
    SweepConfig, evaluate_financed, evaluate_own_capital, run_sensitivity_sweep,
    solve_breakeven_sale_price,
};

#[derive(Parser, Debug)]
#[command(
    name = "buildvest",
    about = "Construction-project investment comparator (build-and-sell vs fixed income, own capital or consortium financing)"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 3_300_000.0,
        help = "Total capital available in the own-capital scenario"
    )]
    initial_investment: f64,
    #[arg(
        long,
        default_value_t = 2_200_000.0,
        help = "Amount released by the consortium letter in the financed scenario"
    )]
    consortium_loan: f64,
    #[arg(long, default_value_t = 1_100_000.0)]
    land_cost: f64,
    #[arg(
        long,
        default_value_t = 2_200_000.0,
        help = "Total construction budget, land excluded"
    )]
    construction_cost: f64,
    #[arg(long, default_value_t = 4_500_000.0)]
    sale_price: f64,
    #[arg(long, help = "Land area; combine with the per-m2 prices to derive costs")]
    land_area_m2: Option<f64>,
    #[arg(long, help = "Built area; combine with the per-m2 prices to derive costs")]
    built_area_m2: Option<f64>,
    #[arg(long)]
    land_cost_per_m2: Option<f64>,
    #[arg(long)]
    construction_cost_per_m2: Option<f64>,
    #[arg(long)]
    sale_price_per_m2: Option<f64>,
    #[arg(
        long,
        default_value_t = 18,
        help = "Construction-and-sale horizon in months"
    )]
    months: u32,
    #[arg(
        long,
        default_value_t = 1.176,
        help = "Fixed-income yield per month in percent"
    )]
    monthly_yield_rate: f64,
    #[arg(
        long,
        default_value_t = 9.5,
        help = "Simple annual interest on the consortium loan in percent"
    )]
    consortium_annual_interest: f64,
    #[arg(
        long,
        default_value_t = 25.0,
        help = "Corporate profit tax rate in percent, used for the tax-shield estimate"
    )]
    corporate_tax_rate: f64,
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Deduct capital-gains tax on the property sale"
    )]
    apply_sale_tax: bool,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Sensitivity delta on the sale price in percent"
    )]
    sale_price_variation: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Sensitivity delta on the construction cost in percent"
    )]
    construction_cost_variation: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_investment: Option<f64>,
    consortium_loan: Option<f64>,
    land_cost: Option<f64>,
    construction_cost: Option<f64>,
    sale_price: Option<f64>,
    land_area_m2: Option<f64>,
    built_area_m2: Option<f64>,
    land_cost_per_m2: Option<f64>,
    construction_cost_per_m2: Option<f64>,
    sale_price_per_m2: Option<f64>,
    months: Option<u32>,
    monthly_yield_rate: Option<f64>,
    consortium_annual_interest: Option<f64>,
    corporate_tax_rate: Option<f64>,
    apply_sale_tax: Option<bool>,
    sale_price_variation: Option<f64>,
    construction_cost_variation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BreakEvenPayload {
    #[serde(flatten)]
    simulate: SimulatePayload,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
    include_tax_shield: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SweepPayload {
    #[serde(flatten)]
    simulate: SimulatePayload,
    sale_variation_min: Option<f64>,
    sale_variation_max: Option<f64>,
    sale_steps: Option<u32>,
    cost_variation_min: Option<f64>,
    cost_variation_max: Option<f64>,
    cost_steps: Option<u32>,
    include_tax_shield: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SaveScenarioPayload {
    label: Option<String>,
    variant: Option<String>,
    initial_investment: Option<f64>,
    fixed_income_net: Option<f64>,
    construction_net: Option<f64>,
    difference: Option<f64>,
    months: Option<u32>,
    sale_price_variation: Option<f64>,
    construction_cost_variation: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedScenario {
    label: String,
    variant: String,
    initial_investment: f64,
    fixed_income_net: f64,
    construction_net: f64,
    difference: f64,
    months: u32,
    sale_price_variation: f64,
    construction_cost_variation: f64,
}

type ScenarioStore = Arc<Mutex<Vec<SavedScenario>>>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnCapitalParams {
    initial_investment: f64,
    land_cost: f64,
    construction_cost: f64,
    sale_price: f64,
    months: u32,
    monthly_rate: f64,
    annual_equivalent_rate: f64,
    corporate_tax_rate: f64,
    apply_sale_tax: bool,
    sale_price_variation: f64,
    construction_cost_variation: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinancedParams {
    consortium_loan: f64,
    own_capital_invested: f64,
    land_cost: f64,
    construction_cost: f64,
    sale_price: f64,
    months: u32,
    monthly_rate: f64,
    annual_equivalent_rate: f64,
    annual_interest_rate: f64,
    corporate_tax_rate: f64,
    apply_sale_tax: bool,
    sale_price_variation: f64,
    construction_cost_variation: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnCapitalVerdict {
    fixed_income_net: f64,
    construction_net: f64,
    construction_net_with_shield: f64,
    fixed_income_profit: f64,
    construction_profit_with_shield: f64,
    difference: f64,
    difference_with_shield: f64,
    construction_wins: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinancedVerdict {
    fixed_income_net: f64,
    fixed_income_profit: f64,
    operation_net: f64,
    operation_net_with_shield: f64,
    operation_profit: f64,
    difference: f64,
    difference_with_shield: f64,
    operation_wins: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnCapitalResponse {
    params: OwnCapitalParams,
    fixed_income: FixedIncomeProjection,
    construction: ConstructionOutcome,
    verdict: OwnCapitalVerdict,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinancedResponse {
    params: FinancedParams,
    fixed_income: FixedIncomeProjection,
    operation: FinancedOutcome,
    verdict: FinancedVerdict,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BreakEvenResponse {
    search_min: f64,
    search_max: f64,
    tolerance: f64,
    max_iterations: u32,
    include_tax_shield: bool,
    result: BreakEvenResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SweepResponse {
    sale_variation_min: f64,
    sale_variation_max: f64,
    sale_steps: u32,
    cost_variation_min: f64,
    cost_variation_max: f64,
    cost_steps: u32,
    include_tax_shield: bool,
    sweep: SensitivitySweep,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioListResponse {
    scenarios: Vec<SavedScenario>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenariosClearedResponse {
    cleared: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareReport {
    own_capital: OwnCapitalResponse,
    financed: FinancedResponse,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_investment: 3_300_000.0,
        consortium_loan: 2_200_000.0,
        land_cost: 1_100_000.0,
        construction_cost: 2_200_000.0,
        sale_price: 4_500_000.0,
        land_area_m2: None,
        built_area_m2: None,
        land_cost_per_m2: None,
        construction_cost_per_m2: None,
        sale_price_per_m2: None,
        months: 18,
        monthly_yield_rate: 1.176,
        consortium_annual_interest: 9.5,
        corporate_tax_rate: 25.0,
        apply_sale_tax: true,
        sale_price_variation: 0.0,
        construction_cost_variation: 0.0,
    }
}

fn cli_with_payload(payload: SimulatePayload) -> Cli {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_investment {
        cli.initial_investment = v;
    }
    if let Some(v) = payload.consortium_loan {
        cli.consortium_loan = v;
    }
    if let Some(v) = payload.land_cost {
        cli.land_cost = v;
    }
    if let Some(v) = payload.construction_cost {
        cli.construction_cost = v;
    }
    if let Some(v) = payload.sale_price {
        cli.sale_price = v;
    }
    if let Some(v) = payload.land_area_m2 {
        cli.land_area_m2 = Some(v);
    }
    if let Some(v) = payload.built_area_m2 {
        cli.built_area_m2 = Some(v);
    }
    if let Some(v) = payload.land_cost_per_m2 {
        cli.land_cost_per_m2 = Some(v);
    }
    if let Some(v) = payload.construction_cost_per_m2 {
        cli.construction_cost_per_m2 = Some(v);
    }
    if let Some(v) = payload.sale_price_per_m2 {
        cli.sale_price_per_m2 = Some(v);
    }
    if let Some(v) = payload.months {
        cli.months = v;
    }
    if let Some(v) = payload.monthly_yield_rate {
        cli.monthly_yield_rate = v;
    }
    if let Some(v) = payload.consortium_annual_interest {
        cli.consortium_annual_interest = v;
    }
    if let Some(v) = payload.corporate_tax_rate {
        cli.corporate_tax_rate = v;
    }
    if let Some(v) = payload.apply_sale_tax {
        cli.apply_sale_tax = v;
    }
    if let Some(v) = payload.sale_price_variation {
        cli.sale_price_variation = v;
    }
    if let Some(v) = payload.construction_cost_variation {
        cli.construction_cost_variation = v;
    }

    cli
}

// Headline amounts may be given directly or derived from areas and per-m2
// prices; the per-m2 fields travel together or not at all.
fn resolve_headline_amounts(cli: &Cli) -> Result<(f64, f64, f64), String> {
    let m2_fields = [
        cli.land_area_m2,
        cli.built_area_m2,
        cli.land_cost_per_m2,
        cli.construction_cost_per_m2,
        cli.sale_price_per_m2,
    ];
    if m2_fields.iter().all(|f| f.is_none()) {
        return Ok((cli.land_cost, cli.construction_cost, cli.sale_price));
    }
    let [
        Some(land_area),
        Some(built_area),
        Some(land_per_m2),
        Some(construction_per_m2),
        Some(sale_per_m2),
    ] = m2_fields
    else {
        return Err(
            "--land-area-m2, --built-area-m2, --land-cost-per-m2, --construction-cost-per-m2 \
             and --sale-price-per-m2 must be supplied together"
                .to_string(),
        );
    };

    if !land_area.is_finite() || land_area <= 0.0 {
        return Err("--land-area-m2 must be > 0".to_string());
    }
    if !built_area.is_finite() || built_area <= 0.0 {
        return Err("--built-area-m2 must be > 0".to_string());
    }
    for (name, value) in [
        ("--land-cost-per-m2", land_per_m2),
        ("--construction-cost-per-m2", construction_per_m2),
        ("--sale-price-per-m2", sale_per_m2),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    Ok((
        land_per_m2 * land_area,
        construction_per_m2 * built_area,
        sale_per_m2 * built_area,
    ))
}

fn validate_shared(
    cli: &Cli,
    land_cost: f64,
    construction_cost: f64,
    sale_price: f64,
) -> Result<(), String> {
    if !land_cost.is_finite() || land_cost < 0.0 {
        return Err("--land-cost must be >= 0".to_string());
    }
    if !construction_cost.is_finite() || construction_cost < 0.0 {
        return Err("--construction-cost must be >= 0".to_string());
    }
    if !sale_price.is_finite() || sale_price <= 0.0 {
        return Err("--sale-price must be > 0".to_string());
    }
    if cli.months == 0 {
        return Err("--months must be >= 1".to_string());
    }
    if !(0.0..=100.0).contains(&cli.monthly_yield_rate) {
        return Err("--monthly-yield-rate must be between 0 and 100".to_string());
    }
    if !(0.0..=100.0).contains(&cli.corporate_tax_rate) {
        return Err("--corporate-tax-rate must be between 0 and 100".to_string());
    }
    if !(-100.0..=100.0).contains(&cli.sale_price_variation) {
        return Err("--sale-price-variation must be between -100 and 100".to_string());
    }
    if !(-100.0..=100.0).contains(&cli.construction_cost_variation) {
        return Err("--construction-cost-variation must be between -100 and 100".to_string());
    }
    Ok(())
}

fn build_own_capital_inputs(cli: &Cli) -> Result<OwnCapitalInputs, String> {
    let (land_cost, construction_cost, sale_price) = resolve_headline_amounts(cli)?;
    validate_shared(cli, land_cost, construction_cost, sale_price)?;

    if !cli.initial_investment.is_finite() || cli.initial_investment <= 0.0 {
        return Err("--initial-investment must be > 0".to_string());
    }

    Ok(OwnCapitalInputs {
        initial_investment: cli.initial_investment,
        land_cost,
        construction_cost,
        sale_price,
        monthly_rate: cli.monthly_yield_rate / 100.0,
        months: cli.months,
        corporate_tax_rate: cli.corporate_tax_rate / 100.0,
        apply_sale_tax: cli.apply_sale_tax,
        sale_price_variation: cli.sale_price_variation / 100.0,
        construction_cost_variation: cli.construction_cost_variation / 100.0,
    })
}

fn build_financed_inputs(cli: &Cli) -> Result<FinancedInputs, String> {
    let (land_cost, construction_cost, sale_price) = resolve_headline_amounts(cli)?;
    validate_shared(cli, land_cost, construction_cost, sale_price)?;

    if !cli.consortium_loan.is_finite() || cli.consortium_loan <= 0.0 {
        return Err("--consortium-loan must be > 0".to_string());
    }
    if !(0.0..=100.0).contains(&cli.consortium_annual_interest) {
        return Err("--consortium-annual-interest must be between 0 and 100".to_string());
    }

    Ok(FinancedInputs {
        consortium_loan: cli.consortium_loan,
        land_cost,
        construction_cost,
        sale_price,
        monthly_rate: cli.monthly_yield_rate / 100.0,
        months: cli.months,
        annual_interest_rate: cli.consortium_annual_interest / 100.0,
        corporate_tax_rate: cli.corporate_tax_rate / 100.0,
        apply_sale_tax: cli.apply_sale_tax,
        sale_price_variation: cli.sale_price_variation / 100.0,
        construction_cost_variation: cli.construction_cost_variation / 100.0,
    })
}

fn annual_equivalent_rate(monthly_rate: f64) -> f64 {
    (1.0 + monthly_rate).powf(12.0) - 1.0
}

fn build_own_capital_response(
    inputs: &OwnCapitalInputs,
    result: OwnCapitalResult,
) -> OwnCapitalResponse {
    let fixed_income_net = result.fixed_income.net_final;
    let construction_net = result.construction.net_result;
    let construction_net_with_shield = construction_net + result.construction.tax_shield;

    let verdict = OwnCapitalVerdict {
        fixed_income_net,
        construction_net,
        construction_net_with_shield,
        fixed_income_profit: fixed_income_net - inputs.initial_investment,
        construction_profit_with_shield: construction_net_with_shield - inputs.initial_investment,
        difference: construction_net - fixed_income_net,
        difference_with_shield: construction_net_with_shield - fixed_income_net,
        construction_wins: construction_net_with_shield > fixed_income_net,
    };

    OwnCapitalResponse {
        params: OwnCapitalParams {
            initial_investment: inputs.initial_investment,
            land_cost: inputs.land_cost,
            construction_cost: inputs.construction_cost,
            sale_price: inputs.sale_price,
            months: inputs.months,
            monthly_rate: inputs.monthly_rate,
            annual_equivalent_rate: annual_equivalent_rate(inputs.monthly_rate),
            corporate_tax_rate: inputs.corporate_tax_rate,
            apply_sale_tax: inputs.apply_sale_tax,
            sale_price_variation: inputs.sale_price_variation,
            construction_cost_variation: inputs.construction_cost_variation,
        },
        fixed_income: result.fixed_income,
        construction: result.construction,
        verdict,
    }
}

fn build_financed_response(inputs: &FinancedInputs, result: FinancedResult) -> FinancedResponse {
    let own_capital_invested = inputs.land_cost;
    let fixed_income_net = result.fixed_income.net_final;
    let operation_net = result.operation.net_result;
    let operation_net_with_shield = operation_net + result.operation.tax_shield;

    let fixed_income_profit = fixed_income_net - own_capital_invested;
    let operation_profit = operation_net - own_capital_invested;

    let verdict = FinancedVerdict {
        fixed_income_net,
        fixed_income_profit,
        operation_net,
        operation_net_with_shield,
        operation_profit,
        difference: operation_profit - fixed_income_profit,
        difference_with_shield: (operation_net_with_shield - own_capital_invested)
            - fixed_income_profit,
        operation_wins: operation_net_with_shield > fixed_income_net,
    };

    FinancedResponse {
        params: FinancedParams {
            consortium_loan: inputs.consortium_loan,
            own_capital_invested,
            land_cost: inputs.land_cost,
            construction_cost: inputs.construction_cost,
            sale_price: inputs.sale_price,
            months: inputs.months,
            monthly_rate: inputs.monthly_rate,
            annual_equivalent_rate: annual_equivalent_rate(inputs.monthly_rate),
            annual_interest_rate: inputs.annual_interest_rate,
            corporate_tax_rate: inputs.corporate_tax_rate,
            apply_sale_tax: inputs.apply_sale_tax,
            sale_price_variation: inputs.sale_price_variation,
            construction_cost_variation: inputs.construction_cost_variation,
        },
        fixed_income: result.fixed_income,
        operation: result.operation,
        verdict,
    }
}

fn breakeven_config_from_payload(payload: &BreakEvenPayload) -> BreakEvenConfig {
    BreakEvenConfig {
        search_min: payload.search_min.unwrap_or(0.0),
        search_max: payload.search_max.unwrap_or(100_000_000.0),
        tolerance: payload.tolerance.unwrap_or(1.0),
        max_iterations: payload.max_iterations.unwrap_or(64),
        include_tax_shield: payload.include_tax_shield.unwrap_or(false),
    }
}

// Sweep variations arrive in percent, like every other boundary rate.
fn sweep_config_from_payload(payload: &SweepPayload) -> SweepConfig {
    SweepConfig {
        sale_variation_min: payload.sale_variation_min.unwrap_or(-20.0) / 100.0,
        sale_variation_max: payload.sale_variation_max.unwrap_or(20.0) / 100.0,
        sale_steps: payload.sale_steps.unwrap_or(5),
        cost_variation_min: payload.cost_variation_min.unwrap_or(-20.0) / 100.0,
        cost_variation_max: payload.cost_variation_max.unwrap_or(20.0) / 100.0,
        cost_steps: payload.cost_steps.unwrap_or(5),
        include_tax_shield: payload.include_tax_shield.unwrap_or(false),
    }
}

fn append_scenario(
    store: &mut Vec<SavedScenario>,
    payload: SaveScenarioPayload,
) -> SavedScenario {
    let label = payload
        .label
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| format!("Scenario {}", store.len() + 1));
    let fixed_income_net = payload.fixed_income_net.unwrap_or(0.0);
    let construction_net = payload.construction_net.unwrap_or(0.0);

    let scenario = SavedScenario {
        label,
        variant: payload
            .variant
            .unwrap_or_else(|| "own-capital".to_string()),
        initial_investment: payload.initial_investment.unwrap_or(0.0),
        fixed_income_net,
        construction_net,
        difference: payload
            .difference
            .unwrap_or(construction_net - fixed_income_net),
        months: payload.months.unwrap_or(0),
        sale_price_variation: payload.sale_price_variation.unwrap_or(0.0),
        construction_cost_variation: payload.construction_cost_variation.unwrap_or(0.0),
    };
    store.push(scenario.clone());
    scenario
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let store: ScenarioStore = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route(
            "/api/own-capital",
            get(own_capital_get_handler).post(own_capital_post_handler),
        )
        .route(
            "/api/financed",
            get(financed_get_handler).post(financed_post_handler),
        )
        .route("/api/breakeven", post(breakeven_post_handler))
        .route("/api/sweep", post(sweep_post_handler))
        .route(
            "/api/scenarios",
            get(scenarios_get_handler)
                .post(scenarios_post_handler)
                .delete(scenarios_delete_handler),
        )
        .fallback(not_found_handler)
        .with_state(store);

    let listener = TcpListener::bind(addr).await?;
    println!("buildvest HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/own-capital");

    axum::serve(listener, app).await
}

pub fn run_compare_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let own_inputs = build_own_capital_inputs(&cli)?;
    let financed_inputs = build_financed_inputs(&cli)?;

    let report = CompareReport {
        own_capital: build_own_capital_response(&own_inputs, evaluate_own_capital(&own_inputs)),
        financed: build_financed_response(&financed_inputs, evaluate_financed(&financed_inputs)),
    };

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to encode comparison report: {e}"))?;
    println!("{rendered}");
    Ok(())
}

async fn own_capital_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    own_capital_response(payload)
}

async fn own_capital_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    own_capital_response(payload)
}

fn own_capital_response(payload: SimulatePayload) -> Response {
    let cli = cli_with_payload(payload);
    let inputs = match build_own_capital_inputs(&cli) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let result = evaluate_own_capital(&inputs);
    json_response(StatusCode::OK, build_own_capital_response(&inputs, result))
}

async fn financed_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    financed_response(payload)
}

async fn financed_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    financed_response(payload)
}

fn financed_response(payload: SimulatePayload) -> Response {
    let cli = cli_with_payload(payload);
    let inputs = match build_financed_inputs(&cli) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let result = evaluate_financed(&inputs);
    json_response(StatusCode::OK, build_financed_response(&inputs, result))
}

async fn breakeven_post_handler(Json(payload): Json<BreakEvenPayload>) -> Response {
    let config = breakeven_config_from_payload(&payload);
    let cli = cli_with_payload(payload.simulate);
    let inputs = match build_own_capital_inputs(&cli) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match solve_breakeven_sale_price(&inputs, config) {
        Ok(result) => json_response(
            StatusCode::OK,
            BreakEvenResponse {
                search_min: config.search_min,
                search_max: config.search_max,
                tolerance: config.tolerance,
                max_iterations: config.max_iterations,
                include_tax_shield: config.include_tax_shield,
                result,
            },
        ),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn sweep_post_handler(Json(payload): Json<SweepPayload>) -> Response {
    let config = sweep_config_from_payload(&payload);
    let cli = cli_with_payload(payload.simulate);
    let inputs = match build_own_capital_inputs(&cli) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_sensitivity_sweep(&inputs, config) {
        Ok(sweep) => json_response(
            StatusCode::OK,
            SweepResponse {
                sale_variation_min: config.sale_variation_min,
                sale_variation_max: config.sale_variation_max,
                sale_steps: config.sale_steps,
                cost_variation_min: config.cost_variation_min,
                cost_variation_max: config.cost_variation_max,
                cost_steps: config.cost_steps,
                include_tax_shield: config.include_tax_shield,
                sweep,
            },
        ),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn scenarios_get_handler(State(store): State<ScenarioStore>) -> Response {
    match store.lock() {
        Ok(guard) => json_response(
            StatusCode::OK,
            ScenarioListResponse {
                scenarios: guard.clone(),
            },
        ),
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "scenario store is unavailable",
        ),
    }
}

async fn scenarios_post_handler(
    State(store): State<ScenarioStore>,
    Json(payload): Json<SaveScenarioPayload>,
) -> Response {
    match store.lock() {
        Ok(mut guard) => {
            let saved = append_scenario(&mut guard, payload);
            json_response(StatusCode::CREATED, saved)
        }
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "scenario store is unavailable",
        ),
    }
}

async fn scenarios_delete_handler(State(store): State<ScenarioStore>) -> Response {
    match store.lock() {
        Ok(mut guard) => {
            let cleared = guard.len();
            guard.clear();
            json_response(StatusCode::OK, ScenariosClearedResponse { cleared })
        }
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "scenario store is unavailable",
        ),
    }
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn own_capital_inputs_from_json(json: &str) -> Result<OwnCapitalInputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    build_own_capital_inputs(&cli_with_payload(payload))
}

#[cfg(test)]
fn financed_inputs_from_json(json: &str) -> Result<FinancedInputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    build_financed_inputs(&cli_with_payload(payload))
}
