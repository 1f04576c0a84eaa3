use serde::Serialize;

use super::engine::evaluate_own_capital;
use super::types::OwnCapitalInputs;

#[derive(Debug, Clone, Copy)]
pub struct BreakEvenConfig {
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub include_tax_shield: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_sale_price: f64,
    pub advantage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenResult {
    pub solved_sale_price: Option<f64>,
    pub advantage_at_solution: Option<f64>,
    pub iterations: Vec<BreakEvenIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

// Construction advantage over the fixed-income track at a candidate nominal
// sale price. Monotonically increasing in the sale price, which is what makes
// the bisection below sound.
fn advantage_at(inputs: &OwnCapitalInputs, config: BreakEvenConfig, sale_price: f64) -> f64 {
    let mut candidate = inputs.clone();
    candidate.sale_price = sale_price;
    let result = evaluate_own_capital(&candidate);

    let mut construction = result.construction.net_result;
    if config.include_tax_shield {
        construction += result.construction.tax_shield;
    }
    construction - result.fixed_income.net_final
}

pub fn solve_breakeven_sale_price(
    inputs: &OwnCapitalInputs,
    config: BreakEvenConfig,
) -> Result<BreakEvenResult, String> {
    validate_breakeven_config(config)?;

    let low_advantage = advantage_at(inputs, config, config.search_min);
    let high_advantage = advantage_at(inputs, config, config.search_max);

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut solved_sale_price = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_advantage >= 0.0 {
        solved_sale_price = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Construction already breaks even at the lower sale-price bound.".to_string();
    } else if high_advantage < 0.0 {
        feasible = false;
        message = "Construction never breaks even within the search bounds.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let advantage = advantage_at(inputs, config, mid);
            iterations.push(BreakEvenIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_sale_price: mid,
                advantage,
            });

            if advantage >= 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                solved_sale_price = Some(hi);
                break;
            }
        }
        if solved_sale_price.is_none() {
            solved_sale_price = Some(hi);
        }
        feasible = true;
        message = if converged {
            "Solved break-even sale price.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let advantage_at_solution =
        solved_sale_price.map(|sale_price| advantage_at(inputs, config, sale_price));

    Ok(BreakEvenResult {
        solved_sale_price,
        advantage_at_solution,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn validate_breakeven_config(config: BreakEvenConfig) -> Result<(), String> {
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err("search bounds must be finite".to_string());
    }
    if config.search_min < 0.0 {
        return Err("search_min must be >= 0".to_string());
    }
    if config.search_max <= config.search_min {
        return Err("search_max must be greater than search_min".to_string());
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err("tolerance must be > 0".to_string());
    }
    if config.max_iterations == 0 {
        return Err("max_iterations must be > 0".to_string());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub sale_variation_min: f64,
    pub sale_variation_max: f64,
    pub sale_steps: u32,
    pub cost_variation_min: f64,
    pub cost_variation_max: f64,
    pub cost_steps: u32,
    pub include_tax_shield: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepCell {
    pub sale_variation: f64,
    pub cost_variation: f64,
    pub net_result: f64,
    pub net_with_shield: f64,
    pub advantage: f64,
    pub beats_fixed_income: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivitySweep {
    pub fixed_income_net: f64,
    pub cells: Vec<SweepCell>,
    pub best_index: usize,
    pub worst_index: usize,
}

fn axis_value(min: f64, max: f64, steps: u32, index: u32) -> f64 {
    if steps <= 1 {
        min
    } else {
        min + (max - min) * f64::from(index) / f64::from(steps - 1)
    }
}

pub fn run_sensitivity_sweep(
    inputs: &OwnCapitalInputs,
    config: SweepConfig,
) -> Result<SensitivitySweep, String> {
    validate_sweep_config(config)?;

    // The fixed-income track does not depend on the variations.
    let fixed_income_net = evaluate_own_capital(inputs).fixed_income.net_final;

    let mut cells = Vec::with_capacity((config.sale_steps * config.cost_steps) as usize);
    for sale_index in 0..config.sale_steps {
        let sale_variation = axis_value(
            config.sale_variation_min,
            config.sale_variation_max,
            config.sale_steps,
            sale_index,
        );
        for cost_index in 0..config.cost_steps {
            let cost_variation = axis_value(
                config.cost_variation_min,
                config.cost_variation_max,
                config.cost_steps,
                cost_index,
            );

            let mut candidate = inputs.clone();
            candidate.sale_price_variation = sale_variation;
            candidate.construction_cost_variation = cost_variation;
            let result = evaluate_own_capital(&candidate);

            let net_result = result.construction.net_result;
            let net_with_shield = net_result + result.construction.tax_shield;
            let compared = if config.include_tax_shield {
                net_with_shield
            } else {
                net_result
            };
            let advantage = compared - fixed_income_net;

            cells.push(SweepCell {
                sale_variation,
                cost_variation,
                net_result,
                net_with_shield,
                advantage,
                beats_fixed_income: advantage > 0.0,
            });
        }
    }

    let best_index = cells
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.advantage.total_cmp(&b.advantage))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let worst_index = cells
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.advantage.total_cmp(&b.advantage))
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    Ok(SensitivitySweep {
        fixed_income_net,
        cells,
        best_index,
        worst_index,
    })
}

fn validate_sweep_config(config: SweepConfig) -> Result<(), String> {
    for (name, value) in [
        ("sale_variation_min", config.sale_variation_min),
        ("sale_variation_max", config.sale_variation_max),
        ("cost_variation_min", config.cost_variation_min),
        ("cost_variation_max", config.cost_variation_max),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be finite"));
        }
        if !(-1.0..=1.0).contains(&value) {
            return Err(format!("{name} must be between -1 and 1"));
        }
    }
    if config.sale_variation_max < config.sale_variation_min {
        return Err("sale_variation_max must be >= sale_variation_min".to_string());
    }
    if config.cost_variation_max < config.cost_variation_min {
        return Err("cost_variation_max must be >= cost_variation_min".to_string());
    }
    if config.sale_steps == 0 || config.cost_steps == 0 {
        return Err("sale_steps and cost_steps must be > 0".to_string());
    }
    if u64::from(config.sale_steps) * u64::from(config.cost_steps) > 10_000 {
        return Err("sweep grid is limited to 10000 cells".to_string());
    }
    Ok(())
}
