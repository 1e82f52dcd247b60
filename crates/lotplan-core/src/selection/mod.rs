//! Investment selection: lot table → budget-constrained plan.
//!
//! Builds the binary model, hands it to a `Solver`, and re-checks the
//! returned assignment before turning it into a `SelectionPlan`.
pub mod dp;
pub mod model;
pub mod plan;
pub mod solver;

use log::{error, info};

use crate::error::{LotplanError, Result};
use crate::lot::Lot;
pub use dp::DynamicProgramming;
pub use model::{build_model, total_market_value, KnapsackModel, SelectionParams};
pub use plan::{extract_plan, SelectionPlan};
pub use solver::{BranchAndBound, Solution, SolveStatus, Solver};

/// Choose the energy-maximising set of non-water lots within budget.
///
/// Any error raised by the solver, and any assignment that breaks the model,
/// surfaces as `SolverFailure`. An empty plan is a normal result.
pub fn select_lots<S: Solver + ?Sized>(
    lots: &[Lot],
    solver: &S,
    params: &SelectionParams,
) -> Result<SelectionPlan> {
    let model = build_model(lots, params)?;
    info!(
        "selecting from {} lots: budget {:.2} ({:.0}% of {}), {} water lots excluded",
        model.len(),
        model.capacity,
        params.budget_fraction * 100.0,
        total_market_value(lots),
        model.n_excluded()
    );

    let solution = solver.solve(&model).map_err(|e| {
        error!("solver error: {e}");
        match e {
            LotplanError::SolverFailure(msg) => LotplanError::SolverFailure(msg),
            other => LotplanError::SolverFailure(other.to_string()),
        }
    })?;
    extract_plan(lots, &model, &solution)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::model::KnapsackModel;
    use crate::lot::{LandType, Lot};

    pub fn model(values: &[f64], weights: &[f64], capacity: f64, fixed: &[bool]) -> KnapsackModel {
        KnapsackModel {
            ids: (0..values.len() as u32).collect(),
            values: values.to_vec(),
            weights: weights.to_vec(),
            capacity,
            fixed_zero: fixed.to_vec(),
        }
    }

    /// Best objective by enumerating every feasible subset.
    pub fn brute_force(m: &KnapsackModel) -> f64 {
        let n = m.len();
        let mut best = 0.0f64;
        for mask in 0u32..(1 << n) {
            let mut w = 0.0;
            let mut v = 0.0;
            let mut ok = true;
            for i in 0..n {
                if mask & (1 << i) != 0 {
                    if m.fixed_zero[i] {
                        ok = false;
                        break;
                    }
                    w += m.weights[i];
                    v += m.values[i];
                }
            }
            if ok && w <= m.capacity + 1e-9 {
                best = best.max(v);
            }
        }
        best
    }

    pub fn lot(id: u32, cost: u64, energy: f64, water: bool) -> Lot {
        Lot {
            id,
            land_type: if water { LandType::Water } else { LandType::Shrub },
            is_water: water,
            energy,
            cost,
            area: 1,
            ndvi: 0.2,
            ndwi: if water { 0.3 } else { -0.3 },
        }
    }
}
