use log::warn;
use serde::Serialize;

use super::model::KnapsackModel;
use super::solver::{Solution, SolveStatus, CAPACITY_TOLERANCE};
use crate::error::{LotplanError, Result};
use crate::lot::Lot;

/// Output of one selector run: the chosen lots and their totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionPlan {
    /// Full records of the selected lots, in table order.
    pub lots: Vec<Lot>,
    pub total_cost: u64,
    pub total_energy: f64,
    pub count: usize,
    /// Budget the plan was solved against.
    pub budget: f64,
    pub status: SolveStatus,
}

impl SelectionPlan {
    pub fn ids(&self) -> Vec<u32> {
        self.lots.iter().map(|l| l.id).collect()
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Turn a solver assignment into a plan. Every lot with `x > 0.5` is
/// selected. The assignment is re-checked against the model: a wrong
/// length, a selected water lot, or a budget overrun is a solver failure.
pub fn extract_plan(lots: &[Lot], model: &KnapsackModel, solution: &Solution) -> Result<SelectionPlan> {
    if solution.values.len() != lots.len() || model.len() != lots.len() {
        return Err(LotplanError::SolverFailure(format!(
            "assignment has {} values for {} lots",
            solution.values.len(),
            lots.len()
        )));
    }
    if let Some(x) = solution.values.iter().find(|x| !x.is_finite()) {
        return Err(LotplanError::SolverFailure(format!("assignment contains {x}")));
    }

    let selected: Vec<Lot> = lots
        .iter()
        .zip(&solution.values)
        .filter(|&(_, &x)| x > 0.5)
        .map(|(lot, _)| lot.clone())
        .collect();

    if let Some(water) = selected.iter().find(|l| l.is_water) {
        return Err(LotplanError::SolverFailure(format!(
            "solver selected water lot {}",
            water.id
        )));
    }

    let total_cost: u64 = selected.iter().map(|l| l.cost).sum();
    let slack = CAPACITY_TOLERANCE * model.capacity.max(1.0);
    if total_cost as f64 > model.capacity + slack {
        return Err(LotplanError::SolverFailure(format!(
            "selected cost {total_cost} exceeds budget {:.2}",
            model.capacity
        )));
    }
    let total_energy: f64 = selected.iter().map(|l| l.energy).sum();
    if (total_energy - solution.objective).abs() > 1e-6 * total_energy.max(1.0) {
        warn!(
            "solver objective {:.4} differs from recomputed energy {:.4}",
            solution.objective, total_energy
        );
    }

    Ok(SelectionPlan {
        count: selected.len(),
        lots: selected,
        total_cost,
        total_energy,
        budget: model.capacity,
        status: solution.status,
    })
}
