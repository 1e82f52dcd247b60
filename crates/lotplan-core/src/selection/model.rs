//! Binary selection model built from the lot table.
//!
//!   maximise   Σ energy[i] · x[i]
//!   subject to Σ cost[i] · x[i] ≤ budget
//!              x[i] = 0            for every water lot
//!              x[i] ∈ {0, 1}
//!
//! with `budget = budget_fraction × Σ cost[i]` over every lot in the table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LotplanError, Result};
use crate::lot::Lot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    /// Share of the total market value of all lots available to invest.
    pub budget_fraction: f64,
    /// Wall-clock limit for the solver in milliseconds. `None` runs to optimality.
    pub time_limit_ms: Option<u64>,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            budget_fraction: 0.15,
            time_limit_ms: None,
        }
    }
}

impl SelectionParams {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.budget_fraction.is_finite() && self.budget_fraction >= 0.0) {
            return Err(LotplanError::InvalidParameter {
                name: "budget_fraction",
                reason: format!("must be finite and >= 0, got {}", self.budget_fraction),
            });
        }
        Ok(())
    }
}

/// One binary variable per lot, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackModel {
    /// Lot id behind each variable.
    pub ids: Vec<u32>,
    /// Objective coefficients (energy).
    pub values: Vec<f64>,
    /// Budget-constraint coefficients (cost).
    pub weights: Vec<f64>,
    /// Right-hand side of the budget constraint.
    pub capacity: f64,
    /// Variables bounded to zero (water exclusion).
    pub fixed_zero: Vec<bool>,
}

impl KnapsackModel {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn n_excluded(&self) -> usize {
        self.fixed_zero.iter().filter(|&&f| f).count()
    }

    /// Objective value of a 0/1 assignment (entries > 0.5 count as selected).
    pub fn objective(&self, x: &[f64]) -> f64 {
        self.values
            .iter()
            .zip(x)
            .filter(|&(_, &xi)| xi > 0.5)
            .map(|(v, _)| v)
            .sum()
    }

    /// Budget used by a 0/1 assignment.
    pub fn used_capacity(&self, x: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(x)
            .filter(|&(_, &xi)| xi > 0.5)
            .map(|(w, _)| w)
            .sum()
    }
}

/// Total cost of every lot in the table, water included.
pub fn total_market_value(lots: &[Lot]) -> u64 {
    lots.iter().map(|l| l.cost).sum()
}

/// Build the selection model. Fails on an empty table or on a lot whose
/// energy is negative or non-finite.
pub fn build_model(lots: &[Lot], params: &SelectionParams) -> Result<KnapsackModel> {
    params.validate()?;
    if lots.is_empty() {
        return Err(LotplanError::EmptyInput("lot table has no rows".into()));
    }
    if let Some(bad) = lots.iter().find(|l| !(l.energy.is_finite() && l.energy >= 0.0)) {
        return Err(LotplanError::Table(format!(
            "lot {} has invalid energy {}",
            bad.id, bad.energy
        )));
    }

    Ok(KnapsackModel {
        ids: lots.iter().map(|l| l.id).collect(),
        values: lots.iter().map(|l| l.energy).collect(),
        weights: lots.iter().map(|l| l.cost as f64).collect(),
        capacity: total_market_value(lots) as f64 * params.budget_fraction,
        fixed_zero: lots.iter().map(|l| l.is_water).collect(),
    })
}
