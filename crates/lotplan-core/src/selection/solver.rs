//! Solver contract and the branch-and-bound solver.
//!
//! Depth-first branch and bound over items sorted by energy density
//! (energy / cost, ties by variable index). Each node is bounded by the
//! fractional (Dantzig) relaxation of the remaining items; the incumbent is
//! only replaced on strict improvement, so equal-objective alternatives never
//! displace the first one found and the result is deterministic.
//!
//! The fractional bound cannot prune among items of equal density, so
//! tables with many such lots degrade to enumeration. `DynamicProgramming`
//! (see `dp.rs`) is the default solver; this one handles models it cannot
//! tabulate.

use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::model::KnapsackModel;
use crate::error::{LotplanError, Result};

/// Relative slack allowed on the budget constraint.
pub const CAPACITY_TOLERANCE: f64 = 1e-9;
/// Nodes explored between wall-clock checks.
const CLOCK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Time limit reached; best feasible assignment found so far.
    TimeLimit,
}

/// Solver output: one value per model variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub values: Vec<f64>,
    pub objective: f64,
    pub status: SolveStatus,
}

/// Anything able to solve a `KnapsackModel`. Errors map to a solver failure,
/// never to an empty plan.
pub trait Solver {
    fn solve(&self, model: &KnapsackModel) -> Result<Solution>;
}

#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    pub time_limit: Option<Duration>,
}

impl BranchAndBound {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self { time_limit }
    }
}

pub(super) struct Item {
    pub(super) var: usize,
    pub(super) value: f64,
    pub(super) weight: f64,
}

/// Model reduced to the items that need a decision.
pub(super) struct Prepared {
    /// Assignment with forced choices already made.
    pub(super) values: Vec<f64>,
    /// Energy of the forced choices.
    pub(super) base_value: f64,
    /// Open items, by descending density then variable index.
    pub(super) items: Vec<Item>,
    pub(super) tolerance: f64,
}

/// Check the model and settle every variable whose value is forced: fixed,
/// worthless or oversize items stay at zero, free items with energy are taken.
pub(super) fn prepare(model: &KnapsackModel) -> Result<Prepared> {
    let n = model.len();
    if model.weights.len() != n || model.fixed_zero.len() != n {
        return Err(LotplanError::SolverFailure(format!(
            "inconsistent model: {} values, {} weights, {} bounds",
            n,
            model.weights.len(),
            model.fixed_zero.len()
        )));
    }
    if !(model.capacity.is_finite() && model.capacity >= 0.0) {
        return Err(LotplanError::SolverFailure(format!(
            "budget {} is not a finite non-negative number",
            model.capacity
        )));
    }
    let tolerance = CAPACITY_TOLERANCE * model.capacity.max(1.0);

    let mut values = vec![0.0; n];
    let mut base_value = 0.0;
    let mut items = Vec::new();
    for i in 0..n {
        let (v, w) = (model.values[i], model.weights[i]);
        if !(v.is_finite() && w.is_finite() && w >= 0.0) {
            return Err(LotplanError::SolverFailure(format!(
                "variable {i} has non-finite or negative coefficients"
            )));
        }
        if model.fixed_zero[i] || v <= 0.0 || w > model.capacity + tolerance {
            continue;
        }
        if w == 0.0 {
            values[i] = 1.0;
            base_value += v;
            continue;
        }
        items.push(Item { var: i, value: v, weight: w });
    }
    items.sort_by(|a, b| {
        (b.value / b.weight)
            .total_cmp(&(a.value / a.weight))
            .then(a.var.cmp(&b.var))
    });
    Ok(Prepared {
        values,
        base_value,
        items,
        tolerance,
    })
}

struct Search<'a> {
    items: &'a [Item],
    taken: Vec<bool>,
    best_value: f64,
    best_taken: Vec<bool>,
    tolerance: f64,
    deadline: Option<Instant>,
    nodes: u64,
    timed_out: bool,
}

impl Search<'_> {
    /// Upper bound on value reachable from item `k` with `room` left.
    fn bound(&self, k: usize, room: f64, value: f64) -> f64 {
        let mut bound = value;
        let mut room = room;
        for item in &self.items[k..] {
            if item.weight <= room + self.tolerance {
                room -= item.weight;
                bound += item.value;
            } else {
                bound += item.value * (room / item.weight);
                break;
            }
        }
        bound
    }

    fn out_of_time(&mut self) -> bool {
        if self.timed_out {
            return true;
        }
        self.nodes += 1;
        if self.nodes % CLOCK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.timed_out = true;
                }
            }
        }
        self.timed_out
    }

    fn explore(&mut self, k: usize, room: f64, value: f64) {
        if self.out_of_time() {
            return;
        }
        if value > self.best_value {
            self.best_value = value;
            self.best_taken.copy_from_slice(&self.taken);
        }
        if k == self.items.len() || self.bound(k, room, value) <= self.best_value {
            return;
        }
        let (weight, item_value) = (self.items[k].weight, self.items[k].value);
        if weight <= room + self.tolerance {
            self.taken[k] = true;
            self.explore(k + 1, room - weight, value + item_value);
            self.taken[k] = false;
        }
        self.explore(k + 1, room, value);
    }
}

impl Solver for BranchAndBound {
    fn solve(&self, model: &KnapsackModel) -> Result<Solution> {
        let Prepared {
            mut values,
            base_value,
            items,
            tolerance,
        } = prepare(model)?;

        let mut search = Search {
            items: &items,
            taken: vec![false; items.len()],
            best_value: f64::NEG_INFINITY,
            best_taken: vec![false; items.len()],
            tolerance,
            deadline: self.time_limit.map(|d| Instant::now() + d),
            nodes: 0,
            timed_out: false,
        };
        search.explore(0, model.capacity, 0.0);

        let mut room = model.capacity;
        for (k, item) in items.iter().enumerate() {
            if search.best_taken[k] {
                values[item.var] = 1.0;
                room -= item.weight;
            }
        }
        let status = if search.timed_out {
            warn!(
                "branch and bound hit its time limit after {} nodes; returning best feasible plan",
                search.nodes
            );
            SolveStatus::TimeLimit
        } else {
            SolveStatus::Optimal
        };
        debug!(
            "branch and bound: {} candidates, {} nodes, budget left {:.2}",
            items.len(),
            search.nodes,
            room
        );

        Ok(Solution {
            objective: base_value + search.best_value.max(0.0),
            values,
            status,
        })
    }
}
