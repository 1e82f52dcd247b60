//! Exact solver by dynamic programming over integer cost.
//!
//! Lot costs are whole numbers, so after dividing every open item's cost by
//! their greatest common divisor the budget becomes a table of `cap + 1`
//! integer cells. `best[c]` holds the highest energy reachable with cost at
//! most `c`; one bit per (item, cell) records whether taking the item
//! improved that cell, which is enough to rebuild the assignment. Run time
//! is `items × cells` whatever the energy/cost ratios are.
//!
//! Models that cannot be tabulated (fractional costs, or a table beyond
//! `max_cells`) are handed to `BranchAndBound`.

use std::time::{Duration, Instant};

use log::{debug, warn};

use super::model::KnapsackModel;
use super::solver::{prepare, BranchAndBound, Prepared, Solution, SolveStatus, Solver};
use crate::error::Result;

/// Default bound on `items × cells`: 2^31 decision bits, 256 MiB.
pub const DEFAULT_MAX_CELLS: u64 = 1 << 31;
/// Largest budget, in gcd units, kept as an `f64` row.
const MAX_CAPACITY_UNITS: u64 = 1 << 24;
/// Costs above this are not exactly representable as `f64` integers.
const MAX_EXACT_COST: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone)]
pub struct DynamicProgramming {
    /// Wall-clock limit; checked between items.
    pub time_limit: Option<Duration>,
    pub max_cells: u64,
}

impl Default for DynamicProgramming {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl DynamicProgramming {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            time_limit,
            ..Self::default()
        }
    }

    fn fall_back(&self, model: &KnapsackModel, why: &str) -> Result<Solution> {
        warn!("cost table not usable ({why}); solving by branch and bound");
        BranchAndBound::new(self.time_limit).solve(model)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Solver for DynamicProgramming {
    fn solve(&self, model: &KnapsackModel) -> Result<Solution> {
        let Prepared {
            mut values,
            base_value,
            items,
            tolerance,
        } = prepare(model)?;

        if items
            .iter()
            .any(|it| it.weight.fract() != 0.0 || it.weight > MAX_EXACT_COST)
        {
            return self.fall_back(model, "fractional costs");
        }
        let costs: Vec<u64> = items.iter().map(|it| it.weight as u64).collect();
        let unit = costs.iter().fold(0, |g, &c| gcd(g, c)).max(1);
        let units: Vec<usize> = costs.iter().map(|&c| (c / unit) as usize).collect();
        let total_units = costs.iter().fold(0u64, |s, &c| s.saturating_add(c / unit));
        let cap = (((model.capacity + tolerance) / unit as f64).floor() as u64).min(total_units);

        let width = cap as usize + 1;
        let words = width.div_ceil(64);
        let cells = (items.len() as u64).saturating_mul(width as u64);
        if cap > MAX_CAPACITY_UNITS || cells > self.max_cells {
            return self.fall_back(
                model,
                &format!("{} items × {} cells exceeds the table limit", items.len(), width),
            );
        }

        let deadline = self.time_limit.map(|d| Instant::now() + d);
        let mut best = vec![0.0f64; width];
        let mut improved = vec![0u64; items.len() * words];
        let mut rows = items.len();
        for (i, item) in items.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                rows = i;
                break;
            }
            let w = units[i];
            let row = &mut improved[i * words..(i + 1) * words];
            for c in (w..width).rev() {
                let with_item = best[c - w] + item.value;
                if with_item > best[c] {
                    best[c] = with_item;
                    row[c / 64] |= 1 << (c % 64);
                }
            }
        }

        // Walk the decision bits back from the full budget.
        let mut c = width - 1;
        for i in (0..rows).rev() {
            if improved[i * words + c / 64] >> (c % 64) & 1 == 1 {
                values[items[i].var] = 1.0;
                c -= units[i];
            }
        }

        let status = if rows < items.len() {
            warn!(
                "cost table hit its time limit after {rows} of {} items; returning best feasible plan",
                items.len()
            );
            SolveStatus::TimeLimit
        } else {
            SolveStatus::Optimal
        };
        debug!(
            "cost table: {} items, {} cells of {} each",
            items.len(),
            width,
            unit
        );

        Ok(Solution {
            objective: base_value + best[width - 1],
            values,
            status,
        })
    }
}
