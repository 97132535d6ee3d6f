//! Solver configuration: penalty weights, time budgets, and logging gates.
//!
//! Grounded on the teacher's `models::SolverConfiguration` /
//! `LoggingOptions` split: the weights that `ortools_solver.py` hard-codes
//! as module-level constants (`WEIGHT_GOREV_KOTA`, `WEIGHT_GUN_TIPI`, ...)
//! are instead exposed on a plain, overridable, `serde`-deserializable
//! struct, per the redesign note in spec.md §9.

use serde::{Deserialize, Serialize};

/// Penalty weights for the Target Computer's objective (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetWeights {
    pub count_clamp: f64,
    pub count_shortfall: f64,
    pub hour_balance: f64,
    pub weekend_balance: f64,
    pub together_equality: f64,
}

impl Default for TargetWeights {
    fn default() -> Self {
        TargetWeights {
            count_clamp: 100_000.0,
            count_shortfall: 10_000.0,
            hour_balance: 50.0,
            weekend_balance: 10.0,
            together_equality: 500.0,
        }
    }
}

/// Penalty weights for the Assignment Solver's objective (§4.3 soft terms).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignWeights {
    pub empty_slot: f64,
    pub role_quota: f64,
    pub day_type_quota: f64,
    pub total_target: f64,
    pub together: f64,
    pub weekly_homogeneity: f64,
    pub window_gap: f64,
    pub window_gap_wide: f64,
    pub annual_deficit: f64,
    pub crowding: f64,
}

impl Default for AssignWeights {
    fn default() -> Self {
        AssignWeights {
            empty_slot: 100_000.0,
            role_quota: 1_000.0,
            day_type_quota: 500.0,
            total_target: 100.0,
            together: 500.0,
            weekly_homogeneity: 300.0,
            window_gap: 300.0,
            window_gap_wide: 1_500.0,
            annual_deficit: 400.0,
            crowding: 250.0,
        }
    }
}

/// Per-day-type hour weights, overridable but defaulting to §4.2's table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourWeights {
    pub hici: u32,
    pub prs: u32,
    pub cum: u32,
    pub cmt: u32,
    pub pzr: u32,
}

impl Default for HourWeights {
    fn default() -> Self {
        HourWeights {
            hici: 8,
            prs: 8,
            cum: 16,
            cmt: 24,
            pzr: 16,
        }
    }
}

impl HourWeights {
    pub fn get(&self, t: crate::calendar::DayType) -> u32 {
        use crate::calendar::DayType::*;
        match t {
            Hici => self.hici,
            Prs => self.prs,
            Cum => self.cum,
            Cmt => self.cmt,
            Pzr => self.pzr,
        }
    }
}

/// Simulated-annealing parameters shared by the target and assignment
/// models (teacher's `SimulatedAnnealingParams`), each with its own time cap
/// per §4.2/§4.3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingParams {
    pub initial_temperature: f64,
    pub final_temperature: f64,
    pub time_limit_seconds: u64,
    pub workers: usize,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        AnnealingParams {
            initial_temperature: 1_000.0,
            final_temperature: 0.05,
            time_limit_seconds: 10,
            workers: 4,
        }
    }
}

/// Top-level solver configuration, overridable per request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolverConfig {
    #[serde(default)]
    pub target_weights: TargetWeights,
    #[serde(default)]
    pub assign_weights: AssignWeights,
    #[serde(default)]
    pub hour_weights: HourWeights,
    #[serde(default)]
    pub target_annealing: AnnealingParams,
    #[serde(default)]
    pub assign_annealing: AnnealingParams,
    /// Minimum day-distance between two assignments of the same person.
    #[serde(default = "default_gap")]
    pub gap: u32,
    #[serde(default)]
    pub logging: SolverLogging,
}

fn default_gap() -> u32 {
    2
}

/// Gates diagnostic output, mirroring the teacher's `LoggingOptions`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolverLogging {
    #[serde(default)]
    pub log_stop_condition: bool,
    #[serde(default)]
    pub log_final_score_breakdown: bool,
}
