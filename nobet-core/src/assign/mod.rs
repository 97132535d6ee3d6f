//! Assignment Solver: fills the day/slot grid with people.
//!
//! The distilled spec calls this "CP-SAT #2". As with the Target Computer,
//! no CP-SAT binding is available in the crate corpus, so this is built on
//! the teacher's `State` + delta-cost move architecture (`solver::State`,
//! `solver/moves/{swap,transfer}.rs`), generalized from a
//! (person → group, per session) schedule to a (person → slot, per day)
//! schedule. Hard constraints are enforced by restricting which moves are
//! ever proposed (a move that would violate one is simply never
//! generated); soft constraints enter the annealed objective in
//! [`scoring`].

mod scoring;
mod state;

pub use state::{AssignInput, State};

use crate::config::{AnnealingParams, AssignWeights};
use crate::models::{Schedule, SolveStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Outcome of a single annealed assignment attempt.
pub struct AssignOutcome {
    pub status: SolveStatus,
    pub schedule: Schedule,
    pub unfilled: usize,
}

/// Runs the annealed search for up to `annealing.time_limit_seconds`,
/// returning the best schedule found. `SolveStatus::Optimal` means every
/// slot filled with zero soft-constraint penalty surviving; `Feasible`
/// means every slot filled but some soft penalty remains; `Infeasible`
/// means at least one slot stayed empty at the end of the search budget.
pub fn solve(
    input: &AssignInput,
    weights: &AssignWeights,
    annealing: &AnnealingParams,
) -> AssignOutcome {
    let mut state = State::new(input);
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut current_cost = state.cost(weights);
    let mut best = state.clone();
    let mut best_cost = current_cost;

    let start = Instant::now();
    let deadline = Duration::from_secs(annealing.time_limit_seconds);
    let max_iters = 300_000u64;
    let mut iter = 0u64;

    while iter < max_iters && start.elapsed() < deadline {
        iter += 1;
        let progress = iter as f64 / max_iters as f64;
        let temperature = annealing.initial_temperature
            * (annealing.final_temperature / annealing.initial_temperature).powf(progress);

        let Some(mv) = state.propose_move(&mut rng) else {
            continue;
        };
        let delta = state.delta_cost(&mv, weights);
        let accept = delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature.max(1e-9)).exp();
        if accept {
            state.apply_move(&mv);
            current_cost += delta;
            if current_cost < best_cost {
                best_cost = current_cost;
                best = state.clone();
            }
        }
    }

    let unfilled = best.unfilled_count();
    let status = if unfilled > 0 {
        SolveStatus::Infeasible
    } else if best_cost <= f64::EPSILON {
        SolveStatus::Optimal
    } else {
        SolveStatus::Feasible
    };

    AssignOutcome {
        status,
        schedule: best.to_schedule(),
        unfilled,
    }
}
