//! Core duty-roster scheduling engine.
//!
//! Computes per-person monthly on-call targets and a conflict-free day/slot
//! assignment from them, with an adaptive relaxation cascade and a greedy
//! fallback when the annealed model can't find a feasible schedule in time.
//!
//! The crate is organized the way the teacher splits a metaheuristic
//! solver from its domain model: [`models`] holds the plain request/result
//! types, [`config`] holds the tunable weights and time budgets, and the
//! solving itself is split across [`target`] (per-person target counts),
//! [`assign`] (the day/slot assignment search), [`diagnostics`] (pre-solve
//! conflict detection and post-infeasibility reporting), [`orchestrator`]
//! (the relaxation cascade tying target/assign/diagnostics together), and
//! [`greedy`] (the deterministic fallback).

pub mod assign;
pub mod calendar;
pub mod config;
pub mod diagnostics;
mod dsu;
pub mod error;
pub mod greedy;
pub mod identity;
pub mod models;
pub mod orchestrator;
pub mod parse;
pub mod target;

pub use config::SolverConfig;
pub use error::{ParseError, SolverError, TargetError};
pub use models::{Person, SolveResult, SolveStatus, Targets};
pub use orchestrator::{solve, solve_with_progress, SolveRequest};
pub use target::compute_targets;

/// Progress notifications emitted during a solve, mirroring the teacher's
/// `ProgressUpdate` callback shape so a CLI or HTTP handler can stream
/// status without polling.
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// The Target Computer has produced a `Targets` table.
    TargetsComputed,
    /// A relaxation step is about to be tried, at the given gap value.
    RelaxationStep { gap: u32, label: &'static str },
    /// The greedy fallback has taken over.
    GreedyFallback,
    /// The solve finished with the given status.
    Finished(SolveStatus),
}
