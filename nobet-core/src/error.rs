//! Error types shared across the crate.

use thiserror::Error;

/// Errors raised while turning a loosely-typed request document into
/// validated domain objects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("duplicate person id after normalization: {0}")]
    DuplicatePersonId(i64),
    #[error("unknown person reference: {0:?}")]
    UnknownPersonRef(String),
    #[error("rule {index} has fewer than 2 members")]
    RuleTooFewMembers { index: usize },
    #[error("slot index {slot} out of range [0, {slot_count})")]
    SlotOutOfRange { slot: usize, slot_count: usize },
    #[error("day {day} out of range [1, {day_count}]")]
    DayOutOfRange { day: u32, day_count: u32 },
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("rule {index} has unknown kind {kind:?}")]
    UnknownRuleKind { kind: String, index: usize },
}

/// Errors raised by the Target Computer's optimization model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetError {
    #[error("Hedef CP-SAT çözümsüz - kapasite yetersiz olabilir")]
    Infeasible,
    #[error("invalid target configuration: {0}")]
    Validation(String),
}

/// Errors raised by the Assignment Solver.
///
/// Mirrors the teacher's `solver::SolverError`: a single validation variant
/// carrying a descriptive message, since every other failure mode
/// (infeasibility) is not an error but a `SolveOutcome::Infeasible` value
/// that diagnostics and the adaptive orchestrator act on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("constraint violation: {0}")]
    Validation(String),
}

impl From<ParseError> for SolverError {
    fn from(e: ParseError) -> Self {
        SolverError::Validation(e.to_string())
    }
}
