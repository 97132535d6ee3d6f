//! Ranked relaxation recommendations, consumed by the adaptive
//! orchestrator when a search attempt comes back infeasible.
//!
//! Grounded on `examples/original_source/functions/greedy_solver.py`'s
//! backtracking cascade, generalized into a ranked action list rather than
//! a single hard-coded fallback order, per spec.md §4.4.

use crate::models::DiagnosticsReport;

/// One candidate relaxation, ranked by how much structural slack it is
/// expected to buy relative to how much it degrades schedule quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxAction {
    /// Lower the minimum gap between a person's assignments by one.
    GapReduce,
    /// Allow exclusive-duty restrictions to be crossed.
    ExclusiveRelax,
    /// Drop `separate` rules entirely.
    SeparateRemove,
    /// Drop `together` rules entirely.
    TogetherRemove,
    /// Drop every soft constraint, keeping only hard slot-filling.
    AllSoftRemove,
    /// Abandon the annealed search and fall back to the greedy solver.
    Greedy,
}

impl RelaxAction {
    pub fn label(self) -> &'static str {
        match self {
            RelaxAction::GapReduce => "ara_gun_azalt",
            RelaxAction::ExclusiveRelax => "exclusive_gevset",
            RelaxAction::SeparateRemove => "ayri_gevset",
            RelaxAction::TogetherRemove => "birlikte_kaldir",
            RelaxAction::AllSoftRemove => "tum_soft_kaldir",
            RelaxAction::Greedy => "greedy",
        }
    }
}

/// Recommends the ordered cascade of relaxations to try, cheapest
/// (least quality impact) first. `gap` is the current configured gap;
/// when it is already 0, `GapReduce` is skipped since there is nothing
/// left to reduce.
pub fn recommend(report: &DiagnosticsReport, gap: u32) -> Vec<RelaxAction> {
    let mut actions = Vec::new();
    if gap > 0 {
        actions.push(RelaxAction::GapReduce);
    }
    if !report.role_capacity_gaps.is_empty() {
        actions.push(RelaxAction::ExclusiveRelax);
    }
    actions.push(RelaxAction::SeparateRemove);
    actions.push(RelaxAction::TogetherRemove);
    actions.push(RelaxAction::AllSoftRemove);
    actions.push(RelaxAction::Greedy);
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiagnosticsReport;

    #[test]
    fn gap_reduce_skipped_once_gap_is_zero() {
        let report = DiagnosticsReport::default();
        let actions = recommend(&report, 0);
        assert!(!actions.contains(&RelaxAction::GapReduce));
        assert_eq!(actions.last(), Some(&RelaxAction::Greedy));
    }

    #[test]
    fn gap_reduce_leads_when_gap_available() {
        let report = DiagnosticsReport::default();
        let actions = recommend(&report, 2);
        assert_eq!(actions.first(), Some(&RelaxAction::GapReduce));
    }
}
