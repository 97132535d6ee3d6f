//! Adaptive orchestrator: ties the target computer, assignment solver,
//! diagnostics, and greedy fallback together under a single time budget.
//!
//! Grounded on `examples/original_source/functions/greedy_solver.py`'s
//! backtracking cascade and spec.md §4.4's 50/40/10 split: the first
//! attempt gets half the overall time budget, each relaxation step
//! retries within the remaining 40%, and the final 10% is reserved for the
//! greedy fallback if nothing else found a feasible schedule.

use crate::assign::{self, AssignInput};
use crate::calendar::DayType;
use crate::config::SolverConfig;
use crate::diagnostics::relax::{self, RelaxAction};
use crate::diagnostics::{feasibility_report, scan_manual_conflicts};
use crate::greedy;
use crate::models::{
    ManualAssignment, Person, RelaxationInfo, RoleExceptions, RoleRestriction, Rule, RuleKind,
    SolveResult, SolveStatistics, SolveStatus, Targets, TogetherExceptions,
};
use crate::target::{self, TargetInput};
use crate::ProgressUpdate;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Full request payload for a solve (mirrors the teacher's `ApiInput`
/// shape: problem data plus solver configuration in one struct).
pub struct SolveRequest {
    pub persons: Vec<Person>,
    pub duties: Vec<crate::models::Duty>,
    pub rules: Vec<Rule>,
    pub role_restrictions: Vec<RoleRestriction>,
    pub manual_assignments: Vec<ManualAssignment>,
    pub day_count: u32,
    pub day_types: HashMap<u32, DayType>,
    pub type_slots: HashMap<DayType, u32>,
    pub locked_targets: crate::models::LockedTargets,
    pub role_exceptions: RoleExceptions,
    pub together_exceptions: TogetherExceptions,
    pub config: SolverConfig,
}

/// Callback invoked with progress notifications during a solve. Returning
/// `false` requests early termination, mirroring the teacher's
/// `ProgressCallback`.
pub type ProgressCallback<'a> = dyn Fn(&ProgressUpdate) -> bool + 'a;

pub fn solve(request: &SolveRequest) -> SolveResult {
    solve_with_progress(request, None)
}

pub fn solve_with_progress(
    request: &SolveRequest,
    progress: Option<&ProgressCallback>,
) -> SolveResult {
    let mut statistics = SolveStatistics::default();

    let target_input = TargetInput {
        persons: &request.persons,
        rules: &request.rules,
        duties: &request.duties,
        type_slots: request.type_slots.clone(),
        day_counts: day_type_counts(&request.day_types),
        locked: request.locked_targets.clone(),
    };
    let targets = match target::compute_targets(
        &target_input,
        &request.config.target_weights,
        &request.config.hour_weights,
        &request.config.target_annealing,
    ) {
        Ok(t) => t,
        Err(_) => {
            statistics.root_cause = Some("hedef hesaplama cozumsuz".to_string());
            return SolveResult {
                status: SolveStatus::Infeasible,
                schedule: None,
                quality: None,
                statistics,
            };
        }
    };
    notify(progress, &ProgressUpdate::TargetsComputed);

    let assign_input = AssignInput {
        persons: &request.persons,
        duties: &request.duties,
        day_count: request.day_count,
        day_types: &request.day_types,
        targets: &targets,
        rules: &request.rules,
        role_restrictions: &request.role_restrictions,
        manual_assignments: &request.manual_assignments,
        gap: request.config.gap,
        role_exceptions: &request.role_exceptions,
        together_exceptions: &request.together_exceptions,
    };

    let manual_conflicts = scan_manual_conflicts(&assign_input);
    if !manual_conflicts.is_empty() {
        statistics.manual_conflicts = manual_conflicts;
        return SolveResult {
            status: SolveStatus::ManualConflict,
            schedule: None,
            quality: None,
            statistics,
        };
    }

    let total_budget = Duration::from_secs(request.config.assign_annealing.time_limit_seconds);
    let first_attempt_budget = total_budget.mul_f64(0.5);
    let relax_budget = total_budget.mul_f64(0.4);
    let greedy_budget = total_budget - first_attempt_budget - relax_budget;

    let mut config = request.config.clone();
    config.assign_annealing.time_limit_seconds = first_attempt_budget.as_secs().max(1);

    let outcome = assign::solve(&assign_input, &config.assign_weights, &config.assign_annealing);
    if outcome.unfilled == 0 {
        let quality = compute_quality(
            &request.persons,
            &targets,
            &outcome.schedule,
            &request.day_types,
            &request.config.hour_weights,
        );
        notify(progress, &ProgressUpdate::Finished(outcome.status));
        return SolveResult {
            status: outcome.status,
            schedule: Some(outcome.schedule),
            quality: Some(quality),
            statistics,
        };
    }

    let report = {
        let state = assign::State::new(&assign_input);
        feasibility_report(&assign_input, &state)
    };
    statistics.feasibility = Some(report.clone());

    let actions = relax::recommend(&report, request.config.gap);
    let relax_start = Instant::now();
    let mut relaxed_rules = request.rules.clone();
    let mut relaxed_duties = request.duties.clone();
    let mut current_gap = request.config.gap;
    let mut info = RelaxationInfo::default();

    // Tries one search attempt at the given gap value with the current
    // relaxation state; returns the outcome alongside the budget check.
    macro_rules! try_gap {
        ($gap:expr) => {{
            let step_input = AssignInput {
                persons: &request.persons,
                duties: &relaxed_duties,
                day_count: request.day_count,
                day_types: &request.day_types,
                targets: &targets,
                rules: &relaxed_rules,
                role_restrictions: &request.role_restrictions,
                manual_assignments: &request.manual_assignments,
                gap: $gap,
                role_exceptions: &request.role_exceptions,
                together_exceptions: &request.together_exceptions,
            };
            let mut step_weights = config.assign_weights.clone();
            if info.all_soft_removed {
                step_weights = crate::config::AssignWeights {
                    role_quota: 0.0,
                    day_type_quota: 0.0,
                    total_target: 0.0,
                    together: 0.0,
                    weekly_homogeneity: 0.0,
                    window_gap: 0.0,
                    window_gap_wide: 0.0,
                    annual_deficit: 0.0,
                    crowding: 0.0,
                    ..step_weights
                };
            }
            let remaining = relax_budget.saturating_sub(relax_start.elapsed());
            let mut step_annealing = config.assign_annealing.clone();
            step_annealing.time_limit_seconds = remaining.as_secs().max(1);
            assign::solve(&step_input, &step_weights, &step_annealing)
        }};
    }

    'relax: for action in actions {
        if relax_start.elapsed() >= relax_budget {
            break;
        }
        notify(
            progress,
            &ProgressUpdate::RelaxationStep {
                gap: current_gap,
                label: action.label(),
            },
        );
        match action {
            RelaxAction::GapReduce if current_gap > 0 => {
                // Step through the full range down to 0, not just one
                // notch, trying a solve at each value (§4.4 "at each step
                // also try gap = k, k-1, ..., 0").
                while current_gap > 0 {
                    if relax_start.elapsed() >= relax_budget {
                        break 'relax;
                    }
                    current_gap -= 1;
                    info.gap_reduced_to = Some(current_gap);
                    let step_outcome = try_gap!(current_gap);
                    if step_outcome.unfilled == 0 {
                        statistics.relaxation_applied = info;
                        let quality = compute_quality(
                            &request.persons,
                            &targets,
                            &step_outcome.schedule,
                            &request.day_types,
                            &request.config.hour_weights,
                        );
                        notify(progress, &ProgressUpdate::Finished(step_outcome.status));
                        return SolveResult {
                            status: step_outcome.status,
                            schedule: Some(step_outcome.schedule),
                            quality: Some(quality),
                            statistics,
                        };
                    }
                }
                continue;
            }
            RelaxAction::ExclusiveRelax => {
                info.exclusive_relaxed = true;
                for duty in relaxed_duties.iter_mut() {
                    if report
                        .exclusive_relax_roles
                        .iter()
                        .any(|r| r == duty.role_key())
                    {
                        duty.exclusive = false;
                    }
                }
            }
            RelaxAction::SeparateRemove => {
                relaxed_rules.retain(|r| r.kind != RuleKind::Separate);
                info.separate_removed = true;
            }
            RelaxAction::TogetherRemove => {
                relaxed_rules.retain(|r| r.kind != RuleKind::Together);
                info.together_removed = true;
            }
            RelaxAction::AllSoftRemove => {
                info.all_soft_removed = true;
            }
            RelaxAction::Greedy => {
                info.greedy_used = true;
                break;
            }
            RelaxAction::GapReduce => {}
        }

        let step_outcome = try_gap!(current_gap);

        if step_outcome.unfilled == 0 {
            statistics.relaxation_applied = info;
            let quality = compute_quality(
                &request.persons,
                &targets,
                &step_outcome.schedule,
                &request.day_types,
                &request.config.hour_weights,
            );
            notify(progress, &ProgressUpdate::Finished(step_outcome.status));
            return SolveResult {
                status: step_outcome.status,
                schedule: Some(step_outcome.schedule),
                quality: Some(quality),
                statistics,
            };
        }
    }

    info.greedy_used = true;
    statistics.relaxation_applied = info;
    statistics.greedy_fallback = true;
    notify(progress, &ProgressUpdate::GreedyFallback);

    let greedy_input = greedy::GreedyInput {
        persons: &request.persons,
        duties: &relaxed_duties,
        day_count: request.day_count,
        day_types: &request.day_types,
        targets: &targets,
        rules: &relaxed_rules,
        role_restrictions: &request.role_restrictions,
        manual_assignments: &request.manual_assignments,
        gap: current_gap,
        time_budget: greedy_budget,
    };
    let greedy_result = greedy::solve(&greedy_input);
    let status = if greedy_result.schedule.filled_count() == greedy_result.schedule.total_cells() {
        SolveStatus::Feasible
    } else {
        SolveStatus::Infeasible
    };
    let quality = compute_quality(
        &request.persons,
        &targets,
        &greedy_result.schedule,
        &request.day_types,
        &request.config.hour_weights,
    );
    notify(progress, &ProgressUpdate::Finished(status));

    SolveResult {
        status,
        schedule: Some(greedy_result.schedule),
        quality: Some(quality),
        statistics,
    }
}

fn notify(progress: Option<&ProgressCallback>, update: &ProgressUpdate) {
    if let Some(cb) = progress {
        cb(update);
    }
}

fn day_type_counts(day_types: &HashMap<u32, DayType>) -> HashMap<DayType, u32> {
    let mut counts = HashMap::new();
    for t in day_types.values() {
        *counts.entry(*t).or_insert(0) += 1;
    }
    counts
}

/// Computes the five quality metrics reported alongside a schedule
/// (spec.md §8, literal formulas):
/// - `denge_puani = (max_count - min_count) / mean_count * 100`
/// - `saat_adaleti = stdev(person_hours) / mean_person_hours * 100`
/// - `homojenlik = stdev(intra-person day-intervals)`
/// - `doluluk = filled / total * 100`
/// - `kural_uyumu = (1 - mean(|target - actual| / target)) * 100`
fn compute_quality(
    persons: &[Person],
    targets: &Targets,
    schedule: &crate::models::Schedule,
    day_types: &HashMap<u32, DayType>,
    hours: &crate::config::HourWeights,
) -> crate::models::QualityScore {
    let mut realized_days: HashMap<i64, Vec<u32>> = HashMap::new();
    for a in schedule.assignments() {
        realized_days.entry(a.person_id).or_default().push(a.day);
    }

    let counts: Vec<f64> = persons
        .iter()
        .map(|p| realized_days.get(&p.id).map(|d| d.len()).unwrap_or(0) as f64)
        .collect();
    let mean_count = mean(&counts);
    let denge_puani = if mean_count > 0.0 {
        let max_count = counts.iter().cloned().fold(f64::MIN, f64::max).max(0.0);
        let min_count = counts.iter().cloned().fold(f64::MAX, f64::min).max(0.0);
        (max_count - min_count) / mean_count * 100.0
    } else {
        0.0
    };

    let person_hours: Vec<f64> = persons
        .iter()
        .map(|p| {
            realized_days
                .get(&p.id)
                .map(|days| {
                    days.iter()
                        .map(|d| hours.get(*day_types.get(d).unwrap_or(&DayType::Hici)) as f64)
                        .sum::<f64>()
                })
                .unwrap_or(0.0)
        })
        .collect();
    let mean_hours = mean(&person_hours);
    let saat_adaleti = if mean_hours > 0.0 {
        stdev(&person_hours) / mean_hours * 100.0
    } else {
        0.0
    };

    let mut intervals: Vec<f64> = Vec::new();
    for days in realized_days.values() {
        let mut sorted = days.clone();
        sorted.sort_unstable();
        for w in sorted.windows(2) {
            intervals.push((w[1] - w[0]) as f64);
        }
    }
    let homojenlik = stdev(&intervals);

    let doluluk = if schedule.total_cells() == 0 {
        100.0
    } else {
        schedule.filled_count() as f64 / schedule.total_cells() as f64 * 100.0
    };

    let deviation_ratios: Vec<f64> = persons
        .iter()
        .filter_map(|p| {
            let target = targets.per_person.get(&p.id).map(|t| t.total).unwrap_or(0) as f64;
            if target <= 0.0 {
                return None;
            }
            let actual = realized_days.get(&p.id).map(|d| d.len()).unwrap_or(0) as f64;
            Some((target - actual).abs() / target)
        })
        .collect();
    let kural_uyumu = (1.0 - mean(&deviation_ratios)) * 100.0;

    crate::models::QualityScore {
        denge_puani,
        saat_adaleti,
        homojenlik,
        doluluk,
        kural_uyumu,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
