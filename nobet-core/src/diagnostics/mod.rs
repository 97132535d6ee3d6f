//! Pre-solve manual-pin conflict detection and post-infeasibility
//! reporting.
//!
//! Grounded on the teacher's constraint-preprocessing validation pass
//! (`solver/validation.rs`), which walks every constraint once up front and
//! collects violations rather than discovering them mid-search.

pub mod relax;

use crate::assign::AssignInput;
use crate::models::{DiagnosticsReport, ManualConflict, ManualConflictCode, RoleCapacityGap};
use std::collections::{HashMap, HashSet};

const MAX_CONFLICTS: usize = 50;

/// Scans manual pins for conflicts before any search runs. Stops
/// accumulating once `MAX_CONFLICTS` are found (§4.4 "capped at 50").
pub fn scan_manual_conflicts(input: &AssignInput) -> Vec<ManualConflict> {
    let mut out = Vec::new();
    let index_of: HashMap<i64, usize> = input
        .persons
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    let mut seen_day_person: HashSet<(u32, i64)> = HashSet::new();
    let mut seen_day_slot: HashSet<(u32, usize)> = HashSet::new();

    for m in input.manual_assignments {
        if out.len() >= MAX_CONFLICTS {
            break;
        }
        let Some(&person_idx) = index_of.get(&m.person_id) else {
            out.push(conflict(
                ManualConflictCode::ManuelKisiYok,
                Some(m.person_id),
                Some(m.day),
                Some(m.slot_index),
                format!("unknown person id {}", m.person_id),
            ));
            continue;
        };

        if m.day == 0 || m.day > input.day_count {
            out.push(conflict(
                ManualConflictCode::ManuelGunHatali,
                Some(m.person_id),
                Some(m.day),
                Some(m.slot_index),
                format!("day {} out of range", m.day),
            ));
            continue;
        }

        if m.slot_index >= input.duties.len() {
            out.push(conflict(
                ManualConflictCode::ManuelSlotHatali,
                Some(m.person_id),
                Some(m.day),
                Some(m.slot_index),
                format!("slot {} out of range", m.slot_index),
            ));
            continue;
        }

        let person = &input.persons[person_idx];
        if person.is_excused(m.day) {
            out.push(conflict(
                ManualConflictCode::MazeretGunu,
                Some(m.person_id),
                Some(m.day),
                Some(m.slot_index),
                "person is excused on this day".to_string(),
            ));
        }

        let duty = &input.duties[m.slot_index];
        if let Some(restriction) = input
            .role_restrictions
            .iter()
            .find(|r| r.person_id == m.person_id)
        {
            let role_ok = restriction.restricted_role == duty.role_key();
            let overflow_ok = restriction
                .overflow_role
                .as_deref()
                .map(|r| r == duty.role_key())
                .unwrap_or(false);
            if !role_ok && !overflow_ok {
                out.push(conflict(
                    ManualConflictCode::KisitlamaIhlali,
                    Some(m.person_id),
                    Some(m.day),
                    Some(m.slot_index),
                    format!("person is restricted to {}", restriction.restricted_role),
                ));
            }
            if restriction.is_pool() && !restriction.pool_members.contains(&m.person_id) {
                out.push(conflict(
                    ManualConflictCode::HavuzIhlali,
                    Some(m.person_id),
                    Some(m.day),
                    Some(m.slot_index),
                    "person is not a member of the duty's pool".to_string(),
                ));
            }
        }

        if duty.exclusive {
            let permitted = input
                .role_restrictions
                .iter()
                .any(|r| r.person_id == m.person_id && r.restricted_role == duty.role_key());
            if !permitted {
                out.push(conflict(
                    ManualConflictCode::ExclusiveIhlali,
                    Some(m.person_id),
                    Some(m.day),
                    Some(m.slot_index),
                    "duty is exclusive to a different role pool".to_string(),
                ));
            }
        }

        if !seen_day_person.insert((m.day, m.person_id)) {
            out.push(conflict(
                ManualConflictCode::AyniGunCiftAtama,
                Some(m.person_id),
                Some(m.day),
                Some(m.slot_index),
                "person already manually pinned on this day".to_string(),
            ));
        }
        if !seen_day_slot.insert((m.day, m.slot_index)) {
            out.push(conflict(
                ManualConflictCode::AyniSlotCiftAtama,
                Some(m.person_id),
                Some(m.day),
                Some(m.slot_index),
                "slot already manually pinned on this day".to_string(),
            ));
        }
    }

    for rule in input.rules {
        if rule.kind != crate::models::RuleKind::Separate {
            continue;
        }
        let members: HashSet<i64> = rule.members.iter().copied().collect();
        let mut by_day: HashMap<u32, Vec<i64>> = HashMap::new();
        for m in input.manual_assignments {
            if members.contains(&m.person_id) {
                by_day.entry(m.day).or_default().push(m.person_id);
            }
        }
        for (day, people) in by_day {
            if people.len() > 1 {
                out.push(conflict(
                    ManualConflictCode::AyriKuraliIhlali,
                    people.first().copied(),
                    Some(day),
                    None,
                    "separate-rule members both manually pinned on the same day".to_string(),
                ));
            }
        }
    }

    out
}

fn conflict(
    code: ManualConflictCode,
    person_id: Option<i64>,
    day: Option<u32>,
    slot_index: Option<usize>,
    message: String,
) -> ManualConflict {
    ManualConflict {
        code,
        person_id,
        day,
        slot_index,
        message,
    }
}

/// Builds a feasibility report after an infeasible search: which (day, slot)
/// cells have no admissible candidate at all (not merely none left unfilled
/// by the search), which roles are structurally over-demanded relative to a
/// gap-bounded upper bound on how many duties any one person can cover, and
/// which roles are worth relaxing exclusivity on (§4.4 "Feasibility
/// report").
pub fn feasibility_report(input: &AssignInput, state: &crate::assign::State) -> DiagnosticsReport {
    const PREVIEW_CAP: usize = 20;

    let mut zero_candidate_slots_full: Vec<(u32, usize)> = Vec::new();
    for day in 1..=input.day_count {
        for slot in 0..input.duties.len() {
            if state.admissible(day, slot).is_empty() {
                zero_candidate_slots_full.push((day, slot));
            }
        }
    }
    let zero_candidate_slots = zero_candidate_slots_full
        .iter()
        .take(PREVIEW_CAP)
        .copied()
        .collect();

    // Roles where at least 30% of their zero-candidate slots are exclusive
    // are worth relaxing (§4.4 "exclusive_gevset").
    let mut zero_by_role: HashMap<&str, (u32, u32)> = HashMap::new();
    for &(_, slot) in &zero_candidate_slots_full {
        let duty = &input.duties[slot];
        let entry = zero_by_role.entry(duty.role_key()).or_insert((0, 0));
        entry.0 += 1;
        if duty.exclusive {
            entry.1 += 1;
        }
    }
    let exclusive_relax_roles = zero_by_role
        .into_iter()
        .filter(|(_, (total, exclusive))| *exclusive as f64 >= 0.3 * *total as f64)
        .map(|(role, _)| role.to_string())
        .collect();

    // Per role, the greedy maximum-assignable bound: for each person
    // admissible anywhere under that role, how many non-conflicting
    // (gap-respecting) days they could cover, summed across persons.
    let mut role_demand: HashMap<&str, u32> = HashMap::new();
    for duty in input.duties {
        *role_demand.entry(duty.role_key()).or_insert(0) += 1;
    }
    let mut role_capacity_gaps = Vec::new();
    for (&role, &demand_per_day) in &role_demand {
        let demand = demand_per_day * input.day_count;
        let mut upper_bound = 0u32;
        for person_idx in 0..input.persons.len() {
            let mut days: Vec<u32> = Vec::new();
            for day in 1..=input.day_count {
                for slot in 0..input.duties.len() {
                    if input.duties[slot].role_key() == role
                        && state.admissible(day, slot).contains(&person_idx)
                    {
                        days.push(day);
                        break;
                    }
                }
            }
            upper_bound += max_assignable_with_gap(&days, input.gap);
        }
        if demand > upper_bound {
            role_capacity_gaps.push(RoleCapacityGap {
                role: role.to_string(),
                demand,
                upper_bound,
            });
        }
    }

    DiagnosticsReport {
        zero_candidate_slots,
        zero_candidate_preview_cap: PREVIEW_CAP,
        role_capacity_gaps,
        exclusive_relax_roles,
    }
}

/// Greedy maximum-independent-set bound: from a sorted set of candidate
/// days, how many can be picked while keeping at least `gap` days between
/// any two picks. Grounded on
/// `original_source/functions/greedy_solver.py`'s `_max_assignable_with_ara_gun`.
fn max_assignable_with_gap(days: &[u32], gap: u32) -> u32 {
    let mut sorted = days.to_vec();
    sorted.sort_unstable();
    let mut count = 0u32;
    let mut last_picked: Option<u32> = None;
    for day in sorted {
        let ok = match last_picked {
            None => true,
            Some(prev) => day > prev + gap,
        };
        if ok {
            count += 1;
            last_picked = Some(day);
        }
    }
    count
}
