//! Soft-constraint scoring for the assignment grid.
//!
//! Grounded on the teacher's `solver/scoring/mod.rs` penalty-accumulation
//! style (`_recalculate_attribute_balance_penalty` etc.): one function per
//! penalty term, summed under a single weight vector.

use super::state::State;
use crate::calendar::DayType;
use crate::config::AssignWeights;
use std::collections::HashMap;

pub fn total_cost(state: &State, weights: &AssignWeights) -> f64 {
    empty_slot_penalty(state, weights)
        + role_quota_penalty(state, weights)
        + day_type_quota_penalty(state, weights)
        + total_target_penalty(state, weights)
        + together_penalty(state, weights)
        + weekly_homogeneity_penalty(state, weights)
        + window_gap_penalty(state, weights)
        + annual_deficit_penalty(state, weights)
        + crowding_penalty(state, weights)
}

/// Static per-role scarcity multiplier: `max(1, maxSlotsPerRole /
/// slotsPerRole(role))` (§4.3 soft terms table, "role-quota").
fn scarcity_weight(state: &State, role: &str) -> f64 {
    let mut slots_per_role: HashMap<&str, u32> = HashMap::new();
    for duty in state.input.duties {
        *slots_per_role.entry(duty.role_key()).or_insert(0) += 1;
    }
    let max_slots = *slots_per_role.values().max().unwrap_or(&1);
    let slots = *slots_per_role.get(role).unwrap_or(&1);
    (max_slots as f64 / slots.max(1) as f64).max(1.0)
}

/// Penalizes a person's realized per-role count diverging from their
/// Target-Computer per-role target, scaled by how scarce that role's slots
/// are (§4.3 "role-quota" soft term).
fn role_quota_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let mut realized: HashMap<(usize, &str), u32> = HashMap::new();
    for day in 1..=state.input.day_count {
        for (slot, cell) in state.grid[&day].iter().enumerate() {
            if let Some(person) = cell {
                *realized
                    .entry((*person, state.input.duties[slot].role_key()))
                    .or_insert(0) += 1;
            }
        }
    }
    let mut cost = 0.0;
    for (idx, person) in state.input.persons.iter().enumerate() {
        let Some(targets) = state.input.targets.per_person.get(&person.id) else {
            continue;
        };
        for (role, &target) in &targets.per_role {
            let actual = *realized.get(&(idx, role.as_str())).unwrap_or(&0) as i64;
            let diff = (actual - target as i64).unsigned_abs() as f64;
            cost += weights.role_quota * scarcity_weight(state, role) * diff;
        }
    }
    cost
}

/// Penalizes a person's realized per-day-type count diverging from their
/// Target-Computer per-day-type target (§4.3 "day-type-quota" soft term).
fn day_type_quota_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let mut realized: HashMap<(usize, DayType), u32> = HashMap::new();
    for day in 1..=state.input.day_count {
        let day_type = state.day_type(day);
        for cell in state.grid[&day].iter().flatten() {
            *realized.entry((*cell, day_type)).or_insert(0) += 1;
        }
    }
    let mut cost = 0.0;
    for (idx, person) in state.input.persons.iter().enumerate() {
        let Some(targets) = state.input.targets.per_person.get(&person.id) else {
            continue;
        };
        for (&day_type, &target) in &targets.per_type {
            let actual = *realized.get(&(idx, day_type)).unwrap_or(&0) as i64;
            cost += weights.day_type_quota * (actual - target as i64).unsigned_abs() as f64;
        }
    }
    cost
}

fn empty_slot_penalty(state: &State, weights: &AssignWeights) -> f64 {
    state.unfilled_count() as f64 * weights.empty_slot
}

/// Penalizes deviation of each person's realized total from their
/// Target-Computer total (§4.3 "total target" soft term).
fn total_target_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let mut realized: HashMap<usize, u32> = HashMap::new();
    for day in 1..=state.input.day_count {
        for cell in state.grid[&day].iter().flatten() {
            *realized.entry(*cell).or_insert(0) += 1;
        }
    }
    let mut cost = 0.0;
    for (idx, person) in state.input.persons.iter().enumerate() {
        let target = state
            .input
            .targets
            .per_person
            .get(&person.id)
            .map(|t| t.total)
            .unwrap_or(0) as i64;
        let actual = *realized.get(&idx).unwrap_or(&0) as i64;
        cost += weights.total_target * (actual - target).unsigned_abs() as f64;
    }
    cost
}

/// Penalizes, per together-pair and per day both members are available,
/// one member being assigned that day and the other not (§4.3 "together"
/// soft term).
fn together_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let mut assigned_on: HashMap<(usize, u32), bool> = HashMap::new();
    for day in 1..=state.input.day_count {
        for cell in state.grid[&day].iter().flatten() {
            assigned_on.insert((*cell, day), true);
        }
    }
    let is_assigned = |p: usize, d: u32| *assigned_on.get(&(p, d)).unwrap_or(&false) as i64;

    let mut cost = 0.0;
    for group in state.together_groups() {
        if group.len() < 2 {
            continue;
        }
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let (p1, p2) = (group[i], group[j]);
                let person1 = &state.input.persons[p1];
                let person2 = &state.input.persons[p2];
                for day in 1..=state.input.day_count {
                    if person1.is_excused(day) || person2.is_excused(day) {
                        continue;
                    }
                    let diff = (is_assigned(p1, day) - is_assigned(p2, day)).unsigned_abs() as f64;
                    cost += weights.together * diff;
                }
            }
        }
    }
    cost
}

/// Penalizes a person being scheduled more than once within the same ISO
/// week (a homogeneity term: duties should spread across the month).
fn weekly_homogeneity_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let mut per_person_week: HashMap<(usize, u32), u32> = HashMap::new();
    for day in 1..=state.input.day_count {
        let week = (day - 1) / 7;
        for cell in state.grid[&day].iter().flatten() {
            *per_person_week.entry((*cell, week)).or_insert(0) += 1;
        }
    }
    per_person_week
        .values()
        .filter(|&&c| c > 1)
        .map(|&c| weights.weekly_homogeneity * (c - 1) as f64)
        .sum()
}

/// Penalizes, per person, every overlapping window of a given length that
/// contains zero of their assigned days — two window lengths, a narrower
/// one at the base weight and a wider one (`2 * idealGap`) at the heavier
/// weight (§4.3 "max-gap window" soft term).
fn window_gap_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let ideal_gap = state.input.gap;
    if ideal_gap == 0 {
        return 0.0;
    }
    let narrow_len = ideal_gap + 2.max(ideal_gap / 2);
    let wide_len = 2 * ideal_gap;

    let mut days_by_person: HashMap<usize, Vec<u32>> = HashMap::new();
    for day in 1..=state.input.day_count {
        for cell in state.grid[&day].iter().flatten() {
            days_by_person.entry(*cell).or_default().push(day);
        }
    }

    let mut cost = 0.0;
    for (idx, person) in state.input.persons.iter().enumerate() {
        let mut days = days_by_person.get(&idx).cloned().unwrap_or_default();
        days.sort_unstable();
        for (len, weight) in [(narrow_len, weights.window_gap), (wide_len, weights.window_gap_wide)] {
            if len == 0 {
                continue;
            }
            for start in 1..=state.input.day_count.saturating_sub(len - 1) {
                let end = start + len - 1;
                let all_excused = (start..=end).all(|d| person.is_excused(d));
                if all_excused {
                    continue;
                }
                let has_duty = days.iter().any(|&d| d >= start && d <= end);
                if !has_duty {
                    cost += weight;
                }
            }
        }
    }
    cost
}

/// Penalizes a person's realized total diverging further from target than
/// their peers do, scaled by how far their target sits from the peer mean
/// (§4.3 "annual deficit" soft term).
fn annual_deficit_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let mut realized: HashMap<usize, u32> = HashMap::new();
    for day in 1..=state.input.day_count {
        for cell in state.grid[&day].iter().flatten() {
            *realized.entry(*cell).or_insert(0) += 1;
        }
    }

    let targets: Vec<f64> = state
        .input
        .persons
        .iter()
        .map(|p| {
            state
                .input
                .targets
                .per_person
                .get(&p.id)
                .map(|t| t.total)
                .unwrap_or(0) as f64
        })
        .collect();
    if targets.is_empty() {
        return 0.0;
    }
    let peer_mean = targets.iter().sum::<f64>() / targets.len() as f64;

    let mut cost = 0.0;
    for (idx, &target) in targets.iter().enumerate() {
        let actual = *realized.get(&idx).unwrap_or(&0) as f64;
        let dev_deficit = target - peer_mean;
        let multiplier = dev_deficit.abs().min(3.0);
        if dev_deficit < -1.0 {
            cost += weights.annual_deficit * multiplier * (target - actual).max(0.0);
        } else if dev_deficit > 1.0 {
            cost += weights.annual_deficit * multiplier * (actual - target).max(0.0);
        }
    }
    cost
}

/// Penalizes a person whose target density (`target / availableDays`)
/// exceeds 0.3 falling short of their target, scaled by how crowded their
/// schedule would need to be to hit it (§4.3 "crowding"/"panic" term).
fn crowding_penalty(state: &State, weights: &AssignWeights) -> f64 {
    let mut realized: HashMap<usize, u32> = HashMap::new();
    for day in 1..=state.input.day_count {
        for cell in state.grid[&day].iter().flatten() {
            *realized.entry(*cell).or_insert(0) += 1;
        }
    }

    let mut cost = 0.0;
    for (idx, person) in state.input.persons.iter().enumerate() {
        let target = state
            .input
            .targets
            .per_person
            .get(&person.id)
            .map(|t| t.total)
            .unwrap_or(0) as f64;
        let available_days = state.input.day_count as f64 - person.excused_days.len() as f64;
        if available_days <= 0.0 {
            continue;
        }
        let rho = target / available_days;
        if rho <= 0.3 {
            continue;
        }
        let multiplier = (10.0 * rho).floor().min(5.0);
        let actual = *realized.get(&idx).unwrap_or(&0) as f64;
        cost += weights.crowding * multiplier * (target - actual).max(0.0);
    }
    cost
}
