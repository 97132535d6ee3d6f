//! Target Computer: per-person, per-day-type target counts.
//!
//! The distilled spec names this model "CP-SAT #1" (§4.2), but no CP-SAT
//! binding exists anywhere in the available crate corpus and none may be
//! fabricated. We reuse the teacher's own metaheuristic architecture
//! instead — a `State` holding the current allocation plus delta-cost
//! moves, annealed with a geometric cooling schedule — generalized from
//! the teacher's (person → group) assignment to (person → day-type count).
//! This substitution is recorded as an Open Question resolution in
//! DESIGN.md.
//!
//! Hard equalities (`Σ_p h[p,t] = typeSlots[t]`, `Σ_p total[p] = totalSlots`)
//! are maintained as *invariants of every move* rather than penalty terms:
//! a move always transfers one unit of a day-type's count from one person
//! to another, so the column and row sums never drift. Only the soft
//! terms (count-clamp, hour balance, weekend balance, together-equality)
//! enter the annealed objective.
//!
//! The count-clamp/hour/weekend/together-equality formulas are grounded on
//! `original_source/functions/ortools_solver.py`'s `HedefHesaplayici.hesapla`:
//! `avg_count_float` is a fixed constant computed once from the unlocked
//! population (not re-derived from the current search state), `excess`/
//! `missing` are squared, hour balance and weekend balance are absolute
//! differences (the weekend term a cross-multiplication, not a variance),
//! and together-equality sums `|total[p1]-total[p2]|` over every pair in a
//! group rather than just the group's max-min spread.

use crate::calendar::DayType;
use crate::config::{AnnealingParams, HourWeights, TargetWeights};
use crate::error::TargetError;
use crate::models::{Duty, Person, PersonTargets, Rule, RuleKind, Targets, TogetherGroupSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Inputs the Target Computer needs beyond `SolverConfig`.
pub struct TargetInput<'a> {
    pub persons: &'a [Person],
    pub rules: &'a [Rule],
    /// Duty/slot list, used to size per-role capacity for the per-role
    /// target write-back (§4.2 "duty list (for role counts)").
    pub duties: &'a [Duty],
    /// Slot counts per day-type, e.g. `typeSlots[Cum] = 2` when two Friday
    /// slots exist every Friday of the month.
    pub type_slots: HashMap<DayType, u32>,
    pub day_counts: HashMap<DayType, u32>,
    pub locked: crate::models::LockedTargets,
}

struct State<'a> {
    persons: &'a [Person],
    /// `h[person_idx][day_type]`
    h: Vec<HashMap<DayType, u32>>,
    total_slots: HashMap<DayType, u32>,
    locked: Vec<HashMap<DayType, u32>>,
    is_locked: Vec<bool>,
    together_groups: Vec<Vec<usize>>,
    weights: &'a TargetWeights,
    hours: &'a HourWeights,
    /// `floor(avg)` over the unlocked population, fixed once up front
    /// rather than re-derived from the mid-search allocation.
    avg_count_floor: f64,
    /// Whether each unlocked person's excused ratio exceeds 0.4 (`cok_mazeretli`).
    heavy_excused: Vec<bool>,
    avg_hours: f64,
    total_slots_sum: u32,
    total_weekend_slots: u32,
}

impl<'a> State<'a> {
    fn new(input: &'a TargetInput<'a>, weights: &'a TargetWeights, hours: &'a HourWeights) -> Self {
        let n = input.persons.len();
        let mut h = vec![HashMap::new(); n];
        let locked: Vec<HashMap<DayType, u32>> = input
            .persons
            .iter()
            .map(|p| input.locked.get(&p.id).cloned().unwrap_or_default())
            .collect();
        let is_locked: Vec<bool> = input.persons.iter().map(|p| input.locked.contains_key(&p.id)).collect();

        // Seed a feasible starting allocation: give locked persons exactly
        // their fixed floor, then round-robin the rest across unlocked
        // persons only (locked counts never move again).
        let unlocked_indices: Vec<usize> = (0..n).filter(|&i| !is_locked[i]).collect();
        for &t in &DayType::ALL {
            let total = *input.type_slots.get(&t).unwrap_or(&0);
            let mut remaining = total;
            for (idx, floor) in locked.iter().enumerate() {
                if let Some(&f) = floor.get(&t) {
                    let give = f.min(remaining);
                    *h[idx].entry(t).or_insert(0) += give;
                    remaining -= give;
                }
            }
            let mut idx = 0;
            while remaining > 0 && !unlocked_indices.is_empty() {
                let target_idx = unlocked_indices[idx % unlocked_indices.len()];
                *h[target_idx].entry(t).or_insert(0) += 1;
                remaining -= 1;
                idx += 1;
            }
        }

        let together_groups = build_together_groups(input.persons, input.rules);

        let total_slots_sum: u32 = input.type_slots.values().sum();
        let total_weekend_slots: u32 = input
            .type_slots
            .iter()
            .filter(|(t, _)| t.is_weekend())
            .map(|(_, c)| *c)
            .sum();
        let locked_total_slots: u32 = locked.iter().flat_map(|m| m.values()).sum();
        let n_free = unlocked_indices.len();
        let avg_count_floor = if n_free > 0 {
            ((total_slots_sum.saturating_sub(locked_total_slots)) as f64 / n_free as f64).floor()
        } else {
            0.0
        };

        let day_count_total = input.day_counts.values().sum::<u32>().max(1) as f64;
        let heavy_excused: Vec<bool> = input
            .persons
            .iter()
            .map(|p| (p.excused_days.len() as f64 / day_count_total) > 0.4)
            .collect();

        let total_hours_needed: f64 = input
            .type_slots
            .iter()
            .map(|(t, c)| hours.get(*t) as f64 * *c as f64)
            .sum();
        let avg_hours = total_hours_needed / (n.max(1) as f64);

        State {
            persons: input.persons,
            h,
            total_slots: input.type_slots.clone(),
            locked,
            is_locked,
            together_groups,
            weights,
            hours,
            avg_count_floor,
            heavy_excused,
            avg_hours,
            total_slots_sum,
            total_weekend_slots,
        }
    }

    fn total(&self, idx: usize) -> u32 {
        self.h[idx].values().sum()
    }

    fn hours_for(&self, idx: usize) -> f64 {
        self.h[idx]
            .iter()
            .map(|(t, c)| self.hours.get(*t) as f64 * *c as f64)
            .sum()
    }

    fn cost(&self) -> f64 {
        let mut cost = 0.0;

        for idx in 0..self.persons.len() {
            if self.is_locked[idx] {
                continue;
            }
            let total = self.total(idx) as f64;
            let heavy = self.heavy_excused[idx];
            let limit = if heavy { self.avg_count_floor } else { self.avg_count_floor + 1.0 };
            let excess = (total - limit).max(0.0);
            cost += self.weights.count_clamp * excess * excess;
            if !heavy {
                let min_hedef = (self.avg_count_floor - 1.0).max(0.0);
                let missing = (min_hedef - total).max(0.0);
                cost += self.weights.count_shortfall * missing * missing;
            }

            let hours = self.hours_for(idx);
            cost += self.weights.hour_balance * (hours - self.avg_hours).abs();

            let weekend = weekend_count(&self.h[idx]) as f64;
            let cross = weekend * self.total_slots_sum as f64 - total * self.total_weekend_slots as f64;
            cost += self.weights.weekend_balance * cross.abs();
        }

        for group in &self.together_groups {
            if group.len() < 2 {
                continue;
            }
            for i in 0..group.len() {
                for j in (i + 1)..group.len() {
                    let a = self.total(group[i]) as f64;
                    let b = self.total(group[j]) as f64;
                    cost += self.weights.together_equality * (a - b).abs();
                }
            }
        }

        cost
    }

    /// Transfers one unit of day-type `t` from `from` to `to`, keeping the
    /// per-type column sum invariant. Locked persons never participate —
    /// their per-type counts are fixed, not merely floored.
    fn propose_transfer(&self, rng: &mut StdRng) -> Option<(usize, usize, DayType)> {
        let n = self.persons.len();
        if n < 2 {
            return None;
        }
        let t = DayType::ALL[rng.gen_range(0..5)];
        let from = rng.gen_range(0..n);
        let to = rng.gen_range(0..n);
        if from == to {
            return None;
        }
        if self.is_locked[from] || self.is_locked[to] {
            return None;
        }
        let available = *self.h[from].get(&t).unwrap_or(&0);
        if available == 0 {
            return None;
        }
        Some((from, to, t))
    }

    fn apply_transfer(&mut self, from: usize, to: usize, t: DayType) {
        *self.h[from].entry(t).or_insert(0) -= 1;
        *self.h[to].entry(t).or_insert(0) += 1;
    }
}

fn weekend_count(h: &HashMap<DayType, u32>) -> u32 {
    h.iter()
        .filter(|(t, _)| t.is_weekend())
        .map(|(_, c)| *c)
        .sum()
}

fn build_together_groups(persons: &[Person], rules: &[Rule]) -> Vec<Vec<usize>> {
    let mut dsu = crate::dsu::Dsu::new(persons.len());
    let index_of: HashMap<i64, usize> = persons.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
    for rule in rules {
        if rule.kind != RuleKind::Together {
            continue;
        }
        let idxs: Vec<usize> = rule.members.iter().filter_map(|id| index_of.get(id).copied()).collect();
        for w in idxs.windows(2) {
            dsu.union(w[0], w[1]);
        }
    }
    dsu.groups()
}

/// Runs the annealed search and produces a `Targets` table, or
/// [`TargetError::Infeasible`] if the type-slot totals cannot be honored
/// at all (e.g. locked floors exceeding a type's slot budget).
pub fn compute_targets(
    input: &TargetInput,
    weights: &TargetWeights,
    hours: &HourWeights,
    annealing: &AnnealingParams,
) -> Result<Targets, TargetError> {
    for (t, floor_sum) in sum_locked_floors(input) {
        let budget = *input.type_slots.get(&t).unwrap_or(&0);
        if floor_sum > budget {
            return Err(TargetError::Infeasible);
        }
    }

    let mut state = State::new(input, weights, hours);
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut current_cost = state.cost();
    let mut best_h = state.h.clone();
    let mut best_cost = current_cost;

    let start = Instant::now();
    let deadline = Duration::from_secs(annealing.time_limit_seconds);
    let max_iters = 200_000u64;
    let mut iter = 0u64;

    while iter < max_iters && start.elapsed() < deadline {
        iter += 1;
        let progress = iter as f64 / max_iters as f64;
        let temperature = annealing.initial_temperature
            * (annealing.final_temperature / annealing.initial_temperature).powf(progress);

        if let Some((from, to, t)) = state.propose_transfer(&mut rng) {
            state.apply_transfer(from, to, t);
            let new_cost = state.cost();
            let delta = new_cost - current_cost;
            let accept = delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature.max(1e-9)).exp();
            if accept {
                current_cost = new_cost;
                if current_cost < best_cost {
                    best_cost = current_cost;
                    best_h = state.h.clone();
                }
            } else {
                state.apply_transfer(to, from, t);
            }
        }
    }

    let per_role = compute_per_role_targets(input, &state, &best_h);

    let mut per_person = HashMap::with_capacity(input.persons.len());
    for (idx, person) in input.persons.iter().enumerate() {
        let per_type = best_h[idx].clone();
        let total = per_type.values().sum();
        per_person.insert(
            person.id,
            PersonTargets {
                per_type,
                per_role: per_role.get(&person.id).cloned().unwrap_or_default(),
                total,
            },
        );
    }

    let together_group_summary = state
        .together_groups
        .iter()
        .filter(|g| g.len() >= 2)
        .map(|g| {
            let members: Vec<i64> = g.iter().map(|&i| input.persons[i].id).collect();
            let shared_total = members
                .iter()
                .map(|id| per_person.get(id).map(|t| t.total).unwrap_or(0))
                .min()
                .unwrap_or(0);
            TogetherGroupSummary {
                members,
                shared_total,
            }
        })
        .collect();

    Ok(Targets {
        per_person,
        together_group_summary,
    })
}

/// Per-role target write-back (§3 Targets "per role count").
///
/// Clamps each person's wire-supplied `targets_per_role` to that role's
/// monthly slot capacity, then synchronizes together-group members to the
/// group minimum for any role where every member has a positive quota.
/// Grounded on `original_source/functions/ortools_solver.py`'s
/// `_birlikte_gruplari_dengele`.
fn compute_per_role_targets(
    input: &TargetInput,
    state: &State,
    best_h: &[HashMap<DayType, u32>],
) -> HashMap<i64, HashMap<String, u32>> {
    let day_count_total: u32 = input.day_counts.values().sum();

    let mut role_slot_count: HashMap<&str, u32> = HashMap::new();
    for duty in input.duties {
        *role_slot_count.entry(duty.role_key()).or_insert(0) += 1;
    }
    let role_capacity: HashMap<&str, u32> = role_slot_count
        .iter()
        .map(|(role, count)| (*role, count * day_count_total))
        .collect();

    let mut out: HashMap<i64, HashMap<String, u32>> = HashMap::with_capacity(input.persons.len());
    for (idx, person) in input.persons.iter().enumerate() {
        let total = best_h[idx].values().sum::<u32>();
        let mut roles = HashMap::new();
        for (role, &raw) in &person.targets_per_role {
            let cap = *role_capacity.get(role.as_str()).unwrap_or(&total);
            roles.insert(role.clone(), raw.min(cap));
        }
        out.insert(person.id, roles);
    }

    for group in &state.together_groups {
        if group.len() < 2 {
            continue;
        }
        let ids: Vec<i64> = group.iter().map(|&i| input.persons[i].id).collect();
        let mut roles_seen: std::collections::HashSet<String> = std::collections::HashSet::new();
        for id in &ids {
            if let Some(roles) = out.get(id) {
                roles_seen.extend(roles.keys().cloned());
            }
        }
        for role in roles_seen {
            let all_positive = ids
                .iter()
                .all(|id| out.get(id).and_then(|r| r.get(&role)).copied().unwrap_or(0) > 0);
            if !all_positive {
                continue;
            }
            let min = ids
                .iter()
                .filter_map(|id| out.get(id).and_then(|r| r.get(&role)).copied())
                .min()
                .unwrap_or(0);
            for id in &ids {
                if let Some(roles) = out.get_mut(id) {
                    roles.insert(role.clone(), min);
                }
            }
        }
    }

    out
}

fn sum_locked_floors(input: &TargetInput) -> HashMap<DayType, u32> {
    let mut out: HashMap<DayType, u32> = HashMap::new();
    for floors in input.locked.values() {
        for (t, v) in floors {
            *out.entry(*t).or_insert(0) += v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn person(id: i64) -> Person {
        Person {
            id,
            name: format!("p{id}"),
            excused_days: HashSet::new(),
            restricted_role: None,
            overflow_role: None,
            targets_per_type: HashMap::new(),
            targets_total: 0,
            targets_per_role: HashMap::new(),
            annual_realized: HashMap::new(),
            carry_in: HashMap::new(),
        }
    }

    #[test]
    fn column_sums_match_type_slot_budget() {
        let persons = vec![person(1), person(2), person(3), person(4)];
        let mut type_slots = HashMap::new();
        type_slots.insert(DayType::Hici, 12);
        type_slots.insert(DayType::Prs, 4);
        type_slots.insert(DayType::Cum, 4);
        type_slots.insert(DayType::Cmt, 4);
        type_slots.insert(DayType::Pzr, 4);
        let input = TargetInput {
            persons: &persons,
            rules: &[],
            duties: &[],
            type_slots: type_slots.clone(),
            day_counts: HashMap::new(),
            locked: HashMap::new(),
        };
        let weights = TargetWeights::default();
        let hours = HourWeights::default();
        let annealing = AnnealingParams {
            time_limit_seconds: 1,
            ..AnnealingParams::default()
        };
        let targets = compute_targets(&input, &weights, &hours, &annealing).unwrap();

        for &t in &DayType::ALL {
            let sum: u32 = targets
                .per_person
                .values()
                .map(|pt| *pt.per_type.get(&t).unwrap_or(&0))
                .sum();
            assert_eq!(sum, *type_slots.get(&t).unwrap());
        }
    }

    #[test]
    fn infeasible_when_locked_floor_exceeds_budget() {
        let persons = vec![person(1)];
        let mut type_slots = HashMap::new();
        type_slots.insert(DayType::Hici, 1);
        let mut locked = HashMap::new();
        let mut floor = HashMap::new();
        floor.insert(DayType::Hici, 5);
        locked.insert(1, floor);
        let input = TargetInput {
            persons: &persons,
            rules: &[],
            duties: &[],
            type_slots,
            day_counts: HashMap::new(),
            locked,
        };
        let err = compute_targets(
            &input,
            &TargetWeights::default(),
            &HourWeights::default(),
            &AnnealingParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, TargetError::Infeasible);
    }

    #[test]
    fn per_role_targets_are_clamped_to_role_capacity_and_synced_within_groups() {
        let mut ada = person(1);
        ada.targets_per_role.insert("triaj".to_string(), 40);
        let mut bea = person(2);
        bea.targets_per_role.insert("triaj".to_string(), 2);
        let persons = vec![ada, bea];

        let duties = vec![duty_for_role("triaj"), duty_for_role("triaj")];
        let mut type_slots = HashMap::new();
        type_slots.insert(DayType::Hici, 4);
        let mut day_counts = HashMap::new();
        day_counts.insert(DayType::Hici, 2);

        let rules = vec![Rule {
            kind: RuleKind::Together,
            members: vec![1, 2],
        }];
        let input = TargetInput {
            persons: &persons,
            rules: &rules,
            duties: &duties,
            type_slots,
            day_counts,
            locked: HashMap::new(),
        };
        let targets = compute_targets(
            &input,
            &TargetWeights::default(),
            &HourWeights::default(),
            &AnnealingParams {
                time_limit_seconds: 1,
                ..AnnealingParams::default()
            },
        )
        .unwrap();

        // Role capacity is 2 slots * 2 days = 4: Ada's raw 40 must be clamped.
        let ada_role = targets.per_person[&1].per_role["triaj"];
        assert!(ada_role <= 4);
        // Both together-group members share a positive quota, so they sync
        // to the group minimum rather than keeping their raw values.
        let bea_role = targets.per_person[&2].per_role["triaj"];
        assert_eq!(ada_role, bea_role);
    }

    fn duty_for_role(role: &str) -> Duty {
        Duty {
            id: 1,
            name: role.to_string(),
            slot_index: 0,
            base_name: String::new(),
            exclusive: false,
            separate_building: false,
        }
    }
}
