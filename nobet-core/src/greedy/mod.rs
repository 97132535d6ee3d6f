//! Deterministic greedy fallback solver.
//!
//! A direct port of `examples/original_source/functions/greedy_solver.py`'s
//! `NobetYoneticisi` into the teacher's struct-with-methods style: day
//! ordering by scarcity, together-group placement first, then a
//! candidate-scoring single-slot pass with bounded neighbor backtracking,
//! and a final relaxed-gap pass over whatever is still empty.

mod backtrack;
mod scoring;

use crate::calendar::DayType;
use crate::dsu::Dsu;
use crate::models::{
    ManualAssignment, Person, RoleRestriction, Rule, RuleKind, Schedule, Targets,
};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

pub struct GreedyInput<'a> {
    pub persons: &'a [Person],
    pub duties: &'a [crate::models::Duty],
    pub day_count: u32,
    pub day_types: &'a HashMap<u32, DayType>,
    pub targets: &'a Targets,
    pub rules: &'a [Rule],
    pub role_restrictions: &'a [RoleRestriction],
    pub manual_assignments: &'a [ManualAssignment],
    pub gap: u32,
    pub time_budget: Duration,
}

pub struct GreedyOutcome {
    pub schedule: Schedule,
}

/// Per-person running counters, the Rust analog of `Personel`'s
/// `kalan_*`/`atanan_gunler`/`son_nobet_gunu` mutable bookkeeping fields.
#[derive(Clone)]
pub(crate) struct PersonState {
    pub remaining_per_type: HashMap<DayType, i64>,
    pub remaining_total: i64,
    pub remaining_per_role: HashMap<String, i64>,
    pub assigned_days: HashSet<u32>,
    pub last_duty_day: i64,
    pub excused_count: usize,
}

pub(crate) struct Ctx<'a> {
    pub input: &'a GreedyInput<'a>,
    pub persons: Vec<PersonState>,
    pub index_of: HashMap<i64, usize>,
    pub schedule: Schedule,
    pub together_member_indices: HashSet<usize>,
    pub pinned: HashSet<(u32, usize)>,
}

pub fn solve(input: &GreedyInput) -> GreedyOutcome {
    let start = Instant::now();
    let mut ctx = Ctx::new(input);

    ctx.group_phase();
    ctx.singles_phase(input.gap, &start, input.time_budget);
    if input.gap > 1 {
        ctx.singles_phase(input.gap - 1, &start, input.time_budget);
    }
    ctx.finish_phase();

    GreedyOutcome {
        schedule: ctx.schedule,
    }
}

impl<'a> Ctx<'a> {
    fn new(input: &'a GreedyInput<'a>) -> Self {
        let index_of: HashMap<i64, usize> = input
            .persons
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();

        let persons = input
            .persons
            .iter()
            .map(|p| {
                let target = input.targets.per_person.get(&p.id);
                PersonState {
                    remaining_per_type: DayType::ALL
                        .iter()
                        .map(|t| {
                            (
                                *t,
                                target.map(|pt| *pt.per_type.get(t).unwrap_or(&0)).unwrap_or(0)
                                    as i64,
                            )
                        })
                        .collect(),
                    remaining_total: target.map(|pt| pt.total).unwrap_or(0) as i64,
                    remaining_per_role: target
                        .map(|pt| pt.per_role.iter().map(|(k, v)| (k.clone(), *v as i64)).collect())
                        .unwrap_or_default(),
                    assigned_days: HashSet::new(),
                    last_duty_day: -999,
                    excused_count: p.excused_days.len(),
                }
            })
            .collect();

        let mut schedule = Schedule::empty(input.day_count, input.duties.len());
        let mut pinned = HashSet::new();
        for m in input.manual_assignments {
            if let Some(&idx) = index_of.get(&m.person_id) {
                if m.slot_index < input.duties.len() {
                    schedule.set(m.day, m.slot_index, Some(input.persons[idx].id));
                    pinned.insert((m.day, m.slot_index));
                }
            }
        }

        let mut dsu = Dsu::new(input.persons.len());
        for rule in input.rules {
            if rule.kind != RuleKind::Together {
                continue;
            }
            let idxs: Vec<usize> = rule
                .members
                .iter()
                .filter_map(|id| index_of.get(id).copied())
                .collect();
            for w in idxs.windows(2) {
                dsu.union(w[0], w[1]);
            }
        }
        let together_member_indices: HashSet<usize> = dsu
            .groups()
            .into_iter()
            .filter(|g| g.len() > 1)
            .flatten()
            .collect();

        Ctx {
            input,
            persons,
            index_of,
            schedule,
            together_member_indices,
            pinned,
        }
    }

    /// Day ordering: most excused-heavy first, then scarcity weight, then
    /// date (greedy_solver.py's `gunleri_sirala`).
    pub(crate) fn days_ordered(&self) -> Vec<u32> {
        let mut scored: Vec<(u32, i64)> = (1..=self.input.day_count)
            .map(|day| {
                let excused = self
                    .input
                    .persons
                    .iter()
                    .filter(|p| p.is_excused(day))
                    .count() as i64;
                let day_type = self.input.day_types[&day];
                let score = excused * 1000 + day_type.ordering_weight();
                (day, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.into_iter().map(|(d, _)| d).collect()
    }

    fn role_key_quota_ok(&self, person_idx: usize, duty: &crate::models::Duty) -> bool {
        let role = duty.role_key();
        let ps = &self.persons[person_idx];
        if let Some(&remaining) = ps.remaining_per_role.get(role) {
            remaining > 0
        } else {
            ps.remaining_total > 0
        }
    }

    fn is_admissible(
        &self,
        person_idx: usize,
        day: u32,
        duty: &crate::models::Duty,
        min_gap: u32,
        today_assigned: &HashSet<usize>,
    ) -> bool {
        let person = &self.input.persons[person_idx];
        let ps = &self.persons[person_idx];
        if person.is_excused(day) {
            return false;
        }
        if ps.assigned_days.contains(&day) {
            return false;
        }
        if today_assigned.contains(&person_idx) {
            return false;
        }
        if !self.role_key_quota_ok(person_idx, duty) {
            return false;
        }
        for &d in &ps.assigned_days {
            if (day as i64 - d as i64).unsigned_abs() as u32 <= min_gap {
                return false;
            }
        }
        if let Some(restriction) = self
            .input
            .role_restrictions
            .iter()
            .find(|r| r.person_id == person.id)
        {
            let role_ok = restriction.restricted_role == duty.role_key();
            if !role_ok {
                let soft = !duty.exclusive || restriction.is_pool();
                if !soft {
                    return false;
                }
            }
        }
        if duty.separate_building && self.together_member_indices.contains(&person_idx) {
            return false;
        }
        for rule in self.input.rules {
            if rule.kind != RuleKind::Separate {
                continue;
            }
            if !rule.members.contains(&person.id) {
                continue;
            }
            for &other_idx in today_assigned {
                if rule.members.contains(&self.input.persons[other_idx].id) {
                    return false;
                }
            }
        }
        true
    }

    fn best_candidate(
        &self,
        day: u32,
        duty: &crate::models::Duty,
        min_gap: u32,
        today_assigned: &HashSet<usize>,
    ) -> Option<usize> {
        let day_type = self.input.day_types[&day];
        let mut best: Option<(usize, f64)> = None;
        for idx in 0..self.input.persons.len() {
            if !self.is_admissible(idx, day, duty, min_gap, today_assigned) {
                continue;
            }
            let score = scoring::candidate_score(self, idx, day, day_type, duty);
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn commit(&mut self, idx: usize, day: u32, slot: usize, duty: &crate::models::Duty) {
        let day_type = self.input.day_types[&day];
        self.schedule.set(day, slot, Some(self.input.persons[idx].id));
        let ps = &mut self.persons[idx];
        ps.assigned_days.insert(day);
        ps.last_duty_day = day as i64;
        *ps.remaining_per_type.entry(day_type).or_insert(0) -= 1;
        ps.remaining_total -= 1;
        let role = duty.role_key().to_string();
        if let Some(r) = ps.remaining_per_role.get_mut(&role) {
            *r -= 1;
        }
    }

    pub(crate) fn undo(&mut self, idx: usize, day: u32, slot: usize, duty: &crate::models::Duty) {
        let day_type = self.input.day_types[&day];
        self.schedule.set(day, slot, None);
        let ps = &mut self.persons[idx];
        ps.assigned_days.remove(&day);
        ps.last_duty_day = ps.assigned_days.iter().copied().max().map(|d| d as i64).unwrap_or(-999);
        *ps.remaining_per_type.entry(day_type).or_insert(0) += 1;
        ps.remaining_total += 1;
        let role = duty.role_key().to_string();
        if let Some(r) = ps.remaining_per_role.get_mut(&role) {
            *r += 1;
        }
    }

    fn group_phase(&mut self) {
        let mut groups: Vec<Vec<i64>> = self
            .input
            .rules
            .iter()
            .filter(|r| r.kind == RuleKind::Together)
            .map(|r| r.members.clone())
            .collect();
        groups.sort_by_key(|members| {
            std::cmp::Reverse(
                members
                    .iter()
                    .filter_map(|id| self.index_of.get(id))
                    .map(|&idx| self.persons[idx].excused_count as i64)
                    .sum::<i64>(),
            )
        });

        for members in groups {
            let idxs: Vec<usize> = members
                .iter()
                .filter_map(|id| self.index_of.get(id).copied())
                .collect();
            if idxs.len() < 2 {
                continue;
            }
            let target_count = idxs
                .iter()
                .map(|&i| self.persons[i].remaining_total)
                .min()
                .unwrap_or(0);
            let mut written = 0i64;

            for day in self.days_ordered() {
                if written >= target_count {
                    break;
                }
                let day_type = self.input.day_types[&day];
                let empty_slots: Vec<usize> = (0..self.input.duties.len())
                    .filter(|&s| {
                        self.schedule.get(day, s).is_none() && !self.input.duties[s].separate_building
                    })
                    .collect();
                if empty_slots.len() < idxs.len() {
                    continue;
                }

                let mut scored: Vec<(usize, usize)> = idxs
                    .iter()
                    .map(|&pidx| {
                        let n = empty_slots
                            .iter()
                            .filter(|&&s| {
                                self.role_key_quota_ok(pidx, &self.input.duties[s])
                                    && !self.input.persons[pidx].is_excused(day)
                            })
                            .count();
                        (pidx, n)
                    })
                    .collect();
                scored.sort_by_key(|&(_, n)| n);

                let mut used_slots = HashSet::new();
                let mut plan = Vec::new();
                let mut ok = true;
                for (pidx, _) in &scored {
                    let mut placed = false;
                    for &slot in &empty_slots {
                        if used_slots.contains(&slot) {
                            continue;
                        }
                        if self.role_key_quota_ok(*pidx, &self.input.duties[slot])
                            && !self.input.persons[*pidx].is_excused(day)
                        {
                            plan.push((*pidx, slot));
                            used_slots.insert(slot);
                            placed = true;
                            break;
                        }
                    }
                    if !placed {
                        ok = false;
                        break;
                    }
                }

                if ok {
                    for (pidx, slot) in plan {
                        let duty = self.input.duties[slot].clone();
                        self.commit(pidx, day, slot, &duty);
                    }
                    written += 1;
                }
                let _ = day_type;
            }
        }
    }

    fn singles_phase(&mut self, min_gap: u32, start: &Instant, budget: Duration) {
        for day in self.days_ordered() {
            if start.elapsed() >= budget {
                return;
            }
            let mut today_assigned: HashSet<usize> = (0..self.input.duties.len())
                .filter_map(|s| self.schedule.get(day, s))
                .filter_map(|pid| self.index_of.get(&pid).copied())
                .collect();

            for slot in 0..self.input.duties.len() {
                if self.schedule.get(day, slot).is_some() {
                    continue;
                }
                let duty = self.input.duties[slot].clone();
                if let Some(idx) = self.best_candidate(day, &duty, min_gap, &today_assigned) {
                    self.commit(idx, day, slot, &duty);
                    today_assigned.insert(idx);
                } else if min_gap > 1 {
                    if self.backtrack_neighbors(day, slot, &duty, min_gap) {
                        today_assigned = (0..self.input.duties.len())
                            .filter_map(|s| self.schedule.get(day, s))
                            .filter_map(|pid| self.index_of.get(&pid).copied())
                            .collect();
                        if let Some(idx) = self.best_candidate(day, &duty, min_gap, &today_assigned) {
                            self.commit(idx, day, slot, &duty);
                            today_assigned.insert(idx);
                        }
                    }
                }
            }
        }
    }

    fn finish_phase(&mut self) {
        for day in self.days_ordered() {
            let mut today_assigned: HashSet<usize> = (0..self.input.duties.len())
                .filter_map(|s| self.schedule.get(day, s))
                .filter_map(|pid| self.index_of.get(&pid).copied())
                .collect();
            for slot in 0..self.input.duties.len() {
                if self.pinned.contains(&(day, slot)) {
                    continue;
                }
                if self.schedule.get(day, slot).is_some() {
                    continue;
                }
                let duty = self.input.duties[slot].clone();
                if let Some(idx) = self.best_candidate(day, &duty, 1, &today_assigned) {
                    self.commit(idx, day, slot, &duty);
                    today_assigned.insert(idx);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn person(id: i64) -> Person {
        Person {
            id,
            name: format!("p{id}"),
            excused_days: HashSet::new(),
            restricted_role: None,
            overflow_role: None,
            targets_per_type: Map::new(),
            targets_total: 0,
            targets_per_role: Map::new(),
            annual_realized: Map::new(),
            carry_in: Map::new(),
        }
    }

    #[test]
    fn fills_all_slots_when_targets_and_capacity_match() {
        let persons = vec![person(1), person(2)];
        let duties = vec![
            crate::models::Duty {
                id: 1,
                name: "nobetci".to_string(),
                slot_index: 0,
                base_name: String::new(),
                exclusive: false,
                separate_building: false,
            },
        ];
        let day_types: Map<u32, DayType> = (1..=2u32).map(|d| (d, DayType::Hici)).collect();
        let mut per_person = Map::new();
        for p in &persons {
            let mut per_type = Map::new();
            per_type.insert(DayType::Hici, 1);
            per_person.insert(
                p.id,
                crate::models::PersonTargets {
                    per_type,
                    per_role: Map::new(),
                    total: 1,
                },
            );
        }
        let targets = Targets {
            per_person,
            together_group_summary: vec![],
        };
        let input = GreedyInput {
            persons: &persons,
            duties: &duties,
            day_count: 2,
            day_types: &day_types,
            targets: &targets,
            rules: &[],
            role_restrictions: &[],
            manual_assignments: &[],
            gap: 0,
            time_budget: Duration::from_secs(1),
        };
        let outcome = solve(&input);
        assert_eq!(outcome.schedule.filled_count(), 2);
    }
}
