//! Internal solver state: the day/slot grid plus preprocessed admissibility
//! and the move vocabulary (teacher's `solver::State` generalized from
//! person/group/session to person/day/slot).

use crate::calendar::DayType;
use crate::models::{
    ManualAssignment, Person, RoleExceptions, RoleRestriction, Rule, RuleKind, Schedule, Targets,
    TogetherExceptions,
};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Everything the assignment search needs, already parsed and resolved.
pub struct AssignInput<'a> {
    pub persons: &'a [Person],
    pub duties: &'a [crate::models::Duty],
    pub day_count: u32,
    pub day_types: &'a HashMap<u32, DayType>,
    pub targets: &'a Targets,
    pub rules: &'a [Rule],
    pub role_restrictions: &'a [RoleRestriction],
    pub manual_assignments: &'a [ManualAssignment],
    pub gap: u32,
    /// Per-(person,day) exceptions opening a normally-forbidden role
    /// (admissibility test 1, H7).
    pub role_exceptions: &'a RoleExceptions,
    /// Per-(person,day) exceptions allowing a together-group member onto a
    /// separate-building slot (admissibility test 4, H9).
    pub together_exceptions: &'a TogetherExceptions,
}

/// A proposed change to the grid: either filling an empty cell or swapping
/// the occupants of two cells.
#[derive(Debug, Clone, Copy)]
pub enum Move {
    Fill {
        day: u32,
        slot: usize,
        person: usize,
    },
    Swap {
        day_a: u32,
        slot_a: usize,
        day_b: u32,
        slot_b: usize,
    },
    Vacate {
        day: u32,
        slot: usize,
    },
}

#[derive(Clone)]
pub struct State<'a> {
    pub input: &'a AssignInput<'a>,
    /// `grid[day][slot] = Some(person_idx)`
    pub grid: HashMap<u32, Vec<Option<usize>>>,
    /// `admissible[day][slot]` = person indices allowed to occupy that cell.
    admissible: HashMap<u32, Vec<Vec<usize>>>,
    /// Cells pinned by a manual assignment; never touched by a move.
    pinned: HashSet<(u32, usize)>,
    together_groups: Vec<Vec<usize>>,
    separate_pairs: Vec<(usize, usize)>,
}

impl<'a> State<'a> {
    pub fn new(input: &'a AssignInput<'a>) -> Self {
        let index_of: HashMap<i64, usize> = input
            .persons
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();

        let restriction_of: HashMap<i64, &RoleRestriction> = input
            .role_restrictions
            .iter()
            .map(|r| (r.person_id, r))
            .collect();

        let mut grid: HashMap<u32, Vec<Option<usize>>> = (1..=input.day_count)
            .map(|d| (d, vec![None; input.duties.len()]))
            .collect();
        let mut pinned = HashSet::new();

        let mut dsu = crate::dsu::Dsu::new(input.persons.len());
        let mut separate_pairs = Vec::new();
        for rule in input.rules {
            let idxs: Vec<usize> = rule
                .members
                .iter()
                .filter_map(|id| index_of.get(id).copied())
                .collect();
            match rule.kind {
                RuleKind::Together => {
                    for w in idxs.windows(2) {
                        dsu.union(w[0], w[1]);
                    }
                }
                RuleKind::Separate => {
                    for i in 0..idxs.len() {
                        for j in (i + 1)..idxs.len() {
                            separate_pairs.push((idxs[i], idxs[j]));
                        }
                    }
                }
            }
        }
        let together_groups: Vec<Vec<usize>> =
            dsu.groups().into_iter().filter(|g| g.len() > 1).collect();
        let together_member: HashSet<usize> =
            together_groups.iter().flatten().copied().collect();

        // A role is a *pool* role when any restriction names it with a
        // non-empty pool; only that pool's members may ever take the slot,
        // regardless of whether a given candidate has a restriction of
        // their own (H10).
        let mut pool_roles: HashMap<&str, HashSet<i64>> = HashMap::new();
        for r in input.role_restrictions {
            if r.is_pool() {
                pool_roles
                    .entry(r.restricted_role.as_str())
                    .or_default()
                    .extend(r.pool_members.iter().copied());
            }
        }

        let mut admissible: HashMap<u32, Vec<Vec<usize>>> = HashMap::new();
        for day in 1..=input.day_count {
            let mut per_slot = Vec::with_capacity(input.duties.len());
            for duty in input.duties {
                let mut candidates = Vec::new();
                for (idx, person) in input.persons.iter().enumerate() {
                    if person.is_excused(day) {
                        continue;
                    }
                    let has_role_exception = input
                        .role_exceptions
                        .get(&(person.id, day))
                        .map(|roles| roles.contains(duty.role_key()))
                        .unwrap_or(false);
                    if let Some(restriction) = restriction_of.get(&person.id) {
                        let role_ok = restriction.restricted_role == duty.role_key();
                        let overflow_ok = restriction
                            .overflow_role
                            .as_deref()
                            .map(|r| r == duty.role_key())
                            .unwrap_or(false);
                        if !role_ok && !overflow_ok && !has_role_exception {
                            continue;
                        }
                    }
                    if let Some(members) = pool_roles.get(duty.role_key()) {
                        if !members.contains(&person.id) {
                            continue;
                        }
                    }
                    if duty.exclusive {
                        let by_restriction = restriction_of
                            .get(&person.id)
                            .map(|r| {
                                r.restricted_role == duty.role_key()
                                    || r.overflow_role.as_deref() == Some(duty.role_key())
                            })
                            .unwrap_or(false);
                        let by_target = input
                            .targets
                            .per_person
                            .get(&person.id)
                            .and_then(|t| t.per_role.get(duty.role_key()))
                            .copied()
                            .unwrap_or(0)
                            > 0;
                        if !by_restriction && !by_target && !has_role_exception {
                            continue;
                        }
                    }
                    if duty.separate_building
                        && together_member.contains(&idx)
                        && !input.together_exceptions.contains(&(person.id, day))
                    {
                        continue;
                    }
                    candidates.push(idx);
                }
                per_slot.push(candidates);
            }
            admissible.insert(day, per_slot);
        }

        for m in input.manual_assignments {
            if let Some(&idx) = index_of.get(&m.person_id) {
                if let Some(row) = grid.get_mut(&m.day) {
                    if m.slot_index < row.len() {
                        row[m.slot_index] = Some(idx);
                        pinned.insert((m.day, m.slot_index));
                    }
                }
            }
        }

        // Seed: fill every admissible empty cell with an arbitrary eligible
        // candidate so the search starts from a (possibly imperfect) full
        // grid rather than climbing out of a mostly-empty one.
        let mut state = State {
            input,
            grid,
            admissible,
            pinned,
            together_groups,
            separate_pairs,
        };
        state.greedy_seed();
        state
    }

    fn greedy_seed(&mut self) {
        let days: Vec<u32> = (1..=self.input.day_count).collect();
        for day in days {
            let slot_count = self.input.duties.len();
            for slot in 0..slot_count {
                if self.pinned.contains(&(day, slot)) {
                    continue;
                }
                if self.grid[&day][slot].is_some() {
                    continue;
                }
                let candidates = self.admissible[&day][slot].clone();
                for &candidate in &candidates {
                    if self.is_legal_fill(day, slot, candidate) {
                        self.grid.get_mut(&day).unwrap()[slot] = Some(candidate);
                        break;
                    }
                }
            }
        }
    }

    fn person_busy_on(&self, day: u32, person: usize) -> bool {
        self.grid
            .get(&day)
            .map(|row| row.iter().any(|c| *c == Some(person)))
            .unwrap_or(false)
    }

    fn violates_gap(&self, day: u32, person: usize) -> bool {
        let gap = self.input.gap;
        if gap == 0 {
            return false;
        }
        let lo = day.saturating_sub(gap);
        let hi = (day + gap).min(self.input.day_count);
        for d in lo..=hi {
            if d == day {
                continue;
            }
            if self.person_busy_on(d, person) {
                return true;
            }
        }
        false
    }

    fn violates_separate(&self, day: u32, person: usize) -> bool {
        self.separate_pairs.iter().any(|&(a, b)| {
            let other = if a == person {
                Some(b)
            } else if b == person {
                Some(a)
            } else {
                None
            };
            other
                .map(|o| self.person_busy_on(day, o))
                .unwrap_or(false)
        })
    }

    fn is_legal_fill(&self, day: u32, slot: usize, person: usize) -> bool {
        if !self.admissible[&day][slot].contains(&person) {
            return false;
        }
        if self.person_busy_on(day, person) {
            return false;
        }
        if self.violates_gap(day, person) {
            return false;
        }
        if self.violates_separate(day, person) {
            return false;
        }
        true
    }

    /// Person indices admissible for a (day, slot) cell, ignoring the
    /// current occupancy of the grid (§4.4 "zero-candidate slots").
    pub fn admissible(&self, day: u32, slot: usize) -> &[usize] {
        &self.admissible[&day][slot]
    }

    pub fn unfilled_count(&self) -> usize {
        self.grid.values().flatten().filter(|c| c.is_none()).count()
    }

    pub fn together_groups(&self) -> &[Vec<usize>] {
        &self.together_groups
    }

    pub fn duty_role(&self, slot: usize) -> &str {
        self.input.duties[slot].role_key()
    }

    pub fn day_type(&self, day: u32) -> DayType {
        self.input.day_types[&day]
    }

    pub fn cost(&self, weights: &crate::config::AssignWeights) -> f64 {
        super::scoring::total_cost(self, weights)
    }

    /// Cost difference `mv` would cause. Recomputes the full objective
    /// before and after rather than tracking an incremental delta — the
    /// teacher's `calculate_swap_cost_delta` avoids this by updating a
    /// running contact matrix, which this grid-shaped problem has no
    /// equivalent of.
    pub fn delta_cost(&self, mv: &Move, weights: &crate::config::AssignWeights) -> f64 {
        let mut after = self.clone();
        after.apply_move(mv);
        after.cost(weights) - self.cost(weights)
    }

    pub fn propose_move(&self, rng: &mut StdRng) -> Option<Move> {
        let day_count = self.input.day_count;
        if day_count == 0 {
            return None;
        }
        let slot_count = self.input.duties.len();
        if slot_count == 0 {
            return None;
        }

        for _ in 0..8 {
            let day = rng.gen_range(1..=day_count);
            let slot = rng.gen_range(0..slot_count);
            if self.pinned.contains(&(day, slot)) {
                continue;
            }
            let choose_swap = rng.gen_bool(0.5);
            if choose_swap {
                let day_b = rng.gen_range(1..=day_count);
                let slot_b = rng.gen_range(0..slot_count);
                if (day, slot) == (day_b, slot_b) || self.pinned.contains(&(day_b, slot_b)) {
                    continue;
                }
                return Some(Move::Swap {
                    day_a: day,
                    slot_a: slot,
                    day_b,
                    slot_b,
                });
            }
            if self.grid[&day][slot].is_none() {
                let candidates = &self.admissible[&day][slot];
                if candidates.is_empty() {
                    continue;
                }
                let person = candidates[rng.gen_range(0..candidates.len())];
                return Some(Move::Fill { day, slot, person });
            } else {
                return Some(Move::Vacate { day, slot });
            }
        }
        None
    }

    pub fn apply_move(&mut self, mv: &Move) {
        match *mv {
            Move::Fill { day, slot, person } => {
                if self.is_legal_fill(day, slot, person) {
                    self.grid.get_mut(&day).unwrap()[slot] = Some(person);
                }
            }
            Move::Vacate { day, slot } => {
                self.grid.get_mut(&day).unwrap()[slot] = None;
            }
            Move::Swap {
                day_a,
                slot_a,
                day_b,
                slot_b,
            } => {
                if self.pinned.contains(&(day_a, slot_a)) || self.pinned.contains(&(day_b, slot_b))
                {
                    return;
                }
                let a = self.grid[&day_a][slot_a];
                let b = self.grid[&day_b][slot_b];
                // Clear both cells first so the busy/gap/separate checks below
                // see a consistent state — otherwise a person already occupying
                // one of the two cells would spuriously conflict with themself.
                self.grid.get_mut(&day_a).unwrap()[slot_a] = None;
                self.grid.get_mut(&day_b).unwrap()[slot_b] = None;

                let b_to_a_ok = b.map(|p| self.is_legal_fill(day_a, slot_a, p)).unwrap_or(true);
                let a_to_b_ok = a.map(|p| self.is_legal_fill(day_b, slot_b, p)).unwrap_or(true);

                if b_to_a_ok && a_to_b_ok {
                    self.grid.get_mut(&day_a).unwrap()[slot_a] = b;
                    self.grid.get_mut(&day_b).unwrap()[slot_b] = a;
                } else {
                    self.grid.get_mut(&day_a).unwrap()[slot_a] = a;
                    self.grid.get_mut(&day_b).unwrap()[slot_b] = b;
                }
            }
        }
    }

    pub fn to_schedule(&self) -> Schedule {
        let mut schedule = Schedule::empty(self.input.day_count, self.input.duties.len());
        for day in 1..=self.input.day_count {
            for (slot, cell) in self.grid[&day].iter().enumerate() {
                let person_id = cell.map(|idx| self.input.persons[idx].id);
                schedule.set(day, slot, person_id);
            }
        }
        schedule
    }
}
