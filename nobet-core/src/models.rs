//! Domain types for the duty roster problem.
//!
//! These are the request-scoped entities described in spec.md §3: `Person`,
//! `Duty`, `Rule`, `Assignment`, `Targets`, and the result/diagnostic
//! envelopes. Grounded on the teacher's `models::{Person, Group, Constraint}`
//! shape — a plain, serde-derived struct per entity, enums tagged by kind —
//! generalized from "person/group/session" to "person/duty-slot/day".

use crate::calendar::DayType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A member of the roster.
///
/// `targets_per_type` and `targets_per_role` are written once, by the
/// Target Computer's write-back phase (§3 "Mutated only in the Target
/// Computer's write-back phase"); the Assignment Solver only ever reads
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    /// Union of `mazeretler`, `yillikIzinler`, and `nobetIzinleri` (§4.3 /
    /// Request Parsers).
    pub excused_days: HashSet<u32>,
    pub restricted_role: Option<String>,
    pub overflow_role: Option<String>,
    #[serde(default)]
    pub targets_per_type: HashMap<DayType, u32>,
    pub targets_total: u32,
    #[serde(default)]
    pub targets_per_role: HashMap<String, u32>,
    /// Per-day-type realized counts from prior months, used by the annual
    /// deficit-correction soft term.
    #[serde(default)]
    pub annual_realized: HashMap<DayType, u32>,
    /// Carry-in deficit per day-type (`devir`); raises greedy candidate
    /// score (§9 GLOSSARY "Carry-in").
    #[serde(default)]
    pub carry_in: HashMap<DayType, u32>,
}

impl Person {
    pub fn is_excused(&self, day: u32) -> bool {
        self.excused_days.contains(&day)
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted_role.is_some()
    }
}

/// A single staffing position within a day (§3 "Duty").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duty {
    pub id: i64,
    /// Display name (`ad`); several slots may share a `base_name`.
    pub name: String,
    pub slot_index: usize,
    #[serde(default)]
    pub base_name: String,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    pub separate_building: bool,
}

impl Duty {
    /// Role key used for quotas, pools, and exclusivity: `base_name` when
    /// non-empty, else `name` (spec.md §4.1 "Role identity duality").
    pub fn role_key(&self) -> &str {
        if self.base_name.is_empty() {
            &self.name
        } else {
            &self.base_name
        }
    }
}

/// A must-work-together or must-not-share-day rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub kind: RuleKind,
    pub members: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Together,
    Separate,
}

/// Per-person, per-role restriction (§3 "RoleRestriction").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRestriction {
    pub person_id: i64,
    pub restricted_role: String,
    pub overflow_role: Option<String>,
    /// Wire-only flag, carried for request fidelity. The duty's own
    /// `Duty.exclusive` is the sole source of truth for exclusivity checks.
    #[serde(default)]
    pub exclusive: bool,
    /// Non-empty makes the role a *pool* role (§9 GLOSSARY).
    #[serde(default)]
    pub pool_members: Vec<i64>,
}

impl RoleRestriction {
    pub fn is_pool(&self) -> bool {
        !self.pool_members.is_empty()
    }
}

/// A pinned seed assignment, hard-constrained to 1 (§3 "ManualAssignment").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualAssignment {
    pub person_id: i64,
    pub day: u32,
    pub slot_index: usize,
}

/// One concrete (day, slot, person) triple.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub day: u32,
    pub slot_index: usize,
    pub person_id: i64,
}

/// Per-person, per-day-type and per-role target counts (§3 "Targets").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersonTargets {
    pub per_type: HashMap<DayType, u32>,
    pub per_role: HashMap<String, u32>,
    pub total: u32,
}

/// Full output of the Target Computer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Targets {
    pub per_person: HashMap<i64, PersonTargets>,
    /// Per together-group, the shared target total its members converged
    /// on — supplements the distilled spec per `SPEC_FULL.md` §2.
    pub together_group_summary: Vec<TogetherGroupSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TogetherGroupSummary {
    pub members: Vec<i64>,
    pub shared_total: u32,
}

/// Locked per-person per-day-type target counts supplied by the caller
/// (`kilitliHedefler`).
pub type LockedTargets = HashMap<i64, HashMap<DayType, u32>>;

/// Per-(person,day) exception allowing a role that would otherwise be
/// forbidden by a restriction or exclusivity check (admissibility test 1,
/// H7). Keyed by `(person_id, day)`, valued by the set of role keys the
/// exception opens up for that day.
pub type RoleExceptions = HashMap<(i64, u32), HashSet<String>>;

/// Per-(person,day) exception allowing a together-group member onto a
/// separate-building slot for that day (admissibility test 4, H9).
pub type TogetherExceptions = HashSet<(i64, u32)>;

/// The full month schedule: `schedule[day][slot] = Option<person_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub day_count: u32,
    pub slot_count: usize,
    pub cells: HashMap<u32, Vec<Option<i64>>>,
}

impl Schedule {
    pub fn empty(day_count: u32, slot_count: usize) -> Self {
        let cells = (1..=day_count)
            .map(|d| (d, vec![None; slot_count]))
            .collect();
        Schedule {
            day_count,
            slot_count,
            cells,
        }
    }

    pub fn get(&self, day: u32, slot: usize) -> Option<i64> {
        self.cells.get(&day).and_then(|row| row[slot])
    }

    pub fn set(&mut self, day: u32, slot: usize, person: Option<i64>) {
        if let Some(row) = self.cells.get_mut(&day) {
            row[slot] = person;
        }
    }

    pub fn assignments(&self) -> Vec<Assignment> {
        let mut out = Vec::new();
        let mut days: Vec<_> = self.cells.keys().copied().collect();
        days.sort_unstable();
        for day in days {
            for (slot_index, cell) in self.cells[&day].iter().enumerate() {
                if let Some(person_id) = cell {
                    out.push(Assignment {
                        day,
                        slot_index,
                        person_id: *person_id,
                    });
                }
            }
        }
        out
    }

    pub fn filled_count(&self) -> usize {
        self.cells
            .values()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_some())
            .count()
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len() * self.slot_count
    }
}

/// Solver status, normalized across the target/assignment/greedy paths
/// (§4.3 "State machine for the solver status normalization").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    ModelInvalid,
    Unknown,
    ManualConflict,
}

/// Quality metrics computed post-solve (spec.md §8).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityScore {
    pub denge_puani: f64,
    pub saat_adaleti: f64,
    pub homojenlik: f64,
    pub doluluk: f64,
    pub kural_uyumu: f64,
}

/// A manual-pin conflict record (§4.4 conflict codes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualConflict {
    pub code: ManualConflictCode,
    pub person_id: Option<i64>,
    pub day: Option<u32>,
    pub slot_index: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualConflictCode {
    ManuelKisiYok,
    ManuelGunHatali,
    ManuelSlotHatali,
    MazeretGunu,
    KisitlamaIhlali,
    ExclusiveIhlali,
    HavuzIhlali,
    AyriBinaBirlikte,
    AyniGunCiftAtama,
    AyniSlotCiftAtama,
    AraGunIhlali,
    AyriKuraliIhlali,
}

/// The full result envelope for a solve, success or failure (§4.3 / §6
/// "Solve").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub schedule: Option<Schedule>,
    pub quality: Option<QualityScore>,
    pub statistics: SolveStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolveStatistics {
    pub reason_hint: Option<String>,
    pub ara_gun_1_dene: Option<bool>,
    pub feasibility: Option<DiagnosticsReport>,
    pub manual_conflicts: Vec<ManualConflict>,
    pub relaxation_applied: RelaxationInfo,
    pub root_cause: Option<String>,
    pub diagnostic_messages: Vec<String>,
    pub greedy_fallback: bool,
}

/// Which relaxations were applied by the adaptive orchestrator (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelaxationInfo {
    pub gap_reduced_to: Option<u32>,
    pub exclusive_relaxed: bool,
    pub separate_removed: bool,
    pub together_removed: bool,
    pub all_soft_removed: bool,
    pub greedy_used: bool,
}

/// Post-infeasibility feasibility report (§4.4 "Feasibility report").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiagnosticsReport {
    pub zero_candidate_slots: Vec<(u32, usize)>,
    pub zero_candidate_preview_cap: usize,
    pub role_capacity_gaps: Vec<RoleCapacityGap>,
    /// Roles where at least 30% of their zero-candidate slots are exclusive
    /// (§4.4 "exclusive_gevset" relaxation scoping).
    pub exclusive_relax_roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCapacityGap {
    pub role: String,
    pub demand: u32,
    pub upper_bound: u32,
}

/// Capacity report for the Capacity endpoint (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityReport {
    pub day_count: u32,
    pub type_counts: HashMap<DayType, u32>,
    pub type_slots: HashMap<DayType, u32>,
    pub total_slots: u32,
    pub per_person: Vec<PersonCapacity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonCapacity {
    pub person_id: i64,
    pub excused_count: usize,
    pub available_days: usize,
    pub available_per_type: HashMap<DayType, u32>,
}
