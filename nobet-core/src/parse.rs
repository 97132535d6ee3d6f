//! Request parsing: turns the loosely-typed wire document into validated
//! domain objects.
//!
//! Grounded on `examples/original_source/functions/parsers.py`, which sits
//! between the wire shapes and `ortools_solver.py`'s `SolverPersonel` /
//! `SolverGorev` / `SolverKural` — and on spec.md §9's "Dynamic person
//! references" and "Heterogeneous rule payloads" redesign notes.

use crate::calendar::{build_day_types, Holiday};
use crate::error::ParseError;
use crate::identity::{normalize_id, RawId};
use crate::models::{Duty, ManualAssignment, Person, Rule, RuleKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A dynamic reference to a person: by normalized id or by display name.
/// Modeled as a tagged variant per spec.md §9, resolved through a single
/// `resolve` whose hashing matches `normalize_id` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersonRef {
    ById(i64),
    ByFloat(f64),
    ByName(String),
}

impl PersonRef {
    /// Resolves this reference against `persons`, returning the matching
    /// normalized id.
    ///
    /// Open Question (spec.md §9): a numeric string that is *also* the
    /// literal digit-spelling of a real person's name is ambiguous between
    /// "parse as id" and "parse as name". We resolve by-id first, matching
    /// the teacher's identity-normalization rule that numeric strings
    /// collapse onto their integer twin — a name lookup only happens when
    /// no id matches. This is an explicit choice, recorded in DESIGN.md.
    pub fn resolve(&self, persons: &[Person]) -> Option<i64> {
        match self {
            PersonRef::ById(id) => {
                let norm = normalize_id(RawId::Int(*id));
                if persons.iter().any(|p| p.id == norm) {
                    return Some(norm);
                }
                persons
                    .iter()
                    .find(|p| normalize_id(RawId::Str(&p.name)) == norm)
                    .map(|p| p.id)
            }
            PersonRef::ByFloat(f) => {
                let norm = normalize_id(RawId::Float(*f));
                persons.iter().find(|p| p.id == norm).map(|p| p.id)
            }
            PersonRef::ByName(name) => {
                let norm = normalize_id(RawId::Str(name));
                if let Some(p) = persons.iter().find(|p| p.id == norm) {
                    return Some(p.id);
                }
                persons.iter().find(|p| p.name == *name).map(|p| p.id)
            }
        }
    }
}

/// Raw wire shape for a person (§6 "Person shape (input)").
#[derive(Debug, Clone, Deserialize)]
pub struct RawPerson {
    pub id: serde_json::Value,
    pub ad: String,
    #[serde(default)]
    pub mazeretler: Vec<u32>,
    #[serde(default)]
    #[serde(rename = "yillikIzinler")]
    pub yillik_izinler: Vec<u32>,
    #[serde(default)]
    #[serde(rename = "nobetIzinleri")]
    pub nobet_izinleri: Vec<u32>,
    #[serde(default)]
    pub hici: u32,
    #[serde(default)]
    pub prs: u32,
    #[serde(default)]
    pub cum: u32,
    #[serde(default)]
    pub cmt: u32,
    #[serde(default)]
    pub pzr: u32,
    #[serde(default)]
    #[serde(rename = "gorevKotalari")]
    pub gorev_kotalari: HashMap<String, u32>,
    #[serde(default)]
    #[serde(rename = "yillikGerceklesen")]
    pub yillik_gerceklesen: HashMap<String, u32>,
    #[serde(default)]
    pub devir: HashMap<String, u32>,
    #[serde(default)]
    #[serde(rename = "kisitliGorev")]
    pub kisitli_gorev: Option<String>,
    #[serde(default)]
    #[serde(rename = "tasmaGorevi")]
    pub tasma_gorevi: Option<String>,
}

/// Raw wire shape for a rule, accepting both the legacy `p1,p2,p3` form and
/// the current `kisiler[]` form (spec.md §9 "Heterogeneous rule payloads").
#[derive(Debug, Clone, Deserialize)]
pub struct RawRule {
    pub tur: String,
    #[serde(default)]
    pub kisiler: Vec<serde_json::Value>,
    #[serde(default)]
    pub p1: Option<serde_json::Value>,
    #[serde(default)]
    pub p2: Option<serde_json::Value>,
    #[serde(default)]
    pub p3: Option<serde_json::Value>,
}

/// Raw wire shape for a role restriction.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoleRestriction {
    #[serde(rename = "personelId")]
    pub personel_id: serde_json::Value,
    #[serde(rename = "gorevAdi")]
    pub gorev_adi: String,
    #[serde(default)]
    pub exclusive: Option<bool>,
    #[serde(default)]
    #[serde(rename = "havuzIds")]
    pub havuz_ids: Vec<serde_json::Value>,
    #[serde(default)]
    #[serde(rename = "tasmaGorevi")]
    pub tasma_gorevi: Option<String>,
}

/// Raw wire shape for a manual assignment, with multiple lookup paths —
/// first match wins (spec.md §6 "Manual assignment").
#[derive(Debug, Clone, Deserialize)]
pub struct RawManualAssignment {
    #[serde(default)]
    pub personel: Option<serde_json::Value>,
    #[serde(default)]
    #[serde(rename = "personelAd")]
    pub personel_ad: Option<String>,
    #[serde(default)]
    #[serde(rename = "personelId")]
    pub personel_id: Option<serde_json::Value>,
    pub gun: u32,
    #[serde(default)]
    #[serde(rename = "gorevId")]
    pub gorev_id: Option<serde_json::Value>,
    #[serde(default)]
    #[serde(rename = "gorevAdi")]
    pub gorev_adi: Option<String>,
    #[serde(default)]
    #[serde(rename = "slotIdx")]
    pub slot_idx: Option<usize>,
    #[serde(default)]
    #[serde(rename = "gorevIdx")]
    pub gorev_idx: Option<usize>,
}

/// Raw wire shape for a per-(person,day) role exception (admissibility test
/// 1, H7).
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoleException {
    #[serde(rename = "personelId")]
    pub personel_id: serde_json::Value,
    pub gun: u32,
    #[serde(rename = "istisnaGorev")]
    pub istisna_gorev: String,
}

/// Raw wire shape for a per-(person,day) together exception (admissibility
/// test 4, H9).
#[derive(Debug, Clone, Deserialize)]
pub struct RawTogetherException {
    #[serde(rename = "personelId")]
    pub personel_id: serde_json::Value,
    pub gun: u32,
}

/// Raw wire shape for a duty/slot definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDuty {
    pub id: serde_json::Value,
    pub ad: String,
    #[serde(rename = "slotIdx")]
    #[serde(default)]
    pub slot_idx: Option<usize>,
    #[serde(default)]
    #[serde(rename = "baseName")]
    pub base_name: String,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    #[serde(rename = "ayriBina")]
    pub ayri_bina: bool,
}

fn value_to_raw_id(v: &serde_json::Value) -> Option<RawId<'_>> {
    match v {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(RawId::Int(i))
            } else {
                n.as_f64().map(RawId::Float)
            }
        }
        serde_json::Value::String(s) => Some(RawId::Str(s.as_str())),
        serde_json::Value::Bool(b) => Some(RawId::Bool(*b)),
        _ => None,
    }
}

fn normalize_json_id(v: &serde_json::Value) -> Option<i64> {
    value_to_raw_id(v).map(normalize_id)
}

/// Parses people, de-duplicating by normalized id (spec.md §3 invariant:
/// "Every person id, after normalization, is unique within a request").
pub fn parse_people(raw: &[RawPerson]) -> Result<Vec<Person>, ParseError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut seen = HashSet::new();
    for rp in raw {
        let id = normalize_json_id(&rp.id).ok_or(ParseError::MissingField("id"))?;
        if !seen.insert(id) {
            return Err(ParseError::DuplicatePersonId(id));
        }
        let mut excused_days = HashSet::new();
        excused_days.extend(rp.mazeretler.iter().copied());
        excused_days.extend(rp.yillik_izinler.iter().copied());
        excused_days.extend(rp.nobet_izinleri.iter().copied());

        let annual_realized = rp
            .yillik_gerceklesen
            .iter()
            .filter_map(|(k, v)| day_type_key(k).map(|t| (t, *v)))
            .collect();
        let carry_in = rp
            .devir
            .iter()
            .filter_map(|(k, v)| day_type_key(k).map(|t| (t, *v)))
            .collect();

        out.push(Person {
            id,
            name: rp.ad.clone(),
            excused_days,
            restricted_role: rp.kisitli_gorev.clone(),
            overflow_role: rp.tasma_gorevi.clone(),
            targets_per_type: HashMap::new(),
            targets_total: 0,
            targets_per_role: rp.gorev_kotalari.clone(),
            annual_realized,
            carry_in,
        });
    }
    Ok(out)
}

fn day_type_key(s: &str) -> Option<crate::calendar::DayType> {
    use crate::calendar::DayType::*;
    match s {
        "hici" => Some(Hici),
        "prs" => Some(Prs),
        "cum" => Some(Cum),
        "cmt" => Some(Cmt),
        "pzr" => Some(Pzr),
        _ => None,
    }
}

/// Parses duties/slots, assigning stable 0-based slot indices when the
/// document doesn't already carry one.
pub fn parse_duties(raw: &[RawDuty]) -> Result<Vec<Duty>, ParseError> {
    raw.iter()
        .enumerate()
        .map(|(i, rd)| {
            let id = normalize_json_id(&rd.id).ok_or(ParseError::MissingField("id"))?;
            Ok(Duty {
                id,
                name: rd.ad.clone(),
                slot_index: rd.slot_idx.unwrap_or(i),
                base_name: rd.base_name.clone(),
                exclusive: rd.exclusive,
                separate_building: rd.ayri_bina,
            })
        })
        .collect()
}

/// Canonicalizes rules, accepting both `kisiler[]` and legacy `p1,p2,p3`,
/// resolving each member reference against `persons`, and rejecting rules
/// with fewer than 2 resolved members.
pub fn parse_rules(raw: &[RawRule], persons: &[Person]) -> Result<Vec<Rule>, ParseError> {
    let mut out = Vec::with_capacity(raw.len());
    for (index, rr) in raw.iter().enumerate() {
        let kind = match rr.tur.as_str() {
            "birlikte" => RuleKind::Together,
            "ayri" => RuleKind::Separate,
            other => {
                return Err(ParseError::UnknownRuleKind {
                    kind: other.to_string(),
                    index,
                })
            }
        };

        let mut refs: Vec<serde_json::Value> = rr.kisiler.clone();
        for legacy in [&rr.p1, &rr.p2, &rr.p3] {
            if let Some(v) = legacy {
                refs.push(v.clone());
            }
        }

        let mut members = Vec::new();
        for v in &refs {
            let person_ref = json_value_to_person_ref(v);
            if let Some(id) = person_ref.resolve(persons) {
                if !members.contains(&id) {
                    members.push(id);
                }
            }
        }

        if members.len() < 2 {
            return Err(ParseError::RuleTooFewMembers { index });
        }

        out.push(Rule { kind, members });
    }
    Ok(out)
}

fn json_value_to_person_ref(v: &serde_json::Value) -> PersonRef {
    match v {
        serde_json::Value::String(s) => PersonRef::ByName(s.clone()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                PersonRef::ById(i)
            } else {
                PersonRef::ByFloat(n.as_f64().unwrap_or(0.0))
            }
        }
        _ => PersonRef::ByName(String::new()),
    }
}

/// Resolves manual assignments against persons and duties, trying lookup
/// paths in the order the source does: `personel` → `personelAd` →
/// `personelId`; `gorevId` → `gorevAdi` → `slotIdx` → `gorevIdx`.
pub fn parse_manual_assignments(
    raw: &[RawManualAssignment],
    persons: &[Person],
    duties: &[Duty],
    day_count: u32,
) -> Result<Vec<ManualAssignment>, ParseError> {
    let mut out = Vec::with_capacity(raw.len());
    for rma in raw {
        if rma.gun == 0 || rma.gun > day_count {
            return Err(ParseError::DayOutOfRange {
                day: rma.gun,
                day_count,
            });
        }

        let person_ref = rma
            .personel
            .as_ref()
            .map(json_value_to_person_ref)
            .or_else(|| rma.personel_ad.clone().map(PersonRef::ByName))
            .or_else(|| rma.personel_id.as_ref().map(json_value_to_person_ref))
            .ok_or(ParseError::MissingField("personel"))?;

        let person_id = person_ref
            .resolve(persons)
            .ok_or_else(|| ParseError::UnknownPersonRef(format!("{person_ref:?}")))?;

        let slot_index = rma
            .gorev_id
            .as_ref()
            .and_then(normalize_json_id)
            .and_then(|gid| duties.iter().find(|d| d.id == gid).map(|d| d.slot_index))
            .or_else(|| {
                rma.gorev_adi
                    .as_ref()
                    .and_then(|name| duties.iter().find(|d| &d.name == name))
                    .map(|d| d.slot_index)
            })
            .or(rma.slot_idx)
            .or(rma.gorev_idx)
            .ok_or(ParseError::MissingField("gorevId"))?;

        if slot_index >= duties.len() {
            return Err(ParseError::SlotOutOfRange {
                slot: slot_index,
                slot_count: duties.len(),
            });
        }

        out.push(ManualAssignment {
            person_id,
            day: rma.gun,
            slot_index,
        });
    }
    Ok(out)
}

/// Parses role restrictions, resolving the person reference and building
/// the pool member list.
pub fn parse_role_restrictions(
    raw: &[RawRoleRestriction],
    persons: &[Person],
) -> Result<Vec<crate::models::RoleRestriction>, ParseError> {
    raw.iter()
        .map(|r| {
            let person_ref = json_value_to_person_ref(&r.personel_id);
            let person_id = person_ref
                .resolve(persons)
                .ok_or_else(|| ParseError::UnknownPersonRef(format!("{person_ref:?}")))?;
            let pool_members = r
                .havuz_ids
                .iter()
                .filter_map(|v| json_value_to_person_ref(v).resolve(persons))
                .collect();
            Ok(crate::models::RoleRestriction {
                person_id,
                restricted_role: r.gorev_adi.clone(),
                overflow_role: r.tasma_gorevi.clone(),
                exclusive: r.exclusive.unwrap_or(true),
                pool_members,
            })
        })
        .collect()
}

/// Parses per-(person,day) role exceptions into the lookup the assignment
/// solver's admissibility pass consults (H7).
pub fn parse_role_exceptions(
    raw: &[RawRoleException],
    persons: &[Person],
) -> Result<crate::models::RoleExceptions, ParseError> {
    let mut out: crate::models::RoleExceptions = HashMap::new();
    for re in raw {
        let person_ref = json_value_to_person_ref(&re.personel_id);
        let person_id = person_ref
            .resolve(persons)
            .ok_or_else(|| ParseError::UnknownPersonRef(format!("{person_ref:?}")))?;
        out.entry((person_id, re.gun))
            .or_default()
            .insert(re.istisna_gorev.clone());
    }
    Ok(out)
}

/// Parses per-(person,day) together exceptions into the lookup the
/// assignment solver's admissibility pass consults (H9).
pub fn parse_together_exceptions(
    raw: &[RawTogetherException],
    persons: &[Person],
) -> Result<crate::models::TogetherExceptions, ParseError> {
    let mut out = HashSet::new();
    for te in raw {
        let person_ref = json_value_to_person_ref(&te.personel_id);
        let person_id = person_ref
            .resolve(persons)
            .ok_or_else(|| ParseError::UnknownPersonRef(format!("{person_ref:?}")))?;
        out.insert((person_id, te.gun));
    }
    Ok(out)
}

/// Builds the day→type map for the requested month, forwarding holiday
/// overrides (§4.1).
pub fn parse_calendar(
    year: i32,
    month: u32,
    holidays: &[(u32, String)],
) -> HashMap<u32, crate::calendar::DayType> {
    let parsed: Vec<Holiday> = holidays
        .iter()
        .filter_map(|(day, kind)| day_type_key(kind).map(|t| Holiday { day: *day, day_type: t }))
        .collect();
    build_day_types(year, month, &parsed)
}
