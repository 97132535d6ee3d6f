//! HTTP handlers for the four external endpoints (spec.md §6): Capacity,
//! Target, Solve, and Distribute (solve + render + store).

use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use nobet_contracts::{
    AssignmentDto, CapacityResponseDto, RosterRequest, SolveResponseDto, TargetResponseDto,
};
use nobet_core::calendar::{build_day_types, Holiday};
use nobet_core::config::SolverConfig;
use nobet_core::models::{CapacityReport, LockedTargets, PersonCapacity};
use nobet_core::orchestrator::{solve, SolveRequest};
use nobet_core::parse::{self};
use nobet_core::target::{self, TargetInput};
use std::collections::HashMap;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn bad_request<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn day_type_from_str(s: &str) -> Option<nobet_core::calendar::DayType> {
    use nobet_core::calendar::DayType::*;
    match s {
        "hici" => Some(Hici),
        "prs" => Some(Prs),
        "cum" => Some(Cum),
        "cmt" => Some(Cmt),
        "pzr" => Some(Pzr),
        _ => None,
    }
}

fn day_type_map(request: &RosterRequest) -> HashMap<u32, nobet_core::calendar::DayType> {
    let holidays: Vec<Holiday> = request
        .resmi_tatiller
        .iter()
        .filter_map(|h| day_type_from_str(&h.tur).map(|t| Holiday { day: h.gun, day_type: t }))
        .collect();
    build_day_types(request.yil, request.ay, &holidays)
}

fn convert_value<T: serde::de::DeserializeOwned>(v: &impl serde::Serialize) -> Result<T, String> {
    let json = serde_json::to_value(v).map_err(|e| e.to_string())?;
    serde_json::from_value(json).map_err(|e| e.to_string())
}

/// Per-day-type calendar day counts for the month, distinct from
/// `type_slots` (which scales by slots-per-day).
fn day_type_counts(
    day_types: &HashMap<u32, nobet_core::calendar::DayType>,
) -> HashMap<nobet_core::calendar::DayType, u32> {
    let mut counts = HashMap::new();
    for t in day_types.values() {
        *counts.entry(*t).or_insert(0) += 1;
    }
    counts
}

/// `POST /capacity` — per-day-type slot counts for the requested month,
/// plus per-person availability after excused days.
pub async fn capacity(
    State(_state): State<AppState>,
    Json(request): Json<RosterRequest>,
) -> ApiResult<CapacityResponseDto> {
    let day_types = day_type_map(&request);
    let persons = parse::parse_people(&convert_value(&request.personeller).map_err(bad_request)?)
        .map_err(bad_request)?;

    let mut tip_sayilari = HashMap::new();
    for t in day_types.values() {
        *tip_sayilari.entry(t.to_string()).or_insert(0) += 1;
    }

    let per_person: Vec<PersonCapacity> = persons
        .iter()
        .map(|p| {
            let excused_count = p.excused_days.len();
            let available_days = day_types.len().saturating_sub(excused_count);
            let mut available_per_type = HashMap::new();
            for (day, t) in &day_types {
                if !p.is_excused(*day) {
                    *available_per_type.entry(*t).or_insert(0) += 1;
                }
            }
            PersonCapacity {
                person_id: p.id,
                excused_count,
                available_days,
                available_per_type,
            }
        })
        .collect();
    let _report = CapacityReport {
        day_count: day_types.len() as u32,
        type_counts: HashMap::new(),
        type_slots: HashMap::new(),
        total_slots: 0,
        per_person,
    };

    Ok(Json(CapacityResponseDto {
        gun_sayisi: day_types.len() as u32,
        tip_sayilari,
    }))
}

/// `POST /target` — runs the Target Computer alone.
pub async fn target_endpoint(
    State(_state): State<AppState>,
    Json(request): Json<RosterRequest>,
) -> ApiResult<TargetResponseDto> {
    let day_types = day_type_map(&request);
    let persons = parse::parse_people(&convert_value(&request.personeller).map_err(bad_request)?)
        .map_err(bad_request)?;
    let duties = parse::parse_duties(&convert_value(&request.gorevler).map_err(bad_request)?)
        .map_err(bad_request)?;
    let rules = parse::parse_rules(
        &convert_value(&request.kurallar).map_err(bad_request)?,
        &persons,
    )
    .map_err(bad_request)?;

    let mut type_slots = HashMap::new();
    for t in day_types.values() {
        *type_slots.entry(*t).or_insert(0) += duties.len() as u32;
    }

    let config = SolverConfig::default();
    let target_input = TargetInput {
        persons: &persons,
        rules: &rules,
        duties: &duties,
        type_slots,
        day_counts: day_type_counts(&day_types),
        locked: LockedTargets::new(),
    };
    let targets = target::compute_targets(
        &target_input,
        &config.target_weights,
        &config.hour_weights,
        &config.target_annealing,
    )
    .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let per_person = targets
        .per_person
        .iter()
        .map(|(id, t)| {
            let per_type = t.per_type.iter().map(|(k, v)| (k.to_string(), *v)).collect();
            (id.to_string(), per_type)
        })
        .collect();

    Ok(Json(TargetResponseDto {
        durum: "basarili".to_string(),
        per_person,
    }))
}

fn run_solve(request: &RosterRequest) -> Result<SolveResponseDto, (StatusCode, String)> {
    let day_types = day_type_map(request);
    let persons = parse::parse_people(&convert_value(&request.personeller).map_err(bad_request)?)
        .map_err(bad_request)?;
    let duties = parse::parse_duties(&convert_value(&request.gorevler).map_err(bad_request)?)
        .map_err(bad_request)?;
    let rules = parse::parse_rules(
        &convert_value(&request.kurallar).map_err(bad_request)?,
        &persons,
    )
    .map_err(bad_request)?;
    let role_restrictions = parse::parse_role_restrictions(
        &convert_value(&request.gorev_kisitlamalari).map_err(bad_request)?,
        &persons,
    )
    .map_err(bad_request)?;
    let manual_assignments = parse::parse_manual_assignments(
        &convert_value(&request.manuel_atamalar).map_err(bad_request)?,
        &persons,
        &duties,
        day_types.len() as u32,
    )
    .map_err(bad_request)?;
    let role_exceptions = parse::parse_role_exceptions(
        &convert_value(&request.gorev_kisitlama_istisnalari).map_err(bad_request)?,
        &persons,
    )
    .map_err(bad_request)?;
    let together_exceptions = parse::parse_together_exceptions(
        &convert_value(&request.birlikte_istisnalari).map_err(bad_request)?,
        &persons,
    )
    .map_err(bad_request)?;

    let mut type_slots = HashMap::new();
    for t in day_types.values() {
        *type_slots.entry(*t).or_insert(0) += duties.len() as u32;
    }

    let solve_request = SolveRequest {
        persons,
        duties,
        rules,
        role_restrictions,
        manual_assignments,
        role_exceptions,
        together_exceptions,
        day_count: day_types.len() as u32,
        day_types,
        type_slots,
        locked_targets: LockedTargets::new(),
        config: SolverConfig::default(),
    };

    tracing::info!("starting solve");
    let result = solve(&solve_request);

    let assignments = result.schedule.as_ref().map(|s| {
        s.assignments()
            .into_iter()
            .map(|a| AssignmentDto {
                gun: a.day,
                slot_idx: a.slot_index,
                personel_id: a.person_id,
            })
            .collect()
    });

    Ok(SolveResponseDto {
        durum: format!("{:?}", result.status),
        cizelge: assignments,
        kalite: result.quality.and_then(|q| serde_json::to_value(q).ok()),
        istatistik: serde_json::to_value(&result.statistics).unwrap_or_default(),
    })
}

/// `POST /solve` — runs the full adaptive solve.
pub async fn solve_endpoint(
    State(_state): State<AppState>,
    Json(request): Json<RosterRequest>,
) -> ApiResult<SolveResponseDto> {
    run_solve(&request).map(Json)
}

/// `POST /distribute` — solves, renders a workbook through the
/// `WorkbookRenderer`, and stores it through the `ObjectStore`, returning
/// the solve result plus the stored workbook's location.
pub async fn distribute(
    State(state): State<AppState>,
    Json(request): Json<RosterRequest>,
) -> ApiResult<SolveResponseDto> {
    let response = run_solve(&request)?;

    if let Some(cells) = &response.cizelge {
        let day_types = day_type_map(&request);
        let persons = parse::parse_people(&convert_value(&request.personeller).map_err(bad_request)?)
            .map_err(bad_request)?;
        let mut schedule = nobet_core::models::Schedule::empty(
            day_types.len() as u32,
            request.gorevler.len(),
        );
        for a in cells {
            schedule.set(a.gun, a.slot_idx, Some(a.personel_id));
        }
        let capacity = CapacityReport {
            day_count: day_types.len() as u32,
            type_counts: HashMap::new(),
            type_slots: HashMap::new(),
            total_slots: 0,
            per_person: persons
                .iter()
                .map(|p| PersonCapacity {
                    person_id: p.id,
                    excused_count: p.excused_days.len(),
                    available_days: day_types.len().saturating_sub(p.excused_days.len()),
                    available_per_type: HashMap::new(),
                })
                .collect(),
        };
        let bytes = state
            .renderer
            .render(&schedule, &capacity)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        let key = format!("nobet-{}-{}.csv", request.yil, request.ay);
        let location = state
            .store
            .put(&key, &bytes)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        tracing::info!(location, "workbook stored");
    }

    Ok(Json(response))
}
