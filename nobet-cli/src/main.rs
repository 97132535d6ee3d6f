//! nobet-cli: command-line interface for the on-call duty roster scheduler.
//!
//! This CLI lets an operator (or an AI agent) exercise the full solve
//! pipeline without the HTTP surface.
//!
//! # Commands
//!
//! - `capacity`: report per-day-type slot counts for a month
//! - `target`: run the Target Computer alone and print per-person targets
//! - `solve` / `distribute`: run the full adaptive solve and print a schedule
//! - `schema`: print the JSON Schema for a request or response shape

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nobet_contracts::RosterRequest;
use nobet_core::calendar::{build_day_types, Holiday};
use nobet_core::config::SolverConfig;
use nobet_core::models::LockedTargets;
use nobet_core::orchestrator::{solve, SolveRequest};
use nobet_core::parse::{
    self, RawDuty, RawManualAssignment, RawPerson, RawRoleException, RawRule, RawRoleRestriction,
    RawTogetherException,
};
use nobet_core::target::{self, TargetInput};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nobet-cli")]
#[command(version = "0.1.0")]
#[command(about = "On-call duty roster scheduler CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report per-day-type slot capacity for a month.
    Capacity {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long)]
        stdin: bool,
        #[arg(long)]
        pretty: bool,
    },

    /// Run the Target Computer alone and print per-person target counts.
    Target {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long)]
        stdin: bool,
        #[arg(long)]
        pretty: bool,
    },

    /// Run the full adaptive solve and print the resulting schedule.
    Solve {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long)]
        stdin: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },

    /// Alias for `solve`, named after the legacy VBA macro it replaces.
    Distribute {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long)]
        stdin: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },

    /// Print the JSON Schema for the request body.
    Schema,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Capacity {
            input,
            stdin,
            pretty,
        } => cmd_capacity(input, stdin, pretty),
        Commands::Target {
            input,
            stdin,
            pretty,
        } => cmd_target(input, stdin, pretty),
        Commands::Solve {
            input,
            stdin,
            output,
            pretty,
        }
        | Commands::Distribute {
            input,
            stdin,
            output,
            pretty,
        } => cmd_solve(input, stdin, output, pretty),
        Commands::Schema => cmd_schema(),
    }
}

fn read_input(file: Option<PathBuf>, use_stdin: bool) -> Result<String> {
    if use_stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = file {
        fs::read_to_string(&path).with_context(|| format!("failed to read file: {path:?}"))
    } else {
        anyhow::bail!("either provide an input file or use --stdin")
    }
}

fn load_request(input: Option<PathBuf>, stdin: bool) -> Result<RosterRequest> {
    let json_str = read_input(input, stdin)?;
    serde_json::from_str(&json_str).context("failed to parse request JSON")
}

fn build_day_type_map(request: &RosterRequest) -> HashMap<u32, nobet_core::calendar::DayType> {
    let holidays: Vec<Holiday> = request
        .resmi_tatiller
        .iter()
        .filter_map(|h| day_type_from_str(&h.tur).map(|t| Holiday { day: h.gun, day_type: t }))
        .collect();
    build_day_types(request.yil, request.ay, &holidays)
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

fn cmd_capacity(input: Option<PathBuf>, stdin: bool, pretty: bool) -> Result<()> {
    let request = load_request(input, stdin)?;
    let day_types = build_day_type_map(&request);
    let mut tip_sayilari: HashMap<String, u32> = HashMap::new();
    for t in day_types.values() {
        *tip_sayilari.entry(t.to_string()).or_insert(0) += 1;
    }
    let response = nobet_contracts::CapacityResponseDto {
        gun_sayisi: day_types.len() as u32,
        tip_sayilari,
    };
    print_json(&response, pretty)
}

fn raw_people(request: &RosterRequest) -> Result<Vec<RawPerson>> {
    let value = serde_json::to_value(&request.personeller)?;
    Ok(serde_json::from_value(value)?)
}

fn raw_duties(request: &RosterRequest) -> Result<Vec<RawDuty>> {
    let value = serde_json::to_value(&request.gorevler)?;
    Ok(serde_json::from_value(value)?)
}

fn raw_rules(request: &RosterRequest) -> Result<Vec<RawRule>> {
    let value = serde_json::to_value(&request.kurallar)?;
    Ok(serde_json::from_value(value)?)
}

fn raw_role_restrictions(request: &RosterRequest) -> Result<Vec<RawRoleRestriction>> {
    let value = serde_json::to_value(&request.gorev_kisitlamalari)?;
    Ok(serde_json::from_value(value)?)
}

fn raw_manual_assignments(request: &RosterRequest) -> Result<Vec<RawManualAssignment>> {
    let value = serde_json::to_value(&request.manuel_atamalar)?;
    Ok(serde_json::from_value(value)?)
}

fn raw_role_exceptions(request: &RosterRequest) -> Result<Vec<RawRoleException>> {
    let value = serde_json::to_value(&request.gorev_kisitlama_istisnalari)?;
    Ok(serde_json::from_value(value)?)
}

fn raw_together_exceptions(request: &RosterRequest) -> Result<Vec<RawTogetherException>> {
    let value = serde_json::to_value(&request.birlikte_istisnalari)?;
    Ok(serde_json::from_value(value)?)
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

fn cmd_target(input: Option<PathBuf>, stdin: bool, pretty: bool) -> Result<()> {
    let request = load_request(input, stdin)?;
    let day_types = build_day_type_map(&request);
    let persons = parse::parse_people(&raw_people(&request)?)?;

    let mut type_slots = HashMap::new();
    let duties = parse::parse_duties(&raw_duties(&request)?)?;
    for t in day_types.values() {
        *type_slots.entry(*t).or_insert(0) += duties.len() as u32;
    }
    let rules = parse::parse_rules(&raw_rules(&request)?, &persons)?;

    let target_input = TargetInput {
        persons: &persons,
        rules: &rules,
        duties: &duties,
        type_slots,
        day_counts: day_type_counts(&day_types),
        locked: LockedTargets::new(),
    };
    let config = SolverConfig::default();
    let targets = target::compute_targets(
        &target_input,
        &config.target_weights,
        &config.hour_weights,
        &config.target_annealing,
    )
    .map_err(|e| anyhow::anyhow!("target computation failed: {e}"))?;

    let mut per_person = HashMap::new();
    for (id, t) in &targets.per_person {
        let per_type = t
            .per_type
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        per_person.insert(id.to_string(), per_type);
    }
    let response = nobet_contracts::TargetResponseDto {
        durum: "basarili".to_string(),
        per_person,
    };
    print_json(&response, pretty)
}

fn cmd_solve(
    input: Option<PathBuf>,
    stdin: bool,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let request = load_request(input, stdin)?;
    let day_types = build_day_type_map(&request);
    let persons = parse::parse_people(&raw_people(&request)?)?;
    let duties = parse::parse_duties(&raw_duties(&request)?)?;
    let rules = parse::parse_rules(&raw_rules(&request)?, &persons)?;
    let role_restrictions = parse::parse_role_restrictions(&raw_role_restrictions(&request)?, &persons)?;
    let manual_assignments = parse::parse_manual_assignments(
        &raw_manual_assignments(&request)?,
        &persons,
        &duties,
        day_types.len() as u32,
    )?;
    let role_exceptions = parse::parse_role_exceptions(&raw_role_exceptions(&request)?, &persons)?;
    let together_exceptions =
        parse::parse_together_exceptions(&raw_together_exceptions(&request)?, &persons)?;

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

    log::info!("running adaptive solve");
    let result = solve(&solve_request);

    let assignments = result.schedule.as_ref().map(|s| {
        s.assignments()
            .into_iter()
            .map(|a| nobet_contracts::AssignmentDto {
                gun: a.day,
                slot_idx: a.slot_index,
                personel_id: a.person_id,
            })
            .collect()
    });
    let response = nobet_contracts::SolveResponseDto {
        durum: format!("{:?}", result.status),
        cizelge: assignments,
        kalite: result
            .quality
            .map(|q| serde_json::to_value(q).unwrap_or_default()),
        istatistik: serde_json::to_value(&result.statistics).unwrap_or_default(),
    };

    let output_json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    if let Some(path) = output {
        fs::write(&path, &output_json).with_context(|| format!("failed to write {path:?}"))?;
        eprintln!("result written to {path:?}");
    } else {
        println!("{output_json}");
    }
    Ok(())
}

fn cmd_schema() -> Result<()> {
    let schema = nobet_contracts::schema_for::<RosterRequest>();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
