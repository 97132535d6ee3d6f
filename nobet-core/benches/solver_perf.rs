//! Performance benchmarks for the adaptive orchestrator.
//!
//! Run with: cargo bench -p nobet-core --bench solver_perf
//!
//! Results are stored in target/criterion/ for historical comparison.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nobet_core::calendar::build_day_types;
use nobet_core::config::SolverConfig;
use nobet_core::models::{Duty, Person};
use nobet_core::orchestrator::{solve, SolveRequest};
use std::collections::{HashMap, HashSet};

fn make_request(num_people: u32, num_duties: usize, time_limit_seconds: u64) -> SolveRequest {
    let persons: Vec<Person> = (0..num_people)
        .map(|i| Person {
            id: i as i64,
            name: format!("p{i}"),
            excused_days: HashSet::new(),
            restricted_role: None,
            overflow_role: None,
            targets_per_type: HashMap::new(),
            targets_total: 0,
            targets_per_role: HashMap::new(),
            annual_realized: HashMap::new(),
            carry_in: HashMap::new(),
        })
        .collect();

    let duties: Vec<Duty> = (0..num_duties)
        .map(|i| Duty {
            id: i as i64,
            name: format!("gorev{i}"),
            slot_index: i,
            base_name: String::new(),
            exclusive: false,
            separate_building: false,
        })
        .collect();

    let day_types = build_day_types(2026, 7, &[]);
    let mut type_slots = HashMap::new();
    for t in day_types.values() {
        *type_slots.entry(*t).or_insert(0) += duties.len() as u32;
    }

    let mut config = SolverConfig::default();
    config.target_annealing.time_limit_seconds = time_limit_seconds;
    config.assign_annealing.time_limit_seconds = time_limit_seconds;

    SolveRequest {
        persons,
        duties,
        rules: vec![],
        role_restrictions: vec![],
        manual_assignments: vec![],
        day_count: day_types.len() as u32,
        day_types,
        type_slots,
        locked_targets: HashMap::new(),
        config,
    }
}

fn bench_problem_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("problem_sizes");

    let small = make_request(8, 1, 1);
    let medium = make_request(20, 2, 2);
    let large = make_request(40, 3, 3);

    group.throughput(Throughput::Elements(1));
    group.bench_with_input(BenchmarkId::new("small", "8p/1duty"), &small, |b, req| {
        b.iter(|| solve(black_box(req)))
    });
    group.bench_with_input(
        BenchmarkId::new("medium", "20p/2duty"),
        &medium,
        |b, req| b.iter(|| solve(black_box(req))),
    );
    group.bench_with_input(BenchmarkId::new("large", "40p/3duty"), &large, |b, req| {
        b.iter(|| solve(black_box(req)))
    });

    group.finish();
}

criterion_group!(benches, bench_problem_sizes);
criterion_main!(benches);
