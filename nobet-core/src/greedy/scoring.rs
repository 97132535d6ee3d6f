//! Candidate scoring for the greedy solver's singles phase.
//!
//! A direct translation of `greedy_solver.py`'s `kisi_puanla`: role-scarcity
//! bonuses, a "panic" term proportional to remaining target over remaining
//! free days, carry-in deficit bonus, and a days-since-last-duty term.

use super::Ctx;
use crate::calendar::DayType;

pub(crate) fn candidate_score(
    ctx: &Ctx,
    person_idx: usize,
    day: u32,
    day_type: DayType,
    duty: &crate::models::Duty,
) -> f64 {
    let person = &ctx.input.persons[person_idx];
    let ps = &ctx.persons[person_idx];
    let role = duty.role_key();
    let mut score = 0.0;

    if *ps.remaining_per_role.get(role).unwrap_or(&0) > 0 {
        score += 5000.0;
    }

    let other_role_available = ctx
        .input
        .duties
        .iter()
        .map(|d| d.role_key())
        .any(|r| r != role && *ps.remaining_per_role.get(r).unwrap_or(&0) > 0);
    if !other_role_available && *ps.remaining_per_role.get(role).unwrap_or(&0) > 0 {
        score += 20000.0;
    }

    score += person.excused_days.len() as f64 * 100.0;

    let remaining_target = ps.remaining_total.max(0) as f64;
    let assigned_count = ps.assigned_days.len();
    let free_days_left = ((ctx.input.day_count as i64)
        - person.excused_days.len() as i64
        - assigned_count as i64)
        .max(1) as f64;
    score += (remaining_target * 1000.0) / free_days_left;

    if *person.carry_in.get(&day_type).unwrap_or(&0) > 0 {
        score += 3000.0;
    }

    let annual_total: u32 = person.annual_realized.values().sum();
    score -= annual_total as f64 * 10.0;
    score -= assigned_count as f64 * 200.0;

    if ps.last_duty_day > 0 {
        score += (day as i64 - ps.last_duty_day) as f64 * 10.0;
    } else {
        score += 500.0;
    }

    score
}
