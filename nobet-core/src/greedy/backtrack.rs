//! Bounded neighbor backtracking for the greedy singles phase.
//!
//! Ports `greedy_solver.py`'s `_backtrack_komsular`: when a slot has no
//! admissible candidate, tentatively vacate a nearby day's assignment
//! (within the gap window, scanning slots in reverse) and see whether that
//! opens up a candidate; undo if it doesn't, up to 3 attempts.

use super::Ctx;

const MAX_BACKTRACK_DEPTH: usize = 3;

impl<'a> Ctx<'a> {
    pub(crate) fn backtrack_neighbors(
        &mut self,
        day: u32,
        slot: usize,
        duty: &crate::models::Duty,
        min_gap: u32,
    ) -> bool {
        let mut neighbor_days = Vec::new();
        let lo = day.saturating_sub(min_gap).max(1);
        for d in lo..day {
            neighbor_days.push(d);
        }
        let hi = (day + min_gap).min(self.input.day_count);
        for d in (day + 1)..=hi {
            neighbor_days.push(d);
        }

        let mut attempts = 0;
        for neighbor_day in neighbor_days {
            if attempts >= MAX_BACKTRACK_DEPTH {
                break;
            }
            for neighbor_slot in (0..self.input.duties.len()).rev() {
                if attempts >= MAX_BACKTRACK_DEPTH {
                    break;
                }
                if self.pinned.contains(&(neighbor_day, neighbor_slot)) {
                    continue;
                }
                let Some(person_id) = self.schedule.get(neighbor_day, neighbor_slot) else {
                    continue;
                };
                let Some(&person_idx) = self.index_of.get(&person_id) else {
                    continue;
                };
                attempts += 1;

                let neighbor_duty = self.input.duties[neighbor_slot].clone();
                self.undo(person_idx, neighbor_day, neighbor_slot, &neighbor_duty);

                let today_assigned = (0..self.input.duties.len())
                    .filter_map(|s| self.schedule.get(day, s))
                    .filter_map(|pid| self.index_of.get(&pid).copied())
                    .collect();
                if self.best_candidate(day, duty, min_gap, &today_assigned).is_some() {
                    return true;
                }

                self.commit(person_idx, neighbor_day, neighbor_slot, &neighbor_duty);
            }
        }
        false
    }
}
