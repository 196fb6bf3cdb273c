use chrono::{Duration, NaiveTime};

use doctor_cell::models::DayRule;

/// One generated interval, not yet attached to a doctor or date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Expand one day's rule into discrete slot windows.
///
/// Walks from `start_time` in `duration_minutes` steps, emitting every
/// window that fully fits before `end_time`. A candidate overlapping the
/// break window `[break_start, break_end)` is not emitted; instead the
/// cursor jumps to `break_end` and the position is retried. A trailing
/// partial window is dropped. Pure and deterministic: regenerating from the
/// same rule yields the same windows.
pub fn expand_day(rule: &DayRule, duration_minutes: u32) -> Vec<SlotWindow> {
    if !rule.available || duration_minutes == 0 {
        return Vec::new();
    }

    let step = Duration::minutes(duration_minutes as i64);
    let mut windows = Vec::new();
    let mut current = rule.start_time;

    loop {
        let (candidate_end, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 || candidate_end > rule.end_time {
            break;
        }

        if let (Some(break_start), Some(break_end)) = (rule.break_start_time, rule.break_end_time) {
            if current < break_end && candidate_end > break_start {
                current = break_end;
                continue;
            }
        }

        windows.push(SlotWindow {
            start: current,
            end: candidate_end,
        });
        current = candidate_end;
    }

    windows
}
