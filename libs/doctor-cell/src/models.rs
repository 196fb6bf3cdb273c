use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Doctor profile as read by the scheduling core. Writes happen through
/// profile management, which is a separate surface; this cell only reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub accepting_patients: bool,
    pub consultation_fee: Option<f64>,
    pub availability: Option<WeeklyTemplate>,
}

/// A doctor's recurring weekly schedule plus the slot-duration setting
/// shared across all days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTemplate {
    pub week_schedule: Vec<DayRule>,
    /// Minutes per generated slot; defaults to 30 when unset.
    pub slot_duration_minutes: Option<u32>,
}

pub const DEFAULT_SLOT_DURATION_MINUTES: u32 = 30;

impl WeeklyTemplate {
    pub fn slot_duration(&self) -> u32 {
        self.slot_duration_minutes
            .unwrap_or(DEFAULT_SLOT_DURATION_MINUTES)
    }

    /// Resolve the rule for a weekday by name, case-insensitively.
    pub fn rule_for_day(&self, day_name: &str) -> Option<&DayRule> {
        self.week_schedule
            .iter()
            .find(|rule| rule.day_of_week.eq_ignore_ascii_case(day_name))
    }
}

/// Open hours for one weekday, with an optional break window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRule {
    pub day_of_week: String,
    pub available: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start_time: Option<NaiveTime>,
    pub break_end_time: Option<NaiveTime>,
}

impl DayRule {
    /// Template invariant: when both break bounds are present they must
    /// satisfy start <= breakStart < breakEnd <= end.
    pub fn validate(&self) -> Result<(), String> {
        if self.start_time >= self.end_time {
            return Err(format!(
                "{}: start time must be before end time",
                self.day_of_week
            ));
        }

        match (self.break_start_time, self.break_end_time) {
            (Some(break_start), Some(break_end)) => {
                if break_start < self.start_time
                    || break_start >= break_end
                    || break_end > self.end_time
                {
                    return Err(format!(
                        "{}: break window must lie within open hours",
                        self.day_of_week
                    ));
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err(format!(
                "{}: break start and end must be set together",
                self.day_of_week
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(start: (u32, u32), end: (u32, u32)) -> DayRule {
        DayRule {
            day_of_week: "monday".to_string(),
            available: true,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            break_start_time: None,
            break_end_time: None,
        }
    }

    #[test]
    fn valid_break_window_passes() {
        let mut r = rule((9, 0), (17, 0));
        r.break_start_time = NaiveTime::from_hms_opt(12, 0, 0);
        r.break_end_time = NaiveTime::from_hms_opt(13, 0, 0);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn break_outside_open_hours_fails() {
        let mut r = rule((9, 0), (17, 0));
        r.break_start_time = NaiveTime::from_hms_opt(8, 0, 0);
        r.break_end_time = NaiveTime::from_hms_opt(10, 0, 0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn half_open_break_fails() {
        let mut r = rule((9, 0), (17, 0));
        r.break_start_time = NaiveTime::from_hms_opt(12, 0, 0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn inverted_hours_fail() {
        let r = rule((17, 0), (9, 0));
        assert!(r.validate().is_err());
    }

    #[test]
    fn rule_lookup_is_case_insensitive() {
        let template = WeeklyTemplate {
            week_schedule: vec![rule((9, 0), (17, 0))],
            slot_duration_minutes: None,
        };
        assert!(template.rule_for_day("MONDAY").is_some());
        assert!(template.rule_for_day("tuesday").is_none());
        assert_eq!(template.slot_duration(), DEFAULT_SLOT_DURATION_MINUTES);
    }
}
