use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::WeeklyTemplate;
use doctor_cell::services::profile::{DoctorDirectory, PostgrestDoctorDirectory};
use shared_config::AppConfig;

use crate::models::{GenerationReport, SchedulingError, Slot};
use crate::services::generator::expand_day;
use crate::store::{PostgrestSlotStore, SlotStore};

/// Owns the slot inventory for all doctors: generation from the weekly
/// template, lookup of free slots, and deletion with ownership and
/// booked-state checks.
pub struct SlotInventoryService {
    slots: Arc<dyn SlotStore>,
    doctors: Arc<dyn DoctorDirectory>,
}

impl SlotInventoryService {
    pub fn new(slots: Arc<dyn SlotStore>, doctors: Arc<dyn DoctorDirectory>) -> Self {
        Self { slots, doctors }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PostgrestSlotStore::new(config)),
            Arc::new(PostgrestDoctorDirectory::new(config)),
        )
    }

    /// Generate slots for `days` consecutive dates starting at `start_date`.
    ///
    /// Days whose weekday has no rule, or whose rule is marked unavailable,
    /// are skipped and logged rather than failing the run. With `regenerate`
    /// set, unbooked slots from the day before `start_date` onward are
    /// deleted first; booked slots always survive regeneration.
    pub async fn generate_for_range(
        &self,
        doctor_id: Uuid,
        start_date: NaiveDate,
        days: u32,
        regenerate: bool,
    ) -> Result<GenerationReport, SchedulingError> {
        let doctor = self
            .doctors
            .fetch(doctor_id)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?
            .ok_or(SchedulingError::DoctorNotFound)?;

        // No template is a skip, not an error: the doctor simply has no
        // bookable hours yet.
        let template = match doctor.availability {
            Some(template) => template,
            None => {
                warn!(
                    "Doctor {} has no availability template, skipping slot generation",
                    doctor_id
                );
                return Ok(GenerationReport {
                    days_skipped: days,
                    ..GenerationReport::default()
                });
            }
        };

        for rule in &template.week_schedule {
            rule.validate().map_err(SchedulingError::InvalidTemplate)?;
        }

        let mut report = GenerationReport::default();

        if regenerate {
            let from = start_date - Duration::days(1);
            report.slots_deleted = self
                .slots
                .delete_unbooked_since(doctor_id, from)
                .await
                .map_err(|e| SchedulingError::Database(e.to_string()))?;
            info!(
                "Regeneration for doctor {} cleared {} unbooked slots from {}",
                doctor_id, report.slots_deleted, from
            );
        }

        for offset in 0..days {
            let date = start_date + Duration::days(offset as i64);
            match self.generate_for_day(doctor_id, &template, date).await? {
                Some(created) => {
                    report.days_processed += 1;
                    report.slots_created += created;
                }
                None => report.days_skipped += 1,
            }
        }

        info!(
            "Generated {} slots over {} days for doctor {} ({} days skipped)",
            report.slots_created, report.days_processed, doctor_id, report.days_skipped
        );
        Ok(report)
    }

    /// Generate one day's slots. Returns `None` when the day is skipped.
    async fn generate_for_day(
        &self,
        doctor_id: Uuid,
        template: &WeeklyTemplate,
        date: NaiveDate,
    ) -> Result<Option<u32>, SchedulingError> {
        let day_name = date.format("%A").to_string();

        let rule = match template.rule_for_day(&day_name) {
            Some(rule) if rule.available => rule,
            Some(_) => {
                debug!("Skipping {} ({}): marked unavailable", date, day_name);
                return Ok(None);
            }
            None => {
                debug!("Skipping {} ({}): no rule in template", date, day_name);
                return Ok(None);
            }
        };

        let windows = expand_day(rule, template.slot_duration());
        if windows.is_empty() {
            debug!("Skipping {} ({}): no window fits", date, day_name);
            return Ok(None);
        }

        let slots: Vec<Slot> = windows
            .iter()
            .map(|window| Slot {
                id: Uuid::new_v4(),
                doctor_id,
                date,
                start_time: window.start,
                end_time: window.end,
                available: true,
                appointment_id: None,
            })
            .collect();

        self.slots
            .insert_batch(&slots)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        Ok(Some(slots.len() as u32))
    }

    pub async fn find_available(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, SchedulingError> {
        self.slots
            .find_available(doctor_id, date)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))
    }

    /// Delete one slot. Only the owning doctor may delete it, and a slot
    /// bound to an appointment cannot be removed.
    pub async fn delete_slot(
        &self,
        slot_id: Uuid,
        requesting_doctor: Uuid,
    ) -> Result<(), SchedulingError> {
        let slot = self
            .slots
            .find_by_id(slot_id)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?
            .ok_or(SchedulingError::SlotNotFound)?;

        if slot.doctor_id != requesting_doctor {
            warn!(
                "Doctor {} attempted to delete slot {} owned by {}",
                requesting_doctor, slot_id, slot.doctor_id
            );
            return Err(SchedulingError::NotSlotOwner);
        }

        if slot.appointment_id.is_some() || !slot.available {
            return Err(SchedulingError::SlotBooked);
        }

        self.slots
            .delete(slot_id)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        debug!("Deleted slot {} for doctor {}", slot_id, requesting_doctor);
        Ok(())
    }

    /// Delete several slots with the same checks as `delete_slot`. Fails on
    /// the first slot that cannot be removed; earlier deletions stand.
    pub async fn bulk_delete(
        &self,
        slot_ids: &[Uuid],
        requesting_doctor: Uuid,
    ) -> Result<u32, SchedulingError> {
        let mut deleted = 0;
        for slot_id in slot_ids {
            self.delete_slot(*slot_id, requesting_doctor).await?;
            deleted += 1;
        }
        Ok(deleted)
    }
}
