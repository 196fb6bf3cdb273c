//! In-memory store doubles for tests. The slot store mirrors the
//! conditional-update semantics of the PostgREST store so concurrency
//! behaviour can be exercised without a live database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use doctor_cell::models::{DayRule, DoctorProfile, WeeklyTemplate};
use doctor_cell::services::profile::DoctorDirectory;

use crate::models::Slot;
use crate::store::SlotStore;

#[derive(Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<Uuid, Slot>>,
    fail_next_release: AtomicBool,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(slots: Vec<Slot>) -> Self {
        let store = Self::new();
        {
            let mut map = store.slots.lock().unwrap();
            for slot in slots {
                map.insert(slot.id, slot);
            }
        }
        store
    }

    pub fn all(&self) -> Vec<Slot> {
        self.slots.lock().unwrap().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    /// Make the next release fail, for exercising compensation failures.
    pub fn fail_next_release(&self) {
        self.fail_next_release.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn insert_batch(&self, slots: &[Slot]) -> Result<()> {
        let mut map = self.slots.lock().unwrap();
        for slot in slots {
            map.insert(slot.id, slot.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, slot_id: Uuid) -> Result<Option<Slot>> {
        Ok(self.slots.lock().unwrap().get(&slot_id).cloned())
    }

    async fn find_by_key(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<Slot>> {
        Ok(self
            .slots
            .lock()
            .unwrap()
            .values()
            .find(|s| s.doctor_id == doctor_id && s.date == date && s.start_time == start_time)
            .cloned())
    }

    async fn find_available(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Slot>> {
        let mut slots: Vec<Slot> = self
            .slots
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.doctor_id == doctor_id && s.date == date && s.available)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn claim(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        appointment_id: Uuid,
    ) -> Result<Option<Slot>> {
        // Single lock held across check and write, matching the atomicity
        // of the conditional PATCH.
        let mut map = self.slots.lock().unwrap();
        let slot = map.values_mut().find(|s| {
            s.doctor_id == doctor_id && s.date == date && s.start_time == start_time && s.available
        });

        match slot {
            Some(slot) => {
                slot.available = false;
                slot.appointment_id = Some(appointment_id);
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn release(&self, slot_id: Uuid, appointment_id: Uuid) -> Result<bool> {
        if self.fail_next_release.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("simulated release failure"));
        }
        let mut map = self.slots.lock().unwrap();
        match map.get_mut(&slot_id) {
            Some(slot) if slot.appointment_id == Some(appointment_id) => {
                slot.available = true;
                slot.appointment_id = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, slot_id: Uuid) -> Result<()> {
        self.slots.lock().unwrap().remove(&slot_id);
        Ok(())
    }

    async fn delete_unbooked_since(&self, doctor_id: Uuid, from_date: NaiveDate) -> Result<u64> {
        let mut map = self.slots.lock().unwrap();
        let before = map.len();
        map.retain(|_, s| {
            !(s.doctor_id == doctor_id && s.date >= from_date && s.appointment_id.is_none())
        });
        Ok((before - map.len()) as u64)
    }
}

#[derive(Default)]
pub struct StubDoctorDirectory {
    doctors: Mutex<HashMap<Uuid, DoctorProfile>>,
}

impl StubDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctor(doctor: DoctorProfile) -> Self {
        let directory = Self::new();
        directory.insert(doctor);
        directory
    }

    pub fn insert(&self, doctor: DoctorProfile) {
        self.doctors.lock().unwrap().insert(doctor.id, doctor);
    }
}

#[async_trait]
impl DoctorDirectory for StubDoctorDirectory {
    async fn fetch(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>> {
        Ok(self.doctors.lock().unwrap().get(&doctor_id).cloned())
    }
}

pub fn weekday_rule(day: &str, start: (u32, u32), end: (u32, u32)) -> DayRule {
    DayRule {
        day_of_week: day.to_string(),
        available: true,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        break_start_time: None,
        break_end_time: None,
    }
}

pub fn doctor_with_template(doctor_id: Uuid, rules: Vec<DayRule>) -> DoctorProfile {
    DoctorProfile {
        id: doctor_id,
        full_name: Some("Dr. Test".to_string()),
        accepting_patients: true,
        consultation_fee: Some(120.0),
        availability: Some(WeeklyTemplate {
            week_schedule: rules,
            slot_duration_minutes: None,
        }),
    }
}

pub fn free_slot(doctor_id: Uuid, date: NaiveDate, start: (u32, u32)) -> Slot {
    let start_time = NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap();
    Slot {
        id: Uuid::new_v4(),
        doctor_id,
        date,
        start_time,
        end_time: start_time
            .overflowing_add_signed(chrono::Duration::minutes(30))
            .0,
        available: true,
        appointment_id: None,
    }
}
