//! In-memory doubles for booking, lifecycle and sweep tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, AppointmentType};
use crate::services::notify::{NotificationDispatcher, NotificationKind};
use crate::store::AppointmentStore;

#[derive(Default)]
pub struct MemoryAppointmentStore {
    appointments: Mutex<HashMap<Uuid, Appointment>>,
    fail_next_insert: AtomicBool,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        let store = Self::new();
        {
            let mut map = store.appointments.lock().unwrap();
            for appointment in appointments {
                map.insert(appointment.id, appointment);
            }
        }
        store
    }

    /// Make the next insert fail, for exercising booking compensation.
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.appointments.lock().unwrap().len()
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn insert(&self, appointment: &Appointment) -> Result<()> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("simulated insert failure"));
        }
        self.appointments
            .lock()
            .unwrap()
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn fetch(&self, appointment_id: Uuid) -> Result<Option<Appointment>> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .get(&appointment_id)
            .cloned())
    }

    async fn update(&self, appointment: &Appointment) -> Result<()> {
        self.appointments
            .lock()
            .unwrap()
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.date == date && a.status == status)
            .cloned()
            .collect())
    }

    async fn transition_if(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool> {
        let mut map = self.appointments.lock().unwrap();
        match map.get_mut(&appointment_id) {
            Some(appointment) if appointment.status == from => {
                appointment.status = to;
                appointment.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_reminder_sent(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut map = self.appointments.lock().unwrap();
        match map.get_mut(&appointment_id) {
            Some(appointment) if appointment.reminder_sent_at.is_none() => {
                appointment.reminder_sent_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Records every dispatched notification; can be told to fail so tests can
/// check that delivery failures never break the triggering operation.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Uuid, NotificationKind, Option<String>)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(Uuid, NotificationKind, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, kind, _)| *kind)
            .collect()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn send(
        &self,
        appointment: &Appointment,
        kind: NotificationKind,
        detail: Option<&str>,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated notification failure"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((appointment.id, kind, detail.map(str::to_string)));
        Ok(())
    }
}

pub fn appointment_fixture(
    patient_id: Uuid,
    doctor_id: Uuid,
    slot_id: Uuid,
    date: NaiveDate,
    status: AppointmentStatus,
) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4(),
        patient_id,
        doctor_id,
        slot_id,
        date,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        appointment_type: AppointmentType::InPerson,
        status,
        reason_for_visit: Some("checkup".to_string()),
        symptoms: None,
        notes: None,
        rejection_reason: None,
        consultation_fee: Some(120.0),
        video_call_link: None,
        reminder_sent_at: None,
        created_at: now,
        updated_at: now,
    }
}
