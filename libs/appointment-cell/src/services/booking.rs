use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use doctor_cell::services::profile::{DoctorDirectory, PostgrestDoctorDirectory};
use scheduling_cell::store::{PostgrestSlotStore, SlotStore};
use shared_config::{AppConfig, BookingMode};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentType, BookAppointmentRequest,
};
use crate::services::notify::{notify_best_effort, NotificationDispatcher, NotificationKind, TracingNotifier};
use crate::store::{AppointmentStore, PostgrestAppointmentStore};

/// Ties slot lookup, slot binding and appointment creation together.
///
/// The slot is claimed before the appointment row exists, with the
/// appointment id pre-generated so the claim can name its owner. A failed
/// appointment insert releases the claim again, so a slot is never left
/// bound to an appointment that was never persisted.
pub struct BookingService {
    appointments: Arc<dyn AppointmentStore>,
    slots: Arc<dyn SlotStore>,
    doctors: Arc<dyn DoctorDirectory>,
    notifier: Arc<dyn NotificationDispatcher>,
    booking_mode: BookingMode,
    consultation_minutes: u32,
    video_link_base: String,
}

impl BookingService {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        slots: Arc<dyn SlotStore>,
        doctors: Arc<dyn DoctorDirectory>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: &AppConfig,
    ) -> Self {
        Self {
            appointments,
            slots,
            doctors,
            notifier,
            booking_mode: config.booking_mode,
            consultation_minutes: config.consultation_minutes,
            video_link_base: config.video_link_base.clone(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PostgrestAppointmentStore::new(config)),
            Arc::new(PostgrestSlotStore::new(config)),
            Arc::new(PostgrestDoctorDirectory::new(config)),
            Arc::new(TracingNotifier),
            config,
        )
    }

    pub async fn book(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let doctor = self
            .doctors
            .fetch(request.doctor_id)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::DoctorNotFound)?;

        if !doctor.accepting_patients {
            return Err(AppointmentError::DoctorNotAccepting);
        }

        // Pre-checks for friendly errors; the claim below is what actually
        // decides a race.
        let slot = self
            .slots
            .find_by_key(request.doctor_id, request.date, request.start_time)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::SlotNotFound)?;

        if !slot.available {
            return Err(AppointmentError::SlotAlreadyBooked);
        }

        let appointment_id = Uuid::new_v4();

        let claimed = self
            .slots
            .claim(
                request.doctor_id,
                request.date,
                request.start_time,
                appointment_id,
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::SlotAlreadyBooked)?;

        let initial_status = match self.booking_mode {
            BookingMode::Direct => AppointmentStatus::Scheduled,
            BookingMode::ApprovalRequired => AppointmentStatus::PendingApproval,
        };

        // Fixed consultation length, independent of the slot's own duration.
        let (end_time, _) = request
            .start_time
            .overflowing_add_signed(Duration::minutes(self.consultation_minutes as i64));

        let video_call_link = match request.appointment_type {
            AppointmentType::Video => {
                Some(format!("{}/{}", self.video_link_base, Uuid::new_v4()))
            }
            _ => None,
        };

        let now = Utc::now();
        let appointment = Appointment {
            id: appointment_id,
            patient_id,
            doctor_id: request.doctor_id,
            slot_id: claimed.id,
            date: request.date,
            start_time: request.start_time,
            end_time,
            appointment_type: request.appointment_type,
            status: initial_status,
            reason_for_visit: request.reason_for_visit,
            symptoms: request.symptoms,
            notes: None,
            rejection_reason: None,
            consultation_fee: doctor.consultation_fee,
            video_call_link,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.appointments.insert(&appointment).await {
            // Compensate: give the slot back before surfacing the failure.
            error!(
                "Appointment insert failed, releasing slot {}: {}",
                claimed.id, err
            );
            match self.slots.release(claimed.id, appointment_id).await {
                Ok(true) => {}
                Ok(false) => warn!(
                    "Slot {} was no longer bound to appointment {} during release",
                    claimed.id, appointment_id
                ),
                Err(release_err) => warn!(
                    "Failed to release slot {} after insert failure, slot stays bound to {}: {}",
                    claimed.id, appointment_id, release_err
                ),
            }
            return Err(AppointmentError::Database(err.to_string()));
        }

        let kind = match initial_status {
            AppointmentStatus::PendingApproval => NotificationKind::BookingRequested,
            _ => NotificationKind::BookingConfirmed,
        };
        notify_best_effort(self.notifier.as_ref(), &appointment, kind, None).await;

        info!(
            "Booked appointment {} for patient {} with doctor {} ({} {})",
            appointment.id, patient_id, request.doctor_id, request.date, request.start_time
        );
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        self.appointments
            .fetch(appointment_id)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::NotFound)
    }
}
