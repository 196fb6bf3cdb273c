use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use scheduling_cell::store::{PostgrestSlotStore, SlotStore};
use shared_config::AppConfig;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::notify::{
    notify_best_effort, NotificationDispatcher, NotificationKind, TracingNotifier,
};
use crate::store::{AppointmentStore, PostgrestAppointmentStore};

/// Legal successors for each status. Everything else is rejected with an
/// invalid-transition error.
pub fn valid_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;
    match from {
        PendingApproval => &[Scheduled, Cancelled],
        Scheduled => &[Confirmed, InProgress, Completed, Cancelled, NoShow],
        Confirmed => &[InProgress, Completed, Cancelled, NoShow],
        InProgress => &[Completed, Cancelled],
        Completed | Cancelled | NoShow => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Drives appointment status transitions and keeps the slot inventory in
/// sync: a transition into Cancelled frees the bound slot, every other
/// transition leaves the binding untouched.
pub struct AppointmentLifecycleService {
    appointments: Arc<dyn AppointmentStore>,
    slots: Arc<dyn SlotStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl AppointmentLifecycleService {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        slots: Arc<dyn SlotStore>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            appointments,
            slots,
            notifier,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PostgrestAppointmentStore::new(config)),
            Arc::new(PostgrestSlotStore::new(config)),
            Arc::new(TracingNotifier),
        )
    }

    /// Doctor accepts a pending booking.
    pub async fn approve(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.fetch(appointment_id).await?;

        if appointment.doctor_id != doctor_id {
            return Err(AppointmentError::NotParticipant);
        }
        if appointment.status != AppointmentStatus::PendingApproval {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Scheduled,
            });
        }

        appointment.status = AppointmentStatus::Scheduled;
        appointment.updated_at = Utc::now();
        self.persist(&appointment).await?;

        notify_best_effort(
            self.notifier.as_ref(),
            &appointment,
            NotificationKind::BookingConfirmed,
            None,
        )
        .await;

        info!("Appointment {} approved by doctor {}", appointment_id, doctor_id);
        Ok(appointment)
    }

    /// Doctor declines a pending booking; the slot goes back on the market.
    pub async fn reject(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
        reason: String,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.fetch(appointment_id).await?;

        if appointment.doctor_id != doctor_id {
            return Err(AppointmentError::NotParticipant);
        }
        if appointment.status != AppointmentStatus::PendingApproval {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Cancelled,
            });
        }

        appointment.status = AppointmentStatus::Cancelled;
        appointment.rejection_reason = Some(reason.clone());
        appointment.updated_at = Utc::now();
        self.persist(&appointment).await?;
        self.free_slot(&appointment).await;

        notify_best_effort(
            self.notifier.as_ref(),
            &appointment,
            NotificationKind::Rejected,
            Some(&reason),
        )
        .await;

        info!("Appointment {} rejected by doctor {}", appointment_id, doctor_id);
        Ok(appointment)
    }

    /// Either participant cancels; valid from any non-terminal state.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.fetch(appointment_id).await?;

        if appointment.patient_id != acting_user_id && appointment.doctor_id != acting_user_id {
            return Err(AppointmentError::NotParticipant);
        }
        if appointment.status.is_terminal() {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Cancelled,
            });
        }

        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = Utc::now();
        self.persist(&appointment).await?;
        self.free_slot(&appointment).await;

        notify_best_effort(
            self.notifier.as_ref(),
            &appointment,
            NotificationKind::Cancelled,
            None,
        )
        .await;

        info!(
            "Appointment {} cancelled by user {}",
            appointment_id, acting_user_id
        );
        Ok(appointment)
    }

    /// Generic transition used for Confirmed/InProgress/Completed/NoShow,
    /// checked against the transition table.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.fetch(appointment_id).await?;

        if !can_transition(appointment.status, new_status) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: new_status,
            });
        }

        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        self.persist(&appointment).await?;

        if new_status == AppointmentStatus::Cancelled {
            self.free_slot(&appointment).await;
        }

        debug!(
            "Appointment {} moved to {}",
            appointment_id, new_status
        );
        Ok(appointment)
    }

    async fn fetch(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .fetch(appointment_id)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::NotFound)
    }

    async fn persist(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        self.appointments
            .update(appointment)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))
    }

    /// Conditional release keyed on the stored slot id and this appointment
    /// id, so a concurrent rebinding is never undone.
    async fn free_slot(&self, appointment: &Appointment) {
        match self
            .slots
            .release(appointment.slot_id, appointment.id)
            .await
        {
            Ok(true) => {}
            Ok(false) => debug!(
                "Slot {} no longer bound to appointment {}, nothing to free",
                appointment.slot_id, appointment.id
            ),
            Err(err) => warn!(
                "Failed to free slot {} for appointment {}: {}",
                appointment.slot_id, appointment.id, err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn pending_approval_successors() {
        assert!(can_transition(PendingApproval, Scheduled));
        assert!(can_transition(PendingApproval, Cancelled));
        assert!(!can_transition(PendingApproval, Completed));
        assert!(!can_transition(PendingApproval, Confirmed));
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for terminal in [Completed, Cancelled, NoShow] {
            assert!(valid_transitions(terminal).is_empty());
        }
    }

    #[test]
    fn scheduled_can_no_show_but_in_progress_cannot() {
        assert!(can_transition(Scheduled, NoShow));
        assert!(can_transition(Confirmed, NoShow));
        assert!(!can_transition(InProgress, NoShow));
    }
}
