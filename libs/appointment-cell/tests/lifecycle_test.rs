use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentError, AppointmentStatus};
use appointment_cell::services::lifecycle::AppointmentLifecycleService;
use appointment_cell::services::notify::NotificationKind;
use appointment_cell::store::AppointmentStore;
use appointment_cell::test_support::{
    appointment_fixture, MemoryAppointmentStore, RecordingNotifier,
};
use scheduling_cell::models::Slot;
use scheduling_cell::store::SlotStore;
use scheduling_cell::test_support::{free_slot, MemorySlotStore};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

struct Harness {
    appointments: Arc<MemoryAppointmentStore>,
    slots: Arc<MemorySlotStore>,
    notifier: Arc<RecordingNotifier>,
    service: AppointmentLifecycleService,
    appointment: Appointment,
}

/// One appointment in the given status, with its slot bound to it.
fn harness(status: AppointmentStatus) -> Harness {
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    let mut slot = free_slot(doctor_id, date(), (9, 0));
    let appointment = appointment_fixture(patient_id, doctor_id, slot.id, date(), status);
    slot.available = false;
    slot.appointment_id = Some(appointment.id);

    let appointments = Arc::new(MemoryAppointmentStore::with_appointments(vec![
        appointment.clone(),
    ]));
    let slots = Arc::new(MemorySlotStore::with_slots(vec![slot]));
    let notifier = Arc::new(RecordingNotifier::new());

    let service =
        AppointmentLifecycleService::new(appointments.clone(), slots.clone(), notifier.clone());

    Harness {
        appointments,
        slots,
        notifier,
        service,
        appointment,
    }
}

async fn slot_of(h: &Harness) -> Slot {
    h.slots
        .find_by_id(h.appointment.slot_id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn approve_moves_pending_to_scheduled() {
    let h = harness(AppointmentStatus::PendingApproval);

    let updated = h
        .service
        .approve(h.appointment.id, h.appointment.doctor_id)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Scheduled);
    assert_eq!(h.notifier.kinds(), vec![NotificationKind::BookingConfirmed]);

    // Approval keeps the slot bound.
    let slot = slot_of(&h).await;
    assert!(!slot.available);
    assert_eq!(slot.appointment_id, Some(h.appointment.id));
}

#[tokio::test]
async fn approve_by_another_doctor_is_forbidden() {
    let h = harness(AppointmentStatus::PendingApproval);

    let result = h.service.approve(h.appointment.id, Uuid::new_v4()).await;

    assert_matches!(result, Err(AppointmentError::NotParticipant));
    let unchanged = h.appointments.fetch(h.appointment.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, AppointmentStatus::PendingApproval);
}

#[tokio::test]
async fn approve_outside_pending_is_invalid() {
    let h = harness(AppointmentStatus::Scheduled);

    let result = h
        .service
        .approve(h.appointment.id, h.appointment.doctor_id)
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidTransition { .. }));
}

#[tokio::test]
async fn reject_cancels_records_reason_and_frees_the_slot() {
    let h = harness(AppointmentStatus::PendingApproval);

    let updated = h
        .service
        .reject(
            h.appointment.id,
            h.appointment.doctor_id,
            "unavailable".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Cancelled);
    assert_eq!(updated.rejection_reason.as_deref(), Some("unavailable"));

    let slot = slot_of(&h).await;
    assert!(slot.available);
    assert_eq!(slot.appointment_id, None);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, NotificationKind::Rejected);
    assert_eq!(sent[0].2.as_deref(), Some("unavailable"));
}

#[tokio::test]
async fn cancel_by_patient_frees_the_slot() {
    let h = harness(AppointmentStatus::Scheduled);

    let updated = h
        .service
        .cancel(h.appointment.id, h.appointment.patient_id)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Cancelled);
    let slot = slot_of(&h).await;
    assert!(slot.available);
    assert_eq!(slot.appointment_id, None);
    assert_eq!(h.notifier.kinds(), vec![NotificationKind::Cancelled]);
}

#[tokio::test]
async fn cancel_by_outsider_is_forbidden_and_changes_nothing() {
    let h = harness(AppointmentStatus::Scheduled);

    let result = h.service.cancel(h.appointment.id, Uuid::new_v4()).await;

    assert_matches!(result, Err(AppointmentError::NotParticipant));
    let unchanged = h.appointments.fetch(h.appointment.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, AppointmentStatus::Scheduled);

    let slot = slot_of(&h).await;
    assert!(!slot.available);
    assert_eq!(slot.appointment_id, Some(h.appointment.id));
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn cancel_from_terminal_state_is_invalid() {
    let h = harness(AppointmentStatus::Completed);

    let result = h
        .service
        .cancel(h.appointment.id, h.appointment.patient_id)
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidTransition { .. }));
}

#[tokio::test]
async fn update_status_follows_the_transition_table() {
    let h = harness(AppointmentStatus::Scheduled);

    let updated = h
        .service
        .update_status(h.appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(updated.status, AppointmentStatus::Confirmed);

    // Non-cancelling transitions leave the binding alone.
    let slot = slot_of(&h).await;
    assert!(!slot.available);

    let result = h
        .service
        .update_status(h.appointment.id, AppointmentStatus::NoShow)
        .await
        .unwrap();
    assert_eq!(result.status, AppointmentStatus::NoShow);
}

#[tokio::test]
async fn update_status_rejects_illegal_jumps() {
    let h = harness(AppointmentStatus::PendingApproval);

    let result = h
        .service
        .update_status(h.appointment.id, AppointmentStatus::Completed)
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidTransition {
            from: AppointmentStatus::PendingApproval,
            to: AppointmentStatus::Completed,
        })
    );
}

#[tokio::test]
async fn update_status_to_cancelled_frees_the_slot() {
    let h = harness(AppointmentStatus::Confirmed);

    h.service
        .update_status(h.appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let slot = slot_of(&h).await;
    assert!(slot.available);
    assert_eq!(slot.appointment_id, None);
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_transition() {
    let h = harness(AppointmentStatus::PendingApproval);
    h.notifier.fail_all();

    let updated = h
        .service
        .approve(h.appointment.id, h.appointment.doctor_id)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn missing_appointment_reports_not_found() {
    let h = harness(AppointmentStatus::Scheduled);

    let result = h.service.cancel(Uuid::new_v4(), h.appointment.patient_id).await;

    assert_matches!(result, Err(AppointmentError::NotFound));
}
