use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, AppointmentType, BookAppointmentRequest,
};
use appointment_cell::services::booking::BookingService;
use appointment_cell::services::notify::NotificationKind;
use appointment_cell::test_support::{MemoryAppointmentStore, RecordingNotifier};
use scheduling_cell::store::SlotStore;
use scheduling_cell::test_support::{doctor_with_template, free_slot, StubDoctorDirectory};
use shared_config::BookingMode;
use shared_utils::test_utils::TestConfig;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

struct Harness {
    appointments: Arc<MemoryAppointmentStore>,
    slots: Arc<scheduling_cell::test_support::MemorySlotStore>,
    notifier: Arc<RecordingNotifier>,
    service: BookingService,
    doctor_id: Uuid,
}

fn harness(mode: BookingMode) -> Harness {
    let doctor_id = Uuid::new_v4();
    let slot = free_slot(doctor_id, date(), (9, 0));

    let appointments = Arc::new(MemoryAppointmentStore::new());
    let slots = Arc::new(scheduling_cell::test_support::MemorySlotStore::with_slots(
        vec![slot],
    ));
    let notifier = Arc::new(RecordingNotifier::new());

    let mut config = TestConfig::default();
    config.booking_mode = mode;

    let service = BookingService::new(
        appointments.clone(),
        slots.clone(),
        Arc::new(StubDoctorDirectory::with_doctor(doctor_with_template(
            doctor_id,
            vec![],
        ))),
        notifier.clone(),
        &config.to_app_config(),
    );

    Harness {
        appointments,
        slots,
        notifier,
        service,
        doctor_id,
    }
}

fn request(doctor_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        date: date(),
        start_time: time(9, 0),
        appointment_type: AppointmentType::InPerson,
        reason_for_visit: Some("checkup".to_string()),
        symptoms: None,
    }
}

#[tokio::test]
async fn direct_booking_is_scheduled_and_binds_the_slot() {
    let h = harness(BookingMode::Direct);
    let patient_id = Uuid::new_v4();

    let appointment = h.service.book(patient_id, request(h.doctor_id)).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.patient_id, patient_id);
    assert_eq!(appointment.consultation_fee, Some(120.0));
    assert_eq!(appointment.end_time, time(9, 30));

    let slot = h.slots.find_by_id(appointment.slot_id).await.unwrap().unwrap();
    assert!(!slot.available);
    assert_eq!(slot.appointment_id, Some(appointment.id));

    assert_eq!(h.notifier.kinds(), vec![NotificationKind::BookingConfirmed]);
}

#[tokio::test]
async fn approval_mode_starts_pending_and_notifies_the_doctor() {
    let h = harness(BookingMode::ApprovalRequired);

    let appointment = h
        .service
        .book(Uuid::new_v4(), request(h.doctor_id))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::PendingApproval);
    assert_eq!(h.notifier.kinds(), vec![NotificationKind::BookingRequested]);
}

#[tokio::test]
async fn video_booking_gets_a_call_link() {
    let h = harness(BookingMode::Direct);
    let mut req = request(h.doctor_id);
    req.appointment_type = AppointmentType::Video;

    let appointment = h.service.book(Uuid::new_v4(), req).await.unwrap();

    let link = appointment.video_call_link.unwrap();
    assert!(link.starts_with("https://meet.clinica.example/"));
}

#[tokio::test]
async fn unknown_doctor_is_rejected() {
    let h = harness(BookingMode::Direct);

    let result = h.service.book(Uuid::new_v4(), request(Uuid::new_v4())).await;

    assert_matches!(result, Err(AppointmentError::DoctorNotFound));
    assert_eq!(h.appointments.count(), 0);
}

#[tokio::test]
async fn doctor_not_accepting_patients_is_rejected() {
    let doctor_id = Uuid::new_v4();
    let mut doctor = doctor_with_template(doctor_id, vec![]);
    doctor.accepting_patients = false;

    let slots = Arc::new(scheduling_cell::test_support::MemorySlotStore::with_slots(
        vec![free_slot(doctor_id, date(), (9, 0))],
    ));
    let service = BookingService::new(
        Arc::new(MemoryAppointmentStore::new()),
        slots.clone(),
        Arc::new(StubDoctorDirectory::with_doctor(doctor)),
        Arc::new(RecordingNotifier::new()),
        &TestConfig::default().to_app_config(),
    );

    let result = service.book(Uuid::new_v4(), request(doctor_id)).await;

    assert_matches!(result, Err(AppointmentError::DoctorNotAccepting));
    let slot = slots.all().pop().unwrap();
    assert!(slot.available);
}

#[tokio::test]
async fn booking_a_missing_slot_reports_not_found() {
    let h = harness(BookingMode::Direct);
    let mut req = request(h.doctor_id);
    req.start_time = time(15, 0);

    let result = h.service.book(Uuid::new_v4(), req).await;

    assert_matches!(result, Err(AppointmentError::SlotNotFound));
}

#[tokio::test]
async fn booking_a_taken_slot_conflicts() {
    let h = harness(BookingMode::Direct);

    h.service
        .book(Uuid::new_v4(), request(h.doctor_id))
        .await
        .unwrap();
    let result = h.service.book(Uuid::new_v4(), request(h.doctor_id)).await;

    assert_matches!(result, Err(AppointmentError::SlotAlreadyBooked));
    assert_eq!(h.appointments.count(), 1);
}

#[tokio::test]
async fn concurrent_bookings_produce_exactly_one_appointment() {
    let h = Arc::new(harness(BookingMode::Direct));

    let first = {
        let h = h.clone();
        tokio::spawn(async move { h.service.book(Uuid::new_v4(), request(h.doctor_id)).await })
    };
    let second = {
        let h = h.clone();
        tokio::spawn(async move { h.service.book(Uuid::new_v4(), request(h.doctor_id)).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppointmentError::SlotAlreadyBooked))));

    assert_eq!(h.appointments.count(), 1);

    // The slot must be bound to the winner and only the winner.
    let winner = results.iter().find_map(|r| r.as_ref().ok()).unwrap();
    let slot = h.slots.find_by_id(winner.slot_id).await.unwrap().unwrap();
    assert!(!slot.available);
    assert_eq!(slot.appointment_id, Some(winner.id));
}

#[tokio::test]
async fn failed_insert_releases_the_claimed_slot() {
    let h = harness(BookingMode::Direct);
    h.appointments.fail_next_insert();

    let result = h.service.book(Uuid::new_v4(), request(h.doctor_id)).await;
    assert_matches!(result, Err(AppointmentError::Database(_)));

    // Compensation ran: the slot is free again and rebookable.
    let slot = h.slots.all().pop().unwrap();
    assert!(slot.available);
    assert_eq!(slot.appointment_id, None);

    h.service
        .book(Uuid::new_v4(), request(h.doctor_id))
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_release_after_failed_insert_still_surfaces_the_insert_error() {
    let h = harness(BookingMode::Direct);
    h.appointments.fail_next_insert();
    h.slots.fail_next_release();

    let result = h.service.book(Uuid::new_v4(), request(h.doctor_id)).await;
    assert_matches!(result, Err(AppointmentError::Database(_)));
    assert_eq!(h.appointments.count(), 0);

    // Compensation could not run; the slot stays bound to the phantom id
    // until released out of band.
    let slot = h.slots.all().pop().unwrap();
    assert!(!slot.available);
    assert!(slot.appointment_id.is_some());
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_booking() {
    let h = harness(BookingMode::Direct);
    h.notifier.fail_all();

    let appointment = h
        .service
        .book(Uuid::new_v4(), request(h.doctor_id))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(h.appointments.count(), 1);
}
