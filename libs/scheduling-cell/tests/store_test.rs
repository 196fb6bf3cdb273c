use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::store::{PostgrestSlotStore, SlotStore};
use scheduling_cell::test_support::free_slot;
use shared_utils::test_utils::TestConfig;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn claim_returns_the_bound_slot_when_the_patch_matches() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    let mut bound = free_slot(doctor_id, date(), (9, 0));
    bound.available = false;
    bound.appointment_id = Some(appointment_id);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "eq.2026-01-05"))
        .and(query_param("start_time", "eq.09:00:00"))
        .and(query_param("available", "is.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bound])))
        .mount(&server)
        .await;

    let store = PostgrestSlotStore::new(&TestConfig::with_store_url(&server.uri()).to_app_config());

    let claimed = store
        .claim(doctor_id, date(), time(9, 0), appointment_id)
        .await
        .unwrap()
        .unwrap();

    assert!(!claimed.available);
    assert_eq!(claimed.appointment_id, Some(appointment_id));
}

#[tokio::test]
async fn claim_losing_the_race_yields_none() {
    let server = MockServer::start().await;

    // The conditional PATCH matched no row: someone else got there first.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/time_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = PostgrestSlotStore::new(&TestConfig::with_store_url(&server.uri()).to_app_config());

    let claimed = store
        .claim(Uuid::new_v4(), date(), time(9, 0), Uuid::new_v4())
        .await
        .unwrap();

    assert!(claimed.is_none());
}

#[tokio::test]
async fn find_available_filters_on_the_free_flag() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let slot = free_slot(doctor_id, date(), (9, 0));

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("available", "is.true"))
        .and(query_param("order", "start_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([slot])))
        .mount(&server)
        .await;

    let store = PostgrestSlotStore::new(&TestConfig::with_store_url(&server.uri()).to_app_config());

    let slots = store.find_available(doctor_id, date()).await.unwrap();
    assert_eq!(slots.len(), 1);
    assert!(slots[0].available);
}

#[tokio::test]
async fn delete_unbooked_since_excludes_booked_rows_in_the_query() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "gte.2026-01-04"))
        .and(query_param("appointment_id", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            free_slot(doctor_id, date(), (9, 0)),
            free_slot(doctor_id, date(), (9, 30)),
        ])))
        .mount(&server)
        .await;

    let store = PostgrestSlotStore::new(&TestConfig::with_store_url(&server.uri()).to_app_config());

    let deleted = store
        .delete_unbooked_since(doctor_id, NaiveDate::from_ymd_opt(2026, 1, 4).unwrap())
        .await
        .unwrap();

    assert_eq!(deleted, 2);
}

#[tokio::test]
async fn store_errors_are_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = PostgrestSlotStore::new(&TestConfig::with_store_url(&server.uri()).to_app_config());

    let result = store.find_available(Uuid::new_v4(), date()).await;
    assert!(result.is_err());
}
