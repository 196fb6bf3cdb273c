use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::Slot;

/// Persistence seam for the slot inventory.
///
/// `claim` and `release` are conditional updates: they only take effect when
/// the stored row still matches the expected state, which is what keeps
/// concurrent bookings and cancellations from double-binding a slot.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn insert_batch(&self, slots: &[Slot]) -> Result<()>;

    async fn find_by_id(&self, slot_id: Uuid) -> Result<Option<Slot>>;

    async fn find_by_key(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<Slot>>;

    /// Free slots for a doctor on a date, ordered by start time.
    async fn find_available(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Slot>>;

    /// Atomically flip the keyed slot from free to bound. Returns the bound
    /// slot, or `None` when another caller won the race (or the slot is
    /// already booked).
    async fn claim(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        appointment_id: Uuid,
    ) -> Result<Option<Slot>>;

    /// Atomically free a slot, but only while it is still bound to the given
    /// appointment. Returns false when the binding had already changed.
    async fn release(&self, slot_id: Uuid, appointment_id: Uuid) -> Result<bool>;

    async fn delete(&self, slot_id: Uuid) -> Result<()>;

    /// Delete all *unbooked* slots for a doctor dated `from_date` or later.
    /// The booked-slot exclusion is part of the deletion condition itself,
    /// never left to the caller. Returns the number of rows removed.
    async fn delete_unbooked_since(&self, doctor_id: Uuid, from_date: NaiveDate) -> Result<u64>;
}

pub struct PostgrestSlotStore {
    client: PostgrestClient,
}

impl PostgrestSlotStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: PostgrestClient::new(config),
        }
    }

    fn key_filter(doctor_id: Uuid, date: NaiveDate, start_time: NaiveTime) -> String {
        format!(
            "doctor_id=eq.{}&date=eq.{}&start_time=eq.{}",
            doctor_id,
            date,
            start_time.format("%H:%M:%S")
        )
    }
}

#[async_trait]
impl SlotStore for PostgrestSlotStore {
    async fn insert_batch(&self, slots: &[Slot]) -> Result<()> {
        if slots.is_empty() {
            return Ok(());
        }

        let _: Vec<Value> = self
            .client
            .request_with_headers(
                Method::POST,
                "/rest/v1/time_slots",
                Some(serde_json::to_value(slots)?),
                Some(PostgrestClient::representation_headers()),
            )
            .await?;

        debug!("Inserted {} slots", slots.len());
        Ok(())
    }

    async fn find_by_id(&self, slot_id: Uuid) -> Result<Option<Slot>> {
        let path = format!("/rest/v1/time_slots?id=eq.{}", slot_id);
        let result: Vec<Slot> = self.client.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    async fn find_by_key(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<Option<Slot>> {
        let path = format!(
            "/rest/v1/time_slots?{}",
            Self::key_filter(doctor_id, date, start_time)
        );
        let result: Vec<Slot> = self.client.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    async fn find_available(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Slot>> {
        let path = format!(
            "/rest/v1/time_slots?doctor_id=eq.{}&date=eq.{}&available=is.true&order=start_time.asc",
            doctor_id, date
        );
        self.client.request(Method::GET, &path, None).await
    }

    async fn claim(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        appointment_id: Uuid,
    ) -> Result<Option<Slot>> {
        // The `available=is.true` filter makes this a compare-and-swap: of
        // two concurrent bookings only one PATCH matches the row.
        let path = format!(
            "/rest/v1/time_slots?{}&available=is.true",
            Self::key_filter(doctor_id, date, start_time)
        );
        let updated: Vec<Slot> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({
                    "available": false,
                    "appointment_id": appointment_id,
                })),
                Some(PostgrestClient::representation_headers()),
            )
            .await?;

        Ok(updated.into_iter().next())
    }

    async fn release(&self, slot_id: Uuid, appointment_id: Uuid) -> Result<bool> {
        let path = format!(
            "/rest/v1/time_slots?id=eq.{}&appointment_id=eq.{}",
            slot_id, appointment_id
        );
        let updated: Vec<Slot> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({
                    "available": true,
                    "appointment_id": Value::Null,
                })),
                Some(PostgrestClient::representation_headers()),
            )
            .await?;

        Ok(!updated.is_empty())
    }

    async fn delete(&self, slot_id: Uuid) -> Result<()> {
        let path = format!("/rest/v1/time_slots?id=eq.{}", slot_id);
        let _: Vec<Value> = self
            .client
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(PostgrestClient::representation_headers()),
            )
            .await?;
        Ok(())
    }

    async fn delete_unbooked_since(&self, doctor_id: Uuid, from_date: NaiveDate) -> Result<u64> {
        let path = format!(
            "/rest/v1/time_slots?doctor_id=eq.{}&date=gte.{}&appointment_id=is.null",
            doctor_id, from_date
        );
        let deleted: Vec<Value> = self
            .client
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(PostgrestClient::representation_headers()),
            )
            .await?;

        Ok(deleted.len() as u64)
    }
}
