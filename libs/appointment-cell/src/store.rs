use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{Appointment, AppointmentStatus};

/// Persistence seam for appointments.
///
/// `transition_if` and `mark_reminder_sent` are conditional updates keyed on
/// the current row state; the boolean result tells the caller whether the
/// update actually landed or the row had already moved on.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: &Appointment) -> Result<()>;

    async fn fetch(&self, appointment_id: Uuid) -> Result<Option<Appointment>>;

    async fn update(&self, appointment: &Appointment) -> Result<()>;

    async fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>>;

    /// Move the appointment from `from` to `to` only if it is still in
    /// `from`. Returns false when the row was in a different status.
    async fn transition_if(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool>;

    /// Stamp `reminder_sent_at` only while it is still null. Returns false
    /// when a reminder was already recorded.
    async fn mark_reminder_sent(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<bool>;
}

pub struct PostgrestAppointmentStore {
    client: PostgrestClient,
}

impl PostgrestAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: PostgrestClient::new(config),
        }
    }
}

#[async_trait]
impl AppointmentStore for PostgrestAppointmentStore {
    async fn insert(&self, appointment: &Appointment) -> Result<()> {
        let _: Vec<Value> = self
            .client
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(serde_json::to_value(appointment)?),
                Some(PostgrestClient::representation_headers()),
            )
            .await?;
        Ok(())
    }

    async fn fetch(&self, appointment_id: Uuid) -> Result<Option<Appointment>> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self.client.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    async fn update(&self, appointment: &Appointment) -> Result<()> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let _: Vec<Value> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(serde_json::to_value(appointment)?),
                Some(PostgrestClient::representation_headers()),
            )
            .await?;
        Ok(())
    }

    async fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?date=eq.{}&status=eq.{}",
            date,
            status.as_str()
        );
        self.client.request(Method::GET, &path, None).await
    }

    async fn transition_if(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id,
            from.as_str()
        );
        let updated: Vec<Appointment> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({
                    "status": to.as_str(),
                    "updated_at": Utc::now(),
                })),
                Some(PostgrestClient::representation_headers()),
            )
            .await?;
        Ok(!updated.is_empty())
    }

    async fn mark_reminder_sent(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&reminder_sent_at=is.null",
            appointment_id
        );
        let updated: Vec<Appointment> = self
            .client
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "reminder_sent_at": at })),
                Some(PostgrestClient::representation_headers()),
            )
            .await?;
        Ok(!updated.is_empty())
    }
}
