use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::DoctorProfile;

/// Read-only access to doctor profiles. The scheduling and appointment
/// cells only ever need the accepting flag, the fee and the weekly
/// availability template.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn fetch(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>>;
}

pub struct PostgrestDoctorDirectory {
    client: PostgrestClient,
}

impl PostgrestDoctorDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: PostgrestClient::new(config),
        }
    }
}

#[async_trait]
impl DoctorDirectory for PostgrestDoctorDirectory {
    async fn fetch(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>> {
        debug!("Fetching doctor profile: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }
}
