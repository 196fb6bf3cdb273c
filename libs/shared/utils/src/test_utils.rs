use std::sync::Arc;
use uuid::Uuid;

use shared_config::{AppConfig, BookingMode};
use shared_models::auth::User;

pub struct TestConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub booking_mode: BookingMode,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:54321".to_string(),
            store_api_key: "test-api-key".to_string(),
            booking_mode: BookingMode::ApprovalRequired,
        }
    }
}

impl TestConfig {
    pub fn with_store_url(url: &str) -> Self {
        Self {
            store_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_url: self.store_url.clone(),
            store_api_key: self.store_api_key.clone(),
            booking_mode: self.booking_mode,
            consultation_minutes: 30,
            video_link_base: "https://meet.clinica.example".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
        }
    }

    /// Identity headers as the gateway would forward them.
    pub fn identity_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x-user-id", self.id.to_string()),
            ("x-user-role", self.role.clone()),
            ("x-user-email", self.email.clone()),
        ]
    }
}
