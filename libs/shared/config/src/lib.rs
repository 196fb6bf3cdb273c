use std::env;
use tracing::warn;

/// How a freshly booked appointment enters the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingMode {
    /// Bookings are immediately Scheduled, no doctor action required.
    Direct,
    /// Bookings start as PendingApproval and wait for the doctor.
    ApprovalRequired,
}

impl BookingMode {
    pub fn from_env_value(value: &str) -> Option<Self> {
        match value {
            "direct" => Some(BookingMode::Direct),
            "approval_required" => Some(BookingMode::ApprovalRequired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub booking_mode: BookingMode,
    pub consultation_minutes: u32,
    pub video_link_base: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("STORE_URL not set, using empty value");
                    String::new()
                }),
            store_api_key: env::var("STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            booking_mode: env::var("BOOKING_MODE")
                .ok()
                .and_then(|value| {
                    let parsed = BookingMode::from_env_value(&value);
                    if parsed.is_none() {
                        warn!("BOOKING_MODE '{}' not recognized, using approval_required", value);
                    }
                    parsed
                })
                .unwrap_or(BookingMode::ApprovalRequired),
            consultation_minutes: env::var("CONSULTATION_MINUTES")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(30),
            video_link_base: env::var("VIDEO_LINK_BASE")
                .unwrap_or_else(|_| "https://meet.clinica.example".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty() && !self.store_api_key.is_empty()
    }
}
