use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Sent to the doctor when a booking awaits approval.
    BookingRequested,
    /// Sent to the patient on direct booking or approval.
    BookingConfirmed,
    /// Day-before reminder to the patient.
    Reminder,
    Cancelled,
    Rejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingRequested => "booking_requested",
            NotificationKind::BookingConfirmed => "booking_confirmed",
            NotificationKind::Reminder => "reminder",
            NotificationKind::Cancelled => "cancelled",
            NotificationKind::Rejected => "rejected",
        }
    }
}

/// Fire-and-forget notification boundary. Delivery failures never roll back
/// the state transition that triggered them.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(
        &self,
        appointment: &Appointment,
        kind: NotificationKind,
        detail: Option<&str>,
    ) -> Result<()>;
}

/// Default dispatcher: logs the notification. Real delivery lives in an
/// external service this core only calls into.
pub struct TracingNotifier;

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn send(
        &self,
        appointment: &Appointment,
        kind: NotificationKind,
        detail: Option<&str>,
    ) -> Result<()> {
        info!(
            "Notification {}: appointment {} (patient {}, doctor {}){}",
            kind.as_str(),
            appointment.id,
            appointment.patient_id,
            appointment.doctor_id,
            detail.map(|d| format!(" - {}", d)).unwrap_or_default()
        );
        Ok(())
    }
}

/// Send, log any failure, and move on.
pub async fn notify_best_effort(
    dispatcher: &dyn NotificationDispatcher,
    appointment: &Appointment,
    kind: NotificationKind,
    detail: Option<&str>,
) {
    if let Err(err) = dispatcher.send(appointment, kind, detail).await {
        warn!(
            "Failed to send {} notification for appointment {}: {}",
            kind.as_str(),
            appointment.id,
            err
        );
    }
}
