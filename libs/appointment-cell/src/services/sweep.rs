use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::models::AppointmentStatus;
use crate::services::notify::{
    notify_best_effort, NotificationDispatcher, NotificationKind, TracingNotifier,
};
use crate::store::{AppointmentStore, PostgrestAppointmentStore};

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepReport {
    pub reminders_sent: u64,
    pub no_shows_marked: u64,
}

/// Daily batch over the appointment store: reminders for tomorrow's
/// scheduled appointments and no-show marking for yesterday's.
///
/// Both passes use conditional updates, so a sweep racing a cancellation
/// or a second sweep run leaves each appointment touched at most once.
pub struct DailySweep {
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl DailySweep {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            appointments,
            notifier,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PostgrestAppointmentStore::new(config)),
            Arc::new(TracingNotifier),
        )
    }

    pub async fn run(&self, today: NaiveDate) -> anyhow::Result<SweepReport> {
        let mut report = SweepReport::default();
        report.reminders_sent = self.send_reminders(today + Duration::days(1)).await?;
        report.no_shows_marked = self.mark_no_shows(today - Duration::days(1)).await?;

        info!(
            "Daily sweep for {}: {} reminders, {} no-shows",
            today, report.reminders_sent, report.no_shows_marked
        );
        Ok(report)
    }

    async fn send_reminders(&self, tomorrow: NaiveDate) -> anyhow::Result<u64> {
        let due = self
            .appointments
            .find_by_date_and_status(tomorrow, AppointmentStatus::Scheduled)
            .await?;

        let mut sent = 0;
        for appointment in due {
            if appointment.reminder_sent_at.is_some() {
                continue;
            }

            // Stamp first: if the stamp does not land the reminder was
            // already handled elsewhere.
            let stamped = self
                .appointments
                .mark_reminder_sent(appointment.id, Utc::now())
                .await?;
            if !stamped {
                continue;
            }

            notify_best_effort(
                self.notifier.as_ref(),
                &appointment,
                NotificationKind::Reminder,
                None,
            )
            .await;
            sent += 1;
        }

        Ok(sent)
    }

    async fn mark_no_shows(&self, yesterday: NaiveDate) -> anyhow::Result<u64> {
        let missed = self
            .appointments
            .find_by_date_and_status(yesterday, AppointmentStatus::Scheduled)
            .await?;

        let mut marked = 0;
        for appointment in missed {
            let moved = self
                .appointments
                .transition_if(
                    appointment.id,
                    AppointmentStatus::Scheduled,
                    AppointmentStatus::NoShow,
                )
                .await?;

            if moved {
                marked += 1;
            } else {
                warn!(
                    "Appointment {} changed status during sweep, skipping no-show",
                    appointment.id
                );
            }
        }

        Ok(marked)
    }
}
