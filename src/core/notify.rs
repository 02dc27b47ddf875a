use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::clock::{self, LocalTime};
use crate::db::SqliteStore;

/// Sent once per shift the auto-close scan terminated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoCloseNotice {
    pub worker_id: i64,
    pub worker_name: String,
    pub worker_email: String,
    pub shift_date: NaiveDate,
    pub forced_close_time: LocalTime,
}

/// Notification collaborator. Fire-and-forget: implementations log their own
/// delivery failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_auto_closed(&self, notice: AutoCloseNotice);
}

/// Records notices in the tracing output and the audit log.
pub struct LogNotifier {
    store: Option<SqliteStore>,
}

impl LogNotifier {
    pub fn new(store: Option<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_auto_closed(&self, notice: AutoCloseNotice) {
        info!(
            worker_id = notice.worker_id,
            email = %notice.worker_email,
            date = %notice.shift_date,
            salida = %clock::to_storage(&notice.forced_close_time),
            "auto-close notice"
        );

        if let Some(store) = &self.store {
            let message = format!(
                "{} <{}>: shift of {} closed at {}",
                notice.worker_name,
                notice.worker_email,
                notice.shift_date,
                notice.forced_close_time.format("%H:%M")
            );
            if let Err(e) = store
                .log_event("notify", &format!("worker {}", notice.worker_id), &message)
                .await
            {
                warn!(worker_id = notice.worker_id, error = %e, "could not record notice");
            }
        }
    }
}
