//! Scheduled export of state snapshots to an external durable log.
//!
//! The exporter is a collaborator at the edge of the system: it asks
//! the shared state for a snapshot on a cron schedule and ships it to
//! an HTTP endpoint as one JSON record per run. Export failures are
//! logged and never affect the authoritative state or any client
//! connection.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cron::Schedule;
use payroll_store::StorageKind;
use payroll_sync::AppState;
use payroll_types::PayrollState;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ExportConfig;

/// One exported snapshot record.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    /// When the export was taken.
    pub timestamp: chrono::DateTime<Utc>,
    /// Why the export ran: `startup` or `cron`.
    pub reason: String,
    /// The active storage backend at export time.
    pub storage: StorageKind,
    /// The exported state.
    pub state: PayrollState,
}

/// Errors from the export collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The request to the export destination failed.
    #[error("export request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The destination rejected the record.
    #[error("export rejected with status {0}")]
    Rejected(reqwest::StatusCode),
}

/// Destination for exported snapshot records.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Append one record to the external log.
    async fn append(&self, record: &ExportRecord) -> Result<(), ExportError>;
}

/// Ships records to an HTTP endpoint as JSON, with an optional bearer
/// token.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
    auth_token: Option<String>,
}

impl HttpSink {
    /// Create a sink posting to `url`.
    pub fn new(url: String, auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            auth_token,
        }
    }
}

#[async_trait]
impl ExportSink for HttpSink {
    async fn append(&self, record: &ExportRecord) -> Result<(), ExportError> {
        let mut request = self.client.post(&self.url).json(record);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ExportError::Rejected(response.status()))
        }
    }
}

/// Spawn the export scheduler on a background task.
///
/// Returns `None` when no destination URL is configured, or when the
/// schedule expression does not parse (logged as an error; the server
/// keeps running without exports either way).
pub fn spawn_exporter(config: &ExportConfig, state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let url = config.url.clone()?;

    let schedule = match Schedule::from_str(&config.schedule) {
        Ok(schedule) => schedule,
        Err(e) => {
            error!(
                schedule = %config.schedule,
                error = %e,
                "Invalid export schedule expression; exports disabled"
            );
            return None;
        }
    };

    let sink = HttpSink::new(url, config.auth_token.clone());
    let run_on_startup = config.run_on_startup;
    info!(schedule = %config.schedule, "Export scheduler started");

    Some(tokio::spawn(async move {
        if run_on_startup {
            run_export(&state, &sink, "startup").await;
        }
        loop {
            let Some(next) = schedule.upcoming(Utc).next() else {
                warn!("Export schedule has no upcoming runs; exporter stopping");
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            run_export(&state, &sink, "cron").await;
        }
    }))
}

/// Take one snapshot and ship it. Failures are logged only; the core
/// is never affected.
async fn run_export(state: &AppState, sink: &dyn ExportSink, reason: &str) {
    let record = ExportRecord {
        timestamp: Utc::now(),
        reason: reason.to_owned(),
        storage: state.storage_kind(),
        state: state.snapshot().await,
    };
    match sink.append(&record).await {
        Ok(()) => info!(reason, "Export written"),
        Err(e) => error!(reason, error = %e, "Export failed"),
    }
}
