use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;

use consult_intake_mailer::MailRelayClient;
use consult_intake_storage::Database;

use crate::{submit, telemetry};

/// Shared per-process state handed to every handler.
///
/// `storage` and `mailer` stay `None` when the corresponding configuration is
/// absent: a missing store fails submissions closed, a missing mailer only
/// skips the notification step.
#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Option<Database>,
    mailer: Option<MailRelayClient>,
    diagnostics: bool,
}

impl AppState {
    pub fn new(
        metrics: PrometheusHandle,
        storage: Option<Database>,
        mailer: Option<MailRelayClient>,
        diagnostics: bool,
    ) -> Self {
        Self {
            metrics,
            storage,
            mailer,
            diagnostics,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> Option<&Database> {
        self.storage.as_ref()
    }

    pub fn mailer(&self) -> Option<&MailRelayClient> {
        self.mailer.as_ref()
    }

    /// Whether verbose per-request pipeline logging is enabled.
    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/submission", post(submit::handle))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}
