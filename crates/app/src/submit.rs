use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use consult_intake_core::types::{ConsultationRecord, SubmissionRequest};
use consult_intake_core::validation::validate;
use consult_intake_mailer::{ConsultationMessage, MailRelayClient};
use consult_intake_storage::NewConsultation;

use crate::error::ErrorResponse;
use crate::router::AppState;

const MSG_MISSING_STORE: &str = "database connection is not configured";
const MSG_STORE_FAILURE: &str = "failed to store consultation";
const MSG_INTERNAL: &str = "internal server error";

/// Body returned for an accepted submission.
#[derive(Debug, Serialize)]
struct SubmissionAccepted {
    success: bool,
    data: Vec<ConsultationRecord>,
}

/// The submission pipeline: parse, validate, persist, then fire the
/// notification without awaiting it. Success is decided by the insert alone.
pub async fn handle(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ErrorResponse> {
    let submission_id = Uuid::new_v4();
    if state.diagnostics() {
        info!(
            stage = "submit",
            %submission_id,
            body_bytes = body.len(),
            store_configured = state.storage().is_some(),
            mailer_configured = state.mailer().is_some(),
            "submission received"
        );
    }

    let request: SubmissionRequest = serde_json::from_slice(&body).map_err(|err| {
        counter!("submissions_total", "outcome" => "rejected_internal").increment(1);
        error!(stage = "submit", %submission_id, error = %err, "failed to parse submission body");
        ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
    })?;

    if let Err(err) = validate(&request) {
        counter!("submissions_total", "outcome" => "rejected_validation").increment(1);
        if state.diagnostics() {
            info!(stage = "submit", %submission_id, reason = %err, "submission rejected");
        }
        return Err(ErrorResponse::new(StatusCode::BAD_REQUEST, err.to_string()));
    }

    let Some(storage) = state.storage() else {
        counter!("submissions_total", "outcome" => "rejected_config").increment(1);
        error!(stage = "submit", %submission_id, "store unavailable: {MSG_MISSING_STORE}");
        return Err(ErrorResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            MSG_MISSING_STORE,
        ));
    };

    let persist_start = Instant::now();
    let record = storage
        .consultations()
        .insert(NewConsultation {
            name: &request.name,
            contact: &request.contact,
            click_source: request.persisted_click_source(),
        })
        .await
        .map_err(|err| {
            counter!("submissions_total", "outcome" => "rejected_storage").increment(1);
            error!(stage = "submit", %submission_id, error = %err, "failed to persist consultation");
            ErrorResponse::with_details(
                StatusCode::INTERNAL_SERVER_ERROR,
                MSG_STORE_FAILURE,
                err.to_string(),
            )
        })?;
    histogram!("submission_persist_seconds").record(persist_start.elapsed().as_secs_f64());

    if state.diagnostics() {
        info!(
            stage = "submit",
            %submission_id,
            record_id = record.id,
            click_source = %record.click_source,
            "consultation persisted"
        );
    }

    match state.mailer() {
        Some(mailer) => dispatch_notification(mailer.clone(), &request, submission_id),
        None => {
            if state.diagnostics() {
                info!(stage = "mail", %submission_id, "mail relay not configured; notification skipped");
            }
        }
    }

    counter!("submissions_total", "outcome" => "accepted").increment(1);
    let body = SubmissionAccepted {
        success: true,
        data: vec![record],
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Launches the notification send on its own task. The response path never
/// waits on it, and any failure stops here: it is logged and counted, nothing
/// more. The message carries the raw optional tag, not the persisted default.
fn dispatch_notification(
    mailer: MailRelayClient,
    request: &SubmissionRequest,
    submission_id: Uuid,
) {
    let message = ConsultationMessage {
        name: request.name.clone(),
        contact: request.contact.clone(),
        click_source: request.click_source().map(str::to_string),
    };

    tokio::spawn(async move {
        match mailer.send_consultation(&message).await {
            Ok(receipt) => {
                counter!("mail_dispatch_total", "result" => "sent").increment(1);
                info!(
                    stage = "mail",
                    %submission_id,
                    message_id = %receipt.message_id,
                    "notification delivered"
                );
            }
            Err(err) => {
                counter!("mail_dispatch_total", "result" => "error").increment(1);
                error!(stage = "mail", %submission_id, error = %err, "notification dispatch failed");
            }
        }
    });
}
