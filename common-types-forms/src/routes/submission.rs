use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::{
    Forms::{FormFields, FormState},
    Response::{ServerResponse, status_response, validation_response},
    State::AppState,
    Submission::SubmissionOutcome,
};

#[derive(Serialize, Debug)]
pub struct SubmissionReceipt {
    pub id: i64,
    pub acknowledgment: &'static str,
    #[serde(rename = "acknowledgeForSecs")]
    pub acknowledge_for_secs: u64,
}

const STILL_PROCESSING: &str = "Your previous submission is still being processed. Please wait a moment.";

// Shared by every form endpoint:
// 1. Claim the in-flight ticket for (collection, submitter)
// 2. Run the pipeline on a fresh form holding the posted fields
// 3. Map the outcome onto a response, keeping the failure notice generic
pub(crate) async fn submit<F: FormFields>(appstate: &AppState, fields: F, acknowledgment: &'static str, failure_notice: &'static str) -> Result<Json<SubmissionReceipt>, ServerResponse> {
    let submitter = fields.submitter().trim().to_string();
    let _ticket = match submitter.is_empty() {
        // Validation rejects it anyway, there is nobody to guard
        true => None,
        false => Some(appstate.in_flight.try_claim(F::COLLECTION, &submitter).ok_or_else(|| {
            tracing::warn!("Duplicate submission rejected while the first is persisting");
            status_response(StatusCode::TOO_MANY_REQUESTS, STILL_PROCESSING)
        })?),
    };

    let mut form = FormState::with_fields(fields);
    match appstate.pipeline.submit(&mut form).await {
        SubmissionOutcome::Succeeded(record) => Ok(Json(SubmissionReceipt {
            id: record.id,
            acknowledgment,
            acknowledge_for_secs: appstate.pipeline.acknowledgment().as_secs(),
        })),
        SubmissionOutcome::Rejected(errors) => Err(validation_response(errors)),
        SubmissionOutcome::Busy => Err(status_response(StatusCode::TOO_MANY_REQUESTS, STILL_PROCESSING)),
        SubmissionOutcome::Failed(_) => Err(status_response(StatusCode::SERVICE_UNAVAILABLE, failure_notice)),
    }
}
