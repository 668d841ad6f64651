use axum::{
    extract::State,
    Json,
};

use crate::{
    Forms::ContactMessage,
    Response::ServerResponse,
    State::AppState,
};
use super::submission::{submit, SubmissionReceipt};

// POST /contact-us API endpoint
// Body must be JSON, in format:
// {
//      name,     [At least 2 characters]
//      email,    [local@domain.tld]
//      subject,  [Required]
//      message   [At least 10 characters]
// }
//
// Missing keys are treated as empty fields, so they come back as field errors.
// Fields are stored exactly as submitted.
// Responds with the acknowledgment to show once the message is stored.
#[tracing::instrument(skip(appstate, user_request), fields(request="/contact-us"))]
pub async fn request(State(appstate): State<AppState>, Json(user_request): Json<ContactMessage>) -> Result<Json<SubmissionReceipt>, ServerResponse> {
    submit(
        &appstate,
        user_request,
        "Your message has been sent successfully!",
        "Failed to send message. Try again.",
    ).await
}
