use axum::{
    extract::State,
    Json,
};

use crate::{
    Forms::ConsultationBooking,
    Response::ServerResponse,
    State::AppState,
};
use super::submission::{submit, SubmissionReceipt};

// POST /book-free-consultation API endpoint
// Body must be JSON, in format:
// {
//      name, email, phone,  [Required]
//      service,             [One of the offered services]
//      date,                [YYYY-MM-DD]
//      time,                [HH:MM]
//      mode,                ["Online" (default) or "Offline"]
//      message              [Optional]
// }
#[tracing::instrument(skip(appstate, user_request), fields(request="/book-free-consultation"))]
pub async fn request(State(appstate): State<AppState>, Json(user_request): Json<ConsultationBooking>) -> Result<Json<SubmissionReceipt>, ServerResponse> {
    submit(
        &appstate,
        user_request,
        "Your consultation request has been received. We'll contact you soon!",
        "Something went wrong. Try again!",
    ).await
}
