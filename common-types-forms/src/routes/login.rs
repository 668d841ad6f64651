use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::{HeaderName, SET_COOKIE}},
    Json,
};
use garde::Validate;

use common_types::Ip::try_fetch_ipv6;
use crate::{
    Response::{ServerResponse, internal_server_error, status_response},
    State::AppState,
    Auth::{gen_access_token, TokenPackage},
    Constants,
};

mod db;

use db::RequestPayload;

fn access_cookie(tokens_package: &TokenPackage) -> Result<HeaderValue, ServerResponse> {
    let cookie = match *Constants::DEVELOPMENT_MODE {
        true => {
            tracing::warn!("Using development mode cookies");
            format!("X-ATK={}; Path=/; Expires={}; HttpOnly", tokens_package.access_token, tokens_package.access_expire_format)
        },
        false => format!("X-ATK={}; Path=/; Expires={}; SameSite=Strict; Secure; HttpOnly", tokens_package.access_token, tokens_package.access_expire_format),
    };
    HeaderValue::from_str(&cookie).map_err(|err| {
        tracing::error!("Failed to build X-ATK cookie header, {err}");
        internal_server_error("Internal Server Error")
    })
}

// POST /login API endpoint
// Body must be JSON, in format:
// {
//      email,     [Must be a valid email, maximum length 320]
//      password   [Maximum length 72, the bcrypt input limit]
// }
//
// 1. Perform validation, handled by garde
// 2. Compare against the configured admin email
// 3. Verify password against the configured bcrypt hash
// 4. If successful respond with an X-ATK cookie bound to the client IP
#[tracing::instrument(skip(appstate, headers, user_request), fields(email=%user_request.email,request="/login"))]
pub async fn request(State(appstate): State<AppState>, headers: HeaderMap, Json(user_request): Json<RequestPayload>) -> Result<([(HeaderName, HeaderValue); 1], ()), ServerResponse> {
    tracing::info!("Processing login request");
    if let Err(err) = user_request.validate(&()) {
        tracing::info!("Validation failed with reason: {err}");
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }

    let ipv6 = try_fetch_ipv6(&headers, *Constants::DEVELOPMENT_MODE).ok_or(status_response(StatusCode::FORBIDDEN, "Forbidden headers"))?.to_string();

    let admin = appstate.admin_access()?;
    if !user_request.email.trim().eq_ignore_ascii_case(&admin.email) {
        tracing::info!("No matching email found, login request rejected");
        return Err(status_response(StatusCode::UNAUTHORIZED, "No matching credentials"));
    }

    let password_verified = bcrypt::verify(&user_request.password, &admin.password_bcrypt).map_err(|err| {
        tracing::error!("Failed to verify password hash, {err}");
        internal_server_error("Internal Server Error")
    })?;
    if !password_verified {
        tracing::warn!("Could not verify password hash, rejected login");
        return Err(status_response(StatusCode::UNAUTHORIZED, "No matching credentials"));
    }

    let tokens_package = gen_access_token(&admin.jwt_key, ipv6, &admin.email, *Constants::ACCESS_TOKEN_EXPIRES_SEC).map_err(|err| {
        tracing::error!("Failed to generate tokens, {:?}", err);
        internal_server_error("Internal Server Error")
    })?;

    tracing::info!("Successfully logged in");
    Ok(([(SET_COOKIE, access_cookie(&tokens_package)?)], ()))
}
