use axum::{
    middleware::Next,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    body::Body,
};
use axum_extra::extract::cookie;

use common_types::Ip::try_fetch_ipv6;
use crate::{
    Response::{ServerResponse, status_response, internal_server_error},
    Auth::{is_valid_signed_token, is_timestamp_expired},
    State::AppState,
    Constants,
};

#[derive(Clone, Debug)]
pub struct AdminSession {
    pub email: String,
}

// Checks for X-ATK token
// Checks if ip claim matches
// Checks if token has not expired
// Checks the admin email is still the configured one
// Then calls next, with Extension<AdminSession>
#[tracing::instrument(skip(appstate, req, next))]
pub async fn middleware(State(appstate): State<AppState>, req: Request<Body>, next: Next<Body>) -> Result<Response, ServerResponse> {
    let admin = appstate.admin_access()?;
    let (mut parts, body) = req.into_parts();
    // Attempt to find client IP from headers
    let ipv6 = try_fetch_ipv6(&parts.headers, *Constants::DEVELOPMENT_MODE).ok_or(status_response(StatusCode::FORBIDDEN, "Forbidden headers"))?.to_string();
    let jar = cookie::CookieJar::from_headers(&parts.headers);
    let Some(access_token) = jar.get("X-ATK") else {
        tracing::warn!("Could not find X-ATK token, failed to verify");
        return Err(status_response(StatusCode::UNAUTHORIZED, "Invalid token"))
    };

    tracing::info!("Verifying X-ATK token");
    let Ok(claims) = is_valid_signed_token(&admin.jwt_key, access_token.value()) else {
        tracing::warn!("X-ATK token provided was not valid");
        return Err(status_response(StatusCode::UNAUTHORIZED, "Invalid token"))
    };
    let ip = claims.get("ip").ok_or_else(|| {
        tracing::error!("X-ATK token has no 'ip' field");
        internal_server_error("Internal Server Error")
    })?;
    if ip != &ipv6 {
        tracing::warn!("X-ATK token rejected as IPV6 mismatch");
        return Err(status_response(StatusCode::UNAUTHORIZED, "Invalid token"))
    }
    let expire = claims.get("expire").ok_or_else(|| {
        tracing::error!("X-ATK token has no 'expire' field");
        internal_server_error("Internal Server Error")
    })?.parse::<i64>().map_err(|_| {
        tracing::error!("X-ATK token 'expire' field failed to parse into 'i64'");
        internal_server_error("Failed to cast")
    })?;
    if is_timestamp_expired(expire) {
        tracing::warn!("X-ATK token rejected as expired");
        return Err(status_response(StatusCode::UNAUTHORIZED, "Invalid token"))
    }
    let email = claims.get("adminEmail").ok_or_else(|| {
        tracing::error!("X-ATK token has no 'adminEmail' field");
        internal_server_error("Internal Server Error")
    })?;
    if !email.eq_ignore_ascii_case(&admin.email) {
        tracing::warn!("X-ATK token rejected as it names a different admin");
        return Err(status_response(StatusCode::UNAUTHORIZED, "Invalid token"))
    }

    tracing::info!("X-ATK token verified");
    parts.extensions.insert(AdminSession {
        email: email.clone(),
    });

    Ok(next.run(Request::from_parts(parts, body)).await)
}
