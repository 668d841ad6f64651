use axum::{
    middleware::Next,
    http::{
        Request,
        header::{
            HeaderValue,
            ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
        }
    },
    response::Response,
    body::Body,
};

use crate::{
    Response::ServerResponse,
    Constants,
};

#[tracing::instrument(skip(req, next))]
pub async fn middleware(req: Request<Body>, next: Next<Body>) -> Result<Response, ServerResponse> {
    let response = next.run(req).await;
    let (mut parts, body) = response.into_parts();
    match HeaderValue::from_str(&*Constants::ORIGIN_URL) {
        Ok(origin) => {
            parts.headers.append(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        },
        Err(err) => tracing::error!("ORIGIN_URL is not a valid header value, {err}"),
    }
    parts.headers.append(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET,POST,OPTIONS"));
    parts.headers.append(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    parts.headers.append(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type,withcredentials"));
    Ok(Response::from_parts(parts, body))
}
