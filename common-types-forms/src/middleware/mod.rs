pub mod set_cors_headers;
pub mod validate_access_auth;
