use axum::{
    routing,
    Router,
    middleware as axum_middleware,
};

use crate::{
    Middleware,
    State::AppState,
};

pub mod pages;
pub mod contact;
pub mod consultation;
pub mod login;
pub mod admin;
mod submission;

pub use submission::SubmissionReceipt;

/// Every page and endpoint of the site on one router, as served locally.
/// The lambdas each mount their own slice of these routes.
pub fn site_router(appstate: AppState) -> Router {
    let admin = Router::new()
        .route("/admin", routing::get(admin::records::page))
        .route("/admin/records", routing::get(admin::records::request))
        .route_layer(axum_middleware::from_fn_with_state(appstate.clone(), Middleware::validate_access_auth::middleware));

    Router::new()
        .route("/", routing::get(pages::home))
        .route("/about-us", routing::get(pages::about_us))
        .route("/services", routing::get(pages::services))
        .route("/contact-us", routing::get(pages::contact_us).post(contact::request))
        .route("/book-free-consultation", routing::get(pages::book_free_consultation).post(consultation::request))
        .route("/login", routing::get(pages::login).post(login::request))
        .merge(admin)
        .route_layer(axum_middleware::from_fn(Middleware::set_cors_headers::middleware))
        .with_state(appstate)
}
