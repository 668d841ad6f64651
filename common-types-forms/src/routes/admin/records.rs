use axum::{
    extract::{Extension, State},
    response::Html,
    Json,
};

use crate::{
    Admin::AdminView,
    Middleware::validate_access_auth::AdminSession,
    State::{AppState, store_timeout},
};
use super::super::pages;

async fn load(appstate: &AppState) -> AdminView {
    AdminView::load(appstate.store().as_ref(), &appstate.admin_collections, store_timeout()).await
}

// GET /admin/records API endpoint
// Responds with every message and booking, each collection either
// {"status":"loaded","rows":[...]} or {"status":"failed","reason":...}
#[tracing::instrument(skip(session, appstate), fields(admin=%session.email,request="/admin/records"))]
pub async fn request(Extension(session): Extension<AdminSession>, State(appstate): State<AppState>) -> Json<AdminView> {
    Json(load(&appstate).await)
}

// GET /admin
#[tracing::instrument(skip(session, appstate), fields(admin=%session.email,request="/admin"))]
pub async fn page(Extension(session): Extension<AdminSession>, State(appstate): State<AppState>) -> Html<String> {
    let view = load(&appstate).await;
    pages::layout("Admin Dashboard", &view.render_html())
}
