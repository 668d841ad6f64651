use ::std::sync::Arc;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use hmac::Mac;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;

use common_types_forms::{
    Auth::JwtKey,
    Routes::site_router,
    State::{AdminAccess, InternalAppState},
    Store::{NewRecord, RecordStore, StoreError, StoredRecord},
};

const ADMIN_EMAIL: &str = "admin@researchkart.in";
const ADMIN_PASSWORD: &str = "correct horse battery";
const CLIENT_IP: &str = "10.0.0.7";

#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<StoredRecord>>,
    failing: bool,
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn append(&self, collection: &str, record: NewRecord) -> Result<StoredRecord, StoreError> {
        if self.failing {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        let mut records = self.records.lock();
        let stored = StoredRecord::from_parts(
            records.len() as i64 + 1,
            collection.to_string(),
            record.document,
            record.server_timestamp_field,
            chrono::Utc::now().naive_utc(),
        );
        records.push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError> {
        if self.failing {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        Ok(self.records.lock().iter().filter(|record| record.collection == collection).cloned().collect())
    }
}

/// Holds every append until released, so a submission can be kept in flight.
#[derive(Default)]
struct GatedStore {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn append(&self, collection: &str, record: NewRecord) -> Result<StoredRecord, StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(StoredRecord::from_parts(1, collection.to_string(), record.document, record.server_timestamp_field, chrono::Utc::now().naive_utc()))
    }

    async fn list_all(&self, _: &str) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(Vec::new())
    }
}

fn admin_access() -> AdminAccess {
    AdminAccess {
        jwt_key: JwtKey::new_from_slice(b"integration-test-key").unwrap(),
        email: ADMIN_EMAIL.to_string(),
        password_bcrypt: bcrypt::hash(ADMIN_PASSWORD, 4).unwrap(),
    }
}

fn router(store: Arc<dyn RecordStore>) -> Router {
    site_router(Arc::new(InternalAppState::new(store, Some(admin_access()))))
}

fn forms_only_router(store: Arc<dyn RecordStore>) -> Router {
    site_router(Arc::new(InternalAppState::new(store, None)))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-real-ip", CLIENT_IP)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_message() -> Value {
    json!({
        "name": "Jo",
        "email": "jo@example.com",
        "subject": "Thesis help",
        "message": "I need help with my thesis.",
    })
}

#[tokio::test]
async fn contact_submission_is_stored_and_acknowledged() {
    let store = Arc::new(MemoryStore::default());
    let response = router(store.clone()).oneshot(post("/contact-us", valid_message())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["acknowledgment"], "Your message has been sent successfully!");
    assert_eq!(body["acknowledgeForSecs"], 4);

    let records = store.records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].collection, "messages");
    assert_eq!(records[0].field("subject"), Some("Thesis help"));
    assert!(records[0].field("timestamp").is_some());
}

#[tokio::test]
async fn invalid_contact_submission_reports_every_field() {
    let store = Arc::new(MemoryStore::default());
    let response = router(store.clone())
        .oneshot(post("/contact-us", json!({ "name": "", "email": "", "subject": "", "message": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["name"], "Name must be at least 2 characters.");
    assert_eq!(body["fields"]["email"], "Please enter a valid email address.");
    assert_eq!(body["fields"]["subject"], "Subject is required.");
    assert_eq!(body["fields"]["message"], "Message must be at least 10 characters.");
    assert!(store.records.lock().is_empty());
}

#[tokio::test]
async fn booking_lands_in_the_consultations_collection() {
    let store = Arc::new(MemoryStore::default());
    let booking = json!({
        "name": "Asha",
        "email": "asha@example.com",
        "phone": "9999999999",
        "service": "Data Analysis",
        "date": "2024-06-01",
        "time": "10:30",
        "mode": "Offline",
    });
    let response = router(store.clone()).oneshot(post("/book-free-consultation", booking)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let records = store.records.lock();
    assert_eq!(records[0].collection, "consultations");
    assert_eq!(records[0].field("mode"), Some("Offline"));
    assert_eq!(records[0].field("message"), Some(""));
}

#[tokio::test]
async fn store_failure_is_reported_as_unavailable() {
    let store = Arc::new(MemoryStore { failing: true, ..Default::default() });
    let response = router(store).oneshot(post("/contact-us", valid_message())).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to send message. Try again.");
}

#[tokio::test]
async fn compatibility_characters_are_stored_as_typed() {
    let store = Arc::new(MemoryStore::default());
    let typed = "\u{FB01}nd me a mentor, \u{FF12}\u{FF10}\u{FF12}\u{FF15} please";
    let mut message = valid_message();
    message["message"] = json!(typed);
    message["name"] = json!("\u{FF2A}o");
    let response = router(store.clone()).oneshot(post("/contact-us", message)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let records = store.records.lock();
    assert_eq!(records[0].field("message"), Some(typed));
    assert_eq!(records[0].field("name"), Some("\u{FF2A}o"));
}

#[tokio::test]
async fn booking_store_failure_keeps_nothing_and_reports_unavailable() {
    let store = Arc::new(MemoryStore { failing: true, ..Default::default() });
    let booking = json!({
        "name": "Asha",
        "email": "asha@example.com",
        "phone": "9999999999",
        "service": "Thesis Guidance",
        "date": "2024-06-01",
        "time": "10:30",
    });
    let response = router(store.clone()).oneshot(post("/book-free-consultation", booking)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Something went wrong. Try again!");
    assert!(store.records.lock().is_empty());
}

#[tokio::test]
async fn concurrent_duplicate_is_turned_away_until_the_first_is_stored() {
    let store = Arc::new(GatedStore::default());
    let router = router(store.clone());

    let first = tokio::spawn(router.clone().oneshot(post("/contact-us", valid_message())));
    store.entered.notified().await;

    let mut duplicate = valid_message();
    duplicate["email"] = json!("  JO@example.com ");
    let response = router.clone().oneshot(post("/contact-us", duplicate)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("still being processed"));

    let other_form = json!({
        "name": "Jo",
        "email": "jo@example.com",
        "phone": "9999999999",
        "service": "Data Analysis",
        "date": "2024-06-01",
        "time": "10:30",
    });
    let booking = tokio::spawn(router.clone().oneshot(post("/book-free-consultation", other_form)));
    store.entered.notified().await;

    store.release.notify_one();
    store.release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(booking.await.unwrap().unwrap().status(), StatusCode::OK);

    store.release.notify_one();
    let response = router.oneshot(post("/contact-us", valid_message())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn form_only_state_accepts_submissions_but_not_logins() {
    let store = Arc::new(MemoryStore::default());
    let router = forms_only_router(store.clone());

    let response = router.clone().oneshot(post("/contact-us", valid_message())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.records.lock().len(), 1);

    let response = router
        .oneshot(post("/login", json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn admin_records_require_a_session() {
    let request = Request::builder()
        .uri("/admin/records")
        .header("x-real-ip", CLIENT_IP)
        .body(Body::empty())
        .unwrap();
    let response = router(Arc::new(MemoryStore::default())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let response = router(Arc::new(MemoryStore::default()))
        .oneshot(post("/login", json!({ "email": ADMIN_EMAIL, "password": "nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logged_in_admin_lists_records() {
    let store = Arc::new(MemoryStore::default());
    let router = router(store);

    let response = router.clone().oneshot(post("/contact-us", valid_message())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.clone()
        .oneshot(post("/login", json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    let access_cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(access_cookie.starts_with("X-ATK="));

    let request = Request::builder()
        .uri("/admin/records")
        .header("x-real-ip", CLIENT_IP)
        .header(header::COOKIE, access_cookie)
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["messages"]["status"], "loaded");
    assert_eq!(body["messages"]["rows"][0]["fields"]["name"], "Jo");
    assert_eq!(body["bookings"]["status"], "loaded");
    assert_eq!(body["bookings"]["rows"], json!([]));
}
