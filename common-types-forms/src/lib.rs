use common_types;
use db_schema;

pub type E = Box<dyn ::std::error::Error + Send + Sync + 'static>;

mod routes;
mod middleware;
mod forms;
mod pipeline;
mod store;
mod admin_view;

#[allow(non_snake_case)]
pub mod Routes {
    pub use crate::routes::*;
}

#[allow(non_snake_case)]
pub mod Middleware {
    pub use crate::middleware::*;
}

#[allow(non_snake_case)]
pub mod Schema {
    pub use crate::db_schema::*;
}

#[allow(non_snake_case)]
pub mod Forms {
    pub use crate::forms::*;
}

#[allow(non_snake_case)]
pub mod Submission {
    pub use crate::pipeline::*;
}

#[allow(non_snake_case)]
pub mod Store {
    pub use crate::store::*;
}

#[allow(non_snake_case)]
pub mod Admin {
    pub use crate::admin_view::*;
}

#[allow(non_snake_case)]
pub mod Response {
    use axum::{http::StatusCode, Json};
    use serde::Serialize;

    use crate::Forms::ErrorMap;

    #[derive(Serialize, Debug)]
    pub struct ErrorBody {
        pub error: String,
        #[serde(skip_serializing_if = "ErrorMap::is_empty")]
        pub fields: ErrorMap,
    }

    pub type ServerResponse = (StatusCode, Json<ErrorBody>);

    pub fn status_response<E: ToString>(status: StatusCode, error: E) -> ServerResponse {
        (status, Json(ErrorBody {
            error: error.to_string(),
            fields: ErrorMap::new(),
        }))
    }

    pub fn internal_server_error<E: ToString>(err: E) -> ServerResponse {
        status_response(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn validation_response(fields: ErrorMap) -> ServerResponse {
        (StatusCode::BAD_REQUEST, Json(ErrorBody {
            error: "Please correct the highlighted fields.".to_string(),
            fields,
        }))
    }
}

#[allow(non_snake_case)]
pub mod Auth {
    use ::std::collections::BTreeMap;
    use chrono::{DateTime, Utc};
    use hmac::Hmac;
    use jwt::{SignWithKey, VerifyWithKey};
    use sha2::Sha256;
    use thiserror::Error;

    pub type JwtKey = Hmac<Sha256>;

    pub struct TokenPackage {
        pub access_token: String,
        pub expire: i64,
        pub access_expire_format: String,
    }

    #[derive(Error, Debug)]
    pub enum TokenGenerationError {
        #[error("failed to sign access token")]
        SigningFailureAccessJWTToken,
        #[error("access token expiry is out of range")]
        InvalidExpiry,
    }

    pub fn is_timestamp_expired(compare: i64) -> bool {
        Utc::now().timestamp() > compare
    }

    pub fn is_valid_signed_token(key: &JwtKey, token: &str) -> Result<BTreeMap<String, String>, jwt::error::Error> {
        token.verify_with_key(key)
    }

    fn timestamp_to_rfc7231(timestamp: i64) -> Option<String> {
        DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(|expiration_time| expiration_time.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    }

    // Access tokens are bound to the client address they were issued to.
    pub fn gen_access_token(key: &JwtKey, ipv6: String, admin_email: &str, expires_in: i64) -> Result<TokenPackage, TokenGenerationError> {
        let access_token_expire_utc = Utc::now().timestamp() + expires_in;
        let access_expire_format = timestamp_to_rfc7231(access_token_expire_utc)
            .ok_or(TokenGenerationError::InvalidExpiry)?;

        let mut access_token_claims = BTreeMap::new();
        access_token_claims.insert("adminEmail", admin_email.to_string());
        access_token_claims.insert("ip", ipv6);
        access_token_claims.insert("expire", access_token_expire_utc.to_string());

        let access_token = access_token_claims.sign_with_key(key).map_err(|err| {
            tracing::error!("Failed to sign access JWT token, err: {}", err);
            TokenGenerationError::SigningFailureAccessJWTToken
        })?;

        Ok(TokenPackage {
            access_token,
            expire: access_token_expire_utc,
            access_expire_format,
        })
    }

}

#[allow(non_snake_case)]
pub mod InFlight {
    use ::std::collections::HashSet;
    use parking_lot::Mutex;
    use sha2::{Digest, Sha256};

    /// Submissions currently being persisted, keyed by a hash of the
    /// collection and the submitter's email.
    #[derive(Default, Debug)]
    pub struct InFlightSubmissions {
        keys: Mutex<HashSet<String>>,
    }

    /// Releases its key when dropped.
    #[derive(Debug)]
    pub struct InFlightTicket<'a> {
        owner: &'a InFlightSubmissions,
        key: String,
    }

    fn submission_key(collection: &str, submitter: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", collection, submitter.trim().to_lowercase()));
        hex::encode(hasher.finalize())
    }

    impl InFlightSubmissions {
        pub fn try_claim(&self, collection: &str, submitter: &str) -> Option<InFlightTicket<'_>> {
            let key = submission_key(collection, submitter);
            if !self.keys.lock().insert(key.clone()) {
                return None
            }
            Some(InFlightTicket {
                owner: self,
                key,
            })
        }

        pub fn is_in_flight(&self, collection: &str, submitter: &str) -> bool {
            self.keys.lock().contains(&submission_key(collection, submitter))
        }
    }

    impl Drop for InFlightTicket<'_> {
        fn drop(&mut self) {
            self.owner.keys.lock().remove(&self.key);
        }
    }

}

#[allow(non_snake_case)]
pub mod State {
    use ::std::sync::Arc;
    use ::std::time::Duration;
    use diesel::{ConnectionError, ConnectionResult};
    use diesel_async::{
        pooled_connection::{
            ManagerConfig,
            AsyncDieselConnectionManager,
            deadpool::Pool,
        },
        AsyncPgConnection,
    };
    use futures_util::{future::BoxFuture, FutureExt};
    use hmac::Mac;

    use common_types::Collections;
    use crate::{
        Admin::AdminCollections,
        Auth::JwtKey,
        InFlight::InFlightSubmissions,
        Response::{ServerResponse, internal_server_error},
        Store::{PostgresStore, RecordStore},
        Submission::Pipeline,
        Constants::*,
    };

    /// Everything needed to sign admins in and check their sessions.
    pub struct AdminAccess {
        pub jwt_key: JwtKey,
        pub email: String,
        pub password_bcrypt: String,
    }

    pub struct InternalAppState {
        pub pipeline: Pipeline,
        // None in the form lambdas, which never serve admin routes
        pub admin: Option<AdminAccess>,
        pub admin_collections: AdminCollections,
        pub in_flight: InFlightSubmissions,
    }
    pub type AppState = Arc<InternalAppState>;

    impl InternalAppState {
        pub fn new(store: Arc<dyn RecordStore>, admin: Option<AdminAccess>) -> Self {
            let admin_collections = AdminCollections {
                messages: Collections::MESSAGES.to_string(),
                bookings: ADMIN_BOOKINGS_COLLECTION.clone(),
            };
            if admin_collections.bookings != Collections::CONSULTATIONS {
                tracing::warn!(
                    "Admin dashboard lists bookings from '{}' while the booking form writes to '{}'",
                    admin_collections.bookings,
                    Collections::CONSULTATIONS,
                );
            }
            Self {
                pipeline: Pipeline::new(store, store_timeout(), Duration::from_secs(*SUBMISSION_ACK_SECS)),
                admin,
                admin_collections,
                in_flight: InFlightSubmissions::default(),
            }
        }

        pub fn store(&self) -> &Arc<dyn RecordStore> {
            self.pipeline.store()
        }

        pub fn admin_access(&self) -> Result<&AdminAccess, ServerResponse> {
            self.admin.as_ref().ok_or_else(|| {
                tracing::error!("Admin route reached without admin access configured");
                internal_server_error("Internal Server Error")
            })
        }
    }

    pub fn store_timeout() -> Duration {
        Duration::from_secs(*STORE_TIMEOUT_SECS)
    }

    fn make_store() -> Result<Arc<dyn RecordStore>, crate::E> {
        // Create our connection pool
        tracing::info!("Setting up Postgres connection pool");
        let database_url = dotenvy::var("DATABASE_URL")?;
        let mut config = ManagerConfig::default();
        config.custom_setup = Box::new(establish_connection);
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(database_url, config);
        let pool = Pool::builder(config).build()?;
        Ok(Arc::new(PostgresStore::new(pool)))
    }

    /// State for the form lambdas, which only need the store.
    pub async fn make_state() -> Result<AppState, crate::E> {
        let store = make_store()?;

        // Create AppState
        tracing::info!("Creating AppState");
        Ok(Arc::new(InternalAppState::new(store, None)))
    }

    /// State for anything serving /login or /admin, requires the admin secrets.
    pub async fn make_admin_state() -> Result<AppState, crate::E> {
        let store = make_store()?;

        let raw_key = dotenvy::var("JWT_KEY")?;
        let jwt_key = JwtKey::new_from_slice(raw_key.as_bytes())
            .map_err(|err| format!("Failed to generate HMAC for JWT_KEY, {err}"))?;
        let admin = AdminAccess {
            jwt_key,
            email: dotenvy::var("ADMIN_EMAIL")?,
            password_bcrypt: dotenvy::var("ADMIN_PASSWORD_BCRYPT")?,
        };

        // Create AppState
        tracing::info!("Creating AppState with admin access");
        Ok(Arc::new(InternalAppState::new(store, Some(admin))))
    }

    pub fn establish_connection(config: &str) -> BoxFuture<ConnectionResult<AsyncPgConnection>> {
        let fut = async {
            // We first set up the way we want rustls to work.
            let rustls_config = rustls::ClientConfig::builder()
                .with_safe_defaults()
                .with_root_certificates(root_certs())
                .with_no_client_auth();
            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(rustls_config);
            let (client, conn) = tokio_postgres::connect(config, tls)
                .await
                .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::error!("Database connection: {e}");
                }
            });
            AsyncPgConnection::try_from(client).await
        };
        fut.boxed()
    }

    pub fn root_certs() -> rustls::RootCertStore {
        let mut roots = rustls::RootCertStore::empty();
        match rustls_native_certs::load_native_certs() {
            Ok(certs) => {
                let certs: Vec<_> = certs.into_iter().map(|cert| cert.0).collect();
                roots.add_parsable_certificates(&certs);
            },
            Err(err) => tracing::error!("Failed to load native certificates, {err}"),
        }
        roots
    }
}

#[allow(non_snake_case)]
pub mod Constants {
    use ::std::str::FromStr;
    use ::std::fmt::Display;
    use lazy_static::lazy_static;

    use common_types::Collections;

    fn var_or<T: FromStr + Display>(name: &str, default: T) -> T {
        match dotenvy::var(name) {
            Ok(raw) => match raw.parse() {
                Ok(value) => {
                    tracing::info!("Using custom {name}: {value}");
                    value
                },
                Err(_) => {
                    tracing::info!("Failed to parse {name}, using default, {default}");
                    default
                },
            },
            Err(_) => default,
        }
    }

    // WARNING: These are global variables that get
    // initialised on first use, and should not
    // be written to after
    lazy_static!{
        pub static ref DEVELOPMENT_MODE: bool = var_or("DEVELOPMENT_MODE", false);
        pub static ref ORIGIN_URL: String = var_or("ORIGIN_URL", "http://localhost:5173".to_string());
        pub static ref SUBMISSION_ACK_SECS: u64 = var_or("SUBMISSION_ACK_SECS", 4);
        pub static ref STORE_TIMEOUT_SECS: u64 = var_or("STORE_TIMEOUT_SECS", 10);
        pub static ref ACCESS_TOKEN_EXPIRES_SEC: i64 = var_or("ACCESS_TOKEN_EXPIRES_SEC", 60 * 60);
        pub static ref ADMIN_BOOKINGS_COLLECTION: String = var_or("ADMIN_BOOKINGS_COLLECTION", Collections::BOOKINGS.to_string());
        pub static ref SITE_ADDR: String = var_or("SITE_ADDR", "127.0.0.1:3000".to_string());
    }
}
