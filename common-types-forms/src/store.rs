use ::std::fmt;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::{
    pooled_connection::deadpool::Pool as PostgresPool,
    AsyncPgConnection,
    RunQueryDsl,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Schema::records;

pub type Document = Map<String, Value>;

/// A document about to be appended. `server_timestamp_field` names the field
/// the store fills with its own creation time; callers never supply it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub document: Document,
    pub server_timestamp_field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub collection: String,
    pub fields: Document,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
}

impl StoredRecord {
    /// Assembles a stored record, writing `created_at` into the document under
    /// `timestamp_field` so readers see it like any other field.
    pub fn from_parts(id: i64, collection: String, mut fields: Document, timestamp_field: &str, created_at: NaiveDateTime) -> Self {
        fields.insert(
            timestamp_field.to_string(),
            Value::String(created_at.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
        );
        Self {
            id,
            collection,
            fields,
            created_at,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to obtain a store connection: {0}")]
    Connection(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("store rejected the write: {0}")]
    Rejected(String),
}

/// The hosted document store behind the forms and the admin dashboard.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn append(&self, collection: &str, record: NewRecord) -> Result<StoredRecord, StoreError>;
    async fn list_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError>;
}

#[derive(Insertable)]
#[diesel(table_name = records)]
struct InsertableRecord<'a> {
    collection: &'a str,
    document: Value,
    timestampfield: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = records)]
struct RecordRow {
    id: i64,
    collection: String,
    document: Value,
    timestampfield: String,
    createdat: NaiveDateTime,
}

impl TryFrom<RecordRow> for StoredRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let Value::Object(fields) = row.document else {
            return Err(StoreError::Query(format!("record {} does not hold a JSON object", row.id)));
        };
        Ok(StoredRecord::from_parts(row.id, row.collection, fields, &row.timestampfield, row.createdat))
    }
}

fn map_diesel_error(err: diesel::result::Error) -> StoreError {
    match err {
        diesel::result::Error::DatabaseError(kind, info) => {
            StoreError::Rejected(format!("{:?}: {}", kind, info.message()))
        },
        err => StoreError::Query(err.to_string()),
    }
}

/// Record store backed by the `records` table.
pub struct PostgresStore {
    pool: PostgresPool<AsyncPgConnection>,
}

impl PostgresStore {
    pub fn new(pool: PostgresPool<AsyncPgConnection>) -> Self {
        Self { pool }
    }
}

impl fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PostgresStore").field("pool", &self.pool.status()).finish()
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    #[tracing::instrument(skip(self, record))]
    async fn append(&self, collection: &str, record: NewRecord) -> Result<StoredRecord, StoreError> {
        let mut conn = self.pool.get().await.map_err(|err| {
            tracing::error!("Failed to fetch Postgres connection, {err}");
            StoreError::Connection(err.to_string())
        })?;
        let row = diesel::insert_into(records::table)
            .values(&InsertableRecord {
                collection,
                document: Value::Object(record.document),
                timestampfield: record.server_timestamp_field,
            })
            .returning(RecordRow::as_returning())
            .get_result::<RecordRow>(&mut conn)
            .await
            .map_err(|err| {
                tracing::error!("Failed to insert record, {err}");
                map_diesel_error(err)
            })?;
        StoredRecord::try_from(row)
    }

    #[tracing::instrument(skip(self))]
    async fn list_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let mut conn = self.pool.get().await.map_err(|err| {
            tracing::error!("Failed to fetch Postgres connection, {err}");
            StoreError::Connection(err.to_string())
        })?;
        let rows = records::table
            .filter(records::collection.eq(collection))
            .order(records::id.asc())
            .select(RecordRow::as_select())
            .load::<RecordRow>(&mut conn)
            .await
            .map_err(|err| {
                tracing::error!("Failed to list collection, {err}");
                map_diesel_error(err)
            })?;
        rows.into_iter().map(StoredRecord::try_from).collect()
    }
}
