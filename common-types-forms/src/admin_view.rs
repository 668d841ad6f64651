use ::std::time::Duration;
use serde::Serialize;
use serde_json::Value;

use common_types::Collections;
use crate::Store::{RecordStore, StoredRecord};

/// Which collections the dashboard lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCollections {
    pub messages: String,
    pub bookings: String,
}

impl Default for AdminCollections {
    fn default() -> Self {
        Self {
            messages: Collections::MESSAGES.to_string(),
            bookings: Collections::BOOKINGS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CollectionView {
    Loaded { rows: Vec<StoredRecord> },
    Failed { reason: String },
}

impl CollectionView {
    pub fn rows(&self) -> Option<&[StoredRecord]> {
        match self {
            CollectionView::Loaded { rows } => Some(rows),
            CollectionView::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminView {
    pub messages: CollectionView,
    pub bookings: CollectionView,
}

const MESSAGE_COLUMNS: [(&str, &str); 5] = [
    ("Name", "name"),
    ("Email", "email"),
    ("Subject", "subject"),
    ("Message", "message"),
    ("Received", "timestamp"),
];

const BOOKING_COLUMNS: [(&str, &str); 9] = [
    ("Name", "name"),
    ("Email", "email"),
    ("Phone", "phone"),
    ("Service", "service"),
    ("Date", "date"),
    ("Time", "time"),
    ("Mode", "mode"),
    ("Message", "message"),
    ("Received", "timestamp"),
];

#[tracing::instrument(skip(store, timeout))]
async fn load_collection(store: &dyn RecordStore, collection: &str, timeout: Duration) -> CollectionView {
    match tokio::time::timeout(timeout, store.list_all(collection)).await {
        Ok(Ok(rows)) => {
            tracing::info!("Loaded {} record(s)", rows.len());
            CollectionView::Loaded { rows }
        },
        Ok(Err(err)) => {
            tracing::error!("Failed to list collection, {err}");
            CollectionView::Failed { reason: err.to_string() }
        },
        Err(_) => {
            tracing::error!("Listing collection timed out after {timeout:?}");
            CollectionView::Failed { reason: format!("timed out after {timeout:?}") }
        },
    }
}

impl AdminView {
    /// One list-all per collection, issued together. A failure in one
    /// collection does not affect the other.
    pub async fn load(store: &dyn RecordStore, collections: &AdminCollections, timeout: Duration) -> Self {
        let (messages, bookings) = futures_util::join!(
            load_collection(store, &collections.messages, timeout),
            load_collection(store, &collections.bookings, timeout),
        );
        Self { messages, bookings }
    }

    pub fn render_html(&self) -> String {
        let mut html = String::new();
        render_table(&mut html, "Contact Messages", "messages", &MESSAGE_COLUMNS, &self.messages);
        render_table(&mut html, "Consultation Bookings", "bookings", &BOOKING_COLUMNS, &self.bookings);
        html
    }
}

fn cell(record: &StoredRecord, field: &str) -> String {
    match record.fields.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(value)) => ammonia::clean_text(value),
        Some(value) => ammonia::clean_text(&value.to_string()),
    }
}

fn render_table(html: &mut String, title: &str, noun: &str, columns: &[(&str, &str)], view: &CollectionView) {
    html.push_str(&format!("<section><h2>{title}</h2><table><thead><tr>"));
    for (heading, _) in columns {
        html.push_str(&format!("<th>{heading}</th>"));
    }
    html.push_str("</tr></thead><tbody>");
    match view {
        CollectionView::Failed { .. } => {
            html.push_str(&format!(r#"<tr><td colspan="{}">Failed to load {noun}.</td></tr>"#, columns.len()));
        },
        CollectionView::Loaded { rows } if rows.is_empty() => {
            html.push_str(&format!(r#"<tr><td colspan="{}">No {noun} yet.</td></tr>"#, columns.len()));
        },
        CollectionView::Loaded { rows } => {
            for record in rows {
                html.push_str("<tr>");
                for (_, field) in columns {
                    html.push_str(&format!("<td>{}</td>", cell(record, field)));
                }
                html.push_str("</tr>");
            }
        },
    }
    html.push_str("</tbody></table></section>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use crate::Store::{Document, NewRecord, StoreError};

    struct ScriptedStore;

    fn record(collection: &str, name: &str) -> StoredRecord {
        let mut fields = Document::new();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        fields.insert("email".to_string(), Value::String("someone@example.com".to_string()));
        let created_at = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        StoredRecord::from_parts(1, collection.to_string(), fields, "timestamp", created_at)
    }

    #[async_trait]
    impl RecordStore for ScriptedStore {
        async fn append(&self, _: &str, _: NewRecord) -> Result<StoredRecord, StoreError> {
            Err(StoreError::Rejected("read only".to_string()))
        }

        async fn list_all(&self, collection: &str) -> Result<Vec<StoredRecord>, StoreError> {
            match collection {
                "messages" => Ok(vec![record("messages", "<b>Jo</b>")]),
                "bookings" => Ok(Vec::new()),
                "slow" => {
                    ::std::future::pending::<()>().await;
                    Ok(Vec::new())
                },
                _ => Err(StoreError::Connection("unreachable".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn each_collection_is_loaded_independently() {
        let collections = AdminCollections {
            messages: "messages".to_string(),
            bookings: "consultations".to_string(),
        };
        let view = AdminView::load(&ScriptedStore, &collections, Duration::from_secs(5)).await;

        assert_eq!(view.messages.rows().map(<[StoredRecord]>::len), Some(1));
        assert!(matches!(view.bookings, CollectionView::Failed { .. }));
    }

    #[tokio::test]
    async fn empty_and_failed_collections_render_distinct_placeholders() {
        let view = AdminView::load(&ScriptedStore, &AdminCollections::default(), Duration::from_secs(5)).await;
        assert_eq!(view.bookings, CollectionView::Loaded { rows: Vec::new() });
        let html = view.render_html();
        assert!(html.contains("No bookings yet."));

        let failed = AdminView {
            messages: CollectionView::Failed { reason: "unreachable".to_string() },
            bookings: CollectionView::Loaded { rows: Vec::new() },
        };
        assert!(failed.render_html().contains("Failed to load messages."));
    }

    #[tokio::test]
    async fn cells_are_escaped() {
        let view = AdminView::load(&ScriptedStore, &AdminCollections::default(), Duration::from_secs(5)).await;
        let html = view.render_html();
        assert!(!html.contains("<b>Jo</b>"));
        assert!(html.contains("&lt;b&gt;Jo"));
    }

    #[test]
    fn loaded_rows_render_one_cell_per_column() {
        let view = AdminView {
            messages: CollectionView::Loaded { rows: vec![record("messages", "Jo")] },
            bookings: CollectionView::Failed { reason: "down".to_string() },
        };
        let html = view.render_html();

        assert_eq!(html.matches("<th>").count(), MESSAGE_COLUMNS.len() + BOOKING_COLUMNS.len());
        assert_eq!(html.matches("<td>").count(), MESSAGE_COLUMNS.len());
        assert!(html.contains("<td>Jo</td>"));
        assert!(html.contains(&format!(r#"<td colspan="{}">Failed to load bookings.</td>"#, BOOKING_COLUMNS.len())));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_listing_is_reported_as_failed() {
        let collections = AdminCollections {
            messages: "slow".to_string(),
            bookings: "bookings".to_string(),
        };
        let view = AdminView::load(&ScriptedStore, &collections, Duration::from_secs(3)).await;
        assert!(matches!(view.messages, CollectionView::Failed { .. }));
        assert!(view.bookings.rows().is_some());
    }

    #[test]
    fn collection_view_serializes_with_a_status_tag() {
        let json = serde_json::to_value(CollectionView::Failed { reason: "down".to_string() }).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "failed", "reason": "down" }));
    }
}
