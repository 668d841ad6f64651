use ::std::sync::Arc;
use ::std::time::Duration;
use serde_json::Value;
use thiserror::Error;

use common_types::Collections::SERVER_TIMESTAMP_FIELD;
use crate::{
    Forms::{validate, ErrorMap, FormFields, FormState},
    Store::{NewRecord, RecordStore, StoreError, StoredRecord},
};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("record store did not answer within {0:?}")]
    TimedOut(Duration),
    #[error("failed to encode the record, {0}")]
    Encoding(String),
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Validation failed; nothing was sent to the store.
    Rejected(ErrorMap),
    /// A previous submission of this form is still persisting.
    Busy,
    Succeeded(StoredRecord),
    /// The store write failed; the form keeps its values for a retry.
    Failed(PersistenceError),
}

/// A validated record waiting to be written. The form it came from stays
/// pending until the result is handed back through [`Pipeline::complete`].
#[derive(Debug)]
pub struct PendingSubmission {
    collection: &'static str,
    record: NewRecord,
}

impl PendingSubmission {
    pub fn collection(&self) -> &'static str {
        self.collection
    }
}

#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    store_timeout: Duration,
    acknowledgment: Duration,
}

impl Pipeline {
    pub fn new(store: Arc<dyn RecordStore>, store_timeout: Duration, acknowledgment: Duration) -> Self {
        Self {
            store,
            store_timeout,
            acknowledgment,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn acknowledgment(&self) -> Duration {
        self.acknowledgment
    }

    /// Validates and submits the form, then updates it with the outcome.
    #[tracing::instrument(skip(self, form), fields(collection = F::COLLECTION))]
    pub async fn submit<F: FormFields>(&self, form: &mut FormState<F>) -> SubmissionOutcome {
        let pending = match self.prepare(form) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = self.persist(pending).await;
        self.complete(form, result)
    }

    /// Runs validation and builds the record. On success the form is marked
    /// pending, so a second submit reports `Busy` until [`Pipeline::complete`].
    pub fn prepare<F: FormFields>(&self, form: &mut FormState<F>) -> Result<PendingSubmission, SubmissionOutcome> {
        if form.is_pending() {
            tracing::warn!("Submission ignored, a previous one is still persisting");
            return Err(SubmissionOutcome::Busy);
        }

        let errors = validate(form.fields());
        form.set_errors(errors.clone());
        if !errors.is_empty() {
            tracing::info!("Validation rejected {} field(s)", errors.len());
            return Err(SubmissionOutcome::Rejected(errors));
        }

        let document = match serde_json::to_value(form.fields()) {
            Ok(Value::Object(document)) => document,
            Ok(_) => {
                tracing::error!("Form fields did not serialize to an object");
                return Err(SubmissionOutcome::Failed(PersistenceError::Encoding("fields are not an object".to_string())));
            },
            Err(err) => {
                tracing::error!("Failed to serialize form fields, {err}");
                return Err(SubmissionOutcome::Failed(PersistenceError::Encoding(err.to_string())));
            },
        };

        form.set_pending(true);
        Ok(PendingSubmission {
            collection: F::COLLECTION,
            record: NewRecord {
                document,
                server_timestamp_field: SERVER_TIMESTAMP_FIELD,
            },
        })
    }

    /// Appends the record, bounded by the store timeout. Never retries.
    pub async fn persist(&self, pending: PendingSubmission) -> Result<StoredRecord, PersistenceError> {
        let append = self.store.append(pending.collection, pending.record);
        match tokio::time::timeout(self.store_timeout, append).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PersistenceError::TimedOut(self.store_timeout)),
        }
    }

    pub fn complete<F: FormFields>(&self, form: &mut FormState<F>, result: Result<StoredRecord, PersistenceError>) -> SubmissionOutcome {
        form.set_pending(false);
        match result {
            Ok(record) => {
                tracing::info!(id = record.id, "Record stored");
                form.set_errors(ErrorMap::new());
                form.reset();
                form.acknowledge_for(self.acknowledgment);
                SubmissionOutcome::Succeeded(record)
            },
            Err(err) => {
                tracing::error!("Failed to store submission, {err}");
                form.clear_acknowledgment();
                SubmissionOutcome::Failed(err)
            },
        }
    }
}
