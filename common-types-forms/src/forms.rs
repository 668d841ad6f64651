use ::std::collections::BTreeMap;
use ::std::fmt::Debug;
use ::std::time::Duration;
use garde::Validate;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

mod contact;
mod consultation;

pub use contact::ContactMessage;
pub use consultation::ConsultationBooking;

/// Field name to error message. Absent means the field passed.
pub type ErrorMap = BTreeMap<String, String>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FieldError {
    #[error("'{0}' is not a field of this form")]
    UnknownField(String),
    #[error("{0}")]
    InvalidChoice(String),
}

/// The values of one form, plus where a successful submission is stored.
pub trait FormFields: Validate<Context = ()> + Serialize + Default + Clone + Debug + Send + Sync {
    const COLLECTION: &'static str;

    fn set_field(&mut self, name: &str, value: String) -> Result<(), FieldError>;

    /// Identifies who is submitting, used to spot duplicate submissions.
    fn submitter(&self) -> &str;
}

/// Checks every field and reports every failure, never stopping at the first.
pub fn validate<F: FormFields>(fields: &F) -> ErrorMap {
    let mut errors = ErrorMap::new();
    if let Err(report) = fields.validate(&()) {
        for (path, error) in report.iter() {
            errors.entry(path.to_string())
                .or_insert_with(|| error.message().to_string());
        }
    }
    errors
}

/// Current state of one form instance: values, the errors of the last
/// validation pass, and the transient "submitted" acknowledgment.
#[derive(Debug, Clone)]
pub struct FormState<F: FormFields> {
    fields: F,
    errors: ErrorMap,
    acknowledged_until: Option<Instant>,
    pending: bool,
}

impl<F: FormFields> Default for FormState<F> {
    fn default() -> Self {
        Self::with_fields(F::default())
    }
}

impl<F: FormFields> FormState<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(fields: F) -> Self {
        Self {
            fields,
            errors: ErrorMap::new(),
            acknowledged_until: None,
            pending: false,
        }
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    // Errors are left alone; they are only recomputed on the next submit.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), FieldError> {
        self.fields.set_field(name, value.into())
    }

    pub fn reset(&mut self) {
        self.fields = F::default();
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self.acknowledged_until, Some(deadline) if Instant::now() < deadline)
    }

    pub fn acknowledgment_deadline(&self) -> Option<Instant> {
        self.acknowledged_until.filter(|deadline| Instant::now() < *deadline)
    }

    /// Raises the acknowledgment; it clears itself once `duration` elapses.
    pub fn acknowledge_for(&mut self, duration: Duration) {
        self.acknowledged_until = Some(Instant::now() + duration);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn set_errors(&mut self, errors: ErrorMap) {
        self.errors = errors;
    }

    pub(crate) fn clear_acknowledgment(&mut self) {
        self.acknowledged_until = None;
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }
}
