use garde::Validate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use common_types::Collections;
use super::{FieldError, FormFields};

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile EMAIL_PATTERN");
}

#[derive(Serialize, Deserialize, Validate, Default, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ContactMessage {
    #[garde(custom(name_is_long_enough))]
    pub name: String,
    #[garde(custom(email_is_well_formed))]
    pub email: String,
    #[garde(custom(subject_is_present))]
    pub subject: String,
    #[garde(custom(message_is_long_enough))]
    pub message: String,
}

fn name_is_long_enough(value: &String, _: &()) -> garde::Result {
    if value.trim().is_empty() || value.chars().count() < 2 {
        return Err(garde::Error::new("Name must be at least 2 characters."));
    }
    Ok(())
}

fn email_is_well_formed(value: &String, _: &()) -> garde::Result {
    if value.trim().is_empty() || !EMAIL_PATTERN.is_match(value) {
        return Err(garde::Error::new("Please enter a valid email address."));
    }
    Ok(())
}

fn subject_is_present(value: &String, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("Subject is required."));
    }
    Ok(())
}

fn message_is_long_enough(value: &String, _: &()) -> garde::Result {
    if value.trim().is_empty() || value.chars().count() < 10 {
        return Err(garde::Error::new("Message must be at least 10 characters."));
    }
    Ok(())
}

impl FormFields for ContactMessage {
    const COLLECTION: &'static str = Collections::MESSAGES;

    fn set_field(&mut self, name: &str, value: String) -> Result<(), FieldError> {
        match name {
            "name" => self.name = value,
            "email" => self.email = value,
            "subject" => self.subject = value,
            "message" => self.message = value,
            _ => return Err(FieldError::UnknownField(name.to_string())),
        }
        Ok(())
    }

    fn submitter(&self) -> &str {
        &self.email
    }
}
