use chrono::{NaiveDate, NaiveTime};
use garde::Validate;
use serde::{Deserialize, Serialize};

use common_types::{
    Collections,
    Consultation::{Mode, Service},
};
use super::{FieldError, FormFields};

#[derive(Serialize, Deserialize, Validate, Default, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ConsultationBooking {
    #[garde(custom(name_is_present))]
    pub name: String,
    #[garde(custom(email_is_present))]
    pub email: String,
    #[garde(custom(phone_is_present))]
    pub phone: String,
    #[garde(custom(service_is_offered))]
    pub service: String,
    #[garde(custom(date_is_chosen))]
    pub date: String,
    #[garde(custom(time_is_chosen))]
    pub time: String,
    #[garde(skip)]
    pub mode: Mode,
    #[garde(skip)]
    pub message: String,
}

fn required(value: &str, message: &'static str) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new(message));
    }
    Ok(())
}

fn name_is_present(value: &String, _: &()) -> garde::Result {
    required(value, "Name is required.")
}

fn email_is_present(value: &String, _: &()) -> garde::Result {
    required(value, "Email is required.")
}

fn phone_is_present(value: &String, _: &()) -> garde::Result {
    required(value, "Phone number is required.")
}

fn service_is_offered(value: &String, _: &()) -> garde::Result {
    required(value, "Please select a service.")?;
    if value.trim().parse::<Service>().is_err() {
        return Err(garde::Error::new("Please select a valid service."));
    }
    Ok(())
}

fn date_is_chosen(value: &String, _: &()) -> garde::Result {
    required(value, "Please choose a date.")?;
    if NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_err() {
        return Err(garde::Error::new("Please enter a valid date."));
    }
    Ok(())
}

fn time_is_chosen(value: &String, _: &()) -> garde::Result {
    required(value, "Please choose a time.")?;
    let value = value.trim();
    if NaiveTime::parse_from_str(value, "%H:%M").is_err() && NaiveTime::parse_from_str(value, "%H:%M:%S").is_err() {
        return Err(garde::Error::new("Please enter a valid time."));
    }
    Ok(())
}

impl FormFields for ConsultationBooking {
    const COLLECTION: &'static str = Collections::CONSULTATIONS;

    fn set_field(&mut self, name: &str, value: String) -> Result<(), FieldError> {
        match name {
            "name" => self.name = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "service" => self.service = value,
            "date" => self.date = value,
            "time" => self.time = value,
            "mode" => self.mode = value.parse().map_err(FieldError::InvalidChoice)?,
            "message" => self.message = value,
            _ => return Err(FieldError::UnknownField(name.to_string())),
        }
        Ok(())
    }

    fn submitter(&self) -> &str {
        &self.email
    }
}
