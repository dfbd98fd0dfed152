use chrono::{NaiveDate, NaiveTime};
use luxride_catalog::{ServiceKind, Vehicle};
use luxride_core::{PolicyAcceptance, TripForm, TripRequest};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REQUIRED: &str = "This field is required";

/// Inputs that can carry a validation message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Pickup,
    Dropoff,
    Date,
    Time,
    Passengers,
    Luggage,
    Service,
    Vehicle,
    AcceptPrivacy,
    AcceptTermsOfUse,
    AcceptCancellation,
    AcceptTerms,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Pickup => "pickup",
            Field::Dropoff => "dropoff",
            Field::Date => "date",
            Field::Time => "time",
            Field::Passengers => "passengers",
            Field::Luggage => "luggage",
            Field::Service => "service",
            Field::Vehicle => "vehicle",
            Field::AcceptPrivacy => "accept_privacy",
            Field::AcceptTermsOfUse => "accept_terms_of_use",
            Field::AcceptCancellation => "accept_cancellation",
            Field::AcceptTerms => "accept_terms",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every problem found on a step, in form order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn fields(&self) -> Vec<Field> {
        self.errors.iter().map(|e| e.field).collect()
    }

    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationReport> {
        if self.is_valid() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Returns the trimmed value, or records "required" against the field
fn required<'a>(report: &mut ValidationReport, field: Field, raw: &'a str) -> Option<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        report.push(field, REQUIRED);
        None
    } else {
        Some(value)
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Step 1. `today` is the earliest acceptable pickup date.
pub fn validate_trip(form: &TripForm, today: NaiveDate) -> Result<TripRequest, ValidationReport> {
    let mut report = ValidationReport::default();

    let pickup = required(&mut report, Field::Pickup, &form.pickup);
    let dropoff = required(&mut report, Field::Dropoff, &form.dropoff);

    let date = required(&mut report, Field::Date, &form.date).and_then(|raw| {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) if date < today => {
                report.push(Field::Date, "Pickup date cannot be in the past");
                None
            }
            Ok(date) => Some(date),
            Err(_) => {
                report.push(Field::Date, "Enter a valid date (YYYY-MM-DD)");
                None
            }
        }
    });

    let time = required(&mut report, Field::Time, &form.time).and_then(|raw| {
        let parsed = parse_time(raw);
        if parsed.is_none() {
            report.push(Field::Time, "Enter a valid time (HH:MM)");
        }
        parsed
    });

    let passengers = required(&mut report, Field::Passengers, &form.passengers).and_then(|raw| {
        match raw.parse::<u32>() {
            Ok(n) if n >= 1 => Some(n),
            _ => {
                report.push(Field::Passengers, "At least one passenger is required");
                None
            }
        }
    });

    let luggage = required(&mut report, Field::Luggage, &form.luggage).and_then(|raw| {
        let parsed = raw.parse::<u32>().ok();
        if parsed.is_none() {
            report.push(Field::Luggage, "Luggage must be zero or more pieces");
        }
        parsed
    });

    let service = required(&mut report, Field::Service, &form.service).and_then(|raw| {
        match raw.parse::<ServiceKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                report.push(Field::Service, e.to_string());
                None
            }
        }
    });

    match (pickup, dropoff, date, time, passengers, luggage, service) {
        (Some(pickup), Some(dropoff), Some(date), Some(time), Some(passengers), Some(luggage), Some(service))
            if report.is_valid() =>
        {
            Ok(TripRequest {
                pickup: pickup.to_string(),
                dropoff: dropoff.to_string(),
                date,
                time,
                passengers,
                luggage,
                service,
            })
        }
        _ => Err(report),
    }
}

/// Step 2
pub fn validate_vehicle(selected: Option<&Vehicle>) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::default();
    if selected.is_none() {
        report.push(Field::Vehicle, "Please select a vehicle");
    }
    report.into_result(|| ())
}

/// Step 3 policy checkboxes, checked before leaving the review step
pub fn validate_policies(policies: &PolicyAcceptance) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::default();
    if !policies.privacy {
        report.push(Field::AcceptPrivacy, REQUIRED);
    }
    if !policies.terms_of_use {
        report.push(Field::AcceptTermsOfUse, REQUIRED);
    }
    if !policies.cancellation {
        report.push(Field::AcceptCancellation, REQUIRED);
    }
    report.into_result(|| ())
}

/// The overall terms box gating the confirmation submission
pub fn validate_terms(accepted: bool) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::default();
    if !accepted {
        report.push(Field::AcceptTerms, "You must accept the terms to confirm your booking");
    }
    report.into_result(|| ())
}

/// Both review-step checks, reported together
pub fn validate_review(policies: &PolicyAcceptance, terms_accepted: bool) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::default();
    if let Err(policy_errors) = validate_policies(policies) {
        report.errors.extend(policy_errors.errors);
    }
    if let Err(terms_errors) = validate_terms(terms_accepted) {
        report.errors.extend(terms_errors.errors);
    }
    report.into_result(|| ())
}
