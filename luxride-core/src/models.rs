use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use luxride_catalog::{PriceQuote, ServiceKind, Vehicle};
use luxride_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Wizard steps, in the only order they can be visited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    TripDetails,
    VehicleSelection,
    Review,
    Confirmation,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::TripDetails,
        Step::VehicleSelection,
        Step::Review,
        Step::Confirmation,
    ];

    /// 1-based position, as shown in the progress bar
    pub fn number(&self) -> u8 {
        match self {
            Step::TripDetails => 1,
            Step::VehicleSelection => 2,
            Step::Review => 3,
            Step::Confirmation => 4,
        }
    }

    pub fn next(&self) -> Option<Step> {
        match self {
            Step::TripDetails => Some(Step::VehicleSelection),
            Step::VehicleSelection => Some(Step::Review),
            Step::Review => Some(Step::Confirmation),
            Step::Confirmation => None,
        }
    }

    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::TripDetails => None,
            Step::VehicleSelection => Some(Step::TripDetails),
            Step::Review => Some(Step::VehicleSelection),
            Step::Confirmation => Some(Step::Review),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Confirmation)
    }
}

/// Raw trip inputs exactly as typed, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TripForm {
    pub pickup: String,
    pub dropoff: String,
    pub date: String,
    pub time: String,
    pub passengers: String,
    pub luggage: String,
    pub service: String,
}

/// Validated trip details captured on the first step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripRequest {
    pub pickup: String,
    pub dropoff: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub passengers: u32,
    pub luggage: u32,
    pub service: ServiceKind,
}

/// The three policy checkboxes on the review step
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyAcceptance {
    pub privacy: bool,
    pub terms_of_use: bool,
    pub cancellation: bool,
}

impl PolicyAcceptance {
    pub fn all() -> Self {
        Self { privacy: true, terms_of_use: true, cancellation: true }
    }

    pub fn all_accepted(&self) -> bool {
        self.privacy && self.terms_of_use && self.cancellation
    }
}

/// The booking being assembled in the current session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    pub trip: Option<TripRequest>,
    pub vehicle: Option<Vehicle>,
    pub promo_code: Option<String>,
    pub quote: Option<PriceQuote>,
    pub policies: PolicyAcceptance,
    pub terms_accepted: bool,
}

impl BookingDraft {
    pub fn subtotal_cents(&self) -> Option<i64> {
        self.quote.as_ref().map(|q| q.subtotal_cents)
    }

    pub fn total_cents(&self) -> Option<i64> {
        self.quote.as_ref().map(|q| q.total_cents)
    }

    pub fn is_empty(&self) -> bool {
        self.trip.is_none() && self.vehicle.is_none() && self.promo_code.is_none()
    }
}

/// Session-scoped snapshot of the wizard, written at every checkpoint.
///
/// Unknown fields are rejected so a stale or tampered record cannot be
/// silently absorbed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PersistedDraft {
    pub step: Step,
    #[serde(default)]
    pub form: TripForm,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub policies: PolicyAcceptance,
    #[serde(default)]
    pub terms_accepted: bool,
    pub saved_at: DateTime<Utc>,
}

/// Booking reference shown to the customer, `LUX-<token>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingNumber(String);

impl BookingNumber {
    pub const PREFIX: &'static str = "LUX";

    /// New number with a random 10 character token
    pub fn generate() -> Self {
        let token = Uuid::new_v4().simple().to_string()[..10].to_ascii_uppercase();
        Self(format!("{}-{}", Self::PREFIX, token))
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        let (prefix, token) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| CoreError::ValidationError(format!("Malformed booking number: {}", value)))?;

        let token_ok = !token.is_empty()
            && token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

        if prefix != Self::PREFIX || !token_ok {
            return Err(CoreError::ValidationError(format!("Malformed booking number: {}", value)));
        }

        Ok(Self(format!("{}-{}", prefix, token)))
    }

    pub fn token(&self) -> &str {
        &self.0[Self::PREFIX.len() + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BookingNumber {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookingNumber> for String {
    fn from(number: BookingNumber) -> Self {
        number.0
    }
}

/// Immutable snapshot written to the booking history on confirmation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRecord {
    pub number: BookingNumber,
    pub trip: TripRequest,
    pub vehicle: Vehicle,
    pub promo_code: Option<String>,
    pub quote: PriceQuote,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Freeze a draft. Fails unless every step's requirements are met.
    pub fn from_draft(number: BookingNumber, draft: &BookingDraft) -> CoreResult<Self> {
        let incomplete = |what: &str| CoreError::ValidationError(format!("Draft is missing {}", what));

        let trip = draft.trip.clone().ok_or_else(|| incomplete("trip details"))?;
        let vehicle = draft.vehicle.clone().ok_or_else(|| incomplete("a vehicle"))?;
        let quote = draft.quote.clone().ok_or_else(|| incomplete("a price"))?;

        if !draft.policies.all_accepted() {
            return Err(incomplete("policy acceptance"));
        }
        if !draft.terms_accepted {
            return Err(incomplete("terms acceptance"));
        }

        Ok(Self {
            number,
            trip,
            vehicle,
            promo_code: draft.promo_code.clone(),
            quote,
            created_at: Utc::now(),
        })
    }

    pub fn total_cents(&self) -> i64 {
        self.quote.total_cents
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { email: true, sms: false, push: false }
    }
}

/// Customer profile shown next to the booking history
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub preferred_pickup: Option<String>,
    pub notifications: NotificationSettings,
}
