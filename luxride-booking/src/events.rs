use crate::validation::{Field, ValidationReport};
use crate::wizard::VehicleOption;
use luxride_catalog::{PriceEstimate, PriceQuote};
use luxride_core::{BookingRecord, PolicyAcceptance, Step, TripForm};
use luxride_shared::{BookingConfirmedEvent, RideStatusEvent};
use serde::Serialize;

/// Everything a customer can do to a booking session
#[derive(Debug, Clone)]
pub enum WizardCommand {
    EditTrip(TripForm),
    PrefillFromEstimate(PriceEstimate),
    SelectVehicle(String),
    ApplyPromo(String),
    SetPolicies(PolicyAcceptance),
    AcceptTerms(bool),
    Advance,
    Retreat,
    RetryCatalog,
    SuggestAddress { field: Field, query: String },
    Restart,
    Leave,
}

/// What a session reports back to its listeners
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    StepChanged { from: Step, to: Step },
    ValidationFailed(ValidationReport),
    VehiclesListed { options: Vec<VehicleOption> },
    CatalogLoading,
    CatalogUnavailable { reason: String },
    QuoteUpdated(PriceQuote),
    PromoRejected { code: String },
    ConfirmationPending,
    ConfirmationFailed { message: String },
    Confirmed { record: BookingRecord, summary: BookingConfirmedEvent },
    RideStatus(RideStatusEvent),
    Suggestions { field: Field, query: String, addresses: Vec<String> },
    /// A command was refused in the current state
    Blocked { reason: String },
}
