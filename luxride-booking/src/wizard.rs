use crate::validation::{self, ValidationReport};
use chrono::{DateTime, NaiveDate, Utc};
use luxride_catalog::{PriceQuote, PricingEngine, PromoOutcome, ServiceKind, Vehicle, VehicleCatalog};
use luxride_core::{BookingDraft, BookingRecord, PersistedDraft, PolicyAcceptance, Step, TripForm};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Availability of the vehicle catalog as seen by the wizard
#[derive(Debug, Clone)]
pub enum CatalogState {
    Loading,
    Ready(Arc<VehicleCatalog>),
    Unavailable(String),
}

/// A vehicle as listed on the selection step
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VehicleOption {
    pub vehicle: Vehicle,
    pub fits_party: bool,
    pub quote: PriceQuote,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Moved { from: Step, to: Step },
    /// Validation failed, nothing changed
    Rejected(ValidationReport),
    /// Review passed. The draft must now go through the confirmation
    /// gateway and the result be reported back.
    SubmitConfirmation(BookingDraft),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Not available on step {current:?}, expected {expected:?}")]
    WrongStep { current: Step, expected: Step },

    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),

    #[error("A booking confirmation is already in progress")]
    SubmissionPending,

    #[error("Booking already confirmed, restart to book again")]
    AlreadyConfirmed,

    #[error("No booking confirmation is in progress")]
    NoSubmissionPending,

    #[error("Vehicle catalog is not available: {0}")]
    CatalogUnavailable(String),
}

/// The four-step booking flow for one session.
///
/// Pure state: no I/O, no timers. The session layer persists snapshots
/// and drives the confirmation call.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: Step,
    form: TripForm,
    draft: BookingDraft,
    catalog: CatalogState,
    pricing: Arc<PricingEngine>,
    submitting: bool,
    confirmed: Option<BookingRecord>,
    /// Vehicle restored from storage before the catalog was available
    pending_vehicle_id: Option<String>,
}

impl BookingWizard {
    pub fn new(pricing: Arc<PricingEngine>) -> Self {
        Self {
            step: Step::TripDetails,
            form: TripForm::default(),
            draft: BookingDraft::default(),
            catalog: CatalogState::Loading,
            pricing,
            submitting: false,
            confirmed: None,
            pending_vehicle_id: None,
        }
    }

    /// Rebuild a wizard from a stored snapshot.
    ///
    /// Stored data is re-validated: a step whose prerequisites no longer
    /// hold is clamped back to the first step that needs input.
    pub fn resume(persisted: PersistedDraft, pricing: Arc<PricingEngine>, today: NaiveDate) -> Self {
        let mut wizard = Self::new(pricing);
        wizard.form = persisted.form;
        wizard.draft.promo_code = persisted.promo_code;
        wizard.draft.policies = persisted.policies;
        wizard.draft.terms_accepted = persisted.terms_accepted;
        wizard.pending_vehicle_id = persisted.vehicle_id;

        // Confirmation is never resumed into; the submission did not finish.
        let mut step = persisted.step.min(Step::Review);

        if step > Step::TripDetails {
            match validation::validate_trip(&wizard.form, today) {
                Ok(trip) => wizard.draft.trip = Some(trip),
                Err(report) => {
                    warn!("Stored trip no longer valid ({} errors), back to trip details", report.errors.len());
                    step = Step::TripDetails;
                }
            }
        }
        if step > Step::VehicleSelection && wizard.pending_vehicle_id.is_none() {
            step = Step::VehicleSelection;
        }

        wizard.step = step;
        info!("Wizard resumed at step {}", step.number());
        wizard
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn form(&self) -> &TripForm {
        &self.form
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The record produced by the last successful confirmation
    pub fn confirmed(&self) -> Option<&BookingRecord> {
        self.confirmed.as_ref()
    }

    pub fn quote(&self) -> Option<&PriceQuote> {
        self.draft.quote.as_ref()
    }

    fn guard_editable(&self, expected: Step) -> Result<(), WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionPending);
        }
        if self.step.is_terminal() {
            return Err(WizardError::AlreadyConfirmed);
        }
        if self.step != expected {
            return Err(WizardError::WrongStep { current: self.step, expected });
        }
        Ok(())
    }

    /// Replace the raw trip inputs. Only on the trip details step.
    pub fn set_trip_form(&mut self, form: TripForm) -> Result<(), WizardError> {
        self.guard_editable(Step::TripDetails)?;
        self.form = form;
        Ok(())
    }

    /// Pre-select the service kind, e.g. from a price estimate
    pub fn prefill_service(&mut self, service: ServiceKind) -> Result<(), WizardError> {
        self.guard_editable(Step::TripDetails)?;
        self.form.service = service.as_str().to_string();
        Ok(())
    }

    /// Validate the current step and move forward.
    ///
    /// `today` bounds the earliest pickup date.
    pub fn advance(&mut self, today: NaiveDate) -> Result<AdvanceOutcome, WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionPending);
        }

        let from = self.step;
        match from {
            Step::TripDetails => {
                let trip = match validation::validate_trip(&self.form, today) {
                    Ok(trip) => trip,
                    Err(report) => return Ok(AdvanceOutcome::Rejected(report)),
                };
                self.draft.trip = Some(trip);
                // The service kind may have changed since the vehicle was priced.
                self.reprice();
            }
            Step::VehicleSelection => {
                if let Err(report) = validation::validate_vehicle(self.draft.vehicle.as_ref()) {
                    return Ok(AdvanceOutcome::Rejected(report));
                }
                self.reprice();
            }
            Step::Review => {
                let mut report = ValidationReport::default();
                if let Err(missing) = validation::validate_vehicle(self.draft.vehicle.as_ref()) {
                    report.errors.extend(missing.errors);
                }
                if let Err(unchecked) = validation::validate_review(&self.draft.policies, self.draft.terms_accepted) {
                    report.errors.extend(unchecked.errors);
                }
                if !report.is_valid() {
                    return Ok(AdvanceOutcome::Rejected(report));
                }

                self.reprice();
                self.submitting = true;
                info!("Booking submitted for confirmation");
                return Ok(AdvanceOutcome::SubmitConfirmation(self.draft.clone()));
            }
            Step::Confirmation => return Err(WizardError::AlreadyConfirmed),
        }

        let to = from.next().ok_or(WizardError::AlreadyConfirmed)?;
        self.step = to;
        info!("Wizard advanced from step {} to step {}", from.number(), to.number());
        Ok(AdvanceOutcome::Moved { from, to })
    }

    /// Go back one step. No validation and nothing is discarded.
    ///
    /// A no-op on the first step and on the terminal confirmation step.
    pub fn retreat(&mut self) -> Result<Step, WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionPending);
        }
        if self.step.is_terminal() {
            return Ok(self.step);
        }
        if let Some(previous) = self.step.previous() {
            debug!("Wizard back from step {} to step {}", self.step.number(), previous.number());
            self.step = previous;
        }
        Ok(self.step)
    }

    pub fn select_vehicle(&mut self, vehicle_id: &str) -> Result<PriceQuote, WizardError> {
        self.guard_editable(Step::VehicleSelection)?;

        let catalog = match &self.catalog {
            CatalogState::Ready(catalog) => Arc::clone(catalog),
            CatalogState::Loading => return Err(WizardError::CatalogUnavailable("still loading".to_string())),
            CatalogState::Unavailable(reason) => return Err(WizardError::CatalogUnavailable(reason.clone())),
        };
        let vehicle = catalog
            .get(vehicle_id)
            .cloned()
            .ok_or_else(|| WizardError::UnknownVehicle(vehicle_id.to_string()))?;

        debug!("Vehicle {} selected", vehicle.id);
        self.draft.vehicle = Some(vehicle);
        self.pending_vehicle_id = None;
        self.reprice();

        self.draft
            .quote
            .clone()
            .ok_or_else(|| WizardError::WrongStep { current: self.step, expected: Step::TripDetails })
    }

    /// Apply or clear a promo code on the review step.
    ///
    /// An unknown code is reported and leaves any earlier code in place.
    /// A blank code removes the current one.
    pub fn apply_promo(&mut self, code: &str) -> Result<PromoOutcome, WizardError> {
        self.guard_editable(Step::Review)?;

        let (trip, vehicle) = match (&self.draft.trip, &self.draft.vehicle) {
            (Some(trip), Some(vehicle)) => (trip, vehicle),
            _ => return Err(WizardError::WrongStep { current: self.step, expected: Step::VehicleSelection }),
        };

        let candidate = self.pricing.compute_price(vehicle, trip.service, Some(code));
        match &candidate.promo {
            PromoOutcome::Invalid { code } => {
                warn!("Rejected promo code {}", code);
            }
            PromoOutcome::Applied { code, percent } => {
                info!("Promo {} applied ({}% off)", code, percent);
                self.draft.promo_code = Some(code.clone());
                self.draft.quote = Some(candidate.clone());
            }
            PromoOutcome::None => {
                self.draft.promo_code = None;
                self.draft.quote = Some(candidate.clone());
            }
        }
        Ok(candidate.promo)
    }

    pub fn set_policies(&mut self, policies: PolicyAcceptance) -> Result<(), WizardError> {
        self.guard_editable(Step::Review)?;
        self.draft.policies = policies;
        Ok(())
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) -> Result<(), WizardError> {
        self.guard_editable(Step::Review)?;
        self.draft.terms_accepted = accepted;
        Ok(())
    }

    /// Every catalog vehicle priced for the current trip, those that fit the
    /// party first. Empty until trip details and the catalog are both in.
    pub fn vehicle_options(&self) -> Vec<VehicleOption> {
        let (catalog, trip) = match (&self.catalog, &self.draft.trip) {
            (CatalogState::Ready(catalog), Some(trip)) => (catalog, trip),
            _ => return Vec::new(),
        };
        let selected_id = self.draft.vehicle.as_ref().map(|v| v.id.as_str());

        catalog
            .ranked_for(trip.passengers, trip.luggage)
            .into_iter()
            .map(|(vehicle, fits_party)| VehicleOption {
                vehicle: vehicle.clone(),
                fits_party,
                quote: self.pricing.compute_price(vehicle, trip.service, self.draft.promo_code.as_deref()),
                selected: selected_id == Some(vehicle.id.as_str()),
            })
            .collect()
    }

    /// The gateway accepted the booking. Moves to the terminal step and
    /// clears the draft.
    pub fn confirm_succeeded(&mut self, record: BookingRecord) -> Result<(), WizardError> {
        if !self.submitting {
            return Err(WizardError::NoSubmissionPending);
        }
        info!("Booking {} confirmed", record.number);

        self.submitting = false;
        self.step = Step::Confirmation;
        self.form = TripForm::default();
        self.draft = BookingDraft::default();
        self.pending_vehicle_id = None;
        self.confirmed = Some(record);
        Ok(())
    }

    /// The gateway failed. Stays on review with everything intact.
    pub fn confirm_failed(&mut self) -> Result<(), WizardError> {
        if !self.submitting {
            return Err(WizardError::NoSubmissionPending);
        }
        warn!("Booking confirmation failed, back on review");
        self.submitting = false;
        self.step = Step::Review;
        Ok(())
    }

    pub fn catalog_loading(&mut self) {
        self.catalog = CatalogState::Loading;
    }

    pub fn catalog_unavailable(&mut self, reason: impl Into<String>) {
        self.catalog = CatalogState::Unavailable(reason.into());
    }

    /// Install the loaded catalog and resolve any vehicle restored from
    /// storage. A stored vehicle that no longer exists is dropped.
    pub fn attach_catalog(&mut self, catalog: Arc<VehicleCatalog>) {
        if let Some(vehicle_id) = self.pending_vehicle_id.take() {
            match catalog.get(&vehicle_id) {
                Some(vehicle) => {
                    self.draft.vehicle = Some(vehicle.clone());
                }
                None => {
                    warn!("Stored vehicle {} is no longer offered", vehicle_id);
                    self.draft.vehicle = None;
                    if self.step > Step::VehicleSelection {
                        self.step = Step::VehicleSelection;
                    }
                }
            }
        }
        self.catalog = CatalogState::Ready(catalog);
        self.reprice();
    }

    /// Snapshot for the draft store
    pub fn to_persisted(&self, saved_at: DateTime<Utc>) -> PersistedDraft {
        PersistedDraft {
            step: self.step,
            form: self.form.clone(),
            vehicle_id: self
                .draft
                .vehicle
                .as_ref()
                .map(|v| v.id.clone())
                .or_else(|| self.pending_vehicle_id.clone()),
            promo_code: self.draft.promo_code.clone(),
            policies: self.draft.policies,
            terms_accepted: self.draft.terms_accepted,
            saved_at,
        }
    }

    /// Start a fresh booking, keeping the catalog and pricing
    pub fn restart(&mut self) -> Result<(), WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionPending);
        }
        self.step = Step::TripDetails;
        self.form = TripForm::default();
        self.draft = BookingDraft::default();
        self.pending_vehicle_id = None;
        self.confirmed = None;
        Ok(())
    }

    // Always from the vehicle's own subtotal, so discounts never compound.
    fn reprice(&mut self) {
        self.draft.quote = match (&self.draft.trip, &self.draft.vehicle) {
            (Some(trip), Some(vehicle)) => {
                let quote = self.pricing.compute_price(vehicle, trip.service, self.draft.promo_code.as_deref());
                if quote.invalid_code() {
                    // Stored code no longer configured
                    self.draft.promo_code = None;
                }
                Some(quote)
            }
            _ => None,
        };
    }
}
