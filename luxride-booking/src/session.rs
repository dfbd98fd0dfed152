use crate::autocomplete::{AddressBook, Debouncer};
use crate::confirmation::{ConfirmationError, ConfirmationService, SimulatedGateway};
use crate::events::{WizardCommand, WizardEvent};
use crate::ticker::StatusTicker;
use crate::validation::Field;
use crate::wizard::{AdvanceOutcome, BookingWizard, CatalogState, WizardError};
use chrono::{Local, NaiveDate, Utc};
use luxride_catalog::{
    format_cents, load_with_retry, CatalogSource, EmbeddedCatalog, FileCatalog, PricingEngine, PromoOutcome,
};
use luxride_core::{
    BookingHistoryRepository, BookingRecord, ConfirmationGateway, CoreError, DraftRepository, Notifier,
    ProfileRepository, Severity, Step,
};
use luxride_shared::BookingConfirmedEvent;
use luxride_store::{Config, Repositories, WizardConfig};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Session {0} is closed")]
    Closed(String),
}

/// Collaborators a session needs. Shared between sessions.
#[derive(Clone)]
pub struct SessionDeps {
    pub drafts: Arc<dyn DraftRepository>,
    pub history: Arc<dyn BookingHistoryRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub catalog_source: Arc<dyn CatalogSource>,
    pub notifier: Arc<dyn Notifier>,
    pub gateway: Arc<dyn ConfirmationGateway>,
    pub pricing: Arc<PricingEngine>,
    pub addresses: Arc<AddressBook>,
}

impl SessionDeps {
    pub fn from_config(config: &Config, repos: Repositories, notifier: Arc<dyn Notifier>) -> Self {
        let catalog_source: Arc<dyn CatalogSource> = match &config.catalog.fixture_path {
            Some(path) => Arc::new(FileCatalog::new(path)),
            None => Arc::new(EmbeddedCatalog),
        };

        Self {
            drafts: repos.drafts,
            history: repos.history,
            profiles: repos.profiles,
            catalog_source,
            notifier,
            gateway: Arc::new(SimulatedGateway::new(
                config.wizard.confirmation_latency(),
                config.wizard.gateway_failure_rate,
            )),
            pricing: Arc::new(PricingEngine::new(config.pricing.clone())),
            addresses: Arc::new(AddressBook::new(config.wizard.addresses.clone())),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// One customer's booking session: owns the wizard, its timers and the
/// in-flight confirmation, and checkpoints the draft after every change.
pub struct WizardSession {
    id: String,
    wizard: BookingWizard,
    deps: SessionDeps,
    settings: WizardConfig,
    confirmations: ConfirmationService,
    events: broadcast::Sender<WizardEvent>,
    pending: Option<JoinHandle<Result<BookingRecord, ConfirmationError>>>,
    ticker: Option<StatusTicker>,
    debouncer: Debouncer,
    closed: bool,
}

impl WizardSession {
    /// Resume the stored draft for `id`, or start fresh, then load the catalog
    pub async fn open(id: impl Into<String>, deps: SessionDeps, settings: WizardConfig) -> Result<Self, SessionError> {
        let id = id.into();

        let stored = match deps.drafts.load(&id).await {
            Ok(stored) => stored,
            Err(CoreError::ValidationError(reason)) => {
                warn!("Discarding unreadable draft for session {}: {}", id, reason);
                deps.drafts.clear(&id).await?;
                None
            }
            Err(e) => return Err(e.into()),
        };

        let wizard = match stored {
            Some(persisted) => BookingWizard::resume(persisted, Arc::clone(&deps.pricing), today()),
            None => BookingWizard::new(Arc::clone(&deps.pricing)),
        };

        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let mut session = Self {
            confirmations: ConfirmationService::new(Arc::clone(&deps.gateway), Arc::clone(&deps.history)),
            debouncer: Debouncer::new(settings.autocomplete_debounce()),
            id,
            wizard,
            deps,
            settings,
            events,
            pending: None,
            ticker: None,
            closed: false,
        };

        session.seed_from_profile().await?;
        session.load_catalog().await;
        info!("Session {} opened at step {}", session.id, session.wizard.step().number());
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn wizard(&self) -> &BookingWizard {
        &self.wizard
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply one command. Refused commands are reported as `Blocked`
    /// events; only storage failures surface as errors.
    pub async fn handle(&mut self, command: WizardCommand) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed(self.id.clone()));
        }
        debug!("Session {} handling {:?}", self.id, command);

        match command {
            WizardCommand::EditTrip(form) => {
                let result = self.wizard.set_trip_form(form);
                self.checkpoint(result).await?;
            }
            WizardCommand::PrefillFromEstimate(estimate) => {
                let result = self.wizard.prefill_service(estimate.service);
                self.checkpoint(result).await?;
            }
            WizardCommand::SelectVehicle(vehicle_id) => match self.wizard.select_vehicle(&vehicle_id) {
                Ok(quote) => {
                    self.emit(WizardEvent::QuoteUpdated(quote));
                    self.emit(WizardEvent::VehiclesListed { options: self.wizard.vehicle_options() });
                    self.persist().await?;
                }
                Err(e) => self.blocked(e),
            },
            WizardCommand::ApplyPromo(code) => self.apply_promo(&code).await?,
            WizardCommand::SetPolicies(policies) => {
                let result = self.wizard.set_policies(policies);
                self.checkpoint(result).await?;
            }
            WizardCommand::AcceptTerms(accepted) => {
                let result = self.wizard.set_terms_accepted(accepted);
                self.checkpoint(result).await?;
            }
            WizardCommand::Advance => self.advance().await?,
            WizardCommand::Retreat => {
                let from = self.wizard.step();
                match self.wizard.retreat() {
                    Ok(to) if to != from => {
                        self.emit(WizardEvent::StepChanged { from, to });
                        self.persist().await?;
                    }
                    Ok(_) => {}
                    Err(e) => self.blocked(e),
                }
            }
            WizardCommand::RetryCatalog if self.pending.is_some() || self.wizard.is_submitting() => {
                self.blocked(WizardError::SubmissionPending);
            }
            WizardCommand::RetryCatalog => {
                self.load_catalog().await;
                if self.wizard.step() == Step::VehicleSelection {
                    self.list_vehicles();
                }
                self.persist().await?;
            }
            WizardCommand::SuggestAddress { field, query } => self.suggest(field, query),
            WizardCommand::Restart => self.restart().await?,
            WizardCommand::Leave => self.shutdown(),
        }

        Ok(())
    }

    /// Wait for the in-flight confirmation, if any, and apply its result
    pub async fn await_confirmation(&mut self) -> Result<Option<BookingRecord>, SessionError> {
        let Some(handle) = self.pending.take() else {
            return Ok(None);
        };
        let outcome = flatten_join(handle.await);
        self.finish_confirmation(outcome).await
    }

    /// Process commands until `Leave` or the sender goes away.
    ///
    /// Confirmation results are applied as soon as they arrive, between
    /// commands.
    pub async fn run(mut self, mut commands: mpsc::Receiver<WizardCommand>) -> Result<(), SessionError> {
        loop {
            let command = match self.pending.as_mut() {
                Some(handle) => tokio::select! {
                    joined = handle => {
                        self.pending = None;
                        self.finish_confirmation(flatten_join(joined)).await?;
                        continue;
                    }
                    command = commands.recv() => command,
                },
                None => commands.recv().await,
            };

            let Some(command) = command else {
                break;
            };
            let leaving = matches!(command, WizardCommand::Leave);
            self.handle(command).await?;
            if leaving {
                break;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Stop every timer and abandon any in-flight confirmation
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.debouncer.cancel();
        if let Some(handle) = self.pending.take() {
            warn!("Session {} left with a confirmation in flight", self.id);
            handle.abort();
        }
        info!("Session {} closed", self.id);
    }

    async fn advance(&mut self) -> Result<(), SessionError> {
        match self.wizard.advance(today()) {
            Ok(AdvanceOutcome::Moved { from, to }) => {
                self.emit(WizardEvent::StepChanged { from, to });
                match to {
                    Step::VehicleSelection => self.list_vehicles(),
                    Step::Review => {
                        if let Some(quote) = self.wizard.quote().cloned() {
                            self.emit(WizardEvent::QuoteUpdated(quote));
                        }
                    }
                    _ => {}
                }
                self.persist().await?;
            }
            Ok(AdvanceOutcome::Rejected(report)) => {
                debug!("Step {} rejected: {:?}", self.wizard.step().number(), report.fields());
                self.emit(WizardEvent::ValidationFailed(report));
            }
            Ok(AdvanceOutcome::SubmitConfirmation(draft)) => {
                self.persist().await?;
                self.emit(WizardEvent::ConfirmationPending);

                let confirmations = self.confirmations.clone();
                self.pending = Some(tokio::spawn(async move { confirmations.confirm(draft).await }));
            }
            Err(e) => self.blocked(e),
        }
        Ok(())
    }

    async fn apply_promo(&mut self, code: &str) -> Result<(), SessionError> {
        match self.wizard.apply_promo(code) {
            Ok(PromoOutcome::Invalid { code }) => {
                self.deps.notifier.notify("Invalid promo code", Severity::Warning);
                self.emit(WizardEvent::PromoRejected { code });
            }
            Ok(outcome) => {
                if let PromoOutcome::Applied { code, percent } = &outcome {
                    let saved = self.wizard.quote().map(|q| q.discount_cents).unwrap_or(0);
                    self.deps.notifier.notify(
                        &format!("Promo code {} applied: {}% off, you save {}", code, percent, format_cents(saved)),
                        Severity::Success,
                    );
                }
                if let Some(quote) = self.wizard.quote().cloned() {
                    self.emit(WizardEvent::QuoteUpdated(quote));
                }
                self.persist().await?;
            }
            Err(e) => self.blocked(e),
        }
        Ok(())
    }

    async fn finish_confirmation(
        &mut self,
        outcome: Result<BookingRecord, ConfirmationError>,
    ) -> Result<Option<BookingRecord>, SessionError> {
        match outcome {
            Ok(record) => {
                self.wizard.confirm_succeeded(record.clone())?;
                self.deps.drafts.clear(&self.id).await?;

                self.deps.notifier.notify(
                    &format!(
                        "Booking confirmed! Your booking number is {}. Total {}",
                        record.number,
                        format_cents(record.total_cents())
                    ),
                    Severity::Success,
                );
                self.emit(WizardEvent::Confirmed {
                    summary: BookingConfirmedEvent {
                        booking_number: record.number.to_string(),
                        session_id: self.id.clone(),
                        total_cents: record.total_cents(),
                        timestamp: Utc::now(),
                    },
                    record: record.clone(),
                });

                self.ticker = Some(StatusTicker::start(
                    record.number.clone(),
                    self.settings.ticker_interval(),
                    self.events.clone(),
                ));
                Ok(Some(record))
            }
            Err(e) => {
                error!("Session {} confirmation failed: {}", self.id, e);
                self.wizard.confirm_failed()?;
                self.deps.notifier.notify(e.user_message(), Severity::Error);
                self.emit(WizardEvent::ConfirmationFailed { message: e.user_message().to_string() });
                self.persist().await?;
                Ok(None)
            }
        }
    }

    async fn restart(&mut self) -> Result<(), SessionError> {
        let from = self.wizard.step();
        if let Err(e) = self.wizard.restart() {
            self.blocked(e);
            return Ok(());
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.debouncer.cancel();

        self.seed_from_profile().await?;
        self.persist().await?;
        if from != Step::TripDetails {
            self.emit(WizardEvent::StepChanged { from, to: Step::TripDetails });
        }
        Ok(())
    }

    async fn load_catalog(&mut self) {
        self.wizard.catalog_loading();
        self.emit(WizardEvent::CatalogLoading);

        match load_with_retry(self.deps.catalog_source.as_ref(), self.settings.catalog_retry_delay()).await {
            Ok(catalog) => self.wizard.attach_catalog(Arc::new(catalog)),
            Err(e) => {
                error!("Session {} has no vehicle catalog: {}", self.id, e);
                self.wizard.catalog_unavailable(e.to_string());
                self.deps
                    .notifier
                    .notify("Vehicles could not be loaded. Please try again.", Severity::Error);
                self.emit(WizardEvent::CatalogUnavailable { reason: e.to_string() });
            }
        }
    }

    // Prefill an empty pickup with the profile's preferred address
    async fn seed_from_profile(&mut self) -> Result<(), SessionError> {
        if self.wizard.step() != Step::TripDetails || !self.wizard.form().pickup.trim().is_empty() {
            return Ok(());
        }
        let preferred = self.deps.profiles.load().await?.and_then(|p| p.preferred_pickup);

        if let Some(pickup) = preferred {
            let mut form = self.wizard.form().clone();
            form.pickup = pickup;
            self.wizard.set_trip_form(form)?;
        }
        Ok(())
    }

    fn suggest(&mut self, field: Field, query: String) {
        if !matches!(field, Field::Pickup | Field::Dropoff) {
            self.emit(WizardEvent::Blocked { reason: format!("No suggestions for {}", field) });
            return;
        }

        let addresses = Arc::clone(&self.deps.addresses);
        let events = self.events.clone();
        self.debouncer.schedule(async move {
            let matches = addresses.suggest(&query);
            let _ = events.send(WizardEvent::Suggestions { field, query, addresses: matches });
        });
    }

    fn list_vehicles(&self) {
        match self.wizard.catalog() {
            CatalogState::Ready(_) => self.emit(WizardEvent::VehiclesListed { options: self.wizard.vehicle_options() }),
            CatalogState::Loading => self.emit(WizardEvent::CatalogLoading),
            CatalogState::Unavailable(reason) => self.emit(WizardEvent::CatalogUnavailable { reason: reason.clone() }),
        }
    }

    async fn checkpoint(&mut self, result: Result<(), WizardError>) -> Result<(), SessionError> {
        match result {
            Ok(()) => self.persist().await,
            Err(e) => {
                self.blocked(e);
                Ok(())
            }
        }
    }

    async fn persist(&self) -> Result<(), SessionError> {
        // A confirmed booking has nothing left to resume
        if self.wizard.step().is_terminal() {
            return Ok(());
        }
        let snapshot = self.wizard.to_persisted(Utc::now());
        self.deps.drafts.save(&self.id, &snapshot).await?;
        Ok(())
    }

    fn blocked(&self, e: WizardError) {
        debug!("Session {} refused command: {}", self.id, e);
        self.emit(WizardEvent::Blocked { reason: e.to_string() });
    }

    fn emit(&self, event: WizardEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

impl Drop for WizardSession {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

fn flatten_join(
    joined: Result<Result<BookingRecord, ConfirmationError>, tokio::task::JoinError>,
) -> Result<BookingRecord, ConfirmationError> {
    joined.unwrap_or_else(|e| Err(ConfirmationError::Core(CoreError::InternalError(e.to_string()))))
}
