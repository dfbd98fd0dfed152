use chrono::{NaiveDate, Utc};
use luxride_booking::{
    AddressBook, AdvanceOutcome, BookingWizard, SessionDeps, SimulatedGateway, WizardCommand, WizardError,
    WizardEvent, WizardSession,
};
use luxride_catalog::{
    EmbeddedCatalog, EstimateRequest, PricingEngine, PromoOutcome, ServiceKind, Vehicle, VehicleCatalog, VehicleClass,
};
use luxride_core::{
    BookingHistoryRepository, BookingNumber, BookingRecord, DraftRepository, PolicyAcceptance, Severity, Step,
    ToastTray, TripForm,
};
use luxride_store::{Config, MemoryDraftStore, MemoryHistoryStore, MemoryProfileStore, Repositories, WizardConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 1, 1).unwrap()
}

fn trip() -> TripForm {
    TripForm {
        pickup: "456 Airport Road, Terminal 1".to_string(),
        dropoff: "321 Hotel Avenue, Grand Hotel".to_string(),
        date: "2099-02-14".to_string(),
        time: "19:30".to_string(),
        passengers: "2".to_string(),
        luggage: "2".to_string(),
        service: "airport-transfer".to_string(),
    }
}

struct Harness {
    deps: SessionDeps,
    drafts: Arc<MemoryDraftStore>,
    history: Arc<MemoryHistoryStore>,
    tray: Arc<ToastTray>,
}

fn harness(gateway: SimulatedGateway) -> Harness {
    let drafts = Arc::new(MemoryDraftStore::new());
    let history = Arc::new(MemoryHistoryStore::new());
    let tray = Arc::new(WizardConfig::default().toast_tray());

    let deps = SessionDeps {
        drafts: drafts.clone(),
        history: history.clone(),
        profiles: Arc::new(MemoryProfileStore::new()),
        catalog_source: Arc::new(EmbeddedCatalog),
        notifier: tray.clone(),
        gateway: Arc::new(gateway),
        pricing: Arc::new(PricingEngine::default()),
        addresses: Arc::new(AddressBook::new(WizardConfig::default().addresses)),
    };

    Harness { deps, drafts, history, tray }
}

async fn to_review(session: &mut WizardSession) {
    session.handle(WizardCommand::EditTrip(trip())).await.unwrap();
    session.handle(WizardCommand::Advance).await.unwrap();
    session.handle(WizardCommand::SelectVehicle("1".to_string())).await.unwrap();
    session.handle(WizardCommand::Advance).await.unwrap();
    assert_eq!(session.wizard().step(), Step::Review);
}

async fn accept_all(session: &mut WizardSession) {
    session.handle(WizardCommand::SetPolicies(PolicyAcceptance::all())).await.unwrap();
    session.handle(WizardCommand::AcceptTerms(true)).await.unwrap();
}

fn drain(events: &mut broadcast::Receiver<WizardEvent>) -> Vec<WizardEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

#[test]
fn test_steps_stay_in_bounds_for_any_navigation() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut confirmed_walks = 0;

    for _ in 0..50 {
        let mut wizard = BookingWizard::new(Arc::new(PricingEngine::default()));
        wizard.attach_catalog(Arc::new(VehicleCatalog::embedded()));
        wizard.set_trip_form(trip()).unwrap();

        let mut previous = wizard.step();
        for _ in 0..40 {
            if rng.gen_bool(0.5) {
                if wizard.step() == Step::VehicleSelection && rng.gen_bool(0.5) {
                    wizard.select_vehicle("3").unwrap();
                }
                if wizard.step() == Step::Review {
                    wizard.set_policies(PolicyAcceptance::all()).unwrap();
                    wizard.set_terms_accepted(true).unwrap();
                }
                match wizard.advance(today()) {
                    Ok(AdvanceOutcome::SubmitConfirmation(draft)) => {
                        if rng.gen_bool(0.3) {
                            let record = BookingRecord::from_draft(BookingNumber::generate(), &draft).unwrap();
                            wizard.confirm_succeeded(record).unwrap();
                        } else {
                            wizard.confirm_failed().unwrap();
                        }
                    }
                    Ok(_) | Err(WizardError::AlreadyConfirmed) => {}
                    Err(e) => panic!("unexpected error {e}"),
                }
            } else {
                wizard.retreat().unwrap();
            }

            let now = wizard.step();
            let jump = (now.number() as i8 - previous.number() as i8).abs();
            assert!(jump <= 1, "skipped from {:?} to {:?}", previous, now);
            assert!(Step::ALL.contains(&now));
            if previous == Step::Confirmation {
                assert_eq!(now, Step::Confirmation);
            }
            previous = now;
        }
        if wizard.step() == Step::Confirmation {
            confirmed_walks += 1;
        }
    }
    assert!(confirmed_walks > 0, "no walk reached the confirmation step");
}

#[test]
fn test_each_empty_trip_field_blocks_step_one() {
    let blank: [fn(&mut TripForm); 7] = [
        |f| f.pickup.clear(),
        |f| f.dropoff.clear(),
        |f| f.date.clear(),
        |f| f.time.clear(),
        |f| f.passengers.clear(),
        |f| f.luggage.clear(),
        |f| f.service.clear(),
    ];

    for clear in blank {
        let mut wizard = BookingWizard::new(Arc::new(PricingEngine::default()));
        let mut form = trip();
        clear(&mut form);
        wizard.set_trip_form(form).unwrap();

        let outcome = wizard.advance(today()).unwrap();
        assert!(matches!(outcome, AdvanceOutcome::Rejected(ref r) if r.errors.len() == 1));
        assert_eq!(wizard.step(), Step::TripDetails);
    }
}

#[test]
fn test_promo_pricing_on_a_hundred_dollar_vehicle() {
    let vehicle: Vehicle = serde_json::from_str(
        r#"{"id": 9, "name": "Test Sedan", "type": "Sedan", "capacity": 4, "basePrice": 100}"#,
    )
    .unwrap();
    let engine = PricingEngine::default();

    let quote = engine.compute_price(&vehicle, ServiceKind::Airport, Some("SAVE10"));
    assert_eq!(quote.total_cents, 9000);

    let quote = engine.compute_price(&vehicle, ServiceKind::Airport, Some("BOGUS"));
    assert_eq!(quote.total_cents, 10000);
    assert!(quote.invalid_code());
}

#[test]
fn test_retreat_and_readvance_reproduces_draft() {
    let mut wizard = BookingWizard::new(Arc::new(PricingEngine::default()));
    wizard.attach_catalog(Arc::new(VehicleCatalog::embedded()));
    wizard.set_trip_form(trip()).unwrap();
    wizard.advance(today()).unwrap();
    wizard.select_vehicle("2").unwrap();
    wizard.advance(today()).unwrap();
    assert_eq!(wizard.apply_promo("FIRST20").unwrap(), PromoOutcome::Applied { code: "FIRST20".to_string(), percent: 20 });
    let before = wizard.draft().clone();

    wizard.retreat().unwrap();
    wizard.retreat().unwrap();
    wizard.advance(today()).unwrap();
    wizard.advance(today()).unwrap();

    assert_eq!(wizard.step(), Step::Review);
    assert_eq!(wizard.draft(), &before);
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_clears_draft_and_records_once() {
    init_tracing();
    let h = harness(SimulatedGateway::new(Duration::from_secs(2), 0.0));
    let mut session = WizardSession::open("flow-1", h.deps.clone(), WizardConfig::default()).await.unwrap();
    let mut events = session.subscribe();

    to_review(&mut session).await;
    session.handle(WizardCommand::ApplyPromo("save10".to_string())).await.unwrap();
    accept_all(&mut session).await;
    assert!(h.drafts.load("flow-1").await.unwrap().is_some());

    session.handle(WizardCommand::Advance).await.unwrap();
    assert!(session.has_pending_confirmation());

    // Resubmission while pending is refused
    session.handle(WizardCommand::Advance).await.unwrap();
    assert!(drain(&mut events).iter().any(|e| matches!(e, WizardEvent::Blocked { .. })));

    let record = session.await_confirmation().await.unwrap().unwrap();
    assert_eq!(record.total_cents(), 10800);
    assert_eq!(session.wizard().step(), Step::Confirmation);

    assert!(h.drafts.load("flow-1").await.unwrap().is_none());
    assert_eq!(h.history.list().await.unwrap(), vec![record.clone()]);

    // Confirming again without a new wizard
    session.handle(WizardCommand::Advance).await.unwrap();
    assert_eq!(session.await_confirmation().await.unwrap(), None);
    assert_eq!(h.history.list().await.unwrap().len(), 1);

    let toasts = h.tray.visible(Utc::now());
    let confirmed = toasts
        .iter()
        .find(|t| t.message.contains(record.number.as_str()))
        .unwrap();
    assert_eq!(confirmed.severity, Severity::Success);
    assert!(confirmed.message.ends_with("Total $108.00"));
    assert!(toasts.iter().any(|t| t.message == "Promo code SAVE10 applied: 10% off, you save $12.00"));
}

#[tokio::test(start_paused = true)]
async fn test_ride_status_follows_confirmation() {
    let h = harness(SimulatedGateway::new(Duration::from_secs(2), 0.0));
    let mut session = WizardSession::open("flow-2", h.deps.clone(), WizardConfig::default()).await.unwrap();
    let mut events = session.subscribe();

    to_review(&mut session).await;
    accept_all(&mut session).await;
    session.handle(WizardCommand::Advance).await.unwrap();
    session.await_confirmation().await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    let statuses: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            WizardEvent::RideStatus(s) => Some(s.sequence),
            _ => None,
        })
        .collect();
    assert_eq!(statuses, vec![1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_confirmation_returns_to_review() {
    let h = harness(SimulatedGateway::failing(Duration::from_secs(2)));
    let mut session = WizardSession::open("flow-3", h.deps.clone(), WizardConfig::default()).await.unwrap();

    to_review(&mut session).await;
    accept_all(&mut session).await;
    session.handle(WizardCommand::Advance).await.unwrap();

    assert_eq!(session.await_confirmation().await.unwrap(), None);
    assert_eq!(session.wizard().step(), Step::Review);
    assert!(h.history.list().await.unwrap().is_empty());

    let stored = h.drafts.load("flow-3").await.unwrap().unwrap();
    assert_eq!(stored.step, Step::Review);
    assert_eq!(stored.vehicle_id.as_deref(), Some("1"));

    let toasts = h.tray.visible(Utc::now());
    assert!(toasts.iter().any(|t| t.severity == Severity::Error));
}

#[tokio::test(start_paused = true)]
async fn test_reopened_session_resumes_where_it_left_off() {
    let h = harness(SimulatedGateway::new(Duration::from_secs(2), 0.0));
    {
        let mut session = WizardSession::open("flow-4", h.deps.clone(), WizardConfig::default()).await.unwrap();
        to_review(&mut session).await;
        session.handle(WizardCommand::ApplyPromo("VIP15".to_string())).await.unwrap();
        session.handle(WizardCommand::Leave).await.unwrap();
    }

    let session = WizardSession::open("flow-4", h.deps.clone(), WizardConfig::default()).await.unwrap();
    assert_eq!(session.wizard().step(), Step::Review);
    assert_eq!(session.wizard().draft().vehicle.as_ref().map(|v| v.id.as_str()), Some("1"));
    assert_eq!(session.wizard().quote().unwrap().total_cents, 10200);
}

#[tokio::test(start_paused = true)]
async fn test_estimate_prefills_service() {
    let h = harness(SimulatedGateway::new(Duration::from_secs(2), 0.0));
    let mut session = WizardSession::open("flow-5", h.deps.clone(), WizardConfig::default()).await.unwrap();

    let estimate = PricingEngine::default()
        .estimate(&EstimateRequest {
            service: ServiceKind::Intercity,
            vehicle_class: VehicleClass::Luxury,
            distance_miles: 40.0,
            hours: 0.0,
        })
        .unwrap();
    session.handle(WizardCommand::PrefillFromEstimate(estimate)).await.unwrap();

    assert_eq!(session.wizard().form().service, "intercity");
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_applies_confirmation_between_commands() {
    let h = harness(SimulatedGateway::new(Duration::from_secs(2), 0.0));
    let session = WizardSession::open("flow-6", h.deps.clone(), WizardConfig::default()).await.unwrap();
    let mut events = session.subscribe();

    let (tx, rx) = mpsc::channel(8);
    let runner = tokio::spawn(session.run(rx));

    for command in [
        WizardCommand::EditTrip(trip()),
        WizardCommand::Advance,
        WizardCommand::SelectVehicle("3".to_string()),
        WizardCommand::Advance,
        WizardCommand::SetPolicies(PolicyAcceptance::all()),
        WizardCommand::AcceptTerms(true),
        WizardCommand::Advance,
    ] {
        tx.send(command).await.unwrap();
    }

    loop {
        match events.recv().await.unwrap() {
            WizardEvent::Confirmed { record, summary } => {
                assert_eq!(record.vehicle.id, "3");
                assert_eq!(summary.session_id, "flow-6");
                break;
            }
            WizardEvent::ConfirmationFailed { message } => panic!("confirmation failed: {message}"),
            _ => {}
        }
    }

    tx.send(WizardCommand::Leave).await.unwrap();
    runner.await.unwrap().unwrap();
    assert_eq!(h.history.list().await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_built_from_workspace_config() {
    let config = Config::load_from(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../config")).unwrap();
    let repos = Repositories::from_config(&config.storage).unwrap();
    let deps = SessionDeps::from_config(&config, repos, Arc::new(config.wizard.toast_tray()));

    let mut session = WizardSession::open("flow-7", deps, config.wizard.clone()).await.unwrap();
    to_review(&mut session).await;
    assert_eq!(session.wizard().quote().unwrap().subtotal_cents, 12000);
}
