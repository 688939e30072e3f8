use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use destination_core::{
    Capabilities, CapabilitiesResponse, Destination, DestinationError, DestinationKey,
    DestinationStore, InitParams, Msg, Notification, NotificationKind, Origin, PrinterType,
    ProvisionalType, ReconcilerPhase, StoreError, StoreSettings, SAVE_AS_PDF_ID,
};
use destination_engine::{
    CapabilityProvider, CloudDirectory, CloudSearchBatch, Collaborators, DiscoverySource,
    EngineHandle, FailureKind, FetchError, ProvisionalResolver, StoreDriver,
};
use futures_util::stream::{self, BoxStream, StreamExt};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(5);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(store_logging::initialize_for_tests);
}

#[derive(Default)]
struct FakeDiscovery {
    printers: HashMap<PrinterType, Vec<Destination>>,
    failing: bool,
}

#[async_trait::async_trait]
impl DiscoverySource for FakeDiscovery {
    async fn start_search(&self, printer_type: PrinterType) -> Result<Vec<Destination>, FetchError> {
        if self.failing {
            return Err(FetchError::new(FailureKind::Unavailable, "backend down"));
        }
        Ok(self.printers.get(&printer_type).cloned().unwrap_or_default())
    }
}

struct FakeCapabilities {
    known: Vec<String>,
}

#[async_trait::async_trait]
impl CapabilityProvider for FakeCapabilities {
    async fn fetch_capabilities(
        &self,
        id: &str,
        _origin: Origin,
    ) -> Result<CapabilitiesResponse, FetchError> {
        if !self.known.iter().any(|known| known == id) {
            return Err(FetchError::new(FailureKind::NotFound, id));
        }
        Ok(CapabilitiesResponse {
            printer: None,
            capabilities: Capabilities::new(serde_json::json!({"printer": {"color": {}}})),
        })
    }
}

struct FakeResolver;

#[async_trait::async_trait]
impl ProvisionalResolver for FakeResolver {
    async fn grant_access(&self, id: &str) -> Result<Destination, FetchError> {
        Ok(Destination::new(id, Origin::Extension, "Granted printer"))
    }
}

#[derive(Default)]
struct FakeCloud {
    batches: Vec<CloudSearchBatch>,
    searching: AtomicBool,
}

#[async_trait::async_trait]
impl CloudDirectory for FakeCloud {
    fn search(&self, _account: &str, _origin: Option<Origin>) -> BoxStream<'static, CloudSearchBatch> {
        stream::iter(self.batches.clone()).boxed()
    }

    async fn fetch_printer(
        &self,
        id: &str,
        _origin: Origin,
        _account: &str,
    ) -> Result<Destination, FetchError> {
        Err(FetchError::new(FailureKind::NotFound, id))
    }

    fn is_search_in_progress(&self) -> bool {
        self.searching.load(Ordering::SeqCst)
    }
}

fn driver_with(settings: StoreSettings, discovery: FakeDiscovery, known: &[&str]) -> StoreDriver {
    let engine = EngineHandle::new(Collaborators {
        discovery: Arc::new(discovery),
        capabilities: Arc::new(FakeCapabilities {
            known: known.iter().map(|id| id.to_string()).collect(),
        }),
        provisional: Arc::new(FakeResolver),
    });
    StoreDriver::new(settings, engine)
}

fn record(driver: &mut StoreDriver, kind: NotificationKind) -> Rc<RefCell<Vec<Notification>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    driver.subscribe(kind, move |notification, _store| {
        sink.borrow_mut().push(notification)
    });
    seen
}

fn is_ready(store: &DestinationStore, key: &DestinationKey) -> bool {
    store.phase() == ReconcilerPhase::SelectedReady(key.clone())
}

#[test]
fn init_selects_pdf_and_reports_ready() {
    init_logging();
    let mut driver = driver_with(StoreSettings::default(), FakeDiscovery::default(), &[SAVE_AS_PDF_ID]);
    let order = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second"] {
        let order = order.clone();
        driver.subscribe(NotificationKind::SelectionChanged, move |_, store| {
            assert!(store.selected_key().is_some());
            order.borrow_mut().push(name);
        });
    }
    let ready = record(&mut driver, NotificationKind::SelectedCapabilitiesReady);

    driver.dispatch(Msg::Init(InitParams::default()));
    assert_eq!(*order.borrow(), vec!["first", "second"]);
    assert!(ready.borrow().is_empty());

    let pdf = DestinationKey::new(SAVE_AS_PDF_ID, Origin::Local, "");
    assert!(driver.pump_until(WAIT, |store| is_ready(store, &pdf)));
    assert_eq!(*ready.borrow(), vec![Notification::SelectedCapabilitiesReady]);
}

#[test]
fn selection_rule_picks_discovered_printer() {
    init_logging();
    let mut discovery = FakeDiscovery::default();
    discovery.printers.insert(
        PrinterType::Local,
        vec![
            Destination::new("CLOUD_9", Origin::Local, "Cloud nine"),
            Destination::new("LOCAL_1", Origin::Local, "Local one"),
        ],
    );
    let mut driver = driver_with(StoreSettings::default(), discovery, &["LOCAL_1"]);

    driver.dispatch(Msg::Init(InitParams {
        selection_rules: Some(r#"{"kind": "local", "idPattern": "^LOCAL_.*"}"#.to_string()),
        ..InitParams::default()
    }));

    let local = DestinationKey::new("LOCAL_1", Origin::Local, "");
    assert!(driver.pump_until(WAIT, |store| is_ready(store, &local)));
    assert_eq!(driver.store().armed_timeout(), None);
    assert_eq!(driver.store().destinations(None).len(), 3);
}

#[test]
fn auto_select_timeout_falls_back_to_pdf() {
    init_logging();
    let settings = StoreSettings {
        auto_select_timeout_ms: 50,
        ..StoreSettings::default()
    };
    let mut driver = driver_with(settings, FakeDiscovery::default(), &[SAVE_AS_PDF_ID]);

    driver.dispatch(Msg::Init(InitParams {
        selection_rules: Some(r#"{"kind": "local", "idPattern": "^NOWHERE$"}"#.to_string()),
        ..InitParams::default()
    }));
    assert!(matches!(driver.store().phase(), ReconcilerPhase::PendingAutoSelect(_)));

    let pdf = DestinationKey::new(SAVE_AS_PDF_ID, Origin::Local, "");
    assert!(driver.pump_until(WAIT, |store| is_ready(store, &pdf)));
    assert!(driver.store().auto_select_rule().is_none());
}

#[test]
fn failed_discovery_reports_no_destinations() {
    init_logging();
    let discovery = FakeDiscovery {
        failing: true,
        ..FakeDiscovery::default()
    };
    let mut driver = driver_with(StoreSettings::default(), discovery, &[]);
    let errors = record(&mut driver, NotificationKind::Error);
    let completed = record(&mut driver, NotificationKind::SearchCompleted);

    driver.dispatch(Msg::Init(InitParams {
        kiosk_mode: true,
        ..InitParams::default()
    }));

    let seen = errors.clone();
    assert!(driver.pump_until(WAIT, move |_| !seen.borrow().is_empty()));
    assert_eq!(
        *errors.borrow(),
        vec![Notification::Error(DestinationError::NoDestinationsFound)]
    );
    assert_eq!(completed.borrow().len(), 3);
    assert!(!driver.store().is_search_in_progress());
}

#[test]
fn cloud_directory_streams_batches_into_store() {
    init_logging();
    let mut driver = driver_with(StoreSettings::default(), FakeDiscovery::default(), &[]);
    let cloud = Arc::new(FakeCloud {
        batches: vec![
            CloudSearchBatch {
                origin: Some(Origin::Cookies),
                printers: vec![Destination::new("c1", Origin::Cookies, "One").with_account("me")],
                done: false,
            },
            CloudSearchBatch {
                origin: Some(Origin::Cookies),
                printers: vec![Destination::new("c2", Origin::Cookies, "Two").with_account("me")],
                done: true,
            },
        ],
        ..FakeCloud::default()
    });
    driver.set_cloud_directory(cloud.clone()).unwrap();
    assert_eq!(
        driver.set_cloud_directory(cloud.clone()),
        Err(StoreError::CloudAlreadyAttached)
    );
    let completed = record(&mut driver, NotificationKind::SearchCompleted);

    driver.dispatch(Msg::SetActiveUser("me".to_string()));
    driver.dispatch(Msg::StartLoadCloudDestinations(None));

    assert!(driver.pump_until(WAIT, |store| store.destinations(Some("me")).len() == 2));
    assert_eq!(
        *completed.borrow(),
        vec![
            Notification::SearchCompleted(PrinterType::Cloud),
            Notification::SearchCompleted(PrinterType::Cloud),
        ]
    );

    cloud.searching.store(true, Ordering::SeqCst);
    assert!(driver.store().is_search_in_progress());
}

#[test]
fn provisional_destination_is_granted_and_replaced() {
    init_logging();
    let usb = Destination::new("usb", Origin::Extension, "USB printer")
        .with_provisional(ProvisionalType::NeedsUsbPermission);
    let mut discovery = FakeDiscovery::default();
    discovery
        .printers
        .insert(PrinterType::Extension, vec![usb.clone()]);
    let mut driver = driver_with(StoreSettings::default(), discovery, &[]);

    driver.dispatch(Msg::StartLoadAllDestinations);
    let key = usb.key();
    assert!(driver.pump_until(WAIT, |store| store.get(&key).is_some()));
    assert_eq!(
        driver.select_destination(Some(&key)),
        Err(StoreError::ProvisionalSelection(key.clone()))
    );

    driver.resolve_provisional(&key).unwrap();
    assert!(driver.pump_until(WAIT, |store| {
        store.get(&key).is_some_and(|dest| !dest.is_provisional())
    }));
    assert_eq!(
        driver.store().get(&key).map(|dest| dest.display_name.clone()),
        Some("Granted printer".to_string())
    );
}

/// Builds its result stream with tokio, so it must be searched on the runtime.
struct RuntimeBoundCloud;

#[async_trait::async_trait]
impl CloudDirectory for RuntimeBoundCloud {
    fn search(&self, account: &str, _origin: Option<Origin>) -> BoxStream<'static, CloudSearchBatch> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let printer = Destination::new("rt", Origin::Cookies, "Runtime").with_account(account);
        tokio::spawn(async move {
            let _ = tx.send(CloudSearchBatch {
                origin: Some(Origin::Cookies),
                printers: vec![printer],
                done: true,
            });
        });
        stream::once(rx).filter_map(|batch| async move { batch.ok() }).boxed()
    }

    async fn fetch_printer(
        &self,
        id: &str,
        _origin: Origin,
        _account: &str,
    ) -> Result<Destination, FetchError> {
        Err(FetchError::new(FailureKind::NotFound, id))
    }

    fn is_search_in_progress(&self) -> bool {
        false
    }
}

#[test]
fn cloud_search_runs_inside_the_runtime() {
    init_logging();
    let mut driver = driver_with(StoreSettings::default(), FakeDiscovery::default(), &[]);
    driver.set_cloud_directory(Arc::new(RuntimeBoundCloud)).unwrap();

    driver.dispatch(Msg::SetActiveUser("me".to_string()));
    driver.dispatch(Msg::StartLoadCloudDestinations(None));

    let key = DestinationKey::new("rt", Origin::Cookies, "me");
    assert!(driver.pump_until(WAIT, |store| store.get(&key).is_some()));
}
