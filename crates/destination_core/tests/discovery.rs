use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use destination_core::{
    update, CloudSearchProbe, CloudSearchResult, ConnectionStatus, Destination, DestinationError,
    DestinationKey, DestinationStore, Effect, Msg, Notification, Origin, PrinterType,
    RecentDestination, Request, SearchStatus, StoreError, StoreSettings, DOCS_DESTINATION_ID,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(store_logging::initialize_for_tests);
}

#[derive(Default)]
struct FakeProbe {
    searching: AtomicBool,
}

impl CloudSearchProbe for FakeProbe {
    fn is_search_in_progress(&self) -> bool {
        self.searching.load(Ordering::SeqCst)
    }
}

fn with_cloud(account: &str) -> (DestinationStore, Arc<FakeProbe>) {
    let probe = Arc::new(FakeProbe::default());
    let mut store = DestinationStore::default();
    store
        .attach_cloud(probe.clone())
        .expect("first attach succeeds");
    let (store, _) = update(store, Msg::SetActiveUser(account.to_string()));
    (store, probe)
}

fn notify(notification: Notification) -> Effect {
    Effect::Notify(notification)
}

#[test]
fn cloud_directory_attaches_once() {
    init_logging();
    let (mut store, _probe) = with_cloud("me@example.com");

    assert!(store.is_cloud_attached());
    assert_eq!(
        store.attach_cloud(Arc::new(FakeProbe::default())),
        Err(StoreError::CloudAlreadyAttached)
    );
}

#[test]
fn cloud_probe_counts_as_search_in_progress() {
    init_logging();
    let (store, probe) = with_cloud("me@example.com");
    assert!(!store.is_search_in_progress());

    probe.searching.store(true, Ordering::SeqCst);
    assert!(store.is_search_in_progress());
}

#[test]
fn cloud_load_without_directory_does_nothing() {
    init_logging();
    let (_, effects) = update(
        DestinationStore::default(),
        Msg::StartLoadCloudDestinations(None),
    );
    assert!(effects.is_empty());
}

#[test]
fn cloud_search_results_are_merged() {
    init_logging();
    let (store, _probe) = with_cloud("me@example.com");

    let (store, effects) = update(store, Msg::StartLoadCloudDestinations(None));
    assert_eq!(
        effects,
        vec![Effect::Request(Request::SearchCloud {
            account: "me@example.com".to_string(),
            origin: None,
        })]
    );

    let printer = Destination::new("c1", Origin::Cookies, "Cloud one").with_account("me@example.com");
    let (store, effects) = update(
        store,
        Msg::CloudSearchDone(CloudSearchResult {
            user: "me@example.com".to_string(),
            origin: Some(Origin::Cookies),
            printers: vec![printer.clone()],
            search_done: true,
        }),
    );

    assert_eq!(
        effects,
        vec![
            notify(Notification::DestinationsChanged),
            notify(Notification::SearchCompleted(PrinterType::Cloud)),
        ]
    );
    assert_eq!(store.destinations(Some("me@example.com")), vec![printer]);
    assert!(store.destinations(Some("other@example.com")).is_empty());
}

#[test]
fn cookie_reload_searches_again_after_completed_search() {
    init_logging();
    let (store, _probe) = with_cloud("me@example.com");
    let (store, _) = update(
        store,
        Msg::CloudSearchDone(CloudSearchResult {
            user: "me@example.com".to_string(),
            origin: Some(Origin::Cookies),
            printers: Vec::new(),
            search_done: true,
        }),
    );

    let (_, effects) = update(
        store,
        Msg::ReloadCookieDestinations("me@example.com".to_string()),
    );

    assert_eq!(
        effects,
        vec![Effect::Request(Request::SearchCloud {
            account: "me@example.com".to_string(),
            origin: Some(Origin::Cookies),
        })]
    );
}

#[test]
fn cloud_printer_handler_tracks_cloud_search() {
    init_logging();
    let store = DestinationStore::new(StoreSettings {
        cloud_printer_handler_enabled: true,
        ..StoreSettings::default()
    });

    let (store, effects) = update(store, Msg::StartLoadAllDestinations);

    assert_eq!(
        effects,
        vec![
            Effect::Request(Request::StartSearch(PrinterType::Privet)),
            Effect::Request(Request::StartSearch(PrinterType::Extension)),
            Effect::Request(Request::StartSearch(PrinterType::Local)),
            Effect::Request(Request::StartSearch(PrinterType::Cloud)),
        ]
    );
    assert_eq!(store.search_status(PrinterType::Cloud), SearchStatus::Searching);
}

#[test]
fn finished_search_is_not_restarted() {
    init_logging();
    let (store, _) = update(DestinationStore::default(), Msg::StartLoadAllDestinations);
    let (store, _) = update(store, Msg::SearchDone(PrinterType::Local));

    let (store, effects) = update(store, Msg::StartLoadAllDestinations);

    assert!(!effects.contains(&Effect::Request(Request::StartSearch(PrinterType::Local))));
    assert_eq!(store.search_status(PrinterType::Local), SearchStatus::Done);
    assert!(store.is_search_in_progress());
}

#[test]
fn recent_drive_destination_is_fetched_from_cloud() {
    init_logging();
    let (store, _probe) = with_cloud("me@example.com");
    let drive_key = DestinationKey::new(DOCS_DESTINATION_ID, Origin::Cookies, "me@example.com");

    let (store, effects) = update(
        store,
        Msg::SelectRecentByKey {
            key: drive_key.clone(),
            recent_destinations: Vec::new(),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::Request(Request::FetchCloudPrinter {
                id: DOCS_DESTINATION_ID.to_string(),
                origin: Origin::Cookies,
                account: "me@example.com".to_string(),
            }),
            Effect::Request(Request::ArmAutoSelectTimeout {
                generation: 1,
                after: store.settings().auto_select_timeout(),
            }),
        ]
    );

    let drive = Destination::new(DOCS_DESTINATION_ID, Origin::Cookies, "Save to Google Drive")
        .with_account("me@example.com")
        .with_connection_status(ConnectionStatus::Online)
        .with_capabilities(destination_core::Capabilities::new(serde_json::json!({})));
    let (store, effects) = update(store, Msg::CloudPrinterDone(drive));

    assert_eq!(
        effects,
        vec![
            notify(Notification::DestinationsChanged),
            Effect::Request(Request::CancelAutoSelectTimeout),
            notify(Notification::SelectionChanged),
            notify(Notification::SelectedCapabilitiesReady),
        ]
    );
    assert_eq!(store.selected_key(), Some(&drive_key));
}

#[test]
fn recent_cloud_destination_needs_a_cloud_directory() {
    init_logging();
    let mut store = DestinationStore::default();
    let mut recent = RecentDestination::new("c1", Origin::Cookies);
    recent.account = "me@example.com".to_string();

    assert_eq!(
        store.select_recent_by_key(&recent.key(), &[recent.clone()]),
        Err(StoreError::FetchNotStarted(recent.key()))
    );
    assert!(store.auto_select_rule().is_none());

    let unknown = DestinationKey::new("ghost", Origin::Local, "");
    assert_eq!(
        store.select_recent_by_key(&unknown, &[recent]),
        Err(StoreError::UnknownDestination(unknown))
    );
}

#[test]
fn cloud_printer_failure_reports_selected_destination() {
    init_logging();
    let (store, _probe) = with_cloud("me@example.com");
    let printer = Destination::new("c1", Origin::Cookies, "Cloud one").with_account("me@example.com");
    let (store, _) = update(
        store,
        Msg::CloudSearchDone(CloudSearchResult {
            user: "me@example.com".to_string(),
            origin: None,
            printers: vec![printer.clone()],
            search_done: false,
        }),
    );
    let (store, effects) = update(store, Msg::SelectDestination(Some(printer.key())));
    assert_eq!(
        effects,
        vec![
            notify(Notification::SelectionChanged),
            Effect::Request(Request::FetchCloudPrinter {
                id: "c1".to_string(),
                origin: Origin::Cookies,
                account: "me@example.com".to_string(),
            }),
        ]
    );

    let (_, effects) = update(
        store,
        Msg::CloudPrinterFailed {
            id: "c1".to_string(),
            origin: Origin::Cookies,
            failure: destination_core::FetchFailure::new("offline"),
        },
    );

    assert_eq!(
        effects,
        vec![notify(Notification::Error(DestinationError::InvalidSelection))]
    );
}

#[test]
fn cloud_destination_without_directory_is_invalid() {
    init_logging();
    let printer = Destination::new("c1", Origin::Device, "Cloud one").with_account("me@example.com");
    let (store, _) = update(
        DestinationStore::default(),
        Msg::PrintersAdded {
            printer_type: PrinterType::Cloud,
            printers: vec![printer.clone()],
        },
    );

    let (store, effects) = update(store, Msg::SelectDestination(Some(printer.key())));

    assert_eq!(
        effects,
        vec![
            notify(Notification::SelectionChanged),
            notify(Notification::Error(DestinationError::InvalidSelection)),
        ]
    );
    assert_eq!(
        store.phase(),
        destination_core::ReconcilerPhase::SelectedError(
            printer.key(),
            DestinationError::InvalidSelection
        )
    );
}

#[test]
fn accepted_invite_adds_printer() {
    init_logging();
    let printer = Destination::new("shared", Origin::Cookies, "Shared").with_account("me@example.com");

    let (store, effects) = update(
        DestinationStore::default(),
        Msg::CloudInviteProcessed {
            accepted: false,
            printer: Some(printer.clone()),
        },
    );
    assert!(effects.is_empty());

    let (store, effects) = update(
        store,
        Msg::CloudInviteProcessed {
            accepted: true,
            printer: Some(printer.clone()),
        },
    );
    assert_eq!(effects, vec![notify(Notification::DestinationsChanged)]);
    assert!(store.get(&printer.key()).is_some());
}

#[test]
fn cloud_update_without_capabilities_keeps_known_ones() {
    init_logging();
    let (store, _probe) = with_cloud("me@example.com");
    let printer = Destination::new("c", Origin::Cookies, "C").with_account("me@example.com");
    let (store, _) = update(
        store,
        Msg::CloudSearchDone(CloudSearchResult {
            user: "me@example.com".to_string(),
            origin: None,
            printers: vec![printer.clone()],
            search_done: true,
        }),
    );
    let (store, _) = update(store, Msg::SelectDestination(Some(printer.key())));
    let caps = destination_core::Capabilities::new(serde_json::json!({"printer": {"color": {}}}));
    let (store, effects) = update(
        store,
        Msg::CloudPrinterDone(printer.clone().with_capabilities(caps.clone())),
    );
    assert_eq!(
        effects,
        vec![
            notify(Notification::DestinationsChanged),
            notify(Notification::SelectedCapabilitiesReady),
        ]
    );

    let (store, effects) = update(store, Msg::CloudPrinterDone(printer.clone()));

    assert_eq!(
        effects,
        vec![
            notify(Notification::DestinationsChanged),
            notify(Notification::Error(DestinationError::InvalidSelection)),
        ]
    );
    assert_eq!(
        store.get(&printer.key()).and_then(|dest| dest.capabilities.clone()),
        Some(caps)
    );
    assert_eq!(
        store.phase(),
        destination_core::ReconcilerPhase::SelectedError(
            printer.key(),
            DestinationError::InvalidSelection
        )
    );
}
