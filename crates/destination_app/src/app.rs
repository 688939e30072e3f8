use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use destination_core::{DestinationStore, InitParams, Msg, NotificationKind, ReconcilerPhase};
use destination_engine::{EngineHandle, StoreDriver};
use store_logging::{store_info, store_warn};

use crate::config::{load_config, report_warning};
use crate::fixtures::{load_fixtures, FixtureBackend, FixtureCloud};
use crate::logging;
use crate::persistence::{load_recent, save_recent};

const NOTIFICATION_KINDS: [NotificationKind; 6] = [
    NotificationKind::DestinationsChanged,
    NotificationKind::DestinationsReset,
    NotificationKind::SelectionChanged,
    NotificationKind::SelectedCapabilitiesReady,
    NotificationKind::SearchCompleted,
    NotificationKind::Error,
];

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let (config, warning) = load_config(config_path);
    logging::initialize(config.log_destination, config.level_filter(), &config.log_file);
    report_warning(warning);

    let fixtures = load_fixtures(&config.fixtures_path)?;
    let has_cloud = fixtures.has_cloud();
    let backend = FixtureBackend::new(fixtures);
    let engine = EngineHandle::new(backend.collaborators());
    let mut driver = StoreDriver::new(config.store.clone(), engine);
    if has_cloud {
        driver.set_cloud_directory(Arc::new(FixtureCloud::new(&backend)))?;
    }
    for kind in NOTIFICATION_KINDS {
        driver.subscribe(kind, |notification, store| {
            store_info!(
                "{:?} (selected: {})",
                notification,
                store
                    .selected_key()
                    .map_or_else(|| "none".to_string(), ToString::to_string)
            );
        });
    }

    let mut history = load_recent(&config.state_dir);
    if !config.active_user.is_empty() {
        driver.dispatch(Msg::SetActiveUser(config.active_user.clone()));
    }
    driver.dispatch(Msg::Init(InitParams {
        kiosk_mode: config.kiosk_mode,
        system_default_id: config.system_default_id.clone(),
        selection_rules: config.selection_rules.clone(),
        recent_destinations: history.destinations(),
    }));
    driver.dispatch(Msg::StartLoadAllDestinations);

    if !driver.pump_until(config.settle_timeout(), is_settled) {
        store_warn!(
            "Destination selection did not settle within {:?}",
            config.settle_timeout()
        );
    }
    driver.pump();

    let store = driver.store();
    print_report(store);

    if let (ReconcilerPhase::SelectedReady(_), Some(selected)) =
        (store.phase(), store.selected_destination())
    {
        history.record_recent(selected, Utc::now());
        save_recent(&config.state_dir, &history);
        store_info!("Remembered {} recent destinations", history.entries().len());
    }
    Ok(())
}

/// Discovery finished and the selection is no longer waiting on anything.
fn is_settled(store: &DestinationStore) -> bool {
    !store.is_search_in_progress()
        && matches!(
            store.phase(),
            ReconcilerPhase::NoSelection
                | ReconcilerPhase::SelectedReady(_)
                | ReconcilerPhase::SelectedError(..)
        )
}

fn print_report(store: &DestinationStore) {
    let account = (!store.active_user().is_empty()).then_some(store.active_user());
    let selected = store.selected_key();
    for destination in store.destinations(account) {
        let marker = if Some(&destination.key()) == selected {
            '*'
        } else {
            ' '
        };
        println!(
            "{marker} {:<32} {:<10} {:?}",
            destination.display_name,
            destination.origin.as_str(),
            destination.connection_status
        );
    }
    match store.phase() {
        ReconcilerPhase::SelectedReady(key) => println!("Selected {key}"),
        ReconcilerPhase::SelectedError(key, error) => println!("Selected {key} ({error:?})"),
        ReconcilerPhase::SelectedAwaitingCapabilities(key) => {
            println!("Selected {key} (capabilities pending)")
        }
        ReconcilerPhase::PendingAutoSelect(_) => println!("Still waiting for the default printer"),
        ReconcilerPhase::NoSelection => println!("No destination selected"),
    }
}
