use store_logging::{store_error, store_warn};

use crate::{DestinationStore, Effect, Msg, StoreError};

/// Pure update function: applies a message to the store and returns the
/// requests and notifications it produced, in order.
pub fn update(mut store: DestinationStore, msg: Msg) -> (DestinationStore, Vec<Effect>) {
    match msg {
        Msg::Init(params) => store.init(params),
        Msg::SetActiveUser(account) => store.set_active_user(account),
        Msg::SelectDestination(key) => {
            let result = store.select_destination(key.as_ref());
            return finish(store, result, "Rejected destination selection");
        }
        Msg::SelectRecentByKey {
            key,
            recent_destinations,
        } => {
            let result = store.select_recent_by_key(&key, &recent_destinations);
            return finish(store, result, "Failed to select recent destination");
        }
        Msg::StartLoadAllDestinations => store.start_load_all_destinations(),
        Msg::StartLoadCloudDestinations(origin) => store.start_load_cloud_destinations(origin),
        Msg::ReloadCookieDestinations(account) => store.reload_cookie_destinations(&account),
        Msg::ResolveProvisional(key) => {
            let result = store.resolve_provisional(&key);
            return finish(store, result, "Cannot resolve destination");
        }
        Msg::DestinationsReload => store.reload(),
        Msg::PrintersAdded {
            printer_type,
            printers,
        } => store.on_printers_added(printer_type, printers),
        Msg::SearchDone(printer_type) => store.on_search_done(printer_type),
        // A failed search counts as a finished search with no printers.
        Msg::SearchFailed(printer_type) => {
            store_warn!("Search for {} printers failed", printer_type);
            store.on_search_done(printer_type)
        }
        Msg::CapabilitiesFetched { id, origin, result } => match result {
            Ok(response) => store.on_capabilities_fetched(&id, origin, response),
            Err(failure) => store.on_capabilities_failed(&id, origin, &failure),
        },
        Msg::CloudSearchDone(result) => store.on_cloud_search_done(result),
        Msg::CloudPrinterDone(destination) => store.on_cloud_printer_done(destination),
        Msg::CloudPrinterFailed {
            id,
            origin,
            failure,
        } => store.on_cloud_printer_failed(&id, origin, &failure),
        Msg::CloudInviteProcessed { accepted, printer } => {
            store.on_invite_processed(accepted, printer)
        }
        Msg::ProvisionalResolved {
            provisional_id,
            result,
        } => store.on_provisional_resolved(&provisional_id, result),
        Msg::AutoSelectTimeoutFired { generation } => store.on_auto_select_timeout(generation),
    }

    let effects = store.take_effects();
    (store, effects)
}

/// Contract violations are logged and produce no effects.
fn finish(
    store: DestinationStore,
    result: Result<Vec<Effect>, StoreError>,
    context: &str,
) -> (DestinationStore, Vec<Effect>) {
    match result {
        Ok(effects) => (store, effects),
        Err(err) => {
            store_error!("{}: {}", context, err);
            (store, Vec::new())
        }
    }
}
