use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use store_logging::{store_debug, store_error, store_info, store_warn};

use crate::media::{localize_capabilities, sort_media_sizes};
use crate::{
    CapabilitiesResponse, CloudSearchResult, ConnectionStatus, Destination, DestinationCollection,
    DestinationError, DestinationKey, DestinationMatch, Effect, FetchFailure, InitParams,
    Notification, Origin, PrinterType, ProvisionalType, RecentDestination, Request,
    SearchStatus, SearchStatusTracker, StoreError, StoreSettings, DOCS_DESTINATION_ID,
    SAVE_AS_PDF_ID,
};

/// Read access to the cloud directory's own search bookkeeping.
pub trait CloudSearchProbe: Send + Sync {
    fn is_search_in_progress(&self) -> bool;
}

#[derive(Clone)]
struct CloudHandle(Arc<dyn CloudSearchProbe>);

impl fmt::Debug for CloudHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudHandle")
            .field("searching", &self.0.is_search_in_progress())
            .finish()
    }
}

/// Observable state of the selection reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcilerPhase {
    NoSelection,
    PendingAutoSelect(DestinationMatch),
    SelectedAwaitingCapabilities(DestinationKey),
    SelectedReady(DestinationKey),
    SelectedError(DestinationKey, DestinationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    None,
    AwaitingCapabilities(DestinationKey),
    Ready(DestinationKey),
    Error(DestinationKey, DestinationError),
}

impl Selection {
    fn key(&self) -> Option<&DestinationKey> {
        match self {
            Selection::None => None,
            Selection::AwaitingCapabilities(key)
            | Selection::Ready(key)
            | Selection::Error(key, _) => Some(key),
        }
    }
}

/// Destination collection plus the auto-select state machine.
///
/// Every mutation happens through [`crate::update`] or one of the fallible
/// operations below; each returns the effects it produced, in order.
#[derive(Debug, Clone)]
pub struct DestinationStore {
    settings: StoreSettings,
    active_user: String,
    collection: DestinationCollection,
    search: SearchStatusTracker,
    selection: Selection,
    /// Selected destination that is not (or no longer) in the collection.
    detached: Option<Destination>,
    auto_select: Option<DestinationMatch>,
    armed_timeout: Option<u64>,
    next_timeout_generation: u64,
    in_flight_cloud: HashSet<DestinationKey>,
    loaded_cloud_origins: HashMap<String, Vec<Origin>>,
    pdf_enabled: bool,
    select_first: bool,
    system_default_id: String,
    cloud: Option<CloudHandle>,
    outbox: Vec<Effect>,
}

impl Default for DestinationStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

impl DestinationStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            active_user: String::new(),
            collection: DestinationCollection::new(),
            search: SearchStatusTracker::new(),
            selection: Selection::None,
            detached: None,
            auto_select: None,
            armed_timeout: None,
            next_timeout_generation: 1,
            in_flight_cloud: HashSet::new(),
            loaded_cloud_origins: HashMap::new(),
            pdf_enabled: false,
            select_first: false,
            system_default_id: String::new(),
            cloud: None,
            outbox: Vec::new(),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn active_user(&self) -> &str {
        &self.active_user
    }

    /// Snapshot of the destinations usable by `account`, or all of them.
    pub fn destinations(&self, account: Option<&str>) -> Vec<Destination> {
        self.collection.list(account)
    }

    pub fn collection(&self) -> &DestinationCollection {
        &self.collection
    }

    pub fn get(&self, key: &DestinationKey) -> Option<&Destination> {
        self.collection.get(key)
    }

    pub fn selected_key(&self) -> Option<&DestinationKey> {
        self.selection.key()
    }

    pub fn selected_destination(&self) -> Option<&Destination> {
        let key = self.selection.key()?;
        self.collection
            .get(key)
            .or_else(|| self.detached.as_ref().filter(|dest| dest.key() == *key))
    }

    pub fn phase(&self) -> ReconcilerPhase {
        match &self.selection {
            Selection::None => match &self.auto_select {
                Some(rule) => ReconcilerPhase::PendingAutoSelect(rule.clone()),
                None => ReconcilerPhase::NoSelection,
            },
            Selection::AwaitingCapabilities(key) => {
                ReconcilerPhase::SelectedAwaitingCapabilities(key.clone())
            }
            Selection::Ready(key) => ReconcilerPhase::SelectedReady(key.clone()),
            Selection::Error(key, error) => ReconcilerPhase::SelectedError(key.clone(), *error),
        }
    }

    pub fn auto_select_rule(&self) -> Option<&DestinationMatch> {
        self.auto_select.as_ref()
    }

    /// Generation of the armed auto-select timer, if any.
    pub fn armed_timeout(&self) -> Option<u64> {
        self.armed_timeout
    }

    pub fn search_status(&self, printer_type: PrinterType) -> SearchStatus {
        self.search.status(printer_type)
    }

    pub fn is_search_in_progress(&self) -> bool {
        let cloud_searching = self
            .cloud
            .as_ref()
            .is_some_and(|cloud| cloud.0.is_search_in_progress());
        self.search.is_any_searching(cloud_searching)
    }

    pub fn is_cloud_attached(&self) -> bool {
        self.cloud.is_some()
    }

    /// Wires the cloud directory. May happen at most once.
    pub fn attach_cloud(&mut self, probe: Arc<dyn CloudSearchProbe>) -> Result<(), StoreError> {
        if self.cloud.is_some() {
            return Err(StoreError::CloudAlreadyAttached);
        }
        self.cloud = Some(CloudHandle(probe));
        Ok(())
    }

    /// Selects the destination with `key`, or clears the selection.
    pub fn select_destination(
        &mut self,
        key: Option<&DestinationKey>,
    ) -> Result<Vec<Effect>, StoreError> {
        self.select(key)?;
        Ok(self.take_effects())
    }

    /// Selects a loaded destination, or fetches it from the recent list.
    /// Unknown keys other than Google Drive cannot be fetched.
    pub fn select_recent_by_key(
        &mut self,
        key: &DestinationKey,
        recent_destinations: &[RecentDestination],
    ) -> Result<Vec<Effect>, StoreError> {
        let previous_rule = self.auto_select.clone();
        let started = if self.collection.contains(key) {
            self.select(Some(key))?;
            true
        } else if let Some(recent) = recent_destinations.iter().find(|r| r.key() == *key) {
            self.fetch_preselected(recent)
        } else {
            let mut drive = RecentDestination::new(DOCS_DESTINATION_ID, Origin::Cookies);
            drive.account = self.active_user.clone();
            if drive.key() != *key {
                return Err(StoreError::UnknownDestination(key.clone()));
            }
            self.fetch_preselected(&drive)
        };
        if !started {
            self.auto_select = previous_rule;
            self.outbox.clear();
            return Err(StoreError::FetchNotStarted(key.clone()));
        }
        Ok(self.take_effects())
    }

    /// Asks for a permission grant for a provisional destination.
    pub fn resolve_provisional(&mut self, key: &DestinationKey) -> Result<Vec<Effect>, StoreError> {
        let destination = self
            .collection
            .get(key)
            .ok_or_else(|| StoreError::UnknownDestination(key.clone()))?;
        if destination.provisional != ProvisionalType::NeedsUsbPermission {
            return Err(StoreError::NotResolvable(key.clone()));
        }
        let id = destination.id.clone();
        self.request(Request::GrantProvisionalAccess { id });
        Ok(self.take_effects())
    }

    pub(crate) fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn set_active_user(&mut self, account: String) {
        self.active_user = account;
    }

    fn request(&mut self, request: Request) {
        self.outbox.push(Effect::Request(request));
    }

    fn notify(&mut self, notification: Notification) {
        self.outbox.push(Effect::Notify(notification));
    }

    // ----- initial selection -----

    pub(crate) fn init(&mut self, params: InitParams) {
        self.pdf_enabled = !params.kiosk_mode;
        self.system_default_id = params.system_default_id;
        self.create_pdf_destination();

        // System default printer policy takes priority.
        if self.settings.use_system_default_as_default && self.select_system_default() {
            return;
        }

        for recent in params.recent_destinations.iter().filter(|r| r.is_valid()) {
            let key = recent.key();
            if self.collection.contains(&key) {
                self.select_or_log(Some(&key));
                return;
            }
            if self.fetch_preselected(recent) {
                return;
            }
        }

        if let Some(rule) = params
            .selection_rules
            .as_deref()
            .and_then(DestinationMatch::from_rules_json)
        {
            self.fetch_matching(rule);
            self.start_auto_select_timeout();
            return;
        }

        if self.select_system_default() {
            return;
        }
        self.select_final_fallback();
    }

    /// Whether the system default was found or its fetch was started.
    fn select_system_default(&mut self) -> bool {
        if self.system_default_id.is_empty() {
            return false;
        }
        let origin = if self.system_default_id == SAVE_AS_PDF_ID {
            Origin::Local
        } else {
            self.settings.platform_origin()
        };
        let system_default = RecentDestination::new(self.system_default_id.clone(), origin);
        let key = system_default.key();
        if self.collection.contains(&key) {
            self.select_or_log(Some(&key));
            return true;
        }
        self.fetch_preselected(&system_default)
    }

    /// Starts fetching a destination that is not loaded yet and arms the
    /// auto-select rule for it. Returns whether the fetch was started.
    fn fetch_preselected(&mut self, recent: &RecentDestination) -> bool {
        let key = recent.key();
        if self.in_flight_cloud.contains(&key) {
            return true;
        }

        let origin = recent.origin;
        self.auto_select = Some(DestinationMatch::exact(origin, &recent.id));

        let started = match origin.printer_type() {
            PrinterType::Local => {
                self.request(Request::FetchCapabilities {
                    id: recent.id.clone(),
                    origin,
                });
                true
            }
            printer_type @ (PrinterType::Privet | PrinterType::Extension) => {
                self.start_load_destinations(printer_type);
                self.select_placeholder(recent);
                true
            }
            PrinterType::Cloud => {
                if self.cloud.is_some() {
                    self.in_flight_cloud.insert(key);
                    self.request(Request::FetchCloudPrinter {
                        id: recent.id.clone(),
                        origin,
                        account: recent.account.clone(),
                    });
                    true
                } else {
                    store_debug!("No cloud directory to fetch {}", key);
                    false
                }
            }
        };

        if started {
            self.start_auto_select_timeout();
        }
        started
    }

    /// Privet and extension printers cannot be fetched one by one; select a
    /// stand-in until discovery reports the real record.
    fn select_placeholder(&mut self, recent: &RecentDestination) {
        let mut placeholder =
            Destination::new(recent.id.clone(), recent.origin, recent.display_name.clone())
                .with_connection_status(ConnectionStatus::Online);
        if recent.origin == Origin::Extension {
            placeholder = placeholder
                .with_extension(recent.extension_id.clone(), recent.extension_name.clone());
        }
        placeholder.capabilities = recent.capabilities.clone();

        let key = placeholder.key();
        let ready = placeholder.capabilities.is_some();
        self.detached = Some(placeholder);
        self.selection = Selection::AwaitingCapabilities(key.clone());
        self.notify(Notification::SelectionChanged);
        if ready {
            self.selection = Selection::Ready(key);
            self.notify(Notification::SelectedCapabilitiesReady);
        }
    }

    fn fetch_matching(&mut self, rule: DestinationMatch) {
        let types = rule.printer_types();
        self.auto_select = Some(rule);
        for printer_type in types {
            if printer_type == PrinterType::Cloud {
                self.start_load_cloud_destinations(None);
            } else {
                self.start_load_destinations(printer_type);
            }
        }
    }

    /// Rule matching the previous selection, used after a reset.
    fn preselected_match(&self) -> Option<DestinationMatch> {
        if let Some(selected) = self.selected_destination().filter(|d| !d.id.is_empty()) {
            return Some(DestinationMatch::exact(selected.origin, &selected.id));
        }
        if !self.system_default_id.is_empty() {
            return Some(DestinationMatch::exact(
                self.settings.platform_origin(),
                &self.system_default_id,
            ));
        }
        None
    }

    // ----- selection -----

    fn select(&mut self, key: Option<&DestinationKey>) -> Result<(), StoreError> {
        let destination = match key {
            None => None,
            Some(key) => {
                let destination = self
                    .collection
                    .get(key)
                    .or_else(|| self.detached.as_ref().filter(|d| d.key() == *key))
                    .cloned()
                    .ok_or_else(|| StoreError::UnknownDestination(key.clone()))?;
                if destination.is_provisional() {
                    return Err(StoreError::ProvisionalSelection(key.clone()));
                }
                Some(destination)
            }
        };

        self.auto_select = None;
        // Clear the timer, otherwise it falls back to the default when it fires.
        if self.armed_timeout.take().is_some() {
            self.request(Request::CancelAutoSelectTimeout);
        } else if key.is_some() && key == self.selection.key() && !self.is_detached_selection() {
            return Ok(());
        }

        let Some(destination) = destination else {
            self.selection = Selection::None;
            self.detached = None;
            self.notify(Notification::SelectionChanged);
            return Ok(());
        };

        let key = destination.key();
        if self.collection.contains(&key) {
            self.detached = None;
        }
        store_info!("Selected destination {}", key);
        self.selection = Selection::AwaitingCapabilities(key.clone());
        self.notify(Notification::SelectionChanged);

        if destination.capabilities.is_some() {
            self.send_selected_update();
            return Ok(());
        }
        if !destination.origin.is_cloud() {
            self.request(Request::FetchCapabilities {
                id: destination.id,
                origin: destination.origin,
            });
        } else if self.cloud.is_some() {
            self.request(Request::FetchCloudPrinter {
                id: destination.id,
                origin: destination.origin,
                account: destination.account,
            });
        } else {
            store_error!("Cloud destination {} selected without a cloud directory", key);
            self.selection = Selection::Error(key, DestinationError::InvalidSelection);
            self.notify(Notification::Error(DestinationError::InvalidSelection));
        }
        Ok(())
    }

    /// Internal selections only pass keys known to be selectable.
    fn select_or_log(&mut self, key: Option<&DestinationKey>) {
        if let Err(err) = self.select(key) {
            store_error!("Failed to select destination: {}", err);
        }
    }

    fn is_detached_selection(&self) -> bool {
        match (self.selection.key(), &self.detached) {
            (Some(key), Some(detached)) => detached.key() == *key && !self.collection.contains(key),
            _ => false,
        }
    }

    /// Reports ready or unsupported for the selected destination.
    fn send_selected_update(&mut self) {
        let Some((key, unsupported)) = self
            .selected_destination()
            .map(|selected| (selected.key(), selected.should_show_invalid_certificate_error()))
        else {
            return;
        };
        if unsupported {
            self.selection =
                Selection::Error(key, DestinationError::UnsupportedDestination);
            self.notify(Notification::Error(DestinationError::UnsupportedDestination));
        } else {
            self.selection = Selection::Ready(key);
            self.notify(Notification::SelectedCapabilitiesReady);
        }
    }

    /// Save as PDF, else the first selectable loaded destination, else load
    /// everything and take the first destination that shows up.
    fn select_final_fallback(&mut self) {
        if self.pdf_enabled {
            let pdf_key = DestinationKey::new(SAVE_AS_PDF_ID, Origin::Local, "");
            if self.collection.contains(&pdf_key) {
                self.select_or_log(Some(&pdf_key));
                return;
            }
            store_error!("Save as PDF is enabled but missing from the store");
        }

        if let Some(first) = self.first_selectable() {
            self.select_or_log(Some(&first));
            return;
        }

        self.select_first = true;
        self.start_load_all_destinations();
    }

    /// System default (unless it is the target that just failed), then the
    /// final fallback.
    fn select_default(&mut self) {
        let platform_origin = self.settings.platform_origin();
        let targets_system_default = self
            .auto_select
            .as_ref()
            .is_none_or(|rule| rule.matches_id_and_origin(&self.system_default_id, platform_origin));
        if !targets_system_default && self.select_system_default() {
            return;
        }
        self.select_final_fallback();
    }

    fn first_selectable(&self) -> Option<DestinationKey> {
        self.collection
            .iter()
            .find(|dest| !dest.is_provisional())
            .map(Destination::key)
    }

    fn take_select_first(&mut self) {
        if !self.select_first {
            return;
        }
        if let Some(first) = self.first_selectable() {
            self.select_first = false;
            self.select_or_log(Some(&first));
        }
    }

    fn start_auto_select_timeout(&mut self) {
        let generation = self.next_timeout_generation;
        self.next_timeout_generation += 1;
        self.armed_timeout = Some(generation);
        self.request(Request::ArmAutoSelectTimeout {
            generation,
            after: self.settings.auto_select_timeout(),
        });
    }

    pub(crate) fn on_auto_select_timeout(&mut self, generation: u64) {
        if self.armed_timeout != Some(generation) {
            store_debug!("Ignoring stale auto-select timeout {}", generation);
            return;
        }
        self.armed_timeout = None;
        store_info!("Auto-select timed out, falling back to the default destination");
        self.select_default();
    }

    // ----- discovery -----

    fn start_load_destinations(&mut self, printer_type: PrinterType) {
        if self.search.begin(printer_type) {
            self.request(Request::StartSearch(printer_type));
        }
    }

    pub(crate) fn start_load_all_destinations(&mut self) {
        let mut types = vec![PrinterType::Privet, PrinterType::Extension, PrinterType::Local];
        if self.settings.cloud_printer_handler_enabled {
            self.search.track(PrinterType::Cloud);
            types.push(PrinterType::Cloud);
        } else {
            self.start_load_cloud_destinations(None);
        }
        for printer_type in types {
            self.start_load_destinations(printer_type);
        }
    }

    pub(crate) fn start_load_cloud_destinations(&mut self, origin: Option<Origin>) {
        if self.cloud.is_none() {
            return;
        }
        let loaded = self
            .loaded_cloud_origins
            .get(&self.active_user)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if loaded.is_empty() || origin.is_some_and(|origin| loaded.contains(&origin)) {
            self.request(Request::SearchCloud {
                account: self.active_user.clone(),
                origin,
            });
        }
    }

    pub(crate) fn reload_cookie_destinations(&mut self, account: &str) {
        let loaded = self
            .loaded_cloud_origins
            .get(account)
            .is_some_and(|origins| origins.contains(&Origin::Cookies));
        if loaded {
            self.notify(Notification::SearchCompleted(PrinterType::Cloud));
        } else {
            self.start_load_cloud_destinations(Some(Origin::Cookies));
        }
    }

    fn create_pdf_destination(&mut self) {
        if self.pdf_enabled {
            let pdf = Destination::save_as_pdf(self.settings.pdf_display_name.clone());
            self.insert_destinations(vec![pdf]);
        }
    }

    /// Inserts a batch and raises a single change notification. Returns
    /// whether the pending auto-select rule picked one of the new records.
    fn insert_destinations(&mut self, destinations: Vec<Destination>) -> bool {
        let mut changed = Vec::new();
        for destination in destinations {
            let key = destination.key();
            if self.collection.insert(destination).is_change() {
                changed.push(key);
            }
        }
        if changed.is_empty() {
            return false;
        }
        self.destinations_changed(changed)
    }

    /// Only the changed records are tested against the pending rule.
    fn destinations_changed(&mut self, mut changed: Vec<DestinationKey>) -> bool {
        self.notify(Notification::DestinationsChanged);
        let Some(rule) = self.auto_select.clone() else {
            return false;
        };
        changed.sort_by_key(|key| self.collection.position(key).unwrap_or(usize::MAX));
        let matched = changed.into_iter().find(|key| {
            self.collection
                .get(key)
                .is_some_and(|dest| !dest.is_provisional() && rule.matches(dest))
        });
        match matched {
            Some(key) => {
                self.select_or_log(Some(&key));
                true
            }
            None => false,
        }
    }

    /// Merges richer data for a destination, inserting it when unknown.
    fn update_destination(&mut self, mut destination: Destination) {
        let printer_type = destination.printer_type();
        let has_capabilities = destination.capabilities.is_some();
        if let Some(capabilities) = destination.capabilities.as_mut() {
            localize_capabilities(capabilities);
            if printer_type != PrinterType::Local {
                sort_media_sizes(capabilities);
            }
        }
        let key = destination.key();
        if !has_capabilities {
            store_warn!("Update for {} carried no capabilities", key);
        }
        let outcome = self.collection.update(destination);
        let auto_selected = outcome.is_change() && self.destinations_changed(vec![key.clone()]);
        if auto_selected || self.selection.key() != Some(&key) {
            return;
        }
        self.detached = None;
        if has_capabilities {
            self.send_selected_update();
        } else {
            self.selection = Selection::Error(key, DestinationError::InvalidSelection);
            self.notify(Notification::Error(DestinationError::InvalidSelection));
        }
    }

    pub(crate) fn on_printers_added(&mut self, printer_type: PrinterType, printers: Vec<Destination>) {
        store_debug!("{} {} printers added", printers.len(), printer_type);
        self.insert_destinations(printers);
        self.take_select_first();
    }

    pub(crate) fn on_search_done(&mut self, printer_type: PrinterType) {
        self.search.complete(printer_type);
        self.notify(Notification::SearchCompleted(printer_type));
        if printer_type == PrinterType::Extension {
            self.end_extension_search();
        }
        self.send_no_destinations_if_needed();
    }

    /// Falls back when the cached extension destination was not reported.
    fn end_extension_search(&mut self) {
        let rule_covers_extension = self
            .auto_select
            .as_ref()
            .is_some_and(|rule| rule.matches_origin(Origin::Extension));
        let extension_selected = self
            .selected_destination()
            .is_some_and(Destination::is_extension);
        if rule_covers_extension && extension_selected {
            self.select_default();
        }
    }

    fn send_no_destinations_if_needed(&mut self) {
        if self.search.any_not_started() || self.is_search_in_progress() || !self.select_first {
            return;
        }
        self.select_first = false;
        self.notify(Notification::Error(DestinationError::NoDestinationsFound));
    }

    // ----- fetch outcomes -----

    pub(crate) fn on_capabilities_fetched(
        &mut self,
        id: &str,
        origin: Origin,
        response: CapabilitiesResponse,
    ) {
        let known = if origin == Origin::Privet {
            None
        } else {
            self.collection
                .get(&DestinationKey::new(id, origin, ""))
                .cloned()
        };
        let mut destination = match (known, response.printer) {
            (Some(known), _) => known,
            (None, Some(printer)) => printer,
            (None, None) => {
                store_debug!("Ignoring capabilities for unrecognized printer {}", id);
                return;
            }
        };
        // Keep capabilities already known for local printers so user edits survive.
        if matches!(origin, Origin::Local | Origin::Cros) && destination.capabilities.is_some() {
            return;
        }
        destination.capabilities = Some(response.capabilities);
        self.update_destination(destination);
    }

    pub(crate) fn on_capabilities_failed(&mut self, id: &str, origin: Origin, failure: &FetchFailure) {
        store_warn!(
            "Failed to get print capabilities for printer {}: {}",
            id,
            failure.message
        );
        let selected = self
            .selected_destination()
            .is_some_and(|dest| dest.id == id && dest.origin == origin);
        if selected {
            if let Some(key) = self.selection.key().cloned() {
                self.selection = Selection::Error(key, DestinationError::InvalidSelection);
            }
            self.notify(Notification::Error(DestinationError::InvalidSelection));
        }
        let is_target = self
            .auto_select
            .as_ref()
            .is_some_and(|rule| rule.matches_id_and_origin(id, origin));
        if is_target {
            self.select_default();
        }
    }

    pub(crate) fn on_cloud_search_done(&mut self, result: CloudSearchResult) {
        if !result.printers.is_empty() {
            self.insert_destinations(result.printers);
            self.take_select_first();
        }
        if result.search_done {
            // Loaded origins are only appended when already present, so the
            // cache stays empty in practice.
            let origins = self
                .loaded_cloud_origins
                .get(&result.user)
                .cloned()
                .unwrap_or_default();
            if let Some(origin) = result.origin.filter(|origin| origins.contains(origin)) {
                let mut updated = origins;
                updated.push(origin);
                self.loaded_cloud_origins.insert(result.user, updated);
            }
        }
        self.notify(Notification::SearchCompleted(PrinterType::Cloud));
        self.send_no_destinations_if_needed();
    }

    pub(crate) fn on_cloud_printer_done(&mut self, destination: Destination) {
        let key = destination.key();
        self.update_destination(destination);
        self.in_flight_cloud.remove(&key);
    }

    pub(crate) fn on_cloud_printer_failed(&mut self, id: &str, origin: Origin, failure: &FetchFailure) {
        let key = DestinationKey::new(id, origin, &self.active_user);
        self.in_flight_cloud.remove(&key);
        self.on_capabilities_failed(id, origin, failure);
    }

    pub(crate) fn on_invite_processed(&mut self, accepted: bool, printer: Option<Destination>) {
        if let (true, Some(printer)) = (accepted, printer) {
            self.insert_destinations(vec![printer]);
        }
    }

    pub(crate) fn on_provisional_resolved(
        &mut self,
        provisional_id: &str,
        result: Result<Destination, FetchFailure>,
    ) {
        let removed = self.collection.remove_provisional(provisional_id) > 0;
        match result {
            Ok(destination) => {
                let before = self.outbox.len();
                self.insert_destinations(vec![destination]);
                let notified = self.outbox[before..]
                    .contains(&Effect::Notify(Notification::DestinationsChanged));
                if removed && !notified {
                    self.notify(Notification::DestinationsChanged);
                }
            }
            Err(failure) => {
                store_warn!(
                    "Failed to resolve provisional destination {}: {}",
                    provisional_id,
                    failure.message
                );
                if removed {
                    self.notify(Notification::DestinationsChanged);
                }
            }
        }
    }

    // ----- reset -----

    /// Clears discovered state after an account change and rediscovers.
    pub(crate) fn reload(&mut self) {
        if let Some(selected) = self.selected_destination().cloned() {
            self.detached = Some(selected);
        }
        self.collection.clear();
        self.in_flight_cloud.clear();
        self.loaded_cloud_origins.clear();
        self.search.reset();
        self.start_auto_select_timeout();
        self.notify(Notification::DestinationsReset);

        self.auto_select = self.preselected_match();
        self.create_pdf_destination();
        self.start_load_all_destinations();
    }
}
