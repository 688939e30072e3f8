use crate::{Capabilities, Destination, DestinationKey, Origin, PrinterType, RecentDestination};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Choose the initial destination.
    Init(InitParams),
    SetActiveUser(String),
    /// User (or UI) picked a destination; `None` clears the selection.
    SelectDestination(Option<DestinationKey>),
    SelectRecentByKey {
        key: DestinationKey,
        recent_destinations: Vec<RecentDestination>,
    },
    StartLoadAllDestinations,
    StartLoadCloudDestinations(Option<Origin>),
    /// Load cookie based cloud printers for an account unless already loaded.
    ReloadCookieDestinations(String),
    ResolveProvisional(DestinationKey),
    /// Account change: drop everything and rediscover.
    DestinationsReload,
    /// Discovery batch, solicited or not.
    PrintersAdded {
        printer_type: PrinterType,
        printers: Vec<Destination>,
    },
    SearchDone(PrinterType),
    SearchFailed(PrinterType),
    CapabilitiesFetched {
        id: String,
        origin: Origin,
        result: Result<CapabilitiesResponse, FetchFailure>,
    },
    CloudSearchDone(CloudSearchResult),
    CloudPrinterDone(Destination),
    CloudPrinterFailed {
        id: String,
        origin: Origin,
        failure: FetchFailure,
    },
    CloudInviteProcessed {
        accepted: bool,
        printer: Option<Destination>,
    },
    ProvisionalResolved {
        provisional_id: String,
        result: Result<Destination, FetchFailure>,
    },
    AutoSelectTimeoutFired { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitParams {
    /// App kiosk mode disables the PDF destination.
    pub kiosk_mode: bool,
    /// Empty when the platform has no default printer.
    pub system_default_id: String,
    pub selection_rules: Option<String>,
    pub recent_destinations: Vec<RecentDestination>,
}

/// Native capability fetch answer. Privet and extension printers may not be
/// known to the store yet, so the answer can describe the printer too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitiesResponse {
    pub printer: Option<Destination>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSearchResult {
    pub user: String,
    pub origin: Option<Origin>,
    pub printers: Vec<Destination>,
    pub search_done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
}

impl FetchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
