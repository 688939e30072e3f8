use std::time::Duration;

use crate::{Origin, PrinterType};

/// Output of [`crate::update`]: either work for a collaborator or a
/// notification for the consumer, in the order they were produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Request(Request),
    Notify(Notification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Ask the discovery source for every printer of one type.
    StartSearch(PrinterType),
    /// Native capability fetch for a non-cloud destination.
    FetchCapabilities { id: String, origin: Origin },
    FetchCloudPrinter {
        id: String,
        origin: Origin,
        account: String,
    },
    SearchCloud {
        account: String,
        origin: Option<Origin>,
    },
    GrantProvisionalAccess { id: String },
    /// Replaces any armed timer; only the newest generation is honored.
    ArmAutoSelectTimeout { generation: u64, after: Duration },
    CancelAutoSelectTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    DestinationsChanged,
    DestinationsReset,
    SelectionChanged,
    SelectedCapabilitiesReady,
    SearchCompleted(PrinterType),
    Error(DestinationError),
}

/// Subscription key for [`Notification`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    DestinationsChanged,
    DestinationsReset,
    SelectionChanged,
    SelectedCapabilitiesReady,
    SearchCompleted,
    Error,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::DestinationsChanged => NotificationKind::DestinationsChanged,
            Notification::DestinationsReset => NotificationKind::DestinationsReset,
            Notification::SelectionChanged => NotificationKind::SelectionChanged,
            Notification::SelectedCapabilitiesReady => NotificationKind::SelectedCapabilitiesReady,
            Notification::SearchCompleted(_) => NotificationKind::SearchCompleted,
            Notification::Error(_) => NotificationKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationError {
    /// Capabilities of the selected destination could not be fetched.
    InvalidSelection,
    /// The selected destination has an invalid certificate.
    UnsupportedDestination,
    /// Every source finished without a destination to select.
    NoDestinationsFound,
}
