//! Destination core: pure destination store and selection state machine.
mod collection;
mod destination;
mod effect;
mod error;
mod matcher;
mod media;
mod msg;
mod search_status;
mod settings;
mod store;
mod update;

pub use collection::{DestinationCollection, MergeOutcome};
pub use destination::{
    Capabilities, CertificateStatus, ConnectionStatus, Destination, DestinationKey, Origin,
    PrinterType, ProvisionalType, RecentDestination, DOCS_DESTINATION_ID, SAVE_AS_PDF_ID,
};
pub use effect::{DestinationError, Effect, Notification, NotificationKind, Request};
pub use error::StoreError;
pub use matcher::DestinationMatch;
pub use media::{localize_capabilities, media_display_name, sort_media_sizes};
pub use msg::{CapabilitiesResponse, CloudSearchResult, FetchFailure, InitParams, Msg};
pub use search_status::{SearchStatus, SearchStatusTracker};
pub use settings::{StoreSettings, AUTO_SELECT_TIMEOUT_MS};
pub use store::{CloudSearchProbe, DestinationStore, ReconcilerPhase};
pub use update::update;
