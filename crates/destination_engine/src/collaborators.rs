use std::sync::Arc;

use destination_core::{CapabilitiesResponse, CloudSearchProbe, Destination, Origin, PrinterType};
use futures_util::stream::BoxStream;

use crate::{CloudSearchBatch, FetchError};

/// Enumerates printers of one type.
#[async_trait::async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn start_search(&self, printer_type: PrinterType) -> Result<Vec<Destination>, FetchError>;
}

/// Native capability lookup for local, privet and extension printers.
#[async_trait::async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn fetch_capabilities(
        &self,
        id: &str,
        origin: Origin,
    ) -> Result<CapabilitiesResponse, FetchError>;
}

/// Account-scoped cloud printer directory.
#[async_trait::async_trait]
pub trait CloudDirectory: Send + Sync {
    /// Streams result pages for `account`, optionally restricted to one origin.
    fn search(&self, account: &str, origin: Option<Origin>) -> BoxStream<'static, CloudSearchBatch>;

    async fn fetch_printer(
        &self,
        id: &str,
        origin: Origin,
        account: &str,
    ) -> Result<Destination, FetchError>;

    fn is_search_in_progress(&self) -> bool;
}

/// Grants access to a provisional (USB permission) destination.
#[async_trait::async_trait]
pub trait ProvisionalResolver: Send + Sync {
    async fn grant_access(&self, id: &str) -> Result<Destination, FetchError>;
}

/// Non-cloud collaborators the engine needs from the start.
#[derive(Clone)]
pub struct Collaborators {
    pub discovery: Arc<dyn DiscoverySource>,
    pub capabilities: Arc<dyn CapabilityProvider>,
    pub provisional: Arc<dyn ProvisionalResolver>,
}

/// Exposes the directory's search bookkeeping to the store.
pub struct DirectoryProbe {
    directory: Arc<dyn CloudDirectory>,
}

impl DirectoryProbe {
    pub fn new(directory: Arc<dyn CloudDirectory>) -> Self {
        Self { directory }
    }
}

impl CloudSearchProbe for DirectoryProbe {
    fn is_search_in_progress(&self) -> bool {
        self.directory.is_search_in_progress()
    }
}
