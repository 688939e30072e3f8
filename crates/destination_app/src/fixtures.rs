//! Printer backends served from a RON fixture file.
//!
//! Stands in for the platform printer stack so the store can be driven end
//! to end from the command line.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use destination_core::{
    Capabilities, CapabilitiesResponse, CertificateStatus, ConnectionStatus, Destination, Origin,
    PrinterType, ProvisionalType, SAVE_AS_PDF_ID,
};
use destination_engine::{
    CapabilityProvider, CloudDirectory, CloudSearchBatch, Collaborators, DiscoverySource,
    FailureKind, FetchError, ProvisionalResolver,
};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use store_logging::{store_debug, store_info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureSet {
    pub printers: Vec<FixturePrinter>,
    /// Served by the cloud directory, grouped by account.
    pub cloud_printers: Vec<FixturePrinter>,
    /// Discovery for these types fails.
    pub failing_types: Vec<PrinterType>,
    /// Artificial latency for every backend call.
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixturePrinter {
    pub id: String,
    pub origin: Origin,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub connection_status: ConnectionStatus,
    #[serde(default)]
    pub capabilities: Option<Capabilities>,
    #[serde(default)]
    pub provisional: ProvisionalType,
    #[serde(default)]
    pub certificate_status: CertificateStatus,
    #[serde(default)]
    pub extension_id: String,
    #[serde(default)]
    pub extension_name: String,
}

impl FixturePrinter {
    /// The record as discovery reports it, without capabilities.
    fn listing(&self) -> Destination {
        let mut destination = Destination::new(&self.id, self.origin, &self.display_name)
            .with_account(&self.account)
            .with_connection_status(self.connection_status)
            .with_provisional(self.provisional)
            .with_certificate_status(self.certificate_status);
        if self.origin == Origin::Extension {
            destination = destination.with_extension(&self.extension_id, &self.extension_name);
        }
        destination
    }

    fn full_record(&self) -> Destination {
        let mut destination = self.listing();
        destination.capabilities = self.capabilities.clone();
        destination
    }
}

impl FixtureSet {
    pub fn has_cloud(&self) -> bool {
        !self.cloud_printers.is_empty()
    }

    fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Reads the fixture file. A missing file means no printers at all.
pub fn load_fixtures(path: &Path) -> anyhow::Result<FixtureSet> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            store_info!("No printer fixtures at {:?}; starting empty", path);
            return Ok(FixtureSet::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading printer fixtures {:?}", path));
        }
    };
    let set: FixtureSet = ron::from_str(&content)
        .with_context(|| format!("parsing printer fixtures {:?}", path))?;
    store_info!(
        "Loaded {} printers and {} cloud printers from {:?}",
        set.printers.len(),
        set.cloud_printers.len(),
        path
    );
    Ok(set)
}

fn pdf_capabilities() -> Capabilities {
    Capabilities::new(serde_json::json!({
        "version": "1.0",
        "printer": {
            "page_orientation": {"option": [
                {"type": "PORTRAIT", "is_default": true},
                {"type": "LANDSCAPE"},
                {"type": "AUTO"}
            ]},
            "color": {"option": [{"type": "STANDARD_COLOR", "is_default": true}]},
            "media_size": {"option": [
                {"name": "NA_LETTER", "width_microns": 215900, "height_microns": 279400, "is_default": true},
                {"name": "ISO_A4", "width_microns": 210000, "height_microns": 297000}
            ]}
        }
    }))
}

/// Serves every collaborator from one fixture set.
#[derive(Clone)]
pub struct FixtureBackend {
    set: Arc<FixtureSet>,
}

impl FixtureBackend {
    pub fn new(set: FixtureSet) -> Self {
        Self { set: Arc::new(set) }
    }

    pub fn collaborators(&self) -> Collaborators {
        let backend = Arc::new(self.clone());
        Collaborators {
            discovery: backend.clone(),
            capabilities: backend.clone(),
            provisional: backend,
        }
    }

    async fn delay(&self) {
        let latency = self.set.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn find(&self, id: &str, origin: Origin) -> Option<&FixturePrinter> {
        self.set
            .printers
            .iter()
            .find(|printer| printer.id == id && printer.origin == origin)
    }
}

#[async_trait::async_trait]
impl DiscoverySource for FixtureBackend {
    async fn start_search(&self, printer_type: PrinterType) -> Result<Vec<Destination>, FetchError> {
        self.delay().await;
        if self.set.failing_types.contains(&printer_type) {
            return Err(FetchError::new(
                FailureKind::Unavailable,
                format!("{printer_type} discovery is configured to fail"),
            ));
        }
        Ok(self
            .set
            .printers
            .iter()
            .filter(|printer| printer.origin.printer_type() == printer_type)
            .map(FixturePrinter::listing)
            .collect())
    }
}

#[async_trait::async_trait]
impl CapabilityProvider for FixtureBackend {
    async fn fetch_capabilities(
        &self,
        id: &str,
        origin: Origin,
    ) -> Result<CapabilitiesResponse, FetchError> {
        self.delay().await;
        if id == SAVE_AS_PDF_ID && origin == Origin::Local {
            return Ok(CapabilitiesResponse {
                printer: None,
                capabilities: pdf_capabilities(),
            });
        }
        let printer = self
            .find(id, origin)
            .ok_or_else(|| FetchError::new(FailureKind::NotFound, id))?;
        let capabilities = printer.capabilities.clone().ok_or_else(|| {
            FetchError::new(FailureKind::InvalidResponse, format!("{id} has no capabilities"))
        })?;
        Ok(CapabilitiesResponse {
            printer: Some(printer.listing()),
            capabilities,
        })
    }
}

#[async_trait::async_trait]
impl ProvisionalResolver for FixtureBackend {
    async fn grant_access(&self, id: &str) -> Result<Destination, FetchError> {
        self.delay().await;
        let printer = self
            .set
            .printers
            .iter()
            .find(|printer| printer.id == id && printer.provisional != ProvisionalType::None)
            .ok_or_else(|| FetchError::new(FailureKind::NotFound, id))?;
        store_debug!("Granted access to {}", id);
        Ok(printer
            .full_record()
            .with_provisional(ProvisionalType::None))
    }
}

/// Cloud directory over the fixture's cloud printers.
pub struct FixtureCloud {
    set: Arc<FixtureSet>,
}

impl FixtureCloud {
    pub fn new(backend: &FixtureBackend) -> Self {
        Self {
            set: backend.set.clone(),
        }
    }
}

#[async_trait::async_trait]
impl CloudDirectory for FixtureCloud {
    fn search(&self, account: &str, origin: Option<Origin>) -> BoxStream<'static, CloudSearchBatch> {
        let origins = match origin {
            Some(origin) => vec![origin],
            None => Origin::CLOUD.to_vec(),
        };
        let batches: Vec<CloudSearchBatch> = origins
            .into_iter()
            .map(|origin| CloudSearchBatch {
                origin: Some(origin),
                printers: self
                    .set
                    .cloud_printers
                    .iter()
                    .filter(|printer| printer.origin == origin && printer.account == account)
                    .map(FixturePrinter::listing)
                    .collect(),
                done: true,
            })
            .collect();
        stream::iter(batches).boxed()
    }

    async fn fetch_printer(
        &self,
        id: &str,
        origin: Origin,
        account: &str,
    ) -> Result<Destination, FetchError> {
        self.set
            .cloud_printers
            .iter()
            .find(|printer| printer.id == id && printer.origin == origin && printer.account == account)
            .map(FixturePrinter::full_record)
            .ok_or_else(|| FetchError::new(FailureKind::NotFound, id))
    }

    fn is_search_in_progress(&self) -> bool {
        false
    }
}
