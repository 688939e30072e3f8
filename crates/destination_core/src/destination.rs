use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of the virtual "Save as PDF" destination.
pub const SAVE_AS_PDF_ID: &str = "Save as PDF";
/// Id of the virtual Google Drive destination.
pub const DOCS_DESTINATION_ID: &str = "__google__docs";

/// Transport or category a destination belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    /// Platform-local printers that need extra setup (Chrome OS).
    #[serde(rename = "chrome_os")]
    Cros,
    Privet,
    Extension,
    Cookies,
    Device,
    Profile,
}

impl Origin {
    /// Origins served by the cloud directory.
    pub const CLOUD: [Origin; 3] = [Origin::Cookies, Origin::Device, Origin::Profile];

    pub fn printer_type(self) -> PrinterType {
        match self {
            Origin::Local | Origin::Cros => PrinterType::Local,
            Origin::Privet => PrinterType::Privet,
            Origin::Extension => PrinterType::Extension,
            Origin::Cookies | Origin::Device | Origin::Profile => PrinterType::Cloud,
        }
    }

    pub fn is_cloud(self) -> bool {
        self.printer_type() == PrinterType::Cloud
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Cros => "chrome_os",
            Origin::Privet => "privet",
            Origin::Extension => "extension",
            Origin::Cookies => "cookies",
            Origin::Device => "device",
            Origin::Profile => "profile",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discovery source a destination is searched through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterType {
    Privet,
    Extension,
    Local,
    Cloud,
}

impl fmt::Display for PrinterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrinterType::Privet => "privet",
            PrinterType::Extension => "extension",
            PrinterType::Local => "local",
            PrinterType::Cloud => "cloud",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Online,
    Offline,
    Dormant,
    Unregistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionalType {
    #[default]
    None,
    /// Extension printer that needs a USB permission grant before use.
    NeedsUsbPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    #[default]
    None,
    Unknown,
    Yes,
    No,
}

/// Opaque print capabilities description (CDD). Never validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(pub serde_json::Value);

impl Capabilities {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Identity of a destination: id, origin and account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestinationKey(String);

impl DestinationKey {
    pub fn new(id: &str, origin: Origin, account: &str) -> Self {
        Self(format!("{id}/{origin}/{account}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered print target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: String,
    pub origin: Origin,
    /// Empty for every non-cloud destination.
    pub account: String,
    pub display_name: String,
    pub connection_status: ConnectionStatus,
    pub capabilities: Option<Capabilities>,
    pub provisional: ProvisionalType,
    pub certificate_status: CertificateStatus,
    pub extension_id: String,
    pub extension_name: String,
}

impl Destination {
    pub fn new(id: impl Into<String>, origin: Origin, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin,
            account: String::new(),
            display_name: display_name.into(),
            connection_status: ConnectionStatus::Unknown,
            capabilities: None,
            provisional: ProvisionalType::None,
            certificate_status: CertificateStatus::None,
            extension_id: String::new(),
            extension_name: String::new(),
        }
    }

    /// The virtual local PDF destination.
    pub fn save_as_pdf(display_name: impl Into<String>) -> Self {
        Self::new(SAVE_AS_PDF_ID, Origin::Local, display_name)
            .with_connection_status(ConnectionStatus::Online)
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_connection_status(mut self, status: ConnectionStatus) -> Self {
        self.connection_status = status;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_provisional(mut self, provisional: ProvisionalType) -> Self {
        self.provisional = provisional;
        self
    }

    pub fn with_certificate_status(mut self, status: CertificateStatus) -> Self {
        self.certificate_status = status;
        self
    }

    pub fn with_extension(
        mut self,
        extension_id: impl Into<String>,
        extension_name: impl Into<String>,
    ) -> Self {
        self.extension_id = extension_id.into();
        self.extension_name = extension_name.into();
        self
    }

    pub fn key(&self) -> DestinationKey {
        DestinationKey::new(&self.id, self.origin, &self.account)
    }

    pub fn printer_type(&self) -> PrinterType {
        self.origin.printer_type()
    }

    pub fn is_provisional(&self) -> bool {
        self.provisional != ProvisionalType::None
    }

    /// Save as PDF and Google Drive are not real printers.
    pub fn is_virtual(&self) -> bool {
        (self.origin == Origin::Local && self.id == SAVE_AS_PDF_ID)
            || self.id == DOCS_DESTINATION_ID
    }

    pub fn is_extension(&self) -> bool {
        self.origin == Origin::Extension
    }

    pub fn should_show_invalid_certificate_error(&self) -> bool {
        self.certificate_status == CertificateStatus::No
    }
}

/// A previously used destination, persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDestination {
    pub id: String,
    pub origin: Origin,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub capabilities: Option<Capabilities>,
    #[serde(default)]
    pub extension_id: String,
    #[serde(default)]
    pub extension_name: String,
}

impl RecentDestination {
    pub fn new(id: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: id.into(),
            origin,
            account: String::new(),
            display_name: String::new(),
            capabilities: None,
            extension_id: String::new(),
            extension_name: String::new(),
        }
    }

    pub fn key(&self) -> DestinationKey {
        DestinationKey::new(&self.id, self.origin, &self.account)
    }

    /// Recent entries without an id are ignored.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

impl From<&Destination> for RecentDestination {
    fn from(destination: &Destination) -> Self {
        Self {
            id: destination.id.clone(),
            origin: destination.origin,
            account: destination.account.clone(),
            display_name: destination.display_name.clone(),
            capabilities: destination.capabilities.clone(),
            extension_id: destination.extension_id.clone(),
            extension_name: destination.extension_name.clone(),
        }
    }
}
