use std::collections::BTreeMap;

use crate::PrinterType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Start,
    Searching,
    Done,
}

/// Discovery progress per printer type. Moves forward only, except on reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStatusTracker {
    statuses: BTreeMap<PrinterType, SearchStatus>,
}

impl Default for SearchStatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchStatusTracker {
    /// Tracks the privet, extension and local searches. Cloud is added with
    /// [`SearchStatusTracker::track`] when the cloud printer handler is used.
    pub fn new() -> Self {
        let statuses = [PrinterType::Extension, PrinterType::Privet, PrinterType::Local]
            .into_iter()
            .map(|printer_type| (printer_type, SearchStatus::Start))
            .collect();
        Self { statuses }
    }

    pub fn track(&mut self, printer_type: PrinterType) {
        self.statuses.entry(printer_type).or_default();
    }

    pub fn is_tracked(&self, printer_type: PrinterType) -> bool {
        self.statuses.contains_key(&printer_type)
    }

    pub fn status(&self, printer_type: PrinterType) -> SearchStatus {
        self.statuses
            .get(&printer_type)
            .copied()
            .unwrap_or_default()
    }

    /// Marks the type as searching. Returns `false` if it already finished.
    pub fn begin(&mut self, printer_type: PrinterType) -> bool {
        let status = self.statuses.entry(printer_type).or_default();
        if *status == SearchStatus::Done {
            return false;
        }
        *status = SearchStatus::Searching;
        true
    }

    pub fn complete(&mut self, printer_type: PrinterType) {
        self.statuses.insert(printer_type, SearchStatus::Done);
    }

    /// Whether any tracked search, or the cloud directory, is still running.
    pub fn is_any_searching(&self, cloud_search_in_progress: bool) -> bool {
        cloud_search_in_progress
            || self
                .statuses
                .values()
                .any(|status| *status == SearchStatus::Searching)
    }

    pub fn any_not_started(&self) -> bool {
        self.statuses
            .values()
            .any(|status| *status == SearchStatus::Start)
    }

    pub fn reset(&mut self) {
        for status in self.statuses.values_mut() {
            *status = SearchStatus::Start;
        }
    }
}
