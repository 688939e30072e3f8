use std::collections::HashMap;

use crate::{ConnectionStatus, Destination, DestinationKey};

/// Result of merging a record into the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The key was new; the record was appended.
    Inserted,
    /// An existing record moved from an unknown to a known connection status.
    StatusUpgraded,
    /// An existing record received new capabilities or display data.
    Refreshed,
    Unchanged,
}

impl MergeOutcome {
    pub fn is_change(self) -> bool {
        self != MergeOutcome::Unchanged
    }
}

/// Ordered destinations with a key index; at most one record per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationCollection {
    items: Vec<Destination>,
    index: HashMap<DestinationKey, usize>,
}

impl DestinationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new record, or upgrades the connection status of an
    /// existing one. No other field of an existing record is touched.
    pub fn insert(&mut self, destination: Destination) -> MergeOutcome {
        let key = destination.key();
        match self.index.get(&key) {
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(destination);
                MergeOutcome::Inserted
            }
            Some(&position) => {
                let existing = &mut self.items[position];
                if existing.connection_status == ConnectionStatus::Unknown
                    && destination.connection_status != ConnectionStatus::Unknown
                {
                    existing.connection_status = destination.connection_status;
                    MergeOutcome::StatusUpgraded
                } else {
                    MergeOutcome::Unchanged
                }
            }
        }
    }

    /// Replaces capabilities and display data of an existing record in place,
    /// or inserts the record when its key is unknown.
    pub fn update(&mut self, destination: Destination) -> MergeOutcome {
        let Some(&position) = self.index.get(&destination.key()) else {
            return self.insert(destination);
        };
        let existing = &mut self.items[position];
        if destination.capabilities.is_some() {
            existing.capabilities = destination.capabilities;
        }
        if !destination.display_name.is_empty() {
            existing.display_name = destination.display_name;
        }
        existing.certificate_status = destination.certificate_status;
        MergeOutcome::Refreshed
    }

    pub fn get(&self, key: &DestinationKey) -> Option<&Destination> {
        self.index.get(key).map(|&position| &self.items[position])
    }

    pub fn position(&self, key: &DestinationKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &DestinationKey) -> bool {
        self.index.contains_key(key)
    }

    /// Snapshot of the records, optionally restricted to those usable by
    /// `account` (records without an account always qualify).
    pub fn list(&self, account: Option<&str>) -> Vec<Destination> {
        match account.filter(|account| !account.is_empty()) {
            Some(account) => self
                .items
                .iter()
                .filter(|dest| dest.account.is_empty() || dest.account == account)
                .cloned()
                .collect(),
            None => self.items.clone(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Destination> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every provisional record with `id`. Returns how many were removed.
    pub fn remove_provisional(&mut self, id: &str) -> usize {
        let before = self.items.len();
        self.items
            .retain(|dest| !(dest.id == id && dest.is_provisional()));
        let removed = before - self.items.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(position, dest)| (dest.key(), position))
            .collect();
    }
}
