use std::path::Path;

use chrono::{DateTime, Utc};
use destination_core::{Destination, RecentDestination};
use destination_engine::StateDir;
use serde::{Deserialize, Serialize};
use store_logging::{store_error, store_info, store_warn};

const RECENTS_FILENAME: &str = "recent_destinations.ron";

/// Recent destinations kept between sessions.
pub const MAX_RECENT_DESTINATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub destination: RecentDestination,
    pub last_used_utc: DateTime<Utc>,
}

/// Most recently used first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentHistory {
    entries: Vec<RecentEntry>,
}

impl RecentHistory {
    pub fn entries(&self) -> &[RecentEntry] {
        &self.entries
    }

    pub fn destinations(&self) -> Vec<RecentDestination> {
        self.entries
            .iter()
            .map(|entry| entry.destination.clone())
            .collect()
    }

    /// Moves `destination` to the front, replacing an older entry with the
    /// same key, and drops entries past [`MAX_RECENT_DESTINATIONS`].
    pub fn record_recent(&mut self, destination: &Destination, now: DateTime<Utc>) {
        let key = destination.key();
        self.entries.retain(|entry| entry.destination.key() != key);
        self.entries.insert(
            0,
            RecentEntry {
                destination: RecentDestination::from(destination),
                last_used_utc: now,
            },
        );
        self.entries.truncate(MAX_RECENT_DESTINATIONS);
    }
}

pub fn load_recent(state_dir: &Path) -> RecentHistory {
    let state = StateDir::new(state_dir);
    match state.load::<RecentHistory>(RECENTS_FILENAME) {
        Ok(Some(history)) => {
            store_info!(
                "Loaded {} recent destinations from {:?}",
                history.entries.len(),
                state_dir
            );
            history
        }
        Ok(None) => RecentHistory::default(),
        Err(err) => {
            store_warn!("Failed to load recent destinations from {:?}: {}", state_dir, err);
            RecentHistory::default()
        }
    }
}

pub fn save_recent(state_dir: &Path, history: &RecentHistory) {
    if let Err(err) = StateDir::new(state_dir).save(RECENTS_FILENAME, history) {
        store_error!(
            "Failed to write recent destinations to {:?}: {}",
            state_dir,
            err
        );
    }
}
