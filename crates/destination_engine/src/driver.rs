use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use destination_core::{
    update, DestinationKey, DestinationStore, Effect, Msg, Notification, NotificationKind,
    RecentDestination, StoreError, StoreSettings,
};
use store_logging::{store_debug, store_trace};

use crate::collaborators::{CloudDirectory, DirectoryProbe};
use crate::EngineHandle;

type Listener = Box<dyn FnMut(Notification, &DestinationStore)>;

/// Owns the store, routes its requests to the engine and its notifications to
/// subscribers. Listeners run synchronously, in registration order, before
/// the call that produced the notification returns.
pub struct StoreDriver {
    store: DestinationStore,
    engine: EngineHandle,
    listeners: HashMap<NotificationKind, Vec<Listener>>,
}

impl StoreDriver {
    pub fn new(settings: StoreSettings, engine: EngineHandle) -> Self {
        Self {
            store: DestinationStore::new(settings),
            engine,
            listeners: HashMap::new(),
        }
    }

    pub fn store(&self) -> &DestinationStore {
        &self.store
    }

    pub fn subscribe(
        &mut self,
        kind: NotificationKind,
        listener: impl FnMut(Notification, &DestinationStore) + 'static,
    ) {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    /// Wires the cloud directory into both the store and the engine.
    pub fn set_cloud_directory(
        &mut self,
        directory: Arc<dyn CloudDirectory>,
    ) -> Result<(), StoreError> {
        self.store
            .attach_cloud(Arc::new(DirectoryProbe::new(directory.clone())))?;
        self.engine.attach_cloud(directory);
        Ok(())
    }

    pub fn dispatch(&mut self, msg: Msg) {
        store_trace!("Dispatching {:?}", msg);
        let store = std::mem::take(&mut self.store);
        let (store, effects) = update(store, msg);
        self.store = store;
        self.apply(effects);
    }

    pub fn select_destination(&mut self, key: Option<&DestinationKey>) -> Result<(), StoreError> {
        let effects = self.store.select_destination(key)?;
        self.apply(effects);
        Ok(())
    }

    pub fn select_recent_by_key(
        &mut self,
        key: &DestinationKey,
        recent_destinations: &[RecentDestination],
    ) -> Result<(), StoreError> {
        let effects = self.store.select_recent_by_key(key, recent_destinations)?;
        self.apply(effects);
        Ok(())
    }

    pub fn resolve_provisional(&mut self, key: &DestinationKey) -> Result<(), StoreError> {
        let effects = self.store.resolve_provisional(key)?;
        self.apply(effects);
        Ok(())
    }

    /// Dispatches every engine result received so far. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(msg) = self.engine.try_recv() {
            self.dispatch(msg);
            handled += 1;
        }
        handled
    }

    /// Dispatches engine results until `done` holds or `timeout` elapses.
    pub fn pump_until(
        &mut self,
        timeout: Duration,
        mut done: impl FnMut(&DestinationStore) -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        while !done(&self.store) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.engine.recv_timeout(remaining) {
                Some(msg) => self.dispatch(msg),
                None => return done(&self.store),
            }
        }
        true
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Request(request) => {
                    store_debug!("Executing {:?}", request);
                    self.engine.execute(request);
                }
                Effect::Notify(notification) => self.notify(notification),
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        let Some(listeners) = self.listeners.get_mut(&notification.kind()) else {
            return;
        };
        for listener in listeners.iter_mut() {
            listener(notification, &self.store);
        }
    }
}
