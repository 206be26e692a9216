//! Debounced draft auto-save.
//!
//! Edits arrive in bursts; each [`DraftPersistence::schedule`] call replaces
//! the pending snapshot and restarts the quiet-period timer, so a burst ends
//! in a single store write. Store failures are logged and never reach the
//! wizard.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::payload::FormPayload;
use crate::store::KeyValueStore;

/// Store key holding the serialized draft payload
pub const DRAFT_KEY: &str = "propertyDraft";

/// Quiet period before a burst of edits is written
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// A saved draft. Only the payload is persisted, so `saved_at` is known
/// only for writes made by this process.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRecord {
    pub payload: FormPayload,
    pub saved_at: Option<DateTime<Utc>>,
}

/// What the auto-save indicator shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing waiting to be written
    Idle,
    /// A snapshot is waiting for the quiet period to end
    Pending,
    /// A write is in progress
    Saving,
}

#[derive(Debug)]
struct SaveState {
    status: SaveStatus,
    pending: Option<FormPayload>,
    last_saved: Option<DateTime<Utc>>,
}

/// Owns the draft key in the store and the debounce timer
pub struct DraftPersistence {
    store: Arc<dyn KeyValueStore>,
    debounce: Duration,
    enabled: bool,
    state: Arc<Mutex<SaveState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl DraftPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            enabled: true,
            state: Arc::new(Mutex::new(SaveState {
                status: SaveStatus::Idle,
                pending: None,
                last_saved: None,
            })),
            timer: Mutex::new(None),
        }
    }

    /// A persistence layer that never writes; loads and clears still work
    pub fn disabled(store: Arc<dyn KeyValueStore>) -> Self {
        let mut draft = Self::new(store, DEFAULT_DEBOUNCE);
        draft.enabled = false;
        draft
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queue `payload` to be written once edits go quiet.
    ///
    /// Empty payloads are never saved. Outside a tokio runtime the write
    /// happens immediately.
    pub fn schedule(&self, payload: &FormPayload) {
        if !self.enabled || payload.is_empty() {
            return;
        }

        self.cancel_timer();
        {
            let mut state = lock(&self.state);
            state.pending = Some(payload.clone());
            state.status = SaveStatus::Pending;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            write_pending(self.store.as_ref(), &self.state);
            return;
        };

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            write_pending(store.as_ref(), &state);
        });
        *lock(&self.timer) = Some(handle);
    }

    /// Write the pending snapshot now, if there is one
    pub fn flush(&self) {
        self.cancel_timer();
        write_pending(self.store.as_ref(), &self.state);
    }

    /// Read the stored draft. Missing, unreadable or corrupt drafts are `None`.
    pub fn load_existing(&self) -> Option<DraftRecord> {
        let raw = match self.store.get(DRAFT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read draft");
                return None;
            }
        };

        match FormPayload::from_json(&raw) {
            Ok(payload) => Some(DraftRecord {
                payload,
                saved_at: None,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unparseable draft");
                None
            }
        }
    }

    /// Drop any pending write and delete the stored draft
    pub fn clear(&self) {
        self.cancel_timer();
        {
            let mut state = lock(&self.state);
            state.pending = None;
            state.status = SaveStatus::Idle;
        }
        match self.store.remove(DRAFT_KEY) {
            Ok(()) => tracing::debug!("Draft cleared"),
            Err(e) => tracing::warn!(error = %e, "Failed to clear draft"),
        }
    }

    pub fn status(&self) -> SaveStatus {
        lock(&self.state).status
    }

    /// Time of the last successful write made by this process
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).last_saved
    }

    fn cancel_timer(&self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }
}

impl Drop for DraftPersistence {
    fn drop(&mut self) {
        // An aborted timer leaves the previously stored draft intact
        self.cancel_timer();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write_pending(store: &dyn KeyValueStore, state: &Mutex<SaveState>) {
    let payload = {
        let mut guard = lock(state);
        let Some(payload) = guard.pending.take() else {
            return;
        };
        guard.status = SaveStatus::Saving;
        payload
    };

    let result = payload
        .to_json()
        .map_err(crate::store::StoreError::from)
        .and_then(|json| store.set(DRAFT_KEY, &json));

    let mut guard = lock(state);
    match result {
        Ok(()) => {
            guard.last_saved = Some(Utc::now());
            tracing::debug!(fields = payload.len(), "Draft saved");
        }
        Err(e) => tracing::warn!(error = %e, "Draft auto-save failed"),
    }
    // A newer snapshot may have been queued while writing
    if guard.pending.is_none() {
        guard.status = SaveStatus::Idle;
    } else {
        guard.status = SaveStatus::Pending;
    }
}
