//! Optimistic favorite state reconciled against the server.
//!
//! The cache is keyed by recipe name. Server record ids are kept next to the
//! name once known (from a create response or from the favorites feed), which
//! lets the favorites screen delete by id and then [`FavoriteSync::forget`] the
//! name here.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use cookroom_api::{FavoriteEntry, Recipe, RecipeBackend};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    bus::{EventBus, Notice, NoticeTopic},
    error::FavoriteError,
};

/// What a toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// A toggle for the same name was still outstanding
    Ignored,
}

#[derive(Debug, Default)]
struct FavoriteState {
    /// Favorited names and their server ids when known
    favorites: HashMap<String, Option<i64>>,
    /// Names with a request in flight
    pending: HashSet<String>,
}

/// Restores the membership held before a toggle unless the server confirmed it.
/// Dropping it unsettled (failure or a cancelled future) rolls back.
struct PendingToggle<'a> {
    state: &'a Mutex<FavoriteState>,
    name: &'a str,
    /// Server id slot when the name was favorited before the toggle
    previous: Option<Option<i64>>,
    armed: bool,
}

impl PendingToggle<'_> {
    /// Confirmed removal
    fn settle(&mut self) {
        self.armed = false;
        self.state.lock().pending.remove(self.name);
    }

    /// Confirmed add with the id the server assigned
    fn settle_with(&mut self, id: Option<i64>) {
        self.armed = false;
        let mut state = self.state.lock();
        state.pending.remove(self.name);
        state.favorites.insert(self.name.to_string(), id);
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        state.pending.remove(self.name);
        match self.previous {
            Some(id) => {
                state.favorites.insert(self.name.to_string(), id);
            }
            None => {
                state.favorites.remove(self.name);
            }
        }
        debug!(name = %self.name, "favorite toggle rolled back");
    }
}

/// Shared favorite cache. Hand out clones of the `Arc`, never a global.
pub struct FavoriteSync {
    backend: Arc<dyn RecipeBackend>,
    state: Mutex<FavoriteState>,
    bus: Option<EventBus>,
}

impl std::fmt::Debug for FavoriteSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoriteSync")
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl FavoriteSync {
    pub fn new(backend: Arc<dyn RecipeBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(FavoriteState::default()),
            bus: None,
        }
    }

    /// Publish rollbacks as notices
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Flip the favorite state of `recipe`.
    ///
    /// The cache changes before the request is sent and is rolled back if the
    /// server refuses or the call is dropped before it answers. The pending
    /// marker is cleared either way.
    pub async fn toggle(&self, recipe: &Recipe) -> Result<ToggleOutcome, FavoriteError> {
        let name = recipe.name.clone();

        let previous = {
            let mut state = self.state.lock();
            if state.pending.contains(&name) {
                debug!(%name, "favorite toggle already in flight");
                return Ok(ToggleOutcome::Ignored);
            }
            state.pending.insert(name.clone());
            match state.favorites.remove(&name) {
                Some(id) => Some(id),
                None => {
                    state.favorites.insert(name.clone(), None);
                    None
                }
            }
        };
        let mut guard = PendingToggle {
            state: &self.state,
            name: &name,
            previous,
            armed: true,
        };

        match previous {
            Some(_) => {
                let result = self.backend.remove_favorite_by_name(&name).await;
                match result {
                    Ok(()) => {
                        guard.settle();
                        info!(%name, "favorite removed");
                        Ok(ToggleOutcome::Removed)
                    }
                    Err(source) => {
                        drop(guard);
                        Err(self.rejected(name, source))
                    }
                }
            }
            None => {
                let result = self.backend.add_favorite(recipe).await;
                match result {
                    Ok(entry) => {
                        guard.settle_with(Some(entry.id));
                        info!(%name, id = entry.id, "favorite added");
                        Ok(ToggleOutcome::Added)
                    }
                    Err(source) => {
                        drop(guard);
                        Err(self.rejected(name, source))
                    }
                }
            }
        }
    }

    fn rejected(&self, name: String, source: cookroom_api::ApiError) -> FavoriteError {
        warn!(%name, error = %source, "favorite toggle rolled back");
        let err = FavoriteError::Rejected { name, source };
        if let Some(bus) = &self.bus {
            bus.publish(Notice::error(NoticeTopic::Favorites, err.to_string()));
        }
        err
    }

    /// Prime the cache from server records; names with a toggle in flight are left alone.
    pub fn hydrate(&self, entries: &[FavoriteEntry]) {
        let mut state = self.state.lock();
        let FavoriteState { favorites, pending } = &mut *state;
        for entry in entries {
            let name = &entry.recipe_data.name;
            if !pending.contains(name) {
                favorites.insert(name.clone(), Some(entry.id));
            }
        }
        debug!(count = entries.len(), "favorites hydrated");
    }

    /// Drop a name whose server record was deleted elsewhere
    pub fn forget(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        if state.pending.contains(name) {
            return false;
        }
        state.favorites.remove(name).is_some()
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.state.lock().favorites.contains_key(name)
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.state.lock().pending.contains(name)
    }

    /// Server id for a favorited name, if known
    pub fn id_of(&self, name: &str) -> Option<i64> {
        self.state.lock().favorites.get(name).copied().flatten()
    }

    /// Favorited names, sorted
    pub fn favorites(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().favorites.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.state.lock().favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
