//! History and favorites screens.
//!
//! Each list pairs a [`PaginatedFeed`] with server-confirmed deletion: an item
//! leaves the list only after the backend accepted the delete. Deleting shifts
//! server offsets, so a feed that still has pages is reloaded from page 0;
//! an exhausted feed just drops the item.

use std::sync::Arc;

use cookroom_api::{FavoriteEntry, HistoryEntry, Recipe, RecipeBackend};
use tracing::{info, warn};

use crate::{
    bus::{EventBus, Notice, NoticeTopic},
    error::{FeedError, SessionResult},
    favorites::FavoriteSync,
    feed::{
        FavoritesSource, FeedItem, HistorySource, LoadOutcome, PaginatedFeed, ScrollViewport,
        SkipReason,
    },
};

async fn load<T: FeedItem>(feed: &PaginatedFeed<T>, bus: &EventBus) -> Result<LoadOutcome, FeedError> {
    feed.load_next().await.map_err(|err| {
        bus.publish(Notice::error(NoticeTopic::Feed, err.to_string()));
        err
    })
}

/// Drop a deleted item, reloading when later pages would now be misaligned.
///
/// A page load already in flight picks up the reload when it lands.
async fn realign<T: FeedItem>(feed: &PaginatedFeed<T>, id: &T::Id, bus: &EventBus) -> Result<(), FeedError> {
    if feed.is_exhausted() {
        feed.remove_item(id);
        return Ok(());
    }
    feed.reset();
    load(feed, bus).await.map(|_| ())
}

/// Past analyses, newest first as served
pub struct HistoryList {
    backend: Arc<dyn RecipeBackend>,
    feed: PaginatedFeed<HistoryEntry>,
    bus: EventBus,
}

impl HistoryList {
    pub fn new(backend: Arc<dyn RecipeBackend>, page_size: usize, bus: EventBus) -> Self {
        let feed = PaginatedFeed::new(page_size, Arc::new(HistorySource(Arc::clone(&backend))));
        Self { backend, feed, bus }
    }

    pub fn feed(&self) -> &PaginatedFeed<HistoryEntry> {
        &self.feed
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.feed.items()
    }

    pub async fn load_more(&self) -> Result<LoadOutcome, FeedError> {
        load(&self.feed, &self.bus).await
    }

    pub async fn on_scroll(&self, viewport: ScrollViewport, threshold: f32) -> Result<LoadOutcome, FeedError> {
        if !viewport.is_near_end(threshold) {
            return Ok(LoadOutcome::Skipped(SkipReason::NotNearEnd));
        }
        self.load_more().await
    }

    /// Start over from the first page
    pub async fn refresh(&self) -> Result<LoadOutcome, FeedError> {
        self.feed.reset();
        self.load_more().await
    }

    /// Recipes stored with a loaded entry
    pub fn recipes_of(&self, id: i64) -> Vec<Recipe> {
        self.feed.get(&id).map(|entry| entry.recipes()).unwrap_or_default()
    }

    /// Delete on the server, then locally
    pub async fn delete(&self, id: i64) -> SessionResult<()> {
        if let Err(err) = self.backend.delete_history(id).await {
            warn!(id, error = %err, "history delete failed");
            self.bus.publish(Notice::error(
                NoticeTopic::Feed,
                format!("Could not delete history entry: {}", err.user_message()),
            ));
            return Err(err.into());
        }
        info!(id, "history entry deleted");
        realign(&self.feed, &id, &self.bus).await?;
        Ok(())
    }
}

/// Saved recipes; keeps the shared favorite cache in step
pub struct FavoritesList {
    backend: Arc<dyn RecipeBackend>,
    feed: PaginatedFeed<FavoriteEntry>,
    favorites: Arc<FavoriteSync>,
    bus: EventBus,
}

impl FavoritesList {
    pub fn new(
        backend: Arc<dyn RecipeBackend>,
        favorites: Arc<FavoriteSync>,
        page_size: usize,
        bus: EventBus,
    ) -> Self {
        let feed = PaginatedFeed::new(page_size, Arc::new(FavoritesSource(Arc::clone(&backend))));
        Self {
            backend,
            feed,
            favorites,
            bus,
        }
    }

    pub fn feed(&self) -> &PaginatedFeed<FavoriteEntry> {
        &self.feed
    }

    pub fn entries(&self) -> Vec<FavoriteEntry> {
        self.feed.items()
    }

    pub async fn load_more(&self) -> Result<LoadOutcome, FeedError> {
        let outcome = load(&self.feed, &self.bus).await?;
        if matches!(outcome, LoadOutcome::Loaded { .. }) {
            self.favorites.hydrate(&self.feed.items());
        }
        Ok(outcome)
    }

    pub async fn on_scroll(&self, viewport: ScrollViewport, threshold: f32) -> Result<LoadOutcome, FeedError> {
        if !viewport.is_near_end(threshold) {
            return Ok(LoadOutcome::Skipped(SkipReason::NotNearEnd));
        }
        self.load_more().await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, FeedError> {
        self.feed.reset();
        self.load_more().await
    }

    /// The recipe behind a loaded entry, for opening or exporting
    pub fn open(&self, id: i64) -> Option<Recipe> {
        self.feed.get(&id).map(|entry| entry.recipe_data)
    }

    /// Delete by record id, then drop the name from the favorite cache
    pub async fn delete(&self, id: i64) -> SessionResult<()> {
        let name = self.feed.get(&id).map(|entry| entry.recipe_data.name);

        if let Err(err) = self.backend.remove_favorite_by_id(id).await {
            warn!(id, error = %err, "favorite delete failed");
            self.bus.publish(Notice::error(
                NoticeTopic::Favorites,
                format!("Could not remove favorite: {}", err.user_message()),
            ));
            return Err(err.into());
        }

        if let Some(name) = &name {
            self.favorites.forget(name);
        }
        info!(id, name = name.as_deref().unwrap_or(""), "favorite deleted");
        realign(&self.feed, &id, &self.bus).await?;
        if !self.feed.is_empty() {
            self.favorites.hydrate(&self.feed.items());
        }
        Ok(())
    }
}
