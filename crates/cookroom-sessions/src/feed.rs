//! Incremental, de-duplicated paging over a list endpoint.
//!
//! A [`PaginatedFeed`] keeps the merged items, the next page index and an
//! exhaustion flag. At most one page fetch is outstanding per feed: the
//! in-flight flag is checked and set under the same lock, so two
//! `load_next()` calls polled together issue a single request.
//!
//! [`PaginatedFeed::reset`] bumps a generation counter. A fetch that was in
//! flight at reset time still completes (and still holds the in-flight slot)
//! but its page is discarded.

use std::{collections::HashSet, fmt, hash::Hash, sync::Arc};

use async_trait::async_trait;
use cookroom_api::{ApiResult, FavoriteEntry, HistoryEntry, PageRequest, RecipeBackend};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::FeedError;

/// An item with a stable identity across pages
pub trait FeedItem: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + Send + Sync;

    fn identity(&self) -> Self::Id;
}

impl FeedItem for HistoryEntry {
    type Id = i64;

    fn identity(&self) -> i64 {
        self.id
    }
}

impl FeedItem for FavoriteEntry {
    type Id = i64;

    fn identity(&self) -> i64 {
        self.id
    }
}

/// Where pages come from
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch(&self, page: PageRequest) -> ApiResult<Vec<T>>;
}

struct FnSource<F>(F);

#[async_trait]
impl<T, F> PageSource<T> for FnSource<F>
where
    T: Send + 'static,
    F: Fn(PageRequest) -> BoxFuture<'static, ApiResult<Vec<T>>> + Send + Sync,
{
    async fn fetch(&self, page: PageRequest) -> ApiResult<Vec<T>> {
        (self.0)(page).await
    }
}

/// `GET /history` pages
pub struct HistorySource(pub Arc<dyn RecipeBackend>);

#[async_trait]
impl PageSource<HistoryEntry> for HistorySource {
    async fn fetch(&self, page: PageRequest) -> ApiResult<Vec<HistoryEntry>> {
        self.0.list_history(page).await
    }
}

/// `GET /favorites` pages
pub struct FavoritesSource(pub Arc<dyn RecipeBackend>);

#[async_trait]
impl PageSource<FavoriteEntry> for FavoritesSource {
    async fn fetch(&self, page: PageRequest) -> ApiResult<Vec<FavoriteEntry>> {
        self.0.list_favorites(page).await
    }
}

/// Why `load_next` did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Exhausted,
    NotNearEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was merged
    Loaded { added: usize, exhausted: bool },
    /// No request was made
    Skipped(SkipReason),
}

/// Scroll position of the list showing a feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollViewport {
    pub offset: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl ScrollViewport {
    pub fn new(offset: f32, viewport_height: f32, content_height: f32) -> Self {
        Self {
            offset,
            viewport_height,
            content_height,
        }
    }

    /// Pixels left below the visible area
    pub fn remaining(&self) -> f32 {
        (self.content_height - self.offset - self.viewport_height).max(0.0)
    }

    pub fn is_near_end(&self, threshold: f32) -> bool {
        self.remaining() <= threshold
    }
}

/// Read-only copy of a feed for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot<T> {
    pub items: Vec<T>,
    pub cursor: usize,
    pub exhausted: bool,
    pub loading: bool,
}

struct FeedState<T: FeedItem> {
    items: Vec<T>,
    seen: HashSet<T::Id>,
    cursor: usize,
    exhausted: bool,
    in_flight: bool,
    generation: u64,
}

impl<T: FeedItem> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: 0,
            exhausted: false,
            in_flight: false,
            generation: 0,
        }
    }
}

/// Clears the in-flight flag if a fetch future is dropped before completing
struct InFlight<'a, T: FeedItem> {
    state: &'a Mutex<FeedState<T>>,
    armed: bool,
}

impl<T: FeedItem> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().in_flight = false;
        }
    }
}

pub struct PaginatedFeed<T: FeedItem> {
    source: Arc<dyn PageSource<T>>,
    page_size: usize,
    state: Mutex<FeedState<T>>,
}

impl<T: FeedItem> fmt::Debug for PaginatedFeed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PaginatedFeed")
            .field("page_size", &self.page_size)
            .field("items", &state.items.len())
            .field("cursor", &state.cursor)
            .field("exhausted", &state.exhausted)
            .field("in_flight", &state.in_flight)
            .finish()
    }
}

impl<T: FeedItem> PaginatedFeed<T> {
    pub fn new(page_size: usize, source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            state: Mutex::new(FeedState::default()),
        }
    }

    /// Feed over a closure returning one page per call
    pub fn from_fn<F>(page_size: usize, fetch: F) -> Self
    where
        F: Fn(PageRequest) -> BoxFuture<'static, ApiResult<Vec<T>>> + Send + Sync + 'static,
    {
        Self::new(page_size, Arc::new(FnSource(fetch)))
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch and merge the page at the cursor.
    ///
    /// On failure the cursor and exhaustion flag are unchanged and the feed can
    /// be asked again. A page that lands after a [`reset`](Self::reset) is
    /// discarded and the first page of the new accumulation is fetched in its
    /// place, so a reset never strands the feed empty behind a busy slot.
    pub async fn load_next(&self) -> Result<LoadOutcome, FeedError> {
        let (mut request, mut generation) = {
            let mut state = self.state.lock();
            if state.in_flight {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            if state.exhausted {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            state.in_flight = true;
            (PageRequest::new(state.cursor, self.page_size), state.generation)
        };
        let mut guard = InFlight {
            state: &self.state,
            armed: true,
        };

        loop {
            debug!(page = request.page, size = request.page_size, "fetching page");
            let result = self.source.fetch(request).await;

            let mut state = self.state.lock();
            if state.generation != generation {
                debug!(page = request.page, "discarding page fetched before reset");
                request = PageRequest::new(state.cursor, self.page_size);
                generation = state.generation;
                continue;
            }

            guard.armed = false;
            state.in_flight = false;

            let page = result.map_err(|err| {
                warn!(page = request.page, error = %err, "page fetch failed");
                FeedError::Fetch(err)
            })?;

            let fetched = page.len();
            let mut added = 0;
            let FeedState { items, seen, .. } = &mut *state;
            for item in page {
                if seen.insert(item.identity()) {
                    items.push(item);
                    added += 1;
                }
            }
            state.cursor += 1;
            state.exhausted = fetched < self.page_size;

            debug!(
                page = request.page,
                fetched,
                added,
                exhausted = state.exhausted,
                "page merged"
            );
            return Ok(LoadOutcome::Loaded {
                added,
                exhausted: state.exhausted,
            });
        }
    }

    /// Load the next page when the viewport is within `threshold` of the end
    pub async fn on_scroll(&self, viewport: ScrollViewport, threshold: f32) -> Result<LoadOutcome, FeedError> {
        if !viewport.is_near_end(threshold) {
            return Ok(LoadOutcome::Skipped(SkipReason::NotNearEnd));
        }
        self.load_next().await
    }

    /// Start over from page 0. An in-flight fetch keeps its slot until it lands.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.items.clear();
        state.seen.clear();
        state.cursor = 0;
        state.exhausted = false;
        state.generation += 1;
    }

    /// Drop one item locally; cursor and exhaustion are left alone
    pub fn remove_item(&self, id: &T::Id) -> Option<T> {
        let mut state = self.state.lock();
        let index = state.items.iter().position(|item| &item.identity() == id)?;
        state.seen.remove(id);
        Some(state.items.remove(index))
    }

    pub fn items(&self) -> Vec<T> {
        self.state.lock().items.clone()
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.state
            .lock()
            .items
            .iter()
            .find(|item| &item.identity() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the next page to fetch
    pub fn cursor(&self) -> usize {
        self.state.lock().cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.lock().exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn snapshot(&self) -> FeedSnapshot<T> {
        let state = self.state.lock();
        FeedSnapshot {
            items: state.items.clone(),
            cursor: state.cursor,
            exhausted: state.exhausted,
            loading: state.in_flight,
        }
    }
}
