//! In-memory backend for unit tests

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use cookroom_api::{
    AnalysisOutcome, ApiError, ApiResult, FavoriteEntry, HistoryEntry, ImageUpload, PageRequest,
    Recipe, RecipeBackend,
};
use parking_lot::Mutex;

/// Every call yields once before answering, so `tokio::join!` interleaves.
#[derive(Default)]
pub struct FakeBackend {
    recipes: Mutex<Vec<Recipe>>,
    analyze_error: Mutex<Option<ApiError>>,
    analyze_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,

    favorites: Mutex<Vec<FavoriteEntry>>,
    favorite_error: Mutex<Option<ApiError>>,
    favorite_calls: AtomicUsize,
    next_id: AtomicI64,

    history: Mutex<Vec<HistoryEntry>>,
    list_error: Mutex<Option<ApiError>>,
    list_calls: AtomicUsize,
    deleted: Mutex<Vec<i64>>,
}

impl FakeBackend {
    pub fn set_recipes(&self, recipes: Vec<Recipe>) {
        *self.recipes.lock() = recipes;
    }

    pub fn fail_analyze(&self, err: ApiError) {
        *self.analyze_error.lock() = Some(err);
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().clone()
    }

    pub fn fail_next_favorite(&self, err: ApiError) {
        *self.favorite_error.lock() = Some(err);
    }

    pub fn favorite_calls(&self) -> usize {
        self.favorite_calls.load(Ordering::SeqCst)
    }

    pub fn favorite_count(&self) -> usize {
        self.favorites.lock().len()
    }

    pub fn seed_favorites(&self, names: &[&str]) {
        let mut favorites = self.favorites.lock();
        for name in names {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            favorites.push(FavoriteEntry {
                id,
                recipe_data: Recipe::new(*name, vec!["salt".into()], "Mix."),
                created_at: None,
            });
        }
    }

    pub fn seed_history(&self, ids: impl IntoIterator<Item = i64>) {
        let mut history = self.history.lock();
        for id in ids {
            history.push(HistoryEntry {
                id,
                prompt_text: Some(format!("prompt {id}")),
                input_image_path: None,
                analysis_result: None,
                created_at: None,
            });
        }
    }

    pub fn fail_next_list(&self, err: ApiError) {
        *self.list_error.lock() = Some(err);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.deleted.lock().clone()
    }

    fn page<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
        items.iter().skip(page.skip()).take(page.limit()).cloned().collect()
    }
}

#[async_trait]
impl RecipeBackend for FakeBackend {
    async fn analyze(&self, _images: &[ImageUpload], prompt: &str) -> ApiResult<AnalysisOutcome> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = Some(prompt.to_string());
        tokio::task::yield_now().await;
        if let Some(err) = self.analyze_error.lock().take() {
            return Err(err);
        }
        Ok(AnalysisOutcome {
            detected_ingredients: vec!["kimchi".into()],
            recipes: self.recipes.lock().clone(),
        })
    }

    async fn add_favorite(&self, recipe: &Recipe) -> ApiResult<FavoriteEntry> {
        self.favorite_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = self.favorite_error.lock().take() {
            return Err(err);
        }
        let entry = FavoriteEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            recipe_data: recipe.clone(),
            created_at: None,
        };
        self.favorites.lock().push(entry.clone());
        Ok(entry)
    }

    async fn remove_favorite_by_name(&self, name: &str) -> ApiResult<()> {
        self.favorite_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = self.favorite_error.lock().take() {
            return Err(err);
        }
        self.favorites.lock().retain(|f| f.recipe_data.name != name);
        Ok(())
    }

    async fn remove_favorite_by_id(&self, id: i64) -> ApiResult<()> {
        self.favorite_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = self.favorite_error.lock().take() {
            return Err(err);
        }
        self.favorites.lock().retain(|f| f.id != id);
        self.deleted.lock().push(id);
        Ok(())
    }

    async fn list_favorites(&self, page: PageRequest) -> ApiResult<Vec<FavoriteEntry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = self.list_error.lock().take() {
            return Err(err);
        }
        Ok(Self::page(&self.favorites.lock(), page))
    }

    async fn list_history(&self, page: PageRequest) -> ApiResult<Vec<HistoryEntry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = self.list_error.lock().take() {
            return Err(err);
        }
        Ok(Self::page(&self.history.lock(), page))
    }

    async fn delete_history(&self, id: i64) -> ApiResult<()> {
        tokio::task::yield_now().await;
        if let Some(err) = self.list_error.lock().take() {
            return Err(err);
        }
        self.history.lock().retain(|h| h.id != id);
        self.deleted.lock().push(id);
        Ok(())
    }
}
