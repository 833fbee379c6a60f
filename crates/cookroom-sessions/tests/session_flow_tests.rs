//! Session flows through the public API with an in-memory backend.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use cookroom_api::{
    AnalysisOutcome, ApiConfig, ApiError, ApiResult, FavoriteEntry, HistoryEntry, ImageUpload,
    PageRequest, Recipe, RecipeBackend,
};
use cookroom_export::{ExportConfig, ExportError, ExportPipeline, ExportResult, ImageFetcher, RegionRegistry};
use cookroom_images::SelectedFile;
use cookroom_sessions::{
    AnalysisState, DictationBridge, DictationOutcome, DictationStart, EventBus, FavoriteSync,
    FavoritesList, LoadOutcome, NoticeTopic, RecipeSession, RecognitionEvent, ScrollViewport,
    SessionConfig, SpeechRecognizer, ToggleOutcome,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use tokio::sync::mpsc;

#[derive(Default)]
struct MemoryBackend {
    favorites: Mutex<Vec<FavoriteEntry>>,
    reject_favorites: AtomicBool,
    analyze_calls: AtomicUsize,
}

impl MemoryBackend {
    fn with_favorites(count: i64) -> Self {
        let backend = Self::default();
        *backend.favorites.lock() = (1..=count)
            .map(|id| FavoriteEntry {
                id,
                recipe_data: Recipe::new(format!("Recipe {id}"), vec!["egg".into()], "Cook."),
                created_at: None,
            })
            .collect();
        backend
    }

    fn rejection() -> ApiError {
        ApiError::Server {
            status: Some(503),
            message: "favorites unavailable".into(),
        }
    }
}

#[async_trait]
impl RecipeBackend for MemoryBackend {
    async fn analyze(&self, images: &[ImageUpload], _prompt: &str) -> ApiResult<AnalysisOutcome> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AnalysisOutcome {
            detected_ingredients: vec!["tofu".into()],
            recipes: (0..images.len())
                .map(|i| Recipe::new(format!("Tofu {i}"), vec!["tofu".into()], "Simmer."))
                .collect(),
        })
    }

    async fn add_favorite(&self, recipe: &Recipe) -> ApiResult<FavoriteEntry> {
        tokio::task::yield_now().await;
        if self.reject_favorites.load(Ordering::SeqCst) {
            return Err(Self::rejection());
        }
        let mut favorites = self.favorites.lock();
        let entry = FavoriteEntry {
            id: favorites.iter().map(|f| f.id).max().unwrap_or(0) + 1,
            recipe_data: recipe.clone(),
            created_at: None,
        };
        favorites.push(entry.clone());
        Ok(entry)
    }

    async fn remove_favorite_by_name(&self, name: &str) -> ApiResult<()> {
        tokio::task::yield_now().await;
        if self.reject_favorites.load(Ordering::SeqCst) {
            return Err(Self::rejection());
        }
        self.favorites.lock().retain(|f| f.recipe_data.name != name);
        Ok(())
    }

    async fn remove_favorite_by_id(&self, id: i64) -> ApiResult<()> {
        self.favorites.lock().retain(|f| f.id != id);
        Ok(())
    }

    async fn list_favorites(&self, page: PageRequest) -> ApiResult<Vec<FavoriteEntry>> {
        let favorites = self.favorites.lock();
        Ok(favorites.iter().skip(page.skip()).take(page.limit()).cloned().collect())
    }

    async fn list_history(&self, _page: PageRequest) -> ApiResult<Vec<HistoryEntry>> {
        Ok(Vec::new())
    }

    async fn delete_history(&self, _id: i64) -> ApiResult<()> {
        Ok(())
    }
}

struct NoImages;

#[async_trait]
impl ImageFetcher for NoImages {
    async fn fetch(&self, url: &str) -> ExportResult<Vec<u8>> {
        Err(ExportError::ImageUnavailable(url.to_string()))
    }
}

#[derive(Default)]
struct ScriptedRecognizer {
    sender: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
}

impl ScriptedRecognizer {
    fn say(&self, event: RecognitionEvent) {
        if let Some(tx) = self.sender.lock().as_ref() {
            tx.send(event).unwrap();
        }
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&self, _language: &str, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<(), String> {
        *self.sender.lock() = Some(events);
        Ok(())
    }

    fn stop(&self) {
        self.sender.lock().take();
    }
}

const PNG: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

fn session(backend: Arc<MemoryBackend>) -> RecipeSession {
    let export = ExportPipeline::new(ExportConfig::default(), RegionRegistry::new(), Arc::new(NoImages));
    let favorites = FavoriteSync::new(backend.clone()).shared();
    RecipeSession::new(backend, favorites, export, ApiConfig::new("http://localhost:8000"))
}

#[tokio::test]
async fn dictated_prompt_reaches_analysis() {
    let backend = Arc::new(MemoryBackend::default());
    let recognizer = Arc::new(ScriptedRecognizer::default());
    let config = SessionConfig::default();
    let mut session = session(backend.clone())
        .with_dictation(DictationBridge::new(recognizer.clone(), config.dictation_language));

    session.set_prompt("dinner for two");
    assert_eq!(session.toggle_dictation().unwrap(), DictationStart::Started);
    recognizer.say(RecognitionEvent::Final("extra spicy".into()));
    assert_eq!(
        session.pump_dictation().await,
        Some(DictationOutcome::Appended("extra spicy".into()))
    );
    assert_eq!(session.prompt().as_str(), "dinner for two extra spicy");

    session
        .attach([SelectedFile::new("fridge.png", PNG.to_vec())])
        .unwrap();
    let state = session.submit().await;
    assert!(matches!(state, AnalysisState::Success(ref o) if o.recipes.len() == 1));
    assert_eq!(backend.analyze_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_favorite_rolls_back_and_notifies() {
    let backend = Arc::new(MemoryBackend::default());
    let bus = EventBus::new();
    let mut notices = bus.subscribe();
    let export = ExportPipeline::new(ExportConfig::default(), RegionRegistry::new(), Arc::new(NoImages));
    let favorites = FavoriteSync::new(backend.clone()).with_bus(bus.clone()).shared();
    let mut session = RecipeSession::new(backend.clone(), favorites, export, ApiConfig::new("http://localhost:8000"))
        .with_bus(bus);

    session
        .attach([SelectedFile::new("a.png", PNG.to_vec())])
        .unwrap();
    session.submit().await;

    assert_eq!(session.toggle_favorite("Tofu 0").await.unwrap(), ToggleOutcome::Added);
    backend.reject_favorites.store(true, Ordering::SeqCst);
    assert!(session.toggle_favorite("Tofu 0").await.is_err());
    assert!(session.is_favorite("Tofu 0"));

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.topic, NoticeTopic::Favorites);
}

#[tokio::test]
async fn favorites_list_scrolls_to_the_end() {
    let backend = Arc::new(MemoryBackend::with_favorites(30));
    let sync = FavoriteSync::new(backend.clone()).shared();
    let list = FavoritesList::new(backend, Arc::clone(&sync), 12, EventBus::new());

    let far = ScrollViewport::new(0.0, 600.0, 3000.0);
    assert!(matches!(list.on_scroll(far, 200.0).await.unwrap(), LoadOutcome::Skipped(_)));

    let mut loads = 0;
    loop {
        let content = 100.0 * list.entries().len() as f32;
        let bottom = ScrollViewport::new((content - 600.0).max(0.0), 600.0, content);
        match list.on_scroll(bottom, 200.0).await.unwrap() {
            LoadOutcome::Loaded { exhausted, .. } => {
                loads += 1;
                if exhausted {
                    break;
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(loads, 3);
    assert_eq!(list.entries().len(), 30);
    assert_eq!(sync.len(), 30);
}

/// Whatever the server says, a toggle leaves no pending marker behind and
/// membership matches what the server holds.
#[test]
fn favorite_cache_matches_server_after_each_toggle() {
    proptest!(|(steps in prop::collection::vec((0usize..3, any::<bool>()), 1..20))| {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let backend = Arc::new(MemoryBackend::default());
        let sync = FavoriteSync::new(backend.clone());
        let recipes: Vec<Recipe> = (0..3)
            .map(|i| Recipe::new(format!("Dish {i}"), vec!["rice".into()], "Steam."))
            .collect();

        for (index, reject) in steps {
            backend.reject_favorites.store(reject, Ordering::SeqCst);
            let recipe = &recipes[index];
            let _ = rt.block_on(sync.toggle(recipe));

            prop_assert!(!sync.is_pending(&recipe.name));
            let on_server = backend
                .favorites
                .lock()
                .iter()
                .any(|f| f.recipe_data.name == recipe.name);
            prop_assert_eq!(sync.is_favorite(&recipe.name), on_server);
        }
    });
}
