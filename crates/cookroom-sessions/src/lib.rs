//! Recipe-session controller for Cooking Room.
//!
//! - [`DictationBridge`]: voice input into the prompt
//! - [`AnalysisSession`]: one analysis request at a time, tagged result
//! - [`FavoriteSync`]: optimistic favorites with rollback
//! - [`PaginatedFeed`]: de-duplicated paging for history and favorites
//! - [`RecipeSession`]: the analysis screen tying it all together
//!
//! Components report user-facing problems on an [`EventBus`].

pub mod analysis;
pub mod bus;
pub mod config;
pub mod controller;
pub mod dictation;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod lists;
pub mod prompt;

#[cfg(test)]
mod testing;

pub use analysis::{AnalysisFailure, AnalysisSession, AnalysisState, FailureKind};
pub use bus::{EventBus, Notice, NoticeLevel, NoticeTopic};
pub use config::SessionConfig;
pub use controller::RecipeSession;
pub use dictation::{
    DictationBridge, DictationOutcome, DictationStart, DictationState, RecognitionEvent,
    SpeechRecognizer,
};
pub use error::{DictationError, FavoriteError, FeedError, SessionError, SessionResult};
pub use favorites::{FavoriteSync, ToggleOutcome};
pub use feed::{
    FavoritesSource, FeedItem, FeedSnapshot, HistorySource, LoadOutcome, PageSource, PaginatedFeed,
    ScrollViewport, SkipReason,
};
pub use lists::{FavoritesList, HistoryList};
pub use prompt::PromptText;
