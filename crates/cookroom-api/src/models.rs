//! Records exchanged with the recipe backend.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A recipe suggested by the analysis service.
///
/// `name` identifies the recipe within a result set. Records are immutable once
/// received; camelCase keys from older clients are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,

    #[serde(default, alias = "englishName", skip_serializing_if = "Option::is_none")]
    pub english_name: Option<String>,

    #[serde(default)]
    pub ingredients: Vec<String>,

    #[serde(default, deserialize_with = "text_or_steps")]
    pub instructions: String,

    #[serde(default, alias = "imagePath", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl Recipe {
    /// Create a recipe with the required fields
    pub fn new(
        name: impl Into<String>,
        ingredients: Vec<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            english_name: None,
            ingredients,
            instructions: instructions.into(),
            image_path: None,
        }
    }

    pub fn with_english_name(mut self, english_name: impl Into<String>) -> Self {
        self.english_name = Some(english_name.into());
        self
    }

    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    /// English name when present and non-blank, otherwise the native name
    pub fn search_term(&self) -> &str {
        self.english_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }

    /// Whether the recipe carries both ingredients and instructions
    pub fn is_complete(&self) -> bool {
        !self.ingredients.is_empty() && !self.instructions.trim().is_empty()
    }
}

fn text_or_steps<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrSteps {
        Text(String),
        Steps(Vec<String>),
        Missing(()),
    }

    Ok(match TextOrSteps::deserialize(deserializer)? {
        TextOrSteps::Text(text) => text,
        TextOrSteps::Steps(steps) => steps.join("\n"),
        TextOrSteps::Missing(()) => String::new(),
    })
}

/// Ingredients the service spotted plus the recipes it suggests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub detected_ingredients: Vec<String>,
    pub recipes: Vec<Recipe>,
}

/// The shapes `/analyze` is known to answer with.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnalyzeResponse {
    Flat(Vec<Recipe>),
    Wrapped {
        recipes: Vec<Recipe>,
        #[serde(default, alias = "detectedIngredients")]
        detected_ingredients: Vec<String>,
    },
    Failed {
        error: String,
    },
    Rejected {
        detail: Value,
    },
}

/// Normalize any accepted analysis payload into one model.
///
/// Returns the server-supplied reason when the payload is an error object.
pub fn normalize_analysis(value: Value) -> Result<AnalysisOutcome, String> {
    match serde_json::from_value::<AnalyzeResponse>(value) {
        Ok(AnalyzeResponse::Flat(recipes)) => Ok(AnalysisOutcome {
            detected_ingredients: Vec::new(),
            recipes,
        }),
        Ok(AnalyzeResponse::Wrapped {
            recipes,
            detected_ingredients,
        }) => Ok(AnalysisOutcome {
            detected_ingredients,
            recipes,
        }),
        Ok(AnalyzeResponse::Failed { error }) => Err(error),
        Ok(AnalyzeResponse::Rejected { detail }) => Err(match detail {
            Value::String(s) => s,
            other => other.to_string(),
        }),
        Err(e) => Err(format!("unrecognized analysis response: {e}")),
    }
}

/// One image part of an analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }
}

/// A past analysis stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub input_image_path: Option<String>,
    #[serde(default)]
    pub analysis_result: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HistoryEntry {
    /// Recipes stored with this entry; empty when the stored result is unreadable
    pub fn recipes(&self) -> Vec<Recipe> {
        self.analysis_result
            .clone()
            .and_then(|value| normalize_analysis(value).ok())
            .map(|outcome| outcome.recipes)
            .unwrap_or_default()
    }
}

/// A saved favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: i64,
    pub recipe_data: Recipe,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /favorites`.
#[derive(Debug, Serialize)]
pub struct FavoriteCreate<'a> {
    pub recipe_data: &'a Recipe,
}

/// Offset window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Number of records to skip
    pub fn skip(&self) -> usize {
        self.page * self.page_size
    }

    /// Maximum number of records to return
    pub fn limit(&self) -> usize {
        self.page_size
    }
}
