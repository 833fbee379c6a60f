// Output formatting and styling

use colored::Colorize;
use cookroom_api::{FavoriteEntry, HistoryEntry, Recipe};
use cookroom_sessions::{Notice, NoticeLevel};

use crate::logging::VerbosityLevel;

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl OutputStyle {
    /// Format success message
    pub fn success(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✓".green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        }
    }

    /// Format error message
    pub fn error(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✗".red().bold(), msg)
        } else {
            format!("✗ {}", msg)
        }
    }

    /// Format warning message
    pub fn warning(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "⚠".yellow(), msg)
        } else {
            format!("⚠ {}", msg)
        }
    }

    /// Format info message
    pub fn info(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "ℹ".blue(), msg)
        } else {
            format!("ℹ {}", msg)
        }
    }

    /// Format header
    pub fn header(&self, title: &str) -> String {
        if self.use_colors {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format a section header
    pub fn section(&self, title: &str) -> String {
        let rule = "─".repeat(title.chars().count());
        if self.use_colors {
            format!("\n{}\n{}", title.bold().underline(), rule)
        } else {
            format!("\n{}\n{}", title, rule)
        }
    }

    /// Format error with suggestions
    pub fn error_with_suggestion(&self, error: &str, suggestion: &str) -> String {
        let error_msg = self.error(error);
        let suggestion_msg = self.info(&format!("Suggestion: {}", suggestion));
        format!("{}\n{}", error_msg, suggestion_msg)
    }

    /// Format a list item
    pub fn list_item(&self, item: &str) -> String {
        format!("  • {}", item)
    }

    /// Format a numbered list item
    pub fn numbered_item(&self, number: usize, item: &str) -> String {
        format!("  {}. {}", number, item)
    }

    /// Format a key-value pair
    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.use_colors {
            format!("  {}: {}", key.bold(), value)
        } else {
            format!("  {}: {}", key, value)
        }
    }

    /// Format a session notice by severity
    pub fn notice(&self, notice: &Notice) -> String {
        match notice.level {
            NoticeLevel::Info => self.info(&notice.message),
            NoticeLevel::Warning => self.warning(&notice.message),
            NoticeLevel::Error => self.error(&notice.message),
        }
    }

    /// Full recipe card
    pub fn recipe(&self, recipe: &Recipe) -> String {
        let mut lines = vec![self.section(&recipe.name)];
        if let Some(english) = recipe.english_name.as_deref().filter(|e| !e.trim().is_empty()) {
            lines.push(self.key_value("English", english));
        }
        if !recipe.ingredients.is_empty() {
            lines.push(self.header("Ingredients"));
            lines.extend(recipe.ingredients.iter().map(|i| self.list_item(i)));
        }
        let steps: Vec<&str> = recipe
            .instructions
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if !steps.is_empty() {
            lines.push(self.header("Instructions"));
            lines.extend(
                steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| self.numbered_item(i + 1, step)),
            );
        }
        lines.join("\n")
    }

    /// One line per history entry
    pub fn history_line(&self, entry: &HistoryEntry) -> String {
        let recipes: Vec<String> = entry.recipes().into_iter().map(|r| r.name).collect();
        let prompt = entry
            .prompt_text
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("(no prompt)");
        let when = entry.created_at.as_deref().unwrap_or("-");
        format!("  #{:<5} {}  {}  → {}", entry.id, when, prompt, recipes.join(", "))
    }

    /// One line per favorite
    pub fn favorite_line(&self, entry: &FavoriteEntry) -> String {
        format!(
            "  #{:<5} {} ({} ingredients)",
            entry.id,
            entry.recipe_data.name,
            entry.recipe_data.ingredients.len()
        )
    }
}

/// Print formatted output
pub fn print_success(msg: &str) {
    if VerbosityLevel::Normal.should_output() {
        let style = OutputStyle::default();
        println!("{}", style.success(msg));
    }
}

pub fn print_error(msg: &str) {
    let style = OutputStyle::default();
    eprintln!("{}", style.error(msg));
}

pub fn print_info(msg: &str) {
    if VerbosityLevel::Normal.should_output() {
        let style = OutputStyle::default();
        println!("{}", style.info(msg));
    }
}
