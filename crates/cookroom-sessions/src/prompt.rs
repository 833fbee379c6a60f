//! Free-text prompt buffer

use std::fmt;

/// The user's prompt, edited by hand or filled by dictation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptText {
    text: String,
}

impl PromptText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Replace the text (manual edit)
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Append a transcript, separated by a space when text is already present
    pub fn append_transcript(&mut self, transcript: &str) {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return;
        }
        if !self.text.trim_end().is_empty() {
            let trimmed = self.text.trim_end().len();
            self.text.truncate(trimmed);
            self.text.push(' ');
        }
        self.text.push_str(transcript);
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl fmt::Display for PromptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_to_empty() {
        let mut prompt = PromptText::default();
        prompt.append_transcript("  make it spicy ");
        assert_eq!(prompt.as_str(), "make it spicy");
    }

    #[test]
    fn test_append_joins_with_space() {
        let mut prompt = PromptText::new("quick dinner  ");
        prompt.append_transcript("no nuts");
        assert_eq!(prompt.as_str(), "quick dinner no nuts");
    }

    #[test]
    fn test_blank_transcript_is_ignored() {
        let mut prompt = PromptText::new("vegan");
        prompt.append_transcript("   ");
        assert_eq!(prompt.to_string(), "vegan");
        assert!(!prompt.is_blank());
        prompt.clear();
        assert!(prompt.is_blank());
    }
}
