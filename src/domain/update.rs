use chrono::{DateTime, Utc};

/// A single comic strip (or other content item) ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub source_id: String,
    pub title: String,
    pub description: Option<String>,
    /// `description` is Telegram MarkdownV2 (already escaped) rather than plain text.
    pub markdown: bool,
    pub timestamp: DateTime<Utc>,
    /// Raw image payloads, in delivery order.
    pub images: Vec<Vec<u8>>,
}

impl Update {
    pub fn new(source_id: &str, title: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            source_id: source_id.to_string(),
            title: title.into(),
            description: None,
            markdown: false,
            timestamp,
            images: Vec::new(),
        }
    }

    /// Plain-text description, sent verbatim.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self.markdown = false;
        self
    }

    /// Description already converted to MarkdownV2.
    pub fn with_markdown_description(mut self, description: Option<String>) -> Self {
        self = self.with_description(description);
        self.markdown = true;
        self
    }

    pub fn with_images(mut self, images: Vec<Vec<u8>>) -> Self {
        self.images = images;
        self
    }

    /// Description text if there is anything worth sending.
    pub fn display_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Caption attached to every image of this update.
    pub fn caption(&self) -> String {
        format!(
            "{} - {}",
            self.title,
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Update {
        Update::new("xkcd", "Exploits of a Mom", Utc.with_ymd_and_hms(2024, 3, 1, 4, 5, 6).unwrap())
    }

    #[test]
    fn test_caption_contains_title_and_timestamp() {
        assert_eq!(sample().caption(), "Exploits of a Mom - 2024-03-01 04:05:06");
    }

    #[test]
    fn test_blank_description_is_dropped() {
        let update = sample().with_description(Some("   ".into()));
        assert_eq!(update.description, None);
        assert_eq!(update.display_description(), None);
    }

    #[test]
    fn test_description_is_kept() {
        let update = sample().with_description(Some("Her daughter is named Help".into()));
        assert_eq!(update.display_description(), Some("Her daughter is named Help"));
    }

    #[test]
    fn test_description_format() {
        assert!(!sample().with_description(Some("a_b".into())).markdown);
        assert!(sample().with_markdown_description(Some("a\\_b".into())).markdown);
    }

    #[test]
    fn test_text_only_update_has_no_images() {
        let update = sample();
        assert!(update.images.is_empty());
    }
}
