use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Identifier of a content document
pub type DocumentId = u64;

/// Category tag carried by every content document and tour step
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContentType {
    Video,
    Image,
    #[default]
    Text,
    Blog,
}

/// A piece of site content the concierge can cite.
///
/// Documents are maintained by an external content process and are read-only
/// from the retriever's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Document {
    /// Unique identifier
    pub id: DocumentId,

    /// Short title
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Body text (or a URL for video/image content)
    pub content: String,

    /// Category tag
    #[serde(default)]
    pub content_type: ContentType,
}

impl Document {
    /// Create a new document
    pub fn new(
        id: DocumentId,
        title: impl Into<String>,
        content: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            content_type,
        }
    }

    /// Case-insensitive substring check against title or body.
    ///
    /// `needle` must already be lower-cased.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_content_type_parsing() {
        assert_eq!(ContentType::from_str("video").unwrap(), ContentType::Video);
        assert_eq!(ContentType::from_str("BLOG").unwrap(), ContentType::Blog);
        assert_eq!(ContentType::Image.to_string(), "image");
        assert!(ContentType::from_str("podcast").is_err());
    }

    #[test]
    fn test_contains_lowercase() {
        let doc = Document::new(1, "Autopod Pricing", "Our Autopod-based model", ContentType::Text);
        assert!(doc.contains_lowercase("pricing"));
        assert!(doc.contains_lowercase("autopod-based"));
        assert!(!doc.contains_lowercase("careers"));
        assert!(!doc.contains_lowercase(""));
    }
}
