//! Quote feed for the quotes screen
//!
//! The endpoint returns a JSON array of quote records. Both the long field
//! names (`text`, `author`) and the compact ones used by common quote APIs
//! (`q`, `a`) are accepted; extra fields are ignored.

use serde::{Deserialize, Serialize};

use crate::fetch::Payload;

/// Cache key for the quotes resource
pub const RESOURCE_KEY: &str = "quotes";

/// A single quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// The quoted text
    #[serde(alias = "q", alias = "quote")]
    pub text: String,
    /// Who said it
    #[serde(alias = "a")]
    pub author: String,
}

/// A batch of quotes returned by one fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteFeed {
    pub quotes: Vec<Quote>,
}

impl QuoteFeed {
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl Payload for QuoteFeed {
    fn validate(&self) -> Result<(), String> {
        if self.quotes.is_empty() {
            return Err("quote feed is empty".to_string());
        }
        if let Some(index) = self.quotes.iter().position(|q| q.text.trim().is_empty()) {
            return Err(format!("quote {} has no text", index));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{decode_json, FetchError};

    #[test]
    fn test_decodes_compact_field_names() {
        let body = br#"[
            {"q": "Simplicity is prerequisite for reliability.", "a": "Edsger W. Dijkstra", "h": "<blockquote/>"},
            {"q": "Make it work, make it right, make it fast.", "a": "Kent Beck"}
        ]"#;

        let feed: QuoteFeed = decode_json(body).expect("decode");

        assert_eq!(feed.len(), 2);
        assert_eq!(feed.quotes[0].author, "Edsger W. Dijkstra");
        assert!(feed.quotes[1].text.starts_with("Make it work"));
    }

    #[test]
    fn test_cached_form_uses_long_field_names() {
        let feed = QuoteFeed {
            quotes: vec![Quote {
                text: "Hello".to_string(),
                author: "World".to_string(),
            }],
        };

        let json = serde_json::to_string(&feed).expect("serialize");

        assert_eq!(json, r#"[{"text":"Hello","author":"World"}]"#);
        assert_eq!(decode_json::<QuoteFeed>(json.as_bytes()).expect("decode"), feed);
    }

    #[test]
    fn test_rejects_empty_feed() {
        let err = decode_json::<QuoteFeed>(b"[]").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_rejects_missing_author() {
        let err = decode_json::<QuoteFeed>(br#"[{"q": "Orphan quote"}]"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_rejects_blank_text() {
        let err = decode_json::<QuoteFeed>(br#"[{"q": "   ", "a": "Nobody"}]"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(msg) if msg.contains("no text")));
    }

    #[test]
    fn test_rejects_object_instead_of_list() {
        let err = decode_json::<QuoteFeed>(br#"{"q": "x", "a": "y"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
