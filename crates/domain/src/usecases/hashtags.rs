//! Hashtag composition - explicit tags, defaults and taxonomy terms, in that order

use crate::model::{ContentItem, PostRecord};
use crate::settings::HashtagSettings;

/// Builds the hashtag suffix for a post
pub struct HashtagComposer {
    settings: HashtagSettings,
}

impl HashtagComposer {
    pub fn new(settings: HashtagSettings) -> Self {
        Self { settings }
    }

    /// Compose the space-separated `#tag` list for an item
    ///
    /// Sources are consumed in precedence order until the maximum is reached:
    /// the item's custom hashtags, the global defaults, then (if enabled) the
    /// item's taxonomy terms. Duplicates keep their first position.
    pub fn compose(&self, item: &ContentItem, record: &PostRecord) -> String {
        let max = self.settings.max_hashtags;
        let mut tags = TagList::new(max);

        if let Some(custom) = record.custom_hashtags.as_deref() {
            for tag in split_tags(custom) {
                tags.push(strip_non_word(tag.trim_matches('#')));
            }
        }

        if !tags.is_full() {
            for tag in split_tags(&self.settings.default_hashtags) {
                tags.push(tag.trim_matches('#').to_string());
            }
        }

        if !tags.is_full() && self.settings.use_taxonomy {
            for term in &item.taxonomy_terms {
                if tags.is_full() {
                    break;
                }
                tags.push(strip_non_word(term));
            }
        }

        let result = tags.render();
        tracing::debug!(item_id = item.id, hashtags = %result, "Composed hashtags");
        result
    }
}

/// Order-preserving, duplicate-free, bounded accumulator
struct TagList {
    max: usize,
    tags: Vec<String>,
}

impl TagList {
    fn new(max: usize) -> Self {
        Self {
            max,
            tags: Vec::with_capacity(max),
        }
    }

    fn is_full(&self) -> bool {
        self.tags.len() >= self.max
    }

    fn push(&mut self, tag: String) {
        if tag.is_empty() || self.is_full() || self.tags.contains(&tag) {
            return;
        }
        self.tags.push(tag);
    }

    fn render(&self) -> String {
        self.tags
            .iter()
            .map(|tag| format!("#{}", tag))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}

/// Keep only letters, digits and underscores (any script)
fn strip_non_word(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Clean up a hashtag field as typed into the editor
///
/// Trims, drops control characters and collapses runs of whitespace; the
/// comma-separated structure is left to [`HashtagComposer`].
pub fn sanitize_hashtag_field(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn item_with_terms(terms: &[&str]) -> ContentItem {
        ContentItem {
            id: 1,
            title: "Title".to_string(),
            url: "https://example.com/?p=1".to_string(),
            published_at: OffsetDateTime::UNIX_EPOCH,
            taxonomy_terms: terms.iter().map(|t| t.to_string()).collect(),
            content_type: "post".to_string(),
        }
    }

    fn record_with_custom(custom: &str) -> PostRecord {
        PostRecord {
            custom_hashtags: Some(custom.to_string()),
            ..Default::default()
        }
    }

    fn composer(defaults: &str, use_taxonomy: bool, max: usize) -> HashtagComposer {
        HashtagComposer::new(HashtagSettings {
            default_hashtags: defaults.to_string(),
            use_taxonomy,
            max_hashtags: max,
        })
    }

    #[test]
    fn test_precedence_and_dedup() {
        let result = composer("b,c", true, 3)
            .compose(&item_with_terms(&["d"]), &record_with_custom("a,b"));
        assert_eq!(result, "#a #b #c");
    }

    #[test]
    fn test_taxonomy_fills_remaining_slots() {
        let result = composer("news", true, 5).compose(
            &item_with_terms(&["Web Dev", "Rust-Lang", "news"]),
            &record_with_custom("#release"),
        );
        assert_eq!(result, "#release #news #WebDev #RustLang");
    }

    #[test]
    fn test_taxonomy_disabled() {
        let result = composer("", false, 3)
            .compose(&item_with_terms(&["Rust"]), &PostRecord::default());
        assert_eq!(result, "");
    }

    #[test]
    fn test_max_zero_yields_empty() {
        let result = composer("x,y", true, 0)
            .compose(&item_with_terms(&["z"]), &record_with_custom("a"));
        assert_eq!(result, "");
    }

    #[test]
    fn test_custom_tags_strip_symbols_unicode_aware() {
        let result = composer("", false, 5).compose(
            &item_with_terms(&[]),
            &record_with_custom(" ##日本語!, c++ , snake_case ,  ,#"),
        );
        assert_eq!(result, "#日本語 #c #snake_case");
    }

    #[test]
    fn test_default_tags_only_trim_hashes() {
        let result = composer(" #rust , #open-source# ", false, 5)
            .compose(&item_with_terms(&[]), &PostRecord::default());
        assert_eq!(result, "#rust #open-source");
    }

    #[test]
    fn test_custom_tags_capped_at_max() {
        let result = composer("", true, 2)
            .compose(&item_with_terms(&["t"]), &record_with_custom("a,b,c,d"));
        assert_eq!(result, "#a #b");
    }

    #[test]
    fn test_cap_and_uniqueness_hold_for_all_maxima() {
        let item = item_with_terms(&["a", "Tax", "tax!", "e"]);
        let record = record_with_custom("a,,b,a,#b");
        for max in 0..=5 {
            let result = composer("b,c,a", true, max).compose(&item, &record);
            let terms: Vec<&str> = result.split_whitespace().collect();
            assert!(terms.len() <= max, "max {} gave {:?}", max, terms);
            let mut unique = terms.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), terms.len());
            assert!(terms.iter().all(|t| t.len() > 1 && t.starts_with('#')));
        }
    }

    #[test]
    fn test_sanitize_hashtag_field() {
        assert_eq!(sanitize_hashtag_field("  rust,\ttokio \n"), "rust, tokio");
        assert_eq!(sanitize_hashtag_field("a\u{0007}b"), "ab");
        assert_eq!(sanitize_hashtag_field("   "), "");
    }
}
