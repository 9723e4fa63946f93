//! Rendering use case - turns a content item into post text

use crate::model::ContentItem;

/// Renderer for new-publish and update messages
pub struct Renderer {
    update_template: String,
}

impl Renderer {
    pub fn new(update_template: impl Into<String>) -> Self {
        Self {
            update_template: update_template.into(),
        }
    }

    /// Message for a newly published item: `title url [hashtags]`
    pub fn render_new_post(&self, item: &ContentItem, hashtags: &str) -> String {
        append_hashtags(format!("{} {}", item.title, item.url), hashtags)
    }

    /// Message for an updated item, from the configured template
    pub fn render_update(&self, item: &ContentItem, hashtags: &str) -> String {
        let text = self
            .update_template
            .replace("{title}", &item.title)
            .replace("{url}", &item.url);
        append_hashtags(text, hashtags)
    }
}

fn append_hashtags(mut text: String, hashtags: &str) -> String {
    if !hashtags.is_empty() {
        text.push(' ');
        text.push_str(hashtags);
    }
    text
}
