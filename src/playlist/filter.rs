use crate::library::Track;

/// Selected tags. Empty means "show everything".
///
/// A track passes when it carries any of the selected tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    tags: Vec<String>,
}

impl Filter {
    /// Add `tag` if absent, remove it if present. Returns whether the tag is
    /// selected afterwards.
    pub fn toggle(&mut self, tag: &str) -> bool {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
            false
        } else {
            self.tags.push(tag.to_string());
            true
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn matches(&self, track: &Track) -> bool {
        self.is_empty() || self.tags.iter().any(|t| track.has_tag(t))
    }
}

/// Lowercased substring matched against lowercased titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn new(text: &str) -> Self {
        Self(text.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, c: char) {
        self.0.extend(c.to_lowercase());
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn matches(&self, title: &str) -> bool {
        self.0.is_empty() || title.to_lowercase().contains(&self.0)
    }
}
