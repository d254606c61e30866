/// One playable audio item.
///
/// `tags` keeps first-seen order and never holds duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
}

impl Track {
    pub fn new<I, S>(url: impl Into<String>, title: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            let tag = tag.trim();
            if !tag.is_empty() && !unique.iter().any(|t| t == tag) {
                unique.push(tag.to_string());
            }
        }

        Self {
            url: url.into(),
            title: title.into(),
            tags: unique,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
