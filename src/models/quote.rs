use serde::{Deserialize, Serialize};

/// A single developer quote from the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identifier within the dataset
    pub id: String,
    /// Who said or wrote it
    pub author: String,
    /// The quote body
    pub text: String,
    /// Free-form tags, matched case-insensitively
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Quote {
    /// Whether the author contains `needle`, ignoring case.
    ///
    /// `needle` must already be lowercased.
    pub fn author_contains(&self, needle: &str) -> bool {
        self.author.to_lowercase().contains(needle)
    }

    /// Whether any tag equals `tag`, ignoring case.
    ///
    /// `tag` must already be lowercased.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }
}
