use crate::domain::component::Container;

/// One post as rendered by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Stable identifier used for deduplication; `None` when the page did not
    /// expose one for this element.
    pub id: Option<String>,
    pub component: Container,
}

impl Post {
    pub fn new(id: Option<String>, component: Container) -> Self {
        Self { id, component }
    }

    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("(unidentified)")
    }
}

/// A post together with the markup it came from, detached from the DOM.
#[derive(Debug, Clone)]
pub struct ExtractedPost {
    pub post: Post,
    pub html: String,
}

/// Everything one cycle needs from a fetched page.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Identifiers in page order, used for the no-new-posts check and the cache.
    pub ids: Vec<Option<String>>,
    /// Posts in delivery order.
    pub posts: Vec<ExtractedPost>,
}

impl Extraction {
    /// Identifiers to persist; unidentified posts leave no trace in the cache.
    pub fn cache_ids(&self) -> Vec<String> {
        self.ids.iter().flatten().cloned().collect()
    }
}
