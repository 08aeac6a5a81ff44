use scraper::ElementRef;

use crate::domain::Post;
use crate::strategy::news::{absolute_link, news_post, LINK_SELECTOR};
use crate::strategy::Strategy;

/// Student projects showcase, rendered in the theme colour.
pub struct ProjectsStrategy {
    accent_color: Option<u32>,
}

impl ProjectsStrategy {
    pub fn new(accent_color: Option<u32>) -> Self {
        Self { accent_color }
    }
}

impl Strategy for ProjectsStrategy {
    fn posts_selector(&self) -> &str {
        "div.news-item"
    }

    fn ids_selector(&self) -> &str {
        LINK_SELECTOR
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        absolute_link(element)
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        news_post(element, self.accent_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::with_element;

    #[test]
    fn test_projects_use_accent_color() {
        let html = r#"<div class="news-item"><a href="/p/robot"></a><a href="/p/robot">Robot arm</a></div>"#;
        let strategy = ProjectsStrategy::new(Some(0x313183));
        let post = with_element(html, "div.news-item", |el| strategy.get_post_data(el));

        assert_eq!(post.component.accent_color, Some(0x313183));
        assert_eq!(post.id.as_deref(), Some("https://finki.ukim.mk/p/robot"));
    }
}
