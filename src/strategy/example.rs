use scraper::ElementRef;

use crate::domain::markdown::linked_heading;
use crate::domain::{Container, Post};
use crate::strategy::{select_attr, select_text, Strategy};

/// Minimal strategy to copy when adding a new site: one heading per
/// `article`, identified by its first link.
pub struct ExampleStrategy;

impl Strategy for ExampleStrategy {
    fn posts_selector(&self) -> &str {
        "article"
    }

    fn ids_selector(&self) -> &str {
        "a"
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        select_attr(element, self.ids_selector(), "href")
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        let link = select_attr(element, "a", "href");
        let title = select_text(element, "a").unwrap_or_else(|| "?".to_string());

        Post::new(
            self.get_id(element),
            Container::new().text(linked_heading(&title, link.as_deref(), 2)),
        )
    }
}
