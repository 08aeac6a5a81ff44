use scraper::ElementRef;

use crate::domain::Post;
use crate::strategy::news::{absolute_link, news_post, LINK_SELECTOR};
use crate::strategy::Strategy;

/// Faculty events listing.
pub struct EventsStrategy;

impl Strategy for EventsStrategy {
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
        news_post(element, None)
    }
}
