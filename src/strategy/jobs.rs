use scraper::ElementRef;

use crate::domain::Post;
use crate::strategy::news::{absolute_link, news_post, LINK_SELECTOR};
use crate::strategy::Strategy;

/// Job offers posted on the faculty site.
pub struct JobsStrategy;

impl Strategy for JobsStrategy {
    fn posts_selector(&self) -> &str {
        "div.views-row"
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
