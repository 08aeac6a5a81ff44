use scraper::ElementRef;

use crate::domain::markdown::linked_heading;
use crate::domain::{Container, Post};
use crate::strategy::{collapse_whitespace, select_attr, text_of, Strategy};

const PARTNER_LABELS: [&str; 2] = ["Gold partner", "Silver partner"];

/// Partner companies listed on the faculty site.
pub struct PartnersStrategy;

fn clean_partner_name(text: &str) -> Option<String> {
    let mut name = text.to_string();
    for label in PARTNER_LABELS {
        name = name.replacen(label, "", 1).trim().to_string();
    }
    Some(collapse_whitespace(&name)).filter(|name| !name.is_empty())
}

/// The A1 banner is an image link without a readable name.
fn is_a1(url: &str) -> bool {
    url.contains("a1.com")
}

impl Strategy for PartnersStrategy {
    fn posts_selector(&self) -> &str {
        "div.card, div.support"
    }

    fn ids_selector(&self) -> &str {
        "a"
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        match select_attr(element, "a", "href") {
            Some(url) if is_a1(&url) => Some("A1".to_string()),
            _ => clean_partner_name(&text_of(element)),
        }
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        let url = select_attr(element, "a", "href");
        let name = self.get_id(element).unwrap_or_else(|| "?".to_string());

        let container = Container::new()
            .text(linked_heading(&name, url.as_deref(), 2))
            .text("Нов партнер на ФИНКИ");

        Post::new(self.get_id(element), container)
    }
}
