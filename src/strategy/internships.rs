use scraper::ElementRef;

use crate::auth::Service;
use crate::domain::markdown::{description_or_placeholder, linked_heading};
use crate::domain::{Container, Post, Spacing};
use crate::strategy::{select_attr, select_first, select_text, Strategy};

const INTERNSHIPS_URL: &str = "https://internships.finki.ukim.mk";
const LINK_SELECTOR: &str =
    "div.d-flex.justify-content-between.align-items-center.card-footer.bg-transparent.border-0 > a";

/// Internship offers.
pub struct InternshipsStrategy {
    accent_color: Option<u32>,
}

impl InternshipsStrategy {
    pub fn new(accent_color: Option<u32>) -> Self {
        Self { accent_color }
    }

    fn link(element: ElementRef<'_>) -> Option<String> {
        select_attr(element, LINK_SELECTOR, "href").map(|path| format!("{}{}", INTERNSHIPS_URL, path))
    }

    /// Text of the `span` next to the given icon in the card details.
    fn detail(element: ElementRef<'_>, icon: &str) -> Option<String> {
        let icon = select_first(element, &format!("p.mb-1.text-secondary.small i.{}", icon))?;
        let parent = icon.parent().and_then(ElementRef::wrap)?;
        select_text(parent, "span")
    }
}

impl Strategy for InternshipsStrategy {
    fn posts_selector(&self) -> &str {
        "div.card.card-style"
    }

    fn ids_selector(&self) -> &str {
        LINK_SELECTOR
    }

    fn service(&self) -> Option<Service> {
        Some(Service::Internships)
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        Self::link(element)
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        let link = Self::link(element);
        let title = select_text(element, "h5.card-title").unwrap_or_else(|| "?".to_string());
        let description = select_text(element, "p.card-text").unwrap_or_else(|| "?".to_string());
        let company = Self::detail(element, "bi-building");
        let deadline = Self::detail(element, "bi-calendar-x");
        let status = select_text(element, "span.badge");

        let mut container = Container::new()
            .text(linked_heading(&title, link.as_deref(), 2))
            .text(description_or_placeholder(&description))
            .separator(Spacing::Large);

        for (label, value) in [
            ("**Компанија:**", company),
            ("**Статус:**", status),
            ("**Активен до:**", deadline),
        ] {
            if let Some(value) = value {
                container = container.text(format!("{} {}", label, value));
            }
        }

        Post::new(link, container.accent_color(self.accent_color))
    }
}
