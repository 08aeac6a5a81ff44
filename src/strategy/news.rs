//! Listing layout shared by the faculty news, jobs and projects pages.

use scraper::ElementRef;

use crate::domain::markdown::{description_or_placeholder, linked_heading};
use crate::domain::{Container, Post};
use crate::strategy::{select_attr, select_first, select_text};

pub(crate) const FACULTY_URL: &str = "https://finki.ukim.mk";
pub(crate) const LINK_SELECTOR: &str = "a + a";
const CONTENT_SELECTOR: &str = "div.col-xs-12.col-sm-8 > div.field-content";

pub(crate) fn absolute_link(element: ElementRef<'_>) -> Option<String> {
    select_attr(element, LINK_SELECTOR, "href").map(|path| format!("{}{}", FACULTY_URL, path))
}

/// Title linked to the article, a short body and the teaser image when present.
pub(crate) fn news_post(element: ElementRef<'_>, accent_color: Option<u32>) -> Post {
    let link = absolute_link(element);
    let title = select_text(element, LINK_SELECTOR).unwrap_or_else(|| "?".to_string());
    let content = select_text(element, CONTENT_SELECTOR).unwrap_or_else(|| "?".to_string());
    let image = select_first(element, "img")
        .and_then(|img| img.value().attr("src"))
        .and_then(|src| src.split('?').next())
        .map(String::from);

    let texts = vec![
        linked_heading(&title, link.as_deref(), 3),
        description_or_placeholder(&content),
    ];

    let container = match image {
        Some(image) => Container::new().section(texts, image),
        None => Container::new().texts(texts),
    };

    Post::new(link, container.accent_color(accent_color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Component;
    use crate::strategy::tests::with_element;

    const ITEM: &str = r#"
        <div class="news-item">
            <a href="/news/open-day"><img src="/files/open-day.jpg?itok=abc"></a>
            <a href="/news/open-day">Open day</a>
            <div class="col-xs-12 col-sm-8"><div class="field-content"> Come visit us. </div></div>
        </div>"#;

    #[test]
    fn test_news_post_with_image() {
        let post = with_element(ITEM, "div.news-item", |el| news_post(el, None));

        assert_eq!(post.id.as_deref(), Some("https://finki.ukim.mk/news/open-day"));
        match &post.component.components[0] {
            Component::Section { texts, thumbnail } => {
                assert_eq!(thumbnail, "/files/open-day.jpg");
                assert_eq!(texts[0], "### [Open day](https://finki.ukim.mk/news/open-day)");
                assert_eq!(texts[1], "Come visit us.");
            }
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_news_post_without_link_or_image() {
        let html = r#"<div class="news-item"><a>Only</a></div>"#;
        let post = with_element(html, "div.news-item", |el| news_post(el, Some(7)));

        assert_eq!(post.id, None);
        assert_eq!(post.component.accent_color, Some(7));
        assert_eq!(post.component.plain_text(), "### ?\n?");
    }
}
