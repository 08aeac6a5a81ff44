use scraper::ElementRef;

use crate::auth::Service;
use crate::domain::markdown::{bold, description_or_placeholder, heading};
use crate::domain::{Container, Post, Spacing};
use crate::strategy::{collapse_whitespace, select_all, select_text, Strategy};

/// Bachelor thesis registrations.
pub struct DiplomasStrategy {
    accent_color: Option<u32>,
}

impl DiplomasStrategy {
    pub fn new(accent_color: Option<u32>) -> Self {
        Self { accent_color }
    }
}

/// Text of the second cell in `row`, or "?".
pub(crate) fn cell_text(rows: &[ElementRef<'_>], row: usize) -> String {
    rows.get(row)
        .and_then(|tr| select_text(*tr, "td:nth-of-type(2)"))
        .unwrap_or_else(|| "?".to_string())
}

impl Strategy for DiplomasStrategy {
    fn posts_selector(&self) -> &str {
        "div.panel"
    }

    fn ids_selector(&self) -> &str {
        "div.panel-heading"
    }

    fn service(&self) -> Option<Service> {
        Some(Service::Diplomas)
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        select_text(element, self.ids_selector()).map(|text| collapse_whitespace(&text))
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        let title = select_text(element, "div.panel-heading").unwrap_or_else(|| "?".to_string());
        let rows = select_all(element, "div.panel-body table tr");

        let student_cell = cell_text(&rows, 0);
        let (index, student) = match student_cell.split_once(" - ") {
            Some((index, student)) => (index.trim().to_string(), student.trim().to_string()),
            None => (student_cell.trim().to_string(), "?".to_string()),
        };
        let mentor = cell_text(&rows, 1);
        let first_member = cell_text(&rows, 2);
        let second_member = cell_text(&rows, 3);
        let content = cell_text(&rows, 7);

        let container = Container::new()
            .text(bold(&format!("{} - {}", index, student)))
            .separator(Spacing::Large)
            .text(heading(&title, 3))
            .spacer(Spacing::Small)
            .text(description_or_placeholder(&content))
            .separator(Spacing::Large)
            .text(format!("{} {}", bold("Ментор:"), mentor))
            .text(format!("{} {}", bold("Член 1:"), first_member))
            .text(format!("{} {}", bold("Член 2:"), second_member))
            .accent_color(self.accent_color);

        Post::new(self.get_id(element), container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::with_element;

    const PANEL: &str = r#"
        <div class="panel">
            <div class="panel-heading">
                Web   scraping
                in Rust
            </div>
            <div class="panel-body"><table>
                <tr><td>Студент</td><td>201234 - Петар Петровски</td></tr>
                <tr><td>Ментор</td><td>Ментор Едно</td></tr>
                <tr><td>Член 1</td><td>Член Едно</td></tr>
                <tr><td>Член 2</td><td>Член Два</td></tr>
                <tr><td>Датум</td><td>01.01.2026</td></tr>
                <tr><td>Соба</td><td>138</td></tr>
                <tr><td>Статус</td><td>Одобрена</td></tr>
                <tr><td>Опис</td><td>Scraping pages politely.</td></tr>
            </table></div>
        </div>"#;

    #[test]
    fn test_diploma_id_collapses_whitespace() {
        let id = with_element(PANEL, "div.panel", |el| DiplomasStrategy::new(None).get_id(el));
        assert_eq!(id.as_deref(), Some("Web scraping in Rust"));
    }

    #[test]
    fn test_diploma_rendering() {
        let strategy = DiplomasStrategy::new(Some(0x313183));
        let post = with_element(PANEL, "div.panel", |el| strategy.get_post_data(el));
        let text = post.component.plain_text();

        assert!(text.starts_with("**201234 - Петар Петровски**\n### Web"));
        assert!(text.contains("Scraping pages politely."));
        assert!(text.ends_with("**Ментор:** Ментор Едно\n**Член 1:** Член Едно\n**Член 2:** Член Два"));
        assert_eq!(post.component.accent_color, Some(0x313183));
    }

    #[test]
    fn test_diploma_without_table() {
        let html = r#"<div class="panel"><div class="panel-heading">T</div></div>"#;
        let post = with_element(html, "div.panel", |el| DiplomasStrategy::new(None).get_post_data(el));
        let text = post.component.plain_text();

        assert!(text.starts_with("**? - ?**"));
        assert!(text.contains("**Ментор:** ?"));
    }
}
