use scraper::ElementRef;

use crate::auth::Service;
use crate::domain::markdown::{bold, description_or_placeholder, heading};
use crate::domain::{Container, Post, Spacing};
use crate::strategy::diplomas::cell_text;
use crate::strategy::{collapse_whitespace, select_all, select_first, select_text, Strategy};

/// Master thesis registrations.
pub struct MastersStrategy;

impl Strategy for MastersStrategy {
    fn posts_selector(&self) -> &str {
        "div.row.rounded"
    }

    fn ids_selector(&self) -> &str {
        "h5.p-2.mt-1"
    }

    fn service(&self) -> Option<Service> {
        Some(Service::Masters)
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        select_text(element, self.ids_selector()).map(|text| collapse_whitespace(&text))
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        let title = select_text(element, "h5").unwrap_or_else(|| "?".to_string());
        let rows = select_all(element, "table tbody tr");

        let student_cell = rows
            .first()
            .and_then(|tr| select_first(*tr, "td:nth-of-type(2)"));
        let span = |n: usize| {
            student_cell
                .and_then(|cell| select_text(cell, &format!("span:nth-of-type({})", n)))
                .unwrap_or_else(|| "?".to_string())
        };
        let index = span(1);
        let student = format!("{} {}", span(2), span(3));

        let mentor = cell_text(&rows, 1);
        let president = cell_text(&rows, 2);
        let member = cell_text(&rows, 3);
        let content = cell_text(&rows, 8);

        let container = Container::new()
            .text(bold(&format!("{} - {}", index, student)))
            .separator(Spacing::Large)
            .text(heading(&title, 3))
            .spacer(Spacing::Small)
            .text(description_or_placeholder(&content))
            .separator(Spacing::Large)
            .text(format!("{} {}", bold("Ментор:"), mentor))
            .text(format!("{} {}", bold("Претседател:"), president))
            .text(format!("{} {}", bold("Член:"), member));

        Post::new(self.get_id(element), container)
    }
}
