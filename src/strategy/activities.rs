use scraper::ElementRef;

use crate::auth::Service;
use crate::domain::markdown::{bold, linked_heading, truncate, DEFAULT_TRUNCATE};
use crate::domain::{Container, Post, Spacing};
use crate::strategy::{select_attr, select_text, Strategy};

/// Activities (assignments, quizzes, files) of a course page.
pub struct ActivitiesStrategy;

/// Display name of a course module type, taken from the third class of the
/// activity element.
fn activity_type(module: &str) -> Option<&'static str> {
    match module {
        "assign" => Some("Задача"),
        "quiz" => Some("Квиз"),
        "resource" => Some("Датотека"),
        "folder" => Some("Папка"),
        "forum" => Some("Форум"),
        "url" => Some("Линк"),
        "page" => Some("Страница"),
        "label" => Some("Ознака"),
        "choice" => Some("Избор"),
        "feedback" => Some("Анкета"),
        "lesson" => Some("Лекција"),
        "workshop" => Some("Работилница"),
        "attendance" => Some("Присуство"),
        "bigbluebuttonbn" => Some("Онлајн предавање"),
        _ => None,
    }
}

impl Strategy for ActivitiesStrategy {
    fn posts_selector(&self) -> &str {
        "li.activity"
    }

    fn ids_selector(&self) -> &str {
        "li.activity"
    }

    fn service(&self) -> Option<Service> {
        Some(Service::Courses)
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        element
            .value()
            .attr("data-id")
            .map(|id| id.trim().to_string())
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        let name = select_attr(element, "div.activity-item", "data-activityname")
            .unwrap_or_else(|| "?".to_string());
        let link = select_attr(element, "div.activityname > a", "href");
        let description = select_text(element, "div.activity-altcontent");
        let kind = element
            .value()
            .attr("class")
            .and_then(|classes| classes.split_whitespace().nth(2))
            .and_then(activity_type);

        let mut container = Container::new().text(linked_heading(&name, link.as_deref(), 2));
        if let Some(kind) = kind {
            container = container.text(format!("{} {}", bold("Тип:"), kind));
        }
        if let Some(description) = description {
            container = container
                .separator(Spacing::Large)
                .text(truncate(&description, DEFAULT_TRUNCATE));
        }

        Post::new(self.get_id(element), container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::with_element;

    const ACTIVITY: &str = r#"
        <ul>
        <li class="activity activity-wrapper assign modtype_assign" data-id=" 8812 ">
            <div class="activity-item" data-activityname="Lab 3">
                <div class="activityname"><a href="https://courses.finki.ukim.mk/mod/assign/view.php?id=8812">Lab 3</a></div>
                <div class="activity-altcontent"> Submit by Friday. </div>
            </div>
        </li>
        </ul>"#;

    #[test]
    fn test_activity_fields() {
        let strategy = ActivitiesStrategy;
        let post = with_element(ACTIVITY, "li.activity", |el| strategy.get_post_data(el));

        assert_eq!(post.id.as_deref(), Some("8812"));
        assert_eq!(
            post.component.plain_text(),
            "## [Lab 3](https://courses.finki.ukim.mk/mod/assign/view.php?id=8812)\n\
             **Тип:** Задача\n\
             Submit by Friday."
        );
        assert_eq!(strategy.service(), Some(Service::Courses));
    }

    #[test]
    fn test_activity_minimal() {
        let html = r#"<ul><li class="activity"></li></ul>"#;
        let post = with_element(html, "li.activity", |el| ActivitiesStrategy.get_post_data(el));

        assert_eq!(post.id, None);
        assert_eq!(post.component.plain_text(), "## ?");
    }
}
