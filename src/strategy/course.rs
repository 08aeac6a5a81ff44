use scraper::ElementRef;

use crate::auth::Service;
use crate::domain::markdown::{bold, description_or_placeholder, hyperlink, linked_heading};
use crate::domain::{Container, Post};
use crate::strategy::{select_attr, select_first, select_text, text_of, Strategy};

const PERMALINK: &str = r#"[title="Permanent link to this post"]"#;

/// Forum posts of a course announcements page.
pub struct CourseStrategy;

impl Strategy for CourseStrategy {
    fn posts_selector(&self) -> &str {
        "article"
    }

    fn ids_selector(&self) -> &str {
        PERMALINK
    }

    fn service(&self) -> Option<Service> {
        Some(Service::Courses)
    }

    fn get_id(&self, element: ElementRef<'_>) -> Option<String> {
        select_attr(element, PERMALINK, "href").filter(|href| !href.is_empty())
    }

    fn get_post_data(&self, element: ElementRef<'_>) -> Post {
        let link = select_attr(element, PERMALINK, "href");
        let author_image = select_attr(element, r#"img[title*="Picture of"]"#, "src");

        let author = select_first(element, "div.mb-3").and_then(|div| select_first(div, "a"));
        let author_name = author
            .map(text_of)
            .unwrap_or_else(|| "?".to_string());
        let author_link = author.and_then(|a| a.value().attr("href")).map(str::trim);

        let content =
            select_text(element, "div.post-content-container").unwrap_or_else(|| "?".to_string());
        let title = select_text(element, "h4 > a:last-of-type").unwrap_or_else(|| "?".to_string());

        let texts = vec![
            match author_link {
                Some(href) => bold(&hyperlink(&author_name, href)),
                None => bold(&author_name),
            },
            linked_heading(&title, link.as_deref(), 3),
            description_or_placeholder(&content),
        ];

        let container = match author_image {
            Some(image) => Container::new().section(texts, image),
            None => Container::new().texts(texts),
        };

        Post::new(self.get_id(element), container)
    }

    /// Oldest first, dropping the oldest 30% of the page.
    fn filter_posts<'a>(&self, mut posts: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
        let skip = posts.len() * 3 / 10;
        posts.reverse();
        posts.split_off(skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Component;
    use crate::strategy::extract;
    use crate::strategy::tests::with_element;

    fn article(id: u32) -> String {
        format!(
            r##"<article>
                <h4><a href="#">Re:</a> <a href="https://courses.finki.ukim.mk/mod/forum/discuss.php?d={id}">Exam {id}</a></h4>
                <div class="mb-3"><img title="Picture of Ana" src="https://courses.finki.ukim.mk/pic/ana.jpg">
                    by <a href="https://courses.finki.ukim.mk/user/profile.php?id=7">Ana</a></div>
                <div class="post-content-container"> Room 138. </div>
                <a title="Permanent link to this post" href="https://courses.finki.ukim.mk/mod/forum/discuss.php?d={id}#p{id}">Permalink</a>
            </article>"##
        )
    }

    #[test]
    fn test_course_post_renders_section_with_author() {
        let html = article(15);
        let post = with_element(&html, "article", |el| CourseStrategy.get_post_data(el));

        assert_eq!(
            post.id.as_deref(),
            Some("https://courses.finki.ukim.mk/mod/forum/discuss.php?d=15#p15")
        );
        match &post.component.components[0] {
            Component::Section { texts, thumbnail } => {
                assert_eq!(thumbnail, "https://courses.finki.ukim.mk/pic/ana.jpg");
                assert_eq!(
                    texts[0],
                    "**[Ana](https://courses.finki.ukim.mk/user/profile.php?id=7)**"
                );
                assert!(texts[1].starts_with("### [Exam 15]("));
                assert_eq!(texts[2], "Room 138.");
            }
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_course_filter_drops_oldest_share() {
        let page: String = (1..=10).rev().map(article).collect();
        let extraction = extract(&CourseStrategy, &page, 20).unwrap();

        assert_eq!(extraction.ids.len(), 10);
        let titles: Vec<_> = extraction
            .posts
            .iter()
            .map(|p| p.post.id.clone().unwrap())
            .collect();
        // page lists 10..1; reversed 1..10; the 3 oldest are dropped
        assert_eq!(titles.len(), 7);
        assert!(titles[0].ends_with("#p4"));
        assert!(titles[6].ends_with("#p10"));
    }

    #[test]
    fn test_course_empty_permalink_is_unidentified() {
        let html = r#"<article><a title="Permanent link to this post" href=" "></a></article>"#;
        let id = with_element(html, "article", |el| CourseStrategy.get_id(el));
        assert_eq!(id, None);
    }
}
