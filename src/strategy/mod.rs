//! Site-specific extraction logic.
//!
//! Each source names a [`StrategyKind`]; [`create_strategy`] turns it into a
//! boxed [`Strategy`] that the scraper drives through [`extract`].

pub mod activities;
pub mod course;
pub mod diplomas;
pub mod events;
pub mod example;
pub mod internships;
pub mod jobs;
pub mod masters;
mod news;
pub mod partners;
pub mod projects;

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::app::{Result, ScraperError};
use crate::auth::Service;
use crate::domain::{ExtractedPost, Extraction, Post};
use crate::fetcher::RequestParams;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

pub trait Strategy: Send + Sync {
    /// CSS selector matching every post container on the page.
    fn posts_selector(&self) -> &str;

    /// CSS selector locating the identifier inside a post container.
    fn ids_selector(&self) -> &str;

    fn get_id(&self, element: ElementRef<'_>) -> Option<String>;

    fn get_post_data(&self, element: ElementRef<'_>) -> Post;

    /// Authenticated service the source lives behind, if any.
    fn service(&self) -> Option<Service> {
        None
    }

    fn request_params(&self, cookie: Option<&str>) -> RequestParams {
        match cookie {
            Some(cookie) => RequestParams::with_cookie(cookie),
            None => RequestParams::none(),
        }
    }

    /// Delivery order. Pages list newest first, so the default is reversed.
    fn filter_posts<'a>(&self, mut posts: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
        posts.reverse();
        posts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Activities,
    Course,
    Diplomas,
    Events,
    Example,
    Internships,
    Jobs,
    Masters,
    Partners,
    Projects,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 10] = [
        StrategyKind::Activities,
        StrategyKind::Course,
        StrategyKind::Diplomas,
        StrategyKind::Events,
        StrategyKind::Example,
        StrategyKind::Internships,
        StrategyKind::Jobs,
        StrategyKind::Masters,
        StrategyKind::Partners,
        StrategyKind::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Activities => "activities",
            StrategyKind::Course => "course",
            StrategyKind::Diplomas => "diplomas",
            StrategyKind::Events => "events",
            StrategyKind::Example => "example",
            StrategyKind::Internships => "internships",
            StrategyKind::Jobs => "jobs",
            StrategyKind::Masters => "masters",
            StrategyKind::Partners => "partners",
            StrategyKind::Projects => "projects",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| ScraperError::StrategyNotFound(s.to_string()))
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn create_strategy(kind: StrategyKind, theme_color: Option<u32>) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::Activities => Box::new(activities::ActivitiesStrategy),
        StrategyKind::Course => Box::new(course::CourseStrategy),
        StrategyKind::Diplomas => Box::new(diplomas::DiplomasStrategy::new(theme_color)),
        StrategyKind::Events => Box::new(events::EventsStrategy),
        StrategyKind::Example => Box::new(example::ExampleStrategy),
        StrategyKind::Internships => {
            Box::new(internships::InternshipsStrategy::new(theme_color))
        }
        StrategyKind::Jobs => Box::new(jobs::JobsStrategy),
        StrategyKind::Masters => Box::new(masters::MastersStrategy),
        StrategyKind::Partners => Box::new(partners::PartnersStrategy),
        StrategyKind::Projects => Box::new(projects::ProjectsStrategy::new(theme_color)),
    }
}

/// Run `strategy` over a fetched page.
///
/// Keeps at most `max_posts` elements in page order. The returned value owns
/// all its data, so the parsed document never outlives this call.
pub fn extract(strategy: &dyn Strategy, html: &str, max_posts: usize) -> Result<Extraction> {
    let selector = parse_selector(strategy.posts_selector())?;
    let document = Html::parse_document(html);

    let elements: Vec<ElementRef<'_>> = document.select(&selector).take(max_posts).collect();
    if elements.is_empty() {
        return Err(ScraperError::NoPosts);
    }

    let ids = elements.iter().map(|el| strategy.get_id(*el)).collect();
    let posts = strategy
        .filter_posts(elements)
        .into_iter()
        .map(|el| ExtractedPost {
            post: strategy.get_post_data(el),
            html: el.html(),
        })
        .collect();

    Ok(Extraction { ids, posts })
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::InvalidSelector(format!("{}: {}", css, e)))
}

/// First descendant of `element` matching `css`.
pub(crate) fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

pub(crate) fn select_all<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Concatenated, trimmed text content.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn select_text(element: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(element, css).map(text_of)
}

/// Trimmed attribute of the first descendant matching `css`.
pub(crate) fn select_attr(element: ElementRef<'_>, css: &str, name: &str) -> Option<String> {
    select_first(element, css)
        .and_then(|el| el.value().attr(name))
        .map(|value| value.trim().to_string())
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}
