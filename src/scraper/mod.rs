//! The per-source poll loop.
//!
//! Every cycle walks the states of [`CycleState`]: validate the cookie, log in
//! if needed, fetch the page, extract posts, compare them with the cache,
//! deliver the new ones and rewrite the cache. A failure in any state is
//! reported and followed by the error delay instead of the success delay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::app::{ErrorKind, Result, ScraperError};
use crate::auth::CookieManager;
use crate::config::{Config, SourceConfig};
use crate::daemon::{Sleeper, Supervised};
use crate::domain::markdown::role_mention;
use crate::domain::{Component, ExtractedPost, Post};
use crate::fetcher::Fetcher;
use crate::notifier::{Notifier, WebhookMessage};
use crate::reporter::{ErrorReport, ErrorReporter, Failure};
use crate::store::CacheStore;
use crate::strategy::{self, Strategy};

/// Process-wide settings a scraper needs, copied out of [`Config`].
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub success_delay: Duration,
    pub error_delay: Duration,
    pub max_posts: usize,
    pub send_posts: bool,
    pub webhook: String,
    pub treat_unidentified_as_seen: bool,
}

impl ScraperSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            success_delay: config.success_delay,
            error_delay: config.error_delay,
            max_posts: config.max_posts,
            send_posts: config.send_posts,
            webhook: config.webhook.clone(),
            treat_unidentified_as_seen: config.treat_unidentified_as_seen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    ValidatingCookie,
    AcquiringCookie,
    Fetching,
    Extracting,
    Diffing,
    Processing,
    Sleeping(Pause),
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::ValidatingCookie => "validating cookie",
            CycleState::AcquiringCookie => "acquiring cookie",
            CycleState::Fetching => "fetching",
            CycleState::Extracting => "extracting",
            CycleState::Diffing => "diffing",
            CycleState::Processing => "processing",
            CycleState::Sleeping(Pause::Success) => "sleeping",
            CycleState::Sleeping(Pause::Error) => "sleeping after error",
        }
    }
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The page shows exactly the cached posts.
    NoNewPosts,
    /// New posts were processed and the cache rewritten.
    Processed { new_posts: usize, delivered: usize },
    /// The cycle stopped in `state`; the failure has been reported.
    Failed { state: CycleState, kind: ErrorKind },
}

impl CycleOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }
}

/// "No new posts" holds iff the page shows as many ids as the cache holds
/// and every id is either cached or missing.
///
/// Missing ids count as seen unless `treat_unidentified_as_seen` is off.
pub fn has_no_new_posts(
    ids: &[Option<String>],
    cache: &[String],
    treat_unidentified_as_seen: bool,
) -> bool {
    ids.len() == cache.len()
        && ids.iter().all(|id| match id {
            Some(id) => cache.contains(id),
            None => treat_unidentified_as_seen,
        })
}

pub struct Scraper {
    name: String,
    source: SourceConfig,
    settings: ScraperSettings,
    strategy: Box<dyn Strategy>,
    cookies: CookieManager,
    cache: Box<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    reporter: Arc<ErrorReporter>,
    sleeper: Arc<dyn Sleeper>,
    state: CycleState,
}

/// Shared services a [`Scraper`] is built from.
#[derive(Clone)]
pub struct Services {
    pub fetcher: Arc<dyn Fetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub reporter: Arc<ErrorReporter>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl Scraper {
    pub fn new(
        name: impl Into<String>,
        source: SourceConfig,
        settings: ScraperSettings,
        strategy: Box<dyn Strategy>,
        cookies: CookieManager,
        cache: Box<dyn CacheStore>,
        services: Services,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            settings,
            strategy,
            cookies,
            cache,
            fetcher: services.fetcher,
            notifier: services.notifier,
            reporter: services.reporter,
            sleeper: services.sleeper,
            state: CycleState::ValidatingCookie,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the source logs in before fetching.
    pub fn needs_login(&self) -> bool {
        self.cookies.is_required()
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookies.cookie()
    }

    /// Name shown as the webhook username.
    pub fn display_name(&self) -> &str {
        self.source.name.as_deref().unwrap_or(&self.name)
    }

    fn max_posts(&self) -> usize {
        self.source.max_posts.unwrap_or(self.settings.max_posts)
    }

    fn destination(&self) -> &str {
        self.source
            .webhook
            .as_deref()
            .filter(|w| !w.is_empty())
            .unwrap_or(&self.settings.webhook)
    }

    /// Poll forever.
    pub async fn run(&mut self) {
        loop {
            let outcome = self.run_cycle(true).await;
            let (pause, delay) = if outcome.is_failure() {
                (Pause::Error, self.settings.error_delay)
            } else {
                (Pause::Success, self.settings.success_delay)
            };
            self.state = CycleState::Sleeping(pause);
            debug!(source = %self.name, state = self.state.as_str(), ?delay, "Waiting for next cycle");
            self.sleeper.sleep(delay).await;
        }
    }

    /// One full cycle. Failures are reported here and never escape.
    pub async fn run_cycle(&mut self, check_cache: bool) -> CycleOutcome {
        info!(source = %self.name, "Searching for new posts");

        self.state = CycleState::ValidatingCookie;
        let held = self.cookies.cookie().map(|c| format!("<cookie of {} bytes>", c.len()));
        if let Err(e) = self.cookies.validate().await {
            let mut report = self.error_report(Failure::from(&e), "while validating cookie");
            if let Some(held) = held {
                report = report.payload(held);
            }
            self.send_report(&report).await;
            return CycleOutcome::Failed {
                state: self.state,
                kind: e.kind(),
            };
        }

        match self.get_and_send_posts(check_cache).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.invalidates_cookie() {
                    self.cookies.mark_stale();
                }
                let report = self.error_report(Failure::from(&e), "while fetching and sending posts");
                self.send_report(&report).await;
                CycleOutcome::Failed {
                    state: self.state,
                    kind: e.kind(),
                }
            }
        }
    }

    async fn get_and_send_posts(&mut self, check_cache: bool) -> Result<CycleOutcome> {
        self.state = CycleState::AcquiringCookie;
        self.cookies.ensure().await?;

        self.state = CycleState::Fetching;
        let params = self.strategy.request_params(self.cookies.cookie());
        let response = self.fetcher.fetch(&self.source.link, &params).await?;
        if response.status != 200 {
            return Err(ScraperError::BadStatus(response.status));
        }

        self.state = CycleState::Extracting;
        let cache = self.cache.read().await?;
        let extraction = strategy::extract(self.strategy.as_ref(), &response.body, self.max_posts())?;

        self.state = CycleState::Diffing;
        if check_cache
            && has_no_new_posts(&extraction.ids, &cache, self.settings.treat_unidentified_as_seen)
        {
            info!(source = %self.name, "No new posts");
            return Ok(CycleOutcome::NoNewPosts);
        }

        self.state = CycleState::Processing;
        let (new_posts, delivered) = self.process_posts(&extraction.posts, &cache, check_cache).await;
        self.cache.write(&extraction.cache_ids()).await?;

        if self.settings.send_posts {
            info!(source = %self.name, new_posts, delivered, "Sent new posts");
        }
        Ok(CycleOutcome::Processed { new_posts, delivered })
    }

    /// Walk posts in delivery order. Returns (new, delivered) counts.
    async fn process_posts(
        &self,
        posts: &[ExtractedPost],
        cache: &[String],
        check_cache: bool,
    ) -> (usize, usize) {
        let mut new_posts = 0;
        let mut delivered = 0;

        for extracted in posts {
            let post = &extracted.post;
            let Some(id) = post.id.as_deref() else {
                let report = self
                    .error_report(Failure::from(&ScraperError::PostIdNotFound), "while extracting post ID")
                    .payload(extracted.html.clone());
                self.send_report(&report).await;
                continue;
            };

            if check_cache && cache.iter().any(|cached| cached == id) {
                info!(source = %self.name, id, "Post already sent");
                continue;
            }

            new_posts += 1;
            if !self.settings.send_posts {
                continue;
            }

            match self.send_post(post).await {
                Ok(()) => {
                    delivered += 1;
                    info!(source = %self.name, id, "Post sent");
                }
                Err(e) => {
                    let e = ScraperError::Delivery(Box::new(e));
                    let payload = serde_json::to_string_pretty(&post.component.to_json())
                        .unwrap_or_default();
                    let report = self
                        .error_report(Failure::from(&e), format!("while sending post: {}", id))
                        .payload(payload);
                    self.send_report(&report).await;
                }
            }
        }

        (new_posts, delivered)
    }

    async fn send_post(&self, post: &Post) -> Result<()> {
        let mut components = Vec::with_capacity(2);
        if let Some(role) = self.source.role.as_deref().filter(|r| !r.is_empty()) {
            components.push(Component::text(role_mention(role)));
        }
        components.push(Component::Container(post.component.clone()));

        let message = WebhookMessage::components(components).username(self.display_name());
        self.notifier.send(self.destination(), &message).await
    }

    fn error_report(&self, failure: Failure<'_>, context: impl Into<String>) -> ErrorReport {
        ErrorReport::new(&self.name, failure)
            .context(context)
            .source_url(&self.source.link)
    }

    async fn send_report(&self, report: &ErrorReport) {
        self.reporter
            .report(report, self.display_name(), self.destination())
            .await;
    }
}

#[async_trait]
impl Supervised for Scraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) {
        Scraper::run(self).await;
    }
}
