use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::app::error::{Result, ScraperError};
use crate::auth::{Authenticator, CasAuthenticator, CookieManager};
use crate::config::Config;
use crate::daemon::{Sleeper, Supervisor, TokioSleeper};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::notifier::{DiscordWebhook, Notifier};
use crate::reporter::ErrorReporter;
use crate::scraper::{Scraper, ScraperSettings, Services};
use crate::store::FileCache;
use crate::strategy::{create_strategy, StrategyKind};

/// Services shared by every source, built once at startup.
pub struct AppContext {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn Fetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub authenticator: Arc<dyn Authenticator>,
    pub reporter: Arc<ErrorReporter>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        let notifier: Arc<dyn Notifier> = Arc::new(DiscordWebhook::new()?);
        let authenticator: Arc<dyn Authenticator> = Arc::new(CasAuthenticator::new(
            config.cas_url.clone(),
            config.credentials.clone(),
        )?);

        Ok(Self::with_services(config, fetcher, notifier, authenticator, Arc::new(TokioSleeper)))
    }

    pub fn with_services(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        authenticator: Arc<dyn Authenticator>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let reporter = Arc::new(ErrorReporter::new(
            notifier.clone(),
            config.error_webhook.clone(),
            config.webhook.clone(),
        ));

        Self {
            config: Arc::new(config),
            fetcher,
            notifier,
            authenticator,
            reporter,
            sleeper,
        }
    }

    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(self.sleeper.clone(), self.reporter.clone())
    }

    /// Build the scraper for the source configured under `name`.
    pub fn build_scraper(&self, name: &str) -> Result<Scraper> {
        let source = self
            .config
            .sources
            .get(name)
            .ok_or_else(|| ScraperError::SourceNotFound(name.to_string()))?;

        let kind: StrategyKind = source.strategy.parse()?;
        Url::parse(&source.link).map_err(|e| {
            ScraperError::Config(format!("[{}] invalid link {}: {}", name, source.link, e))
        })?;

        let strategy = create_strategy(kind, self.config.theme_color_value());
        let cookies = CookieManager::new(name, strategy.service(), self.authenticator.clone());
        let cache = FileCache::new(&self.config.cache_dir, name);
        debug!(source = name, strategy = %kind, cache = %cache.path().display(), "Built scraper");

        Ok(Scraper::new(
            name,
            source.clone(),
            ScraperSettings::from_config(&self.config),
            strategy,
            cookies,
            Box::new(cache),
            Services {
                fetcher: self.fetcher.clone(),
                notifier: self.notifier.clone(),
                reporter: self.reporter.clone(),
                sleeper: self.sleeper.clone(),
            },
        ))
    }

    /// Scrapers for every enabled source, each paired with its build result.
    pub fn build_scrapers(&self) -> Vec<(String, Result<Scraper>)> {
        self.config
            .enabled_sources()
            .map(|(name, _)| (name.clone(), self.build_scraper(name)))
            .collect()
    }
}
