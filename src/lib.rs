//! # Postwatch
//!
//! Polls web pages that have no feed, picks out the posts that are new since
//! the last visit and delivers them to Discord webhooks.
//!
//! ## Architecture
//!
//! Every configured source runs its own supervised loop:
//!
//! ```text
//! Cookie → Fetcher → Strategy → Cache diff → Notifier
//!                         ↘ failures → Reporter
//! ```
//!
//! - [`auth`]: CAS login and per-source session cookies
//! - [`fetcher`]: HTTP client
//! - [`strategy`]: Per-site extraction of posts and identifiers
//! - [`store`]: Flat cache of the identifiers seen last cycle
//! - [`notifier`]: Discord webhook delivery
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter config
//! postwatch init
//!
//! # Validate the configured sources
//! postwatch check
//!
//! # Run a single cycle of one source without reading the cache
//! postwatch once events --ignore-cache
//!
//! # Run every source until interrupted
//! postwatch run
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the shared
/// fetcher, notifier, authenticator and reporter and builds scrapers from them.
pub mod app;

/// CAS authentication and session cookies.
pub mod auth;

/// Command-line interface using clap.
///
/// - `run` - Start every enabled source (default)
/// - `once <source>` - Run one cycle of a single source
/// - `list` - List configured sources
/// - `check` - Validate sources without fetching
/// - `init` - Write a starter config
/// - `strategies` - List available strategies
pub mod cli;

/// Configuration loading.
///
/// Loads from `~/.config/postwatch/config.toml` unless a path is given.
pub mod config;

/// Crash supervision for the per-source loops.
pub mod daemon;

/// Post and message component models.
///
/// - [`Post`](domain::Post): A single extracted post
/// - [`Container`](domain::Container): Discord Components V2 container
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for page fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Webhook delivery.
pub mod notifier;

/// Failure logging and error webhook reports.
pub mod reporter;

/// The per-source polling loop.
///
/// - [`Scraper`](scraper::Scraper): One source's cycle and loop
/// - [`CycleOutcome`](scraper::CycleOutcome): What a single cycle did
pub mod scraper;

/// Per-source identifier cache.
///
/// - [`CacheStore`](store::CacheStore): Trait defining cache operations
/// - [`FileCache`](store::FileCache): Newline-separated file implementation
pub mod store;

/// Site-specific extraction strategies.
pub mod strategy;
