use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::app::AppContext;
use crate::config::interval::format_interval;
use crate::config::Config;
use crate::daemon::{self, extract_panic_message, Supervised};
use crate::reporter::{ErrorReport, ErrorReporter, Failure};
use crate::scraper::CycleOutcome;
use crate::strategy::{create_strategy, StrategyKind};

/// Drive `command` to completion. A panic escaping it is sent to the error
/// webhook and turned into an error so the process exits with a failure.
pub async fn guarded<F>(reporter: &ErrorReporter, command: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    match AssertUnwindSafe(command).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let reason = extract_panic_message(&*panic);
            reporter
                .report_global("Uncaught Exception (global)", Failure::Message(&reason))
                .await;
            Err(anyhow!("Uncaught exception: {}", reason))
        }
    }
}

/// Start every enabled source and wait for a shutdown signal.
pub async fn run(ctx: &AppContext) -> anyhow::Result<()> {
    let built = ctx.build_scrapers();
    if built.is_empty() {
        warn!("No enabled sources configured, nothing to do");
        return Ok(());
    }

    let mut jobs: Vec<Box<dyn Supervised>> = Vec::with_capacity(built.len());
    for (name, result) in built {
        match result {
            Ok(scraper) => jobs.push(Box::new(scraper)),
            Err(e) => {
                let report = ErrorReport::new(&name, Failure::from(&e)).context("while starting scraper");
                ctx.reporter.report(&report, &name, "").await;
            }
        }
    }

    if jobs.is_empty() {
        let message = "None of the configured sources could be started";
        ctx.reporter
            .report_global("Startup failure (global)", Failure::Message(message))
            .await;
        bail!(message);
    }

    info!(
        sources = jobs.len(),
        success_delay = %format_interval(ctx.config.success_delay),
        error_delay = %format_interval(ctx.config.error_delay),
        send_posts = ctx.config.send_posts,
        "Starting scrapers"
    );

    let handles = daemon::spawn_all(Arc::new(ctx.supervisor()), jobs).await;
    let mut tasks: FuturesUnordered<_> = handles
        .into_iter()
        .map(|(name, handle)| async move { (name, handle.await) })
        .collect();

    let shutdown = daemon::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            Some((name, result)) = tasks.next() => {
                // supervised tasks never end; the process keeps serving the others
                let message = match result {
                    Ok(()) => format!("Scraper task {} ended", name),
                    Err(e) => format!("Scraper task {} failed: {}", name, e),
                };
                error!(source = %name, "{}", message);
                ctx.reporter
                    .report_global("Unhandled task failure (global)", Failure::Message(&message))
                    .await;
            }
        }
    }

    Ok(())
}

/// Run one cycle of `source` and print what happened.
pub async fn once(ctx: &AppContext, source: &str, ignore_cache: bool) -> anyhow::Result<()> {
    let mut scraper = ctx.build_scraper(source)?;

    match scraper.run_cycle(!ignore_cache).await {
        CycleOutcome::NoNewPosts => println!("{}: no new posts", source),
        CycleOutcome::Processed { new_posts, delivered } => {
            println!("{}: {} new posts, {} delivered", source, new_posts, delivered);
            if !ctx.config.send_posts {
                println!("send_posts is off, nothing was delivered");
            }
        }
        CycleOutcome::Failed { state, kind } => {
            bail!("{}: {} failure while {}", source, kind, state.as_str())
        }
    }

    Ok(())
}

pub fn list_sources(config: &Config) {
    if config.sources.is_empty() {
        println!("No sources configured.");
        return;
    }

    for (name, source) in &config.sources {
        let status = if source.enabled { "" } else { " (disabled)" };
        let max_posts = source.max_posts.unwrap_or(config.max_posts);
        println!("{}{}", name, status);
        println!("  strategy:  {}", source.strategy);
        println!("  link:      {}", source.link);
        println!("  max posts: {}", max_posts);
        if let Some(display) = &source.name {
            println!("  name:      {}", display);
        }
        let webhook = match source.webhook.as_deref() {
            Some(w) if !w.is_empty() => "own",
            _ if !config.webhook.is_empty() => "shared",
            _ => "none",
        };
        println!("  webhook:   {}", webhook);
    }
}

/// Build every source and report the ones that would fail at startup.
pub fn check(ctx: &AppContext) -> anyhow::Result<()> {
    let mut failures = 0;

    for name in ctx.config.sources.keys() {
        match ctx.build_scraper(name) {
            Ok(scraper) => {
                if scraper.needs_login() && ctx.config.credentials.is_none() {
                    println!("{}: ok, but [credentials] are missing", scraper.name());
                } else {
                    println!("{}: ok", scraper.name());
                }
            }
            Err(e) => {
                failures += 1;
                println!("{}: {}", name, e);
            }
        }
    }

    if ctx.config.webhook.is_empty() && ctx.config.error_webhook.is_empty() {
        println!("note: no webhook configured, posts and reports stay in the log");
    }

    if failures > 0 {
        bail!("{} source(s) failed validation", failures);
    }
    Ok(())
}

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }
    Config::write_default_config(path)
        .with_context(|| format!("writing default config to {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn list_strategies() {
    for kind in StrategyKind::ALL {
        match create_strategy(kind, None).service() {
            Some(service) => println!("{:<12} login: {}", kind.as_str(), service),
            None => println!("{}", kind.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::tests::RecordingNotifier;
    use tempfile::TempDir;

    async fn corrupted() -> anyhow::Result<()> {
        panic!("source table corrupted")
    }

    #[tokio::test]
    async fn test_guarded_reports_panic_and_fails() {
        let notifier = Arc::new(RecordingNotifier::default());
        let reporter = ErrorReporter::new(notifier.clone(), "https://errors", "");

        let err = guarded(&reporter, corrupted()).await.unwrap_err();

        assert_eq!(err.to_string(), "Uncaught exception: source table corrupted");
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://errors");
        assert_eq!(
            notifier.reports(),
            vec!["🚨 **Uncaught Exception (global)**\nMessage: source table corrupted"]
        );
    }

    #[tokio::test]
    async fn test_guarded_passes_results_through() {
        let notifier = Arc::new(RecordingNotifier::default());
        let reporter = ErrorReporter::new(notifier.clone(), "https://errors", "");

        guarded(&reporter, async { Ok(()) }).await.unwrap();
        let err = guarded(&reporter, async { bail!("no sources") }).await.unwrap_err();

        assert_eq!(err.to_string(), "no sources");
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("postwatch").join("config.toml");

        init(&path, false).unwrap();
        assert!(init(&path, false).is_err());
        init(&path, true).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(Config::from_toml(&written).is_ok());
    }
}
