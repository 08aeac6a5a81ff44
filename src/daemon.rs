//! Long-running mode: one supervised loop per source.
//!
//! A source loop is never expected to finish. If it panics or returns, the
//! [`Supervisor`] logs and reports the crash, waits [`RESTART_DELAY`] and
//! starts it again. Other sources are unaffected since each runs in its own
//! task.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::reporter::{ErrorReport, ErrorReporter, Failure};

/// Pause before a crashed loop is restarted.
pub const RESTART_DELAY: Duration = Duration::from_secs(10);

/// Gap between starting consecutive sources.
pub const START_STAGGER: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A loop that should run forever.
#[async_trait]
pub trait Supervised: Send {
    fn name(&self) -> &str;

    async fn run(&mut self);
}

/// How one run of a supervised loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Returned,
    Panicked(String),
}

pub fn extract_panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct Supervisor {
    sleeper: Arc<dyn Sleeper>,
    reporter: Arc<ErrorReporter>,
    restart_delay: Duration,
}

impl Supervisor {
    pub fn new(sleeper: Arc<dyn Sleeper>, reporter: Arc<ErrorReporter>) -> Self {
        Self {
            sleeper,
            reporter,
            restart_delay: RESTART_DELAY,
        }
    }

    /// Run `job` until it returns or panics.
    pub async fn run_once<J: Supervised + ?Sized>(&self, job: &mut J) -> Exit {
        match AssertUnwindSafe(job.run()).catch_unwind().await {
            Ok(()) => Exit::Returned,
            Err(panic) => Exit::Panicked(extract_panic_message(&*panic)),
        }
    }

    /// Keep `job` running, restarting it after every exit. Never returns.
    pub async fn supervise<J: Supervised + ?Sized>(&self, job: &mut J) {
        loop {
            let exit = self.run_once(job).await;
            self.handle_exit(job.name(), &exit).await;
            self.sleeper.sleep(self.restart_delay).await;
        }
    }

    async fn handle_exit(&self, name: &str, exit: &Exit) {
        let message = match exit {
            Exit::Returned => {
                error!(source = name, "Scraper exited unexpectedly, restarting");
                "Scraper loop exited unexpectedly".to_string()
            }
            Exit::Panicked(reason) => {
                error!(source = name, reason = %reason, "Scraper crashed, restarting");
                format!("Scraper crashed: {}", reason)
            }
        };

        let report = ErrorReport::new(name, Failure::Message(&message)).context(format!(
            "restarting in {}s",
            self.restart_delay.as_secs()
        ));
        self.reporter.report(&report, name, "").await;
    }
}

/// Spawn a supervised task per job, [`START_STAGGER`] apart.
pub async fn spawn_all(
    supervisor: Arc<Supervisor>,
    jobs: Vec<Box<dyn Supervised>>,
) -> Vec<(String, JoinHandle<()>)> {
    let mut handles = Vec::with_capacity(jobs.len());
    let count = jobs.len();

    for (i, mut job) in jobs.into_iter().enumerate() {
        let name = job.name().to_string();
        let task_supervisor = supervisor.clone();
        info!(source = %name, "Starting scraper");

        let handle = tokio::spawn(async move {
            task_supervisor.supervise(job.as_mut()).await;
        });
        handles.push((name, handle));

        if i + 1 < count {
            supervisor.sleeper.sleep(START_STAGGER).await;
        }
    }

    handles
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = tokio::signal::ctrl_c() => {},
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to set up SIGTERM handler"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
