//! Failure reporting: log the failure with its cause chain and post a
//! summary to the error webhook.

use std::collections::HashSet;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use tracing::{error, warn};

use crate::app::{ErrorKind, ScraperError};
use crate::domain::markdown::{code_block, truncate};
use crate::notifier::{Notifier, WebhookMessage};

/// Longest cause chain that is walked.
pub const MAX_CAUSE_DEPTH: usize = 16;

/// Payloads attached to webhook reports are cut to this many characters.
pub const PAYLOAD_LIMIT: usize = 1000;

/// Anything that can be reported.
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    Error(&'a (dyn Error + 'static)),
    Message(&'a str),
    Value(&'a serde_json::Value),
}

impl<'a> Failure<'a> {
    pub fn message(&self) -> String {
        match self {
            Failure::Error(e) => e.to_string(),
            Failure::Message(m) => m.to_string(),
            Failure::Value(v) => serde_json::to_string(v).unwrap_or_else(|_| v.to_string()),
        }
    }

    pub fn causes(&self) -> Vec<String> {
        match self {
            Failure::Error(e) => extract_causes(*e),
            _ => Vec::new(),
        }
    }
}

impl<'a> From<&'a ScraperError> for Failure<'a> {
    fn from(e: &'a ScraperError) -> Self {
        Failure::Error(e)
    }
}

/// Messages of every error below `err` in its `source()` chain, outermost first.
///
/// Stops at the end of the chain, when a link was already visited, or after
/// [`MAX_CAUSE_DEPTH`] links.
pub fn extract_causes(err: &(dyn Error + 'static)) -> Vec<String> {
    let mut causes = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(err as *const dyn Error as *const () as usize);

    let mut current = err.source();
    while let Some(cause) = current {
        if causes.len() >= MAX_CAUSE_DEPTH {
            break;
        }
        if !seen.insert(cause as *const dyn Error as *const () as usize) {
            break;
        }
        causes.push(cause.to_string());
        current = cause.source();
    }
    causes
}

/// A normalised failure, ready to be logged and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    /// Source key the failure belongs to.
    pub origin: String,
    pub message: String,
    pub context: Option<String>,
    pub source_url: Option<String>,
    pub payload: Option<String>,
    pub causes: Vec<String>,
    pub kind: Option<ErrorKind>,
}

impl ErrorReport {
    pub fn new(origin: impl Into<String>, failure: Failure<'_>) -> Self {
        let kind = match failure {
            Failure::Error(e) => e.downcast_ref::<ScraperError>().map(ScraperError::kind),
            _ => None,
        };
        Self {
            origin: origin.into(),
            message: failure.message(),
            context: None,
            source_url: None,
            payload: None,
            causes: failure.causes(),
            kind,
        }
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        if !payload.is_empty() {
            self.payload = Some(payload);
        }
        self
    }

    pub fn cause_line(&self) -> Option<String> {
        if self.causes.is_empty() {
            None
        } else {
            Some(self.causes.join(" <- "))
        }
    }

    /// Webhook summary of the report.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("❌ Error in **{}**", self.origin)];
        if let Some(context) = &self.context {
            lines.push(format!("Context: {}", context));
        }
        if let Some(url) = &self.source_url {
            lines.push(format!("Source: {}", url));
        }
        lines.push(format!("Message: {}", self.message));
        if let Some(causes) = self.cause_line() {
            lines.push(format!("Cause: {}", causes));
        }
        if let Some(payload) = &self.payload {
            lines.push(code_block(&truncate(payload, PAYLOAD_LIMIT)));
        }
        lines.join("\n")
    }

    fn log(&self) {
        let kind = self.kind.map(|k| k.as_str()).unwrap_or("unknown");
        error!(
            source = %self.origin,
            kind,
            context = self.context.as_deref().unwrap_or(""),
            url = self.source_url.as_deref().unwrap_or(""),
            "{}",
            self.message
        );
        if let Some(causes) = self.cause_line() {
            error!(source = %self.origin, "Cause: {}", causes);
        }
        if let Some(payload) = &self.payload {
            error!(source = %self.origin, "{}", payload);
        }
    }
}

/// Logs reports and posts them to the error webhook.
pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
    error_webhook: String,
    fallback_webhook: String,
}

impl ErrorReporter {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        error_webhook: impl Into<String>,
        fallback_webhook: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            error_webhook: error_webhook.into(),
            fallback_webhook: fallback_webhook.into(),
        }
    }

    /// Error webhook if configured, else `fallback`, else the shared webhook.
    pub fn destination<'a>(&'a self, fallback: &'a str) -> &'a str {
        [self.error_webhook.as_str(), fallback, self.fallback_webhook.as_str()]
            .into_iter()
            .find(|d| !d.is_empty())
            .unwrap_or("")
    }

    /// Log `report` and send it; delivery problems are only logged.
    pub async fn report(&self, report: &ErrorReport, username: &str, fallback: &str) {
        report.log();

        let message = WebhookMessage::text(report.render()).username(username);
        if let Err(e) = self.notifier.send(self.destination(fallback), &message).await {
            warn!(source = %report.origin, error = %e, "Failed to send error to webhook");
        }
    }

    /// Process-wide failure not tied to a source.
    pub fn report_global<'a>(
        &'a self,
        title: &'a str,
        failure: Failure<'_>,
    ) -> impl Future<Output = ()> + Send + 'a {
        let message = failure.message();
        let causes = failure.causes();

        async move {
            error!(title, "{}", message);

            let mut lines = vec![format!("🚨 **{}**", title), format!("Message: {}", message)];
            if !causes.is_empty() {
                lines.push(format!("Cause: {}", causes.join(" <- ")));
            }
            let webhook =
                WebhookMessage::text(lines.join("\n")).username(env!("CARGO_PKG_NAME"));

            if let Err(e) = self.notifier.send(self.destination(""), &webhook).await {
                warn!(error = %e, "Failed to send global error to webhook");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::tests::RecordingNotifier;
    use std::fmt;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<Layer>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl Error for Layer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            self.source.as_deref().map(|e| e as &(dyn Error + 'static))
        }
    }

    /// An error that names itself as its own cause.
    #[derive(Debug)]
    struct Ouroboros;

    impl fmt::Display for Ouroboros {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("loop")
        }
    }

    impl Error for Ouroboros {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(self)
        }
    }

    fn chain() -> Layer {
        Layer {
            message: "E1",
            source: Some(Box::new(Layer {
                message: "E2",
                source: Some(Box::new(Layer {
                    message: "E3",
                    source: None,
                })),
            })),
        }
    }

    #[test]
    fn test_causes_exclude_top_level() {
        let err = chain();
        assert_eq!(extract_causes(&err), vec!["E2", "E3"]);
    }

    #[test]
    fn test_self_referential_cause_terminates() {
        assert!(extract_causes(&Ouroboros).is_empty());
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut err = Layer {
            message: "leaf",
            source: None,
        };
        for _ in 0..40 {
            err = Layer {
                message: "link",
                source: Some(Box::new(err)),
            };
        }
        assert_eq!(extract_causes(&err).len(), MAX_CAUSE_DEPTH);
    }

    #[test]
    fn test_scraper_error_chain() {
        let err = ScraperError::CookieAcquisition(Box::new(ScraperError::Auth(
            "Credentials are not defined. Please check your configuration.".into(),
        )));
        let report = ErrorReport::new("course", Failure::from(&err));

        assert_eq!(report.message, "Failed to fetch cookie");
        assert_eq!(report.kind, Some(ErrorKind::Authentication));
        assert_eq!(
            report.causes,
            vec!["Authentication error: Credentials are not defined. Please check your configuration."]
        );
    }

    #[test]
    fn test_value_failure_is_serialised() {
        let value = serde_json::json!({"code": 7});
        let report = ErrorReport::new("events", Failure::Value(&value));
        assert_eq!(report.message, r#"{"code":7}"#);
        assert_eq!(report.kind, None);
    }

    #[test]
    fn test_render() {
        let err = chain();
        let report = ErrorReport::new("events", Failure::Error(&err))
            .context("while fetching and sending posts")
            .source_url("https://finki.ukim.mk/events")
            .payload("<div>");

        assert_eq!(
            report.render(),
            "❌ Error in **events**\n\
             Context: while fetching and sending posts\n\
             Source: https://finki.ukim.mk/events\n\
             Message: E1\n\
             Cause: E2 <- E3\n\
             ```\n<div>\n```"
        );
    }

    #[test]
    fn test_render_minimal_and_truncated_payload() {
        let report = ErrorReport::new("x", Failure::Message("Post ID not found"))
            .payload("a".repeat(2000));
        let rendered = report.render();

        assert!(rendered.starts_with("❌ Error in **x**\nMessage: Post ID not found\n```\n"));
        assert!(rendered.contains(&format!("{}...", "a".repeat(PAYLOAD_LIMIT - 3))));
    }

    #[tokio::test]
    async fn test_report_prefers_error_webhook() {
        let notifier = Arc::new(RecordingNotifier::default());
        let reporter = ErrorReporter::new(notifier.clone(), "https://errors", "https://shared");

        let report = ErrorReport::new("events", Failure::Message("boom"));
        reporter.report(&report, "Events", "https://source").await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://errors");
        assert_eq!(sent[0].1.username.as_deref(), Some("Events"));
    }

    #[tokio::test]
    async fn test_report_falls_back_to_source_then_shared() {
        let notifier = Arc::new(RecordingNotifier::default());
        let reporter = ErrorReporter::new(notifier.clone(), "", "https://shared");

        assert_eq!(reporter.destination("https://source"), "https://source");
        assert_eq!(reporter.destination(""), "https://shared");

        reporter
            .report_global("Uncaught Exception (global)", Failure::Message("panic"))
            .await;
        let reports = notifier.reports();
        assert_eq!(reports, vec!["🚨 **Uncaught Exception (global)**\nMessage: panic"]);
    }
}
