use std::sync::Arc;

use tracing::{debug, info};

use crate::app::{Result, ScraperError};
use crate::auth::{Authenticator, Service};

/// Cookie state of one source. Never persisted, never shared.
pub struct CookieManager {
    source: String,
    service: Option<Service>,
    cookie: Option<String>,
    stale: bool,
    authenticator: Arc<dyn Authenticator>,
}

impl CookieManager {
    pub fn new(
        source: impl Into<String>,
        service: Option<Service>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            source: source.into(),
            service,
            cookie: None,
            stale: false,
            authenticator,
        }
    }

    /// Whether the source needs a session at all.
    pub fn is_required(&self) -> bool {
        self.service.is_some()
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn clear(&mut self) {
        self.cookie = None;
        self.stale = false;
    }

    /// Forget the cookie at the start of the next cycle.
    pub fn mark_stale(&mut self) {
        if self.cookie.is_some() {
            self.stale = true;
        }
    }

    /// Drop the held cookie if it is stale or the service rejects it.
    ///
    /// A failing check clears the cookie and is returned as an error.
    pub async fn validate(&mut self) -> Result<()> {
        let Some(service) = self.service else {
            return Ok(());
        };

        if self.stale {
            info!(source = %self.source, %service, "Cookie marked stale by previous response, clearing");
            self.clear();
            return Ok(());
        }

        let Some(cookie) = self.cookie.as_deref() else {
            debug!(source = %self.source, %service, "No cookie held");
            return Ok(());
        };

        match self.authenticator.is_valid(service, cookie).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                info!(source = %self.source, %service, "Cookie is invalid, clearing");
                self.clear();
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(ScraperError::CookieValidation(Box::new(e)))
            }
        }
    }

    /// Log in when no cookie is held.
    pub async fn ensure(&mut self) -> Result<()> {
        let Some(service) = self.service else {
            return Ok(());
        };
        if self.cookie.is_some() {
            return Ok(());
        }

        let cookie = self
            .authenticator
            .acquire(service)
            .await
            .map_err(|e| ScraperError::CookieAcquisition(Box::new(e)))?;
        info!(source = %self.source, %service, "Fetched cookie");
        self.cookie = Some(cookie);
        self.stale = false;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Hands out numbered cookies and answers validity checks from a flag.
    #[derive(Default)]
    pub(crate) struct FakeAuthenticator {
        pub acquired: AtomicUsize,
        pub checks: AtomicUsize,
        pub reject: AtomicBool,
        pub fail_acquire: AtomicBool,
        pub fail_check: AtomicBool,
    }

    #[async_trait]
    impl Authenticator for FakeAuthenticator {
        async fn acquire(&self, service: Service) -> Result<String> {
            if self.fail_acquire.load(Ordering::SeqCst) {
                return Err(ScraperError::Auth("CAS unreachable".into()));
            }
            let n = self.acquired.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{}-session={}", service, n))
        }

        async fn is_valid(&self, _service: Service, _cookie: &str) -> Result<bool> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            if self.fail_check.load(Ordering::SeqCst) {
                return Err(ScraperError::Auth("check endpoint down".into()));
            }
            Ok(!self.reject.load(Ordering::SeqCst))
        }
    }

    fn manager(auth: &Arc<FakeAuthenticator>) -> CookieManager {
        CookieManager::new("course", Some(Service::Courses), auth.clone())
    }

    #[tokio::test]
    async fn test_not_required_without_service() {
        let auth = Arc::new(FakeAuthenticator::default());
        let mut cookies = CookieManager::new("events", None, auth.clone());

        cookies.validate().await.unwrap();
        cookies.ensure().await.unwrap();

        assert!(!cookies.is_required());
        assert_eq!(cookies.cookie(), None);
        assert_eq!(auth.acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cookie_acquired_lazily_and_reused() {
        let auth = Arc::new(FakeAuthenticator::default());
        let mut cookies = manager(&auth);

        cookies.validate().await.unwrap();
        assert_eq!(auth.checks.load(Ordering::SeqCst), 0);

        cookies.ensure().await.unwrap();
        assert_eq!(cookies.cookie(), Some("courses-session=1"));

        cookies.validate().await.unwrap();
        cookies.ensure().await.unwrap();
        assert_eq!(cookies.cookie(), Some("courses-session=1"));
        assert_eq!(auth.acquired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_cookie_cleared_before_next_fetch() {
        let auth = Arc::new(FakeAuthenticator::default());
        let mut cookies = manager(&auth);
        cookies.ensure().await.unwrap();

        auth.reject.store(true, Ordering::SeqCst);
        cookies.validate().await.unwrap();
        assert_eq!(cookies.cookie(), None);

        cookies.ensure().await.unwrap();
        assert_eq!(cookies.cookie(), Some("courses-session=2"));
    }

    #[tokio::test]
    async fn test_stale_cookie_cleared_without_check() {
        let auth = Arc::new(FakeAuthenticator::default());
        let mut cookies = manager(&auth);
        cookies.ensure().await.unwrap();

        cookies.mark_stale();
        cookies.validate().await.unwrap();

        assert_eq!(cookies.cookie(), None);
        assert_eq!(auth.checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_check_clears_and_errors() {
        let auth = Arc::new(FakeAuthenticator::default());
        let mut cookies = manager(&auth);
        cookies.ensure().await.unwrap();

        auth.fail_check.store(true, Ordering::SeqCst);
        let err = cookies.validate().await.unwrap_err();

        assert!(matches!(err, ScraperError::CookieValidation(_)));
        assert_eq!(cookies.cookie(), None);
    }

    #[tokio::test]
    async fn test_failed_acquire_leaves_cookie_absent() {
        let auth = Arc::new(FakeAuthenticator::default());
        auth.fail_acquire.store(true, Ordering::SeqCst);
        let mut cookies = manager(&auth);

        let err = cookies.ensure().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch cookie");
        assert_eq!(cookies.cookie(), None);
    }
}
