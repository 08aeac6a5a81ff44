pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Extra request parameters a strategy derives from the current cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub headers: Vec<(String, String)>,
}

impl RequestParams {
    pub fn none() -> Self {
        Self::default()
    }

    /// Send the session cookie with the request.
    pub fn with_cookie(cookie: &str) -> Self {
        Self {
            headers: vec![("Cookie".to_string(), cookie.to_string())],
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`. Transport failures surface as `ScraperError::Network`,
    /// unreadable bodies as `ScraperError::BodyRead`; any status is returned as-is.
    async fn fetch(&self, url: &str, params: &RequestParams) -> Result<FetchResponse>;
}
