use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;

use crate::app::{Result, ScraperError};
use crate::fetcher::{FetchResponse, Fetcher, RequestParams};

pub const USER_AGENT: &str = concat!("postwatch/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .brotli(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    fn headers(params: &RequestParams) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in &params.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        headers
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, params: &RequestParams) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .headers(Self::headers(params))
            .send()
            .await
            .map_err(|e| ScraperError::Network {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status().as_u16();
        debug!(%url, status, "Fetched page");

        // the status check runs first, so an unreadable error page is not a body failure
        let body = match response.text().await {
            Ok(body) => body,
            Err(_) if status != 200 => String::new(),
            Err(e) => return Err(ScraperError::BodyRead(Box::new(e))),
        };

        Ok(FetchResponse { status, body })
    }
}
