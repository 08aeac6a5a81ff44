use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::app::{Result, ScraperError};
use crate::auth::{Authenticator, Service};
use crate::config::Credentials;
use crate::fetcher::http_fetcher::USER_AGENT;

/// Logs in through a CAS server with username and password.
pub struct CasAuthenticator {
    cas_url: String,
    credentials: Option<Credentials>,
    checker: Client,
}

impl CasAuthenticator {
    pub fn new(cas_url: impl Into<String>, credentials: Option<Credentials>) -> Result<Self> {
        let checker = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(Policy::none())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            cas_url: cas_url.into(),
            credentials,
            checker,
        })
    }

    fn credentials(&self) -> Result<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ScraperError::Auth(
                "Credentials are not defined. Please check your configuration.".into(),
            )
        })
    }

    fn login_url(&self, service: Service) -> Result<Url> {
        let mut url = Url::parse(&self.cas_url)
            .map_err(|e| ScraperError::Config(format!("invalid cas_url {}: {}", self.cas_url, e)))?;
        url.query_pairs_mut()
            .append_pair("service", service.login_url());
        Ok(url)
    }
}

/// Hidden `execution` token of the CAS login form.
pub(crate) fn extract_execution(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("input[name=\"execution\"]").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl Authenticator for CasAuthenticator {
    async fn acquire(&self, service: Service) -> Result<String> {
        let credentials = self.credentials()?;
        let login_url = self.login_url(service)?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .cookie_provider(jar.clone())
            .user_agent(USER_AGENT)
            .build()?;

        let form_page = client.get(login_url.clone()).send().await?.text().await?;
        let execution = extract_execution(&form_page)
            .ok_or_else(|| ScraperError::Auth("CAS login form has no execution token".into()))?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &credentials.username)
            .append_pair("password", &credentials.password)
            .append_pair("execution", &execution)
            .append_pair("_eventId", "submit")
            .finish();

        let response = client
            .post(login_url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let landed = response.url().clone();
        debug!(%service, status = response.status().as_u16(), %landed, "CAS login finished");

        if landed.host_str() == login_url.host_str() && landed.path() == login_url.path() {
            return Err(ScraperError::Auth(format!(
                "CAS rejected the credentials for {}",
                service
            )));
        }
        if !response.status().is_success() {
            return Err(ScraperError::Auth(format!(
                "{} answered the CAS redirect with status {}",
                service,
                response.status().as_u16()
            )));
        }

        let base = Url::parse(service.base_url())
            .map_err(|e| ScraperError::Config(e.to_string()))?;
        let header = jar
            .cookies(&base)
            .and_then(|value| value.to_str().ok().map(String::from))
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ScraperError::Auth(format!("{} did not set a session cookie", service))
            })?;

        info!(%service, "Obtained session cookie");
        Ok(header)
    }

    async fn is_valid(&self, service: Service, cookie: &str) -> Result<bool> {
        let response = self
            .checker
            .get(service.check_url())
            .header("Cookie", cookie)
            .send()
            .await?;

        Ok(response.status().as_u16() == 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_execution() {
        let html = r#"
            <form id="fm1" method="post">
                <input type="text" name="username"/>
                <input type="password" name="password"/>
                <input type="hidden" name="execution" value=" e1s1-token "/>
                <input type="hidden" name="_eventId" value="submit"/>
            </form>"#;
        assert_eq!(extract_execution(html).as_deref(), Some("e1s1-token"));
    }

    #[test]
    fn test_extract_execution_missing() {
        assert_eq!(extract_execution("<form></form>"), None);
        assert_eq!(
            extract_execution(r#"<input name="execution" value="">"#),
            None
        );
    }

    #[test]
    fn test_login_url_carries_service() {
        let auth = CasAuthenticator::new(crate::auth::DEFAULT_CAS_URL, None).unwrap();
        let url = auth.login_url(Service::Courses).unwrap();
        let service = url
            .query_pairs()
            .find(|(k, _)| k == "service")
            .map(|(_, v)| v.into_owned());
        assert_eq!(
            service.as_deref(),
            Some("https://courses.finki.ukim.mk/login/index.php")
        );
    }

    #[tokio::test]
    async fn test_acquire_without_credentials_fails_fast() {
        let auth = CasAuthenticator::new(crate::auth::DEFAULT_CAS_URL, None).unwrap();
        let err = auth.acquire(Service::Masters).await.unwrap_err();
        assert!(matches!(err, ScraperError::Auth(_)));
    }
}
