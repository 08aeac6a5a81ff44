//! Session cookies for sources behind the university single sign-on.
//!
//! - [`Service`]: the authenticated upstream services
//! - [`Authenticator`]: obtains and checks a cookie for a service
//! - [`CasAuthenticator`]: CAS login over HTTP
//! - [`CookieManager`]: per-source cookie state driven by the run loop

pub mod cas;
pub mod cookie;

use async_trait::async_trait;

use crate::app::Result;

pub use cas::CasAuthenticator;
pub use cookie::CookieManager;

pub const DEFAULT_CAS_URL: &str = "https://cas.finki.ukim.mk/cas/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Courses,
    Diplomas,
    Internships,
    Masters,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Courses => "courses",
            Service::Diplomas => "diplomas",
            Service::Internships => "internships",
            Service::Masters => "masters",
        }
    }

    /// Origin whose cookies make up the session.
    pub fn base_url(&self) -> &'static str {
        match self {
            Service::Courses => "https://courses.finki.ukim.mk/",
            Service::Diplomas => "https://diplomski.finki.ukim.mk/",
            Service::Internships => "https://internships.finki.ukim.mk/",
            Service::Masters => "https://magisterski.finki.ukim.mk/",
        }
    }

    /// Page CAS redirects back to after a successful login.
    pub fn login_url(&self) -> &'static str {
        match self {
            Service::Courses => "https://courses.finki.ukim.mk/login/index.php",
            Service::Diplomas => "https://diplomski.finki.ukim.mk/Account/LoginCAS",
            Service::Internships => "https://internships.finki.ukim.mk/login",
            Service::Masters => "https://magisterski.finki.ukim.mk/Account/LoginCAS",
        }
    }

    /// Page that answers 200 only to an authenticated session.
    pub fn check_url(&self) -> &'static str {
        match self {
            Service::Courses => "https://courses.finki.ukim.mk/my/",
            Service::Diplomas => "https://diplomski.finki.ukim.mk/",
            Service::Internships => "https://internships.finki.ukim.mk/profile",
            Service::Masters => "https://magisterski.finki.ukim.mk/",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in and return a `Cookie` header value for `service`.
    async fn acquire(&self, service: Service) -> Result<String>;

    /// Whether `cookie` still grants access to `service`.
    async fn is_valid(&self, service: Service, cookie: &str) -> Result<bool>;
}
