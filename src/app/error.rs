use thiserror::Error;

/// Boxed error used for causes coming from collaborators (HTTP, auth, I/O).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scraper not found: {0}")]
    SourceNotFound(String),

    #[error("Strategy not found: {0}")]
    StrategyNotFound(String),

    #[error("Failed to fetch cookie")]
    CookieAcquisition(#[source] BoxError),

    #[error("Failed to validate cookie")]
    CookieValidation(#[source] BoxError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Failed to fetch data from {url}")]
    Network {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Bad response code: {0}")]
    BadStatus(u16),

    #[error("Failed to read response body")]
    BodyRead(#[source] BoxError),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No posts found")]
    NoPosts,

    #[error("Post ID not found")]
    PostIdNotFound,

    #[error("Failed to send post")]
    Delivery(#[source] BoxError),

    #[error("Webhook rejected message with status {status}: {body}")]
    Webhook { status: u16, body: String },

    #[error("Cache error at {path}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

}

/// Coarse failure classes used for logging and recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    Network,
    Response,
    Parse,
    Identification,
    Delivery,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Network => "network",
            ErrorKind::Response => "response",
            ErrorKind::Parse => "parse",
            ErrorKind::Identification => "identification",
            ErrorKind::Delivery => "delivery",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScraperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScraperError::Config(_)
            | ScraperError::SourceNotFound(_)
            | ScraperError::StrategyNotFound(_) => ErrorKind::Configuration,
            ScraperError::CookieAcquisition(_)
            | ScraperError::CookieValidation(_)
            | ScraperError::Auth(_) => ErrorKind::Authentication,
            ScraperError::Network { .. } | ScraperError::Http(_) => ErrorKind::Network,
            ScraperError::BadStatus(_) => ErrorKind::Response,
            ScraperError::BodyRead(_)
            | ScraperError::InvalidSelector(_)
            | ScraperError::NoPosts => ErrorKind::Parse,
            ScraperError::PostIdNotFound => ErrorKind::Identification,
            ScraperError::Delivery(_) | ScraperError::Webhook { .. } => ErrorKind::Delivery,
            ScraperError::Cache { .. } => ErrorKind::Storage,
        }
    }

    /// A response that implies the upstream session is no longer usable.
    pub fn invalidates_cookie(&self) -> bool {
        matches!(self, ScraperError::BadStatus(_))
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
