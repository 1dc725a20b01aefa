use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Failure kinds for one scrape run. Callers that need to distinguish
/// "the site was flaky" from "the page changed shape" match on the variant;
/// the CLI maps each kind to its own exit status.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("timed out waiting for {marker} on {url}")]
    Timeout { url: String, marker: String },

    #[error("could not parse {what} from {text:?}")]
    Parse { what: String, text: String },

    #[error("fighter resolution failed: {0}")]
    Resolution(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ScrapeError {
    pub fn fetch(url: &str, reason: impl Into<String>) -> Self {
        ScrapeError::Fetch {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn parse(what: &str, text: &str) -> Self {
        ScrapeError::Parse {
            what: what.to_string(),
            text: text.to_string(),
        }
    }

    /// Process exit status for this failure kind (0 is success, 1 is
    /// reserved for argument/usage errors).
    pub fn exit_code(&self) -> i32 {
        match self {
            ScrapeError::InvalidUrl(_)
            | ScrapeError::Fetch { .. }
            | ScrapeError::Timeout { .. } => 2,
            ScrapeError::Parse { .. } => 3,
            ScrapeError::Resolution(_) => 4,
            ScrapeError::Storage(_) => 5,
        }
    }
}

/* Conversions so `?` works smoothly */
impl From<std::io::Error> for ScrapeError {
    fn from(e: std::io::Error) -> Self {
        ScrapeError::Storage(e.to_string())
    }
}
impl From<csv::Error> for ScrapeError {
    fn from(e: csv::Error) -> Self {
        ScrapeError::Storage(e.to_string())
    }
}
impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        ScrapeError::Fetch {
            url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: e.to_string(),
        }
    }
}
