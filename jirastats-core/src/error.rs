use std::fmt;
use std::path::PathBuf;

/// Custom error type for jirastats operations
#[derive(Debug)]
pub enum JiraStatsError {
    /// Operator input that failed validation (dates, issue keys, report options)
    InvalidInput(String),
    /// Missing credentials or an unreadable configuration file
    Config(String),
    /// JIRA answered with a non-success status or an unusable page
    Jira { status: Option<u16>, message: String },
    /// No search result has been persisted yet
    NotFound(PathBuf),
    /// The persisted search result exists but cannot be decoded
    InvalidArtifact { path: PathBuf, message: String },
    /// File I/O errors
    Io(std::io::Error),
    /// JSON parsing errors
    Json(serde_json::Error),
    /// YAML parsing errors
    Yaml(serde_yaml::Error),
    /// HTTP request errors
    Http(reqwest::Error),
    /// Time parsing errors
    Time(chrono::ParseError),
    /// URL construction errors
    Url(url::ParseError),
    /// Generic errors with message
    Generic(String),
}

impl fmt::Display for JiraStatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JiraStatsError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            JiraStatsError::Config(msg) => write!(f, "Configuration error: {}", msg),
            JiraStatsError::Jira {
                status: Some(status),
                message,
            } => write!(f, "JIRA API error (HTTP {}): {}", status, message),
            JiraStatsError::Jira {
                status: None,
                message,
            } => write!(f, "JIRA API error: {}", message),
            JiraStatsError::NotFound(path) => write!(
                f,
                "No search result found at {}. Run jira_search first.",
                path.display()
            ),
            JiraStatsError::InvalidArtifact { path, message } => {
                write!(f, "Invalid search result in {}: {}", path.display(), message)
            }
            JiraStatsError::Io(err) => write!(f, "I/O error: {}", err),
            JiraStatsError::Json(err) => write!(f, "JSON error: {}", err),
            JiraStatsError::Yaml(err) => write!(f, "YAML error: {}", err),
            JiraStatsError::Http(err) => write!(f, "HTTP error: {}", err),
            JiraStatsError::Time(err) => write!(f, "Time parsing error: {}", err),
            JiraStatsError::Url(err) => write!(f, "URL error: {}", err),
            JiraStatsError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for JiraStatsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JiraStatsError::Io(err) => Some(err),
            JiraStatsError::Json(err) => Some(err),
            JiraStatsError::Yaml(err) => Some(err),
            JiraStatsError::Http(err) => Some(err),
            JiraStatsError::Time(err) => Some(err),
            JiraStatsError::Url(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for JiraStatsError {
    fn from(err: std::io::Error) -> Self {
        JiraStatsError::Io(err)
    }
}

impl From<serde_json::Error> for JiraStatsError {
    fn from(err: serde_json::Error) -> Self {
        JiraStatsError::Json(err)
    }
}

impl From<serde_yaml::Error> for JiraStatsError {
    fn from(err: serde_yaml::Error) -> Self {
        JiraStatsError::Yaml(err)
    }
}

impl From<reqwest::Error> for JiraStatsError {
    fn from(err: reqwest::Error) -> Self {
        JiraStatsError::Http(err)
    }
}

impl From<chrono::ParseError> for JiraStatsError {
    fn from(err: chrono::ParseError) -> Self {
        JiraStatsError::Time(err)
    }
}

impl From<url::ParseError> for JiraStatsError {
    fn from(err: url::ParseError) -> Self {
        JiraStatsError::Url(err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for JiraStatsError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        JiraStatsError::Config(err.to_string())
    }
}

impl From<regex::Error> for JiraStatsError {
    fn from(err: regex::Error) -> Self {
        JiraStatsError::Generic(err.to_string())
    }
}

impl From<String> for JiraStatsError {
    fn from(err: String) -> Self {
        JiraStatsError::Generic(err)
    }
}

/// Result type alias for jirastats operations
pub type Result<T> = std::result::Result<T, JiraStatsError>;
