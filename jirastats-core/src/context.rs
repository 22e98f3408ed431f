use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::*;
use crate::error::{JiraStatsError, Result};

/// Environment context shared by the search, info and report tools
#[derive(Clone)]
pub struct Context {
    // From JIRA_URL, base URL of the JIRA instance, e.g. https://acme.atlassian.net
    pub jira_url: String,

    // From JIRA_USER_EMAIL, basic auth user
    pub user_email: String,

    // From JIRA_USER_API_TOKEN, basic auth password
    pub api_token: String,

    // From JIRA_PROJECT, project key used by date range searches
    pub project: String,

    // From JIRASTATS_SEARCH_FILE, default "search.json"
    pub search_file: PathBuf,

    // From JIRASTATS_CONFIG_YAML, default "jirastats.yaml" (optional file)
    pub config_yaml: PathBuf,

    // From JIRASTATS_TIMEOUT, HTTP timeout in seconds, default 30
    pub timeout_secs: u64,

    // From JIRASTATS_DEBUG, debug level logging
    pub debug: bool,

    // From JIRASTATS_CTXOUT, log the whole context on startup
    pub ctx_out: bool,

    // Report status names to JIRA status ids, `statuses:` in the YAML file
    pub statuses: BTreeMap<String, String>,

    // Statuses left out of date range searches, `excluded_statuses:` in the YAML file
    pub excluded_statuses: Vec<String>,
}

fn dotenv_error(err: dotenvy::Error) -> JiraStatsError {
    JiraStatsError::Config(format!("invalid .env file: {}", err))
}

/// Layout of the optional YAML configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    statuses: BTreeMap<String, serde_yaml::Value>,
    excluded_statuses: Option<Vec<String>>,
}

impl Default for Context {
    fn default() -> Self {
        let statuses = [
            (STATUS_DEVELOPMENT, STATUS_DEVELOPMENT_ID),
            (STATUS_REVIEW, STATUS_REVIEW_ID),
        ]
        .into_iter()
        .map(|(name, id)| (name.to_string(), id.to_string()))
        .collect();

        Context {
            jira_url: String::new(),
            user_email: String::new(),
            api_token: String::new(),
            project: String::new(),
            search_file: PathBuf::from(DEFAULT_SEARCH_FILE),
            config_yaml: PathBuf::from(DEFAULT_CONFIG_YAML),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
            ctx_out: false,
            statuses,
            excluded_statuses: DEFAULT_EXCLUDED_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.api_token.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("Context")
            .field("jira_url", &self.jira_url)
            .field("user_email", &self.user_email)
            .field("api_token", &token)
            .field("project", &self.project)
            .field("search_file", &self.search_file)
            .field("config_yaml", &self.config_yaml)
            .field("timeout_secs", &self.timeout_secs)
            .field("debug", &self.debug)
            .field("ctx_out", &self.ctx_out)
            .field("statuses", &self.statuses)
            .field("excluded_statuses", &self.excluded_statuses)
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load context from environment variables, reading `.env` first when present
    pub fn from_env() -> Result<Self> {
        match Self::load_dotenv()? {
            Some(path) => debug!("Loaded environment from {}", path.display()),
            None => debug!("No .env file found"),
        }

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Merge the nearest `.env` into the process environment.
    ///
    /// Variables already set win. Tools call this before logging starts so
    /// `RUST_LOG` and `JIRASTATS_DEBUG` from the file pick the log level.
    pub fn load_dotenv() -> Result<Option<PathBuf>> {
        match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(err) if err.not_found() => Ok(None),
            Err(err) => Err(dotenv_error(err)),
        }
    }

    /// Merge a specific env file into the process environment
    pub fn load_dotenv_from(path: &Path) -> Result<()> {
        dotenvy::from_path(path).map_err(dotenv_error)
    }

    /// Build the context from an arbitrary variable lookup
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ctx = Self::default();

        if let Some(jira_url) = lookup(ENV_JIRA_URL) {
            ctx.jira_url = jira_url.trim().to_string();
        }

        if let Some(user_email) = lookup(ENV_JIRA_USER_EMAIL) {
            ctx.user_email = user_email.trim().to_string();
        }

        if let Some(api_token) = lookup(ENV_JIRA_USER_API_TOKEN) {
            ctx.api_token = api_token.trim().to_string();
        }

        if let Some(project) = lookup(ENV_JIRA_PROJECT) {
            ctx.project = project.trim().to_string();
        }

        if let Some(search_file) = lookup(ENV_SEARCH_FILE) {
            ctx.search_file = PathBuf::from(search_file);
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            ctx.timeout_secs = timeout.trim().parse().map_err(|_| {
                JiraStatsError::Config(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_TIMEOUT, timeout
                ))
            })?;
        }

        // Boolean flags from environment
        ctx.debug = lookup(ENV_DEBUG).is_some();
        ctx.ctx_out = lookup(ENV_CTXOUT).is_some();

        // An explicitly configured file must exist, the default one is optional
        match lookup(ENV_CONFIG_YAML) {
            Some(path) => {
                ctx.config_yaml = PathBuf::from(path);
                if !ctx.config_yaml.exists() {
                    return Err(JiraStatsError::Config(format!(
                        "configuration file {} does not exist",
                        ctx.config_yaml.display()
                    )));
                }
                ctx.apply_config_file()?;
            }
            None if ctx.config_yaml.exists() => ctx.apply_config_file()?,
            None => debug!(
                "No configuration file at {}, using defaults",
                ctx.config_yaml.display()
            ),
        }

        Ok(ctx)
    }

    fn apply_config_file(&mut self) -> Result<()> {
        let origin = self.config_yaml.clone();
        let content = std::fs::read_to_string(&origin)?;
        self.apply_config_str(&content, &origin)?;
        info!("Loaded configuration from {}", origin.display());
        Ok(())
    }

    fn apply_config_str(&mut self, content: &str, origin: &Path) -> Result<()> {
        if content.trim().is_empty() {
            return Ok(());
        }

        let config: FileConfig = serde_yaml::from_str(content).map_err(|err| {
            JiraStatsError::Config(format!("cannot parse {}: {}", origin.display(), err))
        })?;

        for (name, value) in config.statuses {
            let id = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                other => {
                    return Err(JiraStatsError::Config(format!(
                        "status '{}' in {} must map to a status id, got {:?}",
                        name,
                        origin.display(),
                        other
                    )))
                }
            };
            self.statuses.insert(name, id);
        }

        if let Some(excluded) = config.excluded_statuses {
            self.excluded_statuses = excluded;
        }

        Ok(())
    }

    /// Fail unless URL, user and API token are all present
    pub fn validate_credentials(&self) -> Result<()> {
        let missing: Vec<&str> = [
            (ENV_JIRA_URL, &self.jira_url),
            (ENV_JIRA_USER_EMAIL, &self.user_email),
            (ENV_JIRA_USER_API_TOKEN, &self.api_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(JiraStatsError::Config(format!(
                "missing required environment variables: {}. Check your .env file.",
                missing.join(", ")
            )))
        }
    }

    /// Project key for date range searches
    pub fn require_project(&self) -> Result<&str> {
        if self.project.is_empty() {
            Err(JiraStatsError::Config(format!(
                "missing required environment variable {}",
                ENV_JIRA_PROJECT
            )))
        } else {
            Ok(&self.project)
        }
    }

    /// Resolve a report status name (or a raw numeric id) to a JIRA status id
    pub fn status_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.statuses.get(name) {
            return Ok(id.clone());
        }
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
            return Ok(name.to_string());
        }
        let known: Vec<&str> = self.statuses.keys().map(String::as_str).collect();
        Err(JiraStatsError::InvalidInput(format!(
            "unknown status '{}' (known: {})",
            name,
            known.join(", ")
        )))
    }
}
