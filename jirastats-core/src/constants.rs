// Constants used throughout jirastats

// Environment variables
pub const ENV_JIRA_URL: &str = "JIRA_URL";
pub const ENV_JIRA_USER_EMAIL: &str = "JIRA_USER_EMAIL";
pub const ENV_JIRA_USER_API_TOKEN: &str = "JIRA_USER_API_TOKEN";
pub const ENV_JIRA_PROJECT: &str = "JIRA_PROJECT";
pub const ENV_SEARCH_FILE: &str = "JIRASTATS_SEARCH_FILE";
pub const ENV_CONFIG_YAML: &str = "JIRASTATS_CONFIG_YAML";
pub const ENV_TIMEOUT: &str = "JIRASTATS_TIMEOUT";
pub const ENV_DEBUG: &str = "JIRASTATS_DEBUG";
pub const ENV_CTXOUT: &str = "JIRASTATS_CTXOUT";

// Files
pub const DEFAULT_SEARCH_FILE: &str = "search.json";
pub const DEFAULT_CONFIG_YAML: &str = "jirastats.yaml";

// JIRA REST API
pub const SEARCH_PATH: &str = "rest/api/3/search/jql";
pub const DEFAULT_MAX_RESULTS: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 5000;
pub const DEFAULT_FIELDS: &str = "*all";
pub const DEFAULT_EXPAND: &str = "changelog";
// Fields the issue model and reports read, always requested
pub const REQUIRED_FIELDS: &[&str] = &[
    "summary",
    "status",
    "assignee",
    "created",
    "updated",
    "resolutiondate",
    "timeestimate",
];
// Field selectors that already include every required field
pub const WILDCARD_FIELDS: &[&str] = &["*all", "*navigable"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = "jirastats/0.1";

// Timestamp layout used by JIRA, e.g. 2023-01-02T14:30:00.000+0000
pub const JIRA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Changelog field names
pub const FIELD_STATUS: &str = "status";
pub const FIELD_ASSIGNEE: &str = "assignee";
pub const FIELDTYPE_JIRA: &str = "jira";

// Status names mapped to JIRA status ids for the report --status option
pub const STATUS_DEVELOPMENT: &str = "development";
pub const STATUS_DEVELOPMENT_ID: &str = "10111";
pub const STATUS_REVIEW: &str = "review";
pub const STATUS_REVIEW_ID: &str = "10359";

// Statuses of issues still in flight, left out of date range searches
pub const DEFAULT_EXCLUDED_STATUSES: &[&str] = &[
    "To Do",
    "To Be Prepared",
    "Ready for Development",
    "In Code Review",
    "In Progress",
];

pub const UNASSIGNED: &str = "Unassigned";
pub const SECONDS_PER_HOUR: f64 = 3600.0;
