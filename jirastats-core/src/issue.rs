//! JIRA issue data structures
//!
//! Typed snapshot of the issues returned by the search endpoint with
//! `expand=changelog`. Fields the tools do not interpret are kept verbatim in
//! [`IssueFields::extra`] so custom fields survive the round trip through the
//! persisted search result.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{FIELDTYPE_JIRA, UNASSIGNED};
use crate::query::SearchQuery;

/// Issue as returned by `/rest/api/3/search/jql`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub fields: IssueFields,
    #[serde(default)]
    pub changelog: Changelog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    pub status: Status,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(with = "jira_time")]
    pub created: DateTime<FixedOffset>,
    #[serde(default, with = "jira_time::option")]
    pub updated: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "jira_time::option")]
    pub resolutiondate: Option<DateTime<FixedOffset>>,
    /// Remaining estimate in seconds
    #[serde(default)]
    pub timeestimate: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changelog {
    /// Number of histories JIRA has; the embedded list may be shorter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub histories: Vec<History>,
}

impl Changelog {
    /// True when JIRA embedded fewer histories than the issue has
    pub fn is_truncated(&self) -> bool {
        self.total.is_some_and(|total| self.histories.len() < total)
    }
}

/// One changelog entry; a single edit may touch several fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(with = "jira_time")]
    pub created: DateTime<FixedOffset>,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub field: String,
    #[serde(default)]
    pub fieldtype: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "fromString", default)]
    pub from_label: Option<String>,
    #[serde(rename = "toString", default)]
    pub to_label: Option<String>,
}

impl ChangeItem {
    /// True for changes of the built-in (non custom) field `name`
    pub fn is_jira_field(&self, name: &str) -> bool {
        self.field == name && self.fieldtype == FIELDTYPE_JIRA
    }
}

impl Issue {
    pub fn assignee_name(&self) -> &str {
        self.fields
            .assignee
            .as_ref()
            .map(|user| user.display_name.as_str())
            .unwrap_or(UNASSIGNED)
    }

    /// Time from creation to resolution, if resolved
    pub fn lead_time(&self) -> Option<Duration> {
        self.fields
            .resolutiondate
            .map(|resolved| resolved - self.fields.created)
    }
}

/// The latest search result, as persisted by the searcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: SearchQuery,
    pub fetched_at: DateTime<Utc>,
    pub pages: u32,
    pub is_last: bool,
    pub issues: Vec<Issue>,
}

impl SearchResult {
    pub fn resolved_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.fields.resolutiondate.is_some())
            .count()
    }
}

/// Serde adapter for JIRA timestamps such as `2023-01-02T14:30:00.000+0000`
pub mod jira_time {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::JIRA_TIME_FORMAT;

    const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

    pub fn parse(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_str(value, PARSE_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(value))
    }

    pub fn format(value: &DateTime<FixedOffset>) -> String {
        value.format(JIRA_TIME_FORMAT).to_string()
    }

    pub fn serialize<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, FixedOffset};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(
            value: &Option<DateTime<FixedOffset>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_some(&super::format(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw).map(Some).map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
