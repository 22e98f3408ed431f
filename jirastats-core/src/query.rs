use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::DATE_FORMAT;
use crate::error::{JiraStatsError, Result};

/// Parameters of one search, stored next to the issues it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue_keys: Vec<String>,
    pub jql: String,
}

impl SearchQuery {
    /// Issues of `project` updated between `start` and `end`, both days included
    pub fn date_range(
        project: &str,
        start: NaiveDate,
        end: NaiveDate,
        excluded_statuses: &[String],
    ) -> Result<Self> {
        if start > end {
            return Err(JiraStatsError::InvalidInput(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        let until = end.succ_opt().ok_or_else(|| {
            JiraStatsError::InvalidInput(format!("end date {} is out of range", end))
        })?;

        let mut jql = format!(
            "project = {} AND updated >= \"{}\" AND updated < \"{}\"",
            quote(project),
            start.format(DATE_FORMAT),
            until.format(DATE_FORMAT)
        );
        if !excluded_statuses.is_empty() {
            let statuses: Vec<String> = excluded_statuses.iter().map(|s| quote(s)).collect();
            jql.push_str(&format!(" AND status NOT IN ({})", statuses.join(", ")));
        }

        Ok(SearchQuery {
            project: Some(project.to_string()),
            start_date: Some(start),
            end_date: Some(end),
            issue_keys: Vec::new(),
            jql,
        })
    }

    /// Issues selected by key, e.g. `ACME-12`
    pub fn issue_keys(keys: &[String]) -> Result<Self> {
        if keys.is_empty() {
            return Err(JiraStatsError::InvalidInput(
                "at least one issue key is required".to_string(),
            ));
        }

        let pattern = Regex::new(r"^[A-Z][A-Z0-9_]*-[0-9]+$")?;
        let mut normalized = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.trim().to_uppercase();
            if !pattern.is_match(&key) {
                return Err(JiraStatsError::InvalidInput(format!(
                    "'{}' is not an issue key (expected e.g. PROJ-123)",
                    key
                )));
            }
            if !normalized.contains(&key) {
                normalized.push(key);
            }
        }

        Ok(SearchQuery {
            project: None,
            start_date: None,
            end_date: None,
            jql: format!("key IN ({})", normalized.join(", ")),
            issue_keys: normalized,
        })
    }

    /// Short human description used by the info tool
    pub fn describe(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!("{} to {}", start, end),
            _ if !self.issue_keys.is_empty() => format!("keys {}", self.issue_keys.join(", ")),
            _ => "custom JQL".to_string(),
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| {
        JiraStatsError::InvalidInput(format!(
            "invalid date '{}': {} (expected YYYY-MM-DD)",
            value, err
        ))
    })
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
