//! Status and assignee timelines derived from an issue's changelog

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::warn;

use crate::constants::{FIELD_ASSIGNEE, FIELD_STATUS};
use crate::issue::{Issue, SearchResult};

/// A field moving from one value to another at `date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    #[serde(serialize_with = "crate::issue::jira_time::serialize")]
    pub date: DateTime<FixedOffset>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Chronological status and assignee transitions of one issue.
///
/// Both lists start with a synthetic transition at creation time whose `to`
/// is the value the field had when the issue was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub issue_id: String,
    pub statuses: Vec<Transition>,
    pub assignees: Vec<Transition>,
}

impl Timeline {
    pub fn from_issue(issue: &Issue) -> Self {
        if issue.changelog.is_truncated() {
            warn!(
                "{}: changelog has {} of {} histories, earliest status and assignee changes are missing",
                issue.key,
                issue.changelog.histories.len(),
                issue.changelog.total.unwrap_or_default()
            );
        }

        let current_status = Some(issue.fields.status.id.clone());
        let current_assignee = issue
            .fields
            .assignee
            .as_ref()
            .map(|user| user.account_id.clone());

        Timeline {
            issue_id: issue.id.clone(),
            statuses: field_timeline(issue, FIELD_STATUS, current_status),
            assignees: field_timeline(issue, FIELD_ASSIGNEE, current_assignee),
        }
    }

    /// Account holding the issue at `at`, i.e. the target of the latest assignee change not after it
    pub fn assignee_at(&self, at: DateTime<FixedOffset>) -> Option<&str> {
        self.assignees
            .iter()
            .take_while(|change| change.date <= at)
            .last()
            .and_then(|change| change.to.as_deref())
    }

    /// Completed periods spent in `status_id`, as (entered, left) pairs
    pub fn stints(&self, status_id: &str) -> Vec<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        self.statuses
            .windows(2)
            .filter(|pair| pair[1].from.as_deref() == Some(status_id))
            .map(|pair| (pair[0].date, pair[1].date))
            .collect()
    }
}

fn field_timeline(issue: &Issue, field: &str, current: Option<String>) -> Vec<Transition> {
    let mut changes: Vec<Transition> = issue
        .changelog
        .histories
        .iter()
        .flat_map(|history| {
            history
                .items
                .iter()
                .filter(move |item| item.is_jira_field(field))
                .map(move |item| Transition {
                    date: history.created,
                    from: item.from.clone(),
                    to: item.to.clone(),
                })
        })
        .collect();

    // JIRA lists histories newest first; a stable sort keeps same-instant edits in order
    changes.reverse();
    changes.sort_by_key(|change| change.date);

    let initial = match changes.first() {
        Some(first) => first.from.clone(),
        None => current,
    };

    let mut timeline = Vec::with_capacity(changes.len() + 1);
    timeline.push(Transition {
        date: issue.fields.created,
        from: None,
        to: initial,
    });
    timeline.extend(changes);
    timeline
}

/// Timelines for every issue of a search result, in result order
pub fn build_timelines(result: &SearchResult) -> Vec<Timeline> {
    result.issues.iter().map(Timeline::from_issue).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{jira_time, Changelog};
    use serde_json::json;

    fn t(s: &str) -> DateTime<FixedOffset> {
        jira_time::parse(s).unwrap()
    }

    fn issue_with_histories(histories: serde_json::Value) -> Issue {
        serde_json::from_value(json!({
            "id": "100",
            "key": "ACME-100",
            "fields": {
                "status": {"id": "10002", "name": "Done"},
                "assignee": {"accountId": "bob", "displayName": "Bob"},
                "created": "2024-01-01T09:00:00.000+0000"
            },
            "changelog": {"histories": histories}
        }))
        .unwrap()
    }

    #[test]
    fn unchanged_issue_starts_in_current_state() {
        let issue = issue_with_histories(json!([]));
        let timeline = Timeline::from_issue(&issue);

        assert_eq!(timeline.statuses.len(), 1);
        assert_eq!(timeline.statuses[0].to.as_deref(), Some("10002"));
        assert_eq!(timeline.assignees[0].to.as_deref(), Some("bob"));
        assert_eq!(
            timeline.assignee_at(t("2024-06-01T00:00:00.000+0000")),
            Some("bob")
        );
        assert!(timeline.stints("10002").is_empty());
    }

    #[test]
    fn histories_are_ordered_oldest_first() {
        // newest first, as JIRA returns them
        let issue = issue_with_histories(json!([
            {"created": "2024-01-03T09:00:00.000+0000", "items": [
                {"field": "status", "fieldtype": "jira", "from": "10111", "to": "10002"},
                {"field": "assignee", "fieldtype": "jira", "from": "ann", "to": "bob"}
            ]},
            {"created": "2024-01-02T09:00:00.000+0000", "items": [
                {"field": "status", "fieldtype": "jira", "from": "10000", "to": "10111"},
                {"field": "Story Points", "fieldtype": "custom", "from": null, "to": "3"}
            ]}
        ]));
        let timeline = Timeline::from_issue(&issue);

        let statuses: Vec<Option<&str>> =
            timeline.statuses.iter().map(|s| s.to.as_deref()).collect();
        assert_eq!(statuses, vec![Some("10000"), Some("10111"), Some("10002")]);
        assert_eq!(timeline.assignees.len(), 2);
        assert_eq!(timeline.assignees[0].to.as_deref(), Some("ann"));

        assert_eq!(
            timeline.assignee_at(t("2024-01-02T12:00:00.000+0000")),
            Some("ann")
        );
        assert_eq!(
            timeline.assignee_at(t("2024-01-03T09:00:00.000+0000")),
            Some("bob")
        );
        assert_eq!(
            timeline.stints("10111"),
            vec![(
                t("2024-01-02T09:00:00.000+0000"),
                t("2024-01-03T09:00:00.000+0000")
            )]
        );
    }

    #[test]
    fn reopened_issue_has_two_stints() {
        let issue = issue_with_histories(json!([
            {"created": "2024-01-05T09:00:00.000+0000", "items": [
                {"field": "status", "fieldtype": "jira", "from": "10111", "to": "10002"}]},
            {"created": "2024-01-04T09:00:00.000+0000", "items": [
                {"field": "status", "fieldtype": "jira", "from": "10003", "to": "10111"}]},
            {"created": "2024-01-03T09:00:00.000+0000", "items": [
                {"field": "status", "fieldtype": "jira", "from": "10111", "to": "10003"}]},
            {"created": "2024-01-02T09:00:00.000+0000", "items": [
                {"field": "status", "fieldtype": "jira", "from": "10000", "to": "10111"}]}
        ]));
        let stints = Timeline::from_issue(&issue).stints("10111");
        assert_eq!(stints.len(), 2);
        assert_eq!(stints[1].0, t("2024-01-04T09:00:00.000+0000"));
    }

    #[test]
    fn truncated_changelog_is_detected() {
        let mut issue = issue_with_histories(json!([
            {"created": "2024-01-03T09:00:00.000+0000", "items": [
                {"field": "status", "fieldtype": "jira", "from": "10111", "to": "10002"}]}
        ]));
        assert!(!issue.changelog.is_truncated());

        issue.changelog.total = Some(120);
        issue.changelog.max_results = Some(100);
        assert!(issue.changelog.is_truncated());
        // still built from what was embedded
        let timeline = Timeline::from_issue(&issue);
        assert_eq!(timeline.statuses[0].to.as_deref(), Some("10111"));

        let complete: Changelog = serde_json::from_value(json!({
            "startAt": 0, "maxResults": 1, "total": 1,
            "histories": [{"created": "2024-01-03T09:00:00.000+0000", "items": []}]
        }))
        .unwrap();
        assert_eq!(complete.total, Some(1));
        assert!(!complete.is_truncated());
    }

    #[test]
    fn unassigned_at_creation() {
        let issue = issue_with_histories(json!([
            {"created": "2024-01-02T09:00:00.000+0000", "items": [
                {"field": "assignee", "fieldtype": "jira", "from": null, "to": "bob"}]}
        ]));
        let timeline = Timeline::from_issue(&issue);
        assert_eq!(timeline.assignee_at(t("2024-01-01T10:00:00.000+0000")), None);
        assert_eq!(
            timeline.assignee_at(t("2024-01-02T10:00:00.000+0000")),
            Some("bob")
        );
    }
}
