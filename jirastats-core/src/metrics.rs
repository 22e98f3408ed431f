//! Metrics computed from a search result
//!
//! Time is kept in seconds (`f64`, millisecond resolution) and only turned
//! into hours when rendered.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use crate::changelog::Timeline;
use crate::constants::{FIELD_ASSIGNEE, SECONDS_PER_HOUR};
use crate::issue::SearchResult;

/// What the reports need to know about an issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueInfo {
    pub key: String,
    pub title: String,
    pub timeestimate: Option<i64>,
}

/// Issue id to key/title/estimate; the first occurrence of an id wins
pub fn map_issues(result: &SearchResult) -> BTreeMap<String, IssueInfo> {
    let mut map = BTreeMap::new();
    for issue in &result.issues {
        map.entry(issue.id.clone()).or_insert_with(|| IssueInfo {
            key: issue.key.clone(),
            title: issue.fields.summary.clone(),
            timeestimate: issue.fields.timeestimate,
        });
    }
    map
}

/// Account id to display name.
///
/// The most recent changelog entry that assigns the account wins; accounts
/// only seen as current assignee or as a previous assignee fill the gaps.
pub fn map_assignees(result: &SearchResult) -> BTreeMap<String, String> {
    let mut assigned: HashMap<String, (DateTime<FixedOffset>, String)> = HashMap::new();
    let mut fallback: BTreeMap<String, String> = BTreeMap::new();

    for issue in &result.issues {
        if let Some(user) = &issue.fields.assignee {
            if !user.account_id.is_empty() && !user.display_name.is_empty() {
                fallback
                    .entry(user.account_id.clone())
                    .or_insert_with(|| user.display_name.clone());
            }
        }

        for history in &issue.changelog.histories {
            for item in history.items.iter().filter(|i| i.is_jira_field(FIELD_ASSIGNEE)) {
                if let (Some(id), Some(name)) = (&item.to, &item.to_label) {
                    let newer = assigned
                        .get(id)
                        .map_or(true, |(seen, _)| history.created > *seen);
                    if newer {
                        assigned.insert(id.clone(), (history.created, name.clone()));
                    }
                }
                if let (Some(id), Some(name)) = (&item.from, &item.from_label) {
                    fallback.entry(id.clone()).or_insert_with(|| name.clone());
                }
            }
        }
    }

    let mut names = fallback;
    for (id, (_, name)) in assigned {
        names.insert(id, name);
    }
    names
}

/// Display name for an account, or a marker naming the unknown id
pub fn display_name(names: &BTreeMap<String, String>, account_id: &str) -> String {
    names
        .get(account_id)
        .cloned()
        .unwrap_or_else(|| format!("Unknown ({})", account_id))
}

/// Time each assignee spent on one issue while it was in the tracked status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueWorkload {
    pub issue_id: String,
    /// account id -> seconds
    pub seconds: BTreeMap<String, f64>,
}

impl IssueWorkload {
    /// Account with the largest share; ties go to the smallest account id
    pub fn lead(&self) -> Option<(&str, f64)> {
        let mut lead: Option<(&str, f64)> = None;
        for (account, seconds) in &self.seconds {
            if lead.map_or(true, |(_, best)| *seconds > best) {
                lead = Some((account.as_str(), *seconds));
            }
        }
        lead
    }

    /// Shares sorted by descending time, then account id
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .seconds
            .iter()
            .map(|(account, seconds)| (account.as_str(), *seconds))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Split every completed stint in `status_id` across the assignees who held the issue.
///
/// Issues that never left the status are skipped; an issue with stints but no
/// assignee during them is kept with no shares.
pub fn calculate_workload(timelines: &[Timeline], status_id: &str) -> Vec<IssueWorkload> {
    let mut workloads = Vec::new();

    for timeline in timelines {
        let stints = timeline.stints(status_id);
        if stints.is_empty() {
            continue;
        }

        let mut seconds = BTreeMap::new();
        for (start, end) in stints {
            credit_stint(timeline, start, end, &mut seconds);
        }
        workloads.push(IssueWorkload {
            issue_id: timeline.issue_id.clone(),
            seconds,
        });
    }

    workloads
}

fn credit_stint(
    timeline: &Timeline,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    seconds: &mut BTreeMap<String, f64>,
) {
    let mut cursor = start;
    let mut holder = timeline.assignee_at(start);

    for change in timeline
        .assignees
        .iter()
        .filter(|change| change.date > start && change.date < end)
    {
        add_share(seconds, holder, change.date - cursor);
        cursor = change.date;
        holder = change.to.as_deref();
    }
    add_share(seconds, holder, end - cursor);
}

fn add_share(seconds: &mut BTreeMap<String, f64>, holder: Option<&str>, span: Duration) {
    let span = duration_seconds(span);
    if let Some(account) = holder {
        if span > 0.0 {
            *seconds.entry(account.to_string()).or_insert(0.0) += span;
        }
    }
}

pub fn duration_seconds(span: Duration) -> f64 {
    span.num_milliseconds() as f64 / 1000.0
}

pub fn hours(seconds: f64) -> f64 {
    seconds / SECONDS_PER_HOUR
}

/// Issues an assignee leads, with the lead's share of each
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadGroup {
    pub account_id: String,
    /// (issue id, seconds), in workload order
    pub issues: Vec<(String, f64)>,
}

impl LeadGroup {
    /// Issues sorted by descending share
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .issues
            .iter()
            .map(|(id, seconds)| (id.as_str(), *seconds))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Group issues under their lead assignee, leads in order of first appearance
pub fn group_by_lead(workloads: &[IssueWorkload]) -> Vec<LeadGroup> {
    let mut groups: Vec<LeadGroup> = Vec::new();

    for workload in workloads {
        let Some((lead, seconds)) = workload.lead() else {
            continue;
        };
        let entry = (workload.issue_id.clone(), seconds);
        match groups.iter_mut().find(|group| group.account_id == lead) {
            Some(group) => group.issues.push(entry),
            None => groups.push(LeadGroup {
                account_id: lead.to_string(),
                issues: vec![entry],
            }),
        }
    }

    groups
}

/// Lead and cycle time of one issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRow {
    pub issue_id: String,
    pub key: String,
    pub title: String,
    pub status: String,
    #[serde(serialize_with = "crate::issue::jira_time::serialize")]
    pub created: DateTime<FixedOffset>,
    #[serde(serialize_with = "crate::issue::jira_time::option::serialize")]
    pub resolved: Option<DateTime<FixedOffset>>,
    /// resolved - created
    pub lead_seconds: Option<f64>,
    /// total completed time in the tracked status
    pub cycle_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSummary {
    pub rows: Vec<FlowRow>,
    pub mean_lead_seconds: Option<f64>,
    pub mean_cycle_seconds: Option<f64>,
    pub status_counts: Vec<(String, usize)>,
}

impl FlowSummary {
    pub fn resolved(&self) -> usize {
        self.rows.iter().filter(|row| row.lead_seconds.is_some()).count()
    }

    pub fn cycled(&self) -> usize {
        self.rows.iter().filter(|row| row.cycle_seconds.is_some()).count()
    }
}

/// Lead time, cycle time in `status_id`, and status counts for every issue
pub fn flow_metrics(result: &SearchResult, timelines: &[Timeline], status_id: &str) -> FlowSummary {
    let rows: Vec<FlowRow> = result
        .issues
        .iter()
        .zip(timelines)
        .map(|(issue, timeline)| {
            let stints = timeline.stints(status_id);
            let cycle_seconds = if stints.is_empty() {
                None
            } else {
                Some(
                    stints
                        .iter()
                        .map(|(start, end)| duration_seconds(*end - *start))
                        .sum(),
                )
            };

            FlowRow {
                issue_id: issue.id.clone(),
                key: issue.key.clone(),
                title: issue.fields.summary.clone(),
                status: issue.fields.status.name.clone(),
                created: issue.fields.created,
                resolved: issue.fields.resolutiondate,
                lead_seconds: issue.lead_time().map(duration_seconds),
                cycle_seconds,
            }
        })
        .collect();

    let mean_lead_seconds = mean(rows.iter().filter_map(|row| row.lead_seconds));
    let mean_cycle_seconds = mean(rows.iter().filter_map(|row| row.cycle_seconds));
    let status_counts = tally(result.issues.iter().map(|issue| issue.fields.status.name.clone()));

    FlowSummary {
        rows,
        mean_lead_seconds,
        mean_cycle_seconds,
        status_counts,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Count occurrences, most common first, ties by key
pub fn tally<K, I>(items: I) -> Vec<(K, usize)>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    let mut counts: Vec<(K, usize)> = counts.into_iter().collect();
    // stable: BTreeMap order already breaks ties by key
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
