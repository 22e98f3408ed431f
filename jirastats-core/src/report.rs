//! Report rendering for the issue, assignee and flow views

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::changelog::{build_timelines, Timeline};
use crate::error::JiraStatsError;
use crate::issue::{jira_time, SearchResult};
use crate::metrics::{
    calculate_workload, display_name, flow_metrics, group_by_lead, hours, map_assignees,
    map_issues, FlowSummary, IssueInfo, IssueWorkload,
};

/// The `--report` selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Issue,
    Assignee,
    Flow,
    Both,
    All,
    None,
}

/// One rendered block of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Issues,
    Assignees,
    Flow,
}

impl ReportKind {
    pub const NAMES: [&'static str; 6] = ["issue", "assignee", "flow", "both", "all", "none"];

    pub fn sections(self) -> &'static [Section] {
        match self {
            ReportKind::Issue => &[Section::Issues],
            ReportKind::Assignee => &[Section::Assignees],
            ReportKind::Flow => &[Section::Flow],
            ReportKind::Both => &[Section::Issues, Section::Assignees],
            ReportKind::All => &[Section::Issues, Section::Assignees, Section::Flow],
            ReportKind::None => &[],
        }
    }
}

impl FromStr for ReportKind {
    type Err = JiraStatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "issue" => Ok(ReportKind::Issue),
            "assignee" => Ok(ReportKind::Assignee),
            "flow" => Ok(ReportKind::Flow),
            "both" => Ok(ReportKind::Both),
            "all" => Ok(ReportKind::All),
            "none" => Ok(ReportKind::None),
            other => Err(JiraStatsError::InvalidInput(format!(
                "unknown report '{}' (expected one of {})",
                other,
                ReportKind::NAMES.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Csv,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 2] = ["text", "csv"];
}

impl FromStr for OutputFormat {
    type Err = JiraStatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(JiraStatsError::InvalidInput(format!(
                "unknown format '{}' (expected text or csv)",
                other
            ))),
        }
    }
}

/// Everything the reports are rendered from, computed once per invocation
#[derive(Debug, Clone)]
pub struct ReportData {
    pub status_id: String,
    pub issues: BTreeMap<String, IssueInfo>,
    pub assignees: BTreeMap<String, String>,
    pub timelines: Vec<Timeline>,
    pub workload: Vec<IssueWorkload>,
    pub flow: FlowSummary,
}

impl ReportData {
    pub fn build(result: &SearchResult, status_id: &str) -> Self {
        let timelines = build_timelines(result);
        let workload = calculate_workload(&timelines, status_id);
        let flow = flow_metrics(result, &timelines, status_id);

        ReportData {
            status_id: status_id.to_string(),
            issues: map_issues(result),
            assignees: map_assignees(result),
            timelines,
            workload,
            flow,
        }
    }

    pub fn render(&self, kind: ReportKind, format: OutputFormat) -> String {
        let blocks: Vec<String> = kind
            .sections()
            .iter()
            .map(|section| match (section, format) {
                (Section::Issues, OutputFormat::Text) => self.issues_text(),
                (Section::Issues, OutputFormat::Csv) => self.issues_csv(),
                (Section::Assignees, OutputFormat::Text) => self.assignees_text(),
                (Section::Assignees, OutputFormat::Csv) => self.assignees_csv(),
                (Section::Flow, OutputFormat::Text) => self.flow_text(),
                (Section::Flow, OutputFormat::Csv) => self.flow_csv(),
            })
            .collect();
        blocks.join("\n")
    }

    fn issue(&self, issue_id: &str) -> IssueInfo {
        self.issues.get(issue_id).cloned().unwrap_or_else(|| IssueInfo {
            key: "UNKNOWN".to_string(),
            title: "Unknown Issue".to_string(),
            timeestimate: None,
        })
    }

    fn issues_text(&self) -> String {
        let mut out = String::from("=== Issues Report ===\n");
        for workload in &self.workload {
            let info = self.issue(&workload.issue_id);
            let _ = writeln!(out, "\n{} [{}]: {}", info.key, workload.issue_id, info.title);

            let ranked = workload.ranked();
            if ranked.is_empty() {
                out.push_str("  No assignees found\n");
                continue;
            }
            for (account, seconds) in ranked {
                let _ = writeln!(
                    out,
                    "  {}: {:.2} h",
                    display_name(&self.assignees, account),
                    hours(seconds)
                );
            }
        }
        out
    }

    fn issues_csv(&self) -> String {
        let mut out = csv_row(&["issue_key", "issue_id", "title", "assignee_id", "assignee", "hours"]);
        for workload in &self.workload {
            let info = self.issue(&workload.issue_id);
            for (account, seconds) in workload.ranked() {
                out.push_str(&csv_row(&[
                    &info.key,
                    &workload.issue_id,
                    &info.title,
                    account,
                    &display_name(&self.assignees, account),
                    &format!("{:.2}", hours(seconds)),
                ]));
            }
        }
        out
    }

    fn assignees_text(&self) -> String {
        let mut out = String::from("=== Assignees Report ===\n");
        for group in group_by_lead(&self.workload) {
            let estimate: i64 = group
                .issues
                .iter()
                .map(|(id, _)| self.issue(id).timeestimate.unwrap_or(0))
                .sum();
            let _ = writeln!(
                out,
                "\n{} [{}]: {:.2} hours estimated",
                display_name(&self.assignees, &group.account_id),
                group.account_id,
                hours(estimate as f64)
            );

            for (issue_id, _) in group.ranked() {
                let info = self.issue(issue_id);
                let _ = writeln!(
                    out,
                    "  {} [{}]: {} - {:.2} hours",
                    info.key,
                    issue_id,
                    info.title,
                    hours(info.timeestimate.unwrap_or(0) as f64)
                );
            }
        }
        out
    }

    fn assignees_csv(&self) -> String {
        let mut out = csv_row(&[
            "lead_id",
            "lead",
            "issue_key",
            "issue_id",
            "title",
            "estimate_hours",
            "share_hours",
        ]);
        for group in group_by_lead(&self.workload) {
            let lead = display_name(&self.assignees, &group.account_id);
            for (issue_id, seconds) in group.ranked() {
                let info = self.issue(issue_id);
                out.push_str(&csv_row(&[
                    &group.account_id,
                    &lead,
                    &info.key,
                    issue_id,
                    &info.title,
                    &format!("{:.2}", hours(info.timeestimate.unwrap_or(0) as f64)),
                    &format!("{:.2}", hours(seconds)),
                ]));
            }
        }
        out
    }

    fn flow_text(&self) -> String {
        let mut out = String::from("=== Flow Report ===\n");
        for row in &self.flow.rows {
            let _ = writeln!(out, "\n{} [{}]: {}", row.key, row.issue_id, row.title);
            let _ = writeln!(
                out,
                "  status: {}, lead time: {}, cycle time: {}",
                row.status,
                hours_or_dash(row.lead_seconds),
                hours_or_dash(row.cycle_seconds)
            );
        }

        let _ = writeln!(
            out,
            "\nMean lead time: {} over {} resolved issues",
            hours_or_dash(self.flow.mean_lead_seconds),
            self.flow.resolved()
        );
        let _ = writeln!(
            out,
            "Mean cycle time: {} over {} issues",
            hours_or_dash(self.flow.mean_cycle_seconds),
            self.flow.cycled()
        );
        out.push_str("\nStatus counts:\n");
        for (status, count) in &self.flow.status_counts {
            let _ = writeln!(out, "  {}: {}", status, count);
        }
        out
    }

    fn flow_csv(&self) -> String {
        let mut out = csv_row(&[
            "issue_key",
            "issue_id",
            "title",
            "status",
            "created",
            "resolved",
            "lead_hours",
            "cycle_hours",
        ]);
        for row in &self.flow.rows {
            out.push_str(&csv_row(&[
                &row.key,
                &row.issue_id,
                &row.title,
                &row.status,
                &jira_time::format(&row.created),
                &row.resolved.as_ref().map(jira_time::format).unwrap_or_default(),
                &row.lead_seconds.map(|s| format!("{:.2}", hours(s))).unwrap_or_default(),
                &row.cycle_seconds.map(|s| format!("{:.2}", hours(s))).unwrap_or_default(),
            ]));
        }
        out
    }
}

fn hours_or_dash(seconds: Option<f64>) -> String {
    match seconds {
        Some(seconds) => format!("{:.2} h", hours(seconds)),
        None => "-".to_string(),
    }
}

/// One CSV line; fields with separators, quotes or line breaks are quoted
pub fn csv_row(fields: &[&str]) -> String {
    let escaped: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
    format!("{}\n", escaped.join(","))
}

fn csv_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
