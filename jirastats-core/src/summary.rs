use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::issue::{SearchResult, Status};
use crate::metrics::tally;
use crate::query::SearchQuery;

/// Counts printed by the info tool
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_issues: usize,
    pub resolved_issues: usize,
    pub is_last_page: bool,
    pub pages: u32,
    pub fetched_at: DateTime<Utc>,
    pub query: SearchQuery,
    pub status_counts: Vec<(Status, usize)>,
    pub assignee_counts: Vec<(String, usize)>,
}

impl Summary {
    pub fn analyze(result: &SearchResult) -> Self {
        // keyed by (name, id) so count ties list alphabetically
        let status_counts = tally(result.issues.iter().map(|issue| {
            (issue.fields.status.name.clone(), issue.fields.status.id.clone())
        }))
        .into_iter()
        .map(|((name, id), count)| (Status { id, name }, count))
        .collect();

        let assignee_counts = tally(
            result
                .issues
                .iter()
                .map(|issue| issue.assignee_name().to_string()),
        );

        Summary {
            total_issues: result.issues.len(),
            resolved_issues: result.resolved_count(),
            is_last_page: result.is_last,
            pages: result.pages,
            fetched_at: result.fetched_at,
            query: result.query.clone(),
            status_counts,
            assignee_counts,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total issues: {}", self.total_issues);
        let _ = writeln!(out, "Resolved issues: {}", self.resolved_issues);
        let _ = writeln!(out, "Last page: {} ({} pages fetched)", self.is_last_page, self.pages);
        let _ = writeln!(out, "Query: {}", self.query.describe());
        let _ = writeln!(out, "JQL: {}", self.query.jql);
        let _ = writeln!(
            out,
            "Fetched at: {}",
            self.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        out.push_str("\nStatus distribution:\n");
        for (status, count) in &self.status_counts {
            let _ = writeln!(out, "  [{}] {}: {}", status.id, status.name, count);
        }

        out.push_str("\nAssignee distribution:\n");
        for (assignee, count) in &self.assignee_counts {
            let _ = writeln!(out, "  {}: {}", assignee, count);
        }
        out
    }
}
