//! Reports over a fixed three-issue search result with hand-computed metrics.
//!
//! ACME-1: created 01-01 09:00, In Progress 01-02 09:00 -> 01-03 09:00 (24h, Ann),
//!         resolved 01-03 09:00 (lead 48h), estimate 2h.
//! ACME-2: created 01-02 00:00, In Progress 01-02 06:00 -> 01-03 00:00 (18h:
//!         Ann 6h until reassigned at 12:00, then Bob 12h), resolved 01-04 00:00
//!         (lead 48h), estimate 1h.
//! ACME-3: created 01-01 00:00, never in progress, resolved 01-01 12:00 (lead 12h).

use std::path::PathBuf;

use jirastats_core::report::{OutputFormat, ReportData, ReportKind};
use jirastats_core::{SearchResult, SearchStore, Summary};

const IN_PROGRESS: &str = "10111";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/search.json")
}

async fn load_fixture() -> SearchResult {
    SearchStore::new(fixture_path()).load().await.unwrap()
}

#[tokio::test]
async fn workload_matches_hand_computed_hours() {
    let result = load_fixture().await;
    let data = ReportData::build(&result, IN_PROGRESS);

    assert_eq!(data.workload.len(), 2);
    assert_eq!(data.workload[0].issue_id, "1001");
    assert_eq!(data.workload[0].seconds["ann"], 24.0 * 3600.0);
    assert_eq!(data.workload[1].seconds["ann"], 6.0 * 3600.0);
    assert_eq!(data.workload[1].seconds["bob"], 12.0 * 3600.0);
    assert_eq!(data.assignees["ann"], "Ann Lee");
    assert_eq!(data.assignees["bob"], "Bob");
}

#[tokio::test]
async fn flow_metrics_match_hand_computed_hours() {
    let result = load_fixture().await;
    let data = ReportData::build(&result, IN_PROGRESS);
    let flow = &data.flow;

    let lead: Vec<Option<f64>> = flow.rows.iter().map(|r| r.lead_seconds).collect();
    assert_eq!(
        lead,
        vec![Some(48.0 * 3600.0), Some(48.0 * 3600.0), Some(12.0 * 3600.0)]
    );
    let cycle: Vec<Option<f64>> = flow.rows.iter().map(|r| r.cycle_seconds).collect();
    assert_eq!(cycle, vec![Some(24.0 * 3600.0), Some(18.0 * 3600.0), None]);

    assert_eq!(flow.mean_lead_seconds, Some(36.0 * 3600.0));
    assert_eq!(flow.mean_cycle_seconds, Some(21.0 * 3600.0));
    assert_eq!(
        flow.status_counts,
        vec![("Done".to_string(), 2), ("Won't Do".to_string(), 1)]
    );
}

#[tokio::test]
async fn both_report_text() {
    let result = load_fixture().await;
    let text = ReportData::build(&result, IN_PROGRESS).render(ReportKind::Both, OutputFormat::Text);

    let expected = "\
=== Issues Report ===

ACME-1 [1001]: Login page
  Ann Lee: 24.00 h

ACME-2 [1002]: Checkout, v2
  Bob: 12.00 h
  Ann Lee: 6.00 h

=== Assignees Report ===

Ann Lee [ann]: 2.00 hours estimated
  ACME-1 [1001]: Login page - 2.00 hours

Bob [bob]: 1.00 hours estimated
  ACME-2 [1002]: Checkout, v2 - 1.00 hours
";
    assert_eq!(text, expected);
}

#[tokio::test]
async fn flow_report_text_and_csv() {
    let result = load_fixture().await;
    let data = ReportData::build(&result, IN_PROGRESS);

    let text = data.render(ReportKind::Flow, OutputFormat::Text);
    assert!(text.contains("ACME-2 [1002]: Checkout, v2\n  status: Done, lead time: 48.00 h, cycle time: 18.00 h\n"));
    assert!(text.contains("  status: Won't Do, lead time: 12.00 h, cycle time: -\n"));
    assert!(text.contains("Mean lead time: 36.00 h over 3 resolved issues\n"));
    assert!(text.contains("Mean cycle time: 21.00 h over 2 issues\n"));
    assert!(text.ends_with("Status counts:\n  Done: 2\n  Won't Do: 1\n"));

    let csv = data.render(ReportKind::Flow, OutputFormat::Csv);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "issue_key,issue_id,title,status,created,resolved,lead_hours,cycle_hours"
    );
    assert_eq!(
        lines[2],
        "ACME-2,1002,\"Checkout, v2\",Done,2024-01-02T00:00:00.000+0000,2024-01-04T00:00:00.000+0000,48.00,18.00"
    );
    assert_eq!(
        lines[3],
        "ACME-3,1003,Docs,Won't Do,2024-01-01T00:00:00.000+0000,2024-01-01T12:00:00.000+0000,12.00,"
    );
}

#[tokio::test]
async fn issue_report_csv() {
    let result = load_fixture().await;
    let csv = ReportData::build(&result, IN_PROGRESS).render(ReportKind::Issue, OutputFormat::Csv);

    assert_eq!(
        csv,
        "issue_key,issue_id,title,assignee_id,assignee,hours\n\
         ACME-1,1001,Login page,ann,Ann Lee,24.00\n\
         ACME-2,1002,\"Checkout, v2\",bob,Bob,12.00\n\
         ACME-2,1002,\"Checkout, v2\",ann,Ann Lee,6.00\n"
    );
}

#[tokio::test]
async fn assignee_report_csv() {
    let result = load_fixture().await;
    let csv = ReportData::build(&result, IN_PROGRESS).render(ReportKind::Assignee, OutputFormat::Csv);

    assert_eq!(
        csv,
        "lead_id,lead,issue_key,issue_id,title,estimate_hours,share_hours\n\
         ann,Ann Lee,ACME-1,1001,Login page,2.00,24.00\n\
         bob,Bob,ACME-2,1002,\"Checkout, v2\",1.00,12.00\n"
    );
}

#[tokio::test]
async fn both_report_csv_separates_sections_with_a_blank_line() {
    let result = load_fixture().await;
    let csv = ReportData::build(&result, IN_PROGRESS).render(ReportKind::Both, OutputFormat::Csv);

    let expected = "\
issue_key,issue_id,title,assignee_id,assignee,hours
ACME-1,1001,Login page,ann,Ann Lee,24.00
ACME-2,1002,\"Checkout, v2\",bob,Bob,12.00
ACME-2,1002,\"Checkout, v2\",ann,Ann Lee,6.00

lead_id,lead,issue_key,issue_id,title,estimate_hours,share_hours
ann,Ann Lee,ACME-1,1001,Login page,2.00,24.00
bob,Bob,ACME-2,1002,\"Checkout, v2\",1.00,12.00
";
    assert_eq!(csv, expected);

    let all = ReportData::build(&result, IN_PROGRESS).render(ReportKind::All, OutputFormat::Csv);
    let blocks: Vec<&str> = all.split("\n\n").collect();
    assert_eq!(blocks.len(), 3);
    assert!(blocks[2].starts_with("issue_key,issue_id,title,status,created,resolved"));
}

#[tokio::test]
async fn review_status_has_no_workload() {
    let result = load_fixture().await;
    let text = ReportData::build(&result, "10359").render(ReportKind::All, OutputFormat::Text);

    assert!(text.starts_with("=== Issues Report ===\n\n=== Assignees Report ===\n\n=== Flow Report ===\n"));
    assert!(text.contains("Mean cycle time: - over 0 issues\n"));
    assert_eq!(
        ReportData::build(&result, "10359").render(ReportKind::None, OutputFormat::Text),
        ""
    );
}

#[tokio::test]
async fn info_summary_of_fixture() {
    let result = load_fixture().await;
    let text = Summary::analyze(&result).render();

    assert!(text.starts_with("Total issues: 3\nResolved issues: 3\n"));
    assert!(text.contains("  [10002] Done: 2\n  [10005] Won't Do: 1\n"));
    assert!(text.contains("  Ann Lee: 1\n  Bob: 1\n  Unassigned: 1\n"));
}
