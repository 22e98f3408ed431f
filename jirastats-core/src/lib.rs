//! jirastats core library
//!
//! Shared types and operations behind the jirastats tools: configuration,
//! the JIRA search client, the persisted "latest search result" and the
//! metrics and reports computed from it.

pub mod changelog;
pub mod constants;
pub mod context;
pub mod error;
pub mod issue;
pub mod jira;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod report;
pub mod store;
pub mod summary;

// Re-export commonly used items
pub use context::Context;
pub use error::{JiraStatsError, Result};
pub use issue::{Issue, SearchResult};
pub use jira::{JiraClient, SearchApi, SearchRequest};
pub use query::SearchQuery;
pub use report::{OutputFormat, ReportData, ReportKind};
pub use store::SearchStore;
pub use summary::Summary;
