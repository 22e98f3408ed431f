//! JIRA REST API access
//!
//! Only the enhanced search endpoint is used. Pages are chained through
//! `nextPageToken` until JIRA reports `isLast`.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::*;
use crate::context::Context;
use crate::error::{JiraStatsError, Result};
use crate::issue::{Issue, SearchResult};
use crate::query::SearchQuery;

/// Query string parameters shared by every page of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub jql: String,
    pub max_results: u32,
    pub fields: String,
    pub expand: String,
}

impl SearchRequest {
    pub fn new(jql: impl Into<String>) -> Self {
        SearchRequest {
            jql: jql.into(),
            max_results: DEFAULT_MAX_RESULTS,
            fields: DEFAULT_FIELDS.to_string(),
            expand: DEFAULT_EXPAND.to_string(),
        }
    }

    /// `fields` plus whatever the issue model needs, unless a wildcard already covers it
    pub fn effective_fields(&self) -> String {
        let mut fields: Vec<&str> = self
            .fields
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect();
        if fields.iter().any(|field| WILDCARD_FIELDS.contains(field)) {
            return fields.join(",");
        }
        for required in REQUIRED_FIELDS {
            if !fields.contains(required) {
                fields.push(*required);
            }
        }
        fields.join(",")
    }

    fn query_pairs(&self, next_page_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("jql", self.jql.clone()),
            ("maxResults", self.max_results.to_string()),
            ("fields", self.effective_fields()),
        ];
        if !self.expand.is_empty() {
            pairs.push(("expand", self.expand.clone()));
        }
        if let Some(token) = next_page_token {
            pairs.push(("nextPageToken", token.to_string()));
        }
        pairs
    }
}

/// One page of `/rest/api/3/search/jql`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub is_last: Option<bool>,
}

#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Fetch a single page; `None` requests the first one
    async fn search_page(
        &self,
        request: &SearchRequest,
        next_page_token: Option<&str>,
    ) -> Result<SearchPage>;
}

/// Basic-auth client for a JIRA Cloud instance
pub struct JiraClient {
    client: reqwest::Client,
    search_url: Url,
    user_email: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(ctx: &Context) -> Result<Self> {
        ctx.validate_credentials()?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(ctx.timeout_secs))
            .build()?;

        Ok(JiraClient {
            client,
            search_url: search_url(&ctx.jira_url)?,
            user_email: ctx.user_email.clone(),
            api_token: ctx.api_token.clone(),
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }
}

#[async_trait]
impl SearchApi for JiraClient {
    async fn search_page(
        &self,
        request: &SearchRequest,
        next_page_token: Option<&str>,
    ) -> Result<SearchPage> {
        debug!("GET {} (page token: {:?})", self.search_url, next_page_token);

        let response = self
            .client
            .get(self.search_url.clone())
            .basic_auth(&self.user_email, Some(&self.api_token))
            .query(&request.query_pairs(next_page_token))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(JiraStatsError::Jira {
                status: Some(status.as_u16()),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|err| JiraStatsError::Jira {
            status: None,
            message: format!("unexpected search response: {}", err),
        })
    }
}

/// Search endpoint below `base`, keeping any context path of the instance
pub fn search_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|err| {
        JiraStatsError::Config(format!("{} '{}' is not a valid URL: {}", ENV_JIRA_URL, base, err))
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.join(SEARCH_PATH)?)
}

/// Extract JIRA's `errorMessages`/`errors` from a failure body, or a prefix of the raw text
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let mut messages: Vec<String> = value["errorMessages"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(errors) = value["errors"].as_object() {
            for (field, message) in errors {
                messages.push(format!("{}: {}", field, message.as_str().unwrap_or_default()));
            }
        }
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(300).collect()
    }
}

/// Issues gathered across all pages of one search
#[derive(Debug, Clone)]
pub struct FetchedIssues {
    pub issues: Vec<Issue>,
    pub pages: u32,
    pub is_last: bool,
    pub duplicates: usize,
}

/// Request every page and return the union of issues, first occurrence wins
pub async fn fetch_all<A>(api: &A, request: &SearchRequest) -> Result<FetchedIssues>
where
    A: SearchApi + ?Sized,
{
    let mut issues = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut seen_tokens = HashSet::new();
    let mut duplicates = 0;
    let mut pages = 0;
    let mut token: Option<String> = None;

    loop {
        let page = api.search_page(request, token.as_deref()).await?;
        pages += 1;
        info!("Fetched page {} with {} issues", pages, page.issues.len());

        for issue in page.issues {
            if seen_ids.insert(issue.id.clone()) {
                issues.push(issue);
            } else {
                duplicates += 1;
            }
        }

        let is_last = page.is_last.unwrap_or(page.next_page_token.is_none());
        match page.next_page_token {
            Some(next) if !is_last => {
                if !seen_tokens.insert(next.clone()) {
                    return Err(JiraStatsError::Jira {
                        status: None,
                        message: format!("page token {} was returned twice", next),
                    });
                }
                token = Some(next);
            }
            _ => {
                if !is_last {
                    warn!("JIRA reported more pages but sent no page token, stopping");
                }
                if duplicates > 0 {
                    debug!("Dropped {} duplicate issues", duplicates);
                }
                return Ok(FetchedIssues {
                    issues,
                    pages,
                    is_last,
                    duplicates,
                });
            }
        }
    }
}

/// Run `query` against JIRA and package the outcome for persisting
pub async fn search<A>(api: &A, query: SearchQuery, request: &SearchRequest) -> Result<SearchResult>
where
    A: SearchApi + ?Sized,
{
    let fetched = fetch_all(api, request).await?;
    Ok(SearchResult {
        query,
        fetched_at: Utc::now(),
        pages: fetched.pages,
        is_last: fetched.is_last,
        issues: fetched.issues,
    })
}
