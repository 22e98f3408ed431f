//! The single "latest search result" file

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{JiraStatsError, Result};
use crate::issue::SearchResult;

/// JSON file holding the most recent search result
#[derive(Debug, Clone)]
pub struct SearchStore {
    path: PathBuf,
}

impl SearchStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        SearchStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted result, `NotFound` when no search has run yet
    pub async fn load(&self) -> Result<SearchResult> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(JiraStatsError::NotFound(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        let result: SearchResult =
            serde_json::from_str(&content).map_err(|err| JiraStatsError::InvalidArtifact {
                path: self.path.clone(),
                message: err.to_string(),
            })?;

        debug!(
            "Loaded {} issues from {}",
            result.issues.len(),
            self.path.display()
        );
        Ok(result)
    }

    /// Replace the persisted result.
    ///
    /// The JSON is written next to the target and renamed over it, so readers
    /// see either the previous result or the new one.
    pub async fn save(&self, result: &SearchResult) -> Result<()> {
        let json = serde_json::to_string_pretty(result)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, json.as_bytes()).await?;
        if let Err(err) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        debug!(
            "Saved {} issues to {}",
            result.issues.len(),
            self.path.display()
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{parse_date, SearchQuery};
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    fn result_with(ids: &[&str], start: &str, end: &str) -> SearchResult {
        let issues = ids
            .iter()
            .map(|id| {
                serde_json::from_value(json!({
                    "id": id,
                    "key": format!("ACME-{}", id),
                    "fields": {
                        "status": {"id": "10002", "name": "Done"},
                        "created": "2024-01-01T00:00:00.000+0000"
                    }
                }))
                .unwrap()
            })
            .collect();
        SearchResult {
            query: SearchQuery::date_range(
                "ACME",
                parse_date(start).unwrap(),
                parse_date(end).unwrap(),
                &[],
            )
            .unwrap(),
            fetched_at: Utc::now(),
            pages: 1,
            is_last: true,
            issues,
        }
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = SearchStore::new(temp_dir.path().join("search.json"));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, JiraStatsError::NotFound(ref p) if p == store.path()));
    }

    #[tokio::test]
    async fn save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = SearchStore::new(temp_dir.path().join("nested/search.json"));
        let result = result_with(&["1", "2"], "2024-01-01", "2024-01-31");

        store.save(&result).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, result);
        assert!(!temp_dir.path().join("nested/search.json.tmp").exists());
    }

    #[tokio::test]
    async fn new_search_replaces_previous_result() {
        let temp_dir = TempDir::new().unwrap();
        let store = SearchStore::new(temp_dir.path().join("search.json"));

        store
            .save(&result_with(&["1", "2", "3"], "2024-01-01", "2024-01-31"))
            .await
            .unwrap();
        store
            .save(&result_with(&["9"], "2024-02-01", "2024-02-29"))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        let ids: Vec<&str> = loaded.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["9"]);
        assert_eq!(loaded.query.start_date, Some(parse_date("2024-02-01").unwrap()));
    }

    #[tokio::test]
    async fn garbage_is_an_invalid_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("search.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = SearchStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, JiraStatsError::InvalidArtifact { .. }));
    }
}
