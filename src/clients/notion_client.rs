use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to Notion failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Notion responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Notion response is malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Returns the `results` array of a database query.
    async fn query_database(&self, token: &str, database_id: &str) -> Result<Value, FetchError>;
}

pub struct NotionClient {
    http: reqwest::Client,
    api_base: String,
    notion_version: String,
}

impl NotionClient {
    pub fn with_endpoint(http: reqwest::Client, api_base: &str, notion_version: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            notion_version: notion_version.to_string(),
        }
    }

    fn query_url(&self, database_id: &str) -> String {
        format!("{}/databases/{}/query", self.api_base, database_id)
    }
}

#[async_trait]
impl CalendarSource for NotionClient {
    async fn query_database(&self, token: &str, database_id: &str) -> Result<Value, FetchError> {
        let url = self.query_url(database_id);
        debug!(%url, "querying Notion database");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("Notion-Version", &self.notion_version)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let mut document: Value = serde_json::from_str(&text)
            .map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))?;
        match document.get_mut("results").map(Value::take) {
            Some(results @ Value::Array(_)) => Ok(results),
            Some(_) => Err(FetchError::Malformed("results is not an array".to_string())),
            None => Err(FetchError::Malformed("missing results".to_string())),
        }
    }
}
