use crate::config::StoreSettings;
use crate::models::RawLocationRecord;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when reading from the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or project")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Document store client
///
/// Reads image metadata documents from an Appwrite-compatible REST API.
/// This is the only data access the recommendation endpoint performs.
pub struct DocumentStoreClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    images_collection: String,
    page_size: u32,
    client: Client,
}

impl DocumentStoreClient {
    /// Create a client from the store settings
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        let timeout = settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            project_id: settings.project_id.clone(),
            database_id: settings.database_id.clone(),
            images_collection: settings.images_collection.clone(),
            page_size: settings.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            client,
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url, self.database_id, self.images_collection
        )
    }

    /// Fetch every image record owned by `user_id`, following pagination
    pub async fn list_image_records(
        &self,
        user_id: &str,
    ) -> Result<Vec<RawLocationRecord>, StoreError> {
        let mut records = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let page = self.fetch_page(user_id, offset).await?;
            let fetched = page.documents.len() as u64;
            records.extend(page.documents.iter().filter_map(decode_record));
            offset += fetched;

            if fetched == 0 || offset >= page.total {
                break;
            }
        }

        tracing::debug!("Fetched {} image records for user {}", records.len(), user_id);

        Ok(records)
    }

    async fn fetch_page(&self, user_id: &str, offset: u64) -> Result<DocumentPage, StoreError> {
        let owner = serde_json::to_string(user_id)
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to encode user id: {}", e)))?;

        let queries = vec![
            format!("equal(\"userId\", {})", owner),
            format!("limit({})", self.page_size),
            format!("offset({})", offset),
        ];
        let queries_json = serde_json::to_string(&queries)
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to encode queries: {}", e)))?;

        let url = format!("{}?query={}", self.documents_url(), urlencoding::encode(&queries_json));

        tracing::trace!("Fetching image records: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(StoreError::Unauthorized),
            StatusCode::NOT_FOUND => {
                return Err(StoreError::NotFound(format!(
                    "Collection {} in database {}",
                    self.images_collection, self.database_id
                )))
            }
            status => {
                let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Failed to fetch image records for {}: {} - {}", user_id, status, body);
                return Err(StoreError::ApiError(format!(
                    "Failed to fetch image records: {}",
                    status
                )));
            }
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .cloned()
            .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

        let total = json
            .get("total")
            .and_then(|t| t.as_u64())
            .unwrap_or(offset + documents.len() as u64);

        Ok(DocumentPage { documents, total })
    }
}

struct DocumentPage {
    documents: Vec<Value>,
    total: u64,
}

/// Decode one stored document, skipping it when it doesn't fit the record shape
fn decode_record(doc: &Value) -> Option<RawLocationRecord> {
    let data = doc.get("data").unwrap_or(doc);

    match serde_json::from_value(data.clone()) {
        Ok(record) => Some(record),
        Err(e) => {
            let id = doc.get("$id").and_then(|v| v.as_str()).unwrap_or("<unknown>");
            tracing::warn!("Skipping undecodable image document {}: {}", id, e);
            None
        }
    }
}
