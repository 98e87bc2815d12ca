//! Firestore REST v1 document store

use super::DocumentStore;
use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::document::{Document, FieldMap, StructuredQuery};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// One element of a `:runQuery` response stream; progress entries carry no document
#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    #[serde(default)]
    document: Option<Document>,
}

/// HTTP client for a Firestore documents root
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
}

impl FirestoreStore {
    /// Create a new store client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
                _ => Err(ClientError::Status {
                    status: status.as_u16(),
                    body: text,
                }),
            };
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: &str) -> ClientResult<Vec<Document>> {
        let url = self.collection_url(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListResponse = Self::handle_response(request.send().await?).await?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(collection, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> ClientResult<Document> {
        let response = self.client.get(self.document_url(collection, id)).send().await?;
        Self::handle_response(response).await
    }

    async fn create(&self, collection: &str, fields: FieldMap) -> ClientResult<Document> {
        let response = self
            .client
            .post(self.collection_url(collection))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let doc: Document = Self::handle_response(response).await?;
        tracing::debug!(collection, id = %doc.id(), "Created document");
        Ok(doc)
    }

    async fn patch(&self, collection: &str, id: &str, fields: FieldMap) -> ClientResult<Document> {
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|name| ("updateMask.fieldPaths", name.as_str()))
            .collect();
        let response = self
            .client
            .patch(self.document_url(collection, id))
            .query(&mask)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn run_query(&self, query: &StructuredQuery) -> ClientResult<Vec<Document>> {
        let response = self
            .client
            .post(format!("{}:runQuery", self.base_url))
            .json(&query.to_request_body())
            .send()
            .await?;
        let entries: Vec<RunQueryEntry> = Self::handle_response(response).await?;
        Ok(entries.into_iter().filter_map(|e| e.document).collect())
    }
}
