//! Hosted backend store: inserts go through the PostgREST endpoint

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    error::{AppError, Result},
    storage::{Ack, AppendOnlyStore, validate_identifier},
};

const REST_PREFIX: &str = "rest/v1/";

/// Longest response body kept in a rejection error
const MAX_BODY_CHARS: usize = 512;

pub struct PostgrestStore {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl PostgrestStore {
    /// Create a store for the project at `base_url`, authenticating with the
    /// anonymous API key
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(AppError::configuration(format!("{base_url} cannot be used as a base URL")));
        }
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Endpoint that receives inserts for `table`
    pub fn table_url(&self, table: &str) -> Result<Url> {
        validate_identifier(table)?;
        Ok(self.base_url.join(REST_PREFIX)?.join(table)?)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&self.api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", self.api_key))?);
        headers.insert("prefer", HeaderValue::from_static("return=minimal"));
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| AppError::configuration("API key contains invalid header characters"))
}

#[async_trait]
impl AppendOnlyStore for PostgrestStore {
    #[instrument(err, skip(self, record), fields(store = "postgrest"))]
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<Ack> {
        let url = self.table_url(table)?;
        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .json(&record)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "Insert accepted");
            return Ok(Ack::single());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::StoreRejected {
            status: status.as_u16(),
            body: body.chars().take(MAX_BODY_CHARS).collect(),
        })
    }

    fn name(&self) -> &str {
        "postgrest"
    }
}
