use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION},
    Client, Response, StatusCode, Url,
};
use serde::Deserialize;
use tracing::debug;

use super::{
    models::{NewSensorReading, SensorReading},
    SensorStore, SortOrder,
};

/// Column every ordered select sorts on.
const ORDER_COLUMN: &str = "time";

/// Supabase table accessed through its PostgREST endpoint
/// (`{base_url}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    table_url: String,
    headers: HeaderMap,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self> {
        let table_url = format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table);
        Url::parse(&table_url).with_context(|| format!("invalid Supabase URL: {base_url}"))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                table_url,
                headers: auth_headers(api_key)?,
            }),
        })
    }

    fn url(&self, params: &[(&str, String)]) -> Result<Url> {
        Url::parse_with_params(&self.inner.table_url, params)
            .context("failed to build Supabase request URL")
    }
}

#[async_trait]
impl SensorStore for SupabaseStore {
    async fn insert(&self, reading: &NewSensorReading) -> Result<()> {
        let url = self.url(&[])?;
        debug!(url = %url, time = %reading.time, "Inserting sensor reading");

        let resp = self
            .inner
            .http
            .post(url)
            .headers(self.inner.headers.clone())
            .header("Prefer", "return=minimal")
            .json(reading)
            .send()
            .await
            .context("Supabase insert request failed")?;

        ensure_success(resp).await?;
        Ok(())
    }

    async fn select_ordered(
        &self,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<SensorReading>> {
        let url = self.url(&select_params(order, limit))?;
        debug!(url = %url, "Selecting sensor readings");

        let resp = self
            .inner
            .http
            .get(url)
            .headers(self.inner.headers.clone())
            .send()
            .await
            .context("Supabase select request failed")?;

        let rows = ensure_success(resp)
            .await?
            .json::<Vec<SensorReading>>()
            .await
            .context("Failed to deserialize Supabase select response")?;
        Ok(rows)
    }

    async fn delete_by_id(&self, id: i64) -> Result<u64> {
        let url = self.url(&delete_params(id))?;
        debug!(url = %url, id, "Deleting sensor reading");

        // PostgREST only reports affected rows when asked to return them.
        let resp = self
            .inner
            .http
            .delete(url)
            .headers(self.inner.headers.clone())
            .header("Prefer", "return=representation")
            .send()
            .await
            .context("Supabase delete request failed")?;

        let deleted = ensure_success(resp)
            .await?
            .json::<Vec<serde_json::Value>>()
            .await
            .context("Failed to deserialize Supabase delete response")?;
        Ok(deleted.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// `apikey` plus bearer authorization, both carrying the project key.
fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("apikey"),
        HeaderValue::from_str(api_key).context("invalid header value for apikey")?,
    );
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("invalid header value for Authorization")?,
    );
    Ok(headers)
}

pub(crate) fn select_params(order: SortOrder, limit: Option<usize>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", "*".to_owned()),
        ("order", format!("{ORDER_COLUMN}.{}", order.as_postgrest())),
    ];
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

pub(crate) fn delete_params(id: i64) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{id}"))]
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    bail!("{}", describe_failure(status, &body))
}

/// Turn a non-2xx response into the message surfaced to API clients.
pub(crate) fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(PostgrestError { message, code: Some(code) }) => {
            format!("Supabase returned {status}: {message} (code {code})")
        }
        Ok(PostgrestError { message, code: None }) => {
            format!("Supabase returned {status}: {message}")
        }
        Err(_) if body.trim().is_empty() => format!("Supabase returned {status}"),
        Err(_) => format!("Supabase returned {status}: {}", body.trim()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
