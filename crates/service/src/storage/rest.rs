use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::KvStore;
use crate::errors::ServiceError;

/// Remote store speaking the Upstash / Vercel KV REST dialect.
///
/// - `GET  {base}/get/{key}` -> `{"result": "<json text>" | null}`
/// - `POST {base}/set/{key}` with the JSON text as body -> `{"result": "OK"}`
///
/// Values are stored as JSON text, matching what the JS KV client writes. No retries.
pub struct RestKvStore {
    client: Client,
    base: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl RestKvStore {
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ServiceError::Storage(format!("invalid KV REST url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::Storage(format!("invalid KV REST url {base_url}")));
        }
        let client = Client::builder().timeout(timeout).build().map_err(ServiceError::storage)?;
        Ok(Self { client, base, token: token.into() })
    }

    fn command_url(&self, command: &str, key: &str) -> Result<Url, ServiceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Storage("KV REST url cannot carry a path".into()))?
            .pop_if_empty()
            .push(command)
            .push(key);
        Ok(url)
    }

    async fn read_reply(resp: reqwest::Response, command: &str) -> Result<Option<Value>, ServiceError> {
        let status = resp.status();
        let reply = resp.json::<RestReply>().await.map_err(|e| {
            ServiceError::Storage(format!("KV {command} returned {status} with unreadable body: {e}"))
        })?;
        if let Some(err) = reply.error {
            warn!(command, %status, error = %err, "kv rest error");
            return Err(ServiceError::Storage(format!("KV {command} failed: {err}")));
        }
        if !status.is_success() {
            return Err(ServiceError::Storage(format!("KV {command} returned {status}")));
        }
        Ok(reply.result)
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, ServiceError> {
        let url = self.command_url("get", key)?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ServiceError::Storage(format!("KV get unreachable: {e}")))?;
        let value = match Self::read_reply(resp, "get").await? {
            None | Some(Value::Null) => None,
            // Stored as JSON text; anything that is not JSON is handed back as a plain string.
            Some(Value::String(text)) => Some(serde_json::from_str(&text).unwrap_or(Value::String(text))),
            Some(other) => Some(other),
        };
        debug!(key, found = value.is_some(), "kv get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ServiceError> {
        let url = self.command_url("set", key)?;
        let body = serde_json::to_string(&value).map_err(ServiceError::storage)?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::Storage(format!("KV set unreachable: {e}")))?;
        Self::read_reply(resp, "set").await?;
        debug!(key, "kv set");
        Ok(())
    }
}
