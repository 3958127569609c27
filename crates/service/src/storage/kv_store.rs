use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ServiceError;

/// Minimal key-value contract: whole values are read and written, never patched.
/// `get` returns `Ok(None)` for a key that was never set.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, ServiceError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), ServiceError>;
}
