use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::KvStore;
use crate::errors::ServiceError;

/// JSON file-backed key-value store.
///
/// Keeps every key in memory and rewrites the whole file on each `set`.
/// Intended for single-node deployments where a hosted KV is overkill.
pub struct JsonFileKvStore {
    inner: RwLock<HashMap<String, Value>>,
    file_path: PathBuf,
}

impl JsonFileKvStore {
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    /// A file that exists but does not hold a JSON object is an error, not an empty store.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<String, Value> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("{} is not a JSON object: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<String, Value> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(ServiceError::storage)?)
                    .await
                    .map_err(ServiceError::storage)?;
                empty
            }
            Err(e) => return Err(ServiceError::storage(e)),
        };

        Ok(Self { inner: RwLock::new(map), file_path })
    }

    async fn save(&self, map: &HashMap<String, Value>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(map).map_err(ServiceError::storage)?;
        // 先写临时文件再 rename，避免写到一半时进程退出导致文件损坏
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
        fs::rename(&tmp, &self.file_path).await.map_err(ServiceError::storage)?;
        debug!(path = %self.file_path.display(), keys = map.len(), "kv file saved");
        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, ServiceError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    /// Persist first, then publish in memory, so a failed write leaves readers on the old value.
    async fn set(&self, key: &str, value: Value) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        next.insert(key.to_string(), value);
        self.save(&next).await?;
        *map = next;
        Ok(())
    }
}
