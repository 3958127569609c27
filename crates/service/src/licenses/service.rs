use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::domain::{AddLicenseInput, DeleteLicenseInput, License, MutationRequest};
use crate::errors::ServiceError;
use crate::storage::KvStore;

pub const MSG_BAD_PASSWORD: &str = "Password Admin Salah! Akses Ditolak.";

/// Result of a delete: a miss is reported, not raised, and the collection is not rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed(Vec<License>),
    NotFound { data: Vec<License>, message: String },
}

/// Result of an accepted `POST /api` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Added(Vec<License>),
    Deleted(DeleteOutcome),
}

/// Read-modify-write access to the license collection stored under one key.
///
/// Every call reads the collection fresh from the store. Mutations in this
/// process go through `write_gate`; writers in other processes still race.
pub struct LicenseService {
    store: Arc<dyn KvStore>,
    key: String,
    admin_password: String,
    write_gate: Mutex<()>,
}

impl LicenseService {
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>, admin_password: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            admin_password: admin_password.into(),
            write_gate: Mutex::new(()),
        }
    }

    /// Current collection; an unset key reads as empty.
    ///
    /// Records that cannot be read as a license with a positive integer id are
    /// skipped with a warning, so the next accepted mutation drops them.
    pub async fn list(&self) -> Result<Vec<License>, ServiceError> {
        let items = match self.store.get(&self.key).await? {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ServiceError::Storage(format!(
                    "collection `{}` is not a list of licenses",
                    self.key
                )))
            }
        };
        let mut licenses = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<License>(item) {
                Ok(license) if license.id > 0 => licenses.push(license),
                Ok(license) => warn!(key = %self.key, index, id = license.id, "skipping stored license with id 0"),
                Err(e) => warn!(key = %self.key, index, error = %e, "skipping unreadable stored license"),
            }
        }
        Ok(licenses)
    }

    pub fn verify_password(&self, password: Option<&str>) -> Result<(), ServiceError> {
        match password {
            Some(p) if p == self.admin_password => Ok(()),
            _ => Err(ServiceError::Unauthorized(MSG_BAD_PASSWORD.into())),
        }
    }

    /// Append a record with a fresh id and persist the whole collection.
    pub async fn add(&self, input: AddLicenseInput) -> Result<Vec<License>, ServiceError> {
        let license = input.into_license()?;

        let _guard = self.write_gate.lock().await;
        let mut licenses = self.list().await?;
        if licenses.iter().any(|l| l.id == license.id) {
            return Err(ServiceError::Validation(format!("ID {} sudah terdaftar!", license.id)));
        }
        let id = license.id;
        licenses.push(license);
        self.save(&licenses).await?;
        info!(key = %self.key, id, count = licenses.len(), "license added");
        Ok(licenses)
    }

    /// Remove every record with `id`; a miss leaves the store untouched.
    pub async fn delete(&self, id: u64) -> Result<DeleteOutcome, ServiceError> {
        let _guard = self.write_gate.lock().await;
        let licenses = self.list().await?;
        let before = licenses.len();
        let remaining: Vec<License> = licenses.into_iter().filter(|l| l.id != id).collect();

        if remaining.len() == before {
            warn!(key = %self.key, id, "license delete target not found");
            return Ok(DeleteOutcome::NotFound {
                data: remaining,
                message: format!("ID {} tidak ditemukan.", id),
            });
        }

        self.save(&remaining).await?;
        info!(key = %self.key, id, count = remaining.len(), "license deleted");
        Ok(DeleteOutcome::Removed(remaining))
    }

    /// Check the admin password, then dispatch on `action`.
    pub async fn apply(&self, req: MutationRequest) -> Result<MutationOutcome, ServiceError> {
        self.verify_password(req.password.as_deref())?;

        match req.action.as_str() {
            "add" => {
                let input: AddLicenseInput = parse_payload(req.payload)?;
                Ok(MutationOutcome::Added(self.add(input).await?))
            }
            "delete" => {
                let input: DeleteLicenseInput = parse_payload(req.payload)?;
                let id = input.id()?;
                Ok(MutationOutcome::Deleted(self.delete(id).await?))
            }
            other => Err(ServiceError::UnknownAction(other.to_string())),
        }
    }

    async fn save(&self, licenses: &[License]) -> Result<(), ServiceError> {
        let value = serde_json::to_value(licenses).map_err(ServiceError::storage)?;
        self.store.set(&self.key, value).await
    }
}

/// Missing or non-object payloads read as empty, so the id check reports them.
fn parse_payload<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, ServiceError> {
    let payload = match payload {
        Value::Object(_) => payload,
        _ => Value::Object(Default::default()),
    };
    serde_json::from_value(payload).map_err(|e| ServiceError::Validation(format!("payload tidak valid: {e}")))
}
