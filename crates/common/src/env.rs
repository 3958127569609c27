//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Warn when the static frontend is missing; it is optional for API-only deployments.
pub async fn ensure_frontend(frontend_dir: &str) {
    if tokio::fs::metadata(frontend_dir).await.is_err() {
        warn!(%frontend_dir, "frontend assets directory not found; static assets may 404");
    }
}

/// Create the parent directory of a data file (e.g. `data/licenses.json`).
pub async fn ensure_data_parent(file_path: &str) -> anyhow::Result<()> {
    let parent = match std::path::Path::new(file_path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    Ok(())
}
