use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_COLLECTION_KEY: &str = "license_users";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: None,
            frontend_dir: default_frontend_dir(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
    Rest,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "rest" => Ok(Self::Rest),
            other => Err(anyhow!("unknown store.backend `{other}` (expected memory|file|rest)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_file_path")]
    pub file_path: String,
    #[serde(default)]
    pub rest_url: String,
    #[serde(default)]
    pub rest_token: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            key: default_key(),
            file_path: default_file_path(),
            rest_url: String::new(),
            rest_token: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_frontend_dir() -> String { "frontend".into() }
fn default_key() -> String { DEFAULT_COLLECTION_KEY.into() }
fn default_file_path() -> String { "data/licenses.json".into() }
fn default_timeout() -> u64 { 10 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Read an env var through `lookup`, treating blank values as unset.
fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to pure environment
    /// configuration when the file is absent, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                _ => return Err(e),
            },
        };
        cfg.apply_env(|name| std::env::var(name).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment values. File values win for server settings; secrets
    /// and store endpoints are filled from env only when the file leaves them empty.
    /// An unparsable `KV_BACKEND` is an error rather than a silent fallback to memory.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = non_empty(&lookup, "SERVER_HOST") {
            if self.server.host.trim().is_empty() || self.server.host == ServerConfig::default().host {
                self.server.host = host;
            }
        }
        if let Some(port) = non_empty(&lookup, "SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            if self.server.port == ServerConfig::default().port {
                self.server.port = port;
            }
        }
        if self.server.worker_threads.is_none() {
            self.server.worker_threads =
                non_empty(&lookup, "TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok());
        }
        if let Some(raw) = non_empty(&lookup, "KV_BACKEND") {
            let backend = raw.parse::<StoreBackend>().map_err(|e| anyhow!("KV_BACKEND: {e}"))?;
            if self.store.backend == StoreBackend::Memory {
                self.store.backend = backend;
            }
        }
        if let Some(key) = non_empty(&lookup, "KV_KEY") {
            if self.store.key == DEFAULT_COLLECTION_KEY {
                self.store.key = key;
            }
        }
        if self.store.rest_url.trim().is_empty() {
            if let Some(url) = non_empty(&lookup, "KV_REST_API_URL") {
                self.store.rest_url = url;
            }
        }
        if self.store.rest_token.trim().is_empty() {
            if let Some(token) = non_empty(&lookup, "KV_REST_API_TOKEN") {
                self.store.rest_token = token;
            }
        }
        if self.admin.password.is_empty() {
            if let Some(pw) = lookup("ADMIN_PASSWORD") {
                self.admin.password = pw;
            }
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.normalize_and_validate()?;
        self.admin.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        if self.frontend_dir.trim().is_empty() {
            self.frontend_dir = default_frontend_dir();
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl StoreConfig {
    fn normalize_and_validate(&mut self) -> Result<()> {
        if self.key.trim().is_empty() {
            self.key = default_key();
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("store.timeout_secs must be a positive number of seconds"));
        }
        match self.backend {
            StoreBackend::Memory => {}
            StoreBackend::File => {
                if self.file_path.trim().is_empty() {
                    return Err(anyhow!("store.file_path is required for the file backend"));
                }
            }
            StoreBackend::Rest => {
                let url = self.rest_url.trim().trim_end_matches('/').to_string();
                if url.is_empty() {
                    return Err(anyhow!("store.rest_url is empty; set it in config.toml or KV_REST_API_URL"));
                }
                let lower = url.to_lowercase();
                if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                    return Err(anyhow!("store.rest_url must start with http:// or https://"));
                }
                if self.rest_token.trim().is_empty() {
                    return Err(anyhow!("store.rest_token is empty; set it in config.toml or KV_REST_API_TOKEN"));
                }
                self.rest_url = url;
            }
        }
        Ok(())
    }
}

impl AdminConfig {
    fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(anyhow!("admin password is empty; set admin.password or ADMIN_PASSWORD"));
        }
        Ok(())
    }
}
