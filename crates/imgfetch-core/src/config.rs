use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Limits the embedding caller imposes on the underlying transport.
/// The fetcher itself has no timeout policy; with no deadlines set a request
/// may block for as long as the upstream keeps the connection open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connect deadline in seconds for each outbound request.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request deadline in seconds for each outbound request.
    pub timeout_secs: Option<u64>,
    /// Follow 3xx responses to their final target.
    pub follow_redirects: bool,
    /// Maximum number of redirects followed per request.
    pub max_redirections: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: None,
            timeout_secs: None,
            follow_redirects: true,
            max_redirections: 10,
        }
    }
}

/// Image source configuration loaded from `~/.config/imgfetch/config.toml`.
///
/// Read-only once a source has been built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Origins (`scheme://host[:port]`) remote images may be fetched from.
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
    /// Maximum image size in bytes, checked with a HEAD probe. `<= 0` disables the probe.
    pub max_allowed_size: i64,
    /// Static credential sent upstream as `Authorization`. Empty means none.
    pub authorization: String,
    /// Forward the inbound request's credential when no static one is set.
    pub auth_forwarding: bool,
    pub transport: TransportConfig,
}

impl SourceConfig {
    pub fn has_size_limit(&self) -> bool {
        self.max_allowed_size > 0
    }

    /// True when outbound requests may carry an `Authorization` header at all.
    pub fn forwards_authorization(&self) -> bool {
        self.auth_forwarding || !self.authorization.is_empty()
    }
}

/// Split a comma-separated origin list (`--allowed-origins a,b`).
pub fn parse_origins(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("imgfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SourceConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SourceConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from a specific file.
pub fn load_from(path: &Path) -> Result<SourceConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SourceConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
