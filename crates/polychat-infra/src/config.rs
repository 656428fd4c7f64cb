//! Configuration loader for polychat.
//!
//! Reads an optional `polychat.toml` into [`ProxyConfig`], then layers
//! environment variables on top. Falls back to defaults when the file is
//! missing or malformed.

use std::path::Path;

use polychat_types::config::ProxyConfig;
use polychat_types::provider::ProviderId;

pub const CONFIG_FILE_NAME: &str = "polychat.toml";

pub const FREE_LIMIT_ENV: &str = "POLYCHAT_FREE_LIMIT";
pub const PORT_ENV: &str = "PORT";

/// Load `path` if it exists, then apply environment overrides.
pub async fn load_config(path: &Path) -> ProxyConfig {
    let file = load_config_file(path).await;
    apply_env_overrides(file, |name| std::env::var(name).ok())
}

/// Read and parse the toml file alone.
///
/// - Missing file: defaults, logged at debug.
/// - Unreadable or unparseable file: defaults, logged as a warning.
pub async fn load_config_file(path: &Path) -> ProxyConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return ProxyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ProxyConfig::default();
        }
    };

    match toml::from_str::<ProxyConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            ProxyConfig::default()
        }
    }
}

/// Overlay environment variables onto `config`.
///
/// Recognized: `PORT`, `POLYCHAT_FREE_LIMIT`, and per provider
/// `{P}_MODEL`, `{P}_TIMEOUT_SECS`, `{P}_BASE_URL`. Values that fail to
/// parse are logged and ignored.
pub fn apply_env_overrides(
    mut config: ProxyConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ProxyConfig {
    let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(port) = parse_var(PORT_ENV, read(PORT_ENV)) {
        config.server.port = port;
    }
    if let Some(limit) = parse_var(FREE_LIMIT_ENV, read(FREE_LIMIT_ENV)) {
        config.usage.free_limit = limit;
    }

    for id in ProviderId::ALL {
        let mut settings = config.provider(id);
        let prefix = id.env_prefix();

        if let Some(model) = read(&format!("{prefix}_MODEL")) {
            settings.model = model;
        }
        let timeout_var = format!("{prefix}_TIMEOUT_SECS");
        if let Some(secs) = parse_var::<u64>(&timeout_var, read(&timeout_var)).filter(|s| *s > 0) {
            settings.timeout_secs = secs;
        }
        if let Some(base_url) = read(&format!("{prefix}_BASE_URL")) {
            settings.base_url = Some(base_url);
        }

        config.providers.insert(id, settings);
    }

    config
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring {name}={value}: not a valid number");
            None
        }
    }
}
