use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub soundcloud: SoundcloudConfig,
    pub lyrics: LyricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundcloudConfig {
    /// Public api-v2 client id. Overridden by `SOUNDCLOUD_CLIENT_ID`.
    pub client_id: Option<String>,
    pub base_url: String,
    /// Web app scanned for a client id when none is configured.
    pub web_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// Per-provider request timeout.
    pub timeout_secs: u64,
    pub lrclib_base_url: String,
    pub netease_base_url: String,
    pub qq_base_url: String,
    pub musixmatch: MusixmatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusixmatchConfig {
    /// Official API key. Overridden by `MUSIXMATCH_API_KEY`.
    pub api_key: Option<String>,
    pub official_base_url: String,
    pub desktop_base_url: String,
    pub web_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::BIND_ADDR.to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "scproxy", "scproxy");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("scproxy"));
        Self { data_dir }
    }
}

impl Default for SoundcloudConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            base_url: defaults::SOUNDCLOUD_API.to_string(),
            web_url: defaults::SOUNDCLOUD_WEB.to_string(),
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::TIMEOUT_SECS,
            lrclib_base_url: defaults::LRCLIB_API.to_string(),
            netease_base_url: defaults::NETEASE_API.to_string(),
            qq_base_url: defaults::QQ_SEARCH_API.to_string(),
            musixmatch: MusixmatchConfig::default(),
        }
    }
}

impl Default for MusixmatchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            official_base_url: defaults::MUSIXMATCH_API.to_string(),
            desktop_base_url: defaults::MUSIXMATCH_DESKTOP_API.to_string(),
            web_base_url: defaults::MUSIXMATCH_WEB.to_string(),
        }
    }
}

impl Config {
    /// Path of the SQLite database holding per-user data.
    pub fn database_path(&self) -> PathBuf {
        self.paths.data_dir.join("scproxy.sqlite3")
    }

    /// Secrets may come from the environment instead of the config file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("SOUNDCLOUD_CLIENT_ID").filter(|v| !v.trim().is_empty()) {
            self.soundcloud.client_id = Some(id.trim().to_string());
        }
        if let Some(key) = lookup("MUSIXMATCH_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.lyrics.musixmatch.api_key = Some(key.trim().to_string());
        }
    }
}

#[cfg(test)]
pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_config(cfg, &path)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "scproxy", "scproxy").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Load the config file, writing defaults first if it does not exist yet.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    let mut cfg = if path.exists() {
        let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?
    } else {
        let cfg = defaults::defaults();
        write_config(&cfg, &path)?;
        cfg
    };

    cfg.apply_env();
    Ok(cfg)
}
