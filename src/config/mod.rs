use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::notes::format::TimestampFormatter;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "NoteTake";
const APP_NAME: &str = "notetake";

pub const CONFIG_ENV: &str = "NOTETAKE_CONFIG";
pub const DATA_ENV: &str = "NOTETAKE_DATA";

pub const DEFAULT_JOKE_URL: &str = "https://icanhazdadjoke.com/";
pub const DEFAULT_QUOTE_URL: &str = "https://favqs.com/api/qotd";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths);
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("state"));

        Ok(Self::from_roots(config_dir, config_file, data_root, state_dir))
    }

    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let config_file = config_dir.join("config.toml");
        Self::from_roots(config_dir, config_file, root.join("data"), root.join("state"))
    }

    fn from_roots(
        config_dir: PathBuf,
        config_file: PathBuf,
        data_dir: PathBuf,
        state_dir: PathBuf,
    ) -> Self {
        Self {
            database_path: data_dir.join("notes.db"),
            log_dir: state_dir.join("logs"),
            config_dir,
            config_file,
            data_dir,
            state_dir,
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("notetake.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir, &self.state_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub sources: SourcesConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    pub(crate) fn post_load(&mut self, paths: &ConfigPaths) {
        self.backend.resolve(paths);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Embedded,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub persist_edits: bool,
    pub wal_autocheckpoint: u32,
    #[serde(skip)]
    pub database_path: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Embedded,
            base_url: None,
            request_timeout_secs: 10,
            persist_edits: true,
            wal_autocheckpoint: 1000,
            database_path: PathBuf::new(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn use_remote(&mut self, base_url: impl Into<String>) {
        self.kind = BackendKind::Http;
        self.base_url = Some(base_url.into());
    }

    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
        self.validate();
    }

    pub(crate) fn validate(&mut self) {
        if self.kind != BackendKind::Http {
            return;
        }
        let usable = self
            .base_url
            .as_deref()
            .map(str::trim)
            .is_some_and(|url| !url.is_empty());
        if !usable {
            tracing::warn!("http backend configured without base_url, falling back to embedded");
            self.kind = BackendKind::Embedded;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub joke_url: String,
    pub quote_url: String,
    pub quote_enabled: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            joke_url: DEFAULT_JOKE_URL.to_string(),
            quote_url: DEFAULT_QUOTE_URL.to_string(),
            quote_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimezoneSetting {
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub timezone: TimezoneSetting,
}

impl DisplayConfig {
    /// Must be called before any thread is spawned when the zone is local.
    pub fn formatter(&self) -> TimestampFormatter {
        match self.timezone {
            TimezoneSetting::Local => TimestampFormatter::local(),
            TimezoneSetting::Utc => TimestampFormatter::utc(),
        }
    }
}
