use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV: &str = "YATUBE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: String,
    pub database_path: String,
    pub media_dir: String,
    pub jwt_secret: Option<String>,
    pub session_ttl_hours: i64,
    pub max_upload_size: usize,
    pub feed_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_string(),
            database_path: "./yatube.sqlite3".to_string(),
            media_dir: "./media".to_string(),
            jwt_secret: None,
            session_ttl_hours: 24 * 14,
            max_upload_size: 10 * 1024 * 1024,
            feed_cache_ttl_secs: 20,
        }
    }
}

impl Config {
    fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Reads the config file, writing out the defaults first if it does not exist.
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", config_path.display()))
        } else {
            let default_config = Config::default();
            let toml_string = toml::to_string_pretty(&default_config)
                .context("failed to serialize default config")?;
            std::fs::write(config_path, toml_string)
                .with_context(|| format!("failed to write {}", config_path.display()))?;
            Ok(default_config)
        }
    }

    pub fn from_env_config() -> anyhow::Result<Self> {
        let mut final_cfg = Self::load(&Self::path())?;

        if final_cfg.jwt_secret.is_none() {
            log::warn!("jwt_secret not configured, sessions will not survive a restart");
            final_cfg.jwt_secret = Some(uuid::Uuid::new_v4().to_string());
        }
        final_cfg.ensure_media_dirs()?;
        Ok(final_cfg)
    }

    pub fn ensure_media_dirs(&self) -> anyhow::Result<()> {
        for sub in ["posts", "avatars"] {
            let dir = Path::new(&self.media_dir).join(sub);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create media dir {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_deref().unwrap_or_default().as_bytes()
    }

    pub fn feed_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_cache_ttl_secs)
    }
}
