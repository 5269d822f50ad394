use crate::services::key_capture::SEND_KEYS;
use crate::utils::paths;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub store: StoreConfig,
    pub capture: CaptureConfig,
    // Индекс дополнительных стоп-клавиш, строится после загрузки
    #[serde(skip)]
    stop_key_set: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Имя X-дисплея; `None` означает `$DISPLAY`
    pub display: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Путь к файлу словаря или "auto"
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Логировать каждую клавишу и каждую фразу (небезопасно)
    pub log_keys: bool,
    /// Пропускать нажатия с Control/Alt/Super
    pub ignore_chords: bool,
    pub extra_stop_keys: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            filter: "xpander=info".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "auto".to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            log_keys: false,
            ignore_chords: true,
            extra_stop_keys: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig::default(),
            session: SessionConfig::default(),
            store: StoreConfig::default(),
            capture: CaptureConfig::default(),
            stop_key_set: HashSet::new(),
        };
        config.build_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("XPANDER_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_indexes();

        Ok(config)
    }

    pub fn build_indexes(&mut self) {
        self.stop_key_set = self
            .capture
            .extra_stop_keys
            .iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.store.path.trim().is_empty() {
            anyhow::bail!("store.path не может быть пустым");
        }

        for (i, key) in self.capture.extra_stop_keys.iter().enumerate() {
            // Пробел проверяется до trim
            if SEND_KEYS.contains(&key.as_str()) || SEND_KEYS.contains(&key.trim()) {
                anyhow::bail!("Клавиша '{}' завершает слово и не может быть стоп-клавишей", key);
            }
            if key.trim().is_empty() {
                anyhow::bail!("Пустая стоп-клавиша #{}", i + 1);
            }
        }

        Ok(())
    }

    /// Дополнительные стоп-клавиши из `[capture]`
    pub fn extra_stop_keys(&self) -> &HashSet<String> {
        &self.stop_key_set
    }

    /// Путь к файлу словаря с учётом "auto"
    pub fn store_path(&self) -> Result<PathBuf> {
        paths::resolve_store_path(&self.store.path)
    }
}
