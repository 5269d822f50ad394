use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

const STORE_DIR: &str = "xpander";
const STORE_FILE: &str = "xpander.db";

/// Найти файл словаря: явный путь или "auto" в каталоге конфигурации пользователя
/// (`$XDG_CONFIG_HOME/xpander/`, иначе `~/.config/xpander/`)
pub fn resolve_store_path(path: &str) -> Result<PathBuf> {
    resolve_in(path, dirs::config_dir())
}

fn resolve_in(path: &str, config_dir: Option<PathBuf>) -> Result<PathBuf> {
    if path != "auto" {
        return Ok(PathBuf::from(path));
    }

    let config_dir = config_dir
        .filter(|dir| !dir.as_os_str().is_empty())
        .context("Каталог конфигурации пользователя не найден, укажите store.path явно")?;

    let resolved = config_dir.join(STORE_DIR).join(STORE_FILE);
    debug!("Путь к словарю (auto): {:?}", resolved);
    Ok(resolved)
}
