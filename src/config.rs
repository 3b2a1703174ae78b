use crate::datatype::default_registry;
use crate::locale::{Locale, LocaleResolver};
use crate::storage::{MultiValueEncoding, StoreOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EavConfig {
    pub database: Option<String>,
    /// Platform default locale; detected from the environment when unset
    pub default_locale: Option<String>,
    #[serde(default)]
    pub multi_value_encoding: MultiValueEncoding,
    /// Extra data type identifiers, e.g. `money = "decimal"`
    #[serde(default)]
    pub data_type_aliases: BTreeMap<String, String>,
}

impl EavConfig {
    /// Build the options a store is opened with
    pub fn store_options(&self) -> crate::Result<StoreOptions> {
        let default_locale = match &self.default_locale {
            Some(locale) => Locale::parse(locale).map_err(|_| {
                crate::Error::Configuration(format!("invalid default_locale: {}", locale))
            })?,
            None => Locale::system_default(),
        };

        let mut registry = default_registry();
        for (alias, target) in &self.data_type_aliases {
            registry.register_alias(alias, target)?;
        }

        Ok(StoreOptions {
            registry,
            resolver: LocaleResolver::new(default_locale),
            encoding: self.multi_value_encoding,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("eavstore.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("eavstore.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<EavConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: EavConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &EavConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
