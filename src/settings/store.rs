//! Settings Store
//!
//! Loads the settings record at startup, serves getters and persists every
//! accepted setter.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{GatewayError, Result};

use super::record::{decode_record, encode_record};
use super::{ConnectionSettings, SettingKey};

/// Owner of the live [`ConnectionSettings`]
#[derive(Debug)]
pub struct SettingsStore {
    /// Backing file; `None` keeps settings in memory only
    path: Option<PathBuf>,
    settings: ConnectionSettings,
    first_run: bool,
}

impl SettingsStore {
    /// Open the record at `path`
    ///
    /// A missing or unusable record means first run: the built-in defaults
    /// are loaded and written back so the next start finds a valid magic.
    pub fn open(path: &Path) -> Result<Self> {
        let loaded = match fs::read(path) {
            Ok(bytes) => match decode_record(&bytes) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    tracing::warn!("Settings record {} unusable ({}), loading defaults", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No settings record at {}, loading defaults", path.display());
                None
            }
            Err(e) => return Err(e.into()),
        };

        let first_run = loaded.is_none();
        let store = Self {
            path: Some(path.to_path_buf()),
            settings: loaded.unwrap_or_default(),
            first_run,
        };

        if first_run {
            store.save()?;
        }
        Ok(store)
    }

    /// Settings that are never written to disk
    pub fn in_memory(settings: ConnectionSettings) -> Self {
        Self {
            path: None,
            settings,
            first_run: false,
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Getter by key name
    pub fn get(&self, key: &str) -> Result<String> {
        let key: SettingKey = key.parse()?;
        Ok(self.settings.get(key))
    }

    /// Every key with its current value
    pub fn list(&self) -> Vec<(SettingKey, String)> {
        SettingKey::ALL
            .iter()
            .map(|key| (*key, self.settings.get(*key)))
            .collect()
    }

    /// Validate, persist, then commit
    ///
    /// Rejected values and failed writes leave the live settings untouched.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key: SettingKey = key.parse()?;
        let mut updated = self.settings.clone();
        updated.set(key, value)?;

        self.persist(&updated)?;
        self.settings = updated;
        tracing::info!("{} = {}", key, self.settings.get(key));
        Ok(())
    }

    /// Write the current settings to the backing file
    pub fn save(&self) -> Result<()> {
        self.persist(&self.settings)
    }

    fn persist(&self, settings: &ConnectionSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let record = encode_record(settings)?;
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&record)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path).map_err(|e| {
            GatewayError::Settings(format!("failed to replace {}: {}", path.display(), e))
        })?;

        tracing::debug!("Saved {} byte settings record to {}", record.len(), path.display());
        Ok(())
    }

    /// True when defaults were applied because no valid record existed
    pub fn was_first_run(&self) -> bool {
        self.first_run
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
