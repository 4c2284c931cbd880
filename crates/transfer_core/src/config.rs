use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "transfer.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub preparation_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub progress_step: u8,
    pub success_probability: f64,
    pub seed: Option<u64>,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preparation_delay_ms: 1000,
            tick_interval_ms: 300,
            progress_step: 10,
            success_probability: 0.7,
            seed: None,
            event_capacity: 256,
        }
    }
}

impl Settings {
    pub fn preparation_delay(&self) -> Duration {
        Duration::from_millis(self.preparation_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::Invalid {
                key: "tick_interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.progress_step == 0 || self.progress_step > 100 {
            return Err(SettingsError::Invalid {
                key: "progress_step",
                reason: format!("must be within 1..=100, got {}", self.progress_step),
            });
        }
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(SettingsError::Invalid {
                key: "success_probability",
                reason: format!("must be within 0.0..=1.0, got {}", self.success_probability),
            });
        }
        if self.event_capacity == 0 {
            return Err(SettingsError::Invalid {
                key: "event_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    preparation_delay_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
    progress_step: Option<u8>,
    success_probability: Option<f64>,
    seed: Option<u64>,
    event_capacity: Option<usize>,
}

/// Defaults, then the settings file, then `APP__*` environment overrides.
///
/// An explicit `path` must exist; without one, `transfer.toml` in the working
/// directory is read when present.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    if required || path.exists() {
        let raw = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        apply_file_overrides(&mut settings, &raw).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> Result<(), toml::de::Error> {
    let file_cfg = toml::from_str::<SettingsFile>(raw)?;
    if let Some(v) = file_cfg.preparation_delay_ms {
        settings.preparation_delay_ms = v;
    }
    if let Some(v) = file_cfg.tick_interval_ms {
        settings.tick_interval_ms = v;
    }
    if let Some(v) = file_cfg.progress_step {
        settings.progress_step = v;
    }
    if let Some(v) = file_cfg.success_probability {
        settings.success_probability = v;
    }
    if let Some(v) = file_cfg.seed {
        settings.seed = Some(v);
    }
    if let Some(v) = file_cfg.event_capacity {
        settings.event_capacity = v;
    }
    Ok(())
}

fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    if let Some(v) = lookup("APP__PREPARATION_DELAY_MS") {
        settings.preparation_delay_ms = parse_env("preparation_delay_ms", &v)?;
    }
    if let Some(v) = lookup("APP__TICK_INTERVAL_MS") {
        settings.tick_interval_ms = parse_env("tick_interval_ms", &v)?;
    }
    if let Some(v) = lookup("APP__PROGRESS_STEP") {
        settings.progress_step = parse_env("progress_step", &v)?;
    }
    if let Some(v) = lookup("APP__SUCCESS_PROBABILITY") {
        settings.success_probability = parse_env("success_probability", &v)?;
    }
    if let Some(v) = lookup("APP__SEED") {
        settings.seed = Some(parse_env("seed", &v)?);
    }
    if let Some(v) = lookup("APP__EVENT_CAPACITY") {
        settings.event_capacity = parse_env("event_capacity", &v)?;
    }
    Ok(())
}

fn parse_env<T>(key: &'static str, raw: &str) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| SettingsError::Invalid {
        key,
        reason: format!("'{raw}': {err}"),
    })
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
