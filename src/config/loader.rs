//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

use super::env::{apply_runtime_env_overrides, collect_routing_warnings, resolve_key_env};
use super::sources::{config_root_dir, read_config_text_with_sources};
use super::{Config, ConfigDiagnostics, LoadedConfig};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    Ok(load_config_with_diagnostics(path_override)?.config)
}

/// Load configuration and return diagnostics worth showing the user.
pub fn load_config_with_diagnostics(
    path_override: Option<&str>,
) -> Result<LoadedConfig, ConfigError> {
    load_config_with_diagnostics_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_with_diagnostics_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    debug!(source = ?source, "config source selected");
    let mut config: Config = toml::from_str(&config_text)?;
    resolve_key_env(&mut config, &env_lookup)?;
    apply_runtime_env_overrides(&mut config, &env_lookup)?;
    validate(&config)?;

    let mut diagnostics = ConfigDiagnostics::default();
    collect_routing_warnings(&config, &mut diagnostics);
    Ok(LoadedConfig {
        config,
        diagnostics,
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.agent.max_iterations == 0 {
        return Err(ConfigError::Invalid(
            "agent.max_iterations must be at least 1".into(),
        ));
    }
    if config.page.snapshot_attempts == 0 {
        return Err(ConfigError::Invalid(
            "page.snapshot_attempts must be at least 1".into(),
        ));
    }
    if config.api.model.trim().is_empty() {
        return Err(ConfigError::Invalid("api.model must not be empty".into()));
    }
    if let Some(home) = &config.agent.home_url {
        if reqwest::Url::parse(home).is_err() {
            return Err(ConfigError::Invalid(format!(
                "agent.home_url `{home}` is not an absolute URL"
            )));
        }
    }
    Ok(())
}
