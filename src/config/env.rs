//! Environment overrides.
//!
//! Canonical `ERRAND_*` variables take precedence. `ANTHROPIC_API_KEY` is
//! accepted as a fallback for the key only.

use crate::error::ConfigError;

use super::{Config, ConfigDiagnostics};

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(key) = api_key_override_with(env_lookup) {
        config.api.api_key = key;
    }
    if let Some(url) = non_blank(env_lookup("ERRAND_BACKEND_URL")) {
        config.api.backend_url = url;
    }
    if let Some(model) = non_blank(env_lookup("ERRAND_MODEL")) {
        config.api.model = model;
    }
    if let Some(value) = env_lookup("ERRAND_MAX_ITERATIONS") {
        let parsed = value.trim().parse::<usize>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid ERRAND_MAX_ITERATIONS value `{value}`: expected a positive integer"
            ))
        })?;
        // Zero would end every run before the first model call.
        config.agent.max_iterations = parsed.max(1);
    }
    if let Some(value) = env_lookup("ERRAND_API_TIMEOUT_SECS") {
        let parsed = value.trim().parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid ERRAND_API_TIMEOUT_SECS value `{value}`: expected positive integer seconds"
            ))
        })?;
        config.api.timeout_secs = parsed.max(1);
    }
    Ok(())
}

/// Resolve a value from the canonical env var or, if absent, its fallback.
pub(super) fn env_with_fallback<FEnv>(
    env_lookup: &FEnv,
    canonical: &str,
    fallback: &str,
) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    non_blank(env_lookup(canonical)).or_else(|| non_blank(env_lookup(fallback)))
}

/// Runtime API key override from env vars.
pub(super) fn api_key_override_with<FEnv>(env_lookup: &FEnv) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_with_fallback(env_lookup, "ERRAND_API_KEY", "ANTHROPIC_API_KEY")
}

/// Resolve `api.api_key_env` into `api.api_key`.
pub(super) fn resolve_key_env<FEnv>(config: &mut Config, env_lookup: &FEnv) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    let Some(name) = config.api.api_key_env.as_deref().map(str::trim) else {
        return Ok(());
    };
    if name.is_empty() {
        return Ok(());
    }
    if !config.api.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "set only one of api.api_key or api.api_key_env".into(),
        ));
    }
    config.api.api_key = non_blank(env_lookup(name)).unwrap_or_default();
    Ok(())
}

/// Record setups that load fine but probably do not do what was meant.
pub(super) fn collect_routing_warnings(config: &Config, diagnostics: &mut ConfigDiagnostics) {
    let api = &config.api;
    if !api.backend_url.trim().is_empty() && !api.api_key.trim().is_empty() {
        diagnostics.warnings.push(
            "Both an API key and a backend URL are set; requests go through the backend and the key is not sent."
                .to_string(),
        );
    }
    if !api.is_usable() {
        diagnostics.warnings.push(
            "No API key or backend URL configured; set ERRAND_API_KEY or api.backend_url.".to_string(),
        );
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
