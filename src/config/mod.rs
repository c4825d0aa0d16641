//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`ERRAND_API_KEY` with `ANTHROPIC_API_KEY`
//!    fallback, `ERRAND_BACKEND_URL`, `ERRAND_MODEL`, `ERRAND_MAX_ITERATIONS`,
//!    `ERRAND_API_TIMEOUT_SECS`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./errand.toml in the current directory
//! 4. $XDG_CONFIG_HOME/errand/errand.toml (or ~/.config/errand/errand.toml)
//! 5. Built-in defaults

mod defaults;
mod env;
mod loader;
mod sources;
mod types;

pub use defaults::DEFAULT_CONFIG_TEMPLATE;
pub use loader::{load_config, load_config_with_diagnostics};
pub use sources::{config_root_dir, default_global_config_path};
pub use types::{
    AgentConfig, ApiConfig, Config, ConfigDiagnostics, LoadedConfig, PageConfig, RoutingMode,
    SettleConfig,
};
