pub mod profiles;
pub mod runtime;

pub use profiles::*;
pub use runtime::*;

use anyhow::{anyhow, Result};
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::{debug, info};

pub const ENV_PREFIX: &str = "TRADESIM";

/// Layers built-in defaults, the optional TOML file and `TRADESIM__*`
/// environment variables, in that order.
pub fn load(path: &Path) -> Result<RuntimeConfig> {
    let mut builder = with_defaults()?;

    if path.exists() {
        info!("Loading configuration from {}", path.display());
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    } else {
        debug!("No config file at {}, using defaults", path.display());
    }

    finish(
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        ),
    )
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder().add_source(Config::try_from(&RuntimeConfig::default())?))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<RuntimeConfig> {
    let config: RuntimeConfig = builder.build()?.try_deserialize()?;

    config
        .validate()
        .map_err(|errors| anyhow!("invalid configuration: {}", errors.join(", ")))?;

    Ok(config)
}

/// Effective configuration rendered back as TOML.
pub fn to_toml(config: &RuntimeConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
