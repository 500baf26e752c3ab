// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{BridgeConfig, FeedConfig, FreshnessConfig, Settings, UiConfig};

/// Loads the panel settings from a TOML file.
///
/// The file is optional: a missing file (the common case for a fresh
/// install) yields the built-in defaults, and `GLASS`-prefixed environment
/// variables override either source.
pub fn load_settings(path: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("GLASS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    tracing::debug!(source = path, "Loaded panel settings.");
    Ok(settings)
}
