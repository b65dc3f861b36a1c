mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, ClientSettings, ServerSettings, Settings};

/// Prefix for environment overrides, e.g. `RELAYBUS_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "RELAYBUS";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server, broker and client configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        broker: BrokerSettings {
            max_frame_bytes: partial
                .broker
                .as_ref()
                .and_then(|b| b.max_frame_bytes)
                .unwrap_or(default.broker.max_frame_bytes),
        },
        client: ClientSettings {
            name: partial
                .client
                .as_ref()
                .and_then(|c| c.name.clone())
                .unwrap_or(default.client.name),
        },
    })
}

#[cfg(test)]
mod tests;
