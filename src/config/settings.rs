use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the server, the message broker and CLI clients.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub client: ClientSettings,
}

/// Configuration settings for the server.
///
/// The broker binds here; clients connect here.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the broker.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    /// Largest frame payload accepted before the connection is dropped.
    pub max_frame_bytes: usize,
}

/// Configuration settings for publisher and subscriber clients.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientSettings {
    /// Name sent as part of the client's identity.
    pub name: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub client: Option<PartialClientSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_frame_bytes: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialClientSettings {
    pub name: Option<String>,
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8008,
            },
            broker: BrokerSettings {
                max_frame_bytes: 1024 * 1024,
            },
            client: ClientSettings {
                name: "anonymous".to_string(),
            },
        }
    }
}
