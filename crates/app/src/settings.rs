///! Handles settings for the application. Configuration is written in
///! `settings.toml` next to the binary.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for our own crates ("info", "debug", ...).
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    pub bind: Option<String>,
    pub port: u16,
    /// Public base URL of this API, used in export download links.
    pub public_url: String,
    /// Shared secret WAHA is configured to send with every webhook.
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WhatsApp {
    /// Base URL of the WAHA gateway.
    pub url: String,
    /// WAHA session name.
    pub session: String,
    pub api_key: Option<String>,
    pub gemini_api_key: String,
    /// Base URL of the web frontend, used in onboarding replies.
    pub frontend_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub whatsapp: Option<WhatsApp>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
