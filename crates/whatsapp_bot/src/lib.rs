//! WhatsApp bot.
//!
//! Events arrive as webhook pushes from WAHA (the WhatsApp HTTP API
//! gateway); the web tier normalizes them into [`IncomingEvent`] and hands
//! them to [`Bot::handle_event`]. The bot talks to the ledger engine
//! directly and answers over the WAHA send endpoints.

use std::sync::Arc;
use std::time::Duration;

use engine::Engine;

mod flow;
mod gemini;
mod handlers;
mod parsing;
mod report;
mod state;
mod ui;
mod waha;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A normalized webhook event.
#[derive(Clone, Debug)]
pub struct IncomingEvent {
    /// WAHA chat id of the sender (`6281…@c.us` or `…@lid`).
    pub from: String,
    pub kind: EventKind,
}

#[derive(Clone, Debug)]
pub enum EventKind {
    Text(String),
    Media { url: String, mime_type: String },
    Button { id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("ledger error: {0}")]
    Engine(#[from] engine::EngineError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unusable ai response: {0}")]
    BadAiResponse(String),
    #[error("media download failed: {0}")]
    MediaDownload(String),
    #[error("report rendering failed: {0}")]
    Report(String),
}

pub struct Bot {
    engine: Arc<Engine>,
    waha: waha::WahaClient,
    gemini: gemini::GeminiClient,
    store: state::ConversationStore,
    /// Public base URL of our API, used for export download links.
    public_url: String,
    /// Base URL of the web frontend, used for onboarding links.
    frontend_url: String,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }
}

#[derive(Default)]
pub struct BotBuilder {
    engine: Option<Arc<Engine>>,
    waha_url: String,
    waha_session: String,
    waha_api_key: Option<String>,
    gemini_api_key: String,
    gemini_url: Option<String>,
    public_url: String,
    frontend_url: String,
}

impl BotBuilder {
    pub fn engine(mut self, engine: Arc<Engine>) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn waha(mut self, url: &str, session: &str, api_key: Option<&str>) -> BotBuilder {
        self.waha_url = url.trim_end_matches('/').to_string();
        self.waha_session = session.to_string();
        self.waha_api_key = api_key.map(ToString::to_string);
        self
    }

    pub fn gemini(mut self, api_key: &str, url: Option<&str>) -> BotBuilder {
        self.gemini_api_key = api_key.to_string();
        self.gemini_url = url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    pub fn public_url(mut self, url: &str) -> BotBuilder {
        self.public_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn frontend_url(mut self, url: &str) -> BotBuilder {
        self.frontend_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        let engine = self.engine.ok_or("bot needs an engine")?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        Ok(Bot {
            engine,
            waha: waha::WahaClient::new(
                http.clone(),
                self.waha_url,
                self.waha_session,
                self.waha_api_key,
            ),
            gemini: gemini::GeminiClient::new(http, self.gemini_api_key, self.gemini_url),
            store: state::ConversationStore::default(),
            public_url: self.public_url,
            frontend_url: self.frontend_url,
        })
    }
}
