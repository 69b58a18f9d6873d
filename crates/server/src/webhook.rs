//! WAHA webhook intake.
//!
//! WAHA posts every session event here; only `message` events are turned into
//! bot work. The handler always answers 200 so WAHA never retries a payload
//! we have already decided to ignore.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use whatsapp_bot::{EventKind, IncomingEvent};

use crate::server::ServerState;

#[derive(Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub payload: MessagePayload,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub has_media: bool,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub selected_button_id: Option<String>,
}

#[derive(Deserialize)]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Button replies win over media, media over plain text.
fn normalize(payload: MessagePayload) -> Option<IncomingEvent> {
    let from = payload.from?;

    if let Some(button_id) = payload.selected_button_id {
        return Some(IncomingEvent {
            from,
            kind: EventKind::Button { id: button_id },
        });
    }

    if payload.has_media {
        let (url, mime_type) = match payload.media {
            Some(media) => (
                media.url.or(payload.media_url),
                media.mimetype.unwrap_or_else(|| "image/jpeg".to_string()),
            ),
            None => (payload.media_url, "image/jpeg".to_string()),
        };
        if let Some(url) = url {
            return Some(IncomingEvent {
                from,
                kind: EventKind::Media { url, mime_type },
            });
        }
    }

    let body = payload.body?;
    if body.trim().is_empty() {
        return None;
    }

    Some(IncomingEvent {
        from,
        kind: EventKind::Text(body),
    })
}

pub async fn receive(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    if let Some(secret) = &state.webhook_secret {
        let presented = headers
            .get("x-webhook-secret")
            .and_then(|v| v.to_str().ok());
        if presented != Some(secret.as_str()) {
            return StatusCode::UNAUTHORIZED;
        }
    }

    let envelope: WebhookEnvelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!("unreadable webhook payload: {err}");
            return StatusCode::OK;
        }
    };

    if envelope.event != "message" {
        return StatusCode::OK;
    }

    let Some(event) = normalize(envelope.payload) else {
        return StatusCode::OK;
    };

    let Some(bot) = state.bot.clone() else {
        tracing::warn!("webhook received but no bot is configured");
        return StatusCode::OK;
    };

    // Answer WAHA right away; the conversation happens over its own API.
    tokio::spawn(async move {
        if let Err(err) = bot.handle_event(event).await {
            tracing::error!("failed to handle incoming message: {err}");
        }
    });

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_normalizes_to_text_event() {
        let payload: WebhookEnvelope = serde_json::from_str(
            r#"{"event":"message","payload":{"from":"628123@c.us","body":"saldo"}}"#,
        )
        .unwrap();

        let event = normalize(payload.payload).unwrap();
        assert_eq!(event.from, "628123@c.us");
        assert!(matches!(event.kind, EventKind::Text(ref t) if t == "saldo"));
    }

    #[test]
    fn button_reply_wins_over_body() {
        let payload: WebhookEnvelope = serde_json::from_str(
            r#"{"event":"message","payload":{"from":"628123@c.us","body":"✅ Ya, Benar","selectedButtonId":"confirm_transaction"}}"#,
        )
        .unwrap();

        let event = normalize(payload.payload).unwrap();
        assert!(matches!(event.kind, EventKind::Button { ref id } if id == "confirm_transaction"));
    }

    #[test]
    fn media_message_carries_url_and_mimetype() {
        let payload: WebhookEnvelope = serde_json::from_str(
            r#"{"event":"message","payload":{"from":"628123@c.us","hasMedia":true,"media":{"url":"http://waha:3000/api/files/x.jpg","mimetype":"image/png"}}}"#,
        )
        .unwrap();

        let event = normalize(payload.payload).unwrap();
        match event.kind {
            EventKind::Media { url, mime_type } => {
                assert_eq!(url, "http://waha:3000/api/files/x.jpg");
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("expected media event, got {other:?}"),
        }
    }

    #[test]
    fn media_without_mimetype_defaults_to_jpeg() {
        let payload: WebhookEnvelope = serde_json::from_str(
            r#"{"event":"message","payload":{"from":"628123@c.us","hasMedia":true,"mediaUrl":"http://waha:3000/api/files/x.jpg"}}"#,
        )
        .unwrap();

        let event = normalize(payload.payload).unwrap();
        match event.kind {
            EventKind::Media { url, mime_type } => {
                assert_eq!(url, "http://waha:3000/api/files/x.jpg");
                assert_eq!(mime_type, "image/jpeg");
            }
            other => panic!("expected media event, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_is_ignored() {
        let payload: WebhookEnvelope = serde_json::from_str(
            r#"{"event":"message","payload":{"from":"628123@c.us","body":"   "}}"#,
        )
        .unwrap();

        assert!(normalize(payload.payload).is_none());
    }

    #[test]
    fn missing_sender_is_ignored() {
        let payload: WebhookEnvelope =
            serde_json::from_str(r#"{"event":"message","payload":{"body":"saldo"}}"#).unwrap();

        assert!(normalize(payload.payload).is_none());
    }
}
