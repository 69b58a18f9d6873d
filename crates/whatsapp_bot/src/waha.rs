//! WAHA (WhatsApp HTTP API) client.

use serde::Deserialize;
use serde_json::json;

use crate::BotError;

/// A quick-reply button: stable id plus the label shown to the human.
pub(crate) struct Button {
    pub id: &'static str,
    pub title: &'static str,
}

#[derive(Clone)]
pub(crate) struct WahaClient {
    http: reqwest::Client,
    base_url: String,
    session: String,
    api_key: Option<String>,
}

impl WahaClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: String,
        session: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            session,
            api_key,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("X-Api-Key", key),
            None => builder,
        }
    }

    pub(crate) async fn send_message(&self, to: &str, text: &str) -> Result<(), BotError> {
        let response = self
            .request(self.http.post(format!("{}/api/sendText", self.base_url)))
            .json(&json!({
                "chatId": format_chat_id(to),
                "text": text,
                "session": self.session,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::error!(to, status = %response.status(), "waha refused sendText");
        }
        Ok(())
    }

    /// Send interactive buttons.
    ///
    /// Engines without button support (WEBJS) answer 501; those get the same
    /// text as a numbered menu instead, which the handlers accept as replies.
    pub(crate) async fn send_buttons(
        &self,
        to: &str,
        text: &str,
        buttons: &[Button],
    ) -> Result<(), BotError> {
        let waha_buttons: Vec<_> = buttons
            .iter()
            .map(|b| json!({ "id": b.id, "text": b.title }))
            .collect();
        let response = self
            .request(self.http.post(format!("{}/api/sendButtons", self.base_url)))
            .json(&json!({
                "chatId": format_chat_id(to),
                "text": text,
                "buttons": waha_buttons,
                "session": self.session,
            }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_IMPLEMENTED {
            let menu = numbered_menu(text, buttons);
            return self.send_message(to, &menu).await;
        }
        if !response.status().is_success() {
            tracing::error!(to, status = %response.status(), "waha refused sendButtons");
        }
        Ok(())
    }

    /// Resolve a privacy LID to the real phone number, if WAHA knows it.
    pub(crate) async fn lid_to_phone(&self, lid: &str) -> Option<String> {
        let url = format!("{}/api/{}/lids/{lid}", self.base_url, self.session);
        let response = match self.request(self.http.get(&url)).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(lid, status = %r.status(), "lid lookup refused");
                return None;
            }
            Err(err) => {
                tracing::warn!(lid, "lid lookup failed: {err}");
                return None;
            }
        };

        #[derive(Deserialize)]
        struct LidResponse {
            pn: Option<String>,
        }
        let parsed: LidResponse = response.json().await.ok()?;
        parsed.pn.map(|pn| pn.replace("@c.us", ""))
    }

    /// Download webhook media. WAHA hands out its internal container URL, so
    /// only the path and query are kept and re-rooted on our base URL.
    pub(crate) async fn download_media(&self, media_url: &str) -> Result<Vec<u8>, BotError> {
        let url = rebase_url(media_url, &self.base_url);
        let response = self.request(self.http.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(BotError::MediaDownload(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// `+6281234567890` becomes `6281234567890@c.us`; existing chat ids pass
/// through untouched.
pub(crate) fn format_chat_id(phone: &str) -> String {
    if phone.contains("@c.us") || phone.contains("@lid") {
        return phone.to_string();
    }
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("{digits}@c.us")
}

fn numbered_menu(text: &str, buttons: &[Button]) -> String {
    let mut menu = format!("{text}\n\n");
    for (index, button) in buttons.iter().enumerate() {
        menu.push_str(&format!("{}. {}\n", index + 1, button.title));
    }
    menu.push_str("\nKetik angka pilihan (contoh: 1)");
    menu
}

fn rebase_url(media_url: &str, base_url: &str) -> String {
    let stripped = media_url
        .strip_prefix("http://")
        .or_else(|| media_url.strip_prefix("https://"))
        .unwrap_or(media_url);
    match stripped.find('/') {
        Some(pos) => format!("{base_url}{}", &stripped[pos..]),
        None => base_url.to_string(),
    }
}
