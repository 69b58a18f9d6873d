//! Gemini client: natural-language transaction parsing and receipt OCR.

use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use engine::{Currency, TransactionKind};
use serde::Deserialize;
use serde_json::json;

use crate::BotError;
use crate::parsing::{self, ParsedTransaction};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-2.5-flash";

/// Outcome of a receipt scan, before confirmation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ReceiptScan {
    pub amount_minor: i64,
    /// `YYYY-MM-DD`, today when the receipt shows no date.
    pub date: String,
    pub merchant: String,
    pub category: String,
    pub currency: Currency,
}

#[derive(Clone)]
pub(crate) struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub(crate) fn new(http: reqwest::Client, api_key: String, base_url: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        }
    }

    /// Parse free text into a transaction draft.
    ///
    /// Never fails: any upstream or format problem drops to the keyword
    /// parser in [`crate::parsing`].
    pub(crate) async fn parse_transaction(
        &self,
        text: &str,
        asset_names: &[String],
    ) -> ParsedTransaction {
        match self.parse_with_ai(text, asset_names).await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("gemini parse failed, using fallback: {err}");
                parsing::fallback_parse(text)
            }
        }
    }

    async fn parse_with_ai(
        &self,
        text: &str,
        asset_names: &[String],
    ) -> Result<ParsedTransaction, BotError> {
        let assets_str = if asset_names.is_empty() {
            "None".to_string()
        } else {
            asset_names.join(", ")
        };
        let prompt = format!(
            "Parse this transaction text into JSON format. Identify:\n\
             1. Transaction type: 'income' or 'expense'\n\
             2. Category (must be one of: 食費, 交通費, 家賃, 光熱費, その他)\n\
             3. Amount (number only)\n\
             4. Currency: 'JPY' or 'IDR' (yen/円/jpy = JPY, rupiah/rp/idr = IDR)\n\
             5. Asset name (if mentioned, must match one of: {assets_str})\n\
             6. Description\n\n\
             Income keywords: gaji, gajian, salary, beasiswa, bonus, dapat, terima, masuk.\n\
             Default to 'expense' and 'JPY' if unclear.\n\n\
             Input text: \"{text}\"\n\n\
             Return ONLY valid JSON in this exact format:\n\
             {{\"type\": \"expense\", \"category\": \"食費\", \"amount\": 500, \
             \"currency\": \"JPY\", \"asset_name\": \"PayPay\", \"description\": \"jajan crepes\"}}"
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let generated = self.generate(&body).await?;

        #[derive(Deserialize)]
        struct AiTransaction {
            #[serde(rename = "type")]
            kind: String,
            category: String,
            amount: f64,
            currency: Option<String>,
            asset_name: Option<String>,
            description: Option<String>,
        }

        let ai: AiTransaction = serde_json::from_str(strip_fences(&generated))?;
        let kind = match ai.kind.as_str() {
            "income" => TransactionKind::Income,
            "expense" => TransactionKind::Expense,
            other => return Err(BotError::BadAiResponse(format!("unknown type: {other}"))),
        };
        let currency = ai
            .currency
            .as_deref()
            .and_then(|c| Currency::try_from(c).ok())
            .unwrap_or(Currency::Jpy);

        Ok(ParsedTransaction {
            kind,
            category: ai.category,
            amount_minor: to_minor(ai.amount, currency),
            currency,
            asset_name: ai.asset_name.filter(|s| !s.is_empty()),
            description: ai.description.unwrap_or_default(),
        })
    }

    /// OCR a receipt image. No fallback here: the caller asks the human to
    /// retry on failure.
    pub(crate) async fn scan_receipt(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<ReceiptScan, BotError> {
        let prompt = "Analyze this receipt image and extract information in JSON format.\n\n\
             Extract:\n\
             - total_amount: Total purchase amount (number only)\n\
             - date: Transaction date (YYYY-MM-DD, use today if not visible)\n\
             - merchant: Store/merchant name\n\
             - currency: 'JPY' or 'IDR'\n\
             - category: Best matching category (食費, 交通費, 家賃, 光熱費, その他)\n\n\
             Return ONLY valid JSON in this exact format:\n\
             {\"total_amount\": 1250, \"date\": \"2026-01-11\", \"merchant\": \"Lawson\", \
             \"currency\": \"JPY\", \"category\": \"食費\"}";

        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": {
                        "mime_type": mime_type,
                        "data": BASE64_STANDARD.encode(image),
                    }},
                ]
            }]
        });
        let generated = self.generate(&body).await?;

        #[derive(Deserialize)]
        struct AiReceipt {
            total_amount: f64,
            date: Option<String>,
            merchant: Option<String>,
            currency: Option<String>,
            category: Option<String>,
        }

        let ai: AiReceipt = serde_json::from_str(strip_fences(&generated))?;
        let currency = ai
            .currency
            .as_deref()
            .and_then(|c| Currency::try_from(c).ok())
            .unwrap_or(Currency::Jpy);

        Ok(ReceiptScan {
            amount_minor: to_minor(ai.total_amount, currency),
            date: ai
                .date
                .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string()),
            merchant: ai.merchant.unwrap_or_else(|| "Unknown".to_string()),
            category: ai.category.unwrap_or_else(|| "その他".to_string()),
            currency,
        })
    }

    async fn generate(&self, body: &serde_json::Value) -> Result<String, BotError> {
        let url = format!(
            "{}/models/{MODEL}:generateContent?key={}",
            self.base_url, self.api_key
        );
        let response = self.http.post(&url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(BotError::BadAiResponse(format!(
                "gemini answered {}",
                response.status()
            )));
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Content,
        }
        #[derive(Deserialize)]
        struct Content {
            parts: Vec<Part>,
        }
        #[derive(Deserialize)]
        struct Part {
            text: String,
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| BotError::BadAiResponse("empty candidates".to_string()))
    }
}

/// The model tends to wrap JSON in markdown fences.
fn strip_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn to_minor(amount_major: f64, currency: Currency) -> i64 {
    let scale = 10f64.powi(i32::from(currency.minor_units()));
    (amount_major * scale).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn amounts_scale_per_currency() {
        assert_eq!(to_minor(500.0, Currency::Jpy), 500);
        assert_eq!(to_minor(10.5, Currency::Idr), 1050);
    }
}
