//! LINE channel: webhook payload parsing, signature verification, and the reply API.

use crate::channels::inbound::InboundMessage;
use crate::channels::ChannelHandle;
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::borrow::Cow;
use std::time::Duration;

const LINE_API_BASE: &str = "https://api.line.me";
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// LINE rejects text messages longer than this many characters.
pub const MAX_TEXT_CHARS: usize = 5000;
const TRUNCATION_MARK: char = '…';

/// Header carrying base64(HMAC-SHA256(channel secret, body)).
pub const LINE_SIGNATURE_HEADER: &str = "X-Line-Signature";

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("line api error: {0}")]
    Api(String),
}

/// Webhook POST body: `{ "destination", "events": [...] }`.
#[derive(Debug, Deserialize)]
pub struct LineWebhook {
    #[serde(default)]
    pub events: Vec<LineEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEvent {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub message: Option<LineMessage>,
}

#[derive(Debug, Deserialize)]
pub struct LineMessage {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl LineWebhook {
    /// Text message events with a reply token, in payload order. Other events are skipped.
    pub fn text_messages(&self, channel_id: &str) -> Vec<InboundMessage> {
        self.events
            .iter()
            .filter(|e| e.typ == "message")
            .filter_map(|e| {
                let msg = e.message.as_ref().filter(|m| m.typ == "text")?;
                Some(InboundMessage {
                    channel_id: channel_id.to_string(),
                    reply_token: e.reply_token.clone()?,
                    text: msg.text.clone().unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// Check `signature` against base64(HMAC-SHA256(secret, body)). Comparison is constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Cut `text` to at most [`MAX_TEXT_CHARS`] characters, ending with an ellipsis when cut.
pub fn truncate_for_line(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        None => Cow::Borrowed(text),
        Some(_) => {
            let mut out: String = text.chars().take(MAX_TEXT_CHARS - 1).collect();
            out.push(TRUNCATION_MARK);
            Cow::Owned(out)
        }
    }
}

/// LINE Messaging API connector for replies.
pub struct LineChannel {
    id: String,
    access_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl LineChannel {
    pub fn new(access_token: String, api_base: Option<String>) -> Self {
        Self::with_timeout(access_token, api_base, REPLY_TIMEOUT)
    }

    /// Like [`LineChannel::new`] with an explicit request timeout for the reply API.
    pub fn with_timeout(access_token: String, api_base: Option<String>, timeout: Duration) -> Self {
        let api_base = api_base
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| LINE_API_BASE.to_string());
        Self {
            id: "line".to_string(),
            access_token,
            api_base,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|e| {
                    log::warn!("line client builder failed ({}), using defaults", e);
                    reqwest::Client::new()
                }),
        }
    }

    /// POST /v2/bot/message/reply with one text message, truncated to LINE's length limit.
    pub async fn reply_message(&self, reply_token: &str, text: &str) -> Result<(), LineError> {
        let url = format!("{}/v2/bot/message/reply", self.api_base);
        let text = truncate_for_line(text);
        if let Cow::Owned(_) = text {
            log::debug!("line: reply longer than {} chars, truncated", MAX_TEXT_CHARS);
        }
        let body = serde_json::json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }],
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Api(format!("reply failed: {} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelHandle for LineChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_reply(&self, reply_token: &str, text: &str) -> Result<(), String> {
        self.reply_message(reply_token, text)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Compute the signature header value for `body`. Used by tests to sign webhook payloads.
#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
