//! Communication channels (LINE).
//!
//! A channel turns platform webhook events into [`InboundMessage`]s and delivers
//! one reply per message through its [`ChannelHandle`].

mod inbound;
mod line;

pub use inbound::InboundMessage;
pub use line::{
    truncate_for_line, verify_signature, LineChannel, LineError, LineWebhook, LINE_SIGNATURE_HEADER,
    MAX_TEXT_CHARS,
};
#[cfg(test)]
pub(crate) use line::sign;

use async_trait::async_trait;

/// Handle to a channel that can deliver replies.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "line").
    fn id(&self) -> &str;
    /// Deliver `text` as the reply for the message identified by `reply_token`.
    async fn send_reply(&self, reply_token: &str, text: &str) -> Result<(), String>;
}
