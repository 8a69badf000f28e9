//! Inbound message from a channel: delivered to the gateway for dispatch through the responder chain.

/// A text message from a channel, answered at most once via its reply token.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel_id: String,
    /// Opaque token the channel needs to deliver the reply; passed through unchanged.
    pub reply_token: String,
    pub text: String,
}
