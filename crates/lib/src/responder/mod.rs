//! Responders: units that either answer a message or decline it.
//!
//! The chain tries them in configured order (see [`crate::chain`]). FAQ and news
//! responders are in-memory table lookups; the generative responder calls out
//! to the generation service and always answers.

mod faq;
mod generative;
mod news;
mod sanitize;

pub use faq::FaqResponder;
pub use generative::{GenerativeResponder, MALFORMED_REPLY, UNREACHABLE_REPLY};
pub use news::NewsResponder;
pub use sanitize::strip_reasoning;

use async_trait::async_trait;

/// Text sent back for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Result of one responder attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderOutcome {
    Answered(Reply),
    Declined,
}

/// A responder looks at message text and answers or declines. It must not fail:
/// empty or unmatched input is a normal decline.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short name for logs (e.g. "faq").
    fn name(&self) -> &str;

    async fn attempt(&self, text: &str) -> ResponderOutcome;
}

/// Normalization shared by the table responders: trim, then Unicode lowercase.
pub(crate) fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
