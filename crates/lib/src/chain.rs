//! Responder chain: try responders in order and take the first answer.
//!
//! Under [`DropPolicy::AlwaysAnswer`] every dispatch yields a reply; with the
//! default order the generative responder is last and never declines, so the
//! fixed [`NO_ANSWER_REPLY`] only shows up when a custom order leaves it out.

use crate::config::{Config, DropPolicy, ResponderKind};
use crate::responder::{
    FaqResponder, GenerativeResponder, NewsResponder, Reply, Responder, ResponderOutcome,
};
use std::sync::Arc;

/// Reply used under `AlwaysAnswer` when every responder declined.
pub const NO_ANSWER_REPLY: &str = "抱歉，我目前無法回答這個問題。";

/// Ordered list of responders plus the policy for the all-declined case.
#[derive(Clone)]
pub struct ResponderChain {
    responders: Vec<Arc<dyn Responder>>,
    policy: DropPolicy,
}

impl ResponderChain {
    pub fn new(responders: Vec<Arc<dyn Responder>>, policy: DropPolicy) -> Self {
        Self { responders, policy }
    }

    /// Build the chain from `responders.order`. Each kind is constructed once; repeated kinds are skipped.
    pub fn from_config(config: &Config) -> Self {
        let mut seen: Vec<ResponderKind> = Vec::new();
        let mut responders: Vec<Arc<dyn Responder>> = Vec::new();
        for kind in &config.responders.order {
            if seen.contains(kind) {
                log::warn!("responder {:?} listed more than once in order, skipping", kind);
                continue;
            }
            seen.push(*kind);
            let responder: Arc<dyn Responder> = match kind {
                ResponderKind::Faq => Arc::new(FaqResponder::new(&config.responders.faq)),
                ResponderKind::News => Arc::new(NewsResponder::new(&config.responders.news)),
                ResponderKind::Generative => {
                    Arc::new(GenerativeResponder::from_config(&config.generation))
                }
            };
            responders.push(responder);
        }
        if responders.is_empty() {
            log::warn!("responder order is empty; every message falls through to the drop policy");
        }
        log::info!(
            "responder chain: [{}], policy {:?}",
            responders
                .iter()
                .map(|r| r.name())
                .collect::<Vec<_>>()
                .join(", "),
            config.responders.policy
        );
        Self::new(responders, config.responders.policy)
    }

    pub fn policy(&self) -> DropPolicy {
        self.policy
    }

    /// Names of the responders in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.responders.iter().map(|r| r.name()).collect()
    }

    /// Run the chain for one message. Returns `None` only under `AllowSilentDrop` when every responder declined.
    pub async fn dispatch(&self, text: &str) -> Option<Reply> {
        for responder in &self.responders {
            match responder.attempt(text).await {
                ResponderOutcome::Answered(reply) => {
                    log::debug!("chain: answered by {}", responder.name());
                    return Some(reply);
                }
                ResponderOutcome::Declined => {
                    log::trace!("chain: {} declined", responder.name());
                }
            }
        }
        match self.policy {
            DropPolicy::AlwaysAnswer => Some(Reply::new(NO_ANSWER_REPLY)),
            DropPolicy::AllowSilentDrop => None,
        }
    }
}
