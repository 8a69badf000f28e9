//! Keyword news responder.

use super::{normalize, Reply, Responder, ResponderOutcome};
use crate::config::NewsEntry;
use async_trait::async_trait;

struct Rule {
    keywords: Vec<String>,
    reply: String,
}

/// Answers with the first entry (table order) that has a keyword contained in the normalized message.
pub struct NewsResponder {
    rules: Vec<Rule>,
}

impl NewsResponder {
    pub fn new(entries: &[NewsEntry]) -> Self {
        let rules = entries
            .iter()
            .filter_map(|e| {
                // An empty keyword would match every message.
                let keywords: Vec<String> = e
                    .keywords
                    .iter()
                    .map(|k| normalize(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                if keywords.is_empty() {
                    log::debug!("news: skipping entry without keywords");
                    None
                } else {
                    Some(Rule {
                        keywords,
                        reply: e.reply.clone(),
                    })
                }
            })
            .collect();
        Self { rules }
    }
}

#[async_trait]
impl Responder for NewsResponder {
    fn name(&self) -> &str {
        "news"
    }

    async fn attempt(&self, text: &str) -> ResponderOutcome {
        let text = normalize(text);
        if text.is_empty() {
            return ResponderOutcome::Declined;
        }
        self.rules
            .iter()
            .find(|r| r.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|r| ResponderOutcome::Answered(Reply::new(r.reply.clone())))
            .unwrap_or(ResponderOutcome::Declined)
    }
}
