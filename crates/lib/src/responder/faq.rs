//! Exact-match FAQ responder.

use super::{normalize, Reply, Responder, ResponderOutcome};
use crate::config::FaqEntry;
use async_trait::async_trait;
use std::collections::HashMap;

/// Answers when the normalized message equals a normalized question.
/// Entries with an empty question are skipped; for duplicate questions the first entry wins.
pub struct FaqResponder {
    answers: HashMap<String, String>,
}

impl FaqResponder {
    pub fn new(entries: &[FaqEntry]) -> Self {
        let mut answers = HashMap::with_capacity(entries.len());
        for e in entries {
            let key = normalize(&e.question);
            if key.is_empty() {
                log::debug!("faq: skipping entry with empty question");
                continue;
            }
            answers.entry(key).or_insert_with(|| e.answer.clone());
        }
        Self { answers }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[async_trait]
impl Responder for FaqResponder {
    fn name(&self) -> &str {
        "faq"
    }

    async fn attempt(&self, text: &str) -> ResponderOutcome {
        match self.answers.get(&normalize(text)) {
            Some(answer) => ResponderOutcome::Answered(Reply::new(answer.clone())),
            None => ResponderOutcome::Declined,
        }
    }
}
