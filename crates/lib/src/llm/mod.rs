//! Generation service client.
//!
//! One synchronous, non-streaming generate call per request against an Ollama-compatible endpoint.

mod ollama;

pub use ollama::{OllamaClient, OllamaError};
