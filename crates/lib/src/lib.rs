//! Replier core library — responder chain, generation client, LINE channel,
//! and the webhook gateway used by the CLI.

pub mod chain;
pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod responder;
