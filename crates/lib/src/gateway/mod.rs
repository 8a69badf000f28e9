//! Gateway: HTTP server in front of the responder chain.
//!
//! `POST /callback` takes LINE webhooks, `GET /` answers health probes. Each
//! text message is queued and dispatched on its own task.

mod server;

pub use server::{router, run_gateway, GatewayState};
