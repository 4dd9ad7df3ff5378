//! Proxy module - catch-all request forwarding to the backend origin

pub mod forward;
pub mod headers;
pub mod server;

pub use server::{AppState, GatewayServer};
