//! SOC Gateway Core Library
//! Shared logic for request forwarding and backend API access

pub mod client;
pub mod config;
pub mod proxy;
