// src/gateway/mod.rs

pub mod chat_id;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod operation;
pub mod preview;
pub mod request;
pub mod transport;

// The HTTP front end needs axum, so it only exists with the `server` feature.
#[cfg(feature = "server")]
pub mod handler;
#[cfg(feature = "server")]
pub mod server;
