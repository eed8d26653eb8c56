//! HTTP surface: router, handlers, SSE streams

pub mod handlers;
pub mod server;

pub use server::{router, serve, AppState};
