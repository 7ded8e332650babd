//! HTTP handlers for tronwatch

mod api;
mod health;
pub mod ws;

pub use api::*;
pub use health::*;
pub use ws::{ws_handler, WsState};
