//! Serving layer: runtime wiring and the HTTP/websocket surface

pub mod http;
pub mod runtime;

pub use http::*;
pub use runtime::*;
