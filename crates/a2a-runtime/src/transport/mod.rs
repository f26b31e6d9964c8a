//! Transport bindings for the protocol runtime
//!
//! Two equivalent bindings of the same envelope schema: a
//! persistent-connection WebSocket endpoint per capability, and a stateless
//! HTTP request/response surface that maps error codes to HTTP statuses.

pub mod http;
pub mod ws;

pub use http::http_app;
pub use ws::serve_ws;
