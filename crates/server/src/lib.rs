//! HTTP server that authenticates requests by signature.
//!
//! - [`app`]: router, handlers and the JSON identity response
//! - [`background`]: threaded server handle used by tests and demos
//! - [`error`]: JSON error bodies for rejected requests

pub mod app;
pub mod background;
pub mod error;

pub use app::create_router;
pub use background::BackgroundServer;
