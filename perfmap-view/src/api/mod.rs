//! HTTP API handlers for perfmap-view

pub mod health;
pub mod map;
pub mod sse;

pub use health::health_routes;
pub use map::map_routes;
pub use sse::event_stream;
