//! Health endpoints for the Convoy adapter.

mod health;

pub use health::{health_routes, serve, HealthResponse, Readiness};
