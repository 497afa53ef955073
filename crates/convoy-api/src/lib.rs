//! Control-plane HTTP client for Convoy.
//!
//! The engine only sees the [`HttpApi`] trait; [`ReqwestApi`] is the
//! production implementation. Responses carry status + body verbatim —
//! 2xx classification and error shaping happen in the engine's API-call
//! step, which owns the diagnostic context.

mod client;
mod error;

pub use client::{ApiRequest, ApiResponse, HttpApi, ReqwestApi, SharedHttpApi};
pub use error::{ApiError, Result};
