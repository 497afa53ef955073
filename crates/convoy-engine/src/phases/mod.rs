//! The four phase executors, in execution order.

pub mod params;
pub mod post;
pub mod preconditions;
pub mod resources;

use convoy_config::{LogAction, LogLevel};
use tracing::{debug, error, info, warn};

use crate::context::EvaluationContext;
use crate::template::{render, RenderMode};

/// Emit a configured log line, rendered against the current params.
/// Render problems never fail a step; the raw message is logged instead.
pub(crate) fn run_log_action(action: &LogAction, ctx: &EvaluationContext) {
    let message = render(&action.message, &ctx.params, RenderMode::Lenient)
        .unwrap_or_else(|_| action.message.clone());

    match action.level {
        LogLevel::Debug => debug!("{message}"),
        LogLevel::Info => info!("{message}"),
        LogLevel::Warn => warn!("{message}"),
        LogLevel::Error => error!("{message}"),
    }
}
