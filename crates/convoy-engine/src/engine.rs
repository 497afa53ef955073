//! The per-event interpreter.
//!
//! `Engine::execute` drives the four phases in fixed order against one
//! event, always finishing with post-actions so status gets reported even
//! after a failure. `Engine::handle` adds the acknowledgment contract for
//! at-least-once brokers: permanently bad events (unparseable payload,
//! missing required params) are swallowed so they are not redelivered;
//! everything else surfaces as an error for the broker to NACK.

use std::sync::Arc;

use convoy_api::SharedHttpApi;
use convoy_cluster::{SharedKubernetes, SharedWorkTransport};
use convoy_config::AdapterConfig;
use tracing::{error, info, info_span, Instrument};

use crate::cel::ExpressionCache;
use crate::context::EvaluationContext;
use crate::error::{EngineError, Phase, Result};
use crate::event::Event;
use crate::phases;
use crate::result::{ExecutionResult, Status};

/// The execution engine. One instance serves all events; per-event state
/// lives in the [`EvaluationContext`] each call creates.
pub struct Engine {
    config: Arc<AdapterConfig>,
    api: SharedHttpApi,
    kubernetes: SharedKubernetes,
    transport: Option<SharedWorkTransport>,
    cel: ExpressionCache,
}

impl Engine {
    /// Start building an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The adapter config this engine interprets.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Execute one event through all four phases.
    pub async fn execute(&self, event: &Event) -> ExecutionResult {
        let span = info_span!("event", event_id = %event.id);
        self.execute_inner(event).instrument(span).await
    }

    async fn execute_inner(&self, event: &Event) -> ExecutionResult {
        let mut result = ExecutionResult::new(&event.id);

        // Parse the payload at the boundary; a bad payload is permanent.
        let event_data = match event.parse_data() {
            Ok(data) => data,
            Err(e) => {
                result.status = Status::Failed;
                result.phase = Phase::ParamExtraction;
                result.error_reason = Some("event data parsing failed".into());
                result.error = Some(e);
                return result;
            }
        };

        let mut ctx = EvaluationContext::new(
            &self.config.metadata.name,
            &self.config.metadata.version,
            &event.id,
            event_data,
        );

        info!("starting event execution");

        // Phase 1: parameter extraction. Failure here ends the event —
        // there is nothing meaningful to report without params.
        result.phase = Phase::ParamExtraction;
        if let Err(e) = phases::params::execute(
            &self.config.spec.params,
            &self.config.metadata,
            self.kubernetes.as_ref(),
            &mut ctx,
        )
        .await
        {
            error!("parameter extraction failed: {e}");
            result.status = Status::Failed;
            result.error_reason = Some("parameter extraction failed".into());
            result.error = Some(e);
            result.params = ctx.params.clone();
            result.execution_context = Some(ctx);
            return result;
        }
        result.params = ctx.params.clone();
        info!(params = result.params.len(), "parameter extraction completed");

        // Phase 2: preconditions.
        result.phase = Phase::Preconditions;
        let outcome = phases::preconditions::execute_all(
            &self.config.spec.preconditions,
            self.api.as_ref(),
            &self.cel,
            &mut ctx,
        )
        .await;
        result.precondition_results = outcome.results;

        if let Some(e) = outcome.error {
            // Hard failure; post-actions still run to report it.
            error!("precondition execution failed: {e}");
            result.status = Status::Failed;
            result.error_reason = Some("precondition evaluation failed".into());
            result.error = Some(e);
        } else if !outcome.all_matched {
            // Business outcome, not an error.
            let reason = outcome.not_met_reason.unwrap_or_default();
            info!("preconditions not met, resources will be skipped: {reason}");
            ctx.set_skipped("PreconditionNotMet", &reason);
            result.resources_skipped = true;
            result.skip_reason = Some(reason);
        } else {
            info!(
                preconditions = result.precondition_results.len(),
                "preconditions completed"
            );
        }

        // Phase 3: resources — only on a clean, fully matched run. The
        // recorded phase freezes at the first failure.
        if result.status == Status::Success {
            result.phase = Phase::Resources;
        }
        if result.status == Status::Success && !result.resources_skipped {
            let (resource_results, error) = phases::resources::execute_all(
                &self.config.spec.resources,
                self.kubernetes.as_ref(),
                self.transport.as_deref(),
                &mut ctx,
            )
            .await;
            result.resource_results = resource_results;

            if let Some(e) = error {
                error!("resource execution failed: {e}");
                result.status = Status::Failed;
                result.error_reason = Some("resource execution failed".into());
                result.error = Some(e);
            } else {
                info!(
                    resources = result.resource_results.len(),
                    "resources completed"
                );
            }
        }

        // Phase 4: post-actions always run for reporting.
        if result.status == Status::Success {
            result.phase = Phase::PostActions;
        }
        let (post_results, error) = phases::post::execute_all(
            self.config.spec.post.as_ref(),
            self.api.as_ref(),
            &self.cel,
            &mut ctx,
        )
        .await;
        result.post_action_results = post_results;

        if let Some(e) = error {
            error!("post action execution failed: {e}");
            result.status = Status::Failed;
            result.error_reason = Some("post action execution failed".into());
            if result.error.is_none() {
                result.error = Some(e);
            }
        } else {
            info!(
                actions = result.post_action_results.len(),
                "post actions completed"
            );
        }

        result.params = ctx.params.clone();
        result.execution_context = Some(ctx);

        match (result.status, result.resources_skipped) {
            (Status::Success, true) => info!(
                reason = result.skip_reason.as_deref().unwrap_or(""),
                "event execution completed successfully (resources skipped)"
            ),
            (Status::Success, false) => info!("event execution completed successfully"),
            (Status::Failed, _) => error!(
                phase = %result.phase,
                reason = result.error_reason.as_deref().unwrap_or(""),
                "event execution failed"
            ),
        }

        result
    }

    /// Execute and apply the acknowledgment policy: `Ok(())` means ACK,
    /// `Err` means NACK (the broker should redeliver).
    pub async fn handle(&self, event: Event) -> Result<()> {
        let result = self.execute(&event).await;

        if result.status == Status::Failed {
            // Bad events are not retryable; everything else is.
            if result.phase == Phase::ParamExtraction {
                return Ok(());
            }
            return Err(result
                .error
                .unwrap_or_else(|| EngineError::Internal("execution failed".into())));
        }

        Ok(())
    }
}

/// Fluent construction for [`Engine`], validating collaborators up front.
#[derive(Default)]
pub struct EngineBuilder {
    config: Option<Arc<AdapterConfig>>,
    api: Option<SharedHttpApi>,
    kubernetes: Option<SharedKubernetes>,
    transport: Option<SharedWorkTransport>,
}

impl EngineBuilder {
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    pub fn api(mut self, api: SharedHttpApi) -> Self {
        self.api = Some(api);
        self
    }

    pub fn kubernetes(mut self, kubernetes: SharedKubernetes) -> Self {
        self.kubernetes = Some(kubernetes);
        self
    }

    /// Optional: only needed when resources target `manifestWork`.
    pub fn work_transport(mut self, transport: SharedWorkTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Engine> {
        let config = self
            .config
            .ok_or_else(|| EngineError::Builder("adapter config is required".into()))?;
        let api = self
            .api
            .ok_or_else(|| EngineError::Builder("API client is required".into()))?;
        let kubernetes = self
            .kubernetes
            .ok_or_else(|| EngineError::Builder("kubernetes client is required".into()))?;

        Ok(Engine {
            config,
            api,
            kubernetes,
            transport: self.transport,
            cel: ExpressionCache::new(),
        })
    }
}
