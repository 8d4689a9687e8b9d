//! Per-context request routing.
//!
//! Each consumer context (one browser tab) gets its own engine, so
//! sessions never leak between contexts. The registry is the only
//! structure mutated from multiple call sites (new request, teardown
//! signal, periodic sweep); every mutation happens inside one write
//! guard, so check-then-act on an entry is atomic.

use crate::request::{OperationRequest, OperationResponse};
use glint_common::GlintConfig;
use glint_core::{AssistantEngine, CapabilityProber, InferenceCapability};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

struct ContextEntry {
    engine: Arc<AssistantEngine>,
    last_used: Instant,
}

pub struct Dispatcher {
    capability: Arc<dyn InferenceCapability>,
    config: GlintConfig,
    prober: CapabilityProber,
    contexts: RwLock<HashMap<String, ContextEntry>>,
}

impl Dispatcher {
    pub fn new(capability: Arc<dyn InferenceCapability>, config: GlintConfig) -> Self {
        Self {
            prober: CapabilityProber::new(Arc::clone(&capability), &config),
            capability,
            config,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Route one request. Component errors never escape; they are
    /// translated into the failure envelope.
    ///
    /// Requests with no resolvable context identity get a throwaway
    /// engine that is torn down once the single operation completes.
    pub async fn handle(
        &self,
        context_id: Option<&str>,
        request: OperationRequest,
    ) -> OperationResponse {
        tracing::debug!(
            action = request.action(),
            context = context_id.unwrap_or("<none>"),
            "dispatching request"
        );

        if matches!(request, OperationRequest::CheckCapabilities) {
            return OperationResponse::capabilities(self.prober.check_capabilities().await);
        }

        match context_id {
            Some(context_id) => {
                let engine = self.engine_for(context_id).await;
                self.execute(&engine, request).await
            }
            None => {
                let ephemeral = Uuid::new_v4();
                tracing::debug!(context = %ephemeral, "serving contextless request");
                let engine = Arc::new(AssistantEngine::new(
                    Arc::clone(&self.capability),
                    &self.config,
                ));
                let response = self.execute(&engine, request).await;
                engine.shutdown().await;
                response
            }
        }
    }

    /// JSON boundary for host messaging glue: malformed requests come
    /// back as failure envelopes instead of errors.
    pub async fn handle_value(&self, context_id: Option<&str>, request: Value) -> Value {
        let request: OperationRequest = match serde_json::from_value(request) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(%error, "unparseable request");
                let response =
                    OperationResponse::failure_message(format!("unrecognized request: {error}"));
                return serde_json::to_value(&response).unwrap_or_else(|_| {
                    serde_json::json!({ "success": false, "error": "unrecognized request" })
                });
            }
        };
        let response = self.handle(context_id, request).await;
        serde_json::to_value(&response).unwrap_or_else(|_| {
            serde_json::json!({ "success": false, "error": "response serialization failed" })
        })
    }

    async fn engine_for(&self, context_id: &str) -> Arc<AssistantEngine> {
        let mut contexts = self.contexts.write().await;
        let entry = contexts
            .entry(context_id.to_string())
            .or_insert_with(|| {
                tracing::info!(context = %context_id, "registering context");
                ContextEntry {
                    engine: Arc::new(AssistantEngine::new(
                        Arc::clone(&self.capability),
                        &self.config,
                    )),
                    last_used: Instant::now(),
                }
            });
        entry.last_used = Instant::now();
        Arc::clone(&entry.engine)
    }

    async fn execute(
        &self,
        engine: &Arc<AssistantEngine>,
        request: OperationRequest,
    ) -> OperationResponse {
        match request {
            // Intercepted in handle() before engine selection, so a
            // capability check never registers a context.
            OperationRequest::CheckCapabilities => {
                unreachable!("capability checks are resolved before engine selection")
            }
            OperationRequest::ReviewCode { code, options } => {
                match engine.review_code(&code, &options).await {
                    Ok(result) => OperationResponse::review(result),
                    Err(error) => OperationResponse::failure(&error),
                }
            }
            OperationRequest::GenerateDocs { code, options } => {
                match engine.generate_docs(&code, &options).await {
                    Ok(result) => OperationResponse::docs(result),
                    Err(error) => OperationResponse::failure(&error),
                }
            }
            OperationRequest::RefactorCode { code, options } => {
                match engine.refactor_code(&code, &options).await {
                    Ok(result) => OperationResponse::refactor(result),
                    Err(error) => OperationResponse::failure(&error),
                }
            }
            OperationRequest::SummarizePr { content, options } => {
                match engine.summarize_pr(&content, &options).await {
                    Ok(result) => OperationResponse::summary(result),
                    Err(error) => OperationResponse::failure(&error),
                }
            }
            OperationRequest::TranslateComment {
                text,
                target_language,
                source_language,
                options,
            } => {
                match engine
                    .translate_comment(
                        &text,
                        &target_language,
                        source_language.as_deref(),
                        &options,
                    )
                    .await
                {
                    Ok(result) => OperationResponse::translation(result),
                    Err(error) => OperationResponse::failure(&error),
                }
            }
        }
    }

    /// Eager cleanup on the host's context-close signal. A close for an
    /// unknown context is a no-op.
    pub async fn close_context(&self, context_id: &str) {
        let removed = self.contexts.write().await.remove(context_id);
        match removed {
            Some(entry) => {
                entry.engine.shutdown().await;
                tracing::info!(context = %context_id, "context closed, sessions destroyed");
            }
            None => {
                tracing::debug!(context = %context_id, "close for unknown context ignored");
            }
        }
    }

    /// Evict contexts idle beyond the staleness TTL and destroy their
    /// sessions. Bounds growth from contexts that close without a
    /// teardown signal. Returns the number of evicted contexts.
    pub async fn sweep_stale(&self) -> usize {
        let ttl = self.config.context_ttl();
        let now = Instant::now();

        let stale: Vec<(String, ContextEntry)> = {
            let mut contexts = self.contexts.write().await;
            let stale_ids: Vec<String> = contexts
                .iter()
                .filter(|(_, entry)| now.duration_since(entry.last_used) >= ttl)
                .map(|(context_id, _)| context_id.clone())
                .collect();
            stale_ids
                .into_iter()
                .filter_map(|context_id| contexts.remove_entry(&context_id))
                .collect()
        };

        let evicted = stale.len();
        for (context_id, entry) in stale {
            entry.engine.shutdown().await;
            tracing::info!(context = %context_id, "evicted stale context");
        }
        if evicted > 0 {
            tracing::info!(evicted, "stale context sweep complete");
        }
        evicted
    }

    /// Spawn the periodic sweep. The returned handle aborts it.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(dispatcher.config.sweep_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                dispatcher.sweep_stale().await;
            }
        })
    }

    /// Number of registered contexts.
    pub async fn context_count(&self) -> usize {
        self.contexts.read().await.len()
    }
}
