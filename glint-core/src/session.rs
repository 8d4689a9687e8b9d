//! Session lifecycle management.
//!
//! One `SessionManager` owns every session for one consumer context.
//! The memo table guarantees at most one live session per key and at
//! most one in-flight creation per key: concurrent requesters share a
//! single pending creation and observe the same outcome, success or
//! failure.

use crate::capability::{InferenceCapability, InferenceSession, SessionKind, SessionOptions};
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use glint_common::{Error, GlintConfig, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Memo key: session kind, plus the language pair for translators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub kind: SessionKind,
    pub languages: Option<(String, String)>,
}

impl SessionKey {
    pub fn of(kind: SessionKind) -> Self {
        Self {
            kind,
            languages: None,
        }
    }

    pub fn translator(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: SessionKind::Translator,
            languages: Some((source.into(), target.into())),
        }
    }

    /// Log label, e.g. `translator(en>ja)`.
    pub fn label(&self) -> String {
        match &self.languages {
            Some((source, target)) => format!("{}({source}>{target})", self.kind),
            None => self.kind.as_str().to_string(),
        }
    }
}

type CreationOutcome = std::result::Result<Arc<dyn InferenceSession>, Arc<anyhow::Error>>;
type SharedCreation = Shared<BoxFuture<'static, CreationOutcome>>;

enum Slot {
    Ready(Arc<dyn InferenceSession>),
    Pending {
        generation: u64,
        creation: SharedCreation,
    },
}

/// Owns the sessions of one consumer context.
pub struct SessionManager {
    capability: Arc<dyn InferenceCapability>,
    create_timeout: Duration,
    slots: Mutex<HashMap<SessionKey, Slot>>,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(capability: Arc<dyn InferenceCapability>, config: &GlintConfig) -> Self {
        Self {
            capability,
            create_timeout: config.create_timeout(),
            slots: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Get the live session for `key`, creating it if absent.
    ///
    /// Creation is bounded and not retried here; on failure the memo
    /// entry is cleared and a `SessionInit` error carries the cause.
    /// Retrying is the operation executor's responsibility.
    pub async fn get_session(
        &self,
        key: &SessionKey,
        options: &SessionOptions,
    ) -> Result<Arc<dyn InferenceSession>> {
        let (creation, generation) = {
            let mut slots = self.slots.lock().await;
            match slots.get(key) {
                Some(Slot::Ready(session)) => return Ok(Arc::clone(session)),
                Some(Slot::Pending {
                    generation,
                    creation,
                }) => (creation.clone(), *generation),
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let creation = self.begin_creation(key, options);
                    slots.insert(
                        key.clone(),
                        Slot::Pending {
                            generation,
                            creation: creation.clone(),
                        },
                    );
                    (creation, generation)
                }
            }
        };

        match creation.await {
            Ok(session) => {
                let mut slots = self.slots.lock().await;
                if Self::pending_matches(slots.get(key), generation) {
                    slots.insert(key.clone(), Slot::Ready(Arc::clone(&session)));
                }
                Ok(session)
            }
            Err(cause) => {
                let mut slots = self.slots.lock().await;
                if Self::pending_matches(slots.get(key), generation) {
                    slots.remove(key);
                }
                Err(Error::SessionInit {
                    kind: key.kind.as_str(),
                    cause,
                })
            }
        }
    }

    /// True when the slot still holds the pending entry this caller
    /// installed; guards against evicting a newer entry.
    fn pending_matches(slot: Option<&Slot>, generation: u64) -> bool {
        matches!(slot, Some(Slot::Pending { generation: g, .. }) if *g == generation)
    }

    fn begin_creation(&self, key: &SessionKey, options: &SessionOptions) -> SharedCreation {
        let capability = Arc::clone(&self.capability);
        let mut merged = SessionOptions::defaults_for(key.kind).overlaid_with(options);
        if let Some((source, target)) = &key.languages {
            merged.source_language = Some(source.clone());
            merged.target_language = Some(target.clone());
        }
        let kind = key.kind;
        let label = key.label();
        let bound = self.create_timeout;

        async move {
            tracing::debug!(session = %label, "creating session");
            match tokio::time::timeout(bound, capability.create(kind, &merged)).await {
                Ok(Ok(session)) => {
                    tracing::info!(session = %label, "session created");
                    Ok(session)
                }
                Ok(Err(error)) => {
                    tracing::warn!(session = %label, %error, "session creation failed");
                    Err(Arc::new(error))
                }
                Err(_) => {
                    tracing::warn!(
                        session = %label,
                        timeout_secs = bound.as_secs(),
                        "session creation timed out"
                    );
                    Err(Arc::new(anyhow::anyhow!(
                        "creation timed out after {}s",
                        bound.as_secs()
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Destroy the session for `key` if one exists.
    ///
    /// Idempotent; failures from an already-defunct handle are
    /// swallowed, never propagated. An in-flight creation is reclaimed
    /// once it resolves, so no session outlives its manager unseen.
    pub async fn destroy(&self, key: &SessionKey) {
        let slot = self.slots.lock().await.remove(key);
        match slot {
            Some(Slot::Ready(session)) => {
                if let Err(error) = session.destroy().await {
                    tracing::debug!(session = %key.label(), %error, "ignoring destroy failure");
                }
                tracing::debug!(session = %key.label(), "session destroyed");
            }
            Some(Slot::Pending { creation, .. }) => {
                // Waiters on the abandoned creation still resolve, but
                // the result will not be memoized.
                Self::reclaim_pending(key.label(), creation);
            }
            None => {}
        }
    }

    /// Destroy every session this manager owns.
    pub async fn destroy_all(&self) {
        let slots: Vec<(SessionKey, Slot)> = {
            let mut guard = self.slots.lock().await;
            guard.drain().collect()
        };
        let count = slots.len();
        for (key, slot) in slots {
            match slot {
                Slot::Ready(session) => {
                    if let Err(error) = session.destroy().await {
                        tracing::debug!(session = %key.label(), %error, "ignoring destroy failure");
                    }
                }
                Slot::Pending { creation, .. } => {
                    Self::reclaim_pending(key.label(), creation);
                }
            }
        }
        if count > 0 {
            tracing::debug!(sessions = count, "destroyed all sessions");
        }
    }

    /// Await an abandoned in-flight creation and destroy whatever it
    /// produces, so teardown during creation cannot leak the session.
    fn reclaim_pending(label: String, creation: SharedCreation) {
        tracing::debug!(session = %label, "reclaiming in-flight creation");
        tokio::spawn(async move {
            if let Ok(session) = creation.await {
                if let Err(error) = session.destroy().await {
                    tracing::debug!(session = %label, %error, "ignoring destroy failure");
                }
                tracing::debug!(session = %label, "reclaimed session destroyed");
            }
        });
    }

    /// Whether a fully-created session is memoized for `key`.
    pub async fn has_session(&self, key: &SessionKey) -> bool {
        matches!(self.slots.lock().await.get(key), Some(Slot::Ready(_)))
    }

    /// Number of memo entries, live or pending.
    pub async fn session_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}
