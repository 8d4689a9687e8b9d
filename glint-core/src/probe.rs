//! Capability probing.
//!
//! `check_capabilities` never raises: every internal failure degrades
//! the corresponding flag, and the call always resolves.

use crate::capability::{InferenceCapability, SessionKind, SessionOptions};
use glint_common::GlintConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Per-kind probe status surfaced to the UI.
///
/// `Checking` is the placeholder surfaces show before a probe resolves;
/// the prober itself never returns it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeStatus {
    #[default]
    Checking,
    Readily,
    Unavailable,
    NotFound,
    Error,
}

/// What the execution environment can do right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub api_found: bool,
    pub prompt: bool,
    pub prompt_status: ProbeStatus,
    pub writer: bool,
    pub writer_status: ProbeStatus,
    pub rewriter: bool,
    pub rewriter_status: ProbeStatus,
    pub summarizer: bool,
    pub summarizer_status: ProbeStatus,
    pub translator: bool,
    pub translator_status: ProbeStatus,
}

impl Capabilities {
    fn set(&mut self, kind: SessionKind, ready: bool, status: ProbeStatus) {
        match kind {
            SessionKind::Prompt => {
                self.prompt = ready;
                self.prompt_status = status;
            }
            SessionKind::Writer => {
                self.writer = ready;
                self.writer_status = status;
            }
            SessionKind::Rewriter => {
                self.rewriter = ready;
                self.rewriter_status = status;
            }
            SessionKind::Summarizer => {
                self.summarizer = ready;
                self.summarizer_status = status;
            }
            SessionKind::Translator => {
                self.translator = ready;
                self.translator_status = status;
            }
        }
    }
}

pub struct CapabilityProber {
    capability: Arc<dyn InferenceCapability>,
    probe_timeout: Duration,
    verify_timeout: Duration,
}

impl CapabilityProber {
    pub fn new(capability: Arc<dyn InferenceCapability>, config: &GlintConfig) -> Self {
        Self {
            capability,
            probe_timeout: config.probe_timeout(),
            verify_timeout: config.create_timeout(),
        }
    }

    /// Probe every kind and report readiness flags.
    ///
    /// For the primary prompt kind a positive availability is proven by
    /// creating and immediately discarding a throwaway session, since
    /// static availability strings can be optimistic. That verification
    /// costs up to one bounded session creation per probe.
    pub async fn check_capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities {
            api_found: SessionKind::ALL
                .iter()
                .any(|kind| self.capability.supports(*kind)),
            ..Capabilities::default()
        };

        for kind in SessionKind::ALL {
            let (ready, status) = self.probe_kind(kind).await;
            capabilities.set(kind, ready, status);
        }

        if capabilities.prompt {
            if let Err(error) = self.verify_prompt().await {
                tracing::warn!(%error, "prompt readiness verification failed");
                capabilities.set(SessionKind::Prompt, false, ProbeStatus::Error);
            }
        }

        tracing::debug!(
            api_found = capabilities.api_found,
            prompt = capabilities.prompt,
            "capability probe complete"
        );
        capabilities
    }

    async fn probe_kind(&self, kind: SessionKind) -> (bool, ProbeStatus) {
        if !self.capability.supports(kind) {
            return (false, ProbeStatus::NotFound);
        }

        match tokio::time::timeout(self.probe_timeout, self.capability.availability(kind)).await {
            Ok(Ok(availability)) if availability.is_ready() => (true, ProbeStatus::Readily),
            Ok(Ok(availability)) => {
                tracing::debug!(kind = %kind, status = availability.as_str(), "kind not ready");
                (false, ProbeStatus::Unavailable)
            }
            Ok(Err(error)) => {
                tracing::warn!(kind = %kind, %error, "availability check failed");
                (false, ProbeStatus::Error)
            }
            Err(_) => {
                tracing::warn!(
                    kind = %kind,
                    timeout_secs = self.probe_timeout.as_secs(),
                    "availability check timed out"
                );
                (false, ProbeStatus::Error)
            }
        }
    }

    async fn verify_prompt(&self) -> anyhow::Result<()> {
        let options = SessionOptions::defaults_for(SessionKind::Prompt);
        let session = tokio::time::timeout(
            self.verify_timeout,
            self.capability.create(SessionKind::Prompt, &options),
        )
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "verification create timed out after {}s",
                self.verify_timeout.as_secs()
            )
        })??;

        if let Err(error) = session.destroy().await {
            tracing::debug!(%error, "ignoring throwaway session destroy failure");
        }
        Ok(())
    }
}
