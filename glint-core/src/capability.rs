//! The injected inference capability boundary.
//!
//! The host environment (a browser with built-in on-device AI) exposes
//! one factory per session kind plus stateful session handles. Glint
//! never reimplements inference; it only drives these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Category of inference behavior a session provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Free-form prompt/completion
    Prompt,
    /// Document writer
    Writer,
    /// Code/text rewriter
    Rewriter,
    /// Summarizer
    Summarizer,
    /// Translator (keyed by a language pair)
    Translator,
}

impl SessionKind {
    /// All supported kinds, in probe order.
    pub const ALL: [SessionKind; 5] = [
        SessionKind::Prompt,
        SessionKind::Writer,
        SessionKind::Rewriter,
        SessionKind::Summarizer,
        SessionKind::Translator,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SessionKind::Prompt => "prompt",
            SessionKind::Writer => "writer",
            SessionKind::Rewriter => "rewriter",
            SessionKind::Summarizer => "summarizer",
            SessionKind::Translator => "translator",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readiness reported by the host capability for one session kind.
///
/// `readily` is the legacy spelling some hosts still report; both it
/// and `available` mean the model can serve without a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Unavailable,
    Downloadable,
    Downloading,
    Readily,
    Available,
}

impl Availability {
    /// Whether a session of this kind can be created right now.
    pub const fn is_ready(self) -> bool {
        matches!(self, Availability::Readily | Availability::Available)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Availability::Unavailable => "unavailable",
            Availability::Downloadable => "downloadable",
            Availability::Downloading => "downloading",
            Availability::Readily => "readily",
            Availability::Available => "available",
        }
    }
}

/// Options handed to session creation, camelCase to match the host surface.
///
/// All fields are optional; the session manager merges caller values
/// over per-kind defaults before creating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
}

impl SessionOptions {
    /// Baseline options for a session kind.
    pub fn defaults_for(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Prompt => Self {
                temperature: Some(0.7),
                top_k: Some(3),
                system_prompt: Some(
                    "You are an expert software engineer. Answer precisely and \
                     format output as markdown."
                        .to_string(),
                ),
                ..Self::default()
            },
            SessionKind::Writer => Self {
                tone: Some("neutral".to_string()),
                format: Some("markdown".to_string()),
                length: Some("medium".to_string()),
                ..Self::default()
            },
            SessionKind::Rewriter => Self {
                tone: Some("as-is".to_string()),
                format: Some("as-is".to_string()),
                length: Some("as-is".to_string()),
                ..Self::default()
            },
            SessionKind::Summarizer => Self {
                format: Some("markdown".to_string()),
                length: Some("medium".to_string()),
                ..Self::default()
            },
            SessionKind::Translator => Self::default(),
        }
    }

    /// Overlay caller-supplied values over these (the defaults).
    ///
    /// A `Some` in `caller` wins; a `None` keeps the default.
    pub fn overlaid_with(mut self, caller: &SessionOptions) -> Self {
        if caller.temperature.is_some() {
            self.temperature = caller.temperature;
        }
        if caller.top_k.is_some() {
            self.top_k = caller.top_k;
        }
        if let Some(system_prompt) = &caller.system_prompt {
            self.system_prompt = Some(system_prompt.clone());
        }
        if let Some(tone) = &caller.tone {
            self.tone = Some(tone.clone());
        }
        if let Some(format) = &caller.format {
            self.format = Some(format.clone());
        }
        if let Some(length) = &caller.length {
            self.length = Some(length.clone());
        }
        if let Some(source_language) = &caller.source_language {
            self.source_language = Some(source_language.clone());
        }
        if let Some(target_language) = &caller.target_language {
            self.target_language = Some(target_language.clone());
        }
        self
    }
}

/// A stateful handle to one inference channel.
///
/// Each kind supports exactly one verb; the default methods reject the
/// others so host adapters only implement what their kind exposes.
/// Handles are exclusively owned by the session manager that created
/// them; `destroy` is only ever called through it.
#[async_trait]
pub trait InferenceSession: Send + Sync {
    async fn prompt(&self, _input: &str) -> anyhow::Result<String> {
        anyhow::bail!("this session kind does not support prompt")
    }

    async fn write(&self, _input: &str) -> anyhow::Result<String> {
        anyhow::bail!("this session kind does not support write")
    }

    async fn rewrite(&self, _input: &str) -> anyhow::Result<String> {
        anyhow::bail!("this session kind does not support rewrite")
    }

    async fn summarize(&self, _input: &str) -> anyhow::Result<String> {
        anyhow::bail!("this session kind does not support summarize")
    }

    async fn translate(&self, _input: &str) -> anyhow::Result<String> {
        anyhow::bail!("this session kind does not support translate")
    }

    /// Release the underlying channel. Failures are tolerated upstream;
    /// a handle that is already defunct should return `Ok(())`.
    async fn destroy(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The host-provided inference capability. Injected, never reimplemented.
#[async_trait]
pub trait InferenceCapability: Send + Sync {
    /// Whether the host exposes this kind at all (the capability type
    /// is present in the execution environment).
    fn supports(&self, kind: SessionKind) -> bool;

    /// Static readiness for the kind. May be optimistic; true readiness
    /// is only proven by creating a session.
    async fn availability(&self, kind: SessionKind) -> anyhow::Result<Availability>;

    /// Create a new session of the kind with the merged options.
    async fn create(
        &self,
        kind: SessionKind,
        options: &SessionOptions,
    ) -> anyhow::Result<Arc<dyn InferenceSession>>;
}
