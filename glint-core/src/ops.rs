//! The user-facing operations: code review, documentation, refactor
//! suggestions, PR summarization, and comment translation.
//!
//! Each operation validates and truncates its input before any session
//! work, builds the kind-appropriate prompt, and runs through the
//! shared executor with the kind-appropriate session verb.

use crate::capability::{InferenceCapability, SessionKind, SessionOptions};
use crate::executor::{OperationExecutor, OperationResult, RetryPolicy};
use crate::session::{SessionKey, SessionManager};
use glint_common::{util, Error, GlintConfig, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Fallback source language when the caller does not name one.
const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Per-call options: executor overrides plus session options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(flatten)]
    pub session: SessionOptions,
}

/// Which session verb an operation drives.
#[derive(Debug, Clone, Copy)]
enum Verb {
    Prompt,
    Write,
    Rewrite,
    Summarize,
    Translate,
}

/// One engine per consumer context; owns that context's sessions.
pub struct AssistantEngine {
    manager: Arc<SessionManager>,
    executor: OperationExecutor,
    policy: RetryPolicy,
    min_input_chars: usize,
    max_input_chars: usize,
}

impl AssistantEngine {
    pub fn new(capability: Arc<dyn InferenceCapability>, config: &GlintConfig) -> Self {
        let manager = Arc::new(SessionManager::new(capability, config));
        Self {
            executor: OperationExecutor::new(Arc::clone(&manager)),
            manager,
            policy: RetryPolicy::from_config(config),
            min_input_chars: config.min_input_chars,
            max_input_chars: config.max_input_chars,
        }
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Destroy every session this engine owns.
    pub async fn shutdown(&self) {
        self.manager.destroy_all().await;
    }

    /// Review a code snippet for bugs, risks, and style issues.
    pub async fn review_code(
        &self,
        code: &str,
        options: &OperationOptions,
    ) -> Result<OperationResult> {
        let code = self.prepare_input("code", code)?;
        let prompt = format!(
            "Review the following code. Point out bugs, risky constructs, and \
             style issues, and suggest concrete improvements:\n\n{code}"
        );
        self.run(
            "review",
            SessionKey::of(SessionKind::Prompt),
            options,
            prompt,
            Verb::Prompt,
        )
        .await
    }

    /// Generate developer documentation for a code snippet.
    pub async fn generate_docs(
        &self,
        code: &str,
        options: &OperationOptions,
    ) -> Result<OperationResult> {
        let code = self.prepare_input("code", code)?;
        let task = format!(
            "Write developer documentation for the following code. Cover its \
             purpose, parameters, return values, and a short usage example:\n\n{code}"
        );
        self.run(
            "docs",
            SessionKey::of(SessionKind::Writer),
            options,
            task,
            Verb::Write,
        )
        .await
    }

    /// Suggest a refactored version of a code snippet.
    pub async fn refactor_code(
        &self,
        code: &str,
        options: &OperationOptions,
    ) -> Result<OperationResult> {
        let code = self.prepare_input("code", code)?;
        self.run(
            "refactor",
            SessionKey::of(SessionKind::Rewriter),
            options,
            code,
            Verb::Rewrite,
        )
        .await
    }

    /// Summarize pull-request content (diff plus description).
    pub async fn summarize_pr(
        &self,
        content: &str,
        options: &OperationOptions,
    ) -> Result<OperationResult> {
        let content = self.prepare_input("content", content)?;
        self.run(
            "summary",
            SessionKey::of(SessionKind::Summarizer),
            options,
            content,
            Verb::Summarize,
        )
        .await
    }

    /// Translate a code comment into `target_language`.
    pub async fn translate_comment(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        options: &OperationOptions,
    ) -> Result<OperationResult> {
        let target = target_language.trim();
        if target.is_empty() {
            return Err(Error::invalid_input("target language is required"));
        }
        let source = source_language
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SOURCE_LANGUAGE);
        let text = self.prepare_input("text", text)?;
        self.run(
            "translation",
            SessionKey::translator(source, target),
            options,
            text,
            Verb::Translate,
        )
        .await
    }

    async fn run(
        &self,
        operation: &'static str,
        key: SessionKey,
        options: &OperationOptions,
        input: String,
        verb: Verb,
    ) -> Result<OperationResult> {
        let policy = self.policy_for(options);
        let input: Arc<str> = Arc::from(input);
        self.executor
            .run(operation, &key, &options.session, &policy, move |session| {
                let input = Arc::clone(&input);
                async move {
                    match verb {
                        Verb::Prompt => session.prompt(&input).await,
                        Verb::Write => session.write(&input).await,
                        Verb::Rewrite => session.rewrite(&input).await,
                        Verb::Summarize => session.summarize(&input).await,
                        Verb::Translate => session.translate(&input).await,
                    }
                }
            })
            .await
    }

    fn policy_for(&self, options: &OperationOptions) -> RetryPolicy {
        let mut policy = self.policy.clone();
        if let Some(max_retries) = options.max_retries {
            policy.max_retries = max_retries;
        }
        if let Some(timeout_ms) = options.timeout_ms {
            policy.timeout = Duration::from_millis(timeout_ms);
        }
        policy
    }

    /// Reject too-short input before any session work; truncate long
    /// input to bound prompt-construction cost and inference latency.
    fn prepare_input(&self, what: &'static str, text: &str) -> Result<String> {
        let trimmed = text.trim();
        let count = util::char_count(trimmed);
        if count < self.min_input_chars {
            return Err(Error::invalid_input(format!(
                "{what} is too short ({count} characters, minimum {})",
                self.min_input_chars
            )));
        }
        Ok(util::truncate_chars(trimmed, self.max_input_chars).to_string())
    }
}
