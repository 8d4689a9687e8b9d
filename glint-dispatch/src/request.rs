//! Inbound operation requests and the uniform response envelopes.
//!
//! Requests arrive from UI surfaces discriminated by an `action` tag;
//! every response is `{ success: true, <result field> }` or
//! `{ success: false, error }`.

use glint_common::Error;
use glint_core::{Capabilities, OperationOptions, OperationResult};
use serde::{Deserialize, Serialize};

/// An operation request from a UI surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum OperationRequest {
    CheckCapabilities,
    #[serde(rename_all = "camelCase")]
    ReviewCode {
        code: String,
        #[serde(default)]
        options: OperationOptions,
    },
    #[serde(rename_all = "camelCase")]
    GenerateDocs {
        code: String,
        #[serde(default)]
        options: OperationOptions,
    },
    #[serde(rename_all = "camelCase")]
    RefactorCode {
        code: String,
        #[serde(default)]
        options: OperationOptions,
    },
    #[serde(rename = "summarizePR", rename_all = "camelCase")]
    SummarizePr {
        content: String,
        #[serde(default)]
        options: OperationOptions,
    },
    #[serde(rename_all = "camelCase")]
    TranslateComment {
        text: String,
        target_language: String,
        #[serde(default)]
        source_language: Option<String>,
        #[serde(default)]
        options: OperationOptions,
    },
}

impl OperationRequest {
    /// Action tag, for logging.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::CheckCapabilities => "checkCapabilities",
            Self::ReviewCode { .. } => "reviewCode",
            Self::GenerateDocs { .. } => "generateDocs",
            Self::RefactorCode { .. } => "refactorCode",
            Self::SummarizePr { .. } => "summarizePR",
            Self::TranslateComment { .. } => "translateComment",
        }
    }
}

/// Uniform response envelope returned to UI surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OperationResponse {
    Capabilities {
        success: bool,
        capabilities: Capabilities,
    },
    Review {
        success: bool,
        review: String,
        attempts: u32,
    },
    Docs {
        success: bool,
        documentation: String,
        attempts: u32,
    },
    Refactor {
        success: bool,
        refactor: String,
        attempts: u32,
    },
    Summary {
        success: bool,
        summary: String,
        attempts: u32,
    },
    Translation {
        success: bool,
        translation: String,
        attempts: u32,
    },
    Failure { success: bool, error: String },
}

impl OperationResponse {
    pub fn capabilities(capabilities: Capabilities) -> Self {
        Self::Capabilities {
            success: true,
            capabilities,
        }
    }

    pub fn review(result: OperationResult) -> Self {
        Self::Review {
            success: true,
            review: result.raw,
            attempts: result.attempts,
        }
    }

    pub fn docs(result: OperationResult) -> Self {
        Self::Docs {
            success: true,
            documentation: result.raw,
            attempts: result.attempts,
        }
    }

    pub fn refactor(result: OperationResult) -> Self {
        Self::Refactor {
            success: true,
            refactor: result.raw,
            attempts: result.attempts,
        }
    }

    pub fn summary(result: OperationResult) -> Self {
        Self::Summary {
            success: true,
            summary: result.raw,
            attempts: result.attempts,
        }
    }

    pub fn translation(result: OperationResult) -> Self {
        Self::Translation {
            success: true,
            translation: result.raw,
            attempts: result.attempts,
        }
    }

    /// Translate a component error into the failure envelope, with the
    /// suggested remedy appended when one applies.
    pub fn failure(error: &Error) -> Self {
        Self::Failure {
            success: false,
            error: error.user_message(),
        }
    }

    pub fn failure_message(message: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: message.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failure { .. })
    }
}
