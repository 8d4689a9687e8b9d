//! Glint Core - session lifecycle and operation orchestration over an
//! on-device inference capability.
//!
//! The host environment injects an [`InferenceCapability`]; Glint owns
//! everything above it:
//! - probing which session kinds are actually usable
//! - lazy, deduplicated session creation and explicit teardown
//! - bounded, retried execution of the user-facing operations

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod capability;
pub mod executor;
pub mod ops;
pub mod probe;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use capability::{
    Availability, InferenceCapability, InferenceSession, SessionKind, SessionOptions,
};
pub use executor::{OperationExecutor, OperationResult, RetryPolicy};
pub use ops::{AssistantEngine, OperationOptions};
pub use probe::{Capabilities, CapabilityProber, ProbeStatus};
pub use session::{SessionKey, SessionManager};
