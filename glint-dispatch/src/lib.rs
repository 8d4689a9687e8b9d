//! Glint Dispatch - routes operation requests from UI surfaces to
//! per-context engines.
//!
//! Each consumer context (one browser tab) maps to exactly one engine
//! and therefore one set of sessions; contexts are registered on first
//! request and reclaimed on the host's close signal or by the periodic
//! staleness sweep.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod dispatcher;
pub mod request;
pub mod store;

pub use dispatcher::Dispatcher;
pub use request::{OperationRequest, OperationResponse};
pub use store::{MemoryStore, TransientStore, LAST_RESULT_KEY, PENDING_CODE_KEY};
