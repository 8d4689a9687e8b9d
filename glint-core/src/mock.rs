//! Scriptable capability double used across the core's tests.

use crate::capability::{
    Availability, InferenceCapability, InferenceSession, SessionKind, SessionOptions,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted reply for one inference call.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Stays pending far beyond any test bound; the caller's timeout fires.
    Hang,
}

pub struct MockCapability {
    supported: Mutex<Vec<SessionKind>>,
    availability: Mutex<Availability>,
    availability_error: Mutex<Option<String>>,
    availability_hangs: AtomicBool,
    fail_next_creations: AtomicUsize,
    create_delay: Mutex<Option<Duration>>,
    fail_destroy: AtomicBool,
    created: AtomicUsize,
    destroyed: Arc<AtomicUsize>,
    script: Arc<Mutex<VecDeque<Reply>>>,
    inputs: Arc<Mutex<Vec<String>>>,
    last_options: Mutex<Option<SessionOptions>>,
}

impl MockCapability {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            supported: Mutex::new(SessionKind::ALL.to_vec()),
            availability: Mutex::new(Availability::Readily),
            availability_error: Mutex::new(None),
            availability_hangs: AtomicBool::new(false),
            fail_next_creations: AtomicUsize::new(0),
            create_delay: Mutex::new(None),
            fail_destroy: AtomicBool::new(false),
            created: AtomicUsize::new(0),
            destroyed: Arc::new(AtomicUsize::new(0)),
            script: Arc::new(Mutex::new(VecDeque::new())),
            inputs: Arc::new(Mutex::new(Vec::new())),
            last_options: Mutex::new(None),
        })
    }

    pub fn absent() -> Arc<Self> {
        let mock = Self::new();
        mock.set_supported(&[]);
        mock
    }

    pub fn set_supported(&self, kinds: &[SessionKind]) {
        *self.supported.lock().unwrap() = kinds.to_vec();
    }

    pub fn set_availability(&self, availability: Availability) {
        *self.availability.lock().unwrap() = availability;
    }

    pub fn set_availability_error(&self, message: &str) {
        *self.availability_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_availability_hangs(&self) {
        self.availability_hangs.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_creations(&self, count: usize) {
        self.fail_next_creations.store(count, Ordering::SeqCst);
    }

    pub fn remaining_creation_failures(&self) -> usize {
        self.fail_next_creations.load(Ordering::SeqCst)
    }

    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_fail_destroy(&self) {
        self.fail_destroy.store(true, Ordering::SeqCst);
    }

    pub fn push_reply(&self, reply: Reply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<SessionOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

struct MockSession {
    script: Arc<Mutex<VecDeque<Reply>>>,
    inputs: Arc<Mutex<Vec<String>>>,
    destroyed: Arc<AtomicUsize>,
    fail_destroy: bool,
}

impl MockSession {
    async fn reply(&self, input: &str) -> anyhow::Result<String> {
        self.inputs.lock().unwrap().push(input.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            None => Ok(format!("ok: {input}")),
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!(message)),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(7 * 86_400)).await;
                anyhow::bail!("hang elapsed")
            }
        }
    }
}

#[async_trait]
impl InferenceSession for MockSession {
    async fn prompt(&self, input: &str) -> anyhow::Result<String> {
        self.reply(input).await
    }

    async fn write(&self, input: &str) -> anyhow::Result<String> {
        self.reply(input).await
    }

    async fn rewrite(&self, input: &str) -> anyhow::Result<String> {
        self.reply(input).await
    }

    async fn summarize(&self, input: &str) -> anyhow::Result<String> {
        self.reply(input).await
    }

    async fn translate(&self, input: &str) -> anyhow::Result<String> {
        self.reply(input).await
    }

    async fn destroy(&self) -> anyhow::Result<()> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        if self.fail_destroy {
            anyhow::bail!("handle already defunct")
        }
        Ok(())
    }
}

#[async_trait]
impl InferenceCapability for MockCapability {
    fn supports(&self, kind: SessionKind) -> bool {
        self.supported.lock().unwrap().contains(&kind)
    }

    async fn availability(&self, _kind: SessionKind) -> anyhow::Result<Availability> {
        if self.availability_hangs.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(7 * 86_400)).await;
        }
        if let Some(message) = self.availability_error.lock().unwrap().clone() {
            anyhow::bail!(message)
        }
        Ok(*self.availability.lock().unwrap())
    }

    async fn create(
        &self,
        _kind: SessionKind,
        options: &SessionOptions,
    ) -> anyhow::Result<Arc<dyn InferenceSession>> {
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let remaining = self.fail_next_creations.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_creations.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("model not ready")
        }

        *self.last_options.lock().unwrap() = Some(options.clone());
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockSession {
            script: Arc::clone(&self.script),
            inputs: Arc::clone(&self.inputs),
            destroyed: Arc::clone(&self.destroyed),
            fail_destroy: self.fail_destroy.load(Ordering::SeqCst),
        }))
    }
}
