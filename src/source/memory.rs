//! In-memory source, handy for tests and embedding.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DatasetKey, FeatureSource, HostCommand};
use crate::error::FetchError;

/// Serves canned responses per key and records dispatched commands.
#[derive(Debug, Default)]
pub struct MemorySource {
    responses: Mutex<HashMap<DatasetKey, Result<String, FetchError>>>,
    commands: Mutex<Vec<HostCommand>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: DatasetKey, body: impl Into<String>) -> Self {
        self.set(key, body);
        self
    }

    /// Replace the document served for `key`.
    pub fn set(&self, key: DatasetKey, body: impl Into<String>) {
        self.responses
            .lock()
            .expect("source lock poisoned")
            .insert(key, Ok(body.into()));
    }

    /// Make every fetch of `key` fail with `code`.
    pub fn fail(&self, key: DatasetKey, code: i32, message: impl Into<String>) {
        self.responses
            .lock()
            .expect("source lock poisoned")
            .insert(key, Err(FetchError::new(key.as_str(), code, message)));
    }

    /// Commands dispatched so far.
    pub fn commands(&self) -> Vec<HostCommand> {
        self.commands.lock().expect("source lock poisoned").clone()
    }
}

#[async_trait]
impl FeatureSource for MemorySource {
    async fn fetch(&self, key: DatasetKey) -> Result<String, FetchError> {
        self.responses
            .lock()
            .expect("source lock poisoned")
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::new(key.as_str(), 404, "no document")))
    }

    async fn dispatch(&self, command: &HostCommand) -> Result<(), FetchError> {
        self.commands
            .lock()
            .expect("source lock poisoned")
            .push(command.clone());
        Ok(())
    }
}
