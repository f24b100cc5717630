use super::contract::ScriptService;
use crate::error::RemoteError;
use crate::script::ScriptDescriptor;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// A write observed by [`InMemoryScriptService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Create(String),
    Update(String),
}

/// Process-local script service. Backs `--dry-run` and the test suite.
#[derive(Default)]
pub struct InMemoryScriptService {
    scripts: RwLock<BTreeMap<String, ScriptDescriptor>>,
    calls: RwLock<Vec<RemoteCall>>,
}

impl InMemoryScriptService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate without recording a call.
    pub fn seed(&self, descriptor: ScriptDescriptor) {
        self.scripts.write().insert(descriptor.id.clone(), descriptor);
    }

    pub fn get(&self, id: &str) -> Option<ScriptDescriptor> {
        self.scripts.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.scripts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.read().is_empty()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.read().clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| matches!(c, RemoteCall::Create(_)))
            .count()
    }

    pub fn update_count(&self) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| matches!(c, RemoteCall::Update(_)))
            .count()
    }
}

#[async_trait]
impl ScriptService for InMemoryScriptService {
    async fn read(&self, id: &str) -> Result<Option<ScriptDescriptor>, RemoteError> {
        Ok(self.get(id))
    }

    async fn create(&self, descriptor: &ScriptDescriptor) -> Result<String, RemoteError> {
        let mut stored = descriptor.clone();
        if stored.id.is_empty() {
            stored.id = uuid::Uuid::new_v4().to_string();
        }
        let id = stored.id.clone();

        let mut scripts = self.scripts.write();
        if scripts.contains_key(&id) {
            return Err(RemoteError::Conflict(id));
        }
        scripts.insert(id.clone(), stored);
        self.calls.write().push(RemoteCall::Create(id.clone()));
        Ok(id)
    }

    async fn update(&self, id: &str, descriptor: &ScriptDescriptor) -> Result<(), RemoteError> {
        let mut scripts = self.scripts.write();
        let slot = scripts
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        let mut stored = descriptor.clone();
        stored.id = id.to_string();
        *slot = stored;
        self.calls.write().push(RemoteCall::Update(id.to_string()));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ScriptDescriptor>, RemoteError> {
        Ok(self.scripts.read().values().cloned().collect())
    }
}
