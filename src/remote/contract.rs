use crate::error::RemoteError;
use crate::script::ScriptDescriptor;
use async_trait::async_trait;

/// Persistence operations offered by the remote configuration service.
///
/// Descriptors crossing this boundary are always inline.
#[async_trait]
pub trait ScriptService: Send + Sync {
    async fn read(&self, id: &str) -> Result<Option<ScriptDescriptor>, RemoteError>;
    /// Create a script, returning the id the service stored it under.
    async fn create(&self, descriptor: &ScriptDescriptor) -> Result<String, RemoteError>;
    async fn update(&self, id: &str, descriptor: &ScriptDescriptor) -> Result<(), RemoteError>;
    async fn list(&self) -> Result<Vec<ScriptDescriptor>, RemoteError>;
}
