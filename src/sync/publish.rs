//! Publishing inline descriptors to the remote script service.

use crate::error::ScriptError;
use crate::remote::ScriptService;
use crate::script::{is_extracted, validate_descriptor, ScriptDescriptor};
use std::sync::Arc;
use tracing::{debug, info};

/// Caller-selected import behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Give each imported script a fresh id (one-shot imports only).
    pub regenerate_ids: bool,
    /// Reject scripts that fail [`validate_descriptor`] instead of publishing them.
    pub validate: bool,
}

/// Whether a publish happens as part of a one-shot import or a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    OneShot,
    Watch,
}

impl ImportOptions {
    /// Options actually applied in `mode`. Watch sessions never regenerate ids,
    /// so repeated saves converge on one remote record.
    pub fn effective(self, mode: PublishMode) -> Self {
        match mode {
            PublishMode::OneShot => self,
            PublishMode::Watch => Self {
                regenerate_ids: false,
                ..self
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Created(String),
    Updated(String),
}

impl PublishOutcome {
    pub fn id(&self) -> &str {
        match self {
            PublishOutcome::Created(id) | PublishOutcome::Updated(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, PublishOutcome::Created(_))
    }
}

/// Create-if-absent, else update, keyed by id.
#[derive(Clone)]
pub struct Publisher {
    service: Arc<dyn ScriptService>,
}

impl Publisher {
    pub fn new(service: Arc<dyn ScriptService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<dyn ScriptService> {
        &self.service
    }

    pub async fn publish(
        &self,
        mut descriptor: ScriptDescriptor,
        options: ImportOptions,
        mode: PublishMode,
    ) -> Result<PublishOutcome, ScriptError> {
        let options = options.effective(mode);

        if is_extracted(&descriptor) {
            return Err(ScriptError::NotInline {
                name: descriptor.name,
            });
        }
        if options.validate {
            validate_descriptor(&descriptor)?;
        }

        if options.regenerate_ids {
            let previous = std::mem::replace(&mut descriptor.id, uuid::Uuid::new_v4().to_string());
            info!(script = %descriptor.name, previous = %previous, id = %descriptor.id, "Regenerated script id");
            let id = self.service.create(&descriptor).await?;
            return Ok(PublishOutcome::Created(id));
        }

        if descriptor.id.is_empty() {
            return self.publish_unpinned(descriptor).await;
        }

        let id = descriptor.id.clone();
        if self.service.read(&id).await?.is_some() {
            self.service.update(&id, &descriptor).await?;
            debug!(script = %descriptor.name, id = %id, "Updated script");
            Ok(PublishOutcome::Updated(id))
        } else {
            let created = self.service.create(&descriptor).await?;
            debug!(script = %descriptor.name, id = %created, "Created script");
            Ok(PublishOutcome::Created(created))
        }
    }

    /// No pinned id: the "first entry" of the remote listing is taken to be the
    /// first script carrying the same name. With no match a new script is created.
    async fn publish_unpinned(
        &self,
        mut descriptor: ScriptDescriptor,
    ) -> Result<PublishOutcome, ScriptError> {
        let existing = self
            .service
            .list()
            .await?
            .into_iter()
            .find(|remote| remote.name == descriptor.name);

        match existing {
            Some(remote) => {
                descriptor.id = remote.id.clone();
                self.service.update(&remote.id, &descriptor).await?;
                Ok(PublishOutcome::Updated(remote.id))
            }
            None => Ok(PublishOutcome::Created(
                self.service.create(&descriptor).await?,
            )),
        }
    }
}
