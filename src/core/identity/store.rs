// src/core/identity/store.rs
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{BiometricTemplate, Identity, Role};
use crate::utils::error::IdentityError;

#[derive(Debug, Clone)]
struct PendingRestore {
    original_hash: String,
    due: Instant,
}

#[derive(Debug)]
struct StoredIdentity {
    identity: Identity,
    pending_restore: Option<PendingRestore>,
}

impl StoredIdentity {
    /// Applies a scheduled hash restore whose deadline has passed.
    fn settle(&mut self, now: Instant) {
        let due = matches!(&self.pending_restore, Some(pending) if pending.due <= now);
        if !due {
            return;
        }

        if let Some(pending) = self.pending_restore.take() {
            if let Some(template) = self.identity.template.as_mut() {
                template.data_hash = pending.original_hash;
                debug!(identity_id = %self.identity.id, "Template hash restored");
            }
        }
    }
}

/// In-memory registry of identities and their enrolled templates.
#[derive(Default)]
pub struct TemplateStore {
    identities: RwLock<HashMap<Uuid, StoredIdentity>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, username: &str, role: Role) -> Result<Identity, IdentityError> {
        let mut identities = self.identities.write().await;
        if identities.values().any(|stored| stored.identity.username == username) {
            return Err(IdentityError::DuplicateUsername(username.to_string()));
        }

        let identity = Identity::new(username, role);
        identities.insert(identity.id, StoredIdentity {
            identity: identity.clone(),
            pending_restore: None,
        });

        info!(identity_id = %identity.id, username, "Identity stored");
        Ok(identity)
    }

    /// Replaces the identity's template and marks it enrolled.
    pub async fn attach_template(
        &self,
        id: Uuid,
        template: BiometricTemplate,
    ) -> Result<Identity, IdentityError> {
        let mut identities = self.identities.write().await;
        let stored = identities
            .get_mut(&id)
            .ok_or_else(|| IdentityError::IdentityNotFound(id.to_string()))?;

        stored.pending_restore = None;
        stored.identity.attach_template(template);
        Ok(stored.identity.clone())
    }

    /// Snapshot of an identity, taken after any due restore has been applied.
    pub async fn get(&self, id: Uuid) -> Option<Identity> {
        let now = Instant::now();
        let mut identities = self.identities.write().await;
        identities.get_mut(&id).map(|stored| {
            stored.settle(now);
            stored.identity.clone()
        })
    }

    pub async fn find_by_username(&self, username: &str) -> Option<Identity> {
        let now = Instant::now();
        let mut identities = self.identities.write().await;
        identities
            .values_mut()
            .find(|stored| stored.identity.username == username)
            .map(|stored| {
                stored.settle(now);
                stored.identity.clone()
            })
    }

    pub async fn list(&self) -> Vec<Identity> {
        let now = Instant::now();
        let mut identities = self.identities.write().await;
        let mut all: Vec<Identity> = identities
            .values_mut()
            .map(|stored| {
                stored.settle(now);
                stored.identity.clone()
            })
            .collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        all
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }

    /// Overwrites the stored template hash out-of-band and schedules the
    /// original to be put back once `revert_after` has elapsed.
    ///
    /// Returns the hash that will be restored.
    pub async fn corrupt_hash(
        &self,
        id: Uuid,
        corrupted: &str,
        revert_after: Duration,
    ) -> Result<String, IdentityError> {
        let now = Instant::now();
        let mut identities = self.identities.write().await;
        let stored = identities
            .get_mut(&id)
            .ok_or_else(|| IdentityError::IdentityNotFound(id.to_string()))?;
        stored.settle(now);

        let template = stored
            .identity
            .template
            .as_mut()
            .ok_or_else(|| IdentityError::IdentityNotFound(format!("{} has no template", id)))?;

        // A second corruption before the revert keeps the genuine hash.
        let original_hash = match &stored.pending_restore {
            Some(pending) => pending.original_hash.clone(),
            None => template.data_hash.clone(),
        };
        template.data_hash = corrupted.to_string();
        stored.pending_restore = Some(PendingRestore {
            original_hash: original_hash.clone(),
            due: now + revert_after,
        });

        Ok(original_hash)
    }

    pub async fn has_pending_restore(&self, id: Uuid) -> bool {
        let now = Instant::now();
        let mut identities = self.identities.write().await;
        match identities.get_mut(&id) {
            Some(stored) => {
                stored.settle(now);
                stored.pending_restore.is_some()
            }
            None => false,
        }
    }
}
