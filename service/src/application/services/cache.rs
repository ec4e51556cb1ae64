//! Resource cache over a scoped backend session.
//!
//! Records are stored as JSON under `ociaction:vm:<normalized name>`. A
//! `ResourceCache` owns one session for the duration of an operation; the
//! backend connection is released when it is dropped, on every path.

use ociaction_common::{Resource, namespace_pattern, resource_key};

use crate::application::ports::{CacheBackend, CacheSession};
use crate::domain::CacheError;

pub struct ResourceCache {
    session: Box<dyn CacheSession>,
}

impl ResourceCache {
    /// Open a session on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connect`] if the backend cannot be reached.
    pub async fn connect(backend: &dyn CacheBackend) -> Result<Self, CacheError> {
        Ok(Self {
            session: backend.connect().await?,
        })
    }

    /// Look up a record by display name. An absent key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Transport failures, or a stored value that is not a valid record.
    pub async fn get(&mut self, name: &str) -> Result<Option<Resource>, CacheError> {
        let key = resource_key(name);
        let Some(raw) = self.session.get(&key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Decode { key, source })
    }

    /// Write every record, keyed by display name.
    ///
    /// # Errors
    ///
    /// The first failed write aborts the batch with [`CacheError::Write`];
    /// records before it stay written.
    pub async fn set(&mut self, resources: &[Resource]) -> Result<(), CacheError> {
        for resource in resources {
            let key = resource_key(&resource.display_name);
            let value = encode(&key, resource)?;
            if let Err(err) = self.session.set(&key, &value).await {
                return Err(CacheError::Write {
                    key,
                    reason: err.to_string(),
                });
            }
            tracing::debug!(%key, "record written");
        }
        Ok(())
    }

    /// Overwrite a record only if its key still exists. Returns whether it
    /// was written; a concurrently flushed key is not resurrected.
    ///
    /// # Errors
    ///
    /// Transport or encoding failures.
    pub async fn update(&mut self, resource: &Resource) -> Result<bool, CacheError> {
        let key = resource_key(&resource.display_name);
        let value = encode(&key, resource)?;
        let written = self.session.set_if_exists(&key, &value).await?;
        if !written {
            tracing::debug!(%key, "record vanished before update, skipped");
        }
        Ok(written)
    }

    /// Remove one record. Deleting an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Transport failures.
    pub async fn delete(&mut self, name: &str) -> Result<bool, CacheError> {
        let key = resource_key(name);
        let removed = self.session.delete(&key).await?;
        tracing::debug!(%key, removed, "record deleted");
        Ok(removed)
    }

    /// Remove every key this service owns. Other keys in the same backend
    /// are left alone.
    ///
    /// # Errors
    ///
    /// Transport failures.
    pub async fn flush_all(&mut self) -> Result<usize, CacheError> {
        self.session.delete_matching(&namespace_pattern()).await
    }
}

fn encode(key: &str, resource: &Resource) -> Result<String, CacheError> {
    serde_json::to_string(resource).map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })
}
