//! Secret Service backend over the session bus.
//!
//! Thin glue around the `secret-service` client crate. The session is opened
//! once at connect time and kept for the store's whole lifetime; the selected
//! collection is re-resolved from the live service handle on every operation,
//! so the fresh handles the service hands out after an unlock are always the
//! ones in use. Dropping the store closes the session.

use secret_service::{Collection, EncryptionType, SecretService};
use zeroize::Zeroizing;

use super::{CollectionSelection, SecretEntry, SecretStore, StoreError};
use crate::account::AccountKey;

fn op_err(error: secret_service::Error) -> StoreError {
    StoreError::Operation(error.to_string())
}

/// The real Secret Service, bound to one collection.
pub struct DbusSecretStore {
    service: SecretService<'static>,
    selection: CollectionSelection,
}

impl DbusSecretStore {
    /// Open a session with the service and resolve the configured collection.
    ///
    /// Fails with [`StoreError::ServiceUnavailable`] when the session bus is
    /// not running, and [`StoreError::CollectionNotFound`] when a configured
    /// label matches no collection, so both surface at plugin activation.
    pub async fn connect(selection: CollectionSelection) -> Result<Self, StoreError> {
        let service = SecretService::connect(EncryptionType::Dh)
            .await
            .map_err(|error| StoreError::ServiceUnavailable(error.to_string()))?;
        let store = Self { service, selection };
        store.collection().await?;
        Ok(store)
    }

    /// Resolve the selected collection from the live service handle.
    async fn collection(&self) -> Result<Collection<'_>, StoreError> {
        match &self.selection {
            CollectionSelection::Default => self
                .service
                .get_default_collection()
                .await
                .map_err(op_err),
            CollectionSelection::Labeled(name) => {
                let collections = self.service.get_all_collections().await.map_err(op_err)?;
                for collection in collections {
                    let label = collection.get_label().await.map_err(op_err)?;
                    if label == *name {
                        return Ok(collection);
                    }
                }
                Err(StoreError::CollectionNotFound(name.clone()))
            }
        }
    }
}

impl SecretStore for DbusSecretStore {
    async fn is_locked(&self) -> Result<bool, StoreError> {
        let collection = self.collection().await?;
        collection.is_locked().await.map_err(op_err)
    }

    async fn ensure_unlocked(&self) -> Result<bool, StoreError> {
        let collection = self.collection().await?;
        if !collection.is_locked().await.map_err(op_err)? {
            return Ok(false);
        }
        collection.unlock().await.map_err(op_err)?;
        Ok(true)
    }

    async fn ensure_locked(&self) -> Result<bool, StoreError> {
        let collection = self.collection().await?;
        if collection.is_locked().await.map_err(op_err)? {
            return Ok(false);
        }
        collection.lock().await.map_err(op_err)?;
        Ok(true)
    }

    async fn store_secret(
        &self,
        key: &AccountKey,
        label: &str,
        secret: &str,
    ) -> Result<(), StoreError> {
        let collection = self.collection().await?;
        collection
            .create_item(label, key.attributes(), secret.as_bytes(), true, "text/plain")
            .await
            .map_err(op_err)?;
        Ok(())
    }

    async fn search_secrets(
        &self,
        key: &AccountKey,
        load_secrets: bool,
    ) -> Result<Vec<SecretEntry>, StoreError> {
        let collection = self.collection().await?;
        let items = collection.search_items(key.attributes()).await.map_err(op_err)?;
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let label = item.get_label().await.map_err(op_err)?;
            let created = item.get_created().await.map_err(op_err)?;
            let secret = if load_secrets {
                let bytes = Zeroizing::new(item.get_secret().await.map_err(op_err)?);
                Some(Zeroizing::new(
                    String::from_utf8_lossy(&bytes).into_owned(),
                ))
            } else {
                None
            };
            entries.push(SecretEntry {
                label,
                secret,
                created,
            });
        }
        Ok(entries)
    }

    async fn delete_secrets(&self, key: &AccountKey) -> Result<usize, StoreError> {
        let collection = self.collection().await?;
        let items = collection.search_items(key.attributes()).await.map_err(op_err)?;
        let mut removed = 0;
        for item in items {
            item.delete().await.map_err(op_err)?;
            removed += 1;
        }
        Ok(removed)
    }
}
