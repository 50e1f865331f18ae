use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ImageStore, KeyValueStore};
use crate::{error::Result, models::StoredImage};

/// Image store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: RwLock<HashMap<String, StoredImage>>,
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, image: &StoredImage) -> Result<()> {
        self.images
            .write()
            .await
            .insert(image.id.clone(), image.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredImage>> {
        Ok(self.images.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.images.write().await.remove(id);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<StoredImage>> {
        Ok(self.images.read().await.values().cloned().collect())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.images.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.images.write().await.clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
