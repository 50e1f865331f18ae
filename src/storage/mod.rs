//! Player vault: full image records in an [`ImageStore`] plus a derived metadata index and the
//! single guess grid in a [`KeyValueStore`].
//!
//! The metadata index is a cache of the image store. Whenever its size disagrees with the image
//! store's key set it is rebuilt from the image store.

pub mod memory;
pub mod redis_kv;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;

use crate::{
    constants::{METADATA_INDEX_KEY, SINGLE_GUESS_KEY},
    error::Result,
    models::{GuessGrid, ImageMetadata, StoredImage},
};

pub use memory::{MemoryImageStore, MemoryKeyValueStore};
pub use redis_kv::RedisKeyValueStore;

/// Source of truth for generated images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, image: &StoredImage) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<StoredImage>>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<StoredImage>>;
    async fn keys(&self) -> Result<Vec<String>>;
    async fn clear(&self) -> Result<()>;
}

/// String items under fixed keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

pub struct GameStore<I, K> {
    images: I,
    items: K,
}

impl<I: ImageStore, K: KeyValueStore> GameStore<I, K> {
    pub fn new(images: I, items: K) -> Self {
        Self { images, items }
    }

    /// Writes the full record, then upserts its entry in the metadata index.
    pub async fn save_image(&self, image: &StoredImage) -> Result<String> {
        self.images.put(image).await?;

        let mut metadata: Vec<ImageMetadata> = self
            .read_metadata()
            .await
            .into_iter()
            .filter(|m| m.id != image.id)
            .collect();
        metadata.push(image.metadata());
        self.write_metadata(metadata).await?;

        tracing::debug!("Saved image {}", image.id);
        Ok(image.id.clone())
    }

    pub async fn get_image(&self, id: &str) -> Option<StoredImage> {
        match self.images.get(id).await {
            Ok(image) => image,
            Err(e) => {
                tracing::error!("Error retrieving image {}: {}", id, e);
                None
            }
        }
    }

    /// Metadata for every stored image, newest first.
    pub async fn list_images(&self) -> Vec<ImageMetadata> {
        let metadata = self.read_metadata().await;
        if metadata.is_empty() {
            return self.resync().await;
        }

        match self.images.keys().await {
            Ok(keys) => {
                let store_ids: HashSet<String> = keys.into_iter().collect();
                let index_ids: HashSet<&str> = metadata.iter().map(|m| m.id.as_str()).collect();
                if store_ids.len() != index_ids.len() {
                    tracing::info!(
                        "Metadata index out of sync ({} indexed, {} stored); rebuilding",
                        index_ids.len(),
                        store_ids.len()
                    );
                    return self.resync().await;
                }
            }
            Err(e) => tracing::warn!("Could not verify metadata against image store: {}", e),
        }

        metadata
    }

    /// Rebuilds the metadata index from the image store.
    pub async fn sync_metadata(&self) -> Result<()> {
        let images = self.images.get_all().await?;
        if images.is_empty() {
            self.items.remove_item(METADATA_INDEX_KEY).await?;
            return Ok(());
        }
        self.write_metadata(images.iter().map(StoredImage::metadata).collect())
            .await
    }

    pub async fn delete_image(&self, id: &str) -> Result<()> {
        self.images.delete(id).await?;

        let metadata: Vec<ImageMetadata> = self
            .read_metadata()
            .await
            .into_iter()
            .filter(|m| m.id != id)
            .collect();
        self.write_metadata(metadata).await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.images.clear().await?;
        self.items.remove_item(METADATA_INDEX_KEY).await
    }

    /// Overwrites the single stored guess with a normalized copy of `guesses`.
    pub async fn save_guess(&self, guesses: &[Option<String>]) -> Result<GuessGrid> {
        let grid = GuessGrid::normalized(guesses, Utc::now());
        let encoded = serde_json::to_string(&grid)?;
        self.items.set_item(SINGLE_GUESS_KEY, &encoded).await?;
        Ok(grid)
    }

    pub async fn get_guess(&self) -> Option<GuessGrid> {
        let stored = match self.items.get_item(SINGLE_GUESS_KEY).await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::error!("Error retrieving guess: {}", e);
                return None;
            }
        };
        serde_json::from_str(&stored)
            .map_err(|e| tracing::warn!("Stored guess is unreadable: {}", e))
            .ok()
    }

    async fn resync(&self) -> Vec<ImageMetadata> {
        if let Err(e) = self.sync_metadata().await {
            tracing::error!("Error syncing metadata from image store: {}", e);
            return Vec::new();
        }
        self.read_metadata().await
    }

    async fn read_metadata(&self) -> Vec<ImageMetadata> {
        match self.items.get_item(METADATA_INDEX_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("Error reading metadata index: {}", e);
                Vec::new()
            }
        }
    }

    async fn write_metadata(&self, mut metadata: Vec<ImageMetadata>) -> Result<()> {
        metadata.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let encoded = serde_json::to_string(&metadata)?;
        self.items.set_item(METADATA_INDEX_KEY, &encoded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::selection::Selection;
    use chrono::{Duration, TimeZone};

    fn store() -> GameStore<MemoryImageStore, MemoryKeyValueStore> {
        GameStore::new(MemoryImageStore::default(), MemoryKeyValueStore::default())
    }

    fn image(idx: &str, offset_secs: i64) -> StoredImage {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(offset_secs);
        StoredImage::new(
            format!("base64-{idx}"),
            &Selection::parse(idx).unwrap(),
            at,
        )
    }

    #[tokio::test]
    async fn save_then_get_returns_same_record() {
        let store = store();
        let original = image("1,2", 0);
        let id = store.save_image(&original).await.unwrap();

        assert_eq!(store.get_image(&id).await, Some(original.clone()));
        assert_eq!(store.list_images().await, vec![original.metadata()]);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = store();
        store.save_image(&image("1,2", 0)).await.unwrap();
        store.save_image(&image("3,4,5", 60)).await.unwrap();
        store.save_image(&image("6,7", 30)).await.unwrap();

        let listed: Vec<Vec<u8>> = store
            .list_images()
            .await
            .into_iter()
            .map(|m| m.indices)
            .collect();
        assert_eq!(listed, vec![vec![3, 4, 5], vec![6, 7], vec![1, 2]]);
    }

    #[tokio::test]
    async fn saving_same_id_twice_keeps_one_entry() {
        let store = store();
        let record = image("1,2", 0);
        store.save_image(&record).await.unwrap();
        store.save_image(&record).await.unwrap();
        assert_eq!(store.list_images().await.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_from_list_and_fetch() {
        let store = store();
        let keep = image("1,2", 0);
        let gone = image("3,4", 10);
        store.save_image(&keep).await.unwrap();
        store.save_image(&gone).await.unwrap();

        store.delete_image(&gone.id).await.unwrap();

        assert_eq!(store.get_image(&gone.id).await, None);
        assert_eq!(store.list_images().await, vec![keep.metadata()]);
    }

    #[tokio::test]
    async fn cleared_index_is_rebuilt_from_image_store() {
        let store = store();
        store.save_image(&image("1,2", 0)).await.unwrap();
        store.save_image(&image("3,4", 10)).await.unwrap();
        store.items.remove_item(METADATA_INDEX_KEY).await.unwrap();

        assert_eq!(store.list_images().await.len(), 2);
    }

    #[tokio::test]
    async fn size_mismatch_triggers_rebuild() {
        let store = store();
        let first = image("1,2", 0);
        store.save_image(&first).await.unwrap();
        // written behind the index's back
        store.images.put(&image("8,9", 20)).await.unwrap();

        let listed = store.list_images().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1], first.metadata());
    }

    #[tokio::test]
    async fn stale_index_entries_are_dropped_on_rebuild() {
        let store = store();
        let first = image("1,2", 0);
        let second = image("3,4", 10);
        store.save_image(&first).await.unwrap();
        store.save_image(&second).await.unwrap();
        store.images.delete(&second.id).await.unwrap();

        assert_eq!(store.list_images().await, vec![first.metadata()]);
    }

    #[tokio::test]
    async fn corrupt_index_is_treated_as_empty() {
        let store = store();
        store.save_image(&image("1,2", 0)).await.unwrap();
        store
            .items
            .set_item(METADATA_INDEX_KEY, "{not json")
            .await
            .unwrap();

        assert_eq!(store.list_images().await.len(), 1);
    }

    #[tokio::test]
    async fn empty_store_removes_index_on_sync() {
        let store = store();
        store.items.set_item(METADATA_INDEX_KEY, "[]").await.unwrap();
        store.sync_metadata().await.unwrap();
        assert_eq!(store.items.get_item(METADATA_INDEX_KEY).await.unwrap(), None);
        assert!(store.list_images().await.is_empty());
    }

    #[tokio::test]
    async fn clear_all_empties_both_stores() {
        let store = store();
        let record = image("1,2", 0);
        store.save_image(&record).await.unwrap();
        store.clear_all().await.unwrap();

        assert!(store.list_images().await.is_empty());
        assert_eq!(store.get_image(&record.id).await, None);
    }

    #[tokio::test]
    async fn guess_grid_round_trips_normalized() {
        let store = store();
        let mut input = vec![None; 24];
        input[0] = Some("able".to_string());
        input[3] = Some(" Zoo1 ".to_string());

        store.save_guess(&input).await.unwrap();
        let stored = store.get_guess().await.expect("guess saved");

        let mut expected = vec![None; 24];
        expected[0] = Some("able".to_string());
        expected[3] = Some("zoo".to_string());
        assert_eq!(stored.guesses, expected);
    }

    #[tokio::test]
    async fn saving_guess_overwrites_previous() {
        let store = store();
        store.save_guess(&[Some("able".to_string())]).await.unwrap();
        store.save_guess(&[None, Some("zoo".to_string())]).await.unwrap();

        let stored = store.get_guess().await.unwrap();
        assert_eq!(stored.guesses[0], None);
        assert_eq!(stored.guesses[1].as_deref(), Some("zoo"));
    }

    #[tokio::test]
    async fn missing_or_unreadable_guess_reads_as_none() {
        let store = store();
        assert!(store.get_guess().await.is_none());
        store.items.set_item(SINGLE_GUESS_KEY, "oops").await.unwrap();
        assert!(store.get_guess().await.is_none());
    }
}
