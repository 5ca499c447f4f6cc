//! Gallery persistence boundary and the projected gallery list
//!
//! The pipeline writes through [`GalleryBackend`] and reads full snapshots,
//! which [`GalleryView`] turns into the sorted, filterable list.

use async_trait::async_trait;
use gallerystore::{GalleryRecord, GalleryStore, StoreError};
use tracing::debug;

mod memory;
mod projection;

pub use memory::MemoryGallery;
pub use projection::{ALL_DOMAINS, DomainFilter, GalleryView};

/// Shared persistent collection of saved infographics
#[async_trait]
pub trait GalleryBackend: Send + Sync {
    /// Insert or replace the record keyed by its id
    async fn upsert(&self, record: GalleryRecord) -> Result<(), StoreError>;

    /// Replace only the image reference of an existing record
    async fn update_image(&self, id: &str, image_url: &str) -> Result<(), StoreError>;

    /// Every record, in store order
    async fn snapshot(&self) -> Result<Vec<GalleryRecord>, StoreError>;
}

/// File-backed store; blocking file I/O runs off the async workers
#[async_trait]
impl GalleryBackend for GalleryStore {
    async fn upsert(&self, record: GalleryRecord) -> Result<(), StoreError> {
        debug!(id = %record.id, "GalleryStore::upsert: called");
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.upsert(&record))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn update_image(&self, id: &str, image_url: &str) -> Result<(), StoreError> {
        debug!(%id, "GalleryStore::update_image: called");
        let store = self.clone();
        let id = id.to_string();
        let image_url = image_url.to_string();
        tokio::task::spawn_blocking(move || store.set_image(&id, &image_url))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn snapshot(&self) -> Result<Vec<GalleryRecord>, StoreError> {
        debug!("GalleryStore::snapshot: called");
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.snapshot())
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
