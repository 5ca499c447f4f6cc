//! In-memory gallery for ephemeral sessions and tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use gallerystore::{GalleryRecord, StoreError};
use tracing::debug;

use super::GalleryBackend;

/// Gallery kept in process memory
///
/// Writes can be switched to fail, which is how callers exercise the
/// store-failure path.
#[derive(Debug, Default)]
pub struct MemoryGallery {
    records: Mutex<Vec<GalleryRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later write fail with [`StoreError::Unavailable`]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<GalleryRecord>> {
        // Every write is a single push or assignment, so a poisoned Vec is still whole
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GalleryBackend for MemoryGallery {
    async fn upsert(&self, record: GalleryRecord) -> Result<(), StoreError> {
        debug!(id = %record.id, "MemoryGallery::upsert: called");
        self.check_writable()?;
        let mut records = self.lock();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn update_image(&self, id: &str, image_url: &str) -> Result<(), StoreError> {
        debug!(%id, "MemoryGallery::update_image: called");
        self.check_writable()?;
        let mut records = self.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.image_url = image_url.to_string();
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<GalleryRecord>, StoreError> {
        Ok(self.lock().clone())
    }
}
