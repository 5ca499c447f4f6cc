//! Persisting a finished run as a gallery item

use chrono::Utc;
use gallerystore::StoreError;
use tracing::{debug, info};
use uuid::Uuid;

use super::CompletedRun;
use crate::domain::GalleryItem;
use crate::gallery::GalleryBackend;
use crate::upload::StorageGateway;

/// Save a run under a fresh id
///
/// The image goes through the gateway first, which always returns a usable
/// reference. Only the gallery write can fail. Every call creates a new item.
pub async fn persist_run(
    gateway: &StorageGateway,
    store: &dyn GalleryBackend,
    run: &CompletedRun,
) -> Result<GalleryItem, StoreError> {
    let id = Uuid::now_v7().to_string();
    debug!(%id, title = %run.fact.title, "persist_run: called");

    let name = format!("{}.{}", id, run.image.extension());
    let image_ref = gateway.store(&run.image, &name).await;

    let item = GalleryItem {
        id,
        created_at: Utc::now().timestamp_millis(),
        image_ref,
        plan: run.plan.clone(),
        fact: run.fact.clone(),
    };
    store.upsert(item.to_record()).await?;

    info!(id = %item.id, remote = item.image_ref.is_remote(), "Saved infographic");
    Ok(item)
}
