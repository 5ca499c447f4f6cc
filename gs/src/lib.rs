//! GalleryStore - shared store for saved infographics
//!
//! Every saved infographic is one flat record keyed by its id. The store is an
//! append-only JSONL log that several processes may read and write at once;
//! readers always replay the full log into a snapshot.
//!
//! # Architecture
//!
//! ```text
//! {store_dir}/
//! ├── infographics.jsonl   # upsert / set-image operations, one per line
//! └── gallery.lock         # advisory lock (shared for reads, exclusive for writes)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gallerystore::{GalleryRecord, GalleryStore};
//!
//! let store = GalleryStore::open(gallerystore::default_store_path())?;
//! store.upsert(&record)?;
//! let records = store.snapshot()?;
//! ```

pub mod cli;
mod error;
mod record;
mod store;

use std::path::PathBuf;

pub use error::StoreError;
pub use record::GalleryRecord;
pub use store::{CompactStats, GalleryStore};

/// Log file name inside the store directory
pub const LOG_FILE: &str = "infographics.jsonl";

/// Lock file name inside the store directory
pub const LOCK_FILE: &str = "gallery.lock";

/// Default store location (`~/.local/share/sciencesnap/gallery` on Linux)
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sciencesnap")
        .join("gallery")
}
