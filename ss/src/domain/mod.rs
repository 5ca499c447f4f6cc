//! Domain types for the infographic pipeline
//!
//! - [`Fact`] and [`Plan`] - text produced by the generation client
//! - [`RenderedImage`] and [`ImageRef`] - generated images and where they are stored
//! - [`GalleryItem`] - a saved infographic
//! - [`Preferences`] - language, audience and image model for a run

mod fact;
mod gallery;
mod image;
mod preferences;

pub use fact::{Fact, Plan};
pub use gallery::GalleryItem;
pub use image::{ImageRef, RenderedImage};
pub use preferences::{Audience, ImageModel, Language, Preferences, SearchMode};
