//! ScienceSnap - science facts rendered as infographics
//!
//! A query becomes a list of facts (or one fact for a concept), a chosen fact
//! becomes a visual plan, and the plan becomes an image. Finished results are
//! saved to a shared gallery.
//!
//! - [`pipeline`] - the view state machine and generation sequencing
//! - [`generation`] - the [`Generator`](generation::Generator) boundary over model clients
//! - [`gallery`] - persistence boundary and the filtered gallery projection
//! - [`upload`] - best-effort image hosting with a local fallback
//! - [`repl`] - interactive front end

pub mod cli;
pub mod config;
pub mod domain;
pub mod gallery;
pub mod generation;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod repl;
pub mod upload;

pub use config::Config;
pub use domain::{Fact, GalleryItem, ImageRef, Plan, Preferences, RenderedImage, SearchMode};
pub use pipeline::{PipelineController, PipelineError, Snapshot, ViewState};
