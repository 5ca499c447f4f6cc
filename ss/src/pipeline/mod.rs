//! Generation pipeline and view state machine
//!
//! States run `Input → Selection → Planning → Generating → Result → Gallery`.
//! [`PipelineController`] is the only thing that moves between them; the
//! [`sequencer`] runs plan then image for one fact, and [`save`] turns a
//! finished run into a gallery item.

mod controller;
mod error;
pub mod save;
pub mod sequencer;
mod state;

pub use controller::PipelineController;
pub use error::PipelineError;
pub use state::{CompletedRun, NavTarget, Notice, NoticeKind, Snapshot, Stage, ViewState};
