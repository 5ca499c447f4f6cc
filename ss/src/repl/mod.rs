//! Interactive REPL for ScienceSnap
//!
//! Plain lines are queries, numbers pick facts, and slash commands drive the
//! rest of the pipeline (regenerate, save, gallery, edit).

mod session;
pub mod view;

pub use session::ReplSession;

use eyre::Result;

use crate::domain::Preferences;
use crate::pipeline::PipelineController;

/// Run the interactive REPL
///
/// This is the main entry point for `ss repl`.
pub async fn run_interactive(controller: PipelineController, prefs: Preferences) -> Result<()> {
    let mut session = ReplSession::new(controller, prefs);
    session.run().await
}
