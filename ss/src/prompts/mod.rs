//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for each generation call.
//!
//! Template loading chain:
//! 1. `.sciencesnap/prompts/{name}.pmt` (project override)
//! 2. `~/.config/sciencesnap/prompts/{name}.pmt` (user override)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
