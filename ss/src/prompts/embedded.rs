//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Several facts about a broad domain
pub const FACTS: &str = include_str!("../../prompts/facts.pmt");

/// One fact explaining a specific concept
pub const CONCEPT: &str = include_str!("../../prompts/concept.pmt");

/// Infographic layout plan for a fact
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Image prompt wrapping a plan
pub const IMAGE: &str = include_str!("../../prompts/image.pmt");

/// Edit instruction for an existing image
pub const EDIT: &str = include_str!("../../prompts/edit.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "facts" => Some(FACTS),
        "concept" => Some(CONCEPT),
        "plan" => Some(PLAN),
        "image" => Some(IMAGE),
        "edit" => Some(EDIT),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
