//! Generation client
//!
//! The pipeline depends only on the [`Generator`] contract; [`LlmGenerator`]
//! implements it on top of the model clients.

use async_trait::async_trait;

mod error;
mod llm_generator;
pub mod parse;

pub use error::GenerationError;
pub use llm_generator::LlmGenerator;

use crate::domain::{Audience, Fact, ImageModel, ImageRef, Language, Plan, RenderedImage};

/// The AI calls behind each pipeline stage
#[async_trait]
pub trait Generator: Send + Sync {
    /// Several facts about a broad topic, in the order the model gave them
    async fn facts_by_domain(&self, query: &str, language: Language, audience: Audience)
    -> Result<Vec<Fact>, GenerationError>;

    /// Exactly one fact explaining a concept
    async fn fact_by_concept(&self, query: &str, language: Language, audience: Audience) -> Result<Fact, GenerationError>;

    /// Layout plan for a fact
    async fn plan(&self, fact: &Fact, language: Language, audience: Audience) -> Result<Plan, GenerationError>;

    /// Render a plan with the chosen image model
    async fn image(&self, plan: &Plan, model: ImageModel) -> Result<RenderedImage, GenerationError>;

    /// Rework an existing image following a text instruction
    async fn edit_image(
        &self,
        source: &ImageRef,
        instruction: &str,
        model: ImageModel,
    ) -> Result<RenderedImage, GenerationError>;
}
