//! Generator backed by the model clients and prompt templates

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::parse::{parse_fact, parse_facts};
use super::{GenerationError, Generator};
use crate::config::ImageConfig;
use crate::domain::{Audience, Fact, ImageModel, ImageRef, Language, Plan, RenderedImage};
use crate::llm::{CompletionRequest, ImageClient, ImageRequest, LlmClient};
use crate::prompts::{PromptContext, PromptLoader};

const SYSTEM_PROMPT: &str = "You are a meticulous science communicator. \
                             You only state facts that are established by mainstream science.";

/// Text calls go to an [`LlmClient`], image calls to an [`ImageClient`]
pub struct LlmGenerator {
    llm: Arc<dyn LlmClient>,
    images: Arc<dyn ImageClient>,
    prompts: Arc<PromptLoader>,
    image_config: ImageConfig,
    max_tokens: u32,
}

impl LlmGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        images: Arc<dyn ImageClient>,
        prompts: Arc<PromptLoader>,
        image_config: ImageConfig,
        max_tokens: u32,
    ) -> Self {
        debug!(%max_tokens, "LlmGenerator::new: called");
        Self {
            llm,
            images,
            prompts,
            image_config,
            max_tokens,
        }
    }

    fn render(&self, template: &str, context: &PromptContext) -> Result<String, GenerationError> {
        self.prompts
            .render(template, context)
            .map_err(|e| GenerationError::Prompt(e.to_string()))
    }

    /// One text completion; an empty answer is an error
    async fn complete(&self, prompt: String, json_output: bool) -> Result<String, GenerationError> {
        let mut request = CompletionRequest::new(SYSTEM_PROMPT, prompt, self.max_tokens);
        if json_output {
            request = request.with_json_output();
        }
        let response = self.llm.complete(request).await?;
        debug!(stop_reason = ?response.stop_reason, output_tokens = response.usage.output_tokens, "complete: response");
        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }

    /// Turn a stored reference back into image bytes
    async fn load_source(&self, source: &ImageRef) -> Result<RenderedImage, GenerationError> {
        debug!(remote = source.is_remote(), "load_source: called");
        match source {
            ImageRef::Local { data_url } => RenderedImage::from_data_url(data_url)
                .ok_or_else(|| GenerationError::SourceImage("not a base64 data URL".to_string())),
            ImageRef::Remote { url } => self
                .images
                .fetch(url)
                .await
                .map_err(|e| GenerationError::SourceImage(e.to_string())),
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn facts_by_domain(
        &self,
        query: &str,
        language: Language,
        audience: Audience,
    ) -> Result<Vec<Fact>, GenerationError> {
        debug!(%query, %language, %audience, "facts_by_domain: called");
        let prompt = self.render("facts", &PromptContext::for_query(query, language, audience))?;
        let raw = self.complete(prompt, true).await?;
        let facts = parse_facts(&raw)?;
        info!(count = facts.len(), %query, "Generated facts");
        Ok(facts)
    }

    async fn fact_by_concept(&self, query: &str, language: Language, audience: Audience) -> Result<Fact, GenerationError> {
        debug!(%query, %language, %audience, "fact_by_concept: called");
        let prompt = self.render("concept", &PromptContext::for_query(query, language, audience))?;
        let raw = self.complete(prompt, true).await?;
        parse_fact(&raw)
    }

    async fn plan(&self, fact: &Fact, language: Language, audience: Audience) -> Result<Plan, GenerationError> {
        debug!(title = %fact.title, "plan: called");
        let prompt = self.render("plan", &PromptContext::for_fact(fact, language, audience))?;
        let raw = self.complete(prompt, false).await?;
        Ok(Plan::new(raw.trim()))
    }

    async fn image(&self, plan: &Plan, model: ImageModel) -> Result<RenderedImage, GenerationError> {
        let model_id = self.image_config.model_id(model);
        debug!(%model, %model_id, "image: called");
        let prompt = self.render("image", &PromptContext::for_plan(plan.as_str()))?;
        let image = self.images.generate(ImageRequest::render(model_id, prompt)).await?;
        info!(mime = %image.mime_type, %model_id, "Rendered infographic");
        Ok(image)
    }

    async fn edit_image(
        &self,
        source: &ImageRef,
        instruction: &str,
        model: ImageModel,
    ) -> Result<RenderedImage, GenerationError> {
        let model_id = self.image_config.model_id(model);
        debug!(%instruction, %model_id, "edit_image: called");
        let source = self.load_source(source).await?;
        let prompt = self.render("edit", &PromptContext::for_edit(instruction))?;
        let image = self.images.generate(ImageRequest::edit(model_id, prompt, source)).await?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::{MockImageClient, MockLlmClient};

    fn build(responses: Vec<CompletionResponse>, images: MockImageClient) -> (LlmGenerator, Arc<MockLlmClient>, Arc<MockImageClient>) {
        let llm = Arc::new(MockLlmClient::new(responses));
        let images = Arc::new(images);
        let generator = LlmGenerator::new(
            llm.clone(),
            images.clone(),
            Arc::new(PromptLoader::embedded_only()),
            ImageConfig::default(),
            4096,
        );
        (generator, llm, images)
    }

    #[tokio::test]
    async fn test_facts_by_domain_requests_json() {
        let raw = r#"[{"title": "A", "domain": "Geology", "text": "a"}, {"title": "B", "domain": "Geology", "text": "b"}]"#;
        let (generator, llm, _) = build(vec![CompletionResponse::text(raw)], MockImageClient::failing());

        let facts = generator
            .facts_by_domain("volcanoes", Language::En, Audience::Young)
            .await
            .unwrap();

        assert_eq!(facts.len(), 2);
        let request = &llm.requests()[0];
        assert!(request.json_output);
        assert!(request.prompt.contains("volcanoes"));
    }

    #[tokio::test]
    async fn test_empty_answer_is_error() {
        let (generator, _, _) = build(vec![CompletionResponse::text("   ")], MockImageClient::failing());
        let fact = Fact::new("A", "B", "C");
        let err = generator.plan(&fact, Language::En, Audience::Adult).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_plan_is_plain_text() {
        let (generator, llm, _) = build(vec![CompletionResponse::text("  PLAN: banner\n")], MockImageClient::failing());
        let fact = Fact::new("Io", "Astronomy", "Io has 400 volcanoes.");
        let plan = generator.plan(&fact, Language::Fr, Audience::Adult).await.unwrap();

        assert_eq!(plan.as_str(), "PLAN: banner");
        assert!(!llm.requests()[0].json_output);
        assert!(llm.requests()[0].prompt.contains("French"));
    }

    #[tokio::test]
    async fn test_image_uses_selected_model() {
        let png = RenderedImage::new("image/png", "IMG1");
        let (generator, _, images) = build(vec![], MockImageClient::new(png.clone()));

        let image = generator.image(&Plan::new("PLAN: x"), ImageModel::Flash).await.unwrap();
        assert_eq!(image, png);

        let request = &images.requests()[0];
        assert_eq!(request.model, "gemini-2.5-flash-image");
        assert!(request.prompt.contains("PLAN: x"));
        assert!(request.source.is_none());
    }

    #[tokio::test]
    async fn test_edit_local_image() {
        let png = RenderedImage::new("image/png", "EDITED");
        let (generator, _, images) = build(vec![], MockImageClient::new(png.clone()));

        let source = ImageRef::from_stored("data:image/png;base64,ORIG");
        let image = generator.edit_image(&source, "add a moon", ImageModel::Pro).await.unwrap();
        assert_eq!(image, png);

        let request = &images.requests()[0];
        assert_eq!(request.source.as_ref().unwrap().data, "ORIG");
        assert!(request.prompt.contains("add a moon"));
    }

    #[tokio::test]
    async fn test_edit_rejects_broken_source() {
        let (generator, _, images) = build(vec![], MockImageClient::new(RenderedImage::new("image/png", "X")));

        let source = ImageRef::Local {
            data_url: "not-a-data-url".to_string(),
        };
        let err = generator.edit_image(&source, "x", ImageModel::Pro).await.unwrap_err();
        assert!(matches!(err, GenerationError::SourceImage(_)));
        assert_eq!(images.call_count(), 0);
    }
}
