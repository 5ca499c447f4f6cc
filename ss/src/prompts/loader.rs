//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{Audience, Fact, Language};

/// Context for rendering prompt templates
///
/// Every field is optional so one context type serves all templates; each
/// template reads only what it needs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// Topic or concept typed by the user
    pub query: Option<String>,
    /// Output language name ("English", "French")
    pub language: Option<String>,
    /// Audience description
    pub audience: Option<String>,
    /// Whether the audience is young readers
    pub young: bool,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub text: Option<String>,
    /// Layout plan (image template)
    pub plan: Option<String>,
    /// Edit instruction (edit template)
    pub instruction: Option<String>,
}

impl PromptContext {
    /// Context for fact generation from a query
    pub fn for_query(query: &str, language: Language, audience: Audience) -> Self {
        debug!(%query, %language, %audience, "PromptContext::for_query: called");
        Self {
            query: Some(query.to_string()),
            language: Some(language.name().to_string()),
            audience: Some(audience.description().to_string()),
            young: audience == Audience::Young,
            ..Self::default()
        }
    }

    /// Context for plan generation from a fact
    pub fn for_fact(fact: &Fact, language: Language, audience: Audience) -> Self {
        debug!(title = %fact.title, %language, %audience, "PromptContext::for_fact: called");
        Self {
            language: Some(language.name().to_string()),
            audience: Some(audience.description().to_string()),
            young: audience == Audience::Young,
            title: Some(fact.title.clone()),
            domain: Some(fact.domain.clone()),
            text: Some(fact.text.clone()),
            ..Self::default()
        }
    }

    /// Context for rendering a plan into an image
    pub fn for_plan(plan: &str) -> Self {
        Self {
            plan: Some(plan.to_string()),
            ..Self::default()
        }
    }

    /// Context for editing an image
    pub fn for_edit(instruction: &str) -> Self {
        Self {
            instruction: Some(instruction.to_string()),
            ..Self::default()
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directories, searched in order
    dirs: Vec<PathBuf>,
}

impl PromptLoader {
    /// Create a loader searching the project and user override directories
    ///
    /// # Arguments
    /// * `project_root` - Directory containing `.sciencesnap/prompts/`
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        let project_root = project_root.as_ref();
        debug!(?project_root, "PromptLoader::new: called");

        let candidates = [
            Some(project_root.join(".sciencesnap/prompts")),
            dirs::config_dir().map(|d| d.join("sciencesnap/prompts")),
        ];
        let dirs: Vec<PathBuf> = candidates.into_iter().flatten().filter(|d| d.exists()).collect();
        debug!(?dirs, "PromptLoader::new: override directories");

        Self::with_dirs(dirs)
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self::with_dirs(Vec::new())
    }

    fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs, dirs }
    }

    /// Load a template by name
    ///
    /// Checks each override directory for `{name}.pmt`, then the embedded set.
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in &self.dirs {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;

        self.hbs
            .render_template(&template, context)
            .map(|s| s.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_render_facts_prompt() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::for_query("volcanoes", Language::Fr, Audience::Adult);
        let prompt = loader.render("facts", &ctx).unwrap();

        assert!(prompt.contains("volcanoes"));
        assert!(prompt.contains("French"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_render_plan_prompt_includes_fact() {
        let loader = PromptLoader::embedded_only();
        let fact = Fact::new("Pillow lava", "Geology", "Lava erupting underwater forms rounded pillows.");
        let prompt = loader
            .render("plan", &PromptContext::for_fact(&fact, Language::En, Audience::Young))
            .unwrap();

        assert!(prompt.contains("Pillow lava"));
        assert!(prompt.contains("Geology"));
        assert!(prompt.contains("rounded pillows"));
    }

    #[test]
    fn test_render_does_not_html_escape() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.render("image", &PromptContext::for_plan("A & B <title>")).unwrap();
        assert!(prompt.contains("A & B <title>"));
    }

    #[test]
    fn test_override_directory_wins() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join(".sciencesnap/prompts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("edit.pmt"), "CUSTOM {{instruction}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let prompt = loader.render("edit", &PromptContext::for_edit("add stars")).unwrap();
        assert_eq!(prompt, "CUSTOM add stars");

        // Templates without an override still come from the embedded set
        let prompt = loader.render("image", &PromptContext::for_plan("P")).unwrap();
        assert!(prompt.contains('P'));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.render("nonexistent-template", &PromptContext::default()).is_err());
    }
}
