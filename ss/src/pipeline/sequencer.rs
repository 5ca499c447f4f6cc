//! Fact to plan to image, strictly in that order

use tracing::{debug, info};

use super::{CompletedRun, Stage, ViewState};
use crate::domain::{Fact, Preferences};
use crate::generation::{GenerationError, Generator};

pub const PLANNING_MESSAGE: &str = "Designing the infographic layout...";
pub const GENERATING_MESSAGE: &str = "Rendering the infographic...";

/// A sequence failure and the stage it happened in
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: GenerationError,
}

/// Plan a fact, then render the plan
///
/// `on_stage` is called with `Planning` before the plan call and with
/// `Generating` before the image call. A plan failure means no image call is
/// made; an image failure drops the plan. Only a full success returns a run.
pub async fn render_fact<F>(
    generator: &dyn Generator,
    fact: &Fact,
    prefs: Preferences,
    mut on_stage: F,
) -> Result<CompletedRun, StageFailure>
where
    F: FnMut(ViewState, &'static str),
{
    debug!(title = %fact.title, model = %prefs.image_model, "render_fact: called");

    on_stage(ViewState::Planning { fact: fact.clone() }, PLANNING_MESSAGE);
    let plan = generator
        .plan(fact, prefs.language, prefs.audience)
        .await
        .map_err(|error| StageFailure {
            stage: Stage::Planning,
            error,
        })?;

    on_stage(ViewState::Generating { fact: fact.clone() }, GENERATING_MESSAGE);
    let image = generator
        .image(&plan, prefs.image_model)
        .await
        .map_err(|error| StageFailure {
            stage: Stage::Generating,
            error,
        })?;

    info!(title = %fact.title, "Infographic ready");
    Ok(CompletedRun {
        fact: fact.clone(),
        plan,
        image,
    })
}
