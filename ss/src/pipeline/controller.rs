//! Pipeline controller: the view state machine

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::sequencer::{self, StageFailure};
use super::{NavTarget, Notice, NoticeKind, PipelineError, Snapshot, Stage, ViewState, save};
use crate::domain::{Fact, GalleryItem, ImageRef, Preferences, RenderedImage, SearchMode};
use crate::gallery::{DomainFilter, GalleryBackend, GalleryView};
use crate::generation::{GenerationError, Generator};
use crate::upload::StorageGateway;

const SAVING_MESSAGE: &str = "Saving to the gallery...";
const EDITING_MESSAGE: &str = "Editing the infographic...";

/// Facts from the last domain query, kept so Result can go back to Selection
#[derive(Debug, Clone)]
struct FactList {
    query: String,
    facts: Vec<Fact>,
}

/// Owns the view state and drives every transition
///
/// Observers subscribe to [`Snapshot`]s; the gallery projection is read
/// through [`gallery`](PipelineController::gallery).
pub struct PipelineController {
    generator: Arc<dyn Generator>,
    gateway: StorageGateway,
    store: Arc<dyn GalleryBackend>,
    state_tx: watch::Sender<Snapshot>,
    fact_list: Option<FactList>,
    gallery: GalleryView,
}

impl PipelineController {
    pub fn new(generator: Arc<dyn Generator>, gateway: StorageGateway, store: Arc<dyn GalleryBackend>) -> Self {
        debug!(upload = gateway.has_host(), "PipelineController::new: called");
        let (state_tx, _) = watch::channel(Snapshot::default());
        Self {
            generator,
            gateway,
            store,
            state_tx,
            fact_list: None,
            gallery: GalleryView::new(),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.state_tx.borrow().clone()
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state_tx.subscribe()
    }

    pub fn gallery(&self) -> &GalleryView {
        &self.gallery
    }

    /// Submit a topic (domain mode) or a concept (concept mode)
    pub async fn submit_query(&mut self, text: &str, mode: SearchMode, prefs: Preferences) -> Result<(), PipelineError> {
        debug!(%text, %mode, "submit_query: called");
        self.ensure_idle()?;
        self.ensure_stage("submit a query", Stage::Input)?;
        let query = text.trim();
        if query.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        match mode {
            SearchMode::Domain => {
                self.begin(format!("Discovering facts about {}...", query));
                match self.generator.facts_by_domain(query, prefs.language, prefs.audience).await {
                    Ok(facts) if !facts.is_empty() => {
                        info!(count = facts.len(), %query, "Facts ready for selection");
                        let list = FactList {
                            query: query.to_string(),
                            facts,
                        };
                        self.publish(|s| {
                            s.state = ViewState::Selection {
                                query: list.query.clone(),
                                facts: list.facts.clone(),
                            };
                            s.busy = None;
                        });
                        self.fact_list = Some(list);
                        Ok(())
                    }
                    Ok(_) => Err(self.fail(NoticeKind::FactsFailed, GenerationError::EmptyResponse)),
                    Err(e) => Err(self.fail(NoticeKind::FactsFailed, e)),
                }
            }
            SearchMode::Concept => {
                self.begin(format!("Explaining {}...", query));
                match self.generator.fact_by_concept(query, prefs.language, prefs.audience).await {
                    Ok(fact) => {
                        self.fact_list = None;
                        self.run_sequence(fact, prefs).await
                    }
                    Err(e) => Err(self.fail(NoticeKind::ConceptFailed, e)),
                }
            }
        }
    }

    /// Pick a fact from the Selection list by position
    pub async fn select_fact(&mut self, index: usize, prefs: Preferences) -> Result<(), PipelineError> {
        debug!(%index, "select_fact: called");
        self.ensure_idle()?;
        let fact = match &self.state_tx.borrow().state {
            ViewState::Selection { facts, .. } => facts.get(index).cloned().ok_or(PipelineError::UnknownFact(index))?,
            other => {
                return Err(PipelineError::Unavailable {
                    op: "select a fact",
                    stage: other.stage(),
                });
            }
        };
        self.begin(sequencer::PLANNING_MESSAGE.to_string());
        self.run_sequence(fact, prefs).await
    }

    /// Plan and render the current fact again
    pub async fn regenerate(&mut self, prefs: Preferences) -> Result<(), PipelineError> {
        debug!("regenerate: called");
        self.ensure_idle()?;
        let fact = match &self.state_tx.borrow().state {
            ViewState::Result(run) => run.fact.clone(),
            other => {
                return Err(PipelineError::Unavailable {
                    op: "regenerate",
                    stage: other.stage(),
                });
            }
        };
        self.begin(sequencer::PLANNING_MESSAGE.to_string());
        self.run_sequence(fact, prefs).await
    }

    /// Save the finished run to the gallery and show the gallery
    ///
    /// A failed gallery write leaves the Result view in place so the save can
    /// be retried without generating again.
    pub async fn save(&mut self) -> Result<GalleryItem, PipelineError> {
        debug!("save: called");
        self.ensure_idle()?;
        let run = match &self.state_tx.borrow().state {
            ViewState::Result(run) => run.clone(),
            other => {
                return Err(PipelineError::Unavailable {
                    op: "save",
                    stage: other.stage(),
                });
            }
        };

        self.begin(SAVING_MESSAGE.to_string());
        match save::persist_run(&self.gateway, self.store.as_ref(), &run).await {
            Ok(item) => {
                self.publish(|s| {
                    s.state = ViewState::Gallery;
                    s.busy = None;
                });
                self.refresh_quietly().await;
                Ok(item)
            }
            Err(e) => {
                warn!(error = %e, "Save failed");
                let hint = if e.is_transient() { " Try saving again." } else { "" };
                let notice = Notice::new(
                    NoticeKind::SaveFailed,
                    format!("Could not save to the gallery: {}.{}", e, hint),
                );
                self.publish(|s| {
                    s.busy = None;
                    s.notice = Some(notice);
                });
                Err(PipelineError::Store(e))
            }
        }
    }

    /// Jump to a view
    ///
    /// Always allowed, and clears a busy flag left by an abandoned call.
    /// Going to Input drops the run; Selection needs the facts from a domain
    /// query.
    pub async fn navigate(&mut self, target: NavTarget) -> Result<(), PipelineError> {
        debug!(?target, "navigate: called");
        match target {
            NavTarget::Input => {
                self.fact_list = None;
                self.publish(|s| {
                    s.state = ViewState::Input;
                    s.busy = None;
                });
            }
            NavTarget::Selection => {
                let Some(list) = self.fact_list.clone() else {
                    return Err(PipelineError::Unavailable {
                        op: "go back to the fact list",
                        stage: self.snapshot().stage(),
                    });
                };
                self.publish(|s| {
                    s.state = ViewState::Selection {
                        query: list.query,
                        facts: list.facts,
                    };
                    s.busy = None;
                });
            }
            NavTarget::Gallery => {
                self.publish(|s| {
                    s.state = ViewState::Gallery;
                    s.busy = None;
                });
                self.refresh_quietly().await;
            }
        }
        Ok(())
    }

    /// Leave the gallery to start a new infographic
    pub fn create_new(&mut self) -> Result<(), PipelineError> {
        debug!("create_new: called");
        self.ensure_idle()?;
        self.ensure_stage("create a new infographic", Stage::Gallery)?;
        self.fact_list = None;
        self.publish(|s| {
            s.state = ViewState::Input;
            s.notice = None;
        });
        Ok(())
    }

    pub fn set_filter(&mut self, filter: DomainFilter) {
        self.gallery.set_filter(filter);
    }

    /// Reload the gallery projection from the store
    pub async fn refresh_gallery(&mut self) -> Result<(), PipelineError> {
        debug!("refresh_gallery: called");
        let records = self.store.snapshot().await?;
        self.gallery.refresh(records);
        Ok(())
    }

    /// Swap the image of a saved item, keeping its id
    pub async fn replace_item_image(&mut self, id: &str, image: &RenderedImage) -> Result<ImageRef, PipelineError> {
        debug!(%id, "replace_item_image: called");
        self.ensure_idle()?;
        self.saved_image_ref(id).await?;
        self.begin(SAVING_MESSAGE.to_string());
        let result = self.store_item_image(id, image).await;
        self.publish(|s| s.busy = None);
        result
    }

    /// Edit a saved item's image with a text instruction and store the result
    pub async fn edit_item_image(
        &mut self,
        id: &str,
        instruction: &str,
        prefs: Preferences,
    ) -> Result<ImageRef, PipelineError> {
        debug!(%id, %instruction, "edit_item_image: called");
        self.ensure_idle()?;
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        let source = self.saved_image_ref(id).await?;

        self.begin(EDITING_MESSAGE.to_string());
        let image = match self.generator.edit_image(&source, instruction, prefs.image_model).await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, %id, "Image edit failed");
                let notice = Notice::new(NoticeKind::EditFailed, format!("Could not edit the image: {}", e.reason()));
                self.publish(|s| {
                    s.busy = None;
                    s.notice = Some(notice);
                });
                return Err(PipelineError::Generation(e));
            }
        };

        self.publish(|s| s.busy = Some(SAVING_MESSAGE.to_string()));
        let result = self.store_item_image(id, &image).await;
        self.publish(|s| s.busy = None);
        result
    }

    /// Image reference of a saved item, reloading the projection on a miss
    async fn saved_image_ref(&mut self, id: &str) -> Result<ImageRef, PipelineError> {
        if self.gallery.get(id).is_none() {
            self.refresh_gallery().await?;
        }
        self.gallery
            .get(id)
            .map(|item| item.image_ref.clone())
            .ok_or_else(|| PipelineError::UnknownItem(id.to_string()))
    }

    async fn store_item_image(&mut self, id: &str, image: &RenderedImage) -> Result<ImageRef, PipelineError> {
        let name = format!("{}-{}.{}", id, Utc::now().timestamp_millis(), image.extension());
        let image_ref = self.gateway.store(image, &name).await;

        match self.store.update_image(id, image_ref.as_str()).await {
            Ok(()) => {
                info!(%id, remote = image_ref.is_remote(), "Replaced gallery image");
                self.refresh_quietly().await;
                Ok(image_ref)
            }
            Err(gallerystore::StoreError::NotFound(_)) => Err(PipelineError::UnknownItem(id.to_string())),
            Err(e) => {
                let notice = Notice::new(NoticeKind::SaveFailed, format!("Could not update the gallery: {}", e));
                self.publish(|s| s.notice = Some(notice));
                Err(PipelineError::Store(e))
            }
        }
    }

    /// Run plan then image for a fact; Result on success, Input on failure
    async fn run_sequence(&mut self, fact: Fact, prefs: Preferences) -> Result<(), PipelineError> {
        let state_tx = &self.state_tx;
        let outcome = sequencer::render_fact(self.generator.as_ref(), &fact, prefs, |state, message| {
            state_tx.send_modify(|s| {
                s.state = state;
                s.busy = Some(message.to_string());
            });
        })
        .await;

        match outcome {
            Ok(run) => {
                self.publish(|s| {
                    s.state = ViewState::Result(run);
                    s.busy = None;
                });
                Ok(())
            }
            Err(StageFailure { stage, error }) => {
                debug!(%stage, "run_sequence: failed");
                Err(self.fail(NoticeKind::ImageFailed, error))
            }
        }
    }

    /// Reset to Input after a generation failure and record a notice
    fn fail(&mut self, kind: NoticeKind, error: GenerationError) -> PipelineError {
        warn!(?kind, error = %error, "Generation failed");
        let mut message = match kind {
            NoticeKind::FactsFailed => format!("Could not find facts: {}", error.reason()),
            NoticeKind::ConceptFailed => format!("Could not explain this concept: {}", error.reason()),
            _ => format!("Could not create the infographic: {}", error.reason()),
        };
        if error.is_retryable() {
            message.push_str(". Please try again.");
        }
        self.fact_list = None;
        self.publish(|s| {
            s.state = ViewState::Input;
            s.busy = None;
            s.notice = Some(Notice::new(kind, message));
        });
        PipelineError::Generation(error)
    }

    async fn refresh_quietly(&mut self) {
        if let Err(e) = self.refresh_gallery().await {
            warn!(error = %e, "Gallery refresh failed, showing previous contents");
        }
    }

    fn ensure_idle(&self) -> Result<(), PipelineError> {
        if self.state_tx.borrow().is_busy() {
            return Err(PipelineError::Busy);
        }
        Ok(())
    }

    fn ensure_stage(&self, op: &'static str, expected: Stage) -> Result<(), PipelineError> {
        let stage = self.state_tx.borrow().stage();
        if stage != expected {
            return Err(PipelineError::Unavailable { op, stage });
        }
        Ok(())
    }

    /// Mark an operation as started: busy message on, old notice off
    fn begin(&self, message: String) {
        self.publish(|s| {
            s.busy = Some(message);
            s.notice = None;
        });
    }

    fn publish(&self, modify: impl FnOnce(&mut Snapshot)) {
        self.state_tx.send_modify(modify);
    }
}
