//! Live editing session: the active creative or carousel and every mutation applied to it.
//!
//! This module provides:
//! - [`EditingController`] - owns the [`WorkspaceState`] and applies edits
//! - [`SlideStatusMap`] - transient generating/downloading flags per slide
//! - [`PendingChange`] - two-phase confirmation for destructive style operations
//! - [`RichText`] / [`EditableText`] - inline markup for titles and subtitles

mod confirm;
mod rich_text;
mod status;

pub use confirm::{ChangeKind, PendingChange};
pub use rich_text::{EditableText, InlineCommand, InlineStyle, RichText, Selection, TextRun};
pub use status::{SlideStatus, SlideStatusMap, StatusGuard};

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use confirm::{merge_fields, PendingAction};

use crate::error::{ForgeError, Result};
use crate::history::{HistoryStore, SaveOutcome};
use crate::orchestrator::{GenerationOutcome, CAROUSEL_IMAGE_RATIO};
use crate::session::Session;
use crate::storage::{KeyValueStore, WORKSPACE_KEY};
use crate::style::{initial_carousel_slide_settings, GlobalStyle, StyleSettings};
use crate::types::{
    new_id, placeholder_image_url, AdCreative, AspectRatio, CarouselCreative, CarouselSlide,
    HistoryItem, InlineMedia, SlideField, TextField,
};

pub const NEW_SLIDE_TITLE: &str = "New title";
pub const NEW_SLIDE_SUBTITLE: &str = "Click to edit the subtitle.";
pub const NEW_SLIDE_PROMPT: &str = "A minimalist, inspiring background image.";

/// The creative currently being edited. Selecting one kind clears the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum ActiveCreative {
    Single(AdCreative),
    Carousel(CarouselCreative),
}

/// Everything the editor holds between commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceState {
    pub project_context: String,
    /// Single creatives from the latest generation (plus any restored from history).
    pub variations: Vec<AdCreative>,
    pub active: Option<ActiveCreative>,
    /// Style panel state for the active single creative.
    pub editor_settings: StyleSettings,
    /// Subject image held for slide regeneration.
    pub expert_image: Option<InlineMedia>,
    pub aspect_ratio: AspectRatio,
    pub preview_zoom: f32,
    /// Bumped by every mutation; previews are only confirmable against the same revision.
    pub revision: u64,
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self {
            project_context: String::new(),
            variations: Vec::new(),
            active: None,
            editor_settings: StyleSettings::default(),
            expert_image: None,
            aspect_ratio: AspectRatio::default(),
            preview_zoom: 1.0,
            revision: 0,
        }
    }
}

impl WorkspaceState {
    pub fn active_creative(&self) -> Option<&AdCreative> {
        match &self.active {
            Some(ActiveCreative::Single(c)) => Some(c),
            _ => None,
        }
    }

    pub fn active_carousel(&self) -> Option<&CarouselCreative> {
        match &self.active {
            Some(ActiveCreative::Carousel(c)) => Some(c),
            _ => None,
        }
    }

    pub fn require_creative(&self) -> Result<&AdCreative> {
        self.active_creative()
            .ok_or_else(|| ForgeError::validation("No active creative in the workspace."))
    }

    pub fn require_carousel(&self) -> Result<&CarouselCreative> {
        self.active_carousel()
            .ok_or_else(|| ForgeError::validation("No active carousel in the workspace."))
    }

    fn require_slide(&self, slide_id: &str) -> Result<&CarouselSlide> {
        self.require_carousel()?
            .slide(slide_id)
            .ok_or_else(|| ForgeError::validation(format!("Unknown slide id: {slide_id}")))
    }

    fn select_creative(&mut self, creative: AdCreative) {
        self.editor_settings = creative.effective_settings();
        self.active = Some(ActiveCreative::Single(creative));
    }

    /// Replaces the active creative and the variation with the same id in one step.
    fn replace_creative(&mut self, updated: AdCreative) {
        for variation in self.variations.iter_mut() {
            if variation.id == updated.id {
                *variation = updated.clone();
            }
        }
        self.active = Some(ActiveCreative::Single(updated));
    }

    fn replace_carousel(&mut self, updated: CarouselCreative) {
        self.active = Some(ActiveCreative::Carousel(updated));
    }
}

pub struct EditingController {
    session: Arc<Session>,
    state: Mutex<WorkspaceState>,
    statuses: SlideStatusMap,
    persistence: Option<Arc<dyn KeyValueStore>>,
}

impl EditingController {
    pub fn new(session: Arc<Session>, state: WorkspaceState) -> Self {
        Self {
            session,
            state: Mutex::new(state),
            statuses: SlideStatusMap::new(),
            persistence: None,
        }
    }

    /// Restores the workspace saved under [`WORKSPACE_KEY`] and keeps writing it back.
    pub fn load(session: Arc<Session>, store: Arc<dyn KeyValueStore>) -> Self {
        let state = match store.get(WORKSPACE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "failed to parse saved workspace; starting fresh");
                WorkspaceState::default()
            }),
            Ok(None) => WorkspaceState::default(),
            Err(e) => {
                warn!(error = %e, "failed to read saved workspace; starting fresh");
                WorkspaceState::default()
            }
        };
        let mut controller = Self::new(session, state);
        controller.persistence = Some(store);
        controller
    }

    pub fn statuses(&self) -> &SlideStatusMap {
        &self.statuses
    }

    fn lock(&self) -> MutexGuard<'_, WorkspaceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn snapshot(&self) -> WorkspaceState {
        self.lock().clone()
    }

    /// Applies `f` to a copy of the state and swaps it in only if `f` and persistence succeed.
    fn update<T>(&self, f: impl FnOnce(&mut WorkspaceState) -> Result<T>) -> Result<T> {
        let mut state = self.lock();
        let mut next = state.clone();
        let out = f(&mut next)?;
        next.revision = state.revision.wrapping_add(1);
        if let Some(store) = &self.persistence {
            let raw = serde_json::to_string(&next)?;
            store.set(WORKSPACE_KEY, &raw)?;
        }
        *state = next;
        Ok(out)
    }

    pub fn set_project_context(&self, context: &str) -> Result<()> {
        let context = context.trim().to_string();
        self.update(|s| {
            s.project_context = context;
            Ok(())
        })
    }

    /// Drops the previous results before a new generation starts.
    pub fn begin_generation(&self) -> Result<()> {
        self.update(|s| {
            s.variations.clear();
            s.active = None;
            s.expert_image = None;
            Ok(())
        })
    }

    /// Installs a finished generation; single mode selects the first creative.
    pub fn apply_generation(
        &self,
        outcome: GenerationOutcome,
        expert_image: Option<InlineMedia>,
    ) -> Result<()> {
        self.update(|s| {
            s.expert_image = expert_image;
            match outcome {
                GenerationOutcome::Single(creatives) => {
                    s.variations = creatives;
                    s.active = None;
                    if let Some(first) = s.variations.first().cloned() {
                        s.select_creative(first);
                    }
                }
                GenerationOutcome::Carousel(carousel) => {
                    s.variations.clear();
                    s.active = Some(ActiveCreative::Carousel(carousel));
                }
            }
            Ok(())
        })
    }

    pub fn select_creative(&self, creative_id: &str) -> Result<()> {
        self.update(|s| {
            let creative = s
                .variations
                .iter()
                .find(|c| c.id == creative_id)
                .cloned()
                .ok_or_else(|| {
                    ForgeError::validation(format!("Unknown creative id: {creative_id}"))
                })?;
            s.select_creative(creative);
            Ok(())
        })
    }

    /// Restores a saved snapshot as the editing target.
    pub fn select_from_history(&self, item: &HistoryItem) -> Result<()> {
        let item = item.clone();
        self.update(|s| {
            match item {
                HistoryItem::Single(creative) => {
                    match s.variations.iter().position(|c| c.id == creative.id) {
                        Some(index) => s.variations[index] = creative.clone(),
                        None => s.variations.insert(0, creative.clone()),
                    }
                    s.select_creative(creative);
                }
                HistoryItem::Carousel(carousel) => s.replace_carousel(carousel),
            }
            Ok(())
        })
    }

    pub fn update_field(&self, field: TextField, value: &str) -> Result<()> {
        self.update(|s| {
            let updated = s.require_creative()?.with_field(field, value.to_string());
            s.replace_creative(updated);
            Ok(())
        })
    }

    pub fn update_slide_field(&self, slide_id: &str, field: SlideField, value: &str) -> Result<()> {
        self.update(|s| {
            s.require_slide(slide_id)?;
            let updated = s
                .require_carousel()?
                .map_slide(slide_id, |slide| slide.with_field(field, value.to_string()));
            s.replace_carousel(updated);
            Ok(())
        })
    }

    /// Applies bold/italic/color to a character range of a single-creative field.
    pub fn apply_inline_style(
        &self,
        field: TextField,
        selection: Selection,
        command: &InlineCommand,
    ) -> Result<()> {
        self.update(|s| {
            let creative = s.require_creative()?;
            let markup = styled_markup(creative.field(field), selection, command)?;
            let updated = creative.with_field(field, markup);
            s.replace_creative(updated);
            Ok(())
        })
    }

    pub fn apply_slide_inline_style(
        &self,
        slide_id: &str,
        field: SlideField,
        selection: Selection,
        command: &InlineCommand,
    ) -> Result<()> {
        self.update(|s| {
            let current = s.require_slide(slide_id)?.field(field);
            let markup = styled_markup(current, selection, command)?;
            let updated = s
                .require_carousel()?
                .map_slide(slide_id, |slide| slide.with_field(field, markup));
            s.replace_carousel(updated);
            Ok(())
        })
    }

    pub fn update_caption(&self, caption: &str) -> Result<()> {
        self.update(|s| {
            let mut carousel = s.require_carousel()?.clone();
            carousel.caption = caption.to_string();
            s.replace_carousel(carousel);
            Ok(())
        })
    }

    /// Replaces the settings of one slide, or of the single creative when `slide_id` is `None`.
    pub fn apply_style(&self, slide_id: Option<&str>, settings: StyleSettings) -> Result<()> {
        settings.validate()?;
        self.update(|s| match slide_id {
            Some(id) => {
                s.require_slide(id)?;
                let updated = s.require_carousel()?.map_slide(id, |slide| CarouselSlide {
                    settings: settings.clone(),
                    ..slide.clone()
                });
                s.replace_carousel(updated);
                Ok(())
            }
            None => {
                let mut creative = s.require_creative()?.clone();
                creative.settings = Some(settings.clone());
                s.editor_settings = settings;
                s.replace_creative(creative);
                Ok(())
            }
        })
    }

    pub fn preview_global_style(&self, subset: &GlobalStyle) -> Result<PendingChange> {
        if subset.is_empty() {
            return Err(ForgeError::validation("Choose at least one style field to apply."));
        }
        let state = self.lock();
        let carousel = state.require_carousel()?;
        let mut affected = Vec::new();
        let mut changed = Vec::new();
        for slide in &carousel.slides {
            let next = slide.settings.patch(subset);
            next.validate()?;
            let fields = slide.settings.changed_fields(&next);
            if !fields.is_empty() {
                affected.push(slide.id.clone());
                merge_fields(&mut changed, fields);
            }
        }
        Ok(PendingChange::new(
            ChangeKind::GlobalStyle,
            affected,
            changed,
            state.revision,
            PendingAction::GlobalStyle(subset.clone()),
        ))
    }

    /// Previews replacing every slide's settings (or the single creative's) with `settings`.
    pub fn preview_preset(&self, settings: &StyleSettings) -> Result<PendingChange> {
        settings.validate()?;
        let state = self.lock();
        let mut affected = Vec::new();
        let mut changed = Vec::new();
        match &state.active {
            Some(ActiveCreative::Carousel(carousel)) => {
                for slide in &carousel.slides {
                    let fields = slide.settings.changed_fields(settings);
                    if !fields.is_empty() {
                        affected.push(slide.id.clone());
                        merge_fields(&mut changed, fields);
                    }
                }
            }
            Some(ActiveCreative::Single(creative)) => {
                let fields = state.editor_settings.changed_fields(settings);
                if !fields.is_empty() {
                    affected.push(creative.id.clone());
                    changed = fields;
                }
            }
            None => {
                return Err(ForgeError::validation(
                    "No active creative or carousel in the workspace.",
                ))
            }
        }
        Ok(PendingChange::new(
            ChangeKind::Preset,
            affected,
            changed,
            state.revision,
            PendingAction::Preset(settings.clone()),
        ))
    }

    pub fn preview_reset(&self) -> PendingChange {
        let state = self.lock();
        let mut affected: Vec<String> = state.variations.iter().map(|c| c.id.clone()).collect();
        match &state.active {
            Some(ActiveCreative::Carousel(c)) => affected.push(c.id.clone()),
            Some(ActiveCreative::Single(c)) if !affected.contains(&c.id) => {
                affected.push(c.id.clone())
            }
            _ => {}
        }
        PendingChange::new(
            ChangeKind::Reset,
            affected,
            Vec::new(),
            state.revision,
            PendingAction::Reset,
        )
    }

    /// Applies a previewed change if nothing else has mutated the workspace since.
    pub fn confirm(&self, change: &PendingChange) -> Result<()> {
        self.update(|s| {
            if s.revision != change.token {
                return Err(ForgeError::validation(
                    "The workspace changed after the preview; preview the change again.",
                ));
            }
            match &change.action {
                PendingAction::GlobalStyle(subset) => {
                    let mut carousel = s.require_carousel()?.clone();
                    carousel.slides = carousel
                        .slides
                        .iter()
                        .map(|slide| CarouselSlide {
                            settings: slide.settings.patch(subset),
                            ..slide.clone()
                        })
                        .collect();
                    s.replace_carousel(carousel);
                }
                PendingAction::Preset(settings) => match s.active.clone() {
                    Some(ActiveCreative::Carousel(mut carousel)) => {
                        carousel.slides = carousel
                            .slides
                            .iter()
                            .map(|slide| CarouselSlide {
                                settings: settings.clone(),
                                ..slide.clone()
                            })
                            .collect();
                        s.replace_carousel(carousel);
                    }
                    Some(ActiveCreative::Single(mut creative)) => {
                        creative.settings = Some(settings.clone());
                        s.editor_settings = settings.clone();
                        s.replace_creative(creative);
                    }
                    None => {
                        return Err(ForgeError::validation(
                            "No active creative or carousel in the workspace.",
                        ))
                    }
                },
                PendingAction::Reset => {
                    *s = WorkspaceState {
                        revision: s.revision,
                        ..WorkspaceState::default()
                    };
                }
            }
            info!(
                kind = ?change.kind,
                affected = change.affected.len(),
                "applied confirmed change"
            );
            Ok(())
        })
    }

    /// Moves the slide at `from` to `to`. Out-of-range indices leave the carousel untouched
    /// and return `false`.
    pub fn reorder_slides(&self, from: usize, to: usize) -> Result<bool> {
        {
            let state = self.lock();
            let len = state.require_carousel()?.slides.len();
            if from >= len || to >= len {
                debug!(from, to, len, "ignoring out-of-range reorder");
                return Ok(false);
            }
        }
        self.update(|s| {
            let mut carousel = s.require_carousel()?.clone();
            let mut slides = carousel.slides.clone();
            if from >= slides.len() || to >= slides.len() {
                return Ok(false);
            }
            let moved = slides.remove(from);
            slides.insert(to, moved);
            carousel.slides = slides;
            s.replace_carousel(carousel);
            Ok(true)
        })
    }

    /// Appends a placeholder slide and returns its id.
    pub fn add_slide(&self) -> Result<String> {
        self.update(|s| {
            let mut carousel = s.require_carousel()?.clone();
            let slide = CarouselSlide {
                id: new_id("slide"),
                title: NEW_SLIDE_TITLE.to_string(),
                subtitle: NEW_SLIDE_SUBTITLE.to_string(),
                image_prompt: NEW_SLIDE_PROMPT.to_string(),
                image_url: placeholder_image_url(),
                settings: initial_carousel_slide_settings(),
            };
            let id = slide.id.clone();
            let mut slides = carousel.slides.clone();
            slides.push(slide);
            carousel.slides = slides;
            s.replace_carousel(carousel);
            Ok(id)
        })
    }

    /// Requests a new image for one slide.
    ///
    /// A failure leaves the slide's current image in place. A second request for a slide that
    /// is still generating is refused. If the carousel was replaced while the request was in
    /// flight, the late result is dropped.
    pub async fn regenerate_slide_image(&self, slide_id: &str, prompt: &str) -> Result<()> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ForgeError::validation("Enter a prompt for the new image."));
        }
        let (carousel_id, expert_image) = {
            let state = self.lock();
            state.require_slide(slide_id)?;
            (
                state.require_carousel()?.id.clone(),
                state.expert_image.clone(),
            )
        };

        let _generating = self.statuses.begin_generating(slide_id)?;
        debug!(slide_id, "regenerating slide image");
        let image = self
            .session
            .background_image(expert_image.as_ref(), prompt, CAROUSEL_IMAGE_RATIO)
            .await?;

        self.update(|s| {
            let current = match s.active_carousel() {
                Some(c) if c.id == carousel_id && c.slide(slide_id).is_some() => c,
                _ => {
                    warn!(slide_id, "carousel changed during regeneration; dropping the result");
                    return Ok(());
                }
            };
            let updated = current.map_slide(slide_id, |slide| CarouselSlide {
                image_prompt: prompt.to_string(),
                image_url: image.data_url(),
                ..slide.clone()
            });
            s.replace_carousel(updated);
            Ok(())
        })
    }

    /// Narrates `"{title}. {subtitle}"` of the active creative and attaches the audio.
    pub async fn attach_audio(&self) -> Result<String> {
        let (creative_id, narration) = {
            let state = self.lock();
            let creative = state.require_creative()?;
            (creative.id.clone(), narration_text(creative))
        };
        let audio = self.session.generate_speech(&narration).await?;

        self.update(|s| {
            let creative = s.require_creative()?;
            if creative.id != creative_id {
                warn!(
                    creative_id = %creative_id,
                    "selection changed during narration; dropping the audio"
                );
                return Ok(());
            }
            let mut updated = creative.clone();
            updated.audio_b64 = Some(audio.data);
            s.replace_creative(updated);
            Ok(())
        })?;
        Ok(narration)
    }

    pub fn remove_audio(&self) -> Result<()> {
        self.update(|s| {
            let mut updated = s.require_creative()?.clone();
            updated.audio_b64 = None;
            s.replace_creative(updated);
            Ok(())
        })
    }

    pub fn set_aspect_ratio(&self, ratio: AspectRatio) -> Result<()> {
        self.update(|s| {
            s.aspect_ratio = ratio;
            Ok(())
        })
    }

    pub fn set_preview_zoom(&self, zoom: f32) -> Result<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ForgeError::validation(format!(
                "Preview zoom must be greater than zero, got {zoom}"
            )));
        }
        self.update(|s| {
            s.preview_zoom = zoom;
            Ok(())
        })
    }

    /// Copies the active creative or carousel into history.
    pub fn save_active_to_history(&self, history: &mut HistoryStore) -> Result<SaveOutcome> {
        let item = {
            let state = self.lock();
            match &state.active {
                Some(ActiveCreative::Single(creative)) => HistoryItem::Single(AdCreative {
                    settings: Some(state.editor_settings.clone()),
                    ..creative.clone()
                }),
                Some(ActiveCreative::Carousel(carousel)) => HistoryItem::Carousel(carousel.clone()),
                None => {
                    return Err(ForgeError::validation(
                        "No active creative or carousel in the workspace.",
                    ))
                }
            }
        };
        Ok(history.save(item))
    }
}

/// Selects `selection` in `markup`, applies `command` and returns the rewritten markup.
fn styled_markup(markup: &str, selection: Selection, command: &InlineCommand) -> Result<String> {
    let mut text = EditableText::new(markup);
    text.select(selection.start, selection.end);
    text.apply_inline_style(command)?;
    Ok(text.markup())
}

pub fn narration_text(creative: &AdCreative) -> String {
    format!(
        "{}. {}",
        RichText::parse(&creative.title).plain_text().trim(),
        RichText::parse(&creative.subtitle).plain_text().trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::storage::{MemoryStore, Stores};
    use crate::style::{LayoutPreset, TextAlign};
    use crate::testing::{sample_carousel, sample_creatives, StubCollaborator};

    fn controller_with(stub: StubCollaborator) -> EditingController {
        let session = Session::new(Arc::new(stub), CredentialStore::new(Stores::in_memory()));
        session
            .set_credential("AIzaSyA-test-key-0123456789", false)
            .unwrap();
        EditingController::new(Arc::new(session), WorkspaceState::default())
    }

    fn with_single() -> EditingController {
        let controller = controller_with(StubCollaborator::new());
        controller
            .apply_generation(GenerationOutcome::Single(sample_creatives(3)), None)
            .unwrap();
        controller
    }

    fn with_carousel(n: usize) -> EditingController {
        let controller = controller_with(StubCollaborator::new());
        controller
            .apply_generation(GenerationOutcome::Carousel(sample_carousel(n)), None)
            .unwrap();
        controller
    }

    fn slide_ids(controller: &EditingController) -> Vec<String> {
        controller
            .snapshot()
            .active_carousel()
            .map(|c| c.slides.iter().map(|s| s.id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn apply_generation_selects_first_creative() {
        let controller = with_single();
        let state = controller.snapshot();
        assert_eq!(state.variations.len(), 3);
        assert_eq!(state.active_creative().map(|c| &c.id), Some(&state.variations[0].id));
        assert_eq!(state.editor_settings, StyleSettings::default());
    }

    #[test]
    fn update_field_keeps_variation_and_active_in_sync() {
        let controller = with_single();
        let id = controller.snapshot().variations[1].id.clone();
        controller.select_creative(&id).unwrap();
        controller.update_field(TextField::Title, "New headline").unwrap();

        let state = controller.snapshot();
        let active = state.active_creative().unwrap();
        let variation = state.variations.iter().find(|c| c.id == id).unwrap();
        assert_eq!(active.title, "New headline");
        assert_eq!(variation, active);
    }

    #[test]
    fn selecting_a_creative_clears_the_carousel() {
        let controller = with_carousel(2);
        controller
            .select_from_history(&HistoryItem::Single(sample_creatives(1).remove(0)))
            .unwrap();
        let state = controller.snapshot();
        assert!(state.active_carousel().is_none());
        assert!(state.active_creative().is_some());
        assert_eq!(state.variations.len(), 1);
    }

    #[test]
    fn history_selection_reconciles_variations() {
        let controller = with_single();
        let mut saved = controller.snapshot().variations[2].clone();
        saved.title = "from history".into();
        controller
            .select_from_history(&HistoryItem::Single(saved.clone()))
            .unwrap();

        let state = controller.snapshot();
        assert_eq!(state.variations.len(), 3);
        assert_eq!(state.variations[2].title, "from history");
        assert_eq!(state.active_creative(), Some(&saved));
    }

    #[test]
    fn reorder_moves_a_single_slide() {
        let controller = with_carousel(4);
        let before = controller.snapshot().active_carousel().cloned().unwrap();
        let ids = slide_ids(&controller);

        assert!(controller.reorder_slides(2, 0).unwrap());
        let after = controller.snapshot().active_carousel().cloned().unwrap();
        assert_eq!(
            slide_ids(&controller),
            [ids[2].clone(), ids[0].clone(), ids[1].clone(), ids[3].clone()]
        );
        assert_eq!(after.slides[0], before.slides[2]);
        assert_eq!(after.id, before.id);
    }

    #[test]
    fn reorder_out_of_range_is_a_noop() {
        let controller = with_carousel(3);
        let revision = controller.snapshot().revision;
        let ids = slide_ids(&controller);
        assert!(!controller.reorder_slides(0, 3).unwrap());
        assert!(!controller.reorder_slides(5, 0).unwrap());
        assert_eq!(slide_ids(&controller), ids);
        assert_eq!(controller.snapshot().revision, revision);
    }

    #[test]
    fn update_slide_field_touches_only_that_slide() {
        let controller = with_carousel(3);
        let before = controller.snapshot().active_carousel().cloned().unwrap();
        let target = before.slides[1].id.clone();
        controller
            .update_slide_field(&target, SlideField::Subtitle, "changed")
            .unwrap();
        let after = controller.snapshot().active_carousel().cloned().unwrap();
        assert_eq!(after.slides[1].subtitle, "changed");
        assert_eq!(after.slides[0], before.slides[0]);
        assert_eq!(after.slides[2], before.slides[2]);
        assert!(controller
            .update_slide_field("missing", SlideField::Title, "x")
            .is_err());
    }

    #[test]
    fn global_style_keeps_per_slide_alignment() {
        let controller = with_carousel(2);
        let ids = slide_ids(&controller);
        let left = StyleSettings {
            text_align: TextAlign::Left,
            ..initial_carousel_slide_settings()
        };
        let right = StyleSettings {
            text_align: TextAlign::Right,
            ..initial_carousel_slide_settings()
        };
        controller.apply_style(Some(&ids[0]), left).unwrap();
        controller.apply_style(Some(&ids[1]), right).unwrap();

        let subset = GlobalStyle {
            text_color: Some("#FF0000".into()),
            ..GlobalStyle::default()
        };
        let change = controller.preview_global_style(&subset).unwrap();
        assert_eq!(change.kind, ChangeKind::GlobalStyle);
        assert_eq!(change.affected.len(), 2);
        assert_eq!(change.changed_fields, ["textColor"]);

        // Nothing is applied before confirmation.
        let state = controller.snapshot();
        assert_eq!(state.active_carousel().unwrap().slides[0].settings.text_color, "#FFFFFF");

        controller.confirm(&change).unwrap();
        let slides = controller.snapshot().active_carousel().cloned().unwrap().slides;
        assert_eq!(slides[0].settings.text_color, "#FF0000");
        assert_eq!(slides[1].settings.text_color, "#FF0000");
        assert_eq!(slides[0].settings.text_align, TextAlign::Left);
        assert_eq!(slides[1].settings.text_align, TextAlign::Right);
    }

    #[test]
    fn stale_preview_cannot_be_confirmed() {
        let controller = with_carousel(2);
        let change = controller
            .preview_preset(&LayoutPreset::Bold.settings())
            .unwrap();
        controller.update_caption("edited meanwhile").unwrap();
        assert!(matches!(
            controller.confirm(&change),
            Err(ForgeError::Validation(_))
        ));
    }

    #[test]
    fn preset_on_single_updates_panel_and_variation() {
        let controller = with_single();
        let preset = LayoutPreset::Classic.settings();
        let change = controller.preview_preset(&preset).unwrap();
        controller.confirm(&change).unwrap();

        let state = controller.snapshot();
        assert_eq!(state.editor_settings, preset);
        assert_eq!(state.active_creative().unwrap().settings.as_ref(), Some(&preset));
        assert_eq!(state.variations[0].settings.as_ref(), Some(&preset));
    }

    #[test]
    fn reset_discards_session_but_not_history() {
        let controller = with_single();
        let mut history = HistoryStore::load(MemoryStore::shared());
        controller.save_active_to_history(&mut history).unwrap();

        let change = controller.preview_reset();
        assert_eq!(change.affected.len(), 3);
        controller.confirm(&change).unwrap();

        let state = controller.snapshot();
        assert!(state.variations.is_empty());
        assert!(state.active.is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn add_slide_appends_placeholder() {
        let controller = with_carousel(2);
        let id = controller.add_slide().unwrap();
        let carousel = controller.snapshot().active_carousel().cloned().unwrap();
        let added = carousel.slides.last().unwrap();
        assert_eq!(added.id, id);
        assert_eq!(added.title, NEW_SLIDE_TITLE);
        assert_eq!(added.image_url, placeholder_image_url());
        assert_eq!(added.settings, initial_carousel_slide_settings());
        assert!(!controller.statuses().is_generating(&id));
    }

    #[test]
    fn inline_style_rewrites_field_markup() {
        let controller = with_single();
        controller.update_field(TextField::Title, "Fresh beans").unwrap();
        controller
            .apply_inline_style(TextField::Title, Selection::new(6, 11), &InlineCommand::Bold)
            .unwrap();
        let state = controller.snapshot();
        assert_eq!(state.active_creative().unwrap().title, "Fresh <b>beans</b>");
    }

    #[test]
    fn slide_inline_style_applies_to_that_slide_only() {
        let controller = with_carousel(2);
        let ids = slide_ids(&controller);
        controller
            .update_slide_field(&ids[1], SlideField::Title, "Go green")
            .unwrap();
        controller
            .apply_slide_inline_style(
                &ids[1],
                SlideField::Title,
                Selection::new(0, 2),
                &InlineCommand::ForeColor("#00ff00".into()),
            )
            .unwrap();
        let carousel = controller.snapshot().active_carousel().cloned().unwrap();
        assert_eq!(
            carousel.slides[1].title,
            "<span style=\"color:#00FF00\">Go</span> green"
        );
        assert!(!carousel.slides[0].title.contains("<span"));

        let err = controller
            .apply_slide_inline_style(
                &ids[1],
                SlideField::Title,
                Selection::new(4, 4),
                &InlineCommand::Bold,
            )
            .unwrap_err();
        assert!(matches!(err, ForgeError::Validation(_)));
    }

    #[test]
    fn failed_edit_does_not_bump_revision() {
        let controller = with_single();
        let revision = controller.snapshot().revision;
        assert!(controller.update_caption("no carousel").is_err());
        assert_eq!(controller.snapshot().revision, revision);
    }

    #[test]
    fn workspace_round_trips_through_the_store() {
        let store = MemoryStore::shared();
        let session = Arc::new(Session::new(
            Arc::new(StubCollaborator::new()),
            CredentialStore::new(Stores::in_memory()),
        ));
        let controller = EditingController::load(session.clone(), store.clone());
        controller
            .apply_generation(GenerationOutcome::Carousel(sample_carousel(2)), None)
            .unwrap();
        controller.set_preview_zoom(0.5).unwrap();

        let reloaded = EditingController::load(session, store);
        assert_eq!(reloaded.snapshot(), controller.snapshot());
    }

    #[tokio::test]
    async fn failed_regeneration_keeps_old_image_and_clears_flag() {
        let stub = StubCollaborator::new()
            .fail_images_with(|| ForgeError::api(None, "generate the image", "boom"));
        let controller = controller_with(stub);
        controller
            .apply_generation(GenerationOutcome::Carousel(sample_carousel(2)), None)
            .unwrap();
        let before = controller.snapshot().active_carousel().cloned().unwrap();
        let id = before.slides[0].id.clone();

        let err = controller
            .regenerate_slide_image(&id, "a new prompt")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
        let after = controller.snapshot().active_carousel().cloned().unwrap();
        assert_eq!(after.slides[0].image_url, before.slides[0].image_url);
        assert_eq!(after.slides[0].image_prompt, before.slides[0].image_prompt);
        assert!(!controller.statuses().is_generating(&id));
    }

    #[tokio::test]
    async fn successful_regeneration_replaces_prompt_and_image() {
        let controller = with_carousel(2);
        let id = slide_ids(&controller)[1].clone();
        controller
            .regenerate_slide_image(&id, "neon city")
            .await
            .unwrap();
        let slide = controller
            .snapshot()
            .active_carousel()
            .and_then(|c| c.slide(&id).cloned())
            .unwrap();
        assert_eq!(slide.image_prompt, "neon city");
        assert!(slide.image_url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_regeneration_of_same_slide_is_refused() {
        let stub = StubCollaborator::new().with_image_delay(std::time::Duration::from_secs(5));
        let calls = stub.calls();
        let controller = controller_with(stub);
        controller
            .apply_generation(GenerationOutcome::Carousel(sample_carousel(1)), None)
            .unwrap();
        let id = slide_ids(&controller)[0].clone();

        let (first, second) = tokio::join!(
            controller.regenerate_slide_image(&id, "first"),
            controller.regenerate_slide_image(&id, "second"),
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(ForgeError::Validation(_))));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attach_audio_narrates_plain_title_and_subtitle() {
        let stub = StubCollaborator::new();
        let calls = stub.calls();
        let controller = controller_with(stub);
        controller
            .apply_generation(GenerationOutcome::Single(sample_creatives(2)), None)
            .unwrap();
        controller.update_field(TextField::Title, "<b>Big</b> news").unwrap();

        let narration = controller.attach_audio().await.unwrap();
        let state = controller.snapshot();
        let subtitle = &state.active_creative().unwrap().subtitle;
        assert_eq!(narration, format!("Big news. {subtitle}"));
        assert!(state.active_creative().unwrap().audio_b64.is_some());
        assert_eq!(state.variations[0].audio_b64, state.active_creative().unwrap().audio_b64);
        assert_eq!(
            calls.lock().unwrap().last().cloned(),
            Some(format!("generate_speech:{narration}"))
        );

        controller.remove_audio().unwrap();
        let state = controller.snapshot();
        assert!(state.active_creative().unwrap().audio_b64.is_none());
        assert!(state.variations[0].audio_b64.is_none());
    }
}
