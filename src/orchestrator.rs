//! Multi-step generation pipeline: copy or plan first, then background images, then assembly.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::{ForgeError, Result};
use crate::progress::{report, ProgressCallback};
use crate::session::Session;
use crate::style::initial_carousel_slide_settings;
use crate::types::{new_id, AdCreative, AspectRatio, CarouselCreative, CarouselSlide, InlineMedia};

/// Single creatives are generated square; carousel slides are portrait.
pub const SINGLE_IMAGE_RATIO: AspectRatio = AspectRatio::Square;
pub const CAROUSEL_IMAGE_RATIO: AspectRatio = AspectRatio::Portrait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Single,
    Carousel,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Single => f.write_str("single"),
            GenerationMode::Carousel => f.write_str("carousel"),
        }
    }
}

impl FromStr for GenerationMode {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(GenerationMode::Single),
            "carousel" => Ok(GenerationMode::Carousel),
            other => Err(ForgeError::validation(format!(
                "unknown generation mode '{other}' (expected single or carousel)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub project_context: String,
    /// Visual style guide shared by every image prompt.
    pub style_guide_prompt: String,
    pub mode: GenerationMode,
    /// Subject photo to recreate inside each generated scene.
    pub expert_image: Option<InlineMedia>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Single(Vec<AdCreative>),
    Carousel(CarouselCreative),
}

pub struct GenerationOrchestrator {
    session: Arc<Session>,
    config: GenerationConfig,
}

impl GenerationOrchestrator {
    pub fn new(session: Arc<Session>, config: GenerationConfig) -> Self {
        Self { session, config }
    }

    /// Runs the whole pipeline. Any failed step aborts the rest and nothing partial is returned.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<GenerationOutcome> {
        if request.project_context.trim().is_empty() {
            return Err(ForgeError::validation(
                "Provide the project context or the ad strategy.",
            ));
        }
        info!(
            mode = %request.mode,
            expert_image = request.expert_image.is_some(),
            "starting generation"
        );

        let outcome = match request.mode {
            GenerationMode::Single => self.generate_single(request, progress.as_ref()).await?,
            GenerationMode::Carousel => self.generate_carousel(request, progress.as_ref()).await?,
        };
        info!(mode = %request.mode, "generation finished");
        Ok(outcome)
    }

    async fn generate_single(
        &self,
        request: &GenerationRequest,
        progress: Option<&ProgressCallback>,
    ) -> Result<GenerationOutcome> {
        report(progress, "Step 1/3: writing ad copy and strategy\u{2026}");
        let variations = self
            .session
            .generate_ad_copy(&request.project_context, self.config.variations)
            .await?;
        if variations.is_empty() {
            return Err(ForgeError::api(
                None,
                "generate the ad copy",
                "the response contained no variations",
            ));
        }

        // One request at a time: image N+1 is not issued before image N has resolved.
        let total = variations.len();
        let mut images = Vec::with_capacity(total);
        for (i, variation) in variations.iter().enumerate() {
            report(
                progress,
                &format!("Step 2/3: generating image {}/{}\u{2026}", i + 1, total),
            );
            let prompt = combined_prompt(&request.style_guide_prompt, &variation.background_prompt);
            debug!(index = i + 1, total, "requesting variation image");
            let image = self
                .session
                .background_image(request.expert_image.as_ref(), &prompt, SINGLE_IMAGE_RATIO)
                .await?;
            images.push(image);
        }

        report(progress, "Step 3/3: assembling creatives\u{2026}");
        let creatives = variations
            .into_iter()
            .zip(images)
            .map(|(variation, image)| {
                AdCreative::from_variation(new_id("creative"), variation, image.data_url())
            })
            .collect();
        Ok(GenerationOutcome::Single(creatives))
    }

    async fn generate_carousel(
        &self,
        request: &GenerationRequest,
        progress: Option<&ProgressCallback>,
    ) -> Result<GenerationOutcome> {
        report(progress, "Step 1/3: planning the carousel\u{2026}");
        let plan = self
            .session
            .generate_carousel_plan(
                &request.project_context,
                &request.style_guide_prompt,
                request.expert_image.is_some(),
                self.config.carousel_slides,
            )
            .await?;
        if plan.slides.is_empty() {
            return Err(ForgeError::api(
                None,
                "plan the carousel",
                "the plan contained no slides",
            ));
        }

        report(
            progress,
            &format!(
                "Step 2/3: generating {} slide images\u{2026}",
                plan.slides.len()
            ),
        );
        // All slide requests start together; the first failure fails the join.
        let images = try_join_all(plan.slides.iter().map(|slide| {
            self.session.background_image(
                request.expert_image.as_ref(),
                &slide.image_prompt,
                CAROUSEL_IMAGE_RATIO,
            )
        }))
        .await?;

        report(progress, "Step 3/3: assembling the carousel\u{2026}");
        let settings = initial_carousel_slide_settings();
        let slides = plan
            .slides
            .into_iter()
            .zip(images)
            .map(|(slide, image)| CarouselSlide {
                id: new_id("slide"),
                title: slide.title,
                subtitle: slide.subtitle,
                image_prompt: slide.image_prompt,
                image_url: image.data_url(),
                settings: settings.clone(),
            })
            .collect();

        Ok(GenerationOutcome::Carousel(CarouselCreative {
            id: new_id("carousel"),
            slides,
            caption: plan.caption,
        }))
    }
}

/// Style guide first, then the variation's own background prompt.
pub fn combined_prompt(style_guide: &str, background_prompt: &str) -> String {
    let style_guide = style_guide.trim();
    if style_guide.is_empty() {
        background_prompt.trim().to_string()
    } else {
        format!("{style_guide}. {}", background_prompt.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_prompt_joins_style_guide_and_background() {
        assert_eq!(
            combined_prompt("warm film look", "coffee beans on oak"),
            "warm film look. coffee beans on oak"
        );
        assert_eq!(combined_prompt("  ", "coffee beans"), "coffee beans");
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Carousel".parse::<GenerationMode>().unwrap(), GenerationMode::Carousel);
        assert!("grid".parse::<GenerationMode>().is_err());
    }
}
