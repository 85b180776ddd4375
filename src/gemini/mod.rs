//! Generative AI collaborator.
//!
//! This module provides:
//! - [`AiCollaborator`] - the seam the orchestrator and editor call through
//! - [`GeminiClient`] - REST implementation against the Generative Language API
//! - Prompt builders and response schemas ([`prompts`])
//! - Wire types for `generateContent` and `predict` ([`api_types`])

pub mod api_types;
pub mod client;
pub mod prompts;

pub use client::GeminiClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AdCopyVariation, AspectRatio, CarouselPlan, InlineMedia};

/// Everything the app asks of the AI service.
///
/// Every call receives the credential explicitly; implementations keep no key state.
/// Failures are already classified into the credential / quota / billing / generic taxonomy.
#[async_trait]
pub trait AiCollaborator: Send + Sync {
    async fn generate_ad_copy(
        &self,
        api_key: &str,
        project_context: &str,
        count: usize,
    ) -> Result<Vec<AdCopyVariation>>;

    async fn generate_carousel_plan(
        &self,
        api_key: &str,
        project_context: &str,
        style_guide: &str,
        has_expert_image: bool,
        slide_count: usize,
    ) -> Result<CarouselPlan>;

    /// Generates one background image for the given ratio.
    async fn generate_image(
        &self,
        api_key: &str,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia>;

    /// Recreates the subject of `subject` inside the scene described by `prompt`.
    async fn recreate_with_subject(
        &self,
        api_key: &str,
        subject: &InlineMedia,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia>;

    async fn transcribe_audio(&self, api_key: &str, audio: &InlineMedia) -> Result<String>;

    async fn extract_text(&self, api_key: &str, document: &InlineMedia) -> Result<String>;

    async fn generate_alternative_hooks(&self, api_key: &str, context: &str)
        -> Result<Vec<String>>;

    async fn generate_alternative_captions(
        &self,
        api_key: &str,
        context: &str,
    ) -> Result<Vec<String>>;

    /// Narrates `text`; returns base64 PCM/WAV audio.
    async fn generate_speech(&self, api_key: &str, text: &str) -> Result<InlineMedia>;
}
