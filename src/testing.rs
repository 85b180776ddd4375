//! Deterministic stand-ins for the external collaborators.
//!
//! Used by the unit and integration tests, and by the CLI when `ADFORGE_MOCK_AI` is set so the
//! whole flow can run offline.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

use crate::error::{ForgeError, Result};
use crate::export::FileSink;
use crate::gemini::AiCollaborator;
use crate::render::{ImageLoader, RasterOptions, Rasterizer, Scene};
use crate::style::initial_carousel_slide_settings;
use crate::types::{
    new_id, AdCopyVariation, AdCreative, AspectRatio, CarouselCreative, CarouselPlan,
    CarouselSlide, InlineMedia, SlidePlan,
};

type ErrorFactory = Arc<dyn Fn() -> ForgeError + Send + Sync>;

/// A 2x2 opaque PNG.
pub fn tiny_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(2, 2, Rgba([200, 120, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    // In-memory encoding of a valid buffer does not fail.
    let _ = DynamicImage::ImageRgba8(img).write_to(&mut out, ImageOutputFormat::Png);
    out.into_inner()
}

pub fn tiny_png_media() -> InlineMedia {
    InlineMedia::from_bytes(&tiny_png(), "image/png")
}

pub fn sample_variation(i: usize) -> AdCopyVariation {
    AdCopyVariation {
        title: format!("Title {i}"),
        subtitle: format!("Subtitle {i}"),
        body: format!("Body {i}"),
        caption: format!("Caption {i} #ad"),
        background_prompt: format!("background {i}"),
    }
}

/// `n` creatives as a single-mode generation would assemble them.
pub fn sample_creatives(n: usize) -> Vec<AdCreative> {
    let url = tiny_png_media().data_url();
    (1..=n)
        .map(|i| AdCreative::from_variation(new_id("creative"), sample_variation(i), url.clone()))
        .collect()
}

/// A carousel of `n` slides with the carousel default settings.
pub fn sample_carousel(n: usize) -> CarouselCreative {
    let url = tiny_png_media().data_url();
    CarouselCreative {
        id: new_id("carousel"),
        slides: (1..=n)
            .map(|i| CarouselSlide {
                id: new_id("slide"),
                title: format!("Slide {i}"),
                subtitle: format!("Subtitle {i}"),
                image_prompt: format!("slide {i} prompt"),
                image_url: url.clone(),
                settings: initial_carousel_slide_settings(),
            })
            .collect(),
        caption: "Swipe through #carousel".to_string(),
    }
}

/// Scripted AI collaborator. Every call is appended to [`StubCollaborator::calls`] before any
/// delay or failure applies.
#[derive(Clone, Default)]
pub struct StubCollaborator {
    calls: Arc<Mutex<Vec<String>>>,
    image_failure: Option<ErrorFactory>,
    image_failure_pattern: Option<String>,
    copy_failure: Option<ErrorFactory>,
    image_delay: Option<Duration>,
    slide_count: Option<usize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl StubCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    /// Highest number of image requests observed in flight at once.
    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        self.max_in_flight.clone()
    }

    /// Every image request fails with `make()`.
    pub fn fail_images_with(
        mut self,
        make: impl Fn() -> ForgeError + Send + Sync + 'static,
    ) -> Self {
        self.image_failure = Some(Arc::new(make));
        self.image_failure_pattern = None;
        self
    }

    /// Image requests whose prompt contains `pattern` fail with `make()`.
    pub fn fail_images_matching(
        mut self,
        pattern: &str,
        make: impl Fn() -> ForgeError + Send + Sync + 'static,
    ) -> Self {
        self.image_failure = Some(Arc::new(make));
        self.image_failure_pattern = Some(pattern.to_string());
        self
    }

    /// Ad copy and carousel planning fail with `make()`.
    pub fn fail_copy_with(mut self, make: impl Fn() -> ForgeError + Send + Sync + 'static) -> Self {
        self.copy_failure = Some(Arc::new(make));
        self
    }

    pub fn with_image_delay(mut self, delay: Duration) -> Self {
        self.image_delay = Some(delay);
        self
    }

    /// Plans carry `count` slides regardless of the requested count.
    pub fn with_slide_count(mut self, count: usize) -> Self {
        self.slide_count = Some(count);
        self
    }

    fn record(&self, call: String) {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }

    fn copy_result(&self) -> Result<()> {
        match &self.copy_failure {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }

    async fn image(&self, prompt: &str) -> Result<InlineMedia> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.image_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fails = match (&self.image_failure, &self.image_failure_pattern) {
            (Some(_), Some(pattern)) => prompt.contains(pattern.as_str()),
            (Some(_), None) => true,
            (None, _) => false,
        };
        match &self.image_failure {
            Some(make) if fails => Err(make()),
            _ => Ok(tiny_png_media()),
        }
    }
}

#[async_trait]
impl AiCollaborator for StubCollaborator {
    async fn generate_ad_copy(
        &self,
        _api_key: &str,
        _project_context: &str,
        count: usize,
    ) -> Result<Vec<AdCopyVariation>> {
        self.record(format!("generate_ad_copy:{count}"));
        self.copy_result()?;
        Ok((1..=count).map(sample_variation).collect())
    }

    async fn generate_carousel_plan(
        &self,
        _api_key: &str,
        _project_context: &str,
        _style_guide: &str,
        has_expert_image: bool,
        slide_count: usize,
    ) -> Result<CarouselPlan> {
        self.record(format!(
            "generate_carousel_plan:{slide_count}:{has_expert_image}"
        ));
        self.copy_result()?;
        let n = self.slide_count.unwrap_or(slide_count);
        Ok(CarouselPlan {
            caption: "Swipe through #carousel".to_string(),
            slides: (1..=n)
                .map(|i| SlidePlan {
                    image_prompt: format!("slide {i} prompt"),
                    title: format!("Slide {i}"),
                    subtitle: format!("Subtitle {i}"),
                })
                .collect(),
        })
    }

    async fn generate_image(
        &self,
        _api_key: &str,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia> {
        self.record(format!("generate_image:{prompt}:{ratio}"));
        self.image(prompt).await
    }

    async fn recreate_with_subject(
        &self,
        _api_key: &str,
        _subject: &InlineMedia,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia> {
        self.record(format!("recreate_with_subject:{prompt}:{ratio}"));
        self.image(prompt).await
    }

    async fn transcribe_audio(&self, _api_key: &str, audio: &InlineMedia) -> Result<String> {
        self.record(format!("transcribe_audio:{}", audio.mime_type));
        Ok("Launch eco coffee beans for remote workers.".to_string())
    }

    async fn extract_text(&self, _api_key: &str, document: &InlineMedia) -> Result<String> {
        self.record(format!("extract_text:{}", document.mime_type));
        Ok("Brand guide: earthy tones, friendly voice.".to_string())
    }

    async fn generate_alternative_hooks(
        &self,
        _api_key: &str,
        _context: &str,
    ) -> Result<Vec<String>> {
        self.record("generate_alternative_hooks".to_string());
        self.copy_result()?;
        Ok((1..=3).map(|i| format!("Hook {i}")).collect())
    }

    async fn generate_alternative_captions(
        &self,
        _api_key: &str,
        _context: &str,
    ) -> Result<Vec<String>> {
        self.record("generate_alternative_captions".to_string());
        self.copy_result()?;
        Ok((1..=3).map(|i| format!("Caption option {i}")).collect())
    }

    async fn generate_speech(&self, _api_key: &str, text: &str) -> Result<InlineMedia> {
        self.record(format!("generate_speech:{text}"));
        Ok(InlineMedia::from_bytes(b"RIFF\x24\x00\x00\x00WAVEfmt ", "audio/wav"))
    }
}

/// Rasterizer returning a fixed PNG; fails for scenes whose background URL was marked.
#[derive(Clone, Default)]
pub struct StubRasterizer {
    failing_urls: Arc<Mutex<HashSet<String>>>,
    captured: Arc<Mutex<Vec<Scene>>>,
}

impl StubRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for_image(self, url: &str) -> Self {
        if let Ok(mut urls) = self.failing_urls.lock() {
            urls.insert(url.to_string());
        }
        self
    }

    /// Scenes captured so far, in order.
    pub fn captured(&self) -> Vec<Scene> {
        self.captured.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Rasterizer for StubRasterizer {
    fn rasterize(&self, scene: &Scene, options: &RasterOptions) -> Result<Vec<u8>> {
        if let Ok(mut captured) = self.captured.lock() {
            captured.push(scene.clone());
        }
        let failing = self
            .failing_urls
            .lock()
            .map(|urls| scene.image_url().is_some_and(|u| urls.contains(u)))
            .unwrap_or(false);
        if failing {
            return Err(ForgeError::render("background image is not available"));
        }
        let (w, h) = options.output_size(scene);
        Ok(format!("PNG {w}x{h}").into_bytes())
    }
}

/// Image loader that resolves immediately, except for URLs that never finish loading.
#[derive(Clone, Default)]
pub struct StubImageLoader {
    hanging: Arc<Mutex<HashSet<String>>>,
}

impl StubImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn never_load(self, url: &str) -> Self {
        if let Ok(mut urls) = self.hanging.lock() {
            urls.insert(url.to_string());
        }
        self
    }
}

#[async_trait]
impl ImageLoader for StubImageLoader {
    async fn load(&self, url: &str) -> Result<()> {
        let hangs = self
            .hanging
            .lock()
            .map(|urls| urls.contains(url))
            .unwrap_or(false);
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Collects saved files in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    files: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .map(|f| f.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().ok().and_then(|f| {
            f.iter()
                .find(|(n, _)| n == name)
                .map(|(_, bytes)| bytes.clone())
        })
    }
}

impl FileSink for MemorySink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.files
            .lock()
            .map_err(|_| ForgeError::Storage("memory sink lock poisoned".to_string()))?
            .push((name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(name))
    }
}
