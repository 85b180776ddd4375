//! PNG export of the active creative and of carousel slides.
//!
//! Slide exports go through the [`OffscreenSurface`] one at a time, in slide order. A failed
//! slide is recorded in the [`ExportReport`] and the batch moves on to the next one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::ExportConfig;
use crate::editor::{SlideStatusMap, WorkspaceState};
use crate::error::{ErrorCategory, ForgeError, Result};
use crate::progress::{report, ProgressCallback};
use crate::render::{ImageLoader, OffscreenSurface, RasterOptions, Rasterizer, Scene};
use crate::types::{AspectRatio, CarouselCreative, CarouselSlide};

/// Receives finished files.
pub trait FileSink: Send + Sync {
    /// Stores `bytes` under `name` and returns where they went.
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes files into one directory, through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let temp_path = self.dir.join(format!(".{name}.tmp"));
        std::fs::write(&temp_path, bytes)?;
        if let Err(e) = std::fs::rename(&temp_path, &path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub name: String,
    pub path: PathBuf,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_id: Option<String>,
    /// 1-based slide position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFailure {
    pub slide_id: String,
    pub position: usize,
    pub category: ErrorCategory,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub files: Vec<ExportedFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ExportFailure>,
    /// Message of the last failure in the batch, the one shown to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, slide: &CarouselSlide, position: usize, err: &ForgeError) {
        let payload = err.to_payload();
        self.last_error = Some(payload.message.clone());
        self.failures.push(ExportFailure {
            slide_id: slide.id.clone(),
            position,
            category: payload.category,
            message: payload.message,
        });
    }
}

/// `{prefix}-{id}-{ratio}.png`, with the ratio's colon replaced so the name is portable.
pub fn creative_file_name(prefix: &str, creative_id: &str, ratio: AspectRatio) -> String {
    format!("{prefix}-{creative_id}-{}.png", ratio.as_str().replace(':', "x"))
}

pub fn slide_file_name(position: usize) -> String {
    format!("slide-{position}.png")
}

pub struct ExportDriver {
    rasterizer: Arc<dyn Rasterizer>,
    surface: OffscreenSurface,
    sink: Arc<dyn FileSink>,
    statuses: SlideStatusMap,
    config: ExportConfig,
}

impl ExportDriver {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        loader: Arc<dyn ImageLoader>,
        sink: Arc<dyn FileSink>,
        statuses: SlideStatusMap,
        config: ExportConfig,
    ) -> Self {
        let surface = OffscreenSurface::new(loader, config.paint_delay, config.settle_delay);
        Self {
            rasterizer,
            surface,
            sink,
            statuses,
            config,
        }
    }

    fn options(&self, pixel_ratio: f32) -> RasterOptions {
        RasterOptions {
            pixel_ratio,
            background: self.config.background.clone(),
        }
    }

    async fn rasterize(&self, scene: Scene, options: RasterOptions) -> Result<Vec<u8>> {
        let rasterizer = self.rasterizer.clone();
        tokio::task::spawn_blocking(move || rasterizer.rasterize(&scene, &options))
            .await
            .map_err(|e| ForgeError::render(format!("rasterizer task failed: {e}")))?
    }

    /// Captures the live single-creative preview at `pixel_ratio / zoom`, so the output size
    /// does not depend on the preview zoom.
    pub async fn download_active(&self, state: &WorkspaceState) -> Result<ExportReport> {
        let creative = state.require_creative()?;
        if !state.preview_zoom.is_finite() || state.preview_zoom <= 0.0 {
            return Err(ForgeError::validation("Preview zoom must be greater than zero."));
        }
        let scene = Scene::for_creative(creative, &state.editor_settings, state.aspect_ratio)
            .filtered(|n| !n.is_toolbar());
        let options = self.options(self.config.pixel_ratio / state.preview_zoom);

        let bytes = self.rasterize(scene, options).await?;
        let name = creative_file_name(&self.config.file_prefix, &creative.id, state.aspect_ratio);
        let path = self.sink.save(&name, &bytes)?;
        info!(file = %path.display(), bytes = bytes.len(), "exported creative");

        Ok(ExportReport {
            files: vec![ExportedFile {
                name,
                path,
                bytes: bytes.len(),
                slide_id: None,
                position: None,
            }],
            ..ExportReport::default()
        })
    }

    /// Exports every slide in order. Never fails as a whole; per-slide errors are in the report.
    pub async fn download_all_slides(
        &self,
        carousel: &CarouselCreative,
        progress: Option<ProgressCallback>,
    ) -> ExportReport {
        let mut report_out = ExportReport::default();
        let total = carousel.slides.len();
        for (index, slide) in carousel.slides.iter().enumerate() {
            let position = index + 1;
            report(
                progress.as_ref(),
                &format!("Exporting slide {position}/{total}\u{2026}"),
            );
            match self
                .export_slide(slide, position, self.config.image_load_timeout)
                .await
            {
                Ok(file) => report_out.files.push(file),
                Err(e) => {
                    error!(slide_id = %slide.id, position, error = %e, "slide export failed");
                    report_out.record_failure(slide, position, &e);
                }
            }
        }
        info!(
            exported = report_out.files.len(),
            failed = report_out.failures.len(),
            "carousel export finished"
        );
        report_out
    }

    /// Exports one slide, named by its current position.
    pub async fn download_one_slide(
        &self,
        carousel: &CarouselCreative,
        slide_id: &str,
    ) -> Result<ExportReport> {
        let index = carousel
            .slide_index(slide_id)
            .ok_or_else(|| ForgeError::validation(format!("Unknown slide id: {slide_id}")))?;
        let slide = &carousel.slides[index];
        let mut report_out = ExportReport::default();
        match self
            .export_slide(slide, index + 1, self.config.single_slide_image_load_timeout)
            .await
        {
            Ok(file) => report_out.files.push(file),
            Err(e) => {
                error!(slide_id, error = %e, "slide export failed");
                report_out.record_failure(slide, index + 1, &e);
            }
        }
        Ok(report_out)
    }

    async fn export_slide(
        &self,
        slide: &CarouselSlide,
        position: usize,
        load_timeout: Duration,
    ) -> Result<ExportedFile> {
        let _downloading = self.statuses.begin_downloading(&slide.id);
        let mounted = self.surface.mount(Scene::for_slide(slide)).await;
        let loaded = mounted.wait_until_ready(load_timeout).await;
        debug!(slide_id = %slide.id, position, image_loaded = loaded, "capturing slide");

        let scene = mounted.scene().filtered(|n| !n.is_toolbar());
        let bytes = self
            .rasterize(scene, self.options(self.config.pixel_ratio))
            .await?;
        drop(mounted);

        let name = slide_file_name(position);
        let path = self.sink.save(&name, &bytes)?;
        Ok(ExportedFile {
            name,
            path,
            bytes: bytes.len(),
            slide_id: Some(slide.id.clone()),
            position: Some(position),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_position_and_ratio() {
        assert_eq!(slide_file_name(3), "slide-3.png");
        assert_eq!(
            creative_file_name("ad-creative", "creative-1", AspectRatio::Story),
            "ad-creative-creative-1-9x16.png"
        );
    }

    #[test]
    fn directory_sink_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));
        let path = sink.save("slide-1.png", b"png").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
        assert!(!dir.path().join("out").join(".slide-1.png.tmp").exists());
    }
}
