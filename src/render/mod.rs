//! Rasterization of creatives and slides to PNG.
//!
//! This module provides:
//! - [`Scene`] - a read-only presentation of one creative or slide
//! - [`Rasterizer`] - turns a scene into encoded image bytes
//! - [`SvgRasterizer`] - SVG scene builder rendered with `resvg`
//! - [`OffscreenSurface`] - the single mount slot exports go through

pub mod raster;
pub mod surface;
pub mod svg;

pub use raster::SvgRasterizer;
pub use surface::{DecodingImageLoader, ImageLoader, MountedScene, OffscreenSurface};
pub use svg::scene_to_svg;

use serde::Serialize;

use crate::error::Result;
use crate::orchestrator::CAROUSEL_IMAGE_RATIO;
use crate::style::StyleSettings;
use crate::types::{AdCreative, AspectRatio, CarouselSlide};

/// One visual layer of a scene, painted back to front.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum SceneNode {
    Background { image_url: String },
    Overlay,
    /// Inline markup, see [`crate::editor::RichText`].
    Title { markup: String },
    Subtitle { markup: String },
    /// Floating editing controls of the live preview.
    Toolbar,
}

impl SceneNode {
    pub fn is_toolbar(&self) -> bool {
        matches!(self, SceneNode::Toolbar)
    }
}

/// Everything needed to paint one creative at its logical (1x) size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub settings: StyleSettings,
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    fn build(
        ratio: AspectRatio,
        settings: StyleSettings,
        image_url: &str,
        title: &str,
        subtitle: &str,
    ) -> Self {
        let (width, height) = ratio.logical_size();
        Self {
            width,
            height,
            settings,
            nodes: vec![
                SceneNode::Background {
                    image_url: image_url.to_string(),
                },
                SceneNode::Overlay,
                SceneNode::Title {
                    markup: title.to_string(),
                },
                SceneNode::Subtitle {
                    markup: subtitle.to_string(),
                },
            ],
        }
    }

    /// The live preview of a single creative, editing toolbar included.
    pub fn for_creative(
        creative: &AdCreative,
        settings: &StyleSettings,
        ratio: AspectRatio,
    ) -> Self {
        let mut scene = Self::build(
            ratio,
            settings.clone(),
            &creative.image_url,
            &creative.title,
            &creative.subtitle,
        );
        scene.nodes.push(SceneNode::Toolbar);
        scene
    }

    /// Read-only presentation of one carousel slide.
    pub fn for_slide(slide: &CarouselSlide) -> Self {
        Self::build(
            CAROUSEL_IMAGE_RATIO,
            slide.settings.clone(),
            &slide.image_url,
            &slide.title,
            &slide.subtitle,
        )
    }

    /// Copy keeping only the nodes accepted by `keep`.
    pub fn filtered(&self, keep: impl Fn(&SceneNode) -> bool) -> Scene {
        Scene {
            width: self.width,
            height: self.height,
            settings: self.settings.clone(),
            nodes: self.nodes.iter().filter(|n| keep(n)).cloned().collect(),
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        self.nodes.iter().find_map(|n| match n {
            SceneNode::Background { image_url } => Some(image_url.as_str()),
            _ => None,
        })
    }
}

/// Output options for one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Device pixels per logical pixel.
    pub pixel_ratio: f32,
    /// Hex color painted under the scene.
    pub background: String,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            background: "#ffffff".to_string(),
        }
    }
}

impl RasterOptions {
    pub fn output_size(&self, scene: &Scene) -> (u32, u32) {
        let scale = |v: u32| ((v as f32) * self.pixel_ratio).round().max(1.0) as u32;
        (scale(scene.width), scale(scene.height))
    }
}

/// Turns a scene into encoded PNG bytes.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, scene: &Scene, options: &RasterOptions) -> Result<Vec<u8>>;
}
