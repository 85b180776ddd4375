use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::style::{initial_editor_settings, StyleSettings};

/// Generates a fresh opaque id such as `creative-1b4e28ba-2fa1-11d2-883f-0016d3cca427`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// Copy produced by the AI service for one ad variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCopyVariation {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub caption: String,
    pub background_prompt: String,
}

/// Editable text fields of a single creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    Title,
    Subtitle,
    Body,
}

/// Editable text fields of a carousel slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideField {
    Title,
    Subtitle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCreative {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub caption: String,
    pub background_prompt: String,
    /// Self-contained `data:` URL of the background image.
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<StyleSettings>,
    #[serde(default, rename = "audioB64", skip_serializing_if = "Option::is_none")]
    pub audio_b64: Option<String>,
}

impl AdCreative {
    pub fn from_variation(id: String, variation: AdCopyVariation, image_url: String) -> Self {
        Self {
            id,
            title: variation.title,
            subtitle: variation.subtitle,
            body: variation.body,
            caption: variation.caption,
            background_prompt: variation.background_prompt,
            image_url,
            settings: Some(initial_editor_settings()),
            audio_b64: None,
        }
    }

    /// Stored settings, or the single-creative defaults when absent.
    pub fn effective_settings(&self) -> StyleSettings {
        self.settings.clone().unwrap_or_else(initial_editor_settings)
    }

    pub fn field(&self, field: TextField) -> &str {
        match field {
            TextField::Title => &self.title,
            TextField::Subtitle => &self.subtitle,
            TextField::Body => &self.body,
        }
    }

    pub fn with_field(&self, field: TextField, value: String) -> Self {
        let mut next = self.clone();
        match field {
            TextField::Title => next.title = value,
            TextField::Subtitle => next.subtitle = value,
            TextField::Body => next.body = value,
        }
        next
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselSlide {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub image_prompt: String,
    pub image_url: String,
    pub settings: StyleSettings,
}

impl CarouselSlide {
    pub fn field(&self, field: SlideField) -> &str {
        match field {
            SlideField::Title => &self.title,
            SlideField::Subtitle => &self.subtitle,
        }
    }

    pub fn with_field(&self, field: SlideField, value: String) -> Self {
        let mut next = self.clone();
        match field {
            SlideField::Title => next.title = value,
            SlideField::Subtitle => next.subtitle = value,
        }
        next
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselCreative {
    pub id: String,
    pub slides: Vec<CarouselSlide>,
    pub caption: String,
}

impl CarouselCreative {
    pub fn slide_index(&self, slide_id: &str) -> Option<usize> {
        self.slides.iter().position(|s| s.id == slide_id)
    }

    pub fn slide(&self, slide_id: &str) -> Option<&CarouselSlide> {
        self.slides.iter().find(|s| s.id == slide_id)
    }

    /// Copy with the slide `slide_id` replaced by `f(slide)`; other slides are carried over.
    pub fn map_slide(
        &self,
        slide_id: &str,
        f: impl FnOnce(&CarouselSlide) -> CarouselSlide,
    ) -> Self {
        let mut apply = Some(f);
        let slides = self
            .slides
            .iter()
            .map(|slide| {
                if slide.id == slide_id {
                    if let Some(apply) = apply.take() {
                        return apply(slide);
                    }
                }
                slide.clone()
            })
            .collect();
        Self {
            id: self.id.clone(),
            slides,
            caption: self.caption.clone(),
        }
    }
}

/// One slide of an AI-produced carousel plan (wire names follow the response schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidePlan {
    pub image_prompt: String,
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselPlan {
    pub caption: String,
    pub slides: Vec<SlidePlan>,
}

const PLACEHOLDER_SVG: &str = r##"<svg width="480" height="600" xmlns="http://www.w3.org/2000/svg">
  <rect width="100%" height="100%" fill="#e1acac" />
  <text x="50%" y="50%" font-family="Arial" font-size="24" fill="#6C7280" text-anchor="middle" dy=".3em">Generate your image</text>
</svg>"##;

/// Fallback image for manually added slides.
pub fn placeholder_image_url() -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        BASE64_STANDARD.encode(PLACEHOLDER_SVG)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::initial_carousel_slide_settings;

    fn slide(id: &str) -> CarouselSlide {
        CarouselSlide {
            id: id.into(),
            title: format!("title {id}"),
            subtitle: format!("subtitle {id}"),
            image_prompt: "prompt".into(),
            image_url: "data:image/png;base64,AAAA".into(),
            settings: initial_carousel_slide_settings(),
        }
    }

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = new_id("slide");
        let b = new_id("slide");
        assert!(a.starts_with("slide-"));
        assert_ne!(a, b);
    }

    #[test]
    fn creative_without_settings_uses_defaults() {
        let mut creative = AdCreative::from_variation(
            "c1".into(),
            AdCopyVariation {
                title: "t".into(),
                subtitle: "s".into(),
                body: "b".into(),
                caption: "c".into(),
                background_prompt: "p".into(),
            },
            "data:image/png;base64,AAAA".into(),
        );
        creative.settings = None;
        assert_eq!(creative.effective_settings(), initial_editor_settings());
    }

    #[test]
    fn map_slide_only_touches_the_target() {
        let carousel = CarouselCreative {
            id: "carousel-1".into(),
            slides: vec![slide("a"), slide("b"), slide("c")],
            caption: "cap".into(),
        };
        let next = carousel.map_slide("b", |s| s.with_field(SlideField::Title, "new".into()));

        assert_eq!(next.slides[1].title, "new");
        assert_eq!(next.slides[0], carousel.slides[0]);
        assert_eq!(next.slides[2], carousel.slides[2]);
        assert_eq!(carousel.slides[1].title, "title b");
    }

    #[test]
    fn placeholder_is_an_svg_data_url() {
        assert!(placeholder_image_url().starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn creative_serializes_audio_with_original_key() {
        let mut creative = AdCreative::from_variation(
            "c1".into(),
            AdCopyVariation {
                title: "t".into(),
                subtitle: "s".into(),
                body: "b".into(),
                caption: "c".into(),
                background_prompt: "p".into(),
            },
            "data:image/png;base64,AAAA".into(),
        );
        creative.audio_b64 = Some("UklGRg==".into());
        let json = serde_json::to_value(&creative).unwrap();
        assert_eq!(json["audioB64"], "UklGRg==");
        assert_eq!(json["backgroundPrompt"], "p");
    }
}
