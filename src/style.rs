//! Visual presentation settings for text laid over a generated background.
//!
//! [`StyleSettings`] is a plain value: editing always produces a new value through
//! [`StyleSettings::patch`] or a wholesale replacement, never a shared in-place mutation.

use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// Font faces offered by the editor.
pub const FONT_FACES: &[&str] = &["Poppins", "Inter", "Roboto", "Montserrat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSettings {
    pub font_family: String,
    pub title_font_size: f32,
    pub subtitle_font_size: f32,
    pub text_color: String,
    pub text_position: TextPosition,
    pub text_align: TextAlign,
    pub text_opacity: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub overlay_color: String,
    pub overlay_opacity: f32,
    pub text_shadow_color: String,
    pub text_shadow_blur: f32,
    pub text_shadow_opacity: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub text_decoration: TextDecoration,
    pub text_stroke_width: f32,
    pub text_stroke_color: String,
    pub title_subtitle_spacing: f32,
}

/// Baseline settings for single creatives.
pub fn initial_editor_settings() -> StyleSettings {
    StyleSettings {
        font_family: "Poppins".to_string(),
        title_font_size: 48.0,
        subtitle_font_size: 24.0,
        text_color: "#FFFFFF".to_string(),
        text_position: TextPosition::Middle,
        text_align: TextAlign::Center,
        text_opacity: 1.0,
        padding_x: 24.0,
        padding_y: 32.0,
        overlay_color: "#000000".to_string(),
        overlay_opacity: 0.2,
        text_shadow_color: "#000000".to_string(),
        text_shadow_blur: 4.0,
        text_shadow_opacity: 0.5,
        font_weight: FontWeight::Normal,
        font_style: FontStyle::Normal,
        text_decoration: TextDecoration::None,
        text_stroke_width: 0.0,
        text_stroke_color: "#000000".to_string(),
        title_subtitle_spacing: 12.0,
    }
}

/// Baseline settings shared by every freshly planned or added carousel slide.
pub fn initial_carousel_slide_settings() -> StyleSettings {
    StyleSettings {
        text_position: TextPosition::Bottom,
        padding_y: 40.0,
        overlay_opacity: 0.3,
        ..initial_editor_settings()
    }
}

impl Default for StyleSettings {
    fn default() -> Self {
        initial_editor_settings()
    }
}

impl StyleSettings {
    /// Checks the value invariants: opacities in `[0, 1]`, sizes and widths non-negative,
    /// colors parseable as hex.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("textOpacity", self.text_opacity),
            ("overlayOpacity", self.overlay_opacity),
            ("textShadowOpacity", self.text_shadow_opacity),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ForgeError::validation(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("titleFontSize", self.title_font_size),
            ("subtitleFontSize", self.subtitle_font_size),
            ("paddingX", self.padding_x),
            ("paddingY", self.padding_y),
            ("textShadowBlur", self.text_shadow_blur),
            ("textStrokeWidth", self.text_stroke_width),
            ("titleSubtitleSpacing", self.title_subtitle_spacing),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ForgeError::validation(format!(
                    "{name} must be zero or positive, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("textColor", &self.text_color),
            ("overlayColor", &self.overlay_color),
            ("textShadowColor", &self.text_shadow_color),
            ("textStrokeColor", &self.text_stroke_color),
        ] {
            parse_hex(value).map_err(|_| {
                ForgeError::validation(format!("{name} must be a hex color, got '{value}'"))
            })?;
        }

        if !FONT_FACES
            .iter()
            .any(|face| face.eq_ignore_ascii_case(self.font_family.trim()))
        {
            return Err(ForgeError::validation(format!(
                "fontFamily must be one of {}, got '{}'",
                FONT_FACES.join(", "),
                self.font_family
            )));
        }
        Ok(())
    }

    /// Returns a copy with every field present in `subset` replaced.
    pub fn patch(&self, subset: &GlobalStyle) -> StyleSettings {
        let mut next = self.clone();
        if let Some(v) = &subset.font_family {
            next.font_family = v.clone();
        }
        if let Some(v) = &subset.text_color {
            next.text_color = v.clone();
        }
        if let Some(v) = subset.title_font_size {
            next.title_font_size = v;
        }
        if let Some(v) = subset.subtitle_font_size {
            next.subtitle_font_size = v;
        }
        if let Some(v) = &subset.overlay_color {
            next.overlay_color = v.clone();
        }
        if let Some(v) = subset.overlay_opacity {
            next.overlay_opacity = v;
        }
        if let Some(v) = &subset.text_shadow_color {
            next.text_shadow_color = v.clone();
        }
        if let Some(v) = subset.text_shadow_blur {
            next.text_shadow_blur = v;
        }
        if let Some(v) = subset.text_shadow_opacity {
            next.text_shadow_opacity = v;
        }
        if let Some(v) = subset.font_weight {
            next.font_weight = v;
        }
        if let Some(v) = subset.font_style {
            next.font_style = v;
        }
        if let Some(v) = subset.text_decoration {
            next.text_decoration = v;
        }
        if let Some(v) = subset.text_stroke_width {
            next.text_stroke_width = v;
        }
        if let Some(v) = &subset.text_stroke_color {
            next.text_stroke_color = v.clone();
        }
        if let Some(v) = subset.title_subtitle_spacing {
            next.title_subtitle_spacing = v;
        }
        next
    }

    /// Names (camelCase) of the fields whose values differ between `self` and `other`.
    pub fn changed_fields(&self, other: &StyleSettings) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut check = |name: &'static str, differs: bool| {
            if differs {
                fields.push(name);
            }
        };
        check("fontFamily", self.font_family != other.font_family);
        check("titleFontSize", self.title_font_size != other.title_font_size);
        check("subtitleFontSize", self.subtitle_font_size != other.subtitle_font_size);
        check("textColor", self.text_color != other.text_color);
        check("textPosition", self.text_position != other.text_position);
        check("textAlign", self.text_align != other.text_align);
        check("textOpacity", self.text_opacity != other.text_opacity);
        check("paddingX", self.padding_x != other.padding_x);
        check("paddingY", self.padding_y != other.padding_y);
        check("overlayColor", self.overlay_color != other.overlay_color);
        check("overlayOpacity", self.overlay_opacity != other.overlay_opacity);
        check("textShadowColor", self.text_shadow_color != other.text_shadow_color);
        check("textShadowBlur", self.text_shadow_blur != other.text_shadow_blur);
        check("textShadowOpacity", self.text_shadow_opacity != other.text_shadow_opacity);
        check("fontWeight", self.font_weight != other.font_weight);
        check("fontStyle", self.font_style != other.font_style);
        check("textDecoration", self.text_decoration != other.text_decoration);
        check("textStrokeWidth", self.text_stroke_width != other.text_stroke_width);
        check("textStrokeColor", self.text_stroke_color != other.text_stroke_color);
        check(
            "titleSubtitleSpacing",
            self.title_subtitle_spacing != other.title_subtitle_spacing,
        );
        fields
    }
}

/// The carousel-wide style subset. Position, alignment, text opacity and padding stay per slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_shadow_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_shadow_blur: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_shadow_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<TextDecoration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_stroke_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_subtitle_spacing: Option<f32>,
}

impl GlobalStyle {
    /// The full global subset taken from an existing settings value.
    pub fn from_settings(settings: &StyleSettings) -> Self {
        Self {
            font_family: Some(settings.font_family.clone()),
            text_color: Some(settings.text_color.clone()),
            title_font_size: Some(settings.title_font_size),
            subtitle_font_size: Some(settings.subtitle_font_size),
            overlay_color: Some(settings.overlay_color.clone()),
            overlay_opacity: Some(settings.overlay_opacity),
            text_shadow_color: Some(settings.text_shadow_color.clone()),
            text_shadow_blur: Some(settings.text_shadow_blur),
            text_shadow_opacity: Some(settings.text_shadow_opacity),
            font_weight: Some(settings.font_weight),
            font_style: Some(settings.font_style),
            text_decoration: Some(settings.text_decoration),
            text_stroke_width: Some(settings.text_stroke_width),
            text_stroke_color: Some(settings.text_stroke_color.clone()),
            title_subtitle_spacing: Some(settings.title_subtitle_spacing),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == GlobalStyle::default()
    }
}

/// Named layout bundles appliable in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPreset {
    Minimalist,
    Bold,
    Classic,
}

impl LayoutPreset {
    pub const ALL: [LayoutPreset; 3] = [
        LayoutPreset::Minimalist,
        LayoutPreset::Bold,
        LayoutPreset::Classic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayoutPreset::Minimalist => "minimalist",
            LayoutPreset::Bold => "bold",
            LayoutPreset::Classic => "classic",
        }
    }

    pub fn settings(&self) -> StyleSettings {
        let base = initial_carousel_slide_settings();
        match self {
            LayoutPreset::Minimalist => StyleSettings {
                font_family: "Inter".to_string(),
                title_font_size: 40.0,
                subtitle_font_size: 20.0,
                text_color: "#FFFFFF".to_string(),
                text_position: TextPosition::Bottom,
                text_align: TextAlign::Left,
                padding_x: 40.0,
                padding_y: 40.0,
                overlay_color: "#000000".to_string(),
                overlay_opacity: 0.2,
                text_shadow_blur: 5.0,
                text_shadow_opacity: 0.3,
                text_stroke_width: 0.0,
                title_subtitle_spacing: 10.0,
                ..base
            },
            LayoutPreset::Bold => StyleSettings {
                font_family: "Poppins".to_string(),
                font_weight: FontWeight::Bold,
                title_font_size: 64.0,
                subtitle_font_size: 28.0,
                text_color: "#FFFFFF".to_string(),
                text_position: TextPosition::Middle,
                text_align: TextAlign::Center,
                padding_x: 20.0,
                padding_y: 20.0,
                overlay_color: "#111827".to_string(),
                overlay_opacity: 0.4,
                text_shadow_blur: 8.0,
                text_shadow_opacity: 0.7,
                text_stroke_width: 1.0,
                title_subtitle_spacing: 16.0,
                ..base
            },
            LayoutPreset::Classic => StyleSettings {
                font_family: "Montserrat".to_string(),
                title_font_size: 52.0,
                subtitle_font_size: 22.0,
                text_color: "#F3F4F6".to_string(),
                text_position: TextPosition::Middle,
                text_align: TextAlign::Center,
                padding_x: 50.0,
                padding_y: 50.0,
                overlay_color: "#000000".to_string(),
                overlay_opacity: 0.3,
                text_shadow_blur: 2.0,
                text_shadow_opacity: 0.6,
                text_stroke_width: 0.0,
                title_subtitle_spacing: 14.0,
                ..base
            },
        }
    }
}

impl FromStr for LayoutPreset {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimalist" => Ok(LayoutPreset::Minimalist),
            "bold" => Ok(LayoutPreset::Bold),
            "classic" => Ok(LayoutPreset::Classic),
            other => Err(ForgeError::validation(format!(
                "Unknown layout preset '{other}'; supported: minimalist, bold, classic"
            ))),
        }
    }
}

fn parse_hex(value: &str) -> std::result::Result<Srgb<u8>, palette::rgb::FromHexError> {
    Srgb::<u8>::from_str(value.trim())
}

pub fn is_hex_color(value: &str) -> bool {
    parse_hex(value).is_ok()
}

/// Normalizes a hex color to `#RRGGBB`; invalid input falls back to `fallback`.
pub fn normalize_hex(hex: &str, fallback: &str) -> String {
    match parse_hex(hex) {
        Ok(c) => format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue),
        Err(_) => fallback.to_string(),
    }
}
