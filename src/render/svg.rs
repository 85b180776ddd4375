//! Scene to SVG document.
//!
//! Text layout is approximate: lines are wrapped on word boundaries using an average glyph
//! advance, then handed to the SVG renderer, which shapes the real glyphs.

use std::fmt::Write as _;

use crate::editor::{InlineStyle, RichText};
use crate::style::{
    normalize_hex, FontStyle, FontWeight, StyleSettings, TextAlign, TextDecoration, TextPosition,
};

use super::{Scene, SceneNode};

/// Average advance of one glyph as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.55;
const LINE_HEIGHT: f32 = 1.2;
const TOOLBAR_HEIGHT: f32 = 36.0;

struct Segment {
    text: String,
    style: InlineStyle,
}

type Line = Vec<Segment>;

pub fn scene_to_svg(scene: &Scene) -> String {
    let s = &scene.settings;
    let (w, h) = (scene.width as f32, scene.height as f32);
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );

    if s.text_shadow_blur > 0.0 && s.text_shadow_opacity > 0.0 {
        let _ = write!(
            svg,
            r#"<defs><filter id="text-shadow" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="0" dy="0" stdDeviation="{}" flood-color="{}" flood-opacity="{}"/></filter></defs>"#,
            s.text_shadow_blur / 2.0,
            normalize_hex(&s.text_shadow_color, "#000000"),
            s.text_shadow_opacity
        );
    }

    let title = scene.nodes.iter().find_map(|n| match n {
        SceneNode::Title { markup } => Some(markup.as_str()),
        _ => None,
    });
    let subtitle = scene.nodes.iter().find_map(|n| match n {
        SceneNode::Subtitle { markup } => Some(markup.as_str()),
        _ => None,
    });

    for node in &scene.nodes {
        match node {
            SceneNode::Background { image_url } => {
                let _ = write!(
                    svg,
                    r#"<image x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"/>"#,
                    escape_attr(image_url)
                );
            }
            SceneNode::Overlay => {
                let _ = write!(
                    svg,
                    r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}" fill-opacity="{}"/>"#,
                    normalize_hex(&s.overlay_color, "#000000"),
                    s.overlay_opacity
                );
            }
            SceneNode::Toolbar => {
                let _ = write!(
                    svg,
                    r##"<g id="toolbar"><rect x="8" y="8" width="{}" height="{TOOLBAR_HEIGHT}" rx="6" fill="#1f2937" fill-opacity="0.9"/></g>"##,
                    (w - 16.0).max(0.0)
                );
            }
            // Text blocks are laid out together below.
            SceneNode::Title { .. } | SceneNode::Subtitle { .. } => {}
        }
    }

    svg.push_str(&text_block(scene, title, subtitle));
    svg.push_str("</svg>");
    svg
}

fn text_block(scene: &Scene, title: Option<&str>, subtitle: Option<&str>) -> String {
    let s = &scene.settings;
    let (w, h) = (scene.width as f32, scene.height as f32);
    let max_width = (w - 2.0 * s.padding_x).max(s.title_font_size);

    let title_lines = title
        .map(|m| wrap(&RichText::parse(m), s.title_font_size, max_width))
        .unwrap_or_default();
    let subtitle_lines = subtitle
        .map(|m| wrap(&RichText::parse(m), s.subtitle_font_size, max_width))
        .unwrap_or_default();

    let title_height = title_lines.len() as f32 * s.title_font_size * LINE_HEIGHT;
    let subtitle_height = subtitle_lines.len() as f32 * s.subtitle_font_size * LINE_HEIGHT;
    let spacing = if title_lines.is_empty() || subtitle_lines.is_empty() {
        0.0
    } else {
        s.title_subtitle_spacing
    };
    let block_height = title_height + spacing + subtitle_height;

    let top = match s.text_position {
        TextPosition::Top => s.padding_y,
        TextPosition::Middle => (h - block_height) / 2.0,
        TextPosition::Bottom => h - s.padding_y - block_height,
    };
    let (x, anchor) = match s.text_align {
        TextAlign::Left => (s.padding_x, "start"),
        TextAlign::Center => (w / 2.0, "middle"),
        TextAlign::Right => (w - s.padding_x, "end"),
    };

    let mut out = String::new();
    let filter = if s.text_shadow_blur > 0.0 && s.text_shadow_opacity > 0.0 {
        r#" filter="url(#text-shadow)""#
    } else {
        ""
    };
    let _ = write!(
        out,
        r#"<g fill="{}" fill-opacity="{}" font-family="{}, sans-serif" text-anchor="{anchor}"{filter}{}>"#,
        normalize_hex(&s.text_color, "#FFFFFF"),
        s.text_opacity,
        escape_attr(&s.font_family),
        stroke_attrs(s)
    );

    let mut baseline = top;
    for line in &title_lines {
        baseline += s.title_font_size * LINE_HEIGHT;
        write_line(&mut out, line, x, baseline - s.title_font_size * 0.2, s.title_font_size, s);
    }
    baseline += spacing;
    for line in &subtitle_lines {
        baseline += s.subtitle_font_size * LINE_HEIGHT;
        write_line(
            &mut out,
            line,
            x,
            baseline - s.subtitle_font_size * 0.2,
            s.subtitle_font_size,
            s,
        );
    }
    out.push_str("</g>");
    out
}

fn stroke_attrs(s: &StyleSettings) -> String {
    if s.text_stroke_width > 0.0 {
        format!(
            r#" stroke="{}" stroke-width="{}" paint-order="stroke""#,
            normalize_hex(&s.text_stroke_color, "#000000"),
            s.text_stroke_width
        )
    } else {
        String::new()
    }
}

fn write_line(out: &mut String, line: &Line, x: f32, y: f32, font_size: f32, s: &StyleSettings) {
    let weight = match s.font_weight {
        FontWeight::Normal => "normal",
        FontWeight::Bold => "bold",
    };
    let style = match s.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };
    let decoration = match s.text_decoration {
        TextDecoration::None => "none",
        TextDecoration::Underline => "underline",
    };
    let _ = write!(
        out,
        r#"<text x="{x}" y="{y}" font-size="{font_size}" font-weight="{weight}" font-style="{style}" text-decoration="{decoration}" xml:space="preserve">"#
    );
    for segment in line {
        let mut attrs = String::new();
        if segment.style.bold {
            attrs.push_str(r#" font-weight="bold""#);
        }
        if segment.style.italic {
            attrs.push_str(r#" font-style="italic""#);
        }
        if let Some(color) = &segment.style.color {
            let _ = write!(attrs, r#" fill="{}""#, normalize_hex(color, "#FFFFFF"));
        }
        let _ = write!(out, "<tspan{attrs}>{}</tspan>", escape_xml(&segment.text));
    }
    out.push_str("</text>");
}

/// Greedy word wrap over styled runs. Explicit line breaks are kept.
fn wrap(text: &RichText, font_size: f32, max_width: f32) -> Vec<Line> {
    let max_chars = ((max_width / (font_size * GLYPH_ADVANCE)).floor() as usize).max(1);
    let mut lines: Vec<Line> = Vec::new();
    let mut line: Line = Vec::new();
    let mut used = 0usize;

    for run in text.runs() {
        for (i, hard_line) in run.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            for word in hard_line.split_inclusive(' ') {
                let len = word.trim_end().chars().count();
                if used > 0 && used + len > max_chars {
                    trim_trailing_space(&mut line);
                    lines.push(std::mem::take(&mut line));
                    used = 0;
                }
                push_segment(&mut line, word, &run.style);
                used += word.chars().count();
            }
        }
    }
    trim_trailing_space(&mut line);
    if !line.is_empty() {
        lines.push(line);
    }
    lines.retain(|l| l.iter().any(|seg| !seg.text.trim().is_empty()));
    lines
}

fn push_segment(line: &mut Line, text: &str, style: &InlineStyle) {
    match line.last_mut() {
        Some(last) if last.style == *style => last.text.push_str(text),
        _ => line.push(Segment {
            text: text.to_string(),
            style: style.clone(),
        }),
    }
}

fn trim_trailing_space(line: &mut Line) {
    if let Some(last) = line.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
    }
}

fn escape_xml(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn escape_attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}
