//! Minimal inline rich text for titles and subtitles.
//!
//! Markup is a small HTML subset: `<b>`/`<strong>`, `<i>`/`<em>`,
//! `<span style="color:#RRGGBB">`, `<font color="#RRGGBB">` and `<br>`. Other tags are dropped
//! with their text kept.

use serde::Serialize;

use crate::error::{ForgeError, Result};
use crate::style::{is_hex_color, normalize_hex};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub style: InlineStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineCommand {
    Bold,
    Italic,
    ForeColor(String),
}

impl InlineCommand {
    pub const NAMES: &'static [&'static str] = &["bold", "italic", "foreColor"];

    /// `bold`, `italic`, or `foreColor` with a hex value.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self> {
        match (name.to_ascii_lowercase().as_str(), value) {
            ("bold", _) => Ok(InlineCommand::Bold),
            ("italic", _) => Ok(InlineCommand::Italic),
            ("forecolor" | "color", Some(v)) => Ok(InlineCommand::ForeColor(v.to_string())),
            ("forecolor" | "color", None) => {
                Err(ForgeError::validation("foreColor needs a hex color value"))
            }
            (other, _) => Err(ForgeError::validation(format!(
                "unknown inline command '{other}' (expected bold, italic or foreColor)"
            ))),
        }
    }
}

/// Character range `[start, end)` in plain-text offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    runs: Vec<TextRun>,
}

struct OpenTag {
    name: String,
    style: InlineStyle,
}

impl RichText {
    pub fn plain(text: &str) -> Self {
        let mut out = Self::default();
        out.push(text, &InlineStyle::default());
        out
    }

    /// Lenient parse; malformed markup degrades to text rather than failing.
    pub fn parse(markup: &str) -> Self {
        let mut out = Self::default();
        let mut stack: Vec<OpenTag> = Vec::new();
        let mut rest = markup;

        while !rest.is_empty() {
            let current = stack.last().map(|t| t.style.clone()).unwrap_or_default();
            match rest.find('<') {
                Some(0) => match rest.find('>') {
                    Some(close) => {
                        handle_tag(&rest[1..close], &mut stack, &mut out, &current);
                        rest = &rest[close + 1..];
                    }
                    None => {
                        out.push(&decode_entities(rest), &current);
                        rest = "";
                    }
                },
                Some(next) => {
                    out.push(&decode_entities(&rest[..next]), &current);
                    rest = &rest[next..];
                }
                None => {
                    out.push(&decode_entities(rest), &current);
                    rest = "";
                }
            }
        }
        out
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(|r| r.text.chars().count()).sum()
    }

    pub fn is_styled(&self) -> bool {
        self.runs.iter().any(|r| r.style != InlineStyle::default())
    }

    /// Canonical markup: color span outermost, then bold, then italic.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            let mut text = escape(&run.text).replace('\n', "<br>");
            if run.style.italic {
                text = format!("<i>{text}</i>");
            }
            if run.style.bold {
                text = format!("<b>{text}</b>");
            }
            if let Some(color) = &run.style.color {
                text = format!("<span style=\"color:{color}\">{text}</span>");
            }
            out.push_str(&text);
        }
        out
    }

    /// Applies an inline command to `selection`, toggling bold/italic like a text editor does:
    /// if every selected character already has the style it is removed, otherwise added.
    pub fn apply_inline_style(
        &self,
        selection: Selection,
        command: &InlineCommand,
    ) -> Result<Self> {
        let len = self.char_len();
        let start = selection.start.min(len);
        let end = selection.end.min(len);
        if start >= end {
            return Err(ForgeError::validation("Select some text before applying a style."));
        }

        let mut chars: Vec<(char, InlineStyle)> = self
            .runs
            .iter()
            .flat_map(|run| run.text.chars().map(move |c| (c, run.style.clone())))
            .collect();
        let range = &mut chars[start..end];

        match command {
            InlineCommand::Bold => {
                let on = !range.iter().all(|(_, s)| s.bold);
                range.iter_mut().for_each(|(_, s)| s.bold = on);
            }
            InlineCommand::Italic => {
                let on = !range.iter().all(|(_, s)| s.italic);
                range.iter_mut().for_each(|(_, s)| s.italic = on);
            }
            InlineCommand::ForeColor(value) => {
                if !is_hex_color(value) {
                    return Err(ForgeError::validation(format!(
                        "'{value}' is not a hex color"
                    )));
                }
                let color = normalize_hex(value, value);
                range
                    .iter_mut()
                    .for_each(|(_, s)| s.color = Some(color.clone()));
            }
        }

        let mut out = Self::default();
        for (c, style) in chars {
            let mut buf = [0u8; 4];
            out.push(c.encode_utf8(&mut buf), &style);
        }
        Ok(out)
    }

    fn push(&mut self, text: &str, style: &InlineStyle) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == *style => last.text.push_str(text),
            _ => self.runs.push(TextRun {
                text: text.to_string(),
                style: style.clone(),
            }),
        }
    }
}

fn handle_tag(raw: &str, stack: &mut Vec<OpenTag>, out: &mut RichText, current: &InlineStyle) {
    let raw = raw.trim();
    if let Some(name) = raw.strip_prefix('/') {
        let name = name.trim().to_ascii_lowercase();
        if let Some(pos) = stack.iter().rposition(|t| t.name == name) {
            stack.truncate(pos);
        }
        return;
    }

    let self_closing = raw.ends_with('/');
    let body = raw.trim_end_matches('/');
    let (name, attrs) = match body.find(char::is_whitespace) {
        Some(i) => (&body[..i], &body[i..]),
        None => (body, ""),
    };
    let name = name.to_ascii_lowercase();

    match name.as_str() {
        "br" => {
            out.push("\n", current);
            return;
        }
        "img" | "hr" | "meta" | "input" => return,
        _ if self_closing => return,
        _ => {}
    }

    let mut style = current.clone();
    match name.as_str() {
        "b" | "strong" => style.bold = true,
        "i" | "em" => style.italic = true,
        "span" => {
            if let Some(css) = attribute(attrs, "style") {
                if let Some(color) = css_color(&css) {
                    style.color = Some(color);
                }
                if css.contains("font-weight:bold") || css.contains("font-weight: bold") {
                    style.bold = true;
                }
                if css.contains("font-style:italic") || css.contains("font-style: italic") {
                    style.italic = true;
                }
            }
        }
        "font" => {
            if let Some(color) = attribute(attrs, "color").filter(|c| is_hex_color(c)) {
                style.color = Some(normalize_hex(&color, &color));
            }
        }
        _ => {}
    }
    stack.push(OpenTag { name, style });
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let idx = lower.find(&format!("{name}="))?;
    let value = attrs[idx + name.len() + 1..].trim_start();
    let quote = value.chars().next()?;
    if quote == '"' || quote == '\'' {
        let inner = &value[1..];
        inner.find(quote).map(|end| inner[..end].to_string())
    } else {
        Some(
            value
                .split(char::is_whitespace)
                .next()
                .unwrap_or_default()
                .to_string(),
        )
    }
}

fn css_color(css: &str) -> Option<String> {
    css.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        if prop.trim().eq_ignore_ascii_case("color") {
            let value = value.trim();
            is_hex_color(value).then(|| normalize_hex(value, value))
        } else {
            None
        }
    })
}

fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).replace('\u{a0}', " ")
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// An editable field: rich content plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct EditableText {
    content: RichText,
    selection: Option<Selection>,
}

impl EditableText {
    pub fn new(markup: &str) -> Self {
        Self {
            content: RichText::parse(markup),
            selection: None,
        }
    }

    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.content.char_len();
        self.selection = Some(Selection::new(start.min(len), end.min(len)));
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Commands the toolbar offers for the current selection; none while it is collapsed.
    pub fn available_commands(&self) -> &'static [&'static str] {
        match self.selection {
            Some(sel) if !sel.is_collapsed() => InlineCommand::NAMES,
            _ => &[],
        }
    }

    pub fn apply_inline_style(&mut self, command: &InlineCommand) -> Result<()> {
        let selection = self
            .selection
            .ok_or_else(|| ForgeError::validation("Select some text before applying a style."))?;
        self.content = self.content.apply_inline_style(selection, command)?;
        Ok(())
    }

    pub fn content(&self) -> &RichText {
        &self.content
    }

    pub fn markup(&self) -> String {
        self.content.to_markup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_styles_into_runs() {
        let text = RichText::parse(
            "Fresh <b>roasted <i>beans</i></b> <span style=\"color: #ff0000\">today</span>",
        );
        let runs = text.runs();
        assert_eq!(runs.len(), 5);
        assert_eq!(runs[0].text, "Fresh ");
        assert!(runs[1].style.bold && !runs[1].style.italic);
        assert!(runs[2].style.bold && runs[2].style.italic);
        assert_eq!(runs[2].text, "beans");
        assert_eq!(runs[4].style.color.as_deref(), Some("#FF0000"));
        assert_eq!(text.plain_text(), "Fresh roasted beans today");
    }

    #[test]
    fn unknown_tags_and_entities() {
        let text = RichText::parse("<div>Salt &amp; pepper<br>now</div>");
        assert_eq!(text.plain_text(), "Salt & pepper\nnow");
        assert!(!text.is_styled());
        assert_eq!(text.to_markup(), "Salt &amp; pepper<br>now");
    }

    #[test]
    fn numeric_and_named_entities_decode_to_text() {
        let text = RichText::parse("Caf&eacute; <b>it&#8217;s</b>&nbsp;open &hellip;");
        assert_eq!(text.plain_text(), "Caf\u{e9} it\u{2019}s open \u{2026}");
        assert_eq!(
            text.to_markup(),
            "Caf\u{e9} <b>it\u{2019}s</b> open \u{2026}"
        );
    }

    #[test]
    fn unterminated_tag_is_kept_as_text() {
        assert_eq!(RichText::parse("a < b").plain_text(), "a < b");
    }

    #[test]
    fn font_color_from_fore_color_command_is_understood() {
        let text = RichText::parse("<font color=\"#00ff00\">go</font>");
        assert_eq!(text.runs()[0].style.color.as_deref(), Some("#00FF00"));
    }

    #[test]
    fn markup_survives_reparse() {
        let text = RichText::parse("<span style=\"color:#123456\"><b>Hi</b></span> there");
        assert_eq!(RichText::parse(&text.to_markup()), text);
    }

    #[test]
    fn bold_toggles_over_range() {
        let text = RichText::plain("hello world");
        let bolded = text
            .apply_inline_style(Selection::new(0, 5), &InlineCommand::Bold)
            .unwrap();
        assert_eq!(bolded.to_markup(), "<b>hello</b> world");

        let unbolded = bolded
            .apply_inline_style(Selection::new(0, 5), &InlineCommand::Bold)
            .unwrap();
        assert_eq!(unbolded.to_markup(), "hello world");

        // Mixed selection turns everything on.
        let mixed = bolded
            .apply_inline_style(Selection::new(3, 8), &InlineCommand::Bold)
            .unwrap();
        assert_eq!(mixed.to_markup(), "<b>hello wo</b>rld");
    }

    #[test]
    fn fore_color_validates_hex() {
        let text = RichText::plain("sale");
        assert!(text
            .apply_inline_style(Selection::new(0, 4), &InlineCommand::ForeColor("red".into()))
            .is_err());
        let colored = text
            .apply_inline_style(Selection::new(0, 4), &InlineCommand::ForeColor("#f00".into()))
            .unwrap();
        assert_eq!(colored.to_markup(), "<span style=\"color:#FF0000\">sale</span>");
    }

    #[test]
    fn collapsed_selection_is_rejected() {
        let mut field = EditableText::new("abc");
        field.select(1, 1);
        assert!(field.available_commands().is_empty());
        assert!(field.apply_inline_style(&InlineCommand::Italic).is_err());

        field.select(2, 0);
        assert_eq!(field.selection(), Some(Selection::new(0, 2)));
        assert_eq!(field.available_commands(), InlineCommand::NAMES);
        field.apply_inline_style(&InlineCommand::Italic).unwrap();
        assert_eq!(field.markup(), "<i>ab</i>c");
    }

    #[test]
    fn command_names_parse() {
        assert_eq!(InlineCommand::parse("Bold", None).unwrap(), InlineCommand::Bold);
        assert_eq!(
            InlineCommand::parse("foreColor", Some("#fff")).unwrap(),
            InlineCommand::ForeColor("#fff".into())
        );
        assert!(InlineCommand::parse("foreColor", None).is_err());
        assert!(InlineCommand::parse("underline", None).is_err());
    }
}
