use adforge_lib::output::PreviewOutput;
use adforge_lib::{
    AdforgeOutput, AspectRatio, EditingController, ForgeError, GlobalStyle, InlineCommand,
    LayoutPreset, PendingChange, Selection, StyleSettings, ADFORGE_OUTPUT_VERSION,
};
use serde_json::Value;

use crate::cli::{AudioAction, EditAction, FieldArg, SlideAction, StyleAction};

use super::{workspace_output, App};

pub fn run_show(app: &App) -> Result<AdforgeOutput, ForgeError> {
    Ok(workspace_output("show", None, &app.editor().snapshot()))
}

pub fn run_select(app: &App, creative_id: &str) -> Result<AdforgeOutput, ForgeError> {
    let editor = app.editor();
    editor.select_creative(creative_id)?;
    Ok(workspace_output("select", None, &editor.snapshot()))
}

pub fn run_edit(app: &App, action: EditAction) -> Result<AdforgeOutput, ForgeError> {
    let editor = app.editor();
    let action_name = match action {
        EditAction::Field { field, value } => {
            editor.update_field(field.into(), &value)?;
            "edit-field"
        }
        EditAction::Slide {
            slide_id,
            field,
            value,
        } => {
            editor.update_slide_field(&slide_id, slide_field(field)?, &value)?;
            "edit-slide"
        }
        EditAction::Caption { text } => {
            editor.update_caption(&text)?;
            "edit-caption"
        }
        EditAction::Inline {
            field,
            slide,
            start,
            end,
            command,
            value,
        } => {
            let command = InlineCommand::parse(command.name(), value.as_deref())?;
            let selection = Selection::new(start, end);
            match slide {
                Some(slide_id) => editor.apply_slide_inline_style(
                    &slide_id,
                    slide_field(field)?,
                    selection,
                    &command,
                )?,
                None => editor.apply_inline_style(field.into(), selection, &command)?,
            }
            "edit-inline"
        }
    };
    Ok(workspace_output(action_name, None, &editor.snapshot()))
}

fn slide_field(field: FieldArg) -> Result<adforge_lib::SlideField, ForgeError> {
    field
        .slide_field()
        .ok_or_else(|| ForgeError::validation("Carousel slides only have a title and a subtitle."))
}

pub fn run_style(app: &App, action: StyleAction) -> Result<AdforgeOutput, ForgeError> {
    let editor = app.editor();
    match action {
        StyleAction::Apply { slide, json } => {
            let state = editor.snapshot();
            let base = match &slide {
                Some(slide_id) => state
                    .require_carousel()?
                    .slide(slide_id)
                    .map(|s| s.settings.clone())
                    .ok_or_else(|| {
                        ForgeError::validation(format!("Unknown slide id: {slide_id}"))
                    })?,
                None => {
                    state.require_creative()?;
                    state.editor_settings.clone()
                }
            };
            let settings = merge_settings(&base, &json)?;
            editor.apply_style(slide.as_deref(), settings)?;
            Ok(workspace_output("style-apply", None, &editor.snapshot()))
        }
        StyleAction::Global { json, yes } => {
            let subset: GlobalStyle = serde_json::from_str(&json)
                .map_err(|e| ForgeError::validation(format!("Invalid global style: {e}")))?;
            let change = editor.preview_global_style(&subset)?;
            preview_or_apply(&editor, change, yes)
        }
        StyleAction::Preset { name, yes } => {
            let preset: LayoutPreset = name.parse()?;
            let change = editor.preview_preset(&preset.settings())?;
            preview_or_apply(&editor, change, yes)
        }
    }
}

/// Merges a JSON object of camelCase settings into `base`. Unknown keys are rejected.
fn merge_settings(base: &StyleSettings, patch: &str) -> Result<StyleSettings, ForgeError> {
    let patch: Value = serde_json::from_str(patch)
        .map_err(|e| ForgeError::validation(format!("Style settings must be JSON: {e}")))?;
    let Value::Object(fields) = patch else {
        return Err(ForgeError::validation("Style settings must be a JSON object."));
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(target) = &mut merged {
        for (key, value) in fields {
            if !target.contains_key(&key) {
                return Err(ForgeError::validation(format!("Unknown style setting: {key}")));
            }
            target.insert(key, value);
        }
    }
    serde_json::from_value(merged)
        .map_err(|e| ForgeError::validation(format!("Invalid style settings: {e}")))
}

fn preview_or_apply(
    editor: &EditingController,
    change: PendingChange,
    yes: bool,
) -> Result<AdforgeOutput, ForgeError> {
    let summary = change.summary();
    if yes {
        editor.confirm(&change)?;
    }
    Ok(AdforgeOutput::Preview(PreviewOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        change,
        summary,
        applied: yes,
    }))
}

pub fn run_reset(app: &App, yes: bool) -> Result<AdforgeOutput, ForgeError> {
    let editor = app.editor();
    let change = editor.preview_reset();
    preview_or_apply(&editor, change, yes)
}

pub async fn run_slides(app: &App, action: SlideAction) -> Result<AdforgeOutput, ForgeError> {
    let editor = app.editor();
    match action {
        SlideAction::Reorder { from, to } => {
            if from == 0 || to == 0 {
                return Err(ForgeError::validation("Slide positions start at 1."));
            }
            let moved = editor.reorder_slides(from - 1, to - 1)?;
            let detail = (!moved)
                .then(|| format!("Position out of range; nothing moved ({from} -> {to})."));
            Ok(workspace_output("reorder", detail, &editor.snapshot()))
        }
        SlideAction::Add => {
            let slide_id = editor.add_slide()?;
            Ok(workspace_output(
                "add-slide",
                Some(format!("Added {slide_id}")),
                &editor.snapshot(),
            ))
        }
        SlideAction::Regenerate { slide_id, prompt } => {
            let prompt = match prompt {
                Some(prompt) => prompt,
                None => editor
                    .snapshot()
                    .require_carousel()?
                    .slide(&slide_id)
                    .map(|s| s.image_prompt.clone())
                    .ok_or_else(|| {
                        ForgeError::validation(format!("Unknown slide id: {slide_id}"))
                    })?,
            };
            editor.regenerate_slide_image(&slide_id, &prompt).await?;
            Ok(workspace_output(
                "regenerate-image",
                Some(format!("New image for {slide_id}")),
                &editor.snapshot(),
            ))
        }
    }
}

pub async fn run_audio(app: &App, action: AudioAction) -> Result<AdforgeOutput, ForgeError> {
    let editor = app.editor();
    match action {
        AudioAction::Attach => {
            let narration = editor.attach_audio().await?;
            Ok(workspace_output(
                "attach-audio",
                Some(format!("Narration: {narration}")),
                &editor.snapshot(),
            ))
        }
        AudioAction::Remove => {
            editor.remove_audio()?;
            Ok(workspace_output("remove-audio", None, &editor.snapshot()))
        }
    }
}

pub fn run_view(
    app: &App,
    aspect_ratio: Option<AspectRatio>,
    zoom: Option<f32>,
) -> Result<AdforgeOutput, ForgeError> {
    let editor = app.editor();
    if let Some(ratio) = aspect_ratio {
        editor.set_aspect_ratio(ratio)?;
    }
    if let Some(zoom) = zoom {
        editor.set_preview_zoom(zoom)?;
    }
    Ok(workspace_output("view", None, &editor.snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_lib::style::initial_editor_settings;

    #[test]
    fn merge_settings_overrides_named_fields_only() {
        let base = initial_editor_settings();
        let merged =
            merge_settings(&base, r##"{"textColor":"#ff0000","titleFontSize":64}"##).unwrap();
        assert_eq!(merged.text_color, "#ff0000");
        assert_eq!(merged.title_font_size, 64.0);
        assert_eq!(merged.font_family, base.font_family);
    }

    #[test]
    fn merge_settings_rejects_unknown_keys_and_non_objects() {
        let base = initial_editor_settings();
        assert!(matches!(
            merge_settings(&base, r#"{"glow":true}"#),
            Err(ForgeError::Validation(_))
        ));
        assert!(matches!(
            merge_settings(&base, "[1,2]"),
            Err(ForgeError::Validation(_))
        ));
    }
}
