use std::path::PathBuf;

use adforge_lib::output::{AssistOutput, GenerateOutput};
use adforge_lib::{
    AdforgeOutput, ForgeError, GenerationMode, GenerationOrchestrator, GenerationOutcome,
    GenerationRequest, InlineMedia, ADFORGE_OUTPUT_VERSION,
};
use tracing::info;

use crate::cli::AssistTask;
use crate::settings::flag_present;

use super::App;

const DOCUMENT_SEPARATOR: &str = "--- DOCUMENT CONTENT ---";

pub struct GenerateArgs {
    pub context: Option<String>,
    pub context_file: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub document: Option<PathBuf>,
    pub style_guide: String,
    pub mode: GenerationMode,
    pub expert_image: Option<PathBuf>,
    pub variations: usize,
    pub slides: usize,
}

/// Run the generate command.
pub async fn run_generate(
    app: &App,
    raw_args: &[String],
    args: GenerateArgs,
) -> Result<AdforgeOutput, ForgeError> {
    let mut context = match (&args.context, &args.context_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => String::new(),
    };
    if let Some(path) = &args.audio {
        let media = InlineMedia::from_path(path)?;
        let transcription = app.session.transcribe_audio(&media).await?;
        context = append_context(&context, None, &transcription);
    }
    if let Some(path) = &args.document {
        let media = InlineMedia::from_path(path)?;
        let extracted = app.session.extract_text(&media).await?;
        context = append_context(&context, Some(DOCUMENT_SEPARATOR), &extracted);
    }
    let expert_image = args
        .expert_image
        .as_deref()
        .map(InlineMedia::from_path)
        .transpose()?;

    let mut generation = app.config.generation.clone();
    if flag_present(raw_args, "--variations") {
        generation.variations = args.variations;
    }
    if flag_present(raw_args, "--slides") {
        generation.carousel_slides = args.slides;
    }
    if generation.variations == 0 || generation.carousel_slides == 0 {
        return Err(ForgeError::validation(
            "--variations and --slides must be at least 1",
        ));
    }

    let request = GenerationRequest {
        project_context: context,
        style_guide_prompt: args.style_guide.trim().to_string(),
        mode: args.mode,
        expert_image: expert_image.clone(),
    };
    let orchestrator = GenerationOrchestrator::new(app.session.clone(), generation);
    let editor = app.editor();
    if request.project_context.trim().is_empty() {
        // Checked before the workspace is cleared.
        return Err(ForgeError::validation(
            "Provide the project context or the ad strategy.",
        ));
    }
    editor.set_project_context(&request.project_context)?;
    editor.begin_generation()?;

    let outcome = orchestrator.generate(&request, app.progress()).await?;
    editor.apply_generation(outcome.clone(), expert_image)?;
    let state = editor.snapshot();
    info!(mode = %request.mode, revision = state.revision, "workspace updated with new generation");

    let (creatives, carousel) = match outcome {
        GenerationOutcome::Single(creatives) => (creatives, None),
        GenerationOutcome::Carousel(carousel) => (Vec::new(), Some(carousel)),
    };
    Ok(AdforgeOutput::Generate(GenerateOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        generation: request.mode,
        creatives,
        carousel,
        workspace: (&state).into(),
    }))
}

/// Appends `addition` after a blank line, with an optional heading line between them.
fn append_context(existing: &str, heading: Option<&str>, addition: &str) -> String {
    let existing = existing.trim();
    if existing.is_empty() {
        return addition.to_string();
    }
    match heading {
        Some(heading) => format!("{existing}\n\n{heading}\n\n{addition}"),
        None => format!("{existing}\n\n{addition}"),
    }
}

/// Run the assist command.
pub async fn run_assist(
    app: &App,
    task: AssistTask,
    context: Option<String>,
) -> Result<AdforgeOutput, ForgeError> {
    let context = match context {
        Some(text) => text,
        None => app.editor().snapshot().project_context,
    };
    if context.trim().is_empty() {
        return Err(ForgeError::validation(
            "Provide the project context or the ad strategy.",
        ));
    }
    let (name, results) = match task {
        AssistTask::Hooks => ("hooks", app.session.generate_alternative_hooks(&context).await?),
        AssistTask::Captions => (
            "captions",
            app.session.generate_alternative_captions(&context).await?,
        ),
    };
    Ok(AdforgeOutput::Assist(AssistOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        task: name.to_string(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_context_starts_fresh_when_empty() {
        assert_eq!(append_context("  ", None, "spoken brief"), "spoken brief");
    }

    #[test]
    fn append_context_separates_documents() {
        let merged = append_context("coffee launch\n", Some(DOCUMENT_SEPARATOR), "brand guide");
        assert_eq!(
            merged,
            "coffee launch\n\n--- DOCUMENT CONTENT ---\n\nbrand guide"
        );
        assert_eq!(append_context("a", None, "b"), "a\n\nb");
    }
}
