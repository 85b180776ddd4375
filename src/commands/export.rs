use std::path::PathBuf;
use std::sync::Arc;

use adforge_lib::output::ExportOutput;
use adforge_lib::{
    AdforgeOutput, DecodingImageLoader, DirectorySink, ExportDriver, ForgeError, SvgRasterizer,
    ADFORGE_OUTPUT_VERSION,
};
use tracing::debug;

use crate::cli::ExportTarget;

use super::App;

/// Run the export command.
pub async fn run_export(
    app: &App,
    target: ExportTarget,
    output_dir: Option<PathBuf>,
    pixel_ratio: Option<f32>,
) -> Result<AdforgeOutput, ForgeError> {
    let mut config = app.config.export.clone();
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(ratio) = pixel_ratio {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ForgeError::validation(format!(
                "--pixel-ratio must be greater than zero, got {ratio}"
            )));
        }
        config.pixel_ratio = ratio;
    }
    debug!(dir = %config.output_dir.display(), pixel_ratio = config.pixel_ratio, "exporting");

    let editor = app.editor();
    let state = editor.snapshot();
    let driver = ExportDriver::new(
        Arc::new(SvgRasterizer::new()),
        Arc::new(DecodingImageLoader),
        Arc::new(DirectorySink::new(config.output_dir.clone())),
        editor.statuses().clone(),
        config,
    );

    let report = match target {
        ExportTarget::Active => driver.download_active(&state).await?,
        ExportTarget::All => {
            driver
                .download_all_slides(state.require_carousel()?, app.progress())
                .await
        }
        ExportTarget::Slide { slide_id } => {
            driver
                .download_one_slide(state.require_carousel()?, &slide_id)
                .await?
        }
    };
    Ok(AdforgeOutput::Export(ExportOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        report,
    }))
}
