use serde::Serialize;

use crate::credentials::CredentialSource;
use crate::editor::{ActiveCreative, PendingChange, RichText, WorkspaceState};
use crate::error::ErrorPayload;
use crate::export::ExportReport;
use crate::orchestrator::GenerationMode;
use crate::types::{AdCreative, AspectRatio, CarouselCreative, HistoryItem};

/// Schema version for output payloads.
pub const ADFORGE_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum AdforgeOutput {
    Generate(GenerateOutput),
    Workspace(WorkspaceOutput),
    Preview(PreviewOutput),
    Export(ExportOutput),
    History(HistoryOutput),
    Key(KeyOutput),
    Assist(AssistOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub version: String,
    pub generation: GenerationMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub creatives: Vec<AdCreative>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carousel: Option<CarouselCreative>,
    pub workspace: WorkspaceSummary,
}

/// Result of an editing command: what changed and the resulting workspace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceOutput {
    pub version: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub workspace: WorkspaceSummary,
}

/// A destructive change shown before confirmation, or reported after it was applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOutput {
    pub version: String,
    pub change: PendingChange,
    pub summary: String,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutput {
    pub version: String,
    pub report: ExportReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOutput {
    pub version: String,
    pub action: String,
    pub items: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub kind: &'static str,
    pub label: String,
}

impl From<&HistoryItem> for HistoryEntry {
    fn from(item: &HistoryItem) -> Self {
        Self {
            id: item.id().to_string(),
            kind: item.kind(),
            label: item.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyOutput {
    pub version: String,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CredentialSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistOutput {
    pub version: String,
    pub task: String,
    pub results: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSummary {
    pub position: usize,
    pub id: String,
    pub title: String,
}

/// Compact view of the workspace for command output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_title: Option<String>,
    pub variation_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub slides: Vec<SlideSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub has_audio: bool,
    pub aspect_ratio: AspectRatio,
    pub preview_zoom: f32,
    pub revision: u64,
}

impl From<&WorkspaceState> for WorkspaceSummary {
    fn from(state: &WorkspaceState) -> Self {
        let plain = |markup: &str| RichText::parse(markup).plain_text();
        let (active_kind, active_id, active_title, slides, caption, has_audio) = match &state.active
        {
            Some(ActiveCreative::Single(c)) => (
                Some("single"),
                Some(c.id.clone()),
                Some(plain(&c.title)),
                Vec::new(),
                Some(c.caption.clone()),
                c.audio_b64.is_some(),
            ),
            Some(ActiveCreative::Carousel(c)) => (
                Some("carousel"),
                Some(c.id.clone()),
                c.slides.first().map(|s| plain(&s.title)),
                c.slides
                    .iter()
                    .enumerate()
                    .map(|(i, s)| SlideSummary {
                        position: i + 1,
                        id: s.id.clone(),
                        title: plain(&s.title),
                    })
                    .collect(),
                Some(c.caption.clone()),
                false,
            ),
            None => (None, None, None, Vec::new(), None, false),
        };
        Self {
            active_kind,
            active_id,
            active_title,
            variation_ids: state.variations.iter().map(|c| c.id.clone()).collect(),
            slides,
            caption,
            has_audio,
            aspect_ratio: state.aspect_ratio,
            preview_zoom: state.preview_zoom,
            revision: state.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_carousel;

    #[test]
    fn workspace_output_serializes_with_mode_tag() {
        let state = WorkspaceState {
            active: Some(ActiveCreative::Carousel(sample_carousel(2))),
            ..WorkspaceState::default()
        };
        let output = AdforgeOutput::Workspace(WorkspaceOutput {
            version: ADFORGE_OUTPUT_VERSION.to_string(),
            action: "reorder".to_string(),
            detail: None,
            workspace: WorkspaceSummary::from(&state),
        });

        let json = serde_json::to_value(&output).expect("serialize workspace output");
        assert_eq!(json["mode"], "workspace");
        assert_eq!(json["workspace"]["activeKind"], "carousel");
        assert_eq!(json["workspace"]["slides"][1]["position"], 2);
        assert_eq!(json["workspace"]["aspectRatio"], "1:1");
    }

    #[test]
    fn key_output_never_needs_the_raw_key() {
        let output = AdforgeOutput::Key(KeyOutput {
            version: ADFORGE_OUTPUT_VERSION.to_string(),
            configured: true,
            source: Some(CredentialSource::Durable),
            masked_key: Some("AIzaSyA-...6789".to_string()),
        });
        let json = serde_json::to_string(&output).expect("serialize key output");
        assert!(json.contains("\"mode\":\"key\""));
        assert!(json.contains("\"source\":\"durable\""));
    }
}
