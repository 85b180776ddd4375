use adforge_lib::output::{HistoryEntry, HistoryOutput};
use adforge_lib::{AdforgeOutput, ForgeError, HistoryStore, SaveOutcome, ADFORGE_OUTPUT_VERSION};

use crate::cli::HistoryAction;

use super::{workspace_output, App};

/// Run the history command.
pub fn run_history(app: &App, action: HistoryAction) -> Result<AdforgeOutput, ForgeError> {
    let mut history = app.history();
    match action {
        HistoryAction::List => Ok(history_output("list", &history)),
        HistoryAction::Save => {
            let outcome = app.editor().save_active_to_history(&mut history)?;
            let action = match outcome {
                SaveOutcome::Inserted => "saved",
                SaveOutcome::Replaced { .. } => "updated",
            };
            Ok(history_output(action, &history))
        }
        HistoryAction::Select { id } => {
            let item = history
                .get(&id)
                .ok_or_else(|| ForgeError::validation(format!("Unknown history id: {id}")))?;
            let editor = app.editor();
            editor.select_from_history(item)?;
            Ok(workspace_output(
                "history-select",
                Some(format!("Restored {} {}", item.kind(), item.id())),
                &editor.snapshot(),
            ))
        }
        HistoryAction::Clear { yes } => {
            if !yes {
                // Lists what would be deleted.
                return Ok(history_output("clear-preview", &history));
            }
            history.clear();
            Ok(history_output("cleared", &history))
        }
    }
}

fn history_output(action: &str, history: &HistoryStore) -> AdforgeOutput {
    AdforgeOutput::History(HistoryOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        action: action.to_string(),
        items: history.items().iter().map(HistoryEntry::from).collect(),
    })
}
