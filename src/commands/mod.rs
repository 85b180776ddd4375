mod edit;
mod export;
mod generate;
mod history;
mod key;

use std::path::Path;
use std::sync::Arc;

use adforge_lib::output::WorkspaceOutput;
use adforge_lib::{
    AdforgeOutput, Config, CredentialStore, EditingController, ForgeError, HistoryStore,
    ProgressCallback, Session, Stores, WorkspaceState, ADFORGE_OUTPUT_VERSION,
};

use crate::settings::{collaborator, load_config, progress_printer};

pub use edit::{
    run_audio, run_edit, run_reset, run_select, run_show, run_slides, run_style, run_view,
};
pub use export::run_export;
pub use generate::{run_assist, run_generate, GenerateArgs};
pub use history::run_history;
pub use key::run_key;

/// Everything a command handler needs, built once per invocation.
pub struct App {
    pub config: Config,
    pub stores: Stores,
    pub session: Arc<Session>,
    pub verbose: bool,
}

impl App {
    pub fn open(config_path: Option<&Path>, verbose: bool) -> Result<Self, ForgeError> {
        let config = load_config(config_path)?;
        let stores = Stores::from_config(&config.storage);
        let credentials = CredentialStore::new(stores.clone()).with_process_environment();
        let session = Arc::new(Session::resolve(collaborator(&config)?, credentials)?);
        if verbose {
            let source = config_path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults/built-in".to_string());
            eprintln!(
                "Effective config (source: {}): data_dir {}, variations {}, carousel_slides {}, pixel_ratio {:.1}",
                source,
                config.storage.data_dir.display(),
                config.generation.variations,
                config.generation.carousel_slides,
                config.export.pixel_ratio
            );
        }
        Ok(Self {
            config,
            stores,
            session,
            verbose,
        })
    }

    /// The persisted workspace, reloaded from the durable store.
    pub fn editor(&self) -> EditingController {
        EditingController::load(self.session.clone(), self.stores.durable.clone())
    }

    pub fn history(&self) -> HistoryStore {
        HistoryStore::load(self.stores.durable.clone())
    }

    pub fn progress(&self) -> Option<ProgressCallback> {
        progress_printer(self.verbose)
    }
}

pub(crate) fn workspace_output(
    action: &str,
    detail: Option<String>,
    state: &WorkspaceState,
) -> AdforgeOutput {
    AdforgeOutput::Workspace(WorkspaceOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        action: action.to_string(),
        detail,
        workspace: state.into(),
    })
}
