use adforge_lib::output::KeyOutput;
use adforge_lib::{AdforgeOutput, ForgeError, ADFORGE_OUTPUT_VERSION};
use tracing::info;

use crate::cli::KeyAction;

use super::App;

/// Run the key command. The raw key never reaches the output.
pub fn run_key(app: &App, action: KeyAction) -> Result<AdforgeOutput, ForgeError> {
    match action {
        KeyAction::Set { key, remember } => {
            let credential = app.session.set_credential(&key, remember)?;
            info!(source = %credential.source, key = %credential.masked(), "stored API key");
        }
        KeyAction::Clear => app.session.clear_credential()?,
        KeyAction::Status => {}
    }
    let status = app.session.credential_status();
    Ok(AdforgeOutput::Key(KeyOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        configured: status.is_some(),
        source: status.as_ref().map(|(source, _)| *source),
        masked_key: status.map(|(_, masked)| masked),
    }))
}
