use std::path::Path;
use std::sync::Arc;

use adforge_lib::testing::StubCollaborator;
use adforge_lib::{AiCollaborator, Config, ForgeError, GeminiClient, ProgressCallback};
use tracing_subscriber::EnvFilter;

/// Switches the binary to the offline stub collaborator. Values: `ok` (or anything else),
/// `credential-error`, `quota-error`.
pub const MOCK_AI_ENV: &str = "ADFORGE_MOCK_AI";

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/adforge/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, ForgeError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        ForgeError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        ForgeError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Stderr logging; `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "adforge=debug,adforge_lib=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Prints stage labels to stderr in verbose mode.
pub fn progress_printer(verbose: bool) -> Option<ProgressCallback> {
    if verbose {
        Some(Arc::new(|label: &str| eprintln!("{label}")))
    } else {
        None
    }
}

/// The AI collaborator: the REST client, or the stub when [`MOCK_AI_ENV`] is set.
pub fn collaborator(config: &Config) -> Result<Arc<dyn AiCollaborator>, ForgeError> {
    match std::env::var(MOCK_AI_ENV) {
        Ok(mode) => Ok(Arc::new(mock_collaborator(&mode))),
        Err(_) => Ok(Arc::new(GeminiClient::new(&config.api)?)),
    }
}

fn mock_collaborator(mode: &str) -> StubCollaborator {
    match mode.trim() {
        "credential-error" => {
            let fail =
                || ForgeError::Credential("API key not valid. Please pass a valid API key.".into());
            StubCollaborator::new()
                .fail_copy_with(fail)
                .fail_images_with(fail)
        }
        "quota-error" => {
            let fail =
                || ForgeError::Quota("Resource has been exhausted (e.g. check quota).".into());
            StubCollaborator::new()
                .fail_copy_with(fail)
                .fail_images_with(fail)
        }
        _ => StubCollaborator::new(),
    }
}
