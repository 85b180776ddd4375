use std::sync::Arc;

/// Receives human-readable stage labels while a long operation runs.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub(crate) fn report(progress: Option<&ProgressCallback>, label: &str) {
    if let Some(cb) = progress {
        cb(label);
    }
}
