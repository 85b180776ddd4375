use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::error::{ForgeError, Result};

/// Transient per-slide activity, kept off the slide entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideStatus {
    pub is_generating: bool,
    pub is_downloading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Generating,
    Downloading,
}

/// Status flags keyed by slide id, shared by the editor and the export driver.
#[derive(Debug, Clone, Default)]
pub struct SlideStatusMap {
    inner: Arc<Mutex<HashMap<String, SlideStatus>>>,
}

impl SlideStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SlideStatus>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn status(&self, slide_id: &str) -> SlideStatus {
        self.lock().get(slide_id).copied().unwrap_or_default()
    }

    pub fn is_generating(&self, slide_id: &str) -> bool {
        self.status(slide_id).is_generating
    }

    /// Marks the slide as generating. Fails if a regeneration is already pending for it.
    pub fn begin_generating(&self, slide_id: &str) -> Result<StatusGuard> {
        let mut map = self.lock();
        let entry = map.entry(slide_id.to_string()).or_default();
        if entry.is_generating {
            return Err(ForgeError::validation(format!(
                "A new image for slide {slide_id} is already being generated."
            )));
        }
        entry.is_generating = true;
        Ok(StatusGuard::new(self.clone(), slide_id, Activity::Generating))
    }

    /// Marks the slide as downloading until the guard drops.
    pub fn begin_downloading(&self, slide_id: &str) -> StatusGuard {
        self.lock()
            .entry(slide_id.to_string())
            .or_default()
            .is_downloading = true;
        StatusGuard::new(self.clone(), slide_id, Activity::Downloading)
    }

    fn finish(&self, slide_id: &str, activity: Activity) {
        let mut map = self.lock();
        if let Some(entry) = map.get_mut(slide_id) {
            match activity {
                Activity::Generating => entry.is_generating = false,
                Activity::Downloading => entry.is_downloading = false,
            }
            if *entry == SlideStatus::default() {
                map.remove(slide_id);
            }
        }
    }
}

/// Clears its flag when dropped, on success, failure or cancellation alike.
#[derive(Debug)]
pub struct StatusGuard {
    map: SlideStatusMap,
    slide_id: String,
    activity: Activity,
}

impl StatusGuard {
    fn new(map: SlideStatusMap, slide_id: &str, activity: Activity) -> Self {
        Self {
            map,
            slide_id: slide_id.to_string(),
            activity,
        }
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        self.map.finish(&self.slide_id, self.activity);
    }
}
