use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::{ForgeError, Result};
use crate::types::InlineMedia;

use super::Scene;

/// Resolves once the image behind `url` is decodable.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<()>;
}

/// Decodes `data:` URLs with the `image` crate on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodingImageLoader;

#[async_trait]
impl ImageLoader for DecodingImageLoader {
    async fn load(&self, url: &str) -> Result<()> {
        let media = InlineMedia::from_data_url(url)?;
        if media.mime_type == "image/svg+xml" {
            media.decode()?;
            return Ok(());
        }
        tokio::task::spawn_blocking(move || -> Result<()> {
            let bytes = media.decode()?;
            image::load_from_memory(&bytes)?;
            Ok(())
        })
        .await
        .map_err(|e| ForgeError::Unknown(format!("image decode task failed: {e}")))?
    }
}

/// The one off-screen mount slot. At most one scene is mounted at a time; a second mount
/// waits until the first is dropped.
pub struct OffscreenSurface {
    slot: Mutex<()>,
    loader: Arc<dyn ImageLoader>,
    paint_delay: Duration,
    settle_delay: Duration,
}

impl OffscreenSurface {
    pub fn new(
        loader: Arc<dyn ImageLoader>,
        paint_delay: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            slot: Mutex::new(()),
            loader,
            paint_delay,
            settle_delay,
        }
    }

    pub async fn mount(&self, scene: Scene) -> MountedScene<'_> {
        let guard = self.slot.lock().await;
        debug!(width = scene.width, height = scene.height, "mounted scene off-screen");
        MountedScene {
            _slot: guard,
            surface: self,
            scene,
        }
    }

    /// True while a scene is mounted.
    pub fn is_occupied(&self) -> bool {
        self.slot.try_lock().is_err()
    }
}

/// A scene occupying the surface. Dropping it unmounts.
pub struct MountedScene<'a> {
    _slot: MutexGuard<'a, ()>,
    surface: &'a OffscreenSurface,
    scene: Scene,
}

impl MountedScene<'_> {
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Waits for the first paint, then for the background image up to `timeout`, then lets the
    /// surface settle. Returns whether the image loaded; a timeout or load error is logged and
    /// the caller captures whatever painted.
    pub async fn wait_until_ready(&self, timeout: Duration) -> bool {
        tokio::time::sleep(self.surface.paint_delay).await;

        let loaded = match self.scene.image_url() {
            Some(url) => match tokio::time::timeout(timeout, self.surface.loader.load(url)).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    warn!(error = %e, "background image failed to load; capturing anyway");
                    false
                }
                Err(_) => {
                    warn!(
                        timeout = ?timeout,
                        "background image did not load in time; capturing anyway"
                    );
                    false
                }
            },
            None => true,
        };

        tokio::time::sleep(self.surface.settle_delay).await;
        loaded
    }
}
