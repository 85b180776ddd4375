//! Explicit credential + collaborator context passed to the orchestrator and editor.

use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::credentials::{ApiCredential, CredentialSource, CredentialStore};
use crate::error::{ForgeError, Result};
use crate::gemini::AiCollaborator;
use crate::types::{AdCopyVariation, AspectRatio, CarouselPlan, InlineMedia};

/// Holds the single process-wide credential slot.
///
/// Every collaborator call reads the slot when it starts. A credential-shaped failure empties
/// the slot and every stored copy; calls already in flight keep the key they started with.
pub struct Session {
    collaborator: Arc<dyn AiCollaborator>,
    credentials: CredentialStore,
    current: RwLock<Option<ApiCredential>>,
}

impl Session {
    pub fn new(collaborator: Arc<dyn AiCollaborator>, credentials: CredentialStore) -> Self {
        Self {
            collaborator,
            credentials,
            current: RwLock::new(None),
        }
    }

    /// Builds a session and fills the slot from the environment or storage.
    pub fn resolve(
        collaborator: Arc<dyn AiCollaborator>,
        credentials: CredentialStore,
    ) -> Result<Self> {
        let session = Self::new(collaborator, credentials);
        let resolved = session.credentials.resolve()?;
        session.replace(resolved);
        Ok(session)
    }

    fn replace(&self, credential: Option<ApiCredential>) {
        match self.current.write() {
            Ok(mut slot) => *slot = credential,
            Err(poisoned) => *poisoned.into_inner() = credential,
        }
    }

    fn snapshot(&self) -> Option<ApiCredential> {
        match self.current.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Overwrites the slot and the stored copies.
    pub fn set_credential(&self, raw: &str, remember: bool) -> Result<ApiCredential> {
        let credential = self.credentials.store(raw, remember)?;
        self.replace(Some(credential.clone()));
        Ok(credential)
    }

    pub fn clear_credential(&self) -> Result<()> {
        self.replace(None);
        self.credentials.clear()
    }

    pub fn credential_status(&self) -> Option<(CredentialSource, String)> {
        self.snapshot().map(|c| (c.source, c.masked()))
    }

    pub fn has_credential(&self) -> bool {
        self.snapshot().is_some()
    }

    fn api_key(&self) -> Result<String> {
        self.snapshot().map(|c| c.key().to_string()).ok_or_else(|| {
            ForgeError::Credential(
                "No API key is configured. Set one before calling the AI service.".to_string(),
            )
        })
    }

    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_credential() {
                let masked = self.snapshot().map(|c| c.masked());
                warn!(key = ?masked, "credential rejected; clearing stored API keys");
                self.replace(None);
                if let Err(clear_err) = self.credentials.clear() {
                    warn!(error = %clear_err, "failed to clear stored API keys");
                }
            }
        }
        result
    }

    pub async fn generate_ad_copy(
        &self,
        project_context: &str,
        count: usize,
    ) -> Result<Vec<AdCopyVariation>> {
        let key = self.api_key()?;
        let result = self
            .collaborator
            .generate_ad_copy(&key, project_context, count)
            .await;
        self.observe(result)
    }

    pub async fn generate_carousel_plan(
        &self,
        project_context: &str,
        style_guide: &str,
        has_expert_image: bool,
        slide_count: usize,
    ) -> Result<CarouselPlan> {
        let key = self.api_key()?;
        let result = self
            .collaborator
            .generate_carousel_plan(
                &key,
                project_context,
                style_guide,
                has_expert_image,
                slide_count,
            )
            .await;
        self.observe(result)
    }

    pub async fn generate_image(&self, prompt: &str, ratio: AspectRatio) -> Result<InlineMedia> {
        let key = self.api_key()?;
        let result = self.collaborator.generate_image(&key, prompt, ratio).await;
        self.observe(result)
    }

    pub async fn recreate_with_subject(
        &self,
        subject: &InlineMedia,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia> {
        let key = self.api_key()?;
        let result = self
            .collaborator
            .recreate_with_subject(&key, subject, prompt, ratio)
            .await;
        self.observe(result)
    }

    /// Edit-with-subject when a subject image is held, plain text-to-image otherwise.
    pub async fn background_image(
        &self,
        expert_image: Option<&InlineMedia>,
        prompt: &str,
        ratio: AspectRatio,
    ) -> Result<InlineMedia> {
        match expert_image {
            Some(subject) => self.recreate_with_subject(subject, prompt, ratio).await,
            None => self.generate_image(prompt, ratio).await,
        }
    }

    pub async fn transcribe_audio(&self, audio: &InlineMedia) -> Result<String> {
        let key = self.api_key()?;
        let result = self.collaborator.transcribe_audio(&key, audio).await;
        self.observe(result)
    }

    pub async fn extract_text(&self, document: &InlineMedia) -> Result<String> {
        let key = self.api_key()?;
        let result = self.collaborator.extract_text(&key, document).await;
        self.observe(result)
    }

    pub async fn generate_alternative_hooks(&self, context: &str) -> Result<Vec<String>> {
        let key = self.api_key()?;
        let result = self
            .collaborator
            .generate_alternative_hooks(&key, context)
            .await;
        self.observe(result)
    }

    pub async fn generate_alternative_captions(&self, context: &str) -> Result<Vec<String>> {
        let key = self.api_key()?;
        let result = self
            .collaborator
            .generate_alternative_captions(&key, context)
            .await;
        self.observe(result)
    }

    pub async fn generate_speech(&self, text: &str) -> Result<InlineMedia> {
        let key = self.api_key()?;
        let result = self.collaborator.generate_speech(&key, text).await;
        self.observe(result)
    }
}
