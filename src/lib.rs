//! AdForge Library
//!
//! Generates advertising creatives (single images or multi-slide carousels) through a
//! generative AI service, edits their text and style, and rasterizes them to PNG.
//!
//! # Module Overview
//!
//! - [`orchestrator`] - Multi-step generation pipeline (copy/plan, images, assembly)
//! - [`editor`] - Live editing session: fields, styles, presets, slides, audio
//! - [`export`] - Off-screen rasterization and file output with per-slide failure isolation
//! - [`history`] - Saved snapshots, upserted by id
//! - [`session`] - Credential slot plus the AI collaborator
//! - [`gemini`] - AI collaborator trait and REST client
//! - [`render`] - Scenes, SVG building and `resvg` rasterization
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use adforge_lib::{Config, CredentialStore, GeminiClient, GenerationMode, GenerationOrchestrator};
//! use adforge_lib::{GenerationRequest, Session, Stores};
//!
//! # async fn example() -> adforge_lib::Result<()> {
//! let config = Config::default();
//! let client = Arc::new(GeminiClient::new(&config.api)?);
//! let credentials = CredentialStore::new(Stores::on_disk(&config.storage.data_dir))
//!     .with_process_environment();
//! let session = Arc::new(Session::resolve(client, credentials)?);
//!
//! let orchestrator = GenerationOrchestrator::new(session, config.generation.clone());
//! let request = GenerationRequest {
//!     project_context: "launch eco coffee beans".into(),
//!     mode: GenerationMode::Carousel,
//!     ..GenerationRequest::default()
//! };
//! let outcome = orchestrator.generate(&request, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod editor;
pub mod error;
pub mod export;
pub mod gemini;
pub mod history;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod render;
pub mod session;
pub mod storage;
pub mod style;
pub mod testing;
pub mod types;

pub use config::Config;
pub use credentials::{mask_key, ApiCredential, CredentialSource, CredentialStore};
pub use editor::{
    ActiveCreative, ChangeKind, EditableText, EditingController, InlineCommand, PendingChange,
    RichText, Selection, SlideStatus, SlideStatusMap, WorkspaceState,
};
pub use error::{ErrorCategory, ErrorPayload, ForgeError, Result};
pub use export::{DirectorySink, ExportDriver, ExportReport, FileSink};
pub use gemini::{AiCollaborator, GeminiClient};
pub use history::{HistoryStore, SaveOutcome};
pub use orchestrator::{
    GenerationMode, GenerationOrchestrator, GenerationOutcome, GenerationRequest,
};
pub use output::{AdforgeOutput, ErrorOutput, ADFORGE_OUTPUT_VERSION};
pub use progress::ProgressCallback;
pub use render::{DecodingImageLoader, Rasterizer, Scene, SvgRasterizer};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore, Stores};
pub use style::{GlobalStyle, LayoutPreset, StyleSettings};
pub use types::{
    AdCopyVariation, AdCreative, AspectRatio, CarouselCreative, CarouselSlide, HistoryItem,
    InlineMedia, SlideField, TextField,
};
