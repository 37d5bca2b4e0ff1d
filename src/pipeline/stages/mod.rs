//! Upload pipeline stages
//!
//! Each stage reads its inputs from the context and leaves its outputs there
//! for the next stage. The canonical order is duplicate check, watermark
//! composition, provenance embedding, encryption (commercial only), store.

mod composite;
mod duplicate_check;
mod embed;
mod encrypt;
mod store;

pub use composite::CompositeStage;
pub use duplicate_check::DuplicateCheckStage;
pub use embed::EmbedStage;
pub use encrypt::EncryptStage;
pub use store::StoreStage;

/// Context keys shared across stages
pub mod keys {
    /// Uploaded source file, registered for cleanup by the orchestrator
    pub const SOURCE_PATH: &str = "source_path";
    /// Uploading creator's wallet address
    pub const CREATOR: &str = "creator";
    /// Watermarked output of the compositor
    pub const COMPOSITED_PATH: &str = "composited_path";
    /// Measured source duration in seconds
    pub const DURATION: &str = "duration";
    /// Provenance-marked output of the embedder
    pub const MARKED_PATH: &str = "marked_path";
    /// File the store stage uploads (marked or encrypted)
    pub const ARTIFACT_PATH: &str = "artifact_path";
    /// Alias of the key protecting the artifact, commercial only
    pub const KEY_ALIAS: &str = "key_alias";
    /// Object key the artifact was stored under
    pub const OBJECT_KEY: &str = "object_key";
    /// Initial retrieval URL, public only
    pub const LOCATOR: &str = "locator";
}
