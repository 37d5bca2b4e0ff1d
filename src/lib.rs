//! medialock: content protection and provenance for marketplace media
//!
//! Takes a creator's uploaded video through watermark composition, provenance
//! marking, optional encryption, and object storage, then manages the key and
//! object namespaces across mint and serves caller-scoped licenses for
//! commercial assets.

pub mod config;
pub mod encryption;
pub mod engine;
pub mod error;
pub mod kms;
pub mod license;
pub mod logging;
pub mod marketplace;
pub mod pipeline;
pub mod provenance;
pub mod service;
pub mod session;
pub mod storage;
pub mod watermark;

pub use config::PipelineConfig;
pub use error::{MedialockError, MedialockResult};
pub use service::{PendingAssetRef, ProtectionService, StoredAssetRef};
pub use session::{DistributionMode, UploadState};
