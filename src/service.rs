//! Protection service
//!
//! The orchestrator the surrounding backend talks to. Owns the collaborators,
//! assembles the upload pipeline per submission, and exposes the mint and
//! license paths that operate on finished sessions.

use crate::config::PipelineConfig;
use crate::engine::TranscodeEngine;
use crate::error::{MedialockError, MedialockResult};
use crate::kms::{creator_alias, token_alias, KeyId, KeyLifecycle};
use crate::license::{seal_key, LicenseGrant};
use crate::marketplace::MarketplaceDirectory;
use crate::pipeline::stages::{
    keys, CompositeStage, DuplicateCheckStage, EmbedStage, EncryptStage, StoreStage,
};
use crate::pipeline::{Pipeline, PipelineContext};
use crate::session::{DistributionMode, SessionStore, UploadSession, UploadState};
use crate::storage::StorageDispatcher;
use crate::watermark::OverlayCompositor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use url::Url;
use uuid::Uuid;

/// Outcome of a completed upload, prior to mint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAssetRef {
    pub session_id: Uuid,
    pub state: UploadState,
    pub object_key: String,
    /// Retrieval URL, public assets only
    pub locator: Option<String>,
}

/// Outcome of binding a minted token to its asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAssetRef {
    pub token_id: String,
    pub object_key: String,
    /// Alias of the protecting key, commercial assets only
    pub key_alias: Option<String>,
}

pub struct ProtectionService {
    engine: Arc<dyn TranscodeEngine>,
    lifecycle: Arc<KeyLifecycle>,
    storage: Arc<StorageDispatcher>,
    sessions: Arc<SessionStore>,
    directory: Arc<dyn MarketplaceDirectory>,
    config: PipelineConfig,
}

impl ProtectionService {
    pub fn new(
        engine: Arc<dyn TranscodeEngine>,
        lifecycle: Arc<KeyLifecycle>,
        storage: Arc<StorageDispatcher>,
        sessions: Arc<SessionStore>,
        directory: Arc<dyn MarketplaceDirectory>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            engine,
            lifecycle,
            storage,
            sessions,
            directory,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run the full protection pipeline over an uploaded file.
    ///
    /// Takes ownership of the upload temp file; it is removed when the run
    /// ends, whatever the outcome. The optional deadline bounds the run
    /// without aborting an in-flight stage.
    pub async fn submit_upload(
        &self,
        source: PathBuf,
        creator: &str,
        mode: DistributionMode,
        deadline: Option<Instant>,
    ) -> MedialockResult<PendingAssetRef> {
        validate_wallet(creator)?;

        let session = UploadSession::new(creator, mode);
        let session_id = session.id;
        self.sessions.insert(session)?;
        tracing::info!(session = %session_id, %creator, ?mode, "upload accepted");

        let engine = self.engine.clone();
        let lifecycle = self.lifecycle.clone();
        let storage = self.storage.clone();
        let sessions = self.sessions.clone();
        let config = self.config.clone();
        let creator = creator.to_string();

        let context = tokio::task::spawn_blocking(move || {
            let mut context = PipelineContext::new(session_id, mode);
            context.set_path(keys::SOURCE_PATH, source.clone());
            context.set_string(keys::CREATOR, &creator);
            context.add_temp_file(source);

            let pipeline = Pipeline::builder("protect-upload")
                .add_stage(DuplicateCheckStage)
                .add_stage(CompositeStage::new(
                    OverlayCompositor::new(engine, config.watermark_path.clone()),
                    config.work_dir.clone(),
                ))
                .add_stage(EmbedStage::new(config.work_dir.clone()))
                .add_stage(EncryptStage::new(lifecycle, storage.clone(), config.work_dir))
                .add_stage(StoreStage::new(storage))
                .build();

            pipeline.execute(&mut context, &sessions, deadline)?;
            Ok::<_, MedialockError>(context)
        })
        .await
        .map_err(|e| MedialockError::Pipeline(format!("pipeline task panicked: {}", e)))??;

        let object_key = context.get_string(keys::OBJECT_KEY)?;
        let locator = context.get_string(keys::LOCATOR).ok();
        let key_alias = context.get_string(keys::KEY_ALIAS).ok();

        let session = self.sessions.update(session_id, |session| {
            session.object_key = Some(object_key.clone());
            session.locator = locator.clone();
            session.key_alias = key_alias;
        })?;

        Ok(PendingAssetRef {
            session_id,
            state: session.state,
            object_key,
            locator,
        })
    }

    /// Bind a freshly minted token to its stored session.
    ///
    /// Moves the object and, for commercial assets, the key alias from the
    /// creator namespace into the token namespace. Safe to retry: a session
    /// already finalized for the same token is returned as-is, and both
    /// renames tolerate a prior partial completion.
    pub fn finalize_on_mint(
        &self,
        session_id: Uuid,
        token_id: &str,
    ) -> MedialockResult<StoredAssetRef> {
        let session = self.sessions.get(session_id)?;

        if session.state == UploadState::Finalized {
            if session.token_id.as_deref() == Some(token_id) {
                return Ok(StoredAssetRef {
                    token_id: token_id.to_string(),
                    object_key: session.object_key.clone().unwrap_or_default(),
                    key_alias: session.key_alias,
                });
            }
            return Err(MedialockError::InvalidStateTransition(format!(
                "session {} already finalized for another token",
                session_id
            )));
        }
        if session.state != UploadState::Stored {
            return Err(MedialockError::InvalidStateTransition(format!(
                "session {} is {:?}, expected Stored",
                session_id, session.state
            )));
        }

        let old_key = session.object_key.clone().ok_or_else(|| {
            MedialockError::Storage(format!("session {} has no stored object", session_id))
        })?;
        let new_key = format!("token/{}", token_id);
        self.storage.rename(&old_key, &new_key)?;

        let key_alias = if session.mode == DistributionMode::Commercial {
            let new_alias = token_alias(token_id);
            self.rename_key_alias(&session.creator, &new_alias)?;
            Some(new_alias)
        } else {
            None
        };

        self.sessions.update(session_id, |session| {
            session.token_id = Some(token_id.to_string());
            session.object_key = Some(new_key.clone());
            session.key_alias = key_alias.clone();
        })?;
        self.sessions.advance(session_id, UploadState::Finalized)?;
        tracing::info!(session = %session_id, token = token_id, "asset finalized at mint");

        Ok(StoredAssetRef {
            token_id: token_id.to_string(),
            object_key: new_key,
            key_alias,
        })
    }

    /// Move the creator-scoped key alias to the token scope, tolerating a
    /// retry after the alias already moved.
    fn rename_key_alias(&self, creator: &str, new_alias: &str) -> MedialockResult<()> {
        let old_alias = creator_alias(creator);
        match self.lifecycle.get_or_none(&old_alias)? {
            Some(key) => self.lifecycle.rename(&old_alias, new_alias, &key),
            None => {
                // A prior attempt may have moved the alias already
                if self.lifecycle.get_or_none(new_alias)?.is_some() {
                    Ok(())
                } else {
                    Err(MedialockError::KeyNotFound(old_alias))
                }
            }
        }
    }

    /// Issue a caller-scoped license for a commercial asset.
    ///
    /// The caller proves entitlement through the marketplace directory; the
    /// key bytes are handed over re-encrypted under the caller's bearer
    /// token, never in the clear.
    pub fn issue_license(
        &self,
        token_id: &str,
        caller_wallet: &str,
        caller_token: &str,
    ) -> MedialockResult<LicenseGrant> {
        let session = self.sessions.find_by_token(token_id)?;
        if session.mode != DistributionMode::Commercial {
            return Err(MedialockError::NotCommercial);
        }
        self.authorize(token_id, caller_wallet)?;

        let alias = token_alias(token_id);
        let key = self.key_for(&alias)?;
        let key_bytes = self.lifecycle.key_material(&key)?;

        tracing::info!(token = token_id, caller = caller_wallet, "license issued");
        seal_key(token_id, &key_bytes, caller_token)
    }

    /// Retrieval URL for a token's asset.
    ///
    /// Public assets presign without questions; commercial assets require
    /// the same entitlement as a license.
    pub fn asset_url(&self, token_id: &str, caller_wallet: &str) -> MedialockResult<Url> {
        let session = self.sessions.find_by_token(token_id)?;
        let object_key = session.object_key.clone().ok_or_else(|| {
            MedialockError::Storage(format!("token {} has no stored object", token_id))
        })?;

        if session.mode == DistributionMode::Commercial {
            self.authorize(token_id, caller_wallet)?;
        }
        self.storage.presign(&object_key)
    }

    fn authorize(&self, token_id: &str, wallet: &str) -> MedialockResult<()> {
        let entitled = self.directory.is_owner(token_id, wallet)?
            || self.directory.is_active_subscriber(token_id, wallet)?
            || self.directory.is_admin(wallet)?;
        if entitled {
            Ok(())
        } else {
            tracing::warn!(token = token_id, caller = wallet, "license request denied");
            Err(MedialockError::UnauthorizedLicense)
        }
    }

    fn key_for(&self, alias: &str) -> MedialockResult<KeyId> {
        self.lifecycle
            .get_or_none(alias)?
            .ok_or_else(|| MedialockError::KeyNotFound(alias.to_string()))
    }
}

/// Wallet addresses are 0x-prefixed 40-digit hex strings.
fn validate_wallet(wallet: &str) -> MedialockResult<()> {
    let hex_part = wallet.strip_prefix("0x").ok_or_else(|| {
        MedialockError::PreconditionFailed(format!("wallet '{}' lacks 0x prefix", wallet))
    })?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MedialockError::PreconditionFailed(format!(
            "wallet '{}' is not a 40-digit hex address",
            wallet
        )));
    }
    Ok(())
}
