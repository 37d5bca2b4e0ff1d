//! Upload sessions and their state machine
//!
//! Each upload runs as one session that walks a fixed state sequence:
//! Received -> DuplicateChecked -> Composited -> Marked -> Encrypted ->
//! Stored -> Finalized. Public uploads skip Encrypted. Failed is reachable
//! from any non-terminal state and is terminal, as is Finalized.

use crate::error::{MedialockError, MedialockResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// How the finished asset is distributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    /// Stored in the clear under a content address
    Public,
    /// Encrypted under a per-creator key, access via licenses
    Commercial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Received,
    DuplicateChecked,
    Composited,
    Marked,
    Encrypted,
    Stored,
    Finalized,
    Failed,
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Finalized | UploadState::Failed)
    }

    /// Whether `next` is a legal successor of `self` in `mode`.
    pub fn can_advance_to(&self, next: UploadState, mode: DistributionMode) -> bool {
        use UploadState::*;
        if next == Failed {
            return !self.is_terminal();
        }
        match (self, next) {
            (Received, DuplicateChecked) => true,
            (DuplicateChecked, Composited) => true,
            (Composited, Marked) => true,
            (Marked, Encrypted) => mode == DistributionMode::Commercial,
            (Marked, Stored) => mode == DistributionMode::Public,
            (Encrypted, Stored) => true,
            (Stored, Finalized) => true,
            _ => false,
        }
    }
}

/// One upload's lifecycle record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub id: Uuid,
    pub creator: String,
    pub mode: DistributionMode,
    pub state: UploadState,
    pub created_at: DateTime<Utc>,

    /// Object key the stored artifact lives under, once stored
    pub object_key: Option<String>,

    /// Retrieval locator for public assets (content-addressed URL)
    pub locator: Option<String>,

    /// Key alias protecting the artifact, commercial mode only
    pub key_alias: Option<String>,

    /// Token id bound at mint
    pub token_id: Option<String>,

    /// Failure message when state is Failed
    pub error: Option<String>,
}

impl UploadSession {
    pub fn new(creator: &str, mode: DistributionMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator: creator.to_string(),
            mode,
            state: UploadState::Received,
            created_at: Utc::now(),
            object_key: None,
            locator: None,
            key_alias: None,
            token_id: None,
            error: None,
        }
    }
}

/// In-memory session registry
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, UploadSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: UploadSession) -> MedialockResult<()> {
        let mut sessions = self.sessions.lock()?;
        sessions.insert(session.id, session);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> MedialockResult<UploadSession> {
        let sessions = self.sessions.lock()?;
        sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| MedialockError::SessionNotFound(id.to_string()))
    }

    /// Apply `f` to the stored session under the lock.
    pub fn update<F>(&self, id: Uuid, f: F) -> MedialockResult<UploadSession>
    where
        F: FnOnce(&mut UploadSession),
    {
        let mut sessions = self.sessions.lock()?;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| MedialockError::SessionNotFound(id.to_string()))?;
        f(session);
        Ok(session.clone())
    }

    /// Advance the session's state, enforcing the legal sequence.
    pub fn advance(&self, id: Uuid, next: UploadState) -> MedialockResult<UploadSession> {
        let mut sessions = self.sessions.lock()?;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| MedialockError::SessionNotFound(id.to_string()))?;

        if !session.state.can_advance_to(next, session.mode) {
            return Err(MedialockError::InvalidStateTransition(format!(
                "{:?} -> {:?} (mode {:?})",
                session.state, next, session.mode
            )));
        }

        session.state = next;
        tracing::debug!(session = %id, state = ?next, "session advanced");
        Ok(session.clone())
    }

    /// Record a terminal failure with its message.
    pub fn fail(&self, id: Uuid, message: &str) -> MedialockResult<()> {
        self.update(id, |session| {
            if !session.state.is_terminal() {
                session.state = UploadState::Failed;
                session.error = Some(message.to_string());
            }
        })?;
        Ok(())
    }

    /// Find the session an on-chain token was bound to.
    pub fn find_by_token(&self, token_id: &str) -> MedialockResult<UploadSession> {
        let sessions = self.sessions.lock()?;
        sessions
            .values()
            .find(|s| s.token_id.as_deref() == Some(token_id))
            .cloned()
            .ok_or_else(|| MedialockError::TokenNotFound(token_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATOR: &str = "0xaa01aa01aa01aa01aa01aa01aa01aa01aa01aa01";

    fn walk(store: &SessionStore, id: Uuid, states: &[UploadState]) {
        for s in states {
            store.advance(id, *s).unwrap();
        }
    }

    #[test]
    fn test_commercial_walks_full_sequence() {
        let store = SessionStore::new();
        let session = UploadSession::new(CREATOR, DistributionMode::Commercial);
        let id = session.id;
        store.insert(session).unwrap();

        use UploadState::*;
        walk(
            &store,
            id,
            &[
                DuplicateChecked,
                Composited,
                Marked,
                Encrypted,
                Stored,
                Finalized,
            ],
        );
        assert_eq!(store.get(id).unwrap().state, Finalized);
    }

    #[test]
    fn test_public_skips_encrypted() {
        let store = SessionStore::new();
        let session = UploadSession::new(CREATOR, DistributionMode::Public);
        let id = session.id;
        store.insert(session).unwrap();

        use UploadState::*;
        walk(&store, id, &[DuplicateChecked, Composited, Marked, Stored]);

        // Public mode must not pass through Encrypted
        let session = UploadSession::new(CREATOR, DistributionMode::Public);
        let id2 = session.id;
        store.insert(session).unwrap();
        walk(&store, id2, &[DuplicateChecked, Composited, Marked]);
        assert!(store.advance(id2, Encrypted).is_err());
    }

    #[test]
    fn test_skipping_a_state_is_rejected() {
        let store = SessionStore::new();
        let session = UploadSession::new(CREATOR, DistributionMode::Commercial);
        let id = session.id;
        store.insert(session).unwrap();

        let err = store.advance(id, UploadState::Composited).unwrap_err();
        assert!(matches!(err, MedialockError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_failed_is_reachable_from_any_nonterminal() {
        let store = SessionStore::new();
        let session = UploadSession::new(CREATOR, DistributionMode::Commercial);
        let id = session.id;
        store.insert(session).unwrap();

        store.advance(id, UploadState::DuplicateChecked).unwrap();
        store.fail(id, "composition failed").unwrap();

        let session = store.get(id).unwrap();
        assert_eq!(session.state, UploadState::Failed);
        assert_eq!(session.error.as_deref(), Some("composition failed"));
    }

    #[test]
    fn test_terminal_states_do_not_advance() {
        let store = SessionStore::new();
        let session = UploadSession::new(CREATOR, DistributionMode::Public);
        let id = session.id;
        store.insert(session).unwrap();

        store.fail(id, "boom").unwrap();
        assert!(store.advance(id, UploadState::DuplicateChecked).is_err());
        // fail() on a terminal session leaves it untouched
        store.fail(id, "second failure").unwrap();
        assert_eq!(store.get(id).unwrap().error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_find_by_token() {
        let store = SessionStore::new();
        let mut session = UploadSession::new(CREATOR, DistributionMode::Commercial);
        session.token_id = Some("7".to_string());
        let id = session.id;
        store.insert(session).unwrap();

        assert_eq!(store.find_by_token("7").unwrap().id, id);
        assert!(matches!(
            store.find_by_token("8"),
            Err(MedialockError::TokenNotFound(_))
        ));
    }
}
