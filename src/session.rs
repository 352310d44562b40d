//! Caller sessions
//!
//! A session only remembers which display name the caller picked. There is
//! no authentication of any kind here.
use crate::auction::Identity;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub type SessionId = Uuid;
pub type SharedSession = Arc<Session>;
pub type SharedSessionRegistry = Arc<SessionRegistry>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("identity name must not be empty")]
    EmptyName,
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
}

#[derive(Default, Debug)]
pub struct Session {
    identity: RwLock<Option<Identity>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.read().clone()
    }

    pub fn set_identity(&self, name: &str) -> Result<Identity, SessionError> {
        let identity = Identity::new(name).ok_or(SessionError::EmptyName)?;
        *self.identity.write() = Some(identity.clone());
        Ok(identity)
    }

    pub fn clear(&self) {
        *self.identity.write() = None;
    }
}

/// All live sessions, keyed by a random id handed to the caller
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<SessionId, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedSessionRegistry {
        Arc::new(Self::new())
    }

    pub fn open(&self, name: &str) -> Result<(SessionId, SharedSession), SessionError> {
        let session = Arc::new(Session::new());
        let identity = session.set_identity(name)?;
        let id = Uuid::new_v4();

        self.sessions.write().insert(id, session.clone());
        debug!(%id, %identity, "session opened");
        Ok((id, session))
    }

    pub fn get(&self, id: SessionId) -> Result<SharedSession, SessionError> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownSession(id))
    }

    pub fn close(&self, id: SessionId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .write()
            .remove(&id)
            .ok_or(SessionError::UnknownSession(id))?;
        session.clear();
        debug!(%id, "session closed");
        Ok(())
    }
}
