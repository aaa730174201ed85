use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ClientError;
use crate::model::UserProfile;

/// What a successful login hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub user: UserProfile,
}

/// The client's login state: absent, populated on login, cleared on logout
/// or when the server answers 401.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    credential: Option<Credential>,
}

impl Session {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self { credential: Some(credential) }
    }

    pub fn populate(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub fn clear(&mut self) {
        self.credential = None;
    }

    pub fn is_active(&self) -> bool {
        self.credential.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.credential.as_ref().map(|c| &c.user)
    }
}

/// Keeps the session between CLI runs.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an absent session, not an error.
    pub async fn load(&self) -> Result<Session, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Session::with_credential(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Session::absent()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes an active session, removes the file for an absent one.
    pub async fn save(&self, session: &Session) -> Result<(), ClientError> {
        match &session.credential {
            Some(credential) => {
                tokio::fs::write(&self.path, serde_json::to_vec_pretty(credential)?).await?;
            }
            None => match tokio::fs::remove_file(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}
