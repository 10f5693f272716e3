use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    Mahasantri,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Mentor => "mentor",
            Role::Mahasantri => "mahasantri",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub nama: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    /// Set when the account belongs to a mahasantri.
    #[serde(default)]
    pub mahasantri_id: Option<i64>,
}

/// Bearer token plus the profile it was issued for.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn require_role(&self, required: Role) -> Result<(), SessionError> {
        if self.user.role == required {
            Ok(())
        } else {
            Err(SessionError::Forbidden {
                required: required.label(),
                actual: self.user.role.label(),
            })
        }
    }

    /// Which mahasantri a listing may cover. Mentors see whatever they ask
    /// for; a mahasantri only ever sees their own records.
    pub fn scope_for(&self, requested: Option<i64>) -> Result<Option<i64>, SessionError> {
        match self.user.role {
            Role::Mentor => Ok(requested),
            Role::Mahasantri => {
                let own = self
                    .user
                    .mahasantri_id
                    .ok_or(SessionError::UnlinkedAccount(self.user.id))?;
                match requested {
                    Some(id) if id != own => Err(SessionError::Forbidden {
                        required: Role::Mentor.label(),
                        actual: Role::Mahasantri.label(),
                    }),
                    _ => Ok(Some(own)),
                }
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// The single owner of persisted session state.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let session = serde_json::from_str(&contents).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(session))
    }

    pub fn require(&self) -> Result<Session, SessionError> {
        self.load()?.ok_or(SessionError::Missing)
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let contents = serde_json::to_string_pretty(session).map_err(|source| {
            SessionError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, contents).map_err(|source| self.io_error(source))?;
        restrict_permissions(&self.path).map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), user = session.user.id, "session saved");
        Ok(())
    }

    /// Returns whether a session file was present.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
