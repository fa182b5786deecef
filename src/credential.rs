//! Durable storage for the operator's API key.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Scalar string store for the registry credential.
///
/// An empty value means "no credential": requests go out without a key.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, or an empty string if none was ever set.
    fn get(&self) -> String;

    /// Overwrites the stored credential. An empty string clears it.
    fn set(&self, value: &str) -> io::Result<()>;
}

/// Keeps the credential in a single file so it survives across sessions.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => content.trim_end_matches(['\r', '\n']).to_string(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credential file");
                String::new()
            }
        }
    }

    fn set(&self, value: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_private(&self.path, value)?;
        debug!(path = %self.path.display(), cleared = value.is_empty(), "Credential saved");
        Ok(())
    }
}

/// Writes `value` readable by the owner only.
#[cfg(unix)]
fn write_private(path: &Path, value: &str) -> io::Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a file that already existed.
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(value.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, value: &str) -> io::Result<()> {
    std::fs::write(path, value)
}

/// Process-local store, used by tests and when nothing should touch disk.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: Mutex<String>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(value.into()),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> String {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, value: &str) -> io::Result<()> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value.to_string();
        Ok(())
    }
}

/// Lets an environment-provided key take precedence over the stored one.
///
/// Writes still go to the inner store.
pub struct OverlayCredentialStore<S> {
    inner: S,
    overlay: String,
}

impl<S: CredentialStore> OverlayCredentialStore<S> {
    pub fn new(inner: S, overlay: impl Into<String>) -> Self {
        Self {
            inner,
            overlay: overlay.into(),
        }
    }
}

impl<S: CredentialStore> CredentialStore for OverlayCredentialStore<S> {
    fn get(&self) -> String {
        if self.overlay.is_empty() {
            self.inner.get()
        } else {
            self.overlay.clone()
        }
    }

    fn set(&self, value: &str) -> io::Result<()> {
        self.inner.set(value)
    }
}

/// Masks a credential for display.
///
/// At most a quarter of the characters (never more than four) stay visible,
/// so short keys are not effectively disclosed.
#[must_use]
pub fn mask(credential: &str) -> String {
    let count = credential.chars().count();
    let shown = (count / 4).min(4);
    let visible: String = credential.chars().skip(count - shown).collect();
    format!("{}{visible}", "*".repeat(count - shown))
}
