//! Key management
//!
//! One 256-bit key per installation, stored as raw bytes. It is created on the
//! first run and only ever read afterwards: regenerating it would make every
//! stored value permanently undecryptable.

use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length for XChaCha20-Poly1305 (256-bit)
pub const KEY_LEN: usize = 32;

/// Symmetric key used for every encrypt/decrypt in an installation
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

impl Key {
    /// Generate a fresh key from the OS CSPRNG
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::KeyGeneration(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Build a key from raw bytes, rejecting the wrong length
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Load the key file byte for byte
    pub fn load(path: &Path) -> Result<Self> {
        let mut bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::KeyNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(Error::storage(path, e)),
        };

        let key = Self::from_bytes(&bytes).ok_or_else(|| Error::KeyCorrupt {
            path: path.to_path_buf(),
            expected: KEY_LEN,
            actual: bytes.len(),
        });
        bytes.zeroize();
        key
    }

    /// Write the raw key bytes to a new owner-readable file
    ///
    /// Refuses to overwrite an existing key file.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::storage(parent, e))?;
        }

        let mut file = create_private(path).map_err(|e| Error::storage(path, e))?;
        file.write_all(&self.0)
            .and_then(|()| file.sync_all())
            .map_err(|e| Error::storage(path, e))
    }
}

/// Load the installation key, creating it on first run
///
/// An existing but unreadable or corrupt key file is an error; it is never
/// replaced.
pub fn ensure_key(path: &Path) -> Result<Key> {
    match Key::load(path) {
        Ok(key) => Ok(key),
        Err(Error::KeyNotFound(_)) => {
            tracing::info!(path = %path.display(), "generating new key");
            let key = Key::generate()?;
            key.persist(path)?;
            Ok(key)
        }
        Err(e) => Err(e),
    }
}

/// Create a new file that is owner-readable only from the moment it exists
pub(crate) fn create_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}
