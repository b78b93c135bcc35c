//! Signing secret
//!
//! The HMAC key is held only as a keyed MAC state. The raw bytes are not
//! kept and nothing here can print them.

use std::fmt;
use std::path::Path;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::config::ConfigError;

type HmacSha256 = Hmac<Sha256>;

/// Minimum secret length in bytes (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

/// Process-wide HMAC-SHA256 signing key.
#[derive(Clone)]
pub struct SecretKey {
    mac: HmacSha256,
    len: usize,
}

impl SecretKey {
    /// Build a key from raw bytes. Fails if shorter than [`MIN_SECRET_LEN`].
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let bytes = bytes.as_ref();
        if bytes.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                len: bytes.len(),
                min: MIN_SECRET_LEN,
            });
        }

        let mac = <HmacSha256 as Mac>::new_from_slice(bytes)
            .map_err(|_| ConfigError::SecretTooShort {
                len: bytes.len(),
                min: MIN_SECRET_LEN,
            })?;

        Ok(Self {
            mac,
            len: bytes.len(),
        })
    }

    /// Read the key from a file, ignoring one trailing line break.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = raw
            .strip_suffix(b"\r\n")
            .or_else(|| raw.strip_suffix(b"\n"))
            .unwrap_or(&raw[..]);
        Self::new(trimmed)
    }

    /// HMAC-SHA256 of `data`.
    pub(crate) fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(data);
        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Random hex secret of `bytes` random bytes (at least [`MIN_SECRET_LEN`]).
pub fn generate_secret_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes.max(MIN_SECRET_LEN)];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
