//! At-rest encryption for memory files.
//!
//! Payloads are sealed with AES-256-GCM as `nonce || ciphertext || tag`, one
//! random nonce per seal. The 256-bit key lives in a raw key file created on
//! first use with restricted permissions; the cipher never rotates or
//! rewrites an existing key.

mod error;

pub use error::CryptoError;

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use log::info;
use std::fs;
use std::path::Path;

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// AES-256-GCM cipher bound to a key file.
pub struct Cipher {
    aead: Aes256Gcm,
}

impl Cipher {
    /// Load the key at `key_path`, generating and persisting a fresh one if
    /// the file does not exist.
    ///
    /// Parent directories are created with mode 0700 and the key file with
    /// mode 0600. A key file of any length other than [`KEY_SIZE`] is an
    /// error.
    pub fn open_or_init(key_path: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let key_path = key_path.as_ref();
        let key = load_or_generate_key(key_path)?;
        let aead = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        Ok(Cipher { aead })
    }

    /// Seal `plaintext`, prepending the freshly generated nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a sealed payload, verifying its authentication tag.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_SIZE {
            return Err(CryptoError::Open("payload shorter than nonce".to_string()));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        self.aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Open("authentication failed".to_string()))
    }
}

/// Read an existing key or generate, persist, and return a new one.
fn load_or_generate_key(key_path: &Path) -> Result<[u8; KEY_SIZE], CryptoError> {
    if key_path.exists() {
        let bytes = fs::read(key_path)?;
        let key: [u8; KEY_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeySize {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        return Ok(key);
    }

    if let Some(parent) = key_path.parent() {
        create_key_dir(parent)?;
    }

    let generated = Aes256Gcm::generate_key(&mut OsRng);
    let key: [u8; KEY_SIZE] = generated.into();
    write_key_file(key_path, &key)?;
    info!("generated at-rest key (path={})", key_path.display());
    Ok(key)
}

#[cfg(unix)]
fn create_key_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_key_dir(dir: &Path) -> std::io::Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_key_file(path: &Path, key: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(key)
}

#[cfg(not(unix))]
fn write_key_file(path: &Path, key: &[u8]) -> std::io::Result<()> {
    fs::write(path, key)
}
