// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt::Debug, marker::PhantomData, sync::Arc};

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use fetchlon_tier::{Cache, Error};

const NONCE_LEN: usize = 12;

/// Symmetric text encryption used by [`CryptoCache`].
///
/// Key management is the caller's concern; a cipher is constructed with its key already
/// available.
pub trait Cipher: Send + Sync + Debug {
    /// Encrypts `plain_text` into a printable cipher text.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    fn encrypt(&self, plain_text: &str) -> Result<String, Error>;

    /// Decrypts text produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns an error if the text was not produced with this cipher's key or is corrupt.
    fn decrypt(&self, cipher_text: &str) -> Result<String, Error>;
}

/// AES-256-GCM cipher with a random nonce per message.
///
/// Cipher text is the hex encoding of the nonce followed by the sealed bytes.
///
/// # Examples
///
/// ```
/// use fetchlon::decorators::{AesGcmCipher, Cipher};
///
/// let cipher = AesGcmCipher::new(&[7; 32]).unwrap();
/// let sealed = cipher.encrypt("secret").unwrap();
/// assert_ne!(sealed, "secret");
/// assert_eq!(cipher.decrypt(&sealed).unwrap(), "secret");
/// ```
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Creates a cipher from a 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not exactly 32 bytes long.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        Aes256Gcm::new_from_slice(key)
            .map(|cipher| Self { cipher })
            .map_err(|error| Error::configuration(format!("AES-256-GCM requires a 32-byte key, got {} bytes: {error}", key.len())))
    }
}

impl Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher").finish_non_exhaustive()
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plain_text: &str) -> Result<String, Error> {
        let mut nonce = [0_u8; NONCE_LEN];
        getrandom::getrandom(&mut nonce).map_err(Error::from_message)?;

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plain_text.as_bytes())
            .map_err(|error| Error::encoding(format!("encryption failed: {error}")))?;

        let mut message = Vec::with_capacity(NONCE_LEN + sealed.len());
        message.extend_from_slice(&nonce);
        message.extend_from_slice(&sealed);
        Ok(hex::encode(message))
    }

    fn decrypt(&self, cipher_text: &str) -> Result<String, Error> {
        let message = hex::decode(cipher_text).map_err(Error::encoding)?;
        if message.len() < NONCE_LEN {
            return Err(Error::encoding("cipher text is shorter than its nonce"));
        }

        let (nonce, sealed) = message.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|error| Error::encoding(format!("decryption failed: {error}")))?;

        String::from_utf8(plain).map_err(Error::encoding)
    }
}

/// Encrypts values of a string-valued cache.
///
/// A stored value that fails to decrypt reads as absent, and a value that fails to encrypt
/// is not written. Both cases are logged.
#[derive(Debug)]
pub struct CryptoCache<K, C> {
    inner: C,
    cipher: Arc<dyn Cipher>,
    _phantom: PhantomData<fn(K)>,
}

impl<K, C> CryptoCache<K, C> {
    /// Wraps `inner`, sealing every value with `cipher`.
    pub fn new(inner: C, cipher: Arc<dyn Cipher>) -> Self {
        Self {
            inner,
            cipher,
            _phantom: PhantomData,
        }
    }
}

impl<K, C> Cache<K, String> for CryptoCache<K, C>
where
    K: Send + Sync,
    C: Cache<K, String>,
{
    async fn get(&self, key: &K) -> Result<Option<String>, Error> {
        let Some(sealed) = self.inner.get(key).await? else {
            return Ok(None);
        };

        match self.cipher.decrypt(&sealed) {
            Ok(plain) => Ok(Some(plain)),
            Err(error) => {
                tracing::warn!(error = %error, "discarding cached value that failed to decrypt");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &K, value: String) -> Result<(), Error> {
        match self.cipher.encrypt(&value) {
            Ok(sealed) => self.inner.set(key, sealed).await,
            Err(error) => {
                tracing::warn!(error = %error, "skipping cache write of a value that failed to encrypt");
                Ok(())
            }
        }
    }

    async fn evict(&self, key: &K) -> Result<(), Error> {
        self.inner.evict(key).await
    }

    async fn evict_all(&self) -> Result<(), Error> {
        self.inner.evict_all().await
    }

    fn len(&self) -> Option<u64> {
        self.inner.len()
    }
}
