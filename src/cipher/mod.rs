// Copyright 2025 The chatseal developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub(crate) mod key;

use chacha20poly1305::{Key, KeyInit, XChaCha20Poly1305, XNonce, aead::Aead};
use rand::{RngCore, thread_rng};
use thiserror::Error;

/// Length of the nonce carried next to every ciphertext.
pub const NONCE_LENGTH: usize = 24;
/// Length of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_LENGTH: usize = 16;

/// Error type describing the ways a ciphertext can fail to be opened.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// The authentication tag didn't verify, the ciphertext was tampered with
    /// or was sealed under a different key.
    #[error("The ciphertext couldn't be authenticated with the given key")]
    Authentication,
    /// The ciphertext can't contain a nonce and a tag.
    #[error("The ciphertext was too short, expected at least {0} bytes, got {1}")]
    TooShort(usize, usize),
}

/// An AEAD cipher bound to a single 32-byte key.
///
/// Every call to [`Cipher::encrypt`] picks a fresh random 24-byte nonce, so
/// a key may safely seal more than one plaintext.
pub(crate) struct Cipher {
    aead: XChaCha20Poly1305,
}

impl Cipher {
    /// Creates a new [`Cipher`] from a raw 32-byte message key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self { aead: XChaCha20Poly1305::new(Key::from_slice(key)) }
    }

    /// Creates a new [`Cipher`] for pickles, the key is first expanded using
    /// HKDF with "Pickle" as the info.
    pub fn new_pickle(pickle_key: &[u8]) -> Self {
        let key = key::expand_pickle_key(pickle_key);

        Self::new(&key)
    }

    fn random_nonce() -> [u8; NONCE_LENGTH] {
        let mut nonce = [0u8; NONCE_LENGTH];
        thread_rng().fill_bytes(&mut nonce);

        nonce
    }

    /// Seals the plaintext, returning the ciphertext with the tag appended
    /// and the nonce that was used.
    pub fn encrypt(&self, plaintext: &[u8]) -> (Vec<u8>, [u8; NONCE_LENGTH]) {
        let nonce = Self::random_nonce();

        // Encryption only fails for plaintexts larger than 256 GiB.
        #[allow(clippy::expect_used)]
        let ciphertext = self
            .aead
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .expect("A chat message should always fit into a single AEAD message");

        (ciphertext, nonce)
    }

    /// Opens a ciphertext that was produced by [`Cipher::encrypt`].
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_LENGTH],
    ) -> Result<Vec<u8>, DecryptionError> {
        if ciphertext.len() < TAG_LENGTH {
            return Err(DecryptionError::TooShort(TAG_LENGTH, ciphertext.len()));
        }

        self.aead
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| DecryptionError::Authentication)
    }

    /// Seals the plaintext and prepends the nonce to the ciphertext.
    ///
    /// This is the format used for encrypted pickles.
    pub fn encrypt_pickle(&self, plaintext: &[u8]) -> Vec<u8> {
        let (ciphertext, nonce) = self.encrypt(plaintext);

        [nonce.as_slice(), ciphertext.as_slice()].concat()
    }

    /// Opens a pickle produced by [`Cipher::encrypt_pickle`].
    pub fn decrypt_pickle(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        if ciphertext.len() < NONCE_LENGTH + TAG_LENGTH {
            Err(DecryptionError::TooShort(NONCE_LENGTH + TAG_LENGTH, ciphertext.len()))
        } else {
            let (nonce, ciphertext) = ciphertext.split_at(NONCE_LENGTH);
            let mut n = [0u8; NONCE_LENGTH];
            n.copy_from_slice(nonce);

            self.decrypt(ciphertext, &n)
        }
    }
}
