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

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    Curve25519PublicKey,
    cipher::{Cipher, DecryptionError},
    messages::EncryptedPayload,
};

/// A single use key, derived from a chain key, that seals exactly one
/// message.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MessageKey {
    key: Box<[u8; 32]>,
    index: u32,
}

impl MessageKey {
    pub(super) const fn new(key: Box<[u8; 32]>, index: u32) -> Self {
        Self { key, index }
    }

    /// The position of this key in its chain.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Get a reference to the raw bytes of the key.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Seal the plaintext, consuming the key.
    ///
    /// The returned payload carries the index of this key and the given sender
    /// key so the receiver can locate the matching key in its receiving chain.
    pub fn encrypt(self, plaintext: &[u8], sender_key: Curve25519PublicKey) -> EncryptedPayload {
        let cipher = Cipher::new(&self.key);
        let (ciphertext, nonce) = cipher.encrypt(plaintext);

        EncryptedPayload::new(ciphertext, nonce, self.index, sender_key)
    }

    /// Open a payload that was sealed with the same key.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>, DecryptionError> {
        Cipher::new(&self.key).decrypt(payload.ciphertext(), payload.nonce())
    }
}

impl std::fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageKey").field("index", &self.index).finish_non_exhaustive()
    }
}
