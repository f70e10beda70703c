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

use serde::{Deserialize, Serialize};

use crate::{
    Curve25519PublicKey, DecodeError,
    cipher::NONCE_LENGTH,
    utilities::{base64_decode, base64_encode},
};

/// A single encrypted message, as it is carried by the transport.
///
/// On the wire this is a JSON record with the fields `ciphertext` and `nonce`
/// (both hex), `messageIndex` and `senderPublicKey` (hex), encoded as padded
/// base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_LENGTH],
    message_index: u32,
    sender_key: Curve25519PublicKey,
}

impl EncryptedPayload {
    pub(crate) const fn new(
        ciphertext: Vec<u8>,
        nonce: [u8; NONCE_LENGTH],
        message_index: u32,
        sender_key: Curve25519PublicKey,
    ) -> Self {
        Self { ciphertext, nonce, message_index, sender_key }
    }

    /// The ciphertext, with the authentication tag appended.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The nonce the ciphertext was sealed with.
    pub const fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    /// The position of the message in the sender's sending chain.
    pub const fn message_index(&self) -> u32 {
        self.message_index
    }

    /// The identity key of the sender.
    pub const fn sender_key(&self) -> Curve25519PublicKey {
        self.sender_key
    }

    /// Decode a payload from its JSON representation.
    pub fn from_json(json: &[u8]) -> Result<Self, DecodeError> {
        Self::try_from(json.to_vec())
    }

    /// Encode the payload as compact JSON.
    pub fn to_json(&self) -> String {
        let json = JsonPayload {
            ciphertext: hex::encode(&self.ciphertext),
            nonce: hex::encode(self.nonce),
            message_index: self.message_index,
            sender_public_key: self.sender_key.to_hex(),
        };

        #[allow(clippy::expect_used)]
        serde_json::to_string(&json).expect("A record of strings and integers always serializes")
    }

    /// Decode a payload from the string handed over by the transport.
    pub fn from_base64(payload: &str) -> Result<Self, DecodeError> {
        Self::try_from(payload)
    }

    /// Encode the payload into the string handed over to the transport.
    pub fn to_base64(&self) -> String {
        base64_encode(self.to_json())
    }
}

impl TryFrom<&str> for EncryptedPayload {
    type Error = DecodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(DecodeError::Empty);
        }

        let decoded = base64_decode(value.trim())?;

        Self::try_from(decoded)
    }
}

impl TryFrom<Vec<u8>> for EncryptedPayload {
    type Error = DecodeError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(DecodeError::Empty);
        }

        let json: JsonPayload = serde_json::from_slice(&value)?;

        let ciphertext = hex::decode(&json.ciphertext)?;
        let nonce_bytes = hex::decode(&json.nonce)?;
        let nonce: [u8; NONCE_LENGTH] = nonce_bytes
            .as_slice()
            .try_into()
            .map_err(|_| DecodeError::InvalidNonceLength(NONCE_LENGTH, nonce_bytes.len()))?;
        let sender_key = Curve25519PublicKey::from_hex(&json.sender_public_key)?;

        Ok(Self { ciphertext, nonce, message_index: json.message_index, sender_key })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonPayload {
    ciphertext: String,
    nonce: String,
    message_index: u32,
    sender_public_key: String,
}
