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

use std::fmt::{Debug, Display};

pub use ed25519_dalek::SignatureError;
use ed25519_dalek::{
    KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH, Signature, Signer,
    SigningKey, Verifier, VerifyingKey,
};
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::KeyError;
use crate::utilities::hex_to_array;

/// An Ed25519 key pair, used to prove continuity of an account across
/// devices.
#[derive(Clone)]
pub struct Ed25519Keypair {
    secret_key: SigningKey,
    public_key: Ed25519PublicKey,
}

impl Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Keypair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl Ed25519Keypair {
    /// Generate a new, random, key pair.
    pub fn new() -> Self {
        let mut rng = thread_rng();
        let secret_key = SigningKey::generate(&mut rng);

        Self::from_signing_key(secret_key)
    }

    fn from_signing_key(secret_key: SigningKey) -> Self {
        let public_key = Ed25519PublicKey(secret_key.verifying_key());

        Self { secret_key, public_key }
    }

    /// Decode the signing key material from its hex form.
    ///
    /// Both the bare 32-byte seed and the 64-byte `seed || public key` form,
    /// which is what libsodium calls a secret key, are accepted. The latter is
    /// checked for consistency between its two halves.
    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let mut decoded = hex::decode(input)?;

        let result = match decoded.len() {
            SECRET_KEY_LENGTH => {
                let mut seed = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(&decoded);
                let key = SigningKey::from_bytes(&seed);
                seed.zeroize();

                Ok(Self::from_signing_key(key))
            }
            KEYPAIR_LENGTH => {
                let mut bytes = [0u8; KEYPAIR_LENGTH];
                bytes.copy_from_slice(&decoded);
                let key = SigningKey::from_keypair_bytes(&bytes);
                bytes.zeroize();

                Ok(Self::from_signing_key(key?))
            }
            length => Err(KeyError::InvalidKeyLength {
                key_type: "ed25519 signing",
                expected_length: KEYPAIR_LENGTH,
                length,
            }),
        };

        decoded.zeroize();

        result
    }

    /// Encode the signing key material as hex, in the 64-byte
    /// `seed || public key` form.
    pub fn to_hex(&self) -> String {
        let mut bytes = self.secret_key.to_keypair_bytes();
        let encoded = hex::encode(bytes);
        bytes.zeroize();

        encoded
    }

    /// The public key, also called the verify key, of this key pair.
    pub const fn public_key(&self) -> Ed25519PublicKey {
        self.public_key
    }

    /// Sign the given message.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.secret_key.sign(message))
    }
}

impl Default for Ed25519Keypair {
    fn default() -> Self {
        Self::new()
    }
}

/// An Ed25519 public key, used to verify signatures.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ed25519PublicKey(VerifyingKey);

impl Ed25519PublicKey {
    /// The number of bytes an Ed25519 public key has.
    pub const LENGTH: usize = PUBLIC_KEY_LENGTH;

    /// Try to create a `Ed25519PublicKey` from a slice of bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let key: [u8; Self::LENGTH] = bytes.try_into().map_err(|_| KeyError::InvalidKeyLength {
            key_type: "ed25519",
            expected_length: Self::LENGTH,
            length: bytes.len(),
        })?;

        Ok(Self(VerifyingKey::from_bytes(&key)?))
    }

    /// Instantiate an Ed25519 public key from its hex representation.
    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let key: [u8; Self::LENGTH] = hex_to_array(input, "ed25519")?;

        Ok(Self(VerifyingKey::from_bytes(&key)?))
    }

    /// View this public key as a byte array.
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        self.0.as_bytes()
    }

    /// Serialize an Ed25519 public key to its lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Verify that the provided signature for a given message has been signed
    /// by the private key matching this public one.
    ///
    /// By default this performs an [RFC8032] compatible signature check. A
    /// stricter version of the signature check can be enabled with the
    /// `strict-signatures` feature flag.
    ///
    /// [RFC8032]: https://datatracker.ietf.org/doc/html/rfc8032#section-5.1.7
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Ed25519Signature,
    ) -> Result<(), SignatureError> {
        if cfg!(feature = "strict-signatures") {
            self.0.verify_strict(message, &signature.0)
        } else {
            self.0.verify(message, &signature.0)
        }
    }
}

impl From<Ed25519PublicKey> for String {
    fn from(key: Ed25519PublicKey) -> Self {
        key.to_hex()
    }
}

impl TryFrom<String> for Ed25519PublicKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ed25519:{}", self.to_hex())
    }
}

/// An Ed25519 digital signature.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Ed25519Signature(pub(crate) Signature);

impl Ed25519Signature {
    /// The number of bytes a signature has.
    pub const LENGTH: usize = SIGNATURE_LENGTH;

    /// Try to create a signature from a slice of bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        Ok(Self(Signature::from_slice(bytes)?))
    }

    /// Decode a signature from its hex form.
    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let bytes: [u8; Self::LENGTH] = hex_to_array(input, "ed25519 signature")?;

        Ok(Self(Signature::from_bytes(&bytes)))
    }

    /// Encode the signature as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Convert the signature to a byte array.
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        self.0.to_bytes()
    }
}
