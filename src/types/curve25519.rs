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

use rand::thread_rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use super::KeyError;
use crate::utilities::hex_to_array;

/// The private half of a Curve25519 key pair.
#[derive(Clone)]
pub struct Curve25519SecretKey(Box<StaticSecret>);

impl Curve25519SecretKey {
    /// Generate a new, random, Curve25519SecretKey.
    pub fn new() -> Self {
        let rng = thread_rng();

        Self(Box::new(StaticSecret::random_from_rng(rng)))
    }

    /// Create a `Curve25519SecretKey` from the given bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(Box::new(StaticSecret::from(*bytes)))
    }

    /// Decode a secret key from its hex form.
    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let mut bytes: [u8; 32] = hex_to_array(input, "curve25519 secret")?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();

        Ok(key)
    }

    /// Encode the secret key as hex.
    pub fn to_hex(&self) -> String {
        let mut bytes = self.0.to_bytes();
        let encoded = hex::encode(bytes);
        bytes.zeroize();

        encoded
    }

    /// Perform a Diffie-Hellman key exchange and hash the resulting point into
    /// a 32-byte secret.
    ///
    /// Fails if the remote key is a low order point, which would produce a
    /// predictable shared secret.
    pub fn diffie_hellman(
        &self,
        their_public_key: &Curve25519PublicKey,
    ) -> Result<Box<[u8; 32]>, KeyError> {
        let shared_secret = self.0.diffie_hellman(&their_public_key.inner);

        if !shared_secret.was_contributory() {
            return Err(KeyError::NonContributoryKey);
        }

        let mut digest = Sha256::digest(shared_secret.as_bytes());
        let mut secret = Box::new([0u8; 32]);
        secret.copy_from_slice(digest.as_slice());
        digest.as_mut_slice().zeroize();

        Ok(secret)
    }
}

impl Default for Curve25519SecretKey {
    fn default() -> Self {
        Self::new()
    }
}

/// A Curve25519 key pair, the identity key of an account.
#[derive(Clone)]
pub(crate) struct Curve25519Keypair {
    secret_key: Curve25519SecretKey,
    public_key: Curve25519PublicKey,
}

impl Curve25519Keypair {
    pub fn new() -> Self {
        Self::from_secret_key(Curve25519SecretKey::new())
    }

    pub fn from_secret_key(secret_key: Curve25519SecretKey) -> Self {
        let public_key = Curve25519PublicKey::from(&secret_key);

        Self { secret_key, public_key }
    }

    pub const fn secret_key(&self) -> &Curve25519SecretKey {
        &self.secret_key
    }

    pub const fn public_key(&self) -> Curve25519PublicKey {
        self.public_key
    }
}

/// The public half of a Curve25519 key pair.
///
/// On every text surface the key is represented as 64 lowercase hex digits.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Curve25519PublicKey {
    pub(crate) inner: PublicKey,
}

impl Curve25519PublicKey {
    /// The number of bytes a Curve25519 public key has.
    pub const LENGTH: usize = 32;

    /// Convert this public key to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        self.inner.to_bytes()
    }

    /// View this public key as a byte array.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        self.inner.as_bytes()
    }

    /// Try to create a `Curve25519PublicKey` from a slice of bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let key: [u8; Self::LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidKeyLength {
                key_type: "curve25519",
                expected_length: Self::LENGTH,
                length: slice.len(),
            })?;

        Ok(Self::from(key))
    }

    /// Instantiate a Curve25519 public key from its hex representation.
    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let key: [u8; Self::LENGTH] = hex_to_array(input, "curve25519")?;

        Ok(Self::from(key))
    }

    /// Serialize a Curve25519 public key to its lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Is this key ordered before the other one?
    ///
    /// Keys are compared as big-endian byte strings, which matches comparing
    /// their hex encodings.
    pub fn precedes(&self, other: &Curve25519PublicKey) -> bool {
        self.as_bytes() < other.as_bytes()
    }
}

impl From<[u8; Curve25519PublicKey::LENGTH]> for Curve25519PublicKey {
    fn from(bytes: [u8; Curve25519PublicKey::LENGTH]) -> Self {
        Self { inner: PublicKey::from(bytes) }
    }
}

impl<'a> From<&'a Curve25519SecretKey> for Curve25519PublicKey {
    fn from(secret: &'a Curve25519SecretKey) -> Self {
        Self { inner: PublicKey::from(&*secret.0) }
    }
}

impl From<Curve25519PublicKey> for String {
    fn from(key: Curve25519PublicKey) -> Self {
        key.to_hex()
    }
}

impl TryFrom<String> for Curve25519PublicKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl Display for Curve25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for Curve25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "curve25519:{}", self.to_hex())
    }
}
