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

//! The long-lived key material of a device.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    Curve25519PublicKey, Ed25519Keypair, Ed25519PublicKey, Ed25519Signature, KeyError,
    PickleError,
    ratchet::RatchetState,
    types::{Curve25519Keypair, Curve25519SecretKey},
    utilities::{pickle, unpickle},
};

/// Struct holding the two public identity keys of an [`Account`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityKeys {
    /// The ed25519 key, also called the verify key, used to prove continuity
    /// of the account during a device transfer.
    pub ed25519: Ed25519PublicKey,
    /// The curve25519 key, used to establish shared secrets.
    pub curve25519: Curve25519PublicKey,
}

/// An account holds the identity keys of a device.
#[derive(Clone)]
pub struct Account {
    /// A permanent Ed25519 key used for signing transfer challenges.
    signing_key: Ed25519Keypair,
    /// The permanent Curve25519 key every conversation secret is derived from.
    diffie_hellman_key: Curve25519Keypair,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("identity_keys", &self.identity_keys())
            .finish_non_exhaustive()
    }
}

impl Account {
    /// Create a new Account with new random identity keys.
    pub fn new() -> Self {
        Self { signing_key: Ed25519Keypair::new(), diffie_hellman_key: Curve25519Keypair::new() }
    }

    /// Get the IdentityKeys of this Account
    pub fn identity_keys(&self) -> IdentityKeys {
        IdentityKeys { ed25519: self.ed25519_key(), curve25519: self.curve25519_key() }
    }

    /// Get a copy of the account's public Ed25519 key
    pub const fn ed25519_key(&self) -> Ed25519PublicKey {
        self.signing_key.public_key()
    }

    /// Get a copy of the account's public Curve25519 key
    pub const fn curve25519_key(&self) -> Curve25519PublicKey {
        self.diffie_hellman_key.public_key()
    }

    /// Sign the given message using our Ed25519 fingerprint key.
    pub fn sign(&self, message: impl AsRef<[u8]>) -> Ed25519Signature {
        self.signing_key.sign(message.as_ref())
    }

    /// The signing key material, hex encoded, as it is embedded into a
    /// transfer token.
    pub fn signing_key_hex(&self) -> String {
        self.signing_key.to_hex()
    }

    /// Create a fresh ratchet for a conversation with the owner of the given
    /// identity key.
    pub fn create_ratchet(
        &self,
        their_identity_key: Curve25519PublicKey,
    ) -> Result<RatchetState, KeyError> {
        let shared_secret =
            self.diffie_hellman_key.secret_key().diffie_hellman(&their_identity_key)?;

        Ok(RatchetState::new(&shared_secret, self.curve25519_key(), their_identity_key))
    }

    /// Convert the account into a struct which implements [`serde::Serialize`]
    /// and [`serde::Deserialize`].
    pub fn pickle(&self) -> AccountPickle {
        AccountPickle {
            signing_key: self.signing_key.to_hex(),
            diffie_hellman_key: self.diffie_hellman_key.secret_key().to_hex(),
        }
    }

    /// Restore an [`Account`] from a previously saved [`AccountPickle`].
    pub fn from_pickle(pickle: AccountPickle) -> Result<Self, KeyError> {
        pickle.try_into()
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

/// A format suitable for serialization which implements [`serde::Serialize`]
/// and [`serde::Deserialize`]. Obtainable by calling [`Account::pickle`].
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct AccountPickle {
    signing_key: String,
    diffie_hellman_key: String,
}

impl std::fmt::Debug for AccountPickle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountPickle").finish_non_exhaustive()
    }
}

impl AccountPickle {
    /// Serialize and encrypt the pickle using the given key.
    ///
    /// This is the inverse of [`AccountPickle::from_encrypted`].
    pub fn encrypt(self, pickle_key: &[u8; 32]) -> String {
        pickle(&self, pickle_key)
    }

    /// Obtain a pickle from a ciphertext by decrypting and deserializing using
    /// the given key.
    ///
    /// This is the inverse of [`AccountPickle::encrypt`].
    pub fn from_encrypted(ciphertext: &str, pickle_key: &[u8; 32]) -> Result<Self, PickleError> {
        unpickle(ciphertext, pickle_key)
    }
}

impl TryFrom<AccountPickle> for Account {
    type Error = KeyError;

    fn try_from(pickle: AccountPickle) -> Result<Self, Self::Error> {
        let signing_key = Ed25519Keypair::from_hex(&pickle.signing_key)?;
        let secret_key = Curve25519SecretKey::from_hex(&pickle.diffie_hellman_key)?;

        Ok(Self { signing_key, diffie_hellman_key: Curve25519Keypair::from_secret_key(secret_key) })
    }
}
