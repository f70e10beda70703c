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

//! End-to-end encryption for one-to-one chat conversations.
//!
//! chatseal is the session engine of a chat client. It establishes a secret
//! per conversation from the long-lived Curve25519 identity keys of the two
//! participants, derives a fresh message key for every message from a pair of
//! one-way chains, and turns plaintexts into opaque, base64 encoded payloads
//! that can ride over any text based transport.
//!
//! # Ratchet
//!
//! Both participants compute the same shared secret with a Diffie-Hellman
//! exchange. Three independent values are derived from it: a root key and two
//! chain keys. The participant whose public key sorts first sends on the first
//! chain and receives on the second, the other participant does the opposite,
//! so no negotiation message is ever required.
//!
//! Every message key is derived from the current chain key and the message
//! index, after which the chain key is replaced by a one-way successor. The
//! receiving side may skip forward over messages that haven't arrived yet, but
//! never backwards: once a chain key is gone, the message keys it could have
//! produced are gone too.
//!
//! For more information, see the [`ratchet`] module.
//!
//! # Session manager
//!
//! The [`manager::E2eeManager`] ties an [`Account`], the stored ratchet states
//! and the ratchet itself together:
//!
//! ```rust
//! use anyhow::Result;
//! use chatseal::{
//!     Account,
//!     manager::E2eeManager,
//!     store::{MemoryIdentityStore, MemoryOutgoingCache, MemorySessionStore},
//! };
//!
//! fn main() -> Result<()> {
//!     let alice = E2eeManager::new(
//!         MemoryIdentityStore::with_account(Account::new()),
//!         MemorySessionStore::default(),
//!         MemoryOutgoingCache::default(),
//!     );
//!     let bob = E2eeManager::new(
//!         MemoryIdentityStore::with_account(Account::new()),
//!         MemorySessionStore::default(),
//!         MemoryOutgoingCache::default(),
//!     );
//!
//!     let bob_key = bob.identity_keys()?.curve25519;
//!     let payload = alice.encrypt_message("chat", "It's a secret to everybody", bob_key)?;
//!     let plaintext = bob.decrypt_message("chat", &payload)?;
//!
//!     assert_eq!(plaintext.as_deref(), Some("It's a secret to everybody"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Device transfer
//!
//! The long-lived Ed25519 key of an account is only used to move an account
//! to a new device. The old device displays a token containing a server issued
//! challenge, the new device signs the challenge with the old key and
//! registers freshly generated keys of its own. See the [`transfer`] module.
//!
//! # Pickling
//!
//! Accounts and ratchet states can be serialized into a "pickle", a JSON
//! document encrypted with a key expanded from a user supplied pickle key:
//!
//! ```rust
//! use anyhow::Result;
//! use chatseal::{Account, AccountPickle};
//!
//! const PICKLE_KEY: [u8; 32] = [0u8; 32];
//!
//! fn main() -> Result<()> {
//!     let account = Account::new();
//!
//!     let pickle = account.pickle().encrypt(&PICKLE_KEY);
//!     let restored = Account::try_from(AccountPickle::from_encrypted(&pickle, &PICKLE_KEY)?)?;
//!
//!     assert_eq!(account.identity_keys(), restored.identity_keys());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature flags
//!
//! ## Strict signatures
//!
//! Feature: `strict-signatures` (default: off)
//!
//! Verifies transfer signatures with the stricter checks of
//! [`ed25519_dalek::VerifyingKey::verify_strict`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod cipher;
mod session_config;
mod types;
mod utilities;

pub mod account;
pub mod manager;
pub mod messages;
pub mod ratchet;
pub mod scope;
pub mod store;
pub mod transfer;

pub use account::{Account, AccountPickle, IdentityKeys};
pub use base64::DecodeError as Base64DecodeError;
pub use session_config::SessionConfig;
pub use types::{
    Curve25519PublicKey, Curve25519SecretKey, Ed25519Keypair, Ed25519PublicKey, Ed25519Signature,
    KeyError, SignatureError,
};
pub use utilities::{base64_decode, base64_encode};

/// Error type describing the various ways pickles can fail to be decoded.
#[derive(Debug, thiserror::Error)]
pub enum PickleError {
    /// The pickle wasn't valid base64.
    #[error("The pickle wasn't valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The encrypted pickle could not have been decrypted.
    #[error("The pickle couldn't be decrypted: {0}")]
    Decryption(#[from] cipher::DecryptionError),
    /// The serialized object couldn't be deserialized.
    #[error("The pickle couldn't be deserialized: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The pickle contained a key that couldn't be decoded.
    #[error("The pickle contained an invalid key: {0}")]
    Key(#[from] KeyError),
}

/// Error type describing the different ways payload decoding can fail.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload was empty or consisted only of whitespace.
    #[error("The payload was empty")]
    Empty,
    /// The payload wasn't valid base64.
    #[error("The payload wasn't valid base64: {0}")]
    Base64(#[from] Base64DecodeError),
    /// The decoded payload wasn't a valid JSON record.
    #[error("The payload couldn't be deserialized: {0}")]
    Json(#[from] serde_json::Error),
    /// The ciphertext or nonce field wasn't valid hex.
    #[error("The payload contained invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// The embedded sender key couldn't be decoded.
    #[error("The payload contained an invalid public key: {0}")]
    InvalidKey(#[from] KeyError),
    /// The nonce doesn't have the width the cipher expects.
    #[error("The payload contained a nonce with an invalid size, expected {0}, got {1}")]
    InvalidNonceLength(usize, usize),
}

/// The version of chatseal that is being used.
pub static VERSION: &str = env!("CARGO_PKG_VERSION");
