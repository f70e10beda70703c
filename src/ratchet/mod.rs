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

//! The symmetric ratchet of a conversation.
//!
//! A [`RatchetState`] is created from the Diffie-Hellman shared secret of the
//! two participants' identity keys. Both sides derive the same three values
//! from it, a root key and two chain keys, and pick their sending and
//! receiving chain based on the ordering of their public keys. Every message
//! advances one of the chains by one step:
//!
//! ```rust
//! use anyhow::Result;
//! use chatseal::{Account, ratchet::RatchetState};
//!
//! fn main() -> Result<()> {
//!     let alice = Account::new();
//!     let bob = Account::new();
//!
//!     let alice_state = alice.create_ratchet(bob.curve25519_key())?;
//!     let bob_state = bob.create_ratchet(alice.curve25519_key())?;
//!
//!     let (message_key, alice_state) = alice_state.encryption_key();
//!     let payload = message_key.encrypt(b"Hello", alice.curve25519_key());
//!
//!     let (message_key, bob_state) = bob_state.decryption_key(payload.message_index())?;
//!     assert_eq!(message_key.decrypt(&payload)?, b"Hello");
//!
//!     assert_eq!(alice_state.send_index(), 1);
//!     assert_eq!(bob_state.receive_index(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! Transitions never modify the state they are called on, they return the
//! successor state instead. The caller decides when the successor replaces
//! the stored state.

mod chain_key;
mod message_key;
mod root_key;

pub use message_key::MessageKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use self::{
    chain_key::ChainKey,
    root_key::{RootKey, expand_shared_secret},
};
use crate::{Curve25519PublicKey, KeyError, PickleError, utilities::hex_to_array};

/// The default number of message keys the receiving chain may be advanced
/// over in a single step.
pub const MAX_MESSAGE_GAP: u32 = 2000;

/// Error type describing why no message key could be produced for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RatchetError {
    /// The message key for the given index was already derived and discarded.
    #[error("The message key with index {0} has already been used or skipped")]
    MissingMessageKey(u32),
    /// The message is too far ahead of the receiving chain.
    #[error("The message gap was too big, got {0}, max allowed {1}")]
    TooBigMessageGap(u32, u32),
}

/// The per-conversation state of the ratchet.
#[derive(Clone)]
pub struct RatchetState {
    their_public_key: Curve25519PublicKey,
    root_key: RootKey,
    sending_chain: ChainKey,
    receiving_chain: ChainKey,
}

impl std::fmt::Debug for RatchetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatchetState")
            .field("their_public_key", &self.their_public_key)
            .field("send_index", &self.sending_chain.index())
            .field("receive_index", &self.receiving_chain.index())
            .finish_non_exhaustive()
    }
}

impl RatchetState {
    /// Initialize a new ratchet from a shared secret.
    ///
    /// The side whose public key sorts first is the initiator, it sends on the
    /// first derived chain and receives on the second. The responder uses the
    /// chains the other way around, which makes both sides agree without
    /// exchanging any message.
    pub fn new(
        shared_secret: &[u8; 32],
        my_public_key: Curve25519PublicKey,
        their_public_key: Curve25519PublicKey,
    ) -> Self {
        let (root_key, chain_a, chain_b) = expand_shared_secret(shared_secret);

        let (sending_chain, receiving_chain) = if my_public_key.precedes(&their_public_key) {
            (chain_a, chain_b)
        } else {
            (chain_b, chain_a)
        };

        Self { their_public_key, root_key, sending_chain, receiving_chain }
    }

    /// The identity key of the other participant this state was created for.
    pub const fn their_public_key(&self) -> Curve25519PublicKey {
        self.their_public_key
    }

    /// The number of message keys the sending chain has produced.
    pub const fn send_index(&self) -> u32 {
        self.sending_chain.index()
    }

    /// The index of the next message key the receiving chain will produce.
    pub const fn receive_index(&self) -> u32 {
        self.receiving_chain.index()
    }

    /// Derive the key for the next outgoing message.
    ///
    /// Returns the message key together with the successor state, whose
    /// sending chain has moved one step forward.
    pub fn encryption_key(&self) -> (MessageKey, RatchetState) {
        let mut next = self.clone();
        let message_key = next.sending_chain.create_message_key();

        (message_key, next)
    }

    /// Derive the key for the incoming message with the given index, allowing
    /// a gap of up to [`MAX_MESSAGE_GAP`] messages.
    pub fn decryption_key(
        &self,
        message_index: u32,
    ) -> Result<(MessageKey, RatchetState), RatchetError> {
        self.decryption_key_with_max_gap(message_index, MAX_MESSAGE_GAP)
    }

    /// Derive the key for the incoming message with the given index.
    ///
    /// The receiving chain is walked forward to the given index, the
    /// intermediate chain keys are discarded. Indices below the current
    /// receive index can't be serviced anymore.
    pub fn decryption_key_with_max_gap(
        &self,
        message_index: u32,
        max_message_gap: u32,
    ) -> Result<(MessageKey, RatchetState), RatchetError> {
        let receive_index = self.receive_index();

        if message_index < receive_index {
            return Err(RatchetError::MissingMessageKey(message_index));
        }

        let gap = message_index - receive_index;

        if gap > max_message_gap {
            return Err(RatchetError::TooBigMessageGap(gap, max_message_gap));
        }

        let mut next = self.clone();

        for _ in 0..gap {
            next.receiving_chain.advance();
        }

        let message_key = next.receiving_chain.create_message_key();

        Ok((message_key, next))
    }

    /// Convert the state into a struct which implements [`serde::Serialize`]
    /// and [`serde::Deserialize`].
    pub fn pickle(&self) -> RatchetStatePickle {
        RatchetStatePickle {
            their_public_key: self.their_public_key,
            root_key: hex::encode(self.root_key.as_bytes().as_slice()),
            send_chain_key: hex::encode(self.sending_chain.as_bytes().as_slice()),
            receive_chain_key: hex::encode(self.receiving_chain.as_bytes().as_slice()),
            send_index: self.send_index(),
            receive_index: self.receive_index(),
        }
    }
}

/// A format suitable for serialization which implements
/// [`serde::Serialize`] and [`serde::Deserialize`]. Obtainable by calling
/// [`RatchetState::pickle`].
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct RatchetStatePickle {
    #[zeroize(skip)]
    their_public_key: Curve25519PublicKey,
    root_key: String,
    send_chain_key: String,
    receive_chain_key: String,
    #[serde(default)]
    send_index: u32,
    #[serde(default)]
    receive_index: u32,
}

impl RatchetStatePickle {
    /// Serialize and encrypt the pickle using the given key.
    ///
    /// This is the inverse of [`RatchetStatePickle::from_encrypted`].
    pub fn encrypt(self, pickle_key: &[u8; 32]) -> String {
        crate::utilities::pickle(&self, pickle_key)
    }

    /// Obtain a pickle from a ciphertext by decrypting and deserializing using
    /// the given key.
    ///
    /// This is the inverse of [`RatchetStatePickle::encrypt`].
    pub fn from_encrypted(ciphertext: &str, pickle_key: &[u8; 32]) -> Result<Self, PickleError> {
        crate::utilities::unpickle(ciphertext, pickle_key)
    }
}

impl TryFrom<RatchetStatePickle> for RatchetState {
    type Error = KeyError;

    fn try_from(pickle: RatchetStatePickle) -> Result<Self, Self::Error> {
        let root_key: [u8; 32] = hex_to_array(&pickle.root_key, "root")?;
        let send_chain_key: [u8; 32] = hex_to_array(&pickle.send_chain_key, "chain")?;
        let receive_chain_key: [u8; 32] = hex_to_array(&pickle.receive_chain_key, "chain")?;

        Ok(Self {
            their_public_key: pickle.their_public_key,
            root_key: RootKey::new(Box::new(root_key)),
            sending_chain: ChainKey::new(Box::new(send_chain_key), pickle.send_index),
            receiving_chain: ChainKey::new(Box::new(receive_chain_key), pickle.receive_index),
        })
    }
}
