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

//! Persistence of accounts, ratchet states and sent plaintexts.
//!
//! The session manager only talks to storage through the traits of this
//! module. Hosts usually implement them on top of their own preference or
//! database layer; in-memory and file backed implementations are provided.
//!
//! The [`OutgoingCache`] is deliberately separate from the [`SessionStore`]:
//! it only serves the redisplay of one's own messages and its failures are
//! reported as [`CacheError`], never as [`StoreError`].

mod file;
mod memory;

use std::sync::Arc;

pub use file::{FileIdentityStore, FileSessionStore};
pub use memory::{MemoryIdentityStore, MemoryOutgoingCache, MemorySessionStore};
use thiserror::Error;

use crate::{Account, KeyError, PickleError, ratchet::RatchetState};

/// Error type describing failures of the account and session storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stored pickle couldn't be decrypted or deserialized.
    #[error("The stored pickle couldn't be restored: {0}")]
    Pickle(#[from] PickleError),
    /// A stored record contained an invalid key.
    #[error("The stored record contained an invalid key: {0}")]
    Key(#[from] KeyError),
    /// A stored record couldn't be (de)serialized.
    #[error("The stored record couldn't be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The underlying storage failed.
    #[error("The storage couldn't be accessed: {0}")]
    Io(#[from] std::io::Error),
    /// A host provided storage failed.
    #[error("The storage backend failed: {0}")]
    Backend(String),
}

/// Error type of the outgoing plaintext cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying storage failed.
    #[error("The outgoing cache couldn't be accessed: {0}")]
    Io(#[from] std::io::Error),
    /// A host provided cache failed.
    #[error("The outgoing cache backend failed: {0}")]
    Backend(String),
}

/// Durable storage of the [`Account`] of this device.
pub trait IdentityStore: Send + Sync {
    /// Load the account, `None` if no account was created yet.
    fn load_account(&self) -> Result<Option<Account>, StoreError>;

    /// Store the account, replacing any previously stored one.
    fn save_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Remove the stored account.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Durable storage of one [`RatchetState`] per conversation.
pub trait SessionStore: Send + Sync {
    /// Load the state of the given conversation.
    fn load_state(&self, conversation_id: &str) -> Result<Option<RatchetState>, StoreError>;

    /// Store the state of the given conversation, replacing the previous one.
    fn save_state(&self, conversation_id: &str, state: &RatchetState) -> Result<(), StoreError>;

    /// Erase the state of the given conversation.
    fn clear_state(&self, conversation_id: &str) -> Result<(), StoreError>;

    /// Erase the state of every conversation.
    fn clear_all(&self) -> Result<(), StoreError>;
}

/// Best-effort local copy of the plaintext of sent messages, keyed by
/// conversation and message index.
pub trait OutgoingCache: Send + Sync {
    /// Remember the plaintext of a sent message.
    fn save_outgoing(
        &self,
        conversation_id: &str,
        message_index: u32,
        plaintext: &str,
    ) -> Result<(), CacheError>;

    /// Look up the plaintext of a sent message.
    fn load_outgoing(
        &self,
        conversation_id: &str,
        message_index: u32,
    ) -> Result<Option<String>, CacheError>;
}

impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    fn load_account(&self) -> Result<Option<Account>, StoreError> {
        (**self).load_account()
    }

    fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        (**self).save_account(account)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn load_state(&self, conversation_id: &str) -> Result<Option<RatchetState>, StoreError> {
        (**self).load_state(conversation_id)
    }

    fn save_state(&self, conversation_id: &str, state: &RatchetState) -> Result<(), StoreError> {
        (**self).save_state(conversation_id, state)
    }

    fn clear_state(&self, conversation_id: &str) -> Result<(), StoreError> {
        (**self).clear_state(conversation_id)
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        (**self).clear_all()
    }
}

impl<T: OutgoingCache + ?Sized> OutgoingCache for Arc<T> {
    fn save_outgoing(
        &self,
        conversation_id: &str,
        message_index: u32,
        plaintext: &str,
    ) -> Result<(), CacheError> {
        (**self).save_outgoing(conversation_id, message_index, plaintext)
    }

    fn load_outgoing(
        &self,
        conversation_id: &str,
        message_index: u32,
    ) -> Result<Option<String>, CacheError> {
        (**self).load_outgoing(conversation_id, message_index)
    }
}
