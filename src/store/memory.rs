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

use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use zeroize::Zeroizing;

use super::{CacheError, IdentityStore, OutgoingCache, SessionStore, StoreError};
use crate::{
    Account,
    ratchet::{RatchetState, RatchetStatePickle},
};

/// An [`IdentityStore`] keeping the account in memory.
#[derive(Default)]
pub struct MemoryIdentityStore {
    account: Mutex<Option<Account>>,
}

impl MemoryIdentityStore {
    /// Create a store that already holds the given account.
    pub fn with_account(account: Account) -> Self {
        Self { account: Mutex::new(Some(account)) }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load_account(&self) -> Result<Option<Account>, StoreError> {
        Ok(self.account.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        *self.account.lock().unwrap_or_else(PoisonError::into_inner) = Some(account.clone());

        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.account.lock().unwrap_or_else(PoisonError::into_inner).take();

        Ok(())
    }
}

/// A [`SessionStore`] keeping every state as a JSON pickle in memory.
#[derive(Default)]
pub struct MemorySessionStore {
    states: DashMap<String, Zeroizing<String>>,
}

impl MemorySessionStore {
    /// The number of conversations with a stored state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Does the store hold no state at all.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load_state(&self, conversation_id: &str) -> Result<Option<RatchetState>, StoreError> {
        let Some(json) = self.states.get(conversation_id) else {
            return Ok(None);
        };

        let pickle: RatchetStatePickle = serde_json::from_str(json.as_str())?;

        Ok(Some(RatchetState::try_from(pickle)?))
    }

    fn save_state(&self, conversation_id: &str, state: &RatchetState) -> Result<(), StoreError> {
        let json = Zeroizing::new(serde_json::to_string(&state.pickle())?);
        self.states.insert(conversation_id.to_owned(), json);

        Ok(())
    }

    fn clear_state(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.states.remove(conversation_id);

        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        self.states.clear();

        Ok(())
    }
}

/// An [`OutgoingCache`] living in memory.
#[derive(Default)]
pub struct MemoryOutgoingCache {
    plaintexts: DashMap<(String, u32), Zeroizing<String>>,
}

impl OutgoingCache for MemoryOutgoingCache {
    fn save_outgoing(
        &self,
        conversation_id: &str,
        message_index: u32,
        plaintext: &str,
    ) -> Result<(), CacheError> {
        let key = (conversation_id.to_owned(), message_index);
        self.plaintexts.insert(key, Zeroizing::new(plaintext.to_owned()));

        Ok(())
    }

    fn load_outgoing(
        &self,
        conversation_id: &str,
        message_index: u32,
    ) -> Result<Option<String>, CacheError> {
        Ok(self
            .plaintexts
            .get(&(conversation_id.to_owned(), message_index))
            .map(|plaintext| plaintext.as_str().to_owned()))
    }
}

#[cfg(test)]
mod test {
    use anyhow::Result;

    use super::{MemoryIdentityStore, MemoryOutgoingCache, MemorySessionStore};
    use crate::{
        Account,
        store::{IdentityStore, OutgoingCache, SessionStore},
    };

    #[test]
    fn identity_store_cycle() -> Result<()> {
        let store = MemoryIdentityStore::default();
        assert!(store.load_account()?.is_none());

        let account = Account::new();
        store.save_account(&account)?;
        assert_eq!(
            store.load_account()?.map(|a| a.identity_keys()),
            Some(account.identity_keys())
        );

        store.clear()?;
        assert!(store.load_account()?.is_none());

        Ok(())
    }

    #[test]
    fn session_store_cycle() -> Result<()> {
        let alice = Account::new();
        let bob = Account::new();
        let state = alice.create_ratchet(bob.curve25519_key())?;
        let (_, state) = state.encryption_key();

        let store = MemorySessionStore::default();
        store.save_state("first", &state)?;
        store.save_state("second", &state)?;

        let loaded = store.load_state("first")?.expect("The state was stored");
        assert_eq!(loaded.send_index(), 1);
        assert_eq!(loaded.their_public_key(), bob.curve25519_key());

        store.clear_state("first")?;
        assert!(store.load_state("first")?.is_none());
        assert_eq!(store.len(), 1);

        store.clear_all()?;
        assert!(store.is_empty());

        Ok(())
    }

    #[test]
    fn outgoing_cache_is_keyed_by_conversation_and_index() -> Result<()> {
        let cache = MemoryOutgoingCache::default();
        cache.save_outgoing("chat", 0, "first")?;
        cache.save_outgoing("chat", 1, "second")?;

        assert_eq!(cache.load_outgoing("chat", 1)?.as_deref(), Some("second"));
        assert_eq!(cache.load_outgoing("other", 0)?, None);

        Ok(())
    }
}
