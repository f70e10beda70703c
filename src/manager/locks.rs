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

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;

/// Mutual exclusion for the read-derive-persist sequence of a conversation.
///
/// Every ratchet operation holds the shared guard and the lock of its
/// conversation. Erasing all sessions holds the exclusive guard, so it never
/// interleaves with an operation on any conversation.
#[derive(Default)]
pub(super) struct ConversationLocks {
    all: RwLock<()>,
    conversations: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationLocks {
    pub fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.all.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.all.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the lock of a conversation, creating it on first use.
    ///
    /// Locks are never removed, a removed lock could be recreated while its
    /// previous instance is still held.
    pub fn conversation(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.conversations.get(conversation_id) {
            return Arc::clone(&lock);
        }

        Arc::clone(&self.conversations.entry(conversation_id.to_owned()).or_default())
    }
}
