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

use crate::ratchet::MAX_MESSAGE_GAP;

const fn default_max_message_gap() -> u32 {
    MAX_MESSAGE_GAP
}

const fn default_cache_outgoing() -> bool {
    true
}

/// A struct to configure how the session manager treats conversations.
///
/// Missing fields fall back to their defaults when deserialized, so a host
/// may keep an empty `{}` as its configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// How many messages the receiving chain may be advanced over in a single
    /// step. Messages further ahead than this are rejected without deriving
    /// any keys.
    #[serde(default = "default_max_message_gap")]
    pub max_message_gap: u32,
    /// Should the plaintext of sent messages be kept in the outgoing cache.
    #[serde(default = "default_cache_outgoing")]
    pub cache_outgoing: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_message_gap: default_max_message_gap(),
            cache_outgoing: default_cache_outgoing(),
        }
    }
}
