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

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::message_key::MessageKey;
use crate::cipher::key::keyed_hash;

const MESSAGE_KEY_LABEL: &[u8] = b"message";
const ADVANCEMENT_LABEL: &[u8] = b"next_chain";

fn expand_chain_key(key: &[u8; 32], index: u32) -> Box<[u8; 32]> {
    let mut input = [0u8; 36];
    input[..32].copy_from_slice(key);
    input[32..].copy_from_slice(&index.to_be_bytes());

    let message_key = keyed_hash(&input, MESSAGE_KEY_LABEL);
    input.zeroize();

    message_key
}

/// One of the two symmetric chains of a ratchet, together with the index of
/// the next message key it will produce.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(super) struct ChainKey {
    key: Box<[u8; 32]>,
    index: u32,
}

impl ChainKey {
    pub const fn new(key: Box<[u8; 32]>, index: u32) -> Self {
        Self { key, index }
    }

    pub const fn index(&self) -> u32 {
        self.index
    }

    #[allow(clippy::borrowed_box)]
    pub const fn as_bytes(&self) -> &Box<[u8; 32]> {
        &self.key
    }

    /// Replace the chain key with its one-way successor.
    pub fn advance(&mut self) {
        let mut next = keyed_hash(self.key.as_slice(), ADVANCEMENT_LABEL);
        self.key.copy_from_slice(next.as_slice());
        next.zeroize();

        self.index = self.index.saturating_add(1);
    }

    /// Derive the message key for the current index and advance the chain.
    pub fn create_message_key(&mut self) -> MessageKey {
        let message_key = MessageKey::new(expand_chain_key(&self.key, self.index), self.index);
        self.advance();

        message_key
    }
}
