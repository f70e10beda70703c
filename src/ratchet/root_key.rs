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

use super::chain_key::ChainKey;
use crate::cipher::key::keyed_hash;

const ROOT_LABEL: &[u8] = b"root";
const CHAIN_A_LABEL: &[u8] = b"chain_a";
const CHAIN_B_LABEL: &[u8] = b"chain_b";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(super) struct RootKey {
    key: Box<[u8; 32]>,
}

impl RootKey {
    pub const fn new(key: Box<[u8; 32]>) -> Self {
        Self { key }
    }

    #[allow(clippy::borrowed_box)]
    pub const fn as_bytes(&self) -> &Box<[u8; 32]> {
        &self.key
    }
}

/// Expand a Diffie-Hellman shared secret into the root key and the two chain
/// keys of a fresh ratchet, in that order.
pub(super) fn expand_shared_secret(shared_secret: &[u8; 32]) -> (RootKey, ChainKey, ChainKey) {
    let root_key = RootKey::new(keyed_hash(shared_secret, ROOT_LABEL));
    let chain_a = ChainKey::new(keyed_hash(shared_secret, CHAIN_A_LABEL), 0);
    let chain_b = ChainKey::new(keyed_hash(shared_secret, CHAIN_B_LABEL), 0);

    (root_key, chain_a, chain_b)
}
