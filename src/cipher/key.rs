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

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

const PICKLE_HKDF_INFO: &[u8] = b"Pickle";

/// One-shot keyed hash, used as the KDF of the ratchet.
///
/// HMAC accepts keys of any length, which lets the message key derivation
/// feed the chain key with the message index appended.
pub(crate) fn keyed_hash(key: &[u8], message: &[u8]) -> Box<[u8; 32]> {
    #[allow(clippy::expect_used)]
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .expect("We should be able to create a HMAC object from a key of any length");
    mac.update(message);

    let mut output = mac.finalize().into_bytes();

    let mut key = Box::new([0u8; 32]);
    key.copy_from_slice(output.as_slice());

    output.as_mut_slice().zeroize();

    key
}

/// Expand a user supplied pickle key into the key of the pickle cipher.
pub(super) fn expand_pickle_key(pickle_key: &[u8]) -> Box<[u8; 32]> {
    let hkdf: Hkdf<Sha256> = Hkdf::new(Some(&[0]), pickle_key);
    let mut key = Box::new([0u8; 32]);

    #[allow(clippy::expect_used)]
    hkdf.expand(PICKLE_HKDF_INFO, key.as_mut_slice())
        .expect("We should be able to expand a pickle key into 32 bytes");

    key
}
