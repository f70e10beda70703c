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

mod curve25519;
mod ed25519;

pub(crate) use curve25519::Curve25519Keypair;
pub use curve25519::{Curve25519PublicKey, Curve25519SecretKey};
pub use ed25519::{Ed25519Keypair, Ed25519PublicKey, Ed25519Signature, SignatureError};
use thiserror::Error;

/// Error type for failures that may occur when decoding or using a
/// cryptographic key.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The key wasn't valid hex.
    #[error("Failed to decode a key from hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The hex encoded key does not contain the expected number of bytes.
    #[error(
        "Failed to decode {key_type} key from hex: \
        Invalid number of bytes for {key_type}, expected {expected_length}, got {length}."
    )]
    InvalidKeyLength {
        /// The type of key being decoded.
        key_type: &'static str,
        /// The expected length of the key.
        expected_length: usize,
        /// The actual length of the key.
        length: usize,
    },

    /// The bytes didn't describe a valid Ed25519 key or signature.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// One or more keys lacked contributory behavior in the Diffie-Hellman
    /// operation, resulting in an insecure shared secret.
    ///
    /// For more details on contributory behavior please refer to the
    /// [`x25519_dalek::SharedSecret::was_contributory()`] method.
    #[error(
        "One or more keys lacked contributory behavior in the Diffie-Hellman operation, \
         resulting in an insecure shared secret"
    )]
    NonContributoryKey,
}
