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

pub use base64::DecodeError;
use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::Zeroize;

use crate::{KeyError, PickleError, cipher::Cipher};

/// Decode the input as padded, standard alphabet base64.
pub fn base64_decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(input)
}

/// Encode the input as padded, standard alphabet base64.
pub fn base64_encode(input: impl AsRef<[u8]>) -> String {
    STANDARD.encode(input)
}

/// Decode a hex string into a fixed size array, reporting the key type on a
/// length mismatch.
pub(crate) fn hex_to_array<const N: usize>(
    input: &str,
    key_type: &'static str,
) -> Result<[u8; N], KeyError> {
    let mut decoded = hex::decode(input)?;

    if decoded.len() != N {
        let length = decoded.len();
        decoded.zeroize();

        return Err(KeyError::InvalidKeyLength { key_type, expected_length: N, length });
    }

    let mut out = [0u8; N];
    out.copy_from_slice(&decoded);
    decoded.zeroize();

    Ok(out)
}

pub(crate) fn unpickle<T: for<'b> serde::Deserialize<'b>>(
    ciphertext: &str,
    pickle_key: &[u8; 32],
) -> Result<T, PickleError> {
    let cipher = Cipher::new_pickle(pickle_key);
    let decoded = base64_decode(ciphertext)?;
    let mut plaintext = cipher.decrypt_pickle(&decoded)?;

    let pickle: Result<T, _> = serde_json::from_slice(&plaintext);

    plaintext.zeroize();

    Ok(pickle?)
}

pub(crate) fn pickle<T: serde::Serialize>(thing: &T, pickle_key: &[u8; 32]) -> String {
    #[allow(clippy::expect_used)]
    let mut json = serde_json::to_vec(&thing).expect("Can't serialize a pickled object");
    let cipher = Cipher::new_pickle(pickle_key);

    let ciphertext = cipher.encrypt_pickle(json.as_slice());

    json.zeroize();

    base64_encode(ciphertext)
}
