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

use super::TransferError;
use crate::{Curve25519PublicKey, Ed25519PublicKey, Ed25519Signature};

/// A challenge issued by the server for a device transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferChallenge {
    /// Random bytes, hex encoded.
    pub challenge: String,
    /// Expiry time in milliseconds since the unix epoch.
    pub expires_at: u64,
}

impl TransferChallenge {
    /// Has the challenge expired at the given time, in milliseconds since the
    /// unix epoch.
    pub const fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// The request the new device submits to take over an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// The account being transferred.
    pub user_id: String,
    /// The challenge, exactly as it was found in the token.
    pub challenge: String,
    /// The hex encoded signature of the hex decoded challenge, made with the
    /// signing key of the old device.
    pub signature: String,
    /// The identity key of the new device.
    pub new_public_key: Curve25519PublicKey,
    /// The verify key of the new device.
    pub new_verify_key: Ed25519PublicKey,
    /// A free form description of the new device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
}

impl TransferRequest {
    /// Check the request against the challenge that was issued for the
    /// account and the verify key the account has on file.
    ///
    /// This is the check the server performs before it rotates the keys of
    /// the account.
    pub fn verify(
        &self,
        issued: &TransferChallenge,
        verify_key: &Ed25519PublicKey,
        now: u64,
    ) -> Result<(), TransferError> {
        if issued.is_expired(now) {
            return Err(TransferError::ChallengeExpired);
        }

        if self.challenge != issued.challenge {
            return Err(TransferError::ChallengeMismatch);
        }

        let challenge = hex::decode(&self.challenge)?;
        let signature =
            Ed25519Signature::from_hex(&self.signature).map_err(TransferError::MalformedSignature)?;

        Ok(verify_key.verify(&challenge, &signature)?)
    }
}

/// The tokens the server hands out for an authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse").field("user_id", &self.user_id).finish_non_exhaustive()
    }
}
