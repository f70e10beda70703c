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

use std::{fmt, str::FromStr};

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::TransferError;

const SEPARATOR: char = ':';

/// The token the old device displays, usually as a QR code, and the new
/// device scans.
///
/// Its text form is `userId:challenge:signKey`. The signing key material is
/// the last field and may itself contain the separator, everything after the
/// second separator belongs to it, verbatim. The token isn't trimmed, callers
/// reading it from text input strip surrounding whitespace themselves.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct TransferToken {
    /// The account being transferred.
    pub user_id: String,
    /// The hex encoded challenge issued by the server.
    pub challenge: String,
    /// The signing key material of the old device.
    pub sign_key: String,
}

impl FromStr for TransferToken {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, SEPARATOR);

        let (Some(user_id), Some(challenge), Some(sign_key)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(TransferError::MalformedToken);
        };

        if user_id.is_empty() || challenge.is_empty() || sign_key.is_empty() {
            return Err(TransferError::MalformedToken);
        }

        Ok(Self {
            user_id: user_id.to_owned(),
            challenge: challenge.to_owned(),
            sign_key: sign_key.to_owned(),
        })
    }
}

impl fmt::Display for TransferToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}{SEPARATOR}{}", self.user_id, self.challenge, self.sign_key)
    }
}

impl fmt::Debug for TransferToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferToken")
            .field("user_id", &self.user_id)
            .field("challenge", &self.challenge)
            .finish_non_exhaustive()
    }
}
