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

//! Moving an account to a new device.
//!
//! The old device asks the server for a short lived challenge and displays a
//! [`TransferToken`] containing the account id, the challenge and its own
//! signing key material. The new device generates a brand new [`Account`],
//! signs the challenge with the old signing key and asks the server to
//! replace the registered keys of the account with the new ones.
//!
//! The new account is only stored once the server accepted the request. At
//! that point every session of the new device is erased, the other
//! participants establish new sessions with the new identity key.
//!
//! ```rust
//! use anyhow::Result;
//! use chatseal::{
//!     Account,
//!     manager::E2eeManager,
//!     store::{MemoryIdentityStore, MemoryOutgoingCache, MemorySessionStore},
//!     transfer::{
//!         AuthResponse, TransferChallenge, TransferError, TransferRequest, TransferServer,
//!         complete_transfer, offer_transfer,
//!     },
//! };
//!
//! struct Server {
//!     verify_key: chatseal::Ed25519PublicKey,
//! }
//!
//! impl TransferServer for Server {
//!     type Error = TransferError;
//!
//!     fn request_challenge(&self) -> Result<TransferChallenge, Self::Error> {
//!         Ok(TransferChallenge { challenge: "00112233".to_owned(), expires_at: u64::MAX })
//!     }
//!
//!     fn submit_transfer(&self, request: &TransferRequest) -> Result<AuthResponse, Self::Error> {
//!         let issued = self.request_challenge()?;
//!         request.verify(&issued, &self.verify_key, 0)?;
//!
//!         Ok(AuthResponse {
//!             access_token: "access".to_owned(),
//!             refresh_token: "refresh".to_owned(),
//!             user_id: request.user_id.clone(),
//!         })
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let old_account = Account::new();
//!     let server = Server { verify_key: old_account.ed25519_key() };
//!
//!     let old_device = MemoryIdentityStore::with_account(old_account);
//!     let offer = offer_transfer(&server, &old_device, "user")?;
//!
//!     let new_device = E2eeManager::new(
//!         MemoryIdentityStore::default(),
//!         MemorySessionStore::default(),
//!         MemoryOutgoingCache::default(),
//!     );
//!     let token = offer.token.to_string().parse()?;
//!     let session = complete_transfer::<_, _, _, _, ()>(&token, &server, &new_device, None)?;
//!
//!     assert_eq!(session.user_id(), "user");
//!
//!     Ok(())
//! }
//! ```

mod messages;
mod token;

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{info, warn};

pub use self::{
    messages::{AuthResponse, TransferChallenge, TransferRequest},
    token::TransferToken,
};
use crate::{
    Account, Ed25519Keypair, KeyError, SignatureError,
    manager::{E2eeManager, SessionError},
    scope::{AuthSession, Channel},
    store::{IdentityStore, OutgoingCache, SessionStore, StoreError},
};

/// Error type describing the ways a device transfer can fail.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The token didn't consist of three non-empty, colon separated fields.
    #[error("The transfer token is malformed, expected userId:challenge:signKey")]
    MalformedToken,
    /// The challenge wasn't valid hex.
    #[error("The challenge isn't valid hex: {0}")]
    InvalidChallenge(#[from] hex::FromHexError),
    /// The signing key material in the token couldn't be decoded.
    #[error("The signing key of the token is invalid: {0}")]
    InvalidSigningKey(#[source] KeyError),
    /// The signature of a request couldn't be decoded.
    #[error("The signature of the request is malformed: {0}")]
    MalformedSignature(#[source] KeyError),
    /// The challenge is no longer valid.
    #[error("The transfer challenge has expired")]
    ChallengeExpired,
    /// The request answers a different challenge than the one issued.
    #[error("The request doesn't answer the issued challenge")]
    ChallengeMismatch,
    /// The challenge wasn't signed by the key on file.
    #[error("The challenge signature is invalid: {0}")]
    InvalidSignature(#[from] SignatureError),
    /// The old device has no account to transfer.
    #[error("No identity keys were found on this device")]
    MissingIdentity,
    /// The account storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The server refused the request or couldn't be reached.
    #[error("The server rejected the transfer: {0}")]
    Server(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<SessionError> for TransferError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingIdentity => Self::MissingIdentity,
            SessionError::Store(e) => Self::Store(e),
        }
    }
}

/// The part of the server API a device transfer needs.
pub trait TransferServer {
    /// The error the server calls fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a new challenge for the logged in account.
    fn request_challenge(&self) -> Result<TransferChallenge, Self::Error>;

    /// Verify the request and, if valid, replace the registered keys of the
    /// account.
    fn submit_transfer(&self, request: &TransferRequest) -> Result<AuthResponse, Self::Error>;
}

/// What the old device displays to the new one.
#[derive(Debug, Clone)]
pub struct TransferOffer {
    /// The token to display.
    pub token: TransferToken,
    /// Expiry time of the embedded challenge, in milliseconds since the unix
    /// epoch.
    pub expires_at: u64,
}

/// The current time in milliseconds since the unix epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Prepare a transfer on the old device.
pub fn offer_transfer<T, I>(
    server: &T,
    identity_store: &I,
    user_id: &str,
) -> Result<TransferOffer, TransferError>
where
    T: TransferServer,
    I: IdentityStore,
{
    let account = identity_store.load_account()?.ok_or(TransferError::MissingIdentity)?;
    let issued = server.request_challenge().map_err(|e| TransferError::Server(Box::new(e)))?;

    info!(user_id, expires_at = issued.expires_at, "Offering a device transfer");

    Ok(TransferOffer {
        token: TransferToken {
            user_id: user_id.to_owned(),
            challenge: issued.challenge.clone(),
            sign_key: account.signing_key_hex(),
        },
        expires_at: issued.expires_at,
    })
}

/// Take over an account on the new device.
///
/// Nothing is stored unless the server accepts the request. On success the
/// new account replaces the stored one and every session is erased.
pub fn complete_transfer<T, I, S, C, H>(
    token: &TransferToken,
    server: &T,
    manager: &E2eeManager<I, S, C>,
    device_info: Option<String>,
) -> Result<AuthSession<H>, TransferError>
where
    T: TransferServer,
    I: IdentityStore,
    S: SessionStore,
    C: OutgoingCache,
    H: Channel,
{
    let old_signing_key =
        Ed25519Keypair::from_hex(&token.sign_key).map_err(TransferError::InvalidSigningKey)?;
    let challenge = hex::decode(&token.challenge)?;

    let account = Account::new();
    let signature = old_signing_key.sign(&challenge);

    let request = TransferRequest {
        user_id: token.user_id.clone(),
        challenge: token.challenge.clone(),
        signature: signature.to_hex(),
        new_public_key: account.curve25519_key(),
        new_verify_key: account.ed25519_key(),
        device_info,
    };

    let response = server.submit_transfer(&request).map_err(|e| {
        warn!(user_id = %token.user_id, error = %e, "The server rejected the device transfer");
        TransferError::Server(Box::new(e))
    })?;

    manager.replace_account(&account)?;

    info!(user_id = %response.user_id, "Completed the device transfer");

    Ok(AuthSession::new(response))
}
