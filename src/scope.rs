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

//! The authenticated session of a logged in device.
//!
//! An [`AuthSession`] is created by [`login()`] or by a completed device
//! transfer and lives until the user logs out. It owns the tokens the server
//! handed out and a [`ChannelRegistry`] of the per conversation channels the
//! host opened while the session was alive. Destroying the session closes
//! every one of them.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::{
    Curve25519PublicKey, Ed25519PublicKey,
    store::{IdentityStore, StoreError},
    transfer::AuthResponse,
};

/// A live connection the host keeps open for a conversation, a websocket or
/// an event stream.
pub trait Channel: Send + Sync {
    /// Close the channel, no further events are delivered after this.
    fn close(&mut self);
}

/// A channel with nothing to close.
impl Channel for () {
    fn close(&mut self) {}
}

/// Open channels, keyed by conversation id.
pub struct ChannelRegistry<C> {
    channels: DashMap<String, C>,
}

impl<C: Channel> ChannelRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { channels: DashMap::new() }
    }

    /// Register the channel of a conversation.
    ///
    /// A channel previously registered for the same conversation is closed.
    pub fn open(&self, conversation_id: &str, channel: C) {
        if let Some(mut previous) = self.channels.insert(conversation_id.to_owned(), channel) {
            previous.close();
            debug!(conversation_id, "Replaced an open channel");
        }
    }

    /// Get a handle to the channel of a conversation.
    pub fn get(&self, conversation_id: &str) -> Option<C>
    where
        C: Clone,
    {
        self.channels.get(conversation_id).map(|c| c.value().clone())
    }

    /// Is a channel open for the given conversation.
    pub fn contains(&self, conversation_id: &str) -> bool {
        self.channels.contains_key(conversation_id)
    }

    /// Close and forget the channel of a conversation, returns false if none
    /// was open.
    pub fn close(&self, conversation_id: &str) -> bool {
        match self.channels.remove(conversation_id) {
            Some((_, mut channel)) => {
                channel.close();
                true
            }
            None => false,
        }
    }

    /// Close every open channel.
    pub fn close_all(&self) {
        let ids: Vec<String> = self.channels.iter().map(|c| c.key().clone()).collect();

        for id in ids {
            self.close(&id);
        }
    }

    /// The number of open channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Are there no open channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl<C: Channel> Default for ChannelRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// The state of a logged in device.
pub struct AuthSession<C: Channel> {
    user_id: String,
    access_token: Zeroizing<String>,
    refresh_token: Zeroizing<String>,
    channels: Arc<ChannelRegistry<C>>,
}

impl<C: Channel> AuthSession<C> {
    /// Create a session from the tokens the server handed out.
    pub fn new(response: AuthResponse) -> Self {
        let AuthResponse { access_token, refresh_token, user_id } = response;

        Self {
            user_id,
            access_token: Zeroizing::new(access_token),
            refresh_token: Zeroizing::new(refresh_token),
            channels: Arc::new(ChannelRegistry::new()),
        }
    }

    /// The account this session belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The token authenticating requests to the server.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The token used to obtain a new access token.
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Replace the tokens after a refresh.
    pub fn update_tokens(&mut self, access_token: String, refresh_token: String) {
        self.access_token = Zeroizing::new(access_token);
        self.refresh_token = Zeroizing::new(refresh_token);
    }

    /// The channels opened during this session.
    pub fn channels(&self) -> &Arc<ChannelRegistry<C>> {
        &self.channels
    }

    /// Log out, closing every channel of the session.
    pub fn destroy(self) {
        self.channels.close_all();
        info!(user_id = %self.user_id, "Destroyed the session");
    }
}

impl<C: Channel> std::fmt::Debug for AuthSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .field("channels", &self.channels.len())
            .finish_non_exhaustive()
    }
}

/// The keys a device logs in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginKeys {
    /// The identity key of the device.
    pub public_key: Curve25519PublicKey,
    /// The verify key of the device.
    pub verify_key: Ed25519PublicKey,
}

/// The part of the server API a login needs.
pub trait LoginServer {
    /// The error the server calls fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Authenticate and register the given keys for the device.
    fn login(&self, keys: &LoginKeys) -> Result<AuthResponse, Self::Error>;
}

/// Error type describing the ways a login can fail.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The account storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The server refused the login or couldn't be reached.
    #[error("The server rejected the login: {0}")]
    Server(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The result of a successful login.
#[derive(Debug)]
pub struct Login<C: Channel> {
    /// The new session.
    pub session: AuthSession<C>,
    /// True if the device had no account and a new one was created. Peers
    /// will have to establish new sessions with this device.
    pub new_device: bool,
}

/// Log in, reusing the account stored on the device or creating one.
///
/// A newly created account is only stored once the server accepted the
/// login.
pub fn login<T, I, C>(server: &T, identity_store: &I) -> Result<Login<C>, LoginError>
where
    T: LoginServer,
    I: IdentityStore,
    C: Channel,
{
    let stored = identity_store.load_account()?;
    let new_device = stored.is_none();
    let account = stored.unwrap_or_default();

    let keys =
        LoginKeys { public_key: account.curve25519_key(), verify_key: account.ed25519_key() };
    let response = server.login(&keys).map_err(|e| LoginError::Server(Box::new(e)))?;

    if new_device {
        identity_store.save_account(&account)?;
    }

    info!(user_id = %response.user_id, new_device, "Logged in");

    Ok(Login { session: AuthSession::new(response), new_device })
}
