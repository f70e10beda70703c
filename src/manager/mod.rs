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

//! The session manager, the only component that mutates stored ratchet
//! states.
//!
//! [`E2eeManager::encrypt_message`] and [`E2eeManager::decrypt_message`] load
//! the state of a conversation, derive the message key, persist the successor
//! state and only then hand out the result. Operations on the same
//! conversation are serialized, operations on different conversations run in
//! parallel.
//!
//! Decryption never fails because of the content of a payload: malformed,
//! foreign or tampered payloads produce `Ok(None)` and a log entry. Only
//! missing identity keys and storage failures are reported as errors.

mod locks;

use std::{string::FromUtf8Error, sync::PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use self::locks::ConversationLocks;
use crate::{
    Account, Curve25519PublicKey, DecodeError, IdentityKeys, KeyError, SessionConfig, cipher,
    messages::{DecryptedMessage, EncryptedPayload, MessageDto},
    ratchet::RatchetError,
    store::{IdentityStore, OutgoingCache, SessionStore, StoreError},
};

/// Error type for the operations of the manager that can only fail because
/// of a missing account or failing storage.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No account was created on this device yet.
    #[error("No identity keys were found on this device")]
    MissingIdentity,
    /// The account or session storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error type describing the ways encrypting a message can fail.
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// No account was created on this device yet.
    #[error("No identity keys were found on this device")]
    MissingIdentity,
    /// The account or session storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No secure shared secret can be established with the given key.
    #[error("The identity key of the other participant can't be used: {0}")]
    InvalidPeerKey(#[from] KeyError),
}

/// Error type describing the ways decrypting a message can fail.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// No account was created on this device yet.
    #[error("No identity keys were found on this device")]
    MissingIdentity,
    /// The account or session storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The payload couldn't be decoded.
    #[error("The payload couldn't be decoded: {0}")]
    Decode(#[from] DecodeError),
    /// The payload was sent by this device, its key is in our sending chain.
    #[error("The payload was encrypted by this device")]
    OwnMessage,
    /// No secure shared secret can be established with the sender key.
    #[error("The sender key of the payload can't be used: {0}")]
    InvalidSenderKey(#[from] KeyError),
    /// The ratchet couldn't produce a key for the payload.
    #[error(transparent)]
    Ratchet(#[from] RatchetError),
    /// The ciphertext couldn't be authenticated.
    #[error("The payload couldn't be decrypted: {0}")]
    Cipher(#[from] cipher::DecryptionError),
    /// The plaintext isn't valid UTF-8.
    #[error("The plaintext isn't valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

impl From<SessionError> for EncryptionError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingIdentity => Self::MissingIdentity,
            SessionError::Store(e) => Self::Store(e),
        }
    }
}

impl From<SessionError> for DecryptionError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingIdentity => Self::MissingIdentity,
            SessionError::Store(e) => Self::Store(e),
        }
    }
}

/// The end-to-end encryption manager of a device.
pub struct E2eeManager<I, S, C> {
    identity_store: I,
    session_store: S,
    outgoing_cache: C,
    config: SessionConfig,
    locks: ConversationLocks,
}

impl<I, S, C> E2eeManager<I, S, C>
where
    I: IdentityStore,
    S: SessionStore,
    C: OutgoingCache,
{
    /// Create a manager with the default [`SessionConfig`].
    pub fn new(identity_store: I, session_store: S, outgoing_cache: C) -> Self {
        Self::with_config(identity_store, session_store, outgoing_cache, SessionConfig::default())
    }

    /// Create a manager with the given [`SessionConfig`].
    pub fn with_config(
        identity_store: I,
        session_store: S,
        outgoing_cache: C,
        config: SessionConfig,
    ) -> Self {
        Self {
            identity_store,
            session_store,
            outgoing_cache,
            config,
            locks: ConversationLocks::default(),
        }
    }

    /// The configuration of this manager.
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The store holding the account of this device.
    pub const fn identity_store(&self) -> &I {
        &self.identity_store
    }

    fn account(&self) -> Result<Account, SessionError> {
        self.identity_store.load_account()?.ok_or(SessionError::MissingIdentity)
    }

    /// The public identity keys of this device.
    pub fn identity_keys(&self) -> Result<IdentityKeys, SessionError> {
        Ok(self.account()?.identity_keys())
    }

    /// Encrypt a message for the owner of the given identity key.
    ///
    /// A session is created if the conversation has none yet, or if the stored
    /// one was established with a different identity key. The advanced state
    /// is persisted before the payload is returned, a failed or cancelled send
    /// therefore burns a message key but never reuses one.
    pub fn encrypt_message(
        &self,
        conversation_id: &str,
        plaintext: &str,
        their_public_key: Curve25519PublicKey,
    ) -> Result<String, EncryptionError> {
        let (message_index, payload) = {
            let _all = self.locks.shared();
            let lock = self.locks.conversation(conversation_id);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

            // Read under the lock, see `replace_account`.
            let account = self.account()?;

            let state = match self.session_store.load_state(conversation_id)? {
                Some(state) if state.their_public_key() == their_public_key => state,
                Some(state) => {
                    info!(
                        conversation_id,
                        old_key = %state.their_public_key(),
                        new_key = %their_public_key,
                        "The identity key of the other participant changed, creating a new session"
                    );

                    account.create_ratchet(their_public_key)?
                }
                None => {
                    debug!(conversation_id, "Creating a new session to encrypt a message");

                    account.create_ratchet(their_public_key)?
                }
            };

            let (message_key, next) = state.encryption_key();
            let message_index = message_key.index();

            self.session_store.save_state(conversation_id, &next)?;

            (message_index, message_key.encrypt(plaintext.as_bytes(), account.curve25519_key()))
        };

        if self.config.cache_outgoing {
            if let Err(e) =
                self.outgoing_cache.save_outgoing(conversation_id, message_index, plaintext)
            {
                warn!(
                    conversation_id,
                    message_index,
                    error = %e,
                    "Couldn't remember the plaintext of a sent message"
                );
            }
        }

        Ok(payload.to_base64())
    }

    /// Decrypt a payload, reporting why no plaintext could be recovered.
    ///
    /// The stored session is replaced by a new one, established with the
    /// sender key of the payload, if the payload was encrypted with a
    /// different key, or if its index lies behind the receiving chain. The
    /// latter happens when the other participant started over, for example
    /// after moving their account to a new device.
    ///
    /// The successor state is only persisted once the payload was
    /// authenticated, a forged payload leaves the stored state untouched.
    pub fn try_decrypt_message(
        &self,
        conversation_id: &str,
        payload: &str,
    ) -> Result<String, DecryptionError> {
        let payload = EncryptedPayload::from_base64(payload)?;
        let message_index = payload.message_index();
        let sender_key = payload.sender_key();

        let _all = self.locks.shared();
        let lock = self.locks.conversation(conversation_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let account = self.account()?;

        if sender_key == account.curve25519_key() {
            return Err(DecryptionError::OwnMessage);
        }

        let state = match self.session_store.load_state(conversation_id)? {
            Some(state) if state.their_public_key() != sender_key => {
                info!(
                    conversation_id,
                    old_key = %state.their_public_key(),
                    new_key = %sender_key,
                    "The message was sent with a new identity key, creating a new session"
                );

                account.create_ratchet(sender_key)?
            }
            Some(state) if state.receive_index() > message_index => {
                info!(
                    conversation_id,
                    message_index,
                    receive_index = state.receive_index(),
                    "The message index is behind the receiving chain, creating a new session"
                );

                account.create_ratchet(sender_key)?
            }
            Some(state) => state,
            None => {
                debug!(conversation_id, "Creating a new session to decrypt a message");

                account.create_ratchet(sender_key)?
            }
        };

        let (message_key, next) =
            state.decryption_key_with_max_gap(message_index, self.config.max_message_gap)?;
        let plaintext = message_key.decrypt(&payload)?;

        self.session_store.save_state(conversation_id, &next)?;

        Ok(String::from_utf8(plaintext)?)
    }

    /// Decrypt a payload.
    ///
    /// Returns `Ok(None)` if the payload can't be decrypted for any reason
    /// related to its content, the reason is logged. Payloads sent by this
    /// device also produce `Ok(None)`, their plaintext can be found using
    /// [`E2eeManager::outgoing_plaintext`].
    pub fn decrypt_message(
        &self,
        conversation_id: &str,
        payload: &str,
    ) -> Result<Option<String>, SessionError> {
        match self.try_decrypt_message(conversation_id, payload) {
            Ok(plaintext) => Ok(Some(plaintext)),
            Err(DecryptionError::MissingIdentity) => Err(SessionError::MissingIdentity),
            Err(DecryptionError::Store(e)) => Err(SessionError::Store(e)),
            Err(DecryptionError::OwnMessage) => {
                debug!(conversation_id, "Skipping the decryption of our own message");

                Ok(None)
            }
            Err(e) => {
                warn!(conversation_id, error = %e, "Couldn't decrypt a message");

                Ok(None)
            }
        }
    }

    /// The plaintext of a message this device sent, if it was cached.
    pub fn outgoing_plaintext(&self, conversation_id: &str, message_index: u32) -> Option<String> {
        match self.outgoing_cache.load_outgoing(conversation_id, message_index) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(
                    conversation_id,
                    message_index,
                    error = %e,
                    "Couldn't look up the plaintext of a sent message"
                );

                None
            }
        }
    }

    /// Turn a stored message into a displayable one.
    ///
    /// Messages written by `my_user_id` are looked up in the outgoing cache,
    /// everything else is decrypted. Deleted messages carry no text.
    pub fn open_message(&self, message: &MessageDto, my_user_id: &str) -> DecryptedMessage {
        let text = if message.deleted_for_all {
            None
        } else if message.sender_id == my_user_id {
            EncryptedPayload::from_base64(&message.encrypted_content)
                .ok()
                .and_then(|p| self.outgoing_plaintext(&message.chat_id, p.message_index()))
        } else {
            match self.decrypt_message(&message.chat_id, &message.encrypted_content) {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        conversation_id = %message.chat_id,
                        error = %e,
                        "Couldn't open a message"
                    );

                    None
                }
            }
        };

        DecryptedMessage {
            id: message.id.clone(),
            chat_id: message.chat_id.clone(),
            sender_id: message.sender_id.clone(),
            text,
            created_at: message.created_at,
            deleted_for_all: message.deleted_for_all,
            statuses: message.statuses.clone(),
        }
    }

    /// Erase the session of a conversation, the next message in either
    /// direction establishes a new one.
    pub fn reset_session(&self, conversation_id: &str) -> Result<(), SessionError> {
        let _all = self.locks.shared();
        let lock = self.locks.conversation(conversation_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.session_store.clear_state(conversation_id)?;
        info!(conversation_id, "Erased the session of a conversation");

        Ok(())
    }

    /// Erase the sessions of every conversation.
    pub fn reset_all_sessions(&self) -> Result<(), SessionError> {
        let _all = self.locks.exclusive();

        self.session_store.clear_all()?;
        info!("Erased every session");

        Ok(())
    }

    /// Store a new account and erase every session that was established with
    /// the previous one.
    pub(crate) fn replace_account(&self, account: &Account) -> Result<(), SessionError> {
        let _all = self.locks.exclusive();

        self.identity_store.save_account(account)?;
        self.session_store.clear_all()?;
        info!(identity_key = %account.curve25519_key(), "Replaced the account of this device");

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{Mutex, PoisonError, mpsc},
        thread,
        time::Duration,
    };

    use anyhow::Result;
    use assert_matches2::assert_matches;

    use super::{DecryptionError, E2eeManager, EncryptionError, SessionError};
    use crate::{
        Account, SessionConfig,
        messages::{EncryptedPayload, MessageDto},
        ratchet::RatchetError,
        store::{
            IdentityStore, MemoryIdentityStore, MemoryOutgoingCache, MemorySessionStore,
            SessionStore, StoreError,
        },
    };

    type Manager = E2eeManager<MemoryIdentityStore, MemorySessionStore, MemoryOutgoingCache>;

    fn manager() -> Manager {
        E2eeManager::new(
            MemoryIdentityStore::with_account(Account::new()),
            MemorySessionStore::default(),
            MemoryOutgoingCache::default(),
        )
    }

    fn key(manager: &Manager) -> crate::Curve25519PublicKey {
        manager.identity_keys().expect("The manager has an account").curve25519
    }

    #[test]
    fn round_trip() -> Result<()> {
        let alice = manager();
        let bob = manager();

        for text in ["Hello", "", "Привет 👋"] {
            let payload = alice.encrypt_message("chat", text, key(&bob))?;
            assert_eq!(bob.decrypt_message("chat", &payload)?.as_deref(), Some(text));
        }

        let reply = bob.encrypt_message("chat", "Hi there", key(&alice))?;
        assert_eq!(alice.decrypt_message("chat", &reply)?.as_deref(), Some("Hi there"));

        Ok(())
    }

    #[test]
    fn missing_identity_is_an_error() {
        let manager = E2eeManager::new(
            MemoryIdentityStore::default(),
            MemorySessionStore::default(),
            MemoryOutgoingCache::default(),
        );

        assert_matches!(
            manager.encrypt_message("chat", "Hello", Account::new().curve25519_key()),
            Err(EncryptionError::MissingIdentity)
        );

        let payload = self::manager()
            .encrypt_message("chat", "Hello", Account::new().curve25519_key())
            .expect("The other manager has an account");
        assert_matches!(
            manager.decrypt_message("chat", &payload),
            Err(SessionError::MissingIdentity)
        );
    }

    #[test]
    fn malformed_payloads_produce_no_plaintext() -> Result<()> {
        let bob = manager();

        assert_eq!(bob.decrypt_message("chat", "")?, None);
        assert_eq!(bob.decrypt_message("chat", "garbage")?, None);
        assert_matches!(bob.try_decrypt_message("chat", "   "), Err(DecryptionError::Decode(_)));
        assert!(bob.session_store.is_empty());

        Ok(())
    }

    #[test]
    fn tampered_payload_leaves_the_state_untouched() -> Result<()> {
        let alice = manager();
        let bob = manager();

        let first = alice.encrypt_message("chat", "first", key(&bob))?;
        bob.decrypt_message("chat", &first)?;

        let second = alice.encrypt_message("chat", "second", key(&bob))?;
        let decoded = EncryptedPayload::from_base64(&second)?;
        let mut json: serde_json::Value = serde_json::from_str(&decoded.to_json())?;
        json["ciphertext"] = serde_json::Value::String("00".repeat(32));
        let forged = crate::base64_encode(json.to_string());

        assert_matches!(
            bob.try_decrypt_message("chat", &forged),
            Err(DecryptionError::Cipher(_))
        );
        assert_eq!(bob.session_store.load_state("chat")?.map(|s| s.receive_index()), Some(1));
        assert_eq!(bob.decrypt_message("chat", &second)?.as_deref(), Some("second"));

        Ok(())
    }

    #[test]
    fn own_messages_are_not_decrypted() -> Result<()> {
        let alice = manager();
        let bob = manager();

        let payload = alice.encrypt_message("chat", "Hello", key(&bob))?;
        let state = alice.session_store.load_state("chat")?.expect("Encrypting stores a state");

        assert_matches!(
            alice.try_decrypt_message("chat", &payload),
            Err(DecryptionError::OwnMessage)
        );
        assert_eq!(alice.decrypt_message("chat", &payload)?, None);

        let after = alice.session_store.load_state("chat")?.expect("The state is still stored");
        assert_eq!(after.send_index(), state.send_index());
        assert_eq!(after.receive_index(), state.receive_index());

        Ok(())
    }

    #[test]
    fn outgoing_plaintexts_are_cached() -> Result<()> {
        let alice = manager();
        let bob = manager();

        alice.encrypt_message("chat", "first", key(&bob))?;
        alice.encrypt_message("chat", "second", key(&bob))?;

        assert_eq!(alice.outgoing_plaintext("chat", 1).as_deref(), Some("second"));
        assert_eq!(alice.outgoing_plaintext("chat", 2), None);

        let silent = E2eeManager::with_config(
            MemoryIdentityStore::with_account(Account::new()),
            MemorySessionStore::default(),
            MemoryOutgoingCache::default(),
            SessionConfig { cache_outgoing: false, ..Default::default() },
        );
        silent.encrypt_message("chat", "first", key(&bob))?;
        assert_eq!(silent.outgoing_plaintext("chat", 0), None);

        Ok(())
    }

    #[test]
    fn peer_key_change_on_encrypt_starts_over() -> Result<()> {
        let alice = manager();
        let bob = manager();
        let carol = manager();

        alice.encrypt_message("chat", "to bob", key(&bob))?;
        alice.encrypt_message("chat", "to bob", key(&bob))?;

        let payload = alice.encrypt_message("chat", "to carol", key(&carol))?;
        assert_eq!(EncryptedPayload::from_base64(&payload)?.message_index(), 0);
        assert_eq!(carol.decrypt_message("chat", &payload)?.as_deref(), Some("to carol"));

        Ok(())
    }

    #[test]
    fn huge_gaps_are_rejected() -> Result<()> {
        let alice = manager();
        let bob = E2eeManager::with_config(
            MemoryIdentityStore::with_account(Account::new()),
            MemorySessionStore::default(),
            MemoryOutgoingCache::default(),
            SessionConfig { max_message_gap: 2, ..Default::default() },
        );

        let mut last = String::new();
        for _ in 0..4 {
            last = alice.encrypt_message("chat", "Hello", key(&bob))?;
        }

        assert_matches!(
            bob.try_decrypt_message("chat", &last),
            Err(DecryptionError::Ratchet(RatchetError::TooBigMessageGap(3, 2)))
        );

        Ok(())
    }

    #[test]
    fn opening_messages() -> Result<()> {
        let alice = manager();
        let bob = manager();

        let payload = alice.encrypt_message("chat", "Hello", key(&bob))?;
        let message = MessageDto {
            id: "1".to_owned(),
            chat_id: "chat".to_owned(),
            sender_id: "alice".to_owned(),
            encrypted_content: payload,
            created_at: 1,
            deleted_for_all: false,
            statuses: Vec::new(),
        };

        assert_eq!(alice.open_message(&message, "alice").text.as_deref(), Some("Hello"));
        assert_eq!(bob.open_message(&message, "bob").text.as_deref(), Some("Hello"));

        let deleted = MessageDto { deleted_for_all: true, ..message.clone() };
        let opened = bob.open_message(&deleted, "bob");
        assert!(opened.is_deleted());
        assert_eq!(opened.text, None);

        let garbage = MessageDto { encrypted_content: "garbage".to_owned(), ..message };
        assert!(bob.open_message(&garbage, "bob").is_undecryptable());

        Ok(())
    }

    #[test]
    fn resetting_sessions() -> Result<()> {
        let alice = manager();
        let bob = manager();

        alice.encrypt_message("first", "Hello", key(&bob))?;
        alice.encrypt_message("second", "Hello", key(&bob))?;

        alice.reset_session("first")?;
        assert!(alice.session_store.load_state("first")?.is_none());
        assert!(alice.session_store.load_state("second")?.is_some());

        alice.reset_all_sessions()?;
        assert!(alice.session_store.is_empty());

        Ok(())
    }

    #[test]
    fn replacing_the_account_erases_sessions() -> Result<()> {
        let alice = manager();
        let bob = manager();

        alice.encrypt_message("chat", "Hello", key(&bob))?;

        let account = Account::new();
        alice.replace_account(&account)?;

        assert!(alice.session_store.is_empty());
        assert_eq!(
            alice.identity_store.load_account()?.map(|a| a.identity_keys()),
            Some(account.identity_keys())
        );

        Ok(())
    }

    /// Hands control to another thread while the first account load is in
    /// progress, and waits a moment for it to finish its work.
    struct PausingIdentityStore {
        inner: MemoryIdentityStore,
        pause: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl PausingIdentityStore {
        fn new(account: Account) -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
            let (loading_sender, loading) = mpsc::channel();
            let (resume, resume_receiver) = mpsc::channel();

            let store = Self {
                inner: MemoryIdentityStore::with_account(account),
                pause: Mutex::new(Some((loading_sender, resume_receiver))),
            };

            (store, loading, resume)
        }
    }

    impl IdentityStore for PausingIdentityStore {
        fn load_account(&self) -> Result<Option<Account>, StoreError> {
            let account = self.inner.load_account()?;
            let pause = self.pause.lock().unwrap_or_else(PoisonError::into_inner).take();

            if let Some((loading, resume)) = pause {
                let _ = loading.send(());
                // Times out if the other thread is waiting for our locks.
                let _ = resume.recv_timeout(Duration::from_millis(200));
            }

            Ok(account)
        }

        fn save_account(&self, account: &Account) -> Result<(), StoreError> {
            self.inner.save_account(account)
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear()
        }
    }

    type PausingManager =
        E2eeManager<PausingIdentityStore, MemorySessionStore, MemoryOutgoingCache>;

    fn pausing_manager(account: Account) -> (PausingManager, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (store, loading, resume) = PausingIdentityStore::new(account);
        let manager =
            E2eeManager::new(store, MemorySessionStore::default(), MemoryOutgoingCache::default());

        (manager, loading, resume)
    }

    /// Run the operation while another thread replaces the account as soon
    /// as the operation starts loading it.
    fn replace_account_during<T>(
        manager: &PausingManager,
        loading: mpsc::Receiver<()>,
        resume: mpsc::Sender<()>,
        operation: impl FnOnce() -> T,
    ) -> T {
        let new_account = Account::new();
        let new_account = &new_account;

        thread::scope(|s| {
            s.spawn(move || {
                if loading.recv().is_ok() {
                    manager.replace_account(new_account).expect("The account can be replaced");
                    let _ = resume.send(());
                }
            });

            operation()
        })
    }

    #[test]
    fn account_replacement_waits_for_a_running_encryption() -> Result<()> {
        let (alice, loading, resume) = pausing_manager(Account::new());
        let bob = manager();

        let payload = replace_account_during(&alice, loading, resume, || {
            alice.encrypt_message("chat", "During the transfer", key(&bob))
        })?;

        assert!(alice.session_store.is_empty());
        assert_eq!(bob.decrypt_message("chat", &payload)?.as_deref(), Some("During the transfer"));

        for text in ["After the transfer", "Later on"] {
            let payload = alice.encrypt_message("chat", text, key(&bob))?;
            assert_eq!(bob.decrypt_message("chat", &payload)?.as_deref(), Some(text));
        }

        Ok(())
    }

    #[test]
    fn account_replacement_waits_for_a_running_decryption() -> Result<()> {
        let alice = manager();
        let bob_account = Account::new();
        let bob_key = bob_account.curve25519_key();
        let (bob, loading, resume) = pausing_manager(bob_account);

        let payload = alice.encrypt_message("chat", "During the transfer", bob_key)?;

        let plaintext = replace_account_during(&bob, loading, resume, || {
            bob.decrypt_message("chat", &payload)
        })?;

        assert_eq!(plaintext.as_deref(), Some("During the transfer"));
        assert!(bob.session_store.is_empty());

        Ok(())
    }
}
