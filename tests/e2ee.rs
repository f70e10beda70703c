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

use std::{collections::BTreeSet, sync::Arc, thread};

use anyhow::Result;
use assert_matches2::{assert_let, assert_matches};
use chatseal::{
    Account,
    manager::{DecryptionError, E2eeManager, EncryptionError, SessionError},
    messages::EncryptedPayload,
    ratchet::RatchetError,
    scope::AuthSession,
    store::{
        FileIdentityStore, FileSessionStore, IdentityStore, MemoryIdentityStore,
        MemoryOutgoingCache, MemorySessionStore, SessionStore,
    },
    transfer::{
        AuthResponse, TransferChallenge, TransferError, TransferRequest, TransferServer,
        TransferToken, complete_transfer, offer_transfer, unix_millis,
    },
};

type Device = E2eeManager<MemoryIdentityStore, Arc<MemorySessionStore>, MemoryOutgoingCache>;

fn device(account: Account) -> (Device, Arc<MemorySessionStore>) {
    let sessions = Arc::new(MemorySessionStore::default());
    let manager = E2eeManager::new(
        MemoryIdentityStore::with_account(account),
        sessions.clone(),
        MemoryOutgoingCache::default(),
    );

    (manager, sessions)
}

#[test]
fn conversation_in_both_directions() -> Result<()> {
    let (alice, _) = device(Account::new());
    let (bob, _) = device(Account::new());

    let alice_key = alice.identity_keys()?.curve25519;
    let bob_key = bob.identity_keys()?.curve25519;

    for round in 0..5 {
        let text = format!("Ping {round}");
        let payload = alice.encrypt_message("chat", &text, bob_key)?;
        assert_eq!(bob.decrypt_message("chat", &payload)?, Some(text));

        let text = format!("Pong {round}");
        let payload = bob.encrypt_message("chat", &text, alice_key)?;
        assert_eq!(alice.decrypt_message("chat", &payload)?, Some(text));
    }

    Ok(())
}

#[test]
fn both_sides_agree_on_their_roles() -> Result<()> {
    let alice = Account::new();
    let bob = Account::new();

    let alice_state = alice.create_ratchet(bob.curve25519_key())?;
    let bob_state = bob.create_ratchet(alice.curve25519_key())?;

    let (alice_key, _) = alice_state.encryption_key();
    let (bob_key, _) = bob_state.decryption_key(0)?;
    assert_eq!(alice_key.as_bytes(), bob_key.as_bytes());

    let (bob_key, _) = bob_state.encryption_key();
    let (alice_key, _) = alice_state.decryption_key(0)?;
    assert_eq!(alice_key.as_bytes(), bob_key.as_bytes());

    let (own_send, _) = alice_state.encryption_key();
    let (own_receive, _) = alice_state.decryption_key(0)?;
    assert_ne!(own_send.as_bytes(), own_receive.as_bytes());

    Ok(())
}

#[test]
fn successive_message_keys_differ() -> Result<()> {
    let state = Account::new().create_ratchet(Account::new().curve25519_key())?;

    let (first, state) = state.encryption_key();
    let (second, state) = state.encryption_key();

    assert_ne!(first.as_bytes(), second.as_bytes());
    assert_eq!((first.index(), second.index()), (0, 1));
    assert_eq!(state.send_index(), 2);

    Ok(())
}

#[test]
fn indices_follow_the_messages() -> Result<()> {
    let alice = Account::new();
    let bob = Account::new();

    let mut sender = alice.create_ratchet(bob.curve25519_key())?;
    for _ in 0..7 {
        sender = sender.encryption_key().1;
    }
    assert_eq!(sender.send_index(), 7);

    let receiver = bob.create_ratchet(alice.curve25519_key())?;
    let (_, receiver) = receiver.decryption_key(4)?;
    assert_eq!(receiver.receive_index(), 5);
    let (_, receiver) = receiver.decryption_key(5)?;
    assert_eq!(receiver.receive_index(), 6);

    Ok(())
}

#[test]
fn skipped_keys_are_gone() -> Result<()> {
    let alice = Account::new();
    let bob = Account::new();

    let mut sender = alice.create_ratchet(bob.curve25519_key())?;
    let mut payloads = Vec::new();
    for i in 0..6 {
        let (key, next) = sender.encryption_key();
        payloads.push(key.encrypt(format!("Message {i}").as_bytes(), alice.curve25519_key()));
        sender = next;
    }

    let receiver = bob.create_ratchet(alice.curve25519_key())?;
    let (key, receiver) = receiver.decryption_key(5)?;
    assert_eq!(key.decrypt(&payloads[5])?, b"Message 5");
    assert_eq!(receiver.receive_index(), 6);

    assert_matches!(receiver.decryption_key(3), Err(RatchetError::MissingMessageKey(3)));

    Ok(())
}

#[test]
fn late_messages_of_the_same_sender_restart_the_session() -> Result<()> {
    let (alice, _) = device(Account::new());
    let (bob, bob_sessions) = device(Account::new());
    let bob_key = bob.identity_keys()?.curve25519;

    let payloads = (0..6)
        .map(|i| alice.encrypt_message("chat", &format!("Message {i}"), bob_key))
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(bob.decrypt_message("chat", &payloads[5])?.as_deref(), Some("Message 5"));
    assert_eq!(bob_sessions.load_state("chat")?.map(|s| s.receive_index()), Some(6));

    // The index lies behind the receiving chain, the session is started over.
    assert_eq!(bob.decrypt_message("chat", &payloads[3])?.as_deref(), Some("Message 3"));
    assert_eq!(bob_sessions.load_state("chat")?.map(|s| s.receive_index()), Some(4));

    Ok(())
}

#[test]
fn transfer_token_keeps_colons_in_the_key() -> Result<()> {
    let token: TransferToken = "userId123:abcd1234:deadbeef:cafef00d".parse()?;

    assert_eq!(token.user_id, "userId123");
    assert_eq!(token.challenge, "abcd1234");
    assert_eq!(token.sign_key, "deadbeef:cafef00d");

    Ok(())
}

#[test]
fn new_sender_key_heals_a_stale_session() -> Result<()> {
    let (alice, _) = device(Account::new());
    let (bob, bob_sessions) = device(Account::new());
    let bob_key = bob.identity_keys()?.curve25519;

    let mut last = String::new();
    for i in 0..10 {
        last = alice.encrypt_message("chat", &format!("Message {i}"), bob_key)?;
    }
    assert!(bob.decrypt_message("chat", &last)?.is_some());
    assert_eq!(bob_sessions.load_state("chat")?.map(|s| s.receive_index()), Some(10));

    let (new_alice, _) = device(Account::new());
    let mut payload = String::new();
    for i in 0..3 {
        payload = new_alice.encrypt_message("chat", &format!("Again {i}"), bob_key)?;
    }
    assert_eq!(EncryptedPayload::from_base64(&payload)?.message_index(), 2);

    assert_eq!(bob.decrypt_message("chat", &payload)?.as_deref(), Some("Again 2"));

    let state = bob_sessions.load_state("chat")?;
    let new_key = new_alice.identity_keys()?.curve25519;
    assert_eq!(state.as_ref().map(|s| s.their_public_key()), Some(new_key));
    assert_eq!(state.map(|s| s.receive_index()), Some(3));

    Ok(())
}

#[test]
fn concurrent_encryptions_never_share_a_message_index() -> Result<()> {
    const THREADS: u32 = 8;
    const MESSAGES: u32 = 25;

    let (alice, alice_sessions) = device(Account::new());
    let (bob, _) = device(Account::new());
    let bob_key = bob.identity_keys()?.curve25519;

    let sent = thread::scope(|s| {
        let alice = &alice;

        let senders: Vec<_> = (0..THREADS)
            .map(|t| {
                s.spawn(move || {
                    (0..MESSAGES)
                        .map(|i| alice.encrypt_message("chat", &format!("{t}/{i}"), bob_key))
                        .collect::<Result<Vec<_>, EncryptionError>>()
                })
            })
            .collect();

        senders
            .into_iter()
            .map(|sender| sender.join().expect("The sending thread shouldn't panic"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut payloads = sent
        .into_iter()
        .flatten()
        .map(|payload| Ok((EncryptedPayload::from_base64(&payload)?.message_index(), payload)))
        .collect::<Result<Vec<_>>>()?;
    payloads.sort_by_key(|(index, _)| *index);

    let indices: BTreeSet<u32> = payloads.iter().map(|(index, _)| *index).collect();
    assert_eq!(indices, (0..THREADS * MESSAGES).collect());
    assert_eq!(
        alice_sessions.load_state("chat")?.map(|s| s.send_index()),
        Some(THREADS * MESSAGES)
    );

    for (_, payload) in &payloads {
        assert!(bob.decrypt_message("chat", payload)?.is_some());
    }

    Ok(())
}

#[test]
fn erasing_all_sessions_interleaves_with_encryptions() -> Result<()> {
    const MESSAGES: u32 = 40;
    const CONVERSATIONS: [&str; 3] = ["first", "second", "third"];

    let (alice, alice_sessions) = device(Account::new());
    let (bob, _) = device(Account::new());
    let bob_key = bob.identity_keys()?.curve25519;

    let (reset, sent) = thread::scope(|s| {
        let alice = &alice;

        let resetter = s.spawn(move || -> Result<(), SessionError> {
            for _ in 0..20 {
                alice.reset_all_sessions()?;
                thread::yield_now();
            }

            Ok(())
        });

        let senders: Vec<_> = CONVERSATIONS
            .into_iter()
            .map(|id| {
                s.spawn(move || {
                    let payloads = (0..MESSAGES)
                        .map(|i| alice.encrypt_message(id, &format!("{id} {i}"), bob_key))
                        .collect::<Result<Vec<_>, EncryptionError>>()?;

                    Ok::<_, EncryptionError>((id, payloads))
                })
            })
            .collect();

        let reset = resetter.join().expect("The resetting thread shouldn't panic");
        let sent = senders
            .into_iter()
            .map(|sender| sender.join().expect("The sending thread shouldn't panic"))
            .collect::<Result<Vec<_>, _>>();

        (reset, sent)
    });
    reset?;

    for (id, payloads) in sent? {
        let mut previous: Option<u32> = None;

        for (i, payload) in payloads.iter().enumerate() {
            let index = EncryptedPayload::from_base64(payload)?.message_index();

            // Every message either continues the chain or starts a new one.
            assert!(
                index == 0 || previous.is_some_and(|p| index == p + 1),
                "Unexpected index {index} after {previous:?} in {id}"
            );
            previous = Some(index);

            assert_eq!(bob.decrypt_message(id, payload)?, Some(format!("{id} {i}")));
        }

        let stored = alice_sessions.load_state(id)?.map(|s| s.send_index());
        assert!(stored.is_none_or(|send_index| Some(send_index) == previous.map(|p| p + 1)));
    }

    Ok(())
}

#[test]
fn forged_payloads_leave_the_session_untouched() -> Result<()> {
    let (alice, _) = device(Account::new());
    let (bob, bob_sessions) = device(Account::new());
    let bob_key = bob.identity_keys()?.curve25519;

    let first = alice.encrypt_message("chat", "First", bob_key)?;
    assert!(bob.decrypt_message("chat", &first)?.is_some());
    let before = bob_sessions.load_state("chat")?.map(|s| s.receive_index());

    let second = alice.encrypt_message("chat", "Second", bob_key)?;
    let payload = EncryptedPayload::from_base64(&second)?;
    let mut json: serde_json::Value = serde_json::from_str(&payload.to_json())?;
    json["ciphertext"] = serde_json::Value::String("00".repeat(payload.ciphertext().len()));
    let forged = chatseal::base64_encode(serde_json::to_vec(&json)?);

    assert_matches!(bob.try_decrypt_message("chat", &forged), Err(DecryptionError::Cipher(_)));
    assert_eq!(bob_sessions.load_state("chat")?.map(|s| s.receive_index()), before);
    assert_eq!(bob.decrypt_message("chat", &second)?.as_deref(), Some("Second"));

    Ok(())
}

#[test]
fn sessions_survive_a_restart() -> Result<()> {
    const PICKLE_KEY: [u8; 32] = [7u8; 32];

    let directory = tempfile::tempdir()?;
    let open = || -> Result<_> {
        Ok(E2eeManager::new(
            FileIdentityStore::open(directory.path(), &PICKLE_KEY)?,
            FileSessionStore::open(directory.path().join("sessions"), &PICKLE_KEY)?,
            MemoryOutgoingCache::default(),
        ))
    };

    let (alice, _) = device(Account::new());
    let bob_account = Account::new();
    let bob_key = bob_account.curve25519_key();

    {
        let bob = open()?;
        bob.identity_store().save_account(&bob_account)?;
        let payload = alice.encrypt_message("chat", "Before", bob_key)?;
        assert_eq!(bob.decrypt_message("chat", &payload)?.as_deref(), Some("Before"));
    }

    let bob = open()?;
    assert_eq!(bob.identity_keys()?, bob_account.identity_keys());

    let payload = alice.encrypt_message("chat", "After", bob_key)?;
    assert_eq!(bob.decrypt_message("chat", &payload)?.as_deref(), Some("After"));

    Ok(())
}

struct Server {
    verify_key: std::sync::Mutex<chatseal::Ed25519PublicKey>,
    issued: TransferChallenge,
}

impl TransferServer for Server {
    type Error = TransferError;

    fn request_challenge(&self) -> Result<TransferChallenge, Self::Error> {
        Ok(self.issued.clone())
    }

    fn submit_transfer(&self, request: &TransferRequest) -> Result<AuthResponse, Self::Error> {
        let mut verify_key = self.verify_key.lock().expect("The lock isn't poisoned");
        request.verify(&self.issued, &verify_key, unix_millis())?;
        *verify_key = request.new_verify_key;

        Ok(AuthResponse {
            access_token: "access".to_owned(),
            refresh_token: "refresh".to_owned(),
            user_id: request.user_id.clone(),
        })
    }
}

#[test]
fn conversation_continues_after_a_device_transfer() -> Result<()> {
    let alice_account = Account::new();
    let server = Server {
        verify_key: std::sync::Mutex::new(alice_account.ed25519_key()),
        issued: TransferChallenge {
            challenge: hex::encode(b"challenge"),
            expires_at: unix_millis() + 60_000,
        },
    };

    let (old_alice, _) = device(alice_account);
    let (bob, _) = device(Account::new());
    let bob_key = bob.identity_keys()?.curve25519;

    for i in 0..10 {
        let payload = old_alice.encrypt_message("chat", &format!("Old {i}"), bob_key)?;
        assert!(bob.decrypt_message("chat", &payload)?.is_some());
    }

    let offer = offer_transfer(&server, old_alice.identity_store(), "alice")?;
    let token: TransferToken = offer.token.to_string().parse()?;

    let (new_alice, new_sessions) = device(Account::new());
    new_alice.encrypt_message("other chat", "Hello", bob_key)?;

    let session: AuthSession<()> =
        complete_transfer(&token, &server, &new_alice, Some("Phone".to_owned()))?;
    assert_eq!(session.user_id(), "alice");
    assert!(new_sessions.is_empty());

    let new_key = new_alice.identity_keys()?.curve25519;
    let payload = new_alice.encrypt_message("chat", "New", bob_key)?;
    assert_eq!(bob.decrypt_message("chat", &payload)?.as_deref(), Some("New"));

    let reply = bob.encrypt_message("chat", "Welcome back", new_key)?;
    assert_eq!(new_alice.decrypt_message("chat", &reply)?.as_deref(), Some("Welcome back"));

    // The old signing key has been replaced, the token can't be used twice.
    let replayed = complete_transfer::<_, _, _, _, ()>(&token, &server, &new_alice, None);
    assert_let!(Err(TransferError::Server(e)) = replayed);
    assert!(e.to_string().contains("signature"));

    Ok(())
}
