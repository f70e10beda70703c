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

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{IdentityStore, SessionStore, StoreError};
use crate::{
    Account, AccountPickle,
    ratchet::{RatchetState, RatchetStatePickle},
};

const STATE_EXTENSION: &str = "ratchet";
const ACCOUNT_FILE: &str = "account.pickle";

fn read_optional(path: &Path) -> Result<Option<Zeroizing<String>>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(Zeroizing::new(content))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_optional(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Write the file next to its final location first, so a crash never leaves
/// a truncated record behind.
fn write_atomically(path: &Path, content: &str) -> Result<(), StoreError> {
    let temporary = path.with_extension("tmp");

    fs::write(&temporary, content)?;
    fs::rename(&temporary, path)?;

    Ok(())
}

/// A [`SessionStore`] writing one encrypted pickle per conversation into a
/// directory.
///
/// The file of a conversation is named after the hex encoded SHA-256 hash of
/// the conversation id, so ids of any length and content map to valid file
/// names.
pub struct FileSessionStore {
    directory: PathBuf,
    pickle_key: Zeroizing<[u8; 32]>,
}

impl FileSessionStore {
    /// Open the store in the given directory, creating it if needed.
    pub fn open(directory: impl Into<PathBuf>, pickle_key: &[u8; 32]) -> Result<Self, StoreError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        Ok(Self { directory, pickle_key: Zeroizing::new(*pickle_key) })
    }

    fn state_path(&self, conversation_id: &str) -> PathBuf {
        let name = hex::encode(Sha256::digest(conversation_id.as_bytes()));

        self.directory.join(format!("{name}.{STATE_EXTENSION}"))
    }
}

impl SessionStore for FileSessionStore {
    fn load_state(&self, conversation_id: &str) -> Result<Option<RatchetState>, StoreError> {
        let Some(ciphertext) = read_optional(&self.state_path(conversation_id))? else {
            return Ok(None);
        };

        let pickle = RatchetStatePickle::from_encrypted(ciphertext.trim(), &self.pickle_key)?;

        Ok(Some(RatchetState::try_from(pickle)?))
    }

    fn save_state(&self, conversation_id: &str, state: &RatchetState) -> Result<(), StoreError> {
        let ciphertext = state.pickle().encrypt(&self.pickle_key);

        write_atomically(&self.state_path(conversation_id), &ciphertext)
    }

    fn clear_state(&self, conversation_id: &str) -> Result<(), StoreError> {
        remove_optional(&self.state_path(conversation_id))
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();

            if path.extension().is_some_and(|e| e == STATE_EXTENSION) {
                remove_optional(&path)?;
            }
        }

        Ok(())
    }
}

/// An [`IdentityStore`] writing the account as an encrypted pickle into a
/// directory.
pub struct FileIdentityStore {
    path: PathBuf,
    pickle_key: Zeroizing<[u8; 32]>,
}

impl FileIdentityStore {
    /// Open the store in the given directory, creating it if needed.
    pub fn open(directory: impl Into<PathBuf>, pickle_key: &[u8; 32]) -> Result<Self, StoreError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        Ok(Self { path: directory.join(ACCOUNT_FILE), pickle_key: Zeroizing::new(*pickle_key) })
    }
}

impl IdentityStore for FileIdentityStore {
    fn load_account(&self) -> Result<Option<Account>, StoreError> {
        let Some(ciphertext) = read_optional(&self.path)? else {
            return Ok(None);
        };

        let pickle = AccountPickle::from_encrypted(ciphertext.trim(), &self.pickle_key)?;

        Ok(Some(Account::try_from(pickle)?))
    }

    fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        write_atomically(&self.path, &account.pickle().encrypt(&self.pickle_key))
    }

    fn clear(&self) -> Result<(), StoreError> {
        remove_optional(&self.path)
    }
}
