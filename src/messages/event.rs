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

/// The delivery state of a message for one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    /// The server accepted the message.
    Sent,
    /// The message reached the recipient's device.
    Delivered,
    /// The recipient has seen the message.
    Read,
}

/// The delivery state of a message for one recipient, as the server reports
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct MessageStatusDto {
    pub message_id: String,
    pub user_id: String,
    pub status: MessageStatus,
}

/// A message as the server stores it, the content is an
/// [`EncryptedPayload`](super::EncryptedPayload) in its base64 form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct MessageDto {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub encrypted_content: String,
    pub created_at: i64,
    #[serde(default)]
    pub deleted_for_all: bool,
    #[serde(default)]
    pub statuses: Vec<MessageStatusDto>,
}

/// An event pushed by the transport for an open conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingEvent {
    /// A new message was posted.
    Message {
        /// The posted message.
        message: MessageDto,
    },
    /// The delivery state of a message changed for one of the participants.
    #[serde(rename_all = "camelCase")]
    Status {
        /// The message whose state changed.
        message_id: String,
        /// The participant the new state applies to.
        user_id: String,
        /// The new state.
        status: MessageStatus,
    },
    /// A message was deleted.
    #[serde(rename_all = "camelCase")]
    Delete {
        /// The deleted message.
        message_id: String,
        /// Was the message deleted for every participant or only locally.
        delete_for_all: bool,
    },
}

impl IncomingEvent {
    /// Parse an event from the JSON text frame the transport delivered.
    ///
    /// Events with an unknown `type` are reported as errors, callers are
    /// expected to skip them.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// A message ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// The server side id of the message.
    pub id: String,
    /// The conversation the message belongs to.
    pub chat_id: String,
    /// The author of the message.
    pub sender_id: String,
    /// The plaintext, `None` if the message couldn't be decrypted or was
    /// deleted.
    pub text: Option<String>,
    /// Creation time in milliseconds since the unix epoch.
    pub created_at: i64,
    /// Was the message deleted for every participant.
    pub deleted_for_all: bool,
    /// The delivery state for each recipient.
    pub statuses: Vec<MessageStatusDto>,
}

impl DecryptedMessage {
    /// Is this message deleted.
    pub const fn is_deleted(&self) -> bool {
        self.deleted_for_all
    }

    /// Is this a message that wasn't deleted, but whose content couldn't be
    /// recovered.
    pub const fn is_undecryptable(&self) -> bool {
        !self.deleted_for_all && self.text.is_none()
    }
}

/// The messages of a single conversation, newest first, kept up to date by
/// applying [`IncomingEvent`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    messages: Vec<MessageDto>,
}

impl Timeline {
    /// Create a timeline from a page of history.
    pub fn new(mut messages: Vec<MessageDto>) -> Self {
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self { messages }
    }

    /// The messages, newest first.
    pub fn messages(&self) -> &[MessageDto] {
        &self.messages
    }

    /// Apply an event to the timeline.
    ///
    /// Returns `true` if the timeline changed.
    pub fn apply(&mut self, event: IncomingEvent) -> bool {
        match event {
            IncomingEvent::Message { message } => {
                if self.messages.iter().any(|m| m.id == message.id) {
                    return false;
                }

                let position = self
                    .messages
                    .iter()
                    .position(|m| m.created_at < message.created_at)
                    .unwrap_or(self.messages.len());

                self.messages.insert(position, message);

                true
            }
            IncomingEvent::Status { message_id, user_id, status } => {
                let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) else {
                    return false;
                };

                message.statuses.retain(|s| s.user_id != user_id);
                message.statuses.push(MessageStatusDto { message_id, user_id, status });

                true
            }
            IncomingEvent::Delete { message_id, delete_for_all } => {
                if delete_for_all {
                    let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id)
                    else {
                        return false;
                    };

                    message.deleted_for_all = true;
                    message.encrypted_content.clear();

                    true
                } else {
                    let before = self.messages.len();
                    self.messages.retain(|m| m.id != message_id);

                    before != self.messages.len()
                }
            }
        }
    }
}
