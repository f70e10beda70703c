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

//! Everything that travels over the transport.
//!
//! [`EncryptedPayload`] is the opaque string a sender hands to the transport,
//! [`IncomingEvent`] is what the transport delivers back.

mod event;
mod payload;

pub use event::{
    DecryptedMessage, IncomingEvent, MessageDto, MessageStatus, MessageStatusDto, Timeline,
};
pub use payload::EncryptedPayload;
