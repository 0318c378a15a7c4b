// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher, threads, and channels for the Parley chat-bot SDK.
//!
//! The [`Chat`] dispatcher is the central coordinator that:
//! - Initializes the state backend and every platform adapter once
//! - Deduplicates inbound messages and serializes processing per thread
//! - Routes messages to subscribed, mention, or pattern handlers
//! - Dispatches reactions, actions, and modal events
//! - Streams replies natively or through throttled placeholder edits
//!
//! Handlers receive a [`Thread`] to reply through; threads and channels also
//! serialize to tagged JSON and come back to life through a [`Reviver`] or
//! the process-wide singleton.

pub mod channel;
pub mod chat;
pub mod config;
pub mod context;
pub mod handlers;
mod mention;
pub mod postable;
pub mod sent;
pub mod serialize;
mod singleton;
pub mod streaming;
pub mod thread;

pub use channel::{Channel, ThreadStream};
pub use chat::Chat;
pub use config::ChatConfig;
pub use context::{ActionContext, ModalCloseContext, ModalSubmitContext, ReactionContext};
pub use handlers::{EmojiFilter, HandlerResult};
pub use postable::{EphemeralOptions, MessageStream, Postable, SetStateOptions};
pub use sent::SentMessage;
pub use serialize::{Revived, Reviver, SerializedChannel, SerializedThread};
pub use thread::Thread;
