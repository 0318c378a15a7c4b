// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley chat-bot SDK.
//!
//! This crate provides the data model every platform adapter normalizes into,
//! the error taxonomy, and the trait contracts at the seams of the SDK:
//! [`Adapter`] (one per chat platform), [`StateAdapter`] (pluggable storage,
//! locks, subscriptions), and [`Dispatcher`] (the entry points adapters call).

pub mod error;
pub mod events;
pub mod logger;
pub mod message;
pub mod postable;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ChatError, HandlerError};
pub use events::{
    ActionEvent, MessageSource, ModalCloseEvent, ModalOpened, ModalResponse, ModalSubmitEvent,
    ReactionEvent, WaitUntil, WebhookOptions,
};
pub use logger::{LogLevel, Logger};
pub use message::{Message, SerializedMessage};
pub use postable::{
    AdapterPostableMessage, CardElement, JsxComponent, ModalElement, ModalInput, PostableMessage,
    TextStream,
};
pub use traits::{Adapter, Dispatcher, StateAdapter, StateAdapterExt, derive_channel_id};
pub use types::{
    AdapterCapabilities, Attachment, AttachmentKind, Author, ChannelInfo, EmojiValue,
    EphemeralMessage, FetchDirection, FetchOptions, FetchResult, IsBot, ListThreadsOptions,
    ListThreadsResult, Lock, MessageMetadata, RawMessage, StreamOptions, ThreadInfo,
    ThreadSummary, UserRef,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_traits_are_object_safe() {
        // Compiles only while every seam trait stays usable behind `dyn`.
        fn _assert_adapter(_: &dyn Adapter) {}
        fn _assert_state(_: &dyn StateAdapter) {}
        fn _assert_dispatcher(_: &dyn Dispatcher) {}
    }

    #[test]
    fn emoji_values_compare_by_name() {
        assert_eq!(EmojiValue::new("thumbs_up"), EmojiValue::new("thumbs_up"));
        assert_ne!(EmojiValue::new("thumbs_up"), EmojiValue::new("eyes"));
        assert_eq!(EmojiValue::new("eyes").to_string(), "eyes");
    }
}
