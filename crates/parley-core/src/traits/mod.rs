// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams of the SDK.
//!
//! Adapters and state backends are external collaborators; the core only
//! depends on these contracts. All traits use `#[async_trait]` for dynamic
//! dispatch compatibility.

pub mod adapter;
pub mod dispatcher;
pub mod state;

pub use adapter::{Adapter, default_channel_id, derive_channel_id};
pub use dispatcher::Dispatcher;
pub use state::{StateAdapter, StateAdapterExt};
