// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides mock adapters and fixtures for fast, deterministic,
//! CI-runnable tests without a chat platform or a state server.
//!
//! # Components
//!
//! - [`MockAdapter`] - Mock chat platform recording every outbound call
//! - [`MemoryState`] - In-memory state backend on the tokio clock
//! - [`TaskCollector`] - Collects `wait_until` tasks so tests can await them

pub mod harness;
pub mod memory_state;
pub mod mock_adapter;

pub use harness::{TaskCollector, author, bot_author, bot_message, user_message};
pub use memory_state::MemoryState;
pub use mock_adapter::{AdapterCall, MockAdapter};
