// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide dispatcher registry used by deserialized threads and
//! channels to find their adapter on first use.

use std::sync::RwLock;

use parley_core::ChatError;

use crate::chat::Chat;
use crate::postable::Binding;

static SINGLETON: RwLock<Option<Chat>> = RwLock::new(None);

pub(crate) fn register(chat: &Chat) {
    *SINGLETON.write().unwrap_or_else(|e| e.into_inner()) = Some(chat.clone());
}

pub(crate) fn clear() {
    *SINGLETON.write().unwrap_or_else(|e| e.into_inner()) = None;
}

pub(crate) fn current() -> Result<Chat, ChatError> {
    SINGLETON
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .ok_or(ChatError::SingletonMissing)
}

pub(crate) fn binding_for(adapter_name: &str) -> Result<Binding, ChatError> {
    current()?.binding(adapter_name)
}
