// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contexts handed to reaction, action and modal handlers.
//!
//! Actions can open modals. The originating thread and message are stored
//! under a fresh context ID so the later submit or close event can find
//! them again, even when it arrives in another process.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use parley_core::events::{
    ActionEvent, ModalCloseEvent, ModalOpened, ModalSubmitEvent, ReactionEvent,
};
use parley_core::message::SerializedMessage;
use parley_core::postable::ModalInput;
use parley_core::{Adapter, Author, ChatError, Message};

use crate::postable::Binding;
use crate::sent::SentMessage;
use crate::serialize::SerializedThread;
use crate::thread::Thread;

/// TTL of `modal-context:` entries.
pub const MODAL_CONTEXT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub(crate) fn modal_context_key(adapter_name: &str, context_id: &str) -> String {
    format!("modal-context:{adapter_name}:{context_id}")
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ModalContextRecord {
    pub thread: SerializedThread,
    #[serde(default)]
    pub message: Option<SerializedMessage>,
}

/// A reaction added to or removed from a message.
#[derive(Clone)]
pub struct ReactionContext {
    pub event: ReactionEvent,
    pub thread: Thread,
    pub(crate) adapter: Arc<dyn Adapter>,
}

impl ReactionContext {
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    pub fn user(&self) -> &Author {
        &self.event.user
    }

    pub fn added(&self) -> bool {
        self.event.added
    }
}

/// A button or select interaction.
#[derive(Clone)]
pub struct ActionContext {
    pub event: ActionEvent,
    pub thread: Thread,
    pub(crate) binding: Binding,
}

impl ActionContext {
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.binding.adapter
    }

    pub fn user(&self) -> &Author {
        &self.event.user
    }

    pub fn action_id(&self) -> &str {
        &self.event.action_id
    }

    pub fn value(&self) -> Option<&str> {
        self.event.value.as_deref()
    }

    /// Opens a modal in response to this action.
    ///
    /// Returns `Ok(None)` and logs a warning when the event carries no
    /// trigger ID or the adapter cannot open modals.
    pub async fn open_modal(
        &self,
        modal: impl Into<ModalInput> + Send,
    ) -> Result<Option<ModalOpened>, ChatError> {
        let adapter = &self.binding.adapter;
        let Some(trigger_id) = self.event.trigger_id.as_deref() else {
            self.binding
                .logger
                .warn(format!("cannot open modal for action {}: no trigger id", self.event.action_id));
            return Ok(None);
        };
        if !adapter.capabilities().open_modal {
            self.binding.logger.warn(format!(
                "cannot open modal: adapter {} does not support modals",
                adapter.name()
            ));
            return Ok(None);
        }

        let modal = modal.into().resolve()?;
        let context_id = uuid::Uuid::new_v4().to_string();
        let record = ModalContextRecord {
            thread: self.thread.to_json(),
            message: self.event.message.as_ref().map(Message::to_json),
        };
        self.binding
            .state
            .set(
                &modal_context_key(adapter.name(), &context_id),
                serde_json::to_value(&record)?,
                Some(MODAL_CONTEXT_TTL),
            )
            .await?;

        let view_id = adapter
            .open_modal(trigger_id, &modal, Some(&context_id))
            .await?;
        Ok(Some(ModalOpened { view_id }))
    }
}

/// A modal form submission.
#[derive(Clone)]
pub struct ModalSubmitContext {
    pub event: ModalSubmitEvent,
    /// The thread the modal was opened from, if it was opened by an action.
    pub related_thread: Option<Thread>,
    /// The message carrying the action that opened the modal.
    pub related_message: Option<SentMessage>,
    pub(crate) adapter: Arc<dyn Adapter>,
}

impl ModalSubmitContext {
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    pub fn user(&self) -> &Author {
        &self.event.user
    }

    pub fn value(&self, input_id: &str) -> Option<&str> {
        self.event.values.get(input_id).map(String::as_str)
    }
}

/// A modal dismissed without submitting.
#[derive(Clone)]
pub struct ModalCloseContext {
    pub event: ModalCloseEvent,
    pub related_thread: Option<Thread>,
    pub related_message: Option<SentMessage>,
    pub(crate) adapter: Arc<dyn Adapter>,
}

impl ModalCloseContext {
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    pub fn user(&self) -> &Author {
        &self.event.user
    }
}

/// Looks up the thread and message stored when the modal was opened.
pub(crate) async fn restore_modal_context(
    binding: &Binding,
    context_id: Option<&str>,
) -> Result<(Option<Thread>, Option<SentMessage>), ChatError> {
    let Some(context_id) = context_id else {
        return Ok((None, None));
    };
    let key = modal_context_key(binding.adapter.name(), context_id);
    let Some(value) = binding.state.get(&key).await? else {
        return Ok((None, None));
    };
    let record: ModalContextRecord = serde_json::from_value(value)?;
    let thread = Thread::restore(record.thread, Some(binding.clone()));
    let message = record.message.map(|message| {
        SentMessage::from_message(Arc::clone(&binding.adapter), Message::from_json(message))
    });
    Ok((Some(thread), message))
}

impl std::fmt::Debug for ReactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionContext")
            .field("event", &self.event)
            .field("thread", &self.thread)
            .finish()
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("event", &self.event)
            .field("thread", &self.thread)
            .finish()
    }
}
