// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatcher surface adapters call back into.

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{
    ActionEvent, MessageSource, ModalCloseEvent, ModalResponse, ModalSubmitEvent, ReactionEvent,
    WebhookOptions,
};
use crate::logger::Logger;
use crate::traits::state::StateAdapter;

/// Entry points an [`Adapter`](crate::traits::Adapter) uses to hand
/// normalized events to the dispatcher.
///
/// Every `process_*` call except [`Dispatcher::process_modal_submit`] returns
/// immediately; processing runs in a task registered with
/// [`WebhookOptions::wait_until`] or spawned on the runtime, and its failures
/// are logged rather than returned.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// The dispatcher-wide default bot name.
    fn user_name(&self) -> &str;

    fn state(&self) -> Arc<dyn StateAdapter>;

    /// A child logger for the given component.
    fn logger(&self, prefix: &str) -> Logger;

    fn process_message(
        &self,
        adapter: &str,
        thread_id: &str,
        message: MessageSource,
        options: WebhookOptions,
    );

    fn process_reaction(&self, adapter: &str, event: ReactionEvent, options: WebhookOptions);

    fn process_action(&self, adapter: &str, event: ActionEvent, options: WebhookOptions);

    /// Runs modal-submit handlers and returns the first response any of them
    /// produced, for the adapter to answer the platform synchronously.
    async fn process_modal_submit(
        &self,
        adapter: &str,
        event: ModalSubmitEvent,
        options: WebhookOptions,
    ) -> Option<ModalResponse>;

    fn process_modal_close(&self, adapter: &str, event: ModalCloseEvent, options: WebhookOptions);
}
