// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound content accepted by `post`, `edit`, and `open_modal`.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// An async sequence of text chunks posted as a streaming reply.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// A rendered card element (`{"type": "card", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardElement(serde_json::Value);

impl CardElement {
    /// Accepts a JSON element whose `type` is `card`.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        (value.get("type").and_then(|t| t.as_str()) == Some("card")).then_some(Self(value))
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A rendered modal element (`{"type": "modal", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModalElement(serde_json::Value);

impl ModalElement {
    /// Accepts a JSON element whose `type` is `modal`.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        (value.get("type").and_then(|t| t.as_str()) == Some("modal")).then_some(Self(value))
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A component tree produced by a JSX-style builder.
///
/// Rendering yields a plain JSON element, or `None` when the tree renders to
/// nothing.
pub trait JsxComponent: Send + Sync {
    fn render(&self) -> Option<serde_json::Value>;
}

/// Renders a component that must produce a card.
pub fn jsx_to_card(component: &dyn JsxComponent) -> Result<CardElement, ChatError> {
    component
        .render()
        .and_then(CardElement::from_value)
        .ok_or_else(|| ChatError::InvalidElement("JSX element must render to a Card".into()))
}

/// Renders a component that must produce a modal.
pub fn jsx_to_modal(component: &dyn JsxComponent) -> Result<ModalElement, ChatError> {
    component
        .render()
        .and_then(ModalElement::from_value)
        .ok_or_else(|| ChatError::InvalidElement("JSX element must render to a Modal".into()))
}

/// Content handed to adapter `post_message`/`edit_message` calls.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterPostableMessage {
    /// Plain text.
    Text(String),
    /// Text passed through to the platform untouched.
    Raw(String),
    Markdown(String),
    /// A markdown AST.
    Ast(serde_json::Value),
    Card {
        card: CardElement,
        fallback_text: Option<String>,
    },
}

impl AdapterPostableMessage {
    /// Best-effort plain text for bookkeeping; ASTs need the adapter's renderer.
    pub fn text(&self) -> Option<&str> {
        match self {
            AdapterPostableMessage::Text(s)
            | AdapterPostableMessage::Raw(s)
            | AdapterPostableMessage::Markdown(s) => Some(s),
            AdapterPostableMessage::Ast(_) => None,
            AdapterPostableMessage::Card { fallback_text, .. } => fallback_text.as_deref(),
        }
    }
}

/// Anything a thread or channel can post.
pub enum PostableMessage {
    Message(AdapterPostableMessage),
    Jsx(Arc<dyn JsxComponent>),
    Stream(TextStream),
}

impl PostableMessage {
    pub fn text(text: impl Into<String>) -> Self {
        PostableMessage::Message(AdapterPostableMessage::Text(text.into()))
    }

    pub fn raw(raw: impl Into<String>) -> Self {
        PostableMessage::Message(AdapterPostableMessage::Raw(raw.into()))
    }

    pub fn markdown(markdown: impl Into<String>) -> Self {
        PostableMessage::Message(AdapterPostableMessage::Markdown(markdown.into()))
    }

    pub fn ast(ast: serde_json::Value) -> Self {
        PostableMessage::Message(AdapterPostableMessage::Ast(ast))
    }

    pub fn card(card: CardElement, fallback_text: Option<String>) -> Self {
        PostableMessage::Message(AdapterPostableMessage::Card {
            card,
            fallback_text,
        })
    }

    pub fn jsx(component: impl JsxComponent + 'static) -> Self {
        PostableMessage::Jsx(Arc::new(component))
    }

    pub fn stream(stream: impl Stream<Item = Result<String, ChatError>> + Send + 'static) -> Self {
        PostableMessage::Stream(Box::pin(stream))
    }
}

impl fmt::Debug for PostableMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostableMessage::Message(m) => f.debug_tuple("Message").field(m).finish(),
            PostableMessage::Jsx(_) => f.write_str("Jsx(<component>)"),
            PostableMessage::Stream(_) => f.write_str("Stream(<stream>)"),
        }
    }
}

impl From<&str> for PostableMessage {
    fn from(text: &str) -> Self {
        PostableMessage::text(text)
    }
}

impl From<String> for PostableMessage {
    fn from(text: String) -> Self {
        PostableMessage::text(text)
    }
}

impl From<AdapterPostableMessage> for PostableMessage {
    fn from(message: AdapterPostableMessage) -> Self {
        PostableMessage::Message(message)
    }
}

impl From<CardElement> for PostableMessage {
    fn from(card: CardElement) -> Self {
        PostableMessage::card(card, None)
    }
}

impl From<TextStream> for PostableMessage {
    fn from(stream: TextStream) -> Self {
        PostableMessage::Stream(stream)
    }
}

/// Input accepted by `open_modal`.
#[derive(Clone)]
pub enum ModalInput {
    Element(ModalElement),
    Jsx(Arc<dyn JsxComponent>),
}

impl ModalInput {
    pub fn resolve(&self) -> Result<ModalElement, ChatError> {
        match self {
            ModalInput::Element(modal) => Ok(modal.clone()),
            ModalInput::Jsx(component) => jsx_to_modal(component.as_ref()),
        }
    }
}

impl From<ModalElement> for ModalInput {
    fn from(modal: ModalElement) -> Self {
        ModalInput::Element(modal)
    }
}

impl fmt::Debug for ModalInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModalInput::Element(m) => f.debug_tuple("Element").field(m).finish(),
            ModalInput::Jsx(_) => f.write_str("Jsx(<component>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Rendered(Option<serde_json::Value>);

    impl JsxComponent for Rendered {
        fn render(&self) -> Option<serde_json::Value> {
            self.0.clone()
        }
    }

    #[test]
    fn card_requires_card_type() {
        assert!(CardElement::from_value(json!({"type": "card", "title": "Hi"})).is_some());
        assert!(CardElement::from_value(json!({"type": "modal"})).is_none());
        assert!(CardElement::from_value(json!("card")).is_none());
    }

    #[test]
    fn jsx_conversion_fails_loudly() {
        let card = jsx_to_card(&Rendered(Some(json!({"type": "card"})))).unwrap();
        assert_eq!(card.as_value()["type"], "card");

        let err = jsx_to_card(&Rendered(None)).unwrap_err();
        assert_eq!(err.code(), "INVALID_ELEMENT");

        let err = jsx_to_modal(&Rendered(Some(json!({"type": "card"})))).unwrap_err();
        assert_eq!(err.code(), "INVALID_ELEMENT");
    }

    #[test]
    fn text_prefers_fallback_for_cards() {
        let card = CardElement::from_value(json!({"type": "card"})).unwrap();
        let msg = AdapterPostableMessage::Card {
            card,
            fallback_text: Some("plain".into()),
        };
        assert_eq!(msg.text(), Some("plain"));
        assert_eq!(AdapterPostableMessage::Ast(json!({})).text(), None);
    }
}
