use std::fmt;

use anyhow::Result as Fallible;

use crate::entities::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Sent back with the callback when the button is pressed.
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Interactive buttons attached to a message, row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Controls {
    pub rows: Vec<Vec<Button>>,
}

impl Controls {
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    /// Lays out the buttons in rows of `width`.
    pub fn grid(buttons: Vec<Button>, width: usize) -> Self {
        let width = width.max(1);
        let mut rows = vec![];
        let mut buttons = buttons.into_iter().peekable();
        while buttons.peek().is_some() {
            rows.push(buttons.by_ref().take(width).collect());
        }
        Self { rows }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// The outgoing side of the chat transport.
pub trait Messenger {
    fn send_text(&self, to: UserId, text: &str, controls: Option<&Controls>) -> Fallible<MessageId>;
    /// Photos are referenced by their identifiers, more than one
    /// are sent as an album with the caption on the first one.
    fn send_photos(
        &self,
        to: UserId,
        photos: &[String],
        caption: Option<&str>,
    ) -> Fallible<Vec<MessageId>>;
    fn send_location(&self, to: UserId, location: Location) -> Fallible<MessageId>;
    fn edit_controls(&self, to: UserId, message: MessageId, controls: &Controls) -> Fallible<()>;
    fn delete_message(&self, to: UserId, message: MessageId) -> Fallible<()>;
}
