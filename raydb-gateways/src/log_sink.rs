use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result as Fallible;
use raydb_core::{
    entities::*,
    gateways::messenger::{Controls, MessageId, Messenger},
};

/// Writes every outgoing message to the log.
#[derive(Debug, Default)]
pub struct LogMessenger {
    last_id: AtomicI64,
}

impl LogMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.last_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

fn format_controls(controls: &Controls) -> String {
    controls
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| format!("[{}|{}]", b.label, b.data))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

impl Messenger for LogMessenger {
    fn send_text(&self, to: UserId, text: &str, controls: Option<&Controls>) -> Fallible<MessageId> {
        let id = self.next_id();
        match controls.filter(|c| !c.is_empty()) {
            Some(controls) => log::info!("-> {to} #{id}: {text} {}", format_controls(controls)),
            None => log::info!("-> {to} #{id}: {text}"),
        }
        Ok(id)
    }

    fn send_photos(
        &self,
        to: UserId,
        photos: &[String],
        caption: Option<&str>,
    ) -> Fallible<Vec<MessageId>> {
        let ids: Vec<_> = photos.iter().map(|_| self.next_id()).collect();
        log::info!(
            "-> {to} photos {}: {}",
            photos.join(", "),
            caption.unwrap_or_default()
        );
        Ok(ids)
    }

    fn send_location(&self, to: UserId, location: Location) -> Fallible<MessageId> {
        let id = self.next_id();
        log::info!("-> {to} #{id}: location {location}");
        Ok(id)
    }

    fn edit_controls(&self, to: UserId, message: MessageId, controls: &Controls) -> Fallible<()> {
        log::info!("-> {to} #{message} controls: {}", format_controls(controls));
        Ok(())
    }

    fn delete_message(&self, to: UserId, message: MessageId) -> Fallible<()> {
        log::debug!("-> {to} #{message} deleted");
        Ok(())
    }
}
