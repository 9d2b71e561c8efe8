use std::{
    io,
    path::Path,
    sync::atomic::{AtomicI64, Ordering},
};

use anyhow::Result as Fallible;
use jfs::Store;
use raydb_core::{
    entities::*,
    gateways::messenger::{Controls, MessageId, Messenger},
};
use serde::{Deserialize, Serialize};

/// Stores every outgoing message as a JSON file.
///
/// Used for testing and for running without a chat transport.
pub struct JsonFileOutbox {
    json_store: Store,
    last_id: AtomicI64,
}

impl JsonFileOutbox {
    pub fn try_new<P: AsRef<Path>>(directory: P) -> io::Result<Self> {
        let json_store = Store::new(directory)?;
        Ok(Self {
            json_store,
            last_id: AtomicI64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        self.json_store.path()
    }

    fn save(&self, to: UserId, message: JsonMessage) -> Fallible<MessageId> {
        let id = MessageId(self.last_id.fetch_add(1, Ordering::Relaxed) + 1);
        let record = JsonRecord {
            to: to.to_inner(),
            id: id.0,
            message,
        };
        let key = format!("{:08}-{to}", id.0);
        self.json_store.save_with_id(&record, &key)?;
        Ok(id)
    }
}

type JsonControls = Vec<Vec<(String, String)>>;

fn json_controls(controls: &Controls) -> JsonControls {
    controls
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| (b.label.clone(), b.data.clone()))
                .collect()
        })
        .collect()
}

#[derive(Debug, Deserialize, Serialize)]
struct JsonRecord {
    to: i64,
    id: i64,
    #[serde(flatten)]
    message: JsonMessage,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonMessage {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        controls: JsonControls,
    },
    Photos {
        photos: Vec<String>,
        caption: Option<String>,
    },
    Location {
        lon: f64,
        lat: f64,
    },
    EditControls {
        message: i64,
        controls: JsonControls,
    },
    Delete {
        message: i64,
    },
}

impl Messenger for JsonFileOutbox {
    fn send_text(&self, to: UserId, text: &str, controls: Option<&Controls>) -> Fallible<MessageId> {
        self.save(
            to,
            JsonMessage::Text {
                text: text.to_string(),
                controls: controls.map(json_controls).unwrap_or_default(),
            },
        )
    }

    fn send_photos(
        &self,
        to: UserId,
        photos: &[String],
        caption: Option<&str>,
    ) -> Fallible<Vec<MessageId>> {
        // An album is stored as a single file
        let id = self.save(
            to,
            JsonMessage::Photos {
                photos: photos.to_vec(),
                caption: caption.map(ToString::to_string),
            },
        )?;
        Ok(vec![id])
    }

    fn send_location(&self, to: UserId, location: Location) -> Fallible<MessageId> {
        self.save(
            to,
            JsonMessage::Location {
                lon: location.lon,
                lat: location.lat,
            },
        )
    }

    fn edit_controls(&self, to: UserId, message: MessageId, controls: &Controls) -> Fallible<()> {
        self.save(
            to,
            JsonMessage::EditControls {
                message: message.0,
                controls: json_controls(controls),
            },
        )?;
        Ok(())
    }

    fn delete_message(&self, to: UserId, message: MessageId) -> Fallible<()> {
        self.save(to, JsonMessage::Delete { message: message.0 })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_core::gateways::messenger::Button;
    use std::fs;

    fn read(outbox: &JsonFileOutbox, key: &str) -> serde_json::Value {
        let path = outbox.path().join(format!("{key}.json"));
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn store_one_file_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = JsonFileOutbox::try_new(dir.path()).unwrap();
        let to = UserId::new(42);
        let controls = Controls::default().row(vec![Button::new("Apply", "qa:1")]);
        let id = outbox.send_text(to, "New entry", Some(&controls)).unwrap();
        assert_eq!(MessageId(1), id);
        outbox.delete_message(to, id).unwrap();

        let text = read(&outbox, "00000001-42");
        assert_eq!("text", text["kind"]);
        assert_eq!("New entry", text["text"]);
        assert_eq!("qa:1", text["controls"][0][0][1]);
        let delete = read(&outbox, "00000002-42");
        assert_eq!("delete", delete["kind"]);
        assert_eq!(1, delete["message"]);
    }
}
