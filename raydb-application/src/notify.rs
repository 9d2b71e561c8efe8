use super::*;

/// Callback data of the button that opens the moderation queue.
pub const QUEUE_CALLBACK: &str = "queue";

/// Prefix of the callback data that opens a POI card.
pub const POI_CALLBACK_PREFIX: &str = "poi:";

pub fn poi_callback(id: PoiId) -> String {
    format!("{POI_CALLBACK_PREFIX}{id}")
}

/// Who receives moderation requests and how.
#[derive(Clone, Copy)]
pub struct Moderators<'a> {
    pub messenger: &'a dyn Messenger,
    /// Always notified, even without a stored role.
    pub admin: Option<UserId>,
}

impl Moderators<'_> {
    /// Sends the same note to every moderator and returns
    /// how many of them have been reached.
    pub fn broadcast(
        &self,
        connections: &sqlite::Connections,
        text: &str,
        controls: Option<&Controls>,
    ) -> Result<usize> {
        self.send_to_all(connections, text, controls, None)
    }

    /// Like [`Self::broadcast`] but leaves out one of them,
    /// usually the moderator who caused the note.
    pub fn broadcast_except(
        &self,
        connections: &sqlite::Connections,
        text: &str,
        except: UserId,
    ) -> Result<usize> {
        self.send_to_all(connections, text, None, Some(except))
    }

    fn send_to_all(
        &self,
        connections: &sqlite::Connections,
        text: &str,
        controls: Option<&Controls>,
        except: Option<UserId>,
    ) -> Result<usize> {
        let recipients = usecases::moderator_ids(&connections.shared()?, self.admin)?;
        let mut reached = 0;
        for to in recipients.into_iter().filter(|to| Some(*to) != except) {
            match self.messenger.send_text(to, text, controls) {
                Ok(_) => reached += 1,
                Err(err) => warn!("Failed to notify moderator {}: {}", to, err),
            }
        }
        debug!("Notified {} moderators", reached);
        Ok(reached)
    }
}

pub fn user_label(user: &UserInfo) -> String {
    match &user.name {
        Some(name) => format!("{name} ({})", user.id),
        None => user.id.to_string(),
    }
}

pub(crate) fn poi_controls(id: PoiId) -> Controls {
    Controls::default().row(vec![
        Button::new("Show", poi_callback(id)),
        Button::new("Queue", QUEUE_CALLBACK),
    ])
}

pub(crate) fn notify_poi_event(
    connections: &sqlite::Connections,
    moderators: Moderators,
    id: PoiId,
    text: &str,
) {
    if let Err(err) = moderators.broadcast(connections, text, Some(&poi_controls(id))) {
        error!("Failed to notify moderators about POI {}: {}", id, err);
    }
}
