use raydb_application::prelude as flows;
use raydb_core::{
    entities::*,
    gateways::messenger::{Controls, MessageId},
    review::{ChecklistEntry, FloorFilter},
    usecases::{self, ReviewStart},
};

use crate::{
    callback::{button, Callback},
    dialogue::Dialogue,
    render, Bot, Result, UserSession,
};

const ALL_FLOORS: &str = "*";
const NO_FLOOR: &str = "-";

fn checklist_controls(entries: &[ChecklistEntry]) -> Controls {
    let buttons = entries
        .iter()
        .filter_map(|entry| {
            let mark = if entry.reviewed { "+ " } else { "" };
            entry
                .poi_id
                .map(|id| button(format!("{mark}{}", entry.name), Callback::ToggleReview(id)))
        })
        .collect();
    Controls::grid(buttons, 2)
}

impl Bot {
    /// `/review [house [floor]]`, without a house around the user.
    pub(super) fn start_review(&mut self, session: &mut UserSession, args: &str, now: Timestamp) -> Result<()> {
        let mut args = args.split_whitespace();
        if let Some(house) = args.next() {
            return self.review_house(session, house, args.next(), now);
        }
        let Some(location) = session.info.location(now) else {
            self.send(
                session.info.id,
                "Share your location first, or send /review <house> [floor].",
                None,
            )?;
            return Ok(());
        };
        let start = usecases::start_review_around(&self.connections.shared()?, &session.info, location, None, now)?;
        self.begin_review(session, start, None, now)
    }

    pub(super) fn review_house(
        &mut self,
        session: &mut UserSession,
        house: &str,
        floor: Option<&str>,
        now: Timestamp,
    ) -> Result<()> {
        let Some(floor) = floor else {
            let choices = usecases::review_floor_options(&self.connections.shared()?, &session.info, house)?;
            if let Some(choices) = choices {
                return self.ask_floor(session.info.id, house, choices);
            }
            return self.review_house(session, house, Some(ALL_FLOORS), now);
        };
        let start = usecases::start_review_by_house(
            &self.connections.shared()?,
            &session.info,
            house,
            FloorFilter::parse(floor),
            now,
        )?;
        self.begin_review(session, start, Some(house), now)
    }

    fn ask_floor(&self, to: UserId, house: &str, choices: Vec<Option<String>>) -> Result<()> {
        let floor_button = |label: &str, floor: &str| {
            button(
                label,
                Callback::ReviewFloor {
                    house: house.to_string(),
                    floor: floor.to_string(),
                },
            )
        };
        let buttons = choices
            .iter()
            .map(|floor| match floor {
                Some(floor) => floor_button(floor.as_str(), floor.as_str()),
                None => floor_button("No floor", NO_FLOOR),
            })
            .collect();
        let controls = Controls::grid(buttons, 4).row(vec![floor_button("All", ALL_FLOORS)]);
        self.send(to, "Which floor?", Some(&controls))?;
        Ok(())
    }

    fn begin_review(
        &mut self,
        session: &mut UserSession,
        start: ReviewStart,
        house: Option<&str>,
        now: Timestamp,
    ) -> Result<()> {
        let user = session.info.id;
        let (review, pois) = match start {
            ReviewStart::Ready { session, pois } => (session, pois),
            ReviewStart::NeedsLocation => {
                let text = format!(
                    "The building is large, share your location and send /review {} again.",
                    house.unwrap_or_default()
                );
                self.send(user, &text, None)?;
                return Ok(());
            }
        };
        if pois.is_empty() {
            self.send(user, "There is nothing to review here.", None)?;
            return Ok(());
        }
        let entries: Vec<_> = pois.iter().map(|poi| ChecklistEntry::new(poi, now)).collect();
        session.dialogue = Dialogue::Review(review);
        self.send(user, &render::checklist(&entries), Some(&checklist_controls(&entries)))?;
        Ok(())
    }

    /// Flips the mark and refreshes the buttons of the checklist.
    pub(super) fn toggle_review(
        &mut self,
        session: &mut UserSession,
        id: PoiId,
        message: MessageId,
        now: Timestamp,
    ) -> Result<()> {
        let UserSession { info, dialogue } = session;
        let Dialogue::Review(review) = dialogue else {
            self.send(info.id, "No review is running, send /review to start one.", None)?;
            return Ok(());
        };
        flows::toggle_review(&self.connections, info, review, id, now)?;
        let entries = usecases::review_checklist(&self.connections.shared()?, review, now)?;
        let controls = checklist_controls(&entries);
        if let Err(err) = self.messenger.edit_controls(info.id, message, &controls) {
            warn!("Could not refresh the checklist: {}", err);
            self.send(info.id, &render::checklist(&entries), Some(&controls))?;
        }
        Ok(())
    }
}
