use std::{collections::HashMap, fs};

use raydb_core::{
    address::{AddressContext, AddressMatch},
    entities::*,
    gateways::messenger::{Button, Controls, MessageId},
    pagination::{paginate, ListCallback},
    ranking::{rank, RankingContext},
    responses::{find_response, PredefinedResponse},
    usecases,
};

use crate::{
    callback::{button, Callback},
    dialogue::Dialogue,
    render, Bot, Result, UserSession,
};

const RECENT_COUNT: usize = 20;
const LIST_WIDTH: usize = 3;

impl Bot {
    /// Canned responses win over addresses, addresses over keywords.
    pub(super) fn search(&mut self, session: &mut UserSession, text: &str, now: Timestamp) -> Result<()> {
        session.dialogue = Dialogue::Idle;
        let tokens = self.config.tokenizer.split_tokens(text);
        if tokens.is_empty() {
            return Ok(());
        }
        if let Some(response) = find_response(&self.config.responses, &tokens, &session.info.roles) {
            debug!("Answering {:?} with {:?}", text, response.name);
            return self.send_response(session.info.id, response);
        }
        let found = usecases::resolve_address(&self.connections.shared()?, &self.config.address, &tokens)?;
        if let Some(found) = found {
            return self.show_address(session, found, now);
        }
        let pois = usecases::find_pois(&self.connections.shared()?, &self.search_engine, &tokens)?;
        self.show_results(session, text.trim(), pois, false, true, now)
    }

    fn send_response(&self, to: UserId, response: &PredefinedResponse) -> Result<()> {
        let text = response.text();
        let with_photo = match &response.photo {
            Some(photo) => self.send_photo_files(to, &[photo], Some(&text))?,
            None => false,
        };
        if !with_photo {
            self.send(to, &text, None)?;
        }
        Ok(())
    }

    pub(super) fn continue_address(
        &mut self,
        session: &mut UserSession,
        context: &AddressContext,
        text: &str,
        now: Timestamp,
    ) -> Result<()> {
        let found = usecases::continue_address(
            &self.connections.shared()?,
            &self.config.address,
            context,
            text,
        )?;
        match found {
            Some(found) => self.show_address(session, found, now),
            None => self.search(session, text, now),
        }
    }

    pub(super) fn show_address(
        &mut self,
        session: &mut UserSession,
        found: AddressMatch,
        now: Timestamp,
    ) -> Result<()> {
        let user = session.info.id;
        let card = usecases::address_card(&self.connections.shared()?, &found)?;
        session.dialogue = found
            .next_context()
            .map(Dialogue::Address)
            .unwrap_or_default();
        if let Some(poi) = &card {
            self.send_card(session, poi, now)?;
        }
        let controls = match &found {
            AddressMatch::Street(street) => {
                let buttons = street
                    .buildings
                    .iter()
                    .map(|b| button(&b.house, Callback::ChooseHouse(b.key.clone())))
                    .collect();
                Some(Controls::grid(buttons, 4))
            }
            _ => None,
        };
        self.send(user, &render::address_match(&found), controls.as_ref())?;
        Ok(())
    }

    /// `rank_first` is unset when the order has been decided before.
    pub(super) fn show_results(
        &mut self,
        session: &mut UserSession,
        query: &str,
        mut pois: Vec<Poi>,
        full: bool,
        rank_first: bool,
        now: Timestamp,
    ) -> Result<()> {
        let user = session.info.id;
        match pois.len() {
            0 => {
                let controls = Controls::default().row(vec![
                    button("Message the moderators", Callback::Report),
                    button("Add a place", Callback::New),
                ]);
                self.send(user, &format!("Nothing found for {query}."), Some(&controls))?;
                return Ok(());
            }
            1 => return self.send_card(session, &pois[0], now),
            _ => {}
        }
        if rank_first {
            let ids: Vec<_> = pois.iter().filter_map(|p| p.id).collect();
            let stars = usecases::get_stars(&self.connections.shared()?, Some(user), &ids)?;
            let ctx = RankingContext {
                user_location: session.info.location(now),
                stars: Some(stars),
                now: Some(now.to_local(self.config.utc_offset)),
            };
            rank(&mut pois, &ctx, &mut self.rng);
        }
        let ids: Vec<i64> = pois.iter().filter_map(|p| p.id).map(i64::from).collect();
        let page = paginate(pois, full);
        let buttons: Vec<Button> = page
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, poi)| poi.id.map(|id| button((i + 1).to_string(), Callback::Poi(id))))
            .collect();
        let mut controls = Controls::grid(buttons, LIST_WIDTH);
        if page.show_all {
            controls = controls.row(vec![Button::new(
                format!("Show all {}", page.total),
                ListCallback::encode(query, &ids),
            )]);
        }
        self.send(user, &render::poi_list(&page), Some(&controls))?;
        Ok(())
    }

    pub(super) fn show_list(
        &mut self,
        session: &mut UserSession,
        list: ListCallback,
        now: Timestamp,
    ) -> Result<()> {
        match list {
            ListCallback::Ids { query, ids } => {
                let ids: Vec<_> = ids.into_iter().map(PoiId::from).collect();
                let pois = usecases::get_pois(&self.connections.shared()?, &ids)?
                    .into_iter()
                    .filter(Poi::is_searchable)
                    .collect();
                self.show_results(session, &query, pois, true, false, now)
            }
            ListCallback::Requery { query } => {
                debug!("Show all of {:?} by running the query again", query);
                let tokens = self.config.tokenizer.split_tokens(&query);
                let pois = usecases::find_pois(&self.connections.shared()?, &self.search_engine, &tokens)?;
                self.show_results(session, &query, pois, true, true, now)
            }
        }
    }

    pub(super) fn show_poi(&mut self, session: &mut UserSession, id: PoiId, now: Timestamp) -> Result<()> {
        let poi = usecases::get_poi(&self.connections.shared()?, id)?;
        if poi.is_deleted() && !session.info.is_moderator() {
            return Err(usecases::Error::Deleted.into());
        }
        self.send_card(session, &poi, now)
    }

    /// Photos first, then the text with its buttons.
    pub(super) fn send_card(&self, session: &UserSession, poi: &Poi, now: Timestamp) -> Result<()> {
        let user = &session.info;
        self.send_photos(user.id, poi)?;
        let stars = match poi.id {
            Some(id) => usecases::get_stars(&self.connections.shared()?, Some(user.id), &[id])?,
            None => Default::default(),
        };
        let count = poi.id.and_then(|id| stars.counts.get(&id).copied()).unwrap_or(0);
        let starred = poi.id.map(|id| stars.starred_by_user.contains(&id)).unwrap_or(false);
        let text = render::poi_card(
            poi,
            now.to_local(self.config.utc_offset),
            count,
            user.is_moderator(),
        );
        self.send(user.id, &text, Some(&card_controls(poi, user, starred)))?;
        Ok(())
    }

    fn send_photos(&self, to: UserId, poi: &Poi) -> Result<()> {
        let names: Vec<_> = [&poi.photo_out, &poi.photo_in].into_iter().flatten().collect();
        self.send_photo_files(to, &names, None)?;
        Ok(())
    }

    /// Sends the named files of the photo directory, reusing the file
    /// ids of earlier uploads. Returns whether anything has been sent.
    fn send_photo_files(&self, to: UserId, names: &[&String], caption: Option<&str>) -> Result<bool> {
        let Some(dir) = &self.config.photos_dir else {
            return Ok(false);
        };
        let mut sizes = HashMap::new();
        for name in names {
            match fs::metadata(dir.join(name)) {
                Ok(meta) => {
                    sizes.insert(name.to_string(), meta.len());
                }
                Err(err) => debug!("Photo {} is not available: {}", name, err),
            }
        }
        if sizes.is_empty() {
            return Ok(false);
        }
        let known = usecases::find_file_ids(&self.connections.shared()?, &sizes)?;
        let photos: Vec<String> = names
            .iter()
            .filter(|name| sizes.contains_key(name.as_str()))
            .map(|name| {
                known
                    .get(name.as_str())
                    .cloned()
                    .unwrap_or_else(|| dir.join(name).to_string_lossy().into_owned())
            })
            .collect();
        self.messenger.send_photos(to, &photos, caption)?;
        Ok(true)
    }

    pub(super) fn show_location(&mut self, session: &mut UserSession, id: PoiId) -> Result<()> {
        let poi = usecases::get_poi(&self.connections.shared()?, id)?;
        self.messenger.send_location(session.info.id, poi.location)?;
        Ok(())
    }

    pub(super) fn star(
        &mut self,
        session: &mut UserSession,
        id: PoiId,
        message: MessageId,
        now: Timestamp,
    ) -> Result<()> {
        let user = session.info.id;
        let starred = self
            .connections
            .exclusive()?
            .transaction(|conn| usecases::toggle_star(conn, user, id))?;
        debug!("User {} starred POI {}: {}", user, id, starred);
        let poi = usecases::get_poi(&self.connections.shared()?, id)?;
        let controls = card_controls(&poi, &session.info, starred);
        if let Err(err) = self.messenger.edit_controls(user, message, &controls) {
            // The message may be gone, a fresh card does as well.
            warn!("Could not update the card of POI {}: {}", id, err);
            return self.send_card(session, &poi, now);
        }
        Ok(())
    }

    pub(super) fn show_random(&mut self, session: &mut UserSession, now: Timestamp) -> Result<()> {
        match usecases::get_random_poi(&self.connections.shared()?)? {
            Some(poi) => self.send_card(session, &poi, now),
            None => {
                self.send(session.info.id, "There are no places yet.", None)?;
                Ok(())
            }
        }
    }

    pub(super) fn show_recent(&mut self, session: &mut UserSession) -> Result<()> {
        let pois = usecases::get_last_pois(&self.connections.shared()?, RECENT_COUNT)?;
        self.send_poi_links(session.info.id, "Recently added:", &pois)
    }

    /// A plain list with one button per POI, in the given order.
    pub(super) fn send_poi_links(&self, to: UserId, title: &str, pois: &[Poi]) -> Result<()> {
        if pois.is_empty() {
            self.send(to, "Nothing here.", None)?;
            return Ok(());
        }
        let page = paginate(pois.to_vec(), true);
        let buttons = page
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, poi)| poi.id.map(|id| button((i + 1).to_string(), Callback::Poi(id))))
            .collect();
        let text = format!("{title}\n{}", render::poi_list(&page));
        self.send(to, &text, Some(&Controls::grid(buttons, LIST_WIDTH)))?;
        Ok(())
    }
}

pub(super) fn card_controls(poi: &Poi, user: &UserInfo, starred: bool) -> Controls {
    let Some(id) = poi.id else {
        return Controls::default();
    };
    let star = if starred { "Unstar" } else { "Star" };
    let mut controls = Controls::default().row(vec![
        button("Map", Callback::Location(id)),
        button(star, Callback::Star(id)),
        button("Edit", Callback::EditPoi(id)),
    ]);
    if user.is_moderator() {
        let mut row = vec![];
        if poi.needs_check {
            row.push(button("Looks good", Callback::Validate(id)));
        }
        if poi.is_deleted() {
            row.push(button("Restore", Callback::Restore(id)));
        } else {
            row.push(button("Delete", Callback::Delete(id)));
        }
        controls = controls.row(row);
    }
    controls
}
