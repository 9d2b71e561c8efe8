//! Plain text rendering of replies.

use std::fmt::Write;

use raydb_core::{
    address::AddressMatch,
    edit::{AttrKind, AttrValue, EditSession},
    entities::*,
    pagination::Page,
    ranking::is_closed,
    review::{ChecklistEntry, MissingField},
    usecases::Stats,
};
use strum::IntoEnumIterator;
use time::PrimitiveDateTime;

pub const HELP: &str = "Send a name or a keyword to search, or an address like `main 6 25`.\n\
/new adds a place, /random shows one, /stats counts them.\n\
Moderators: /queue, /unchecked, /review [house] [floor], /audit, /deleted, /recent.";

fn tri_state(label: &str, value: TriState) -> Option<String> {
    match value {
        TriState::Unknown => None,
        TriState::Yes => Some(format!("{label}: yes")),
        TriState::No => Some(format!("{label}: no")),
    }
}

pub fn poi_card(poi: &Poi, now: PrimitiveDateTime, stars: usize, moderator: bool) -> String {
    let mut lines = vec![poi.name.clone()];
    if let Some(reason) = &poi.delete_reason {
        lines.push(format!("Deleted: {reason}"));
    }
    lines.extend(poi.description.clone());
    if let Some(address) = poi.address() {
        lines.push(address);
    }
    if let Some(floor) = &poi.floor {
        lines.push(format!("Floor {floor}"));
    }
    if let Some(hours) = &poi.hours {
        let state = if is_closed(poi, now) { " (closed now)" } else { "" };
        lines.push(format!("Hours: {hours}{state}"));
    }
    if !poi.phones.is_empty() {
        lines.push(format!("Phone: {}", poi.phones.join(", ")));
    }
    for link in &poi.links {
        lines.push(format!("{}: {}", link.title, link.url));
    }
    lines.extend(tri_state("Wi-Fi", poi.has_wifi));
    lines.extend(tri_state("Cards", poi.accepts_cards));
    if stars > 0 {
        lines.push(format!("Stars: {stars}"));
    }
    if moderator {
        lines.push(format!("Keywords: {}", poi.keywords));
        if let Some(comment) = &poi.comment {
            lines.push(format!("Comment: {comment}"));
        }
        if poi.needs_check {
            lines.push("Not checked yet".to_string());
        }
    }
    lines.join("\n")
}

/// One numbered line per POI.
pub fn poi_list(page: &Page<Poi>) -> String {
    let mut text = String::new();
    for (i, poi) in page.items.iter().enumerate() {
        let _ = write!(text, "{}. {}", i + 1, poi.name);
        if let Some(address) = poi.address() {
            let _ = write!(text, ", {address}");
        }
        text.push('\n');
    }
    if page.truncated && !page.show_all {
        let _ = write!(text, "... and {} more", page.total - page.items.len());
    }
    text.trim_end().to_string()
}

pub fn confirmation(session: &EditSession) -> String {
    let poi = &session.poi;
    let mut lines = vec![poi.name.clone()];
    for attr in AttrKind::iter() {
        lines.push(format!("{}: {}", attr_label(attr), AttrValue::of(poi, attr)));
    }
    for (label, photo) in [("Photo outside", &poi.photo_out), ("Photo inside", &poi.photo_in)] {
        if let Some(photo) = photo {
            lines.push(format!("{label}: {photo}"));
        }
    }
    lines.join("\n")
}

pub fn attr_label(attr: AttrKind) -> &'static str {
    match attr {
        AttrKind::Description => "Description",
        AttrKind::Keywords => "Keywords",
        AttrKind::Tag => "Tag",
        AttrKind::House => "House",
        AttrKind::Address => "Address",
        AttrKind::Floor => "Floor",
        AttrKind::Hours => "Hours",
        AttrKind::Location => "Location",
        AttrKind::Phones => "Phones",
        AttrKind::Wifi => "Wi-Fi",
        AttrKind::Cards => "Cards",
        AttrKind::Links => "Links",
        AttrKind::Comment => "Comment",
    }
}

pub fn attr_prompt(attr: AttrKind) -> &'static str {
    match attr {
        AttrKind::Keywords => "Send keywords to add.",
        AttrKind::Tag => "Send a tag like shop=bakery, or - to clear it.",
        AttrKind::House => "Choose the building.",
        AttrKind::Hours => "Send opening hours like `Mo-Fr 9-18, Sa 10-15`, or - to clear them.",
        AttrKind::Location => "Share the location or send `lat, lon`.",
        AttrKind::Phones => "Send phone numbers separated by `;`, or - to clear them.",
        AttrKind::Wifi | AttrKind::Cards => "Send yes, no or -.",
        AttrKind::Links => "Send `title url` to add a link, or a title alone to remove it.",
        AttrKind::Description | AttrKind::Address | AttrKind::Floor | AttrKind::Comment => {
            "Send the new value, or - to clear it."
        }
    }
}

fn missing_label(field: MissingField) -> &'static str {
    match field {
        MissingField::Phones => "phones",
        MissingField::Links => "links",
        MissingField::Address => "address",
        MissingField::Keywords => "keywords",
        MissingField::PhotoOut => "photo outside",
        MissingField::PhotoIn => "photo inside",
    }
}

fn flag(label: &str, value: Option<bool>) -> Option<String> {
    value.map(|v| format!("{label}{}", if v { "+" } else { "-" }))
}

pub fn checklist(entries: &[ChecklistEntry]) -> String {
    let mut text = String::new();
    for entry in entries {
        let mark = if entry.reviewed { "[x]" } else { "[ ]" };
        let mut parts = vec![format!("{mark} {}", entry.name)];
        parts.extend(flag("wifi", entry.wifi));
        parts.extend(flag("cards", entry.cards));
        parts.extend(entry.hours.clone());
        if !entry.missing.is_empty() {
            let missing: Vec<_> = entry.missing.iter().map(|m| missing_label(*m)).collect();
            parts.push(format!("no {}", missing.join(", ")));
        }
        let _ = writeln!(text, "{}", parts.join(" | "));
    }
    text.trim_end().to_string()
}

pub fn queue_entry(entry: &QueueEntry, poi_name: &str) -> String {
    let who = entry
        .submitter
        .user_name
        .clone()
        .unwrap_or_else(|| entry.submitter.user_id.to_string());
    match &entry.change {
        QueueChange::Message(text) => format!("{who} about {poi_name}: {text}"),
        QueueChange::Field {
            field,
            old_value,
            new_value,
        } => format!(
            "{who} changes {field} of {poi_name}\nfrom: {}\nto: {}",
            old_value.as_deref().unwrap_or("-"),
            new_value.as_deref().unwrap_or("-")
        ),
    }
}

pub fn audit_entry(entry: &AuditEntry) -> String {
    let when = entry
        .created_at
        .map(|t| t.to_string())
        .unwrap_or_default();
    let approver = entry
        .approver
        .map(|a| format!(" approved by {a}"))
        .unwrap_or_default();
    let change = match &entry.change {
        AuditChange::Created { .. } => "created".to_string(),
        AuditChange::Removed { .. } => "removed".to_string(),
        AuditChange::DeleteReason { new: Some(reason), .. } => format!("deleted: {reason}"),
        AuditChange::DeleteReason { new: None, .. } => "restored".to_string(),
        AuditChange::Field { field, new_value, .. } => {
            format!("{field} = {}", new_value.as_deref().unwrap_or("-"))
        }
    };
    format!(
        "{when} POI {} by {}{approver}: {change}",
        entry.poi_id, entry.submitter
    )
}

pub fn stats(stats: &Stats) -> String {
    format!(
        "{} places, {} buildings, {} entrances, {} changes waiting",
        stats.pois.pois, stats.pois.buildings, stats.pois.entrances, stats.queue
    )
}

pub fn address_match(found: &AddressMatch) -> String {
    match found {
        AddressMatch::Street(street) => format!("{}: which house?", street.name),
        AddressMatch::NoSuchHouse { street, house } => {
            format!("There is no house {house} on {street}.")
        }
        AddressMatch::Building { .. } => "Which apartment?".to_string(),
        AddressMatch::Apartment {
            apartment,
            entrance: Some(entrance),
            ..
        } => match entrance.floor {
            Some(floor) => format!("Apartment {apartment}: floor {floor}."),
            None => format!("Apartment {apartment}."),
        },
        AddressMatch::Apartment {
            apartment,
            entrance: None,
            ..
        } => format!("No entrance is known for apartment {apartment}."),
        AddressMatch::InvalidApartment { token, .. } => {
            format!("{token} is not an apartment number.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_core::pagination::paginate;
    use raydb_entities::builders::*;
    use time::macros::datetime;

    #[test]
    fn card_shows_closed_state() {
        let poi = Poi::build()
            .name("Bakery")
            .hours("Mo-Fr 08:00-20:00")
            .phones(vec!["+7 123"])
            .wifi(Some(true))
            .finish();
        // 2024-03-10 is a Sunday
        let text = poi_card(&poi, datetime!(2024-03-10 12:00), 3, false);
        assert_eq!(
            "Bakery\nHours: Mo-Fr 08:00-20:00 (closed now)\nPhone: +7 123\nWi-Fi: yes\nStars: 3",
            text
        );
        let text = poi_card(&poi, datetime!(2024-03-11 12:00), 0, true);
        assert!(text.contains("Hours: Mo-Fr 08:00-20:00\n"));
        assert!(text.contains("Keywords:"));
    }

    #[test]
    fn numbered_list() {
        let pois: Vec<_> = (1..=3)
            .map(|i| Poi::build().name(&format!("Shop {i}")).finish())
            .collect();
        assert_eq!("1. Shop 1\n2. Shop 2\n3. Shop 3", poi_list(&paginate(pois, false)));
    }

    #[test]
    fn checklist_lines() {
        let poi = Poi::build()
            .name("Cafe")
            .keywords("coffee")
            .wifi(Some(false))
            .link("site", "https://cafe.example")
            .finish();
        let entry = ChecklistEntry::new(&poi, Timestamp::now());
        assert_eq!(
            "[ ] Cafe | wifi- | no phones, address, photo outside, photo inside",
            checklist(&[entry])
        );
    }

    #[test]
    fn every_attribute_on_the_confirmation_card() {
        let session = EditSession::edit(Poi::build().name("Cafe").finish());
        let text = confirmation(&session);
        assert_eq!(1 + AttrKind::iter().count(), text.lines().count());
        assert!(text.contains("Wi-Fi: unknown"));
    }
}
