use std::{collections::HashMap, str::FromStr};

use anyhow::anyhow;
use diesel::{
    self,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};

use raydb_core::{
    entities::*,
    fields,
    repositories::{self as repo, *},
    review::FloorFilter,
};

use super::*;

/// Implements a repository trait for every kind of connection
/// by delegating to the free functions of the module.
macro_rules! impl_for_connections {
    (impl $repo:ident { $($body:tt)* }) => {
        impl $repo for crate::DbReadOnly<'_> {
            $($body)*
        }
        impl $repo for crate::DbReadWrite<'_> {
            $($body)*
        }
        impl $repo for crate::DbConnection<'_> {
            $($body)*
        }
    };
}

mod moderation;
mod poi;
mod roles;
mod users;

type Result<T> = std::result::Result<T, repo::Error>;

pub fn from_diesel_err(err: DieselError) -> repo::Error {
    match err {
        DieselError::NotFound => repo::Error::NotFound,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            repo::Error::AlreadyExists
        }
        _ => repo::Error::Other(err.into()),
    }
}


fn tri_state_from_db(v: Option<i16>) -> TriState {
    v.map(|v| v != 0).into()
}

fn tri_state_into_db(v: TriState) -> Option<i16> {
    Option::<bool>::from(v).map(i16::from)
}

fn timestamp_into_db(ts: Timestamp) -> i64 {
    ts.as_secs()
}

fn timestamp_from_db(secs: i64) -> Timestamp {
    Timestamp::from_secs(secs)
}

fn load_poi(from: models::Poi, house_name: Option<String>) -> Result<Poi> {
    let models::Poi {
        id,
        str_id,
        name,
        lon,
        lat,
        keywords,
        tag,
        description,
        comment,
        address,
        house,
        floor,
        phones,
        links,
        has_wifi,
        accepts_cards,
        hours,
        needs_check,
        in_index,
        delete_reason,
        photo_out,
        photo_in,
        created,
        updated,
    } = from;
    let location = Location::try_new(lon, lat)
        .map_err(|err| anyhow!("Invalid location of POI {id}: {err}"))?;
    let links = links
        .map(|json| {
            fields::links_from_json(&json).unwrap_or_else(|| {
                // This should never happen if links are only written by us
                log::warn!("Ignoring malformed links of POI {id}: {json}");
                vec![]
            })
        })
        .unwrap_or_default();
    Ok(Poi {
        id: Some(PoiId::new(id)),
        key: str_id,
        name,
        location,
        keywords,
        tag,
        description,
        comment,
        address_part: address,
        house,
        house_name,
        floor,
        phones: phones
            .as_deref()
            .map(fields::phones_from_text)
            .unwrap_or_default(),
        links,
        has_wifi: tri_state_from_db(has_wifi),
        accepts_cards: tri_state_from_db(accepts_cards),
        hours: hours.map(OpeningHours::parse),
        needs_check,
        in_index,
        delete_reason,
        photo_out,
        photo_in,
        created: Some(timestamp_from_db(created)),
        updated: updated.map(timestamp_from_db),
    })
}

fn new_poi(
    id: Option<i64>,
    poi: &Poi,
    created: Timestamp,
    updated: Option<Timestamp>,
) -> models::NewPoi<'_> {
    models::NewPoi {
        id,
        str_id: poi.key.as_deref(),
        name: &poi.name,
        lon: poi.location.lon,
        lat: poi.location.lat,
        keywords: &poi.keywords,
        tag: poi.tag.as_deref(),
        description: poi.description.as_deref(),
        comment: poi.comment.as_deref(),
        address: poi.address_part.as_deref(),
        house: poi.house.as_deref(),
        floor: poi.floor.as_deref(),
        phones: fields::phones_to_text(&poi.phones),
        links: fields::links_to_json(&poi.links),
        has_wifi: tri_state_into_db(poi.has_wifi),
        accepts_cards: tri_state_into_db(poi.accepts_cards),
        hours: poi.hours.as_ref().map(OpeningHours::as_str),
        needs_check: poi.needs_check,
        in_index: poi.in_index,
        delete_reason: poi.delete_reason.as_deref(),
        photo_out: poi.photo_out.as_deref(),
        photo_in: poi.photo_in.as_deref(),
        created: timestamp_into_db(created),
        updated: updated.map(timestamp_into_db),
    }
}
