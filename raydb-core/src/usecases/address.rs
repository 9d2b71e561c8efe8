use super::prelude::*;
use crate::{
    address::{AddressContext, AddressMatch, AddressResolver},
    text::split_raw_tokens,
};

/// Buildings offered when a POI gets assigned to a house.
pub const NEAREST_HOUSES: usize = 3;

pub fn resolve_address<R: PoiRepo>(
    repo: &R,
    config: &AddressConfig,
    tokens: &[String],
) -> Result<Option<AddressMatch>> {
    let resolver = AddressResolver::new(config);
    Ok(resolver.resolve(tokens, |building| repo.get_entrances(building))?)
}

/// Interprets a follow-up message within an ongoing address dialogue.
///
/// Street names and house numbers are matched against the raw tokens,
/// because skip words and synonyms must not swallow a house number.
pub fn continue_address<R: PoiRepo>(
    repo: &R,
    config: &AddressConfig,
    context: &AddressContext,
    text: &str,
) -> Result<Option<AddressMatch>> {
    let resolver = AddressResolver::new(config);
    let entrances_of = |building: &str| repo.get_entrances(building);
    let found = match context {
        AddressContext::Street(street) => {
            resolver.continue_street(street, &split_raw_tokens(text), entrances_of)?
        }
        AddressContext::House(building) => {
            resolver.continue_house(building, text, entrances_of)?
        }
    };
    Ok(found)
}

/// The POI that answers an address query, if any.
pub fn address_card<R: PoiRepo>(repo: &R, found: &AddressMatch) -> Result<Option<Poi>> {
    match found.card_key() {
        Some(key) => super::get_poi_by_key(repo, key),
        None => Ok(None),
    }
}

pub fn nearest_houses<R: PoiRepo>(repo: &R, location: Location) -> Result<Vec<Poi>> {
    let mut houses = repo.get_houses()?;
    houses.sort_by(|a, b| {
        location
            .distance(&a.location)
            .to_meters()
            .total_cmp(&location.distance(&b.location).to_meters())
    });
    houses.truncate(NEAREST_HOUSES);
    Ok(houses)
}
