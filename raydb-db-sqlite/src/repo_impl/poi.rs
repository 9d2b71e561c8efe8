use super::*;
use diesel::{dsl::sql, sql_types::BigInt};

impl_for_connections! {
impl PoiRepo {
    fn get_poi_by_id(&self, id: PoiId) -> Result<Poi> {
        get_poi_by_id(&mut self.conn.borrow_mut(), id)
    }
    fn get_poi_by_key(&self, key: &str) -> Result<Poi> {
        get_poi_by_key(&mut self.conn.borrow_mut(), key)
    }
    fn get_poi_by_ids(&self, ids: &[PoiId]) -> Result<Vec<Poi>> {
        get_poi_by_ids(&mut self.conn.borrow_mut(), ids)
    }
    fn get_poi_by_house(&self, house: &str, floor: Option<&FloorFilter>) -> Result<Vec<Poi>> {
        get_poi_by_house(&mut self.conn.borrow_mut(), house, floor)
    }
    fn get_poi_by_tag(&self, tag: &str) -> Result<Vec<Poi>> {
        get_poi_by_tag(&mut self.conn.borrow_mut(), tag)
    }
    fn get_entrances(&self, house: &str) -> Result<Vec<String>> {
        get_entrances(&mut self.conn.borrow_mut(), house)
    }
    fn get_houses(&self) -> Result<Vec<Poi>> {
        get_houses(&mut self.conn.borrow_mut())
    }
    fn get_poi_around(
        &self,
        location: Location,
        count: usize,
        floor: Option<&FloorFilter>,
    ) -> Result<Vec<Poi>> {
        get_poi_around(&mut self.conn.borrow_mut(), location, count, floor)
    }
    fn all_pois(&self) -> Result<Vec<Poi>> {
        all_pois(&mut self.conn.borrow_mut())
    }
    fn all_indexable_pois(&self) -> Result<Vec<Poi>> {
        all_indexable_pois(&mut self.conn.borrow_mut())
    }
    fn count_pois(&self) -> Result<PoiStats> {
        count_pois(&mut self.conn.borrow_mut())
    }
    fn insert_poi(&self, poi: &Poi) -> Result<PoiId> {
        insert_poi(&mut self.conn.borrow_mut(), poi)
    }
    fn update_poi(&self, poi: &Poi) -> Result<()> {
        update_poi(&mut self.conn.borrow_mut(), poi)
    }
    fn set_poi_updated(&self, id: PoiId, updated: Option<Timestamp>) -> Result<Option<Timestamp>> {
        set_poi_updated(&mut self.conn.borrow_mut(), id, updated)
    }
    fn set_needs_check(&self, id: PoiId, needs_check: bool) -> Result<()> {
        set_needs_check(&mut self.conn.borrow_mut(), id, needs_check)
    }
    fn delete_poi(&self, id: PoiId, reason: &str) -> Result<()> {
        set_delete_reason(&mut self.conn.borrow_mut(), id, Some(reason))
    }
    fn restore_poi(&self, id: PoiId) -> Result<()> {
        set_delete_reason(&mut self.conn.borrow_mut(), id, None)
    }
    fn purge_poi(&self, id: PoiId) -> Result<()> {
        purge_poi(&mut self.conn.borrow_mut(), id)
    }
    fn purge_all_pois(&self) -> Result<usize> {
        purge_all_pois(&mut self.conn.borrow_mut())
    }
    fn get_next_unchecked(&self) -> Result<Option<Poi>> {
        get_next_unchecked(&mut self.conn.borrow_mut())
    }
    fn get_last_pois(&self, count: usize) -> Result<Vec<Poi>> {
        get_last_pois(&mut self.conn.borrow_mut(), count)
    }
    fn get_last_deleted(&self, count: usize) -> Result<Vec<Poi>> {
        get_last_deleted(&mut self.conn.borrow_mut(), count)
    }
    fn get_random_pois(&self, count: usize) -> Result<Vec<Poi>> {
        get_random_pois(&mut self.conn.borrow_mut(), count)
    }
}
}

/// Resolves the labels of the referenced buildings.
fn load_pois(conn: &mut SqliteConnection, rows: Vec<models::Poi>) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let mut houses: Vec<&str> = rows.iter().filter_map(|r| r.house.as_deref()).collect();
    houses.sort_unstable();
    houses.dedup();
    let house_names: HashMap<String, String> = if houses.is_empty() {
        HashMap::new()
    } else {
        schema::poi::table
            .select((dsl::str_id, dsl::name))
            .filter(dsl::str_id.eq_any(houses))
            .load::<(Option<String>, String)>(conn)
            .map_err(from_diesel_err)?
            .into_iter()
            .filter_map(|(key, name)| key.map(|key| (key, name)))
            .collect()
    };
    rows.into_iter()
        .map(|row| {
            let house_name = row
                .house
                .as_ref()
                .and_then(|house| house_names.get(house))
                .cloned();
            load_poi(row, house_name)
        })
        .collect()
}

fn load_one(conn: &mut SqliteConnection, row: models::Poi) -> Result<Poi> {
    load_pois(conn, vec![row])?
        .pop()
        .ok_or(repo::Error::NotFound)
}

fn get_poi_by_id(conn: &mut SqliteConnection, id: PoiId) -> Result<Poi> {
    let row = schema::poi::table
        .find(i64::from(id))
        .select(models::Poi::as_select())
        .first(conn)
        .map_err(from_diesel_err)?;
    load_one(conn, row)
}

fn get_poi_by_key(conn: &mut SqliteConnection, key: &str) -> Result<Poi> {
    use schema::poi::dsl;
    let row = schema::poi::table
        .filter(dsl::str_id.eq(key))
        .select(models::Poi::as_select())
        .first(conn)
        .map_err(from_diesel_err)?;
    load_one(conn, row)
}

fn get_poi_by_ids(conn: &mut SqliteConnection, ids: &[PoiId]) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let rows = schema::poi::table
        .filter(dsl::id.eq_any(ids.iter().copied().map(i64::from)))
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    let mut pois: HashMap<PoiId, Poi> = load_pois(conn, rows)?
        .into_iter()
        .filter_map(|poi| poi.id.map(|id| (id, poi)))
        .collect();
    Ok(ids.iter().filter_map(|id| pois.remove(id)).collect())
}

fn get_poi_by_house(
    conn: &mut SqliteConnection,
    house: &str,
    floor: Option<&FloorFilter>,
) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .filter(dsl::house.eq(house))
        .filter(dsl::delete_reason.is_null())
        .filter(dsl::in_index.eq(true))
        .filter(
            dsl::tag
                .is_null()
                .or(dsl::tag.ne_all([TAG_BUILDING, TAG_ENTRANCE])),
        )
        .order_by(dsl::id)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    Ok(load_pois(conn, rows)?
        .into_iter()
        .filter(|p| floor.map_or(true, |f| f.matches(p.floor.as_deref())))
        .collect())
}

fn get_poi_by_tag(conn: &mut SqliteConnection, tag: &str) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .filter(dsl::tag.eq(tag))
        .filter(dsl::delete_reason.is_null())
        .order_by(dsl::id)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    load_pois(conn, rows)
}

fn get_entrances(conn: &mut SqliteConnection, house: &str) -> Result<Vec<String>> {
    use schema::poi::dsl;
    Ok(schema::poi::table
        .select(dsl::str_id)
        .filter(dsl::tag.eq(TAG_ENTRANCE))
        .filter(dsl::house.eq(house))
        .filter(dsl::delete_reason.is_null())
        .order_by(dsl::id)
        .load::<Option<String>>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .flatten()
        .collect())
}

fn get_houses(conn: &mut SqliteConnection) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .filter(dsl::tag.eq(TAG_BUILDING))
        .filter(dsl::str_id.is_not_null())
        .filter(dsl::delete_reason.is_null())
        .order_by(dsl::id)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    load_pois(conn, rows)
}

fn get_poi_around(
    conn: &mut SqliteConnection,
    location: Location,
    count: usize,
    floor: Option<&FloorFilter>,
) -> Result<Vec<Poi>> {
    let mut pois: Vec<_> = all_indexable_pois(conn)?
        .into_iter()
        .filter(|p| floor.map_or(true, |f| f.matches(p.floor.as_deref())))
        .collect();
    pois.sort_by(|a, b| {
        location
            .distance(&a.location)
            .to_meters()
            .total_cmp(&location.distance(&b.location).to_meters())
    });
    pois.truncate(count);
    Ok(pois)
}

fn all_pois(conn: &mut SqliteConnection) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .order_by(dsl::id)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    load_pois(conn, rows)
}

fn all_indexable_pois(conn: &mut SqliteConnection) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .filter(dsl::delete_reason.is_null())
        .filter(dsl::in_index.eq(true))
        .filter(
            dsl::tag
                .is_null()
                .or(dsl::tag.ne_all([TAG_BUILDING, TAG_ENTRANCE])),
        )
        .order_by(dsl::id)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    load_pois(conn, rows)
}

fn count_pois(conn: &mut SqliteConnection) -> Result<PoiStats> {
    use schema::poi::dsl;
    let count_tag = |conn: &mut SqliteConnection, tag: &str| -> Result<usize> {
        Ok(schema::poi::table
            .filter(dsl::tag.eq(tag))
            .filter(dsl::delete_reason.is_null())
            .count()
            .get_result::<i64>(conn)
            .map_err(from_diesel_err)? as usize)
    };
    let buildings = count_tag(conn, TAG_BUILDING)?;
    let entrances = count_tag(conn, TAG_ENTRANCE)?;
    let pois = schema::poi::table
        .filter(dsl::delete_reason.is_null())
        .filter(
            dsl::tag
                .is_null()
                .or(dsl::tag.ne_all([TAG_BUILDING, TAG_ENTRANCE])),
        )
        .count()
        .get_result::<i64>(conn)
        .map_err(from_diesel_err)? as usize;
    Ok(PoiStats {
        buildings,
        entrances,
        pois,
    })
}

fn insert_poi(conn: &mut SqliteConnection, poi: &Poi) -> Result<PoiId> {
    let created = poi.created.unwrap_or_else(Timestamp::now);
    let updated = poi.updated.or(Some(created));
    diesel::insert_into(schema::poi::table)
        .values(&new_poi(poi.id.map(i64::from), poi, created, updated))
        .execute(conn)
        .map_err(from_diesel_err)?;
    let id = match poi.id {
        Some(id) => id,
        None => diesel::select(sql::<BigInt>("last_insert_rowid()"))
            .get_result::<i64>(conn)
            .map(PoiId::new)
            .map_err(from_diesel_err)?,
    };
    Ok(id)
}

fn update_poi(conn: &mut SqliteConnection, poi: &Poi) -> Result<()> {
    use schema::poi::dsl;
    let id = poi.id.map(i64::from).ok_or(repo::Error::NotFound)?;
    let created = schema::poi::table
        .find(id)
        .select(dsl::created)
        .first::<i64>(conn)
        .map_err(from_diesel_err)?;
    let changeset = new_poi(
        Some(id),
        poi,
        timestamp_from_db(created),
        Some(Timestamp::now()),
    );
    diesel::update(schema::poi::table.find(id))
        .set(&changeset)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn set_poi_updated(
    conn: &mut SqliteConnection,
    id: PoiId,
    updated: Option<Timestamp>,
) -> Result<Option<Timestamp>> {
    use schema::poi::dsl;
    let id = i64::from(id);
    let previous = schema::poi::table
        .find(id)
        .select(dsl::updated)
        .first::<Option<i64>>(conn)
        .map_err(from_diesel_err)?;
    diesel::update(schema::poi::table.find(id))
        .set(dsl::updated.eq(updated.map(timestamp_into_db)))
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(previous.map(timestamp_from_db))
}

fn set_needs_check(conn: &mut SqliteConnection, id: PoiId, needs_check: bool) -> Result<()> {
    use schema::poi::dsl;
    let count = diesel::update(schema::poi::table.find(i64::from(id)))
        .set(dsl::needs_check.eq(needs_check))
        .execute(conn)
        .map_err(from_diesel_err)?;
    if count == 0 {
        return Err(repo::Error::NotFound);
    }
    Ok(())
}

fn set_delete_reason(conn: &mut SqliteConnection, id: PoiId, reason: Option<&str>) -> Result<()> {
    use schema::poi::dsl;
    let count = diesel::update(schema::poi::table.find(i64::from(id)))
        .set((
            dsl::delete_reason.eq(reason),
            dsl::updated.eq(Some(timestamp_into_db(Timestamp::now()))),
        ))
        .execute(conn)
        .map_err(from_diesel_err)?;
    if count == 0 {
        return Err(repo::Error::NotFound);
    }
    Ok(())
}

/// Pending changes and stars of the POI go with it.
fn purge_poi(conn: &mut SqliteConnection, id: PoiId) -> Result<()> {
    let id = i64::from(id);
    let count = diesel::delete(schema::poi::table.find(id))
        .execute(conn)
        .map_err(from_diesel_err)?;
    if count == 0 {
        return Err(repo::Error::NotFound);
    }
    diesel::delete(schema::poi_queue::table.filter(schema::poi_queue::dsl::poi_id.eq(id)))
        .execute(conn)
        .map_err(from_diesel_err)?;
    diesel::delete(schema::stars::table.filter(schema::stars::dsl::poi_id.eq(id)))
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn purge_all_pois(conn: &mut SqliteConnection) -> Result<usize> {
    diesel::delete(schema::poi_queue::table)
        .execute(conn)
        .map_err(from_diesel_err)?;
    diesel::delete(schema::stars::table)
        .execute(conn)
        .map_err(from_diesel_err)?;
    diesel::delete(schema::poi::table)
        .execute(conn)
        .map_err(from_diesel_err)
}

fn get_next_unchecked(conn: &mut SqliteConnection) -> Result<Option<Poi>> {
    use schema::poi::dsl;
    let row = schema::poi::table
        .filter(dsl::needs_check.eq(true))
        .filter(dsl::delete_reason.is_null())
        .order_by((dsl::created, dsl::id))
        .select(models::Poi::as_select())
        .first(conn)
        .optional()
        .map_err(from_diesel_err)?;
    row.map(|row| load_one(conn, row)).transpose()
}

fn get_last_pois(conn: &mut SqliteConnection, count: usize) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .filter(dsl::delete_reason.is_null())
        .order_by((dsl::created.desc(), dsl::id.desc()))
        .limit(count as i64)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    load_pois(conn, rows)
}

fn get_last_deleted(conn: &mut SqliteConnection, count: usize) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .filter(dsl::delete_reason.is_not_null())
        .order_by((dsl::updated.desc(), dsl::id.desc()))
        .limit(count as i64)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    load_pois(conn, rows)
}

fn get_random_pois(conn: &mut SqliteConnection, count: usize) -> Result<Vec<Poi>> {
    use schema::poi::dsl;
    let rows = schema::poi::table
        .filter(dsl::delete_reason.is_null())
        .filter(
            dsl::tag
                .is_null()
                .or(dsl::tag.ne_all([TAG_BUILDING, TAG_ENTRANCE])),
        )
        .order(sql::<diesel::sql_types::Integer>("RANDOM()"))
        .limit(count as i64)
        .select(models::Poi::as_select())
        .load(conn)
        .map_err(from_diesel_err)?;
    load_pois(conn, rows)
}
