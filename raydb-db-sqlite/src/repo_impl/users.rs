use super::*;

impl_for_connections! {
impl FileIdRepo {
    fn store_file_id(&self, path: &str, size: u64, file_id: &str) -> Result<()> {
        store_file_id(&mut self.conn.borrow_mut(), path, size, file_id)
    }
    fn find_file_ids(&self, paths: &HashMap<String, u64>) -> Result<HashMap<String, String>> {
        find_file_ids(&mut self.conn.borrow_mut(), paths)
    }
    fn find_path_for_file_id(&self, file_id: &str) -> Result<Option<String>> {
        find_path_for_file_id(&mut self.conn.borrow_mut(), file_id)
    }
}
}

impl_for_connections! {
impl StarRepo {
    fn star_poi(&self, user: UserId, poi: PoiId) -> Result<()> {
        star_poi(&mut self.conn.borrow_mut(), user, poi)
    }
    fn unstar_poi(&self, user: UserId, poi: PoiId) -> Result<()> {
        unstar_poi(&mut self.conn.borrow_mut(), user, poi)
    }
    fn count_stars(&self, pois: &[PoiId]) -> Result<HashMap<PoiId, usize>> {
        count_stars(&mut self.conn.borrow_mut(), pois)
    }
    fn starred_by(&self, user: UserId, pois: &[PoiId]) -> Result<Vec<PoiId>> {
        starred_by(&mut self.conn.borrow_mut(), user, pois)
    }
}
}

///////////////////////////////////////////////////////////////////////
// Uploaded files
///////////////////////////////////////////////////////////////////////

fn store_file_id(conn: &mut SqliteConnection, path: &str, size: u64, file_id: &str) -> Result<()> {
    let size = i64::try_from(size).map_err(|_| anyhow!("File {path} is too large"))?;
    diesel::insert_or_ignore_into(schema::file_ids::table)
        .values(&models::FileId {
            path: path.to_string(),
            size,
            file_id: file_id.to_string(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn find_file_ids(
    conn: &mut SqliteConnection,
    paths: &HashMap<String, u64>,
) -> Result<HashMap<String, String>> {
    use schema::file_ids::dsl;
    if paths.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(schema::file_ids::table
        .filter(dsl::path.eq_any(paths.keys()))
        .load::<models::FileId>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .filter(|row| {
            paths
                .get(&row.path)
                .is_some_and(|size| i64::try_from(*size).ok() == Some(row.size))
        })
        .map(|models::FileId { path, file_id, .. }| (path, file_id))
        .collect())
}

fn find_path_for_file_id(conn: &mut SqliteConnection, file_id: &str) -> Result<Option<String>> {
    use schema::file_ids::dsl;
    schema::file_ids::table
        .select(dsl::path)
        .filter(dsl::file_id.eq(file_id))
        .first::<String>(conn)
        .optional()
        .map_err(from_diesel_err)
}

///////////////////////////////////////////////////////////////////////
// Stars
///////////////////////////////////////////////////////////////////////

fn star_poi(conn: &mut SqliteConnection, user: UserId, poi: PoiId) -> Result<()> {
    diesel::insert_or_ignore_into(schema::stars::table)
        .values(&models::Star {
            user_id: user.into(),
            poi_id: poi.into(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn unstar_poi(conn: &mut SqliteConnection, user: UserId, poi: PoiId) -> Result<()> {
    use schema::stars::dsl;
    diesel::delete(
        schema::stars::table
            .filter(dsl::user_id.eq(user.to_inner()))
            .filter(dsl::poi_id.eq(poi.to_inner())),
    )
    .execute(conn)
    .map_err(from_diesel_err)?;
    Ok(())
}

fn count_stars(conn: &mut SqliteConnection, pois: &[PoiId]) -> Result<HashMap<PoiId, usize>> {
    use schema::stars::dsl;
    if pois.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(schema::stars::table
        .filter(dsl::poi_id.eq_any(pois.iter().copied().map(i64::from)))
        .group_by(dsl::poi_id)
        .select((dsl::poi_id, diesel::dsl::count_star()))
        .load::<(i64, i64)>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(|(poi, count)| (PoiId::new(poi), count as usize))
        .collect())
}

fn starred_by(conn: &mut SqliteConnection, user: UserId, pois: &[PoiId]) -> Result<Vec<PoiId>> {
    use schema::stars::dsl;
    if pois.is_empty() {
        return Ok(vec![]);
    }
    Ok(schema::stars::table
        .select(dsl::poi_id)
        .filter(dsl::user_id.eq(user.to_inner()))
        .filter(dsl::poi_id.eq_any(pois.iter().copied().map(i64::from)))
        .load::<i64>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(PoiId::new)
        .collect())
}
