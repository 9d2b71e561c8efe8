use super::*;

impl_for_connections! {
impl QueueRepo {
    fn add_queue_entries(&self, entries: &[NewQueueEntry]) -> Result<usize> {
        add_queue_entries(&mut self.conn.borrow_mut(), entries)
    }
    fn get_queue(&self, count: usize) -> Result<Vec<QueueEntry>> {
        get_queue(&mut self.conn.borrow_mut(), count)
    }
    fn get_queue_msg(&self, id: QueueId) -> Result<QueueEntry> {
        get_queue_msg(&mut self.conn.borrow_mut(), id)
    }
    fn delete_queue(&self, id: QueueId) -> Result<()> {
        delete_queue(&mut self.conn.borrow_mut(), id)
    }
    fn count_queue(&self) -> Result<usize> {
        count_queue(&mut self.conn.borrow_mut())
    }
}
}

impl_for_connections! {
impl AuditRepo {
    fn add_audit_entries(&self, entries: &[AuditEntry]) -> Result<()> {
        add_audit_entries(&mut self.conn.borrow_mut(), entries)
    }
    fn get_last_audit(&self, count: usize) -> Result<Vec<AuditEntry>> {
        get_last_audit(&mut self.conn.borrow_mut(), count)
    }
    fn get_audit_of_poi(&self, id: PoiId) -> Result<Vec<AuditEntry>> {
        get_audit_of_poi(&mut self.conn.borrow_mut(), id)
    }
}
}

///////////////////////////////////////////////////////////////////////
// Queue
///////////////////////////////////////////////////////////////////////

fn queue_columns(change: &QueueChange) -> (&str, Option<&str>, Option<&str>) {
    match change {
        QueueChange::Field {
            field,
            old_value,
            new_value,
        } => (field.as_ref(), old_value.as_deref(), new_value.as_deref()),
        QueueChange::Message(text) => (QueueChange::MESSAGE_FIELD, None, Some(text.as_str())),
    }
}

fn load_queue_entry(from: models::QueueEntry) -> Result<QueueEntry> {
    let models::QueueEntry {
        id,
        user_id,
        user_name,
        poi_id,
        field,
        old_value,
        new_value,
        ts,
    } = from;
    let change = if field == QueueChange::MESSAGE_FIELD {
        QueueChange::Message(new_value.unwrap_or_default())
    } else {
        QueueChange::Field {
            field: PoiField::from_str(&field)
                .map_err(|_| anyhow!("Invalid field of queue entry {id}: {field}"))?,
            old_value,
            new_value,
        }
    };
    Ok(QueueEntry {
        id: QueueId::new(id),
        submitter: Submitter {
            user_id: UserId::new(user_id),
            user_name,
        },
        created_at: timestamp_from_db(ts),
        poi_id: PoiId::new(poi_id),
        change,
    })
}

fn add_queue_entries(conn: &mut SqliteConnection, entries: &[NewQueueEntry]) -> Result<usize> {
    let ts = timestamp_into_db(Timestamp::now());
    let rows: Vec<_> = entries
        .iter()
        .map(|entry| {
            let (field, old_value, new_value) = queue_columns(&entry.change);
            models::NewQueueEntry {
                user_id: entry.submitter.user_id.into(),
                user_name: entry.submitter.user_name.as_deref(),
                poi_id: entry.poi_id.into(),
                field,
                old_value,
                new_value,
                ts,
            }
        })
        .collect();
    diesel::insert_into(schema::poi_queue::table)
        .values(&rows)
        .execute(conn)
        .map_err(from_diesel_err)
}

fn get_queue(conn: &mut SqliteConnection, count: usize) -> Result<Vec<QueueEntry>> {
    use schema::poi_queue::dsl;
    schema::poi_queue::table
        .order_by((dsl::ts.desc(), dsl::id.desc()))
        .limit(count as i64)
        .load::<models::QueueEntry>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(load_queue_entry)
        .collect()
}

fn get_queue_msg(conn: &mut SqliteConnection, id: QueueId) -> Result<QueueEntry> {
    schema::poi_queue::table
        .find(id.to_inner())
        .first::<models::QueueEntry>(conn)
        .map_err(from_diesel_err)
        .and_then(load_queue_entry)
}

fn delete_queue(conn: &mut SqliteConnection, id: QueueId) -> Result<()> {
    diesel::delete(schema::poi_queue::table.find(id.to_inner()))
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn count_queue(conn: &mut SqliteConnection) -> Result<usize> {
    Ok(schema::poi_queue::table
        .count()
        .get_result::<i64>(conn)
        .map_err(from_diesel_err)? as usize)
}

///////////////////////////////////////////////////////////////////////
// Audit
///////////////////////////////////////////////////////////////////////

// Snapshots of created POIs only have a new value,
// those of removed POIs only an old one.
fn audit_columns(change: &AuditChange) -> (Option<&str>, Option<&str>) {
    match change {
        AuditChange::Created { snapshot } => (None, Some(snapshot.as_str())),
        AuditChange::Removed { snapshot } => (Some(snapshot.as_str()), None),
        AuditChange::DeleteReason { old, new } => (old.as_deref(), new.as_deref()),
        AuditChange::Field {
            old_value,
            new_value,
            ..
        } => (old_value.as_deref(), new_value.as_deref()),
    }
}

fn load_audit_entry(from: models::AuditEntry) -> Result<AuditEntry> {
    let models::AuditEntry {
        id,
        user_id,
        approved_by,
        poi_id,
        field,
        old_value,
        new_value,
        ts,
    } = from;
    let change = match field.as_str() {
        AuditChange::POI_FIELD => match (old_value, new_value) {
            (None, Some(snapshot)) => AuditChange::Created { snapshot },
            (Some(snapshot), None) => AuditChange::Removed { snapshot },
            _ => return Err(anyhow!("Invalid snapshot in audit entry {id}").into()),
        },
        AuditChange::DELETE_REASON_FIELD => AuditChange::DeleteReason {
            old: old_value,
            new: new_value,
        },
        name => AuditChange::Field {
            field: PoiField::from_str(name)
                .map_err(|_| anyhow!("Invalid field of audit entry {id}: {name}"))?,
            old_value,
            new_value,
        },
    };
    Ok(AuditEntry {
        submitter: UserId::new(user_id),
        approver: approved_by.map(UserId::new),
        poi_id: PoiId::new(poi_id),
        change,
        created_at: Some(timestamp_from_db(ts)),
    })
}

fn add_audit_entries(conn: &mut SqliteConnection, entries: &[AuditEntry]) -> Result<()> {
    let now = Timestamp::now();
    let rows: Vec<_> = entries
        .iter()
        .map(|entry| {
            let (old_value, new_value) = audit_columns(&entry.change);
            models::NewAuditEntry {
                user_id: entry.submitter.into(),
                approved_by: entry.approver.map(i64::from),
                poi_id: entry.poi_id.into(),
                field: entry.change.field_name(),
                old_value,
                new_value,
                ts: timestamp_into_db(entry.created_at.unwrap_or(now)),
            }
        })
        .collect();
    diesel::insert_into(schema::poi_audit::table)
        .values(&rows)
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn get_last_audit(conn: &mut SqliteConnection, count: usize) -> Result<Vec<AuditEntry>> {
    use schema::poi_audit::dsl;
    schema::poi_audit::table
        .order_by(dsl::id.desc())
        .limit(count as i64)
        .load::<models::AuditEntry>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(load_audit_entry)
        .collect()
}

fn get_audit_of_poi(conn: &mut SqliteConnection, id: PoiId) -> Result<Vec<AuditEntry>> {
    use schema::poi_audit::dsl;
    schema::poi_audit::table
        .filter(dsl::poi_id.eq(i64::from(id)))
        .order_by(dsl::id)
        .load::<models::AuditEntry>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(load_audit_entry)
        .collect()
}
