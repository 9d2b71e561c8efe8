use super::*;

impl_for_connections! {
impl RoleRepo {
    fn get_roles(&self, user: UserId) -> Result<Vec<Role>> {
        get_roles(&mut self.conn.borrow_mut(), user)
    }
    fn add_user_to_role(&self, user: &RoleMember, role: Role, added_by: UserId) -> Result<()> {
        add_user_to_role(&mut self.conn.borrow_mut(), user, role, added_by)
    }
    fn remove_user_from_role(&self, user: UserId, role: Role) -> Result<()> {
        remove_user_from_role(&mut self.conn.borrow_mut(), user, role)
    }
    fn get_role_users(&self, role: Role) -> Result<Vec<RoleMember>> {
        get_role_users(&mut self.conn.borrow_mut(), role)
    }
}
}

fn get_roles(conn: &mut SqliteConnection, user: UserId) -> Result<Vec<Role>> {
    use schema::roles::dsl;
    Ok(schema::roles::table
        .select(dsl::role)
        .filter(dsl::user_id.eq(user.to_inner()))
        .load::<String>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .filter_map(|role| {
            Role::from_str(&role)
                .map_err(|_| {
                    log::warn!("Ignoring unknown role {role} of user {user}");
                })
                .ok()
        })
        .collect())
}

fn add_user_to_role(
    conn: &mut SqliteConnection,
    user: &RoleMember,
    role: Role,
    added_by: UserId,
) -> Result<()> {
    diesel::insert_into(schema::roles::table)
        .values(&models::RoleMember {
            user_id: user.user_id.into(),
            name: user.name.clone(),
            role: role.to_string(),
            added_by: added_by.into(),
        })
        .execute(conn)
        .map_err(from_diesel_err)?;
    Ok(())
}

fn remove_user_from_role(conn: &mut SqliteConnection, user: UserId, role: Role) -> Result<()> {
    use schema::roles::dsl;
    diesel::delete(
        schema::roles::table
            .filter(dsl::user_id.eq(user.to_inner()))
            .filter(dsl::role.eq(role.as_ref())),
    )
    .execute(conn)
    .map_err(from_diesel_err)?;
    Ok(())
}

fn get_role_users(conn: &mut SqliteConnection, role: Role) -> Result<Vec<RoleMember>> {
    use schema::roles::dsl;
    Ok(schema::roles::table
        .filter(dsl::role.eq(role.as_ref()))
        .order_by(dsl::user_id)
        .load::<models::RoleMember>(conn)
        .map_err(from_diesel_err)?
        .into_iter()
        .map(|models::RoleMember { user_id, name, .. }| RoleMember {
            user_id: UserId::new(user_id),
            name,
        })
        .collect())
}
