use super::prelude::*;
use crate::authorization::authorize_admin;

/// The roles of a user, with the configured admin always
/// being an admin.
pub fn load_roles<R: RoleRepo>(repo: &R, user: UserId, admin: Option<UserId>) -> Result<Vec<Role>> {
    let mut roles = repo.get_roles(user)?;
    if admin == Some(user) && !roles.contains(&Role::Admin) {
        roles.push(Role::Admin);
    }
    Ok(roles)
}

pub fn grant_moderator<R: RoleRepo>(repo: &R, admin: &UserInfo, member: &RoleMember) -> Result<()> {
    authorize_admin(admin)?;
    log::info!("User {} grants moderation to {}", admin.id, member.user_id);
    match repo.add_user_to_role(member, Role::Moderator, admin.id) {
        Ok(()) | Err(RepoError::AlreadyExists) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

pub fn revoke_moderator<R: RoleRepo>(repo: &R, admin: &UserInfo, user: UserId) -> Result<()> {
    authorize_admin(admin)?;
    log::info!("User {} revokes moderation from {}", admin.id, user);
    repo.remove_user_from_role(user, Role::Moderator)?;
    Ok(())
}

pub fn get_moderators<R: RoleRepo>(repo: &R) -> Result<Vec<RoleMember>> {
    Ok(repo.get_role_users(Role::Moderator)?)
}

/// Everyone who receives moderation requests.
pub fn moderator_ids<R: RoleRepo>(repo: &R, admin: Option<UserId>) -> Result<Vec<UserId>> {
    let mut ids: Vec<_> = repo
        .get_role_users(Role::Moderator)?
        .into_iter()
        .chain(repo.get_role_users(Role::Admin)?)
        .map(|m| m.user_id)
        .chain(admin)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::{
        super::tests::{admin, moderator, MockDb},
        *,
    };

    fn member(id: i64) -> RoleMember {
        RoleMember {
            user_id: UserId::new(id),
            name: Some(format!("user{id}")),
        }
    }

    #[test]
    fn should_treat_configured_admin_as_admin() {
        let db = MockDb::default();
        let id = UserId::new(1);
        assert_eq!(vec![Role::Admin], load_roles(&db, id, Some(id)).unwrap());
        assert!(load_roles(&db, UserId::new(2), Some(id)).unwrap().is_empty());
    }

    #[test]
    fn should_let_only_admins_grant() {
        let db = MockDb::default();
        assert!(matches!(
            grant_moderator(&db, &moderator(2), &member(3)),
            Err(Error::Forbidden)
        ));
        grant_moderator(&db, &admin(1), &member(3)).unwrap();
        grant_moderator(&db, &admin(1), &member(3)).unwrap();
        assert_eq!(vec![Role::Moderator], load_roles(&db, UserId::new(3), None).unwrap());
        assert_eq!(
            vec![UserId::new(1), UserId::new(3)],
            moderator_ids(&db, Some(UserId::new(1))).unwrap()
        );
        revoke_moderator(&db, &admin(1), UserId::new(3)).unwrap();
        assert!(get_moderators(&db).unwrap().is_empty());
    }
}
