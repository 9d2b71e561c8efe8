use raydb_entities::user::UserInfo;

use std::result::Result as StdResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unauthorized role")]
    UnauthorizedRole,
}

pub type Result<T> = StdResult<T, Error>;

pub fn authorize_moderator(user: &UserInfo) -> Result<()> {
    if !user.is_moderator() {
        return Err(Error::UnauthorizedRole);
    }
    Ok(())
}

pub fn authorize_admin(user: &UserInfo) -> Result<()> {
    if !user.is_admin() {
        return Err(Error::UnauthorizedRole);
    }
    Ok(())
}
