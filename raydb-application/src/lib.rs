#[macro_use]
extern crate log;

mod delete_poi;
mod moderate;
mod notify;
mod reindex;
mod save_poi;

pub mod reports;
pub mod transfer;

pub mod prelude {
    pub use super::{delete_poi::*, moderate::*, notify::*, reindex::*, save_poi::*};
}

pub mod error;

pub type Result<T> = std::result::Result<T, error::AppError>;

pub(crate) use raydb_core::{
    db::*, entities::*, gateways::messenger::*, repositories::*, tag::TagKeywords, usecases,
    RepoError,
};

#[cfg(test)]
pub(crate) mod tests;

pub(crate) mod sqlite {
    pub use raydb_db_sqlite::Connections;
}
