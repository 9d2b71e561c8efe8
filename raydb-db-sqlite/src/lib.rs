//! # raydb-db-sqlite
//!
//! SQLite storage of places, pending changes, roles and stars.
//!
//! Readers share the pool while a writer holds it alone, so the
//! bot and the maintenance commands never run into `SQLITE_BUSY`.

#[macro_use]
extern crate diesel;

use anyhow::{anyhow, Result as Fallible};
use diesel::{r2d2, sqlite::SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use raydb_core::usecases as uc;
use std::{
    cell::{RefCell, RefMut},
    ops::Deref,
    sync::Arc,
};

mod models;
mod repo_impl;
mod schema;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

type Manager = r2d2::ConnectionManager<SqliteConnection>;
type Pool = r2d2::Pool<Manager>;
type PooledConnection = r2d2::PooledConnection<Manager>;

/// A pooled connection that keeps the pool locked while it lives.
pub struct Locked<G> {
    _guard: G,
    conn: RefCell<PooledConnection>,
}

impl<G: Deref<Target = Pool>> Locked<G> {
    fn checkout(guard: G, access: &str) -> Fallible<Self> {
        let conn = guard.get().inspect_err(|err| {
            log::error!("No {access} connection available: {err}");
        })?;
        Ok(Self {
            _guard: guard,
            conn: RefCell::new(conn),
        })
    }

    fn sqlite_conn(&self) -> RefMut<PooledConnection> {
        self.conn.borrow_mut()
    }
}

/// Lookups that may run next to each other.
pub type DbReadOnly<'a> = Locked<RwLockReadGuard<'a, Pool>>;

/// The only connection of the pool while it is held.
pub type DbReadWrite<'a> = Locked<RwLockWriteGuard<'a, Pool>>;

/// Repositories for the closure of [`DbReadWrite::transaction`].
pub struct DbConnection<'a> {
    conn: RefCell<&'a mut SqliteConnection>,
}

impl DbReadWrite<'_> {
    /// Every write of `f` is rolled back if `f` fails, the error of
    /// `f` is returned as is.
    pub fn transaction<T, F, E>(&mut self, f: F) -> Result<T, uc::Error>
    where
        F: FnOnce(&DbConnection) -> Result<T, E>,
        E: Into<uc::Error>,
    {
        use diesel::Connection as _;
        let mut failure: Option<uc::Error> = None;
        let outcome = self.conn.get_mut().transaction(|conn| {
            let conn: &mut SqliteConnection = conn;
            let conn = DbConnection {
                conn: RefCell::new(conn),
            };
            f(&conn).map_err(|err| {
                failure = Some(err.into());
                diesel::result::Error::RollbackTransaction
            })
        });
        outcome.map_err(|err| match failure {
            Some(failure) => failure,
            None => uc::Error::Repo(repo_impl::from_diesel_err(err)),
        })
    }
}

#[derive(Clone)]
pub struct Connections {
    pool: Arc<RwLock<Pool>>,
}

/// Pragmas for every new database file. The encoding can not be
/// changed afterwards.
pub fn initialize_database(conn: &mut SqliteConnection) -> Fallible<()> {
    use diesel::RunQueryDsl as _;
    diesel::sql_query(
        r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA wal_checkpoint(TRUNCATE);
PRAGMA encoding = 'UTF-8';
"#,
    )
    .execute(conn)?;
    Ok(())
}

impl Connections {
    /// Fails early if the database file can not be opened.
    pub fn init(url: &str, pool_size: u32) -> Fallible<Self> {
        use diesel::Connection as _;
        SqliteConnection::establish(url)?;
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(Manager::new(url))?;
        initialize_database(&mut *pool.get()?)?;
        Ok(Self {
            pool: Arc::new(RwLock::new(pool)),
        })
    }

    pub fn shared(&self) -> Fallible<DbReadOnly> {
        Locked::checkout(self.pool.read(), "shared")
    }

    pub fn exclusive(&self) -> Fallible<DbReadWrite> {
        Locked::checkout(self.pool.write(), "exclusive")
    }
}

pub fn run_embedded_database_migrations(conn: DbReadWrite<'_>) -> Fallible<()> {
    log::info!("Running embedded database migrations");
    let mut sqlite_conn = conn.sqlite_conn();
    let applied = sqlite_conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow!("Failed to run database migrations: {err}"))?;
    log::debug!("Applied {} migrations", applied.len());
    Ok(())
}
