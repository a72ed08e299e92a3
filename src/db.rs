use std::path::Path;

use rusqlite::Connection;

pub mod codec;
pub mod keys;
pub mod kv;
pub mod schema;

pub type DBResult<T> = Result<T, rusqlite::Error>;

/// A key-value store backed by SQLite.
///
/// The durable store lives in a file and survives restarts. The session store
/// is an in-memory database and is gone when the process exits.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens (creating if needed) the durable store at `path`.
    pub fn open(path: impl AsRef<Path>) -> DBResult<Self> {
        log::debug!("[Database::open] opening {}", path.as_ref().display());
        Self::initialize(Connection::open(path)?)
    }

    /// Opens a store that only lives as long as this value.
    pub fn open_session() -> DBResult<Self> {
        log::debug!("[Database::open_session] opening in-memory session store");
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(connection: Connection) -> DBResult<Self> {
        log::debug!("[initialize] creating KeyValues table...");
        connection.execute(schema::KEY_VALUES_SCHEMA, [])?;
        Ok(Self { connection })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}
