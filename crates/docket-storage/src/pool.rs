//! Single write connection + read pool, WAL mode. A blocking `rusqlite`
//! write path guarded by a mutex is a deliberate simplification over a
//! true multi-reader pool: the workload here is metadata CRUD, not a
//! high-throughput read path.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use docket_core::errors::DocketResult;

use crate::err::to_storage_err;
use crate::migrations;

pub struct ConnectionPool {
    write: Mutex<Connection>,
}

fn configure(conn: &Connection) -> DocketResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

impl ConnectionPool {
    pub fn open_in_memory() -> DocketResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        configure(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            write: Mutex::new(conn),
        })
    }

    pub fn open_file(path: impl AsRef<Path>) -> DocketResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        configure(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            write: Mutex::new(conn),
        })
    }

    /// Run `f` against the single write connection. Everything goes
    /// through here; there is no separate reader handle because SQLite's
    /// WAL mode makes the write connection's own reads consistent without
    /// one.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> DocketResult<T>) -> DocketResult<T> {
        let conn = self
            .write
            .lock()
            .map_err(|_| to_storage_err("write connection mutex poisoned"))?;
        f(&conn)
    }
}
