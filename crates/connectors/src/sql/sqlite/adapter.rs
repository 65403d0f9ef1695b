use crate::{
    error::SinkError,
    sink::{Row, TableHandle, TabularSink, max_date},
    sql::base::{
        dialect::{self, Dialect},
        generator::QueryGenerator,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use model::core::value::Value;
use rusqlite::{Connection, OptionalExtension, params, types::Value as SqliteValue};
use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::info;

const QUERY_TABLE_EXISTS_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";

/// Embedded relational sink: one SQLite table per target.
///
/// Every statement runs on the blocking pool so callers can bound it with a
/// timeout.
pub struct SqliteSink {
    conn: Arc<Mutex<Connection>>,
    dialect: dialect::Sqlite,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SinkError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| SinkError::Unavailable(format!("cannot open {}: {e}", path.display())))?;
        Ok(Self::from_connection(conn))
    }

    pub fn in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SinkError::Unavailable(format!("cannot open in-memory db: {e}")))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        SqliteSink {
            conn: Arc::new(Mutex::new(conn)),
            dialect: dialect::Sqlite,
        }
    }

    /// Runs `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T, SinkError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SinkError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            op(&mut *guard)
        })
        .await?
    }

    fn stored_columns(
        conn: &Connection,
        table: &str,
        quoted: &str,
    ) -> Result<Option<Vec<String>>, SinkError> {
        let exists = conn
            .query_row(QUERY_TABLE_EXISTS_SQL, params![table], |row| row.get::<_, String>(0))
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({quoted})"))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(columns))
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, SinkError> {
    conn.lock()
        .map_err(|_| SinkError::Lock("sqlite connection mutex poisoned".into()))
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::String(s) => SqliteValue::Text(s.clone()),
        Value::Uint(u) => SqliteValue::Integer(i64::try_from(*u).unwrap_or(i64::MAX)),
        Value::Float(f) => SqliteValue::Real(*f),
    }
}

#[async_trait]
impl TabularSink for SqliteSink {
    async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
        let name = name.to_string();
        let header = header.to_vec();
        let quoted = self.dialect.quote_identifier(&name);
        let create = QueryGenerator::new(&self.dialect).create_table(&name, &header);

        self.with_conn(move |conn| {
            if let Some(columns) = Self::stored_columns(conn, &name, &quoted)? {
                return Ok(TableHandle::new(name, columns));
            }

            conn.execute_batch(&create).map_err(|e| {
                SinkError::Unavailable(format!("cannot create table '{name}': {e}"))
            })?;
            info!(table = %name, "Created SQLite table");

            Ok(TableHandle::new(name, header))
        })
        .await
    }

    async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
        let table = handle.name.clone();
        let sql =
            QueryGenerator::new(&self.dialect).date_values(&handle.name, handle.date_column_name());

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let values = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(max_date(&table, values))
        })
        .await
    }

    async fn append_rows(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
        let Some(width) = rows.first().map(Vec::len) else {
            return Ok(0);
        };

        let insert = QueryGenerator::new(&self.dialect).insert_row(&handle.name, width);
        let rows: Vec<Vec<SqliteValue>> = rows
            .iter()
            .map(|row| row.iter().map(to_sqlite).collect())
            .collect();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&insert)?;
                for row in &rows {
                    stmt.execute(rusqlite::params_from_iter(row.iter()))?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}
