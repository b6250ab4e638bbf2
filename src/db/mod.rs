use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, Params, Row as SqlRow};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Failure of a single database operation, carrying the engine's message.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Open(String),
    #[error("{0}")]
    Prepare(String),
    #[error("{0}")]
    Execute(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// A column value as stored by the engine. `Null` is kept distinct from
/// empty text and zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl Value {
    /// Reads a command-line parameter: integers and reals keep their
    /// numeric type, `NULL` is SQL NULL, anything else is text.
    pub fn parse_param(raw: &str) -> Value {
        if raw.eq_ignore_ascii_case("null") {
            Value::Null
        } else if let Ok(i) = raw.parse::<i64>() {
            Value::Integer(i)
        } else if let Ok(f) = raw.parse::<f64>()
            && f.is_finite()
        {
            Value::Real(f)
        } else {
            Value::Text(raw.to_string())
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(t) => ToSqlOutput::Borrowed(ValueRef::Text(t.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(t) => write!(f, "{}", t),
            Value::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub name: String,
    pub value: Value,
}

/// One result row; cells follow the order of the SQL projection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|cell| cell.name == name)
            .map(|cell| &cell.value)
    }
}

/// Reads a column as text the way the engine coerces it; NULL becomes "".
pub fn text_cell(row: &SqlRow<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    })
}

/// Reads a column as an integer; NULL and non-numeric text read as 0.
pub fn int_cell(row: &SqlRow<'_>, idx: usize) -> rusqlite::Result<i64> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(i) => i,
        ValueRef::Real(f) => f as i64,
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0),
        ValueRef::Null | ValueRef::Blob(_) => 0,
    })
}

/// Read-only handle on one database file, owned by the top-level command.
///
/// The connection is closed when the handle is dropped.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an existing database file. A missing file is an error rather
    /// than a fresh empty database.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Database> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "failed to open database");
            DbError::Open(engine_message(&e))
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Database { conn })
    }

    pub fn from_connection(conn: Connection) -> Database {
        Database { conn }
    }

    /// Runs `sql` with positional `params` and maps every row through `map`.
    ///
    /// Stops at the first failing row.
    pub fn collect<T, P, F>(&self, sql: &str, params: P, mut map: F) -> DbResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&SqlRow<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare(sql)?;
        let mut rows = stmt.query(params).map_err(execute_error)?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(execute_error)? {
            items.push(map(row).map_err(execute_error)?);
        }

        tracing::debug!(rows = items.len(), sql, "query collected");
        Ok(items)
    }

    /// Like [`Database::collect`] but only reads the first row.
    pub fn first<T, P, F>(&self, sql: &str, params: P, map: F) -> DbResult<Option<T>>
    where
        P: Params,
        F: FnOnce(&SqlRow<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.prepare(sql)?;
        let mut rows = stmt.query(params).map_err(execute_error)?;
        match rows.next().map_err(execute_error)? {
            Some(row) => Ok(Some(map(row).map_err(execute_error)?)),
            None => Ok(None),
        }
    }

    /// Runs `sql` and returns untyped rows with their column names.
    pub fn rows<P: Params>(&self, sql: &str, params: P) -> DbResult<Vec<Row>> {
        let mut stmt = self.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
        let mut rows = stmt.query(params).map_err(execute_error)?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(execute_error)? {
            let mut cells = Vec::with_capacity(names.len());
            for (idx, name) in names.iter().enumerate() {
                let value = row.get_ref(idx).map_err(execute_error)?;
                cells.push(Cell {
                    name: name.clone(),
                    value: value.into(),
                });
            }
            result.push(Row { cells });
        }

        tracing::debug!(rows = result.len(), sql, "query collected");
        Ok(result)
    }

    fn prepare(&self, sql: &str) -> DbResult<rusqlite::Statement<'_>> {
        self.conn.prepare(sql).map_err(|e| {
            tracing::warn!(error = %e, sql, "failed to prepare statement");
            DbError::Prepare(engine_message(&e))
        })
    }
}

fn execute_error(e: rusqlite::Error) -> DbError {
    tracing::warn!(error = %e, "query failed");
    DbError::Execute(engine_message(&e))
}

/// The engine's own message, without rusqlite's wrapping.
fn engine_message(e: &rusqlite::Error) -> String {
    match e {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn fixture() -> Database {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE artists (artistid INTEGER PRIMARY KEY, name TEXT);
            INSERT INTO artists VALUES (1, 'AC/DC'), (2, NULL), (3, '');
            "#,
        )
        .unwrap();
        Database::from_connection(conn)
    }

    #[test]
    fn test_collect_typed_records() {
        let db = fixture();
        let artists = db
            .collect(
                "SELECT artistid, name FROM artists ORDER BY artistid",
                [],
                |row| Ok((int_cell(row, 0)?, text_cell(row, 1)?)),
            )
            .unwrap();

        assert_eq!(
            artists,
            vec![
                (1, "AC/DC".to_string()),
                (2, String::new()),
                (3, String::new())
            ]
        );
    }

    #[test]
    fn test_collect_with_bound_parameter() {
        let db = fixture();
        let names = db
            .collect("SELECT name FROM artists WHERE artistid = ?", [1], |row| {
                text_cell(row, 0)
            })
            .unwrap();
        assert_eq!(names, vec!["AC/DC".to_string()]);
    }

    #[test]
    fn test_first_without_rows() {
        let db = fixture();
        let missing = db
            .first("SELECT name FROM artists WHERE artistid = ?", [99], |row| {
                text_cell(row, 0)
            })
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_rows_keep_null_distinct() {
        let db = fixture();
        let rows = db
            .rows("SELECT artistid, name FROM artists ORDER BY artistid", [])
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells[0].name, "artistid");
        assert_eq!(rows[1].get("name"), Some(&Value::Null));
        assert_eq!(rows[2].get("name"), Some(&Value::Text(String::new())));
        assert_eq!(rows[1].get("name").unwrap().to_string(), "NULL");
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(Value::parse_param("42"), Value::Integer(42));
        assert_eq!(Value::parse_param("0.99"), Value::Real(0.99));
        assert_eq!(Value::parse_param("NULL"), Value::Null);
        assert_eq!(Value::parse_param("AC/DC"), Value::Text("AC/DC".to_string()));
    }

    #[test]
    fn test_value_binds_as_parameter() {
        let db = fixture();
        let params = [Value::Integer(1)];
        let names = db
            .collect(
                "SELECT name FROM artists WHERE artistid = ?",
                rusqlite::params_from_iter(params.iter()),
                |row| text_cell(row, 0),
            )
            .unwrap();
        assert_eq!(names, vec!["AC/DC".to_string()]);
    }

    #[test]
    fn test_prepare_error_carries_engine_message() {
        let db = fixture();
        let err = db
            .collect("SELECT * FROM no_such_table", [], |row| int_cell(row, 0))
            .unwrap_err();

        assert!(matches!(err, DbError::Prepare(_)));
        assert!(err.to_string().contains("no such table: no_such_table"));
    }

    #[test]
    fn test_int_cell_coercions() {
        let db = fixture();
        let values = db
            .collect("SELECT NULL, '12', 3.9, 'abc'", [], |row| {
                Ok((
                    int_cell(row, 0)?,
                    int_cell(row, 1)?,
                    int_cell(row, 2)?,
                    int_cell(row, 3)?,
                ))
            })
            .unwrap();
        assert_eq!(values, vec![(0, 12, 3, 0)]);
    }

    #[test]
    fn test_open_error_displays_engine_message_once() {
        let err = DbError::Open("unable to open database file: /tmp/nope.db".to_string());
        assert_eq!(err.to_string(), "unable to open database file: /tmp/nope.db");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Database::open(dir.path().join("missing.db"));
        assert!(!dir.path().join("missing.db").exists());

        let err = result.unwrap_err();
        assert!(matches!(err, DbError::Open(_)));
        let message = err.to_string();
        assert!(message.contains("unable to open database file"));
        assert_eq!(message.matches("unable to open database file").count(), 1);
    }

    #[test]
    fn test_open_existing_file() {
        let file = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(file.path()).unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (5);")
                .unwrap();
        }

        let db = Database::open(file.path()).unwrap();
        let xs = db.collect("SELECT x FROM t", [], |row| int_cell(row, 0)).unwrap();
        assert_eq!(xs, vec![5]);
    }
}
