//! SQLite-backed [`RecordStore`].
//!
//! A single `rusqlite` connection sits behind a mutex; every write is one
//! single-row insert, so no explicit transactions are needed. Timestamps are
//! stored as fixed-width RFC 3339 UTC text so that ordering by the column
//! matches chronological order.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::domain::{
    Application, ApplicationId, ApplicationLogEntry, ApplicationOutcome, ApplicationStatus,
    Company, CompanyId, NewApplication, NewCompany,
};
use super::repository::{RecordStore, RepositoryError};

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    hr_name TEXT,
    hr_email TEXT NOT NULL,
    role TEXT,
    notes TEXT
);

CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id),
    sent_at TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('SENT', 'FAILED')),
    error_message TEXT,
    CHECK ((status = 'SENT') = (error_message IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_applications_sent_at ON applications(sent_at);
"#;

const COMPANY_COLUMNS: &str = "id, name, hr_name, hr_email, role, notes";

const INSERT_COMPANY: &str =
    "INSERT INTO companies (name, hr_name, hr_email, role, notes) VALUES (?1, ?2, ?3, ?4, ?5)";

const INSERT_APPLICATION: &str =
    "INSERT INTO applications (company_id, sent_at, status, error_message) VALUES (?1, ?2, ?3, ?4)";

const SELECT_APPLICATION_LOG: &str = r#"
SELECT a.id, a.company_id, c.name, a.sent_at, a.status, a.error_message
FROM applications a
LEFT JOIN companies c ON c.id = a.company_id
ORDER BY a.sent_at DESC, a.id DESC
"#;

/// Where the database lives, parsed from a `DATABASE_URL`-style string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Accepts `sqlite::memory:`, `:memory:`, `sqlite:///relative.db`,
    /// `sqlite:////absolute.db`, `sqlite://path.db`, `sqlite:path.db`, or a bare path.
    pub fn parse(url: &str) -> Result<Self, RepositoryError> {
        let url = url.trim();
        if matches!(url, ":memory:" | "sqlite::memory:" | "sqlite://:memory:") {
            return Ok(Self::Memory);
        }

        let path = if let Some(rest) = url.strip_prefix("sqlite:///") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else if url.contains("://") {
            return Err(RepositoryError::Unavailable(format!(
                "unsupported database url '{url}', expected a sqlite location"
            )));
        } else {
            url
        };

        if path.is_empty() {
            return Err(RepositoryError::Unavailable(
                "database url does not name a file".to_string(),
            ));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRecordStore").finish_non_exhaustive()
    }
}

impl SqliteRecordStore {
    pub fn open(url: &str) -> Result<Self, RepositoryError> {
        match DatabaseLocation::parse(url)? {
            DatabaseLocation::Memory => Self::open_in_memory(),
            DatabaseLocation::File(path) => {
                let conn = Connection::open(&path).map_err(|err| {
                    RepositoryError::Unavailable(format!(
                        "cannot open database {}: {err}",
                        path.display()
                    ))
                })?;
                Self::with_connection(conn)
            }
        }
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .and_then(|_| conn.execute_batch(CREATE_TABLES))
            .map_err(|err| map_sqlite_error(err, "schema"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }

    fn select_company(
        conn: &Connection,
        clause: &str,
        param: &dyn rusqlite::ToSql,
    ) -> Result<Option<Company>, RepositoryError> {
        let sql =
            format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE {clause} ORDER BY id LIMIT 1");
        conn.query_row(&sql, [param], row_to_company)
            .optional()
            .map_err(|err| map_sqlite_error(err, "company"))
    }
}

impl RecordStore for SqliteRecordStore {
    fn create_company(&self, company: NewCompany) -> Result<Company, RepositoryError> {
        let company = company.validate()?;
        let conn = self.conn()?;
        conn.execute(
            INSERT_COMPANY,
            params![
                company.name,
                company.hr_name,
                company.hr_email,
                company.role,
                company.notes
            ],
        )
        .map_err(|err| map_sqlite_error(err, "company"))?;
        let id = CompanyId(conn.last_insert_rowid());
        Ok(company.into_company(id))
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY id");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|err| map_sqlite_error(err, "company"))?;
        let rows = stmt
            .query_map([], row_to_company)
            .map_err(|err| map_sqlite_error(err, "company"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|err| map_sqlite_error(err, "company"))
    }

    fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        let conn = self.conn()?;
        Self::select_company(&conn, "id = ?1", &id.0)
    }

    fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        let conn = self.conn()?;
        Self::select_company(&conn, "name = ?1", &name)
    }

    fn create_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let conn = self.conn()?;
        let company_exists = conn
            .query_row(
                "SELECT 1 FROM companies WHERE id = ?1",
                [application.company_id.0],
                |_| Ok(()),
            )
            .optional()
            .map_err(|err| map_sqlite_error(err, "company"))?
            .is_some();
        if !company_exists {
            return Err(RepositoryError::NotFound {
                entity: "company",
                id: application.company_id.to_string(),
            });
        }

        conn.execute(
            INSERT_APPLICATION,
            params![
                application.company_id.0,
                format_datetime(&application.sent_at),
                application.outcome.status().label(),
                application.outcome.error_message()
            ],
        )
        .map_err(|err| map_sqlite_error(err, "application"))?;
        let id = ApplicationId(conn.last_insert_rowid());
        Ok(application.into_application(id))
    }

    fn list_applications(&self) -> Result<Vec<ApplicationLogEntry>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(SELECT_APPLICATION_LOG)
            .map_err(|err| map_sqlite_error(err, "application"))?;
        let rows = stmt
            .query_map([], row_to_log_entry)
            .map_err(|err| map_sqlite_error(err, "application"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|err| map_sqlite_error(err, "application"))
    }
}

/// Expected columns: id, name, hr_name, hr_email, role, notes
fn row_to_company(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: CompanyId(row.get(0)?),
        name: row.get(1)?,
        hr_name: row.get(2)?,
        hr_email: row.get(3)?,
        role: row.get(4)?,
        notes: row.get(5)?,
    })
}

/// Expected columns: id, company_id, company name, sent_at, status, error_message
fn row_to_log_entry(row: &Row) -> rusqlite::Result<ApplicationLogEntry> {
    let sent_at: String = row.get(3)?;
    let status: String = row.get(4)?;
    let error: Option<String> = row.get(5)?;

    let status = ApplicationStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown application status '{status}'").into(),
        )
    })?;
    let outcome = match status {
        ApplicationStatus::Sent => ApplicationOutcome::Sent,
        ApplicationStatus::Failed => ApplicationOutcome::failed(error.unwrap_or_default()),
    };

    Ok(ApplicationLogEntry {
        id: ApplicationId(row.get(0)?),
        company_id: CompanyId(row.get(1)?),
        company: row.get(2)?,
        sent_at: parse_datetime(&sent_at)?,
        status,
        error: outcome.error_message().map(str::to_string),
    })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_sqlite_error(err: rusqlite::Error, entity: &'static str) -> RepositoryError {
    match &err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            RepositoryError::NotFound {
                entity: "company",
                id: "unknown".to_string(),
            }
        }
        rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
            entity,
            id: "unknown".to_string(),
        },
        _ => RepositoryError::Unavailable(format!("{entity} query failed: {err}")),
    }
}
