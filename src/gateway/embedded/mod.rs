use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{GatewayError, NoteGateway};
use crate::notes::{InstantNanos, Note, NoteDraft, NoteId};

mod schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite system of record. Ids come from `AUTOINCREMENT` and timestamps are
/// strictly increasing nanoseconds, so listing newest-first is stable.
#[derive(Clone)]
pub struct EmbeddedGateway {
    db_path: Arc<PathBuf>,
    wal_autocheckpoint: u32,
    last_stamp: Arc<Mutex<i64>>,
}

impl EmbeddedGateway {
    pub fn open(db_path: &Path, wal_autocheckpoint: u32) -> Result<Self, GatewayError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let gateway = Self {
            db_path: Arc::new(db_path.to_path_buf()),
            wal_autocheckpoint,
            last_stamp: Arc::new(Mutex::new(i64::MIN)),
        };
        let conn = gateway.connect()?;
        schema::apply(&conn)?;
        Ok(gateway)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, GatewayError> {
        let conn = Connection::open(&*self.db_path)?;
        prepare_connection(&conn, self.wal_autocheckpoint)?;
        Ok(conn)
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&mut Connection) -> Result<T, GatewayError>,
    {
        let mut conn = self.connect()?;
        f(&mut conn)
    }

    fn next_stamp(&self, stored_max: Option<i64>) -> Result<i64, GatewayError> {
        let now = i64::try_from(InstantNanos::now().0)
            .map_err(|_| GatewayError::Decode("system clock outside i64 nanoseconds".into()))?;
        let mut last = self.last_stamp.lock();
        let floor = (*last).max(stored_max.unwrap_or(i64::MIN));
        let stamp = if now > floor { now } else { floor.saturating_add(1) };
        *last = stamp;
        Ok(stamp)
    }

    fn fetch(conn: &Connection, id: NoteId) -> Result<Option<Note>, GatewayError> {
        let row_id = sql_id(id)?;
        let note = conn
            .query_row(
                "SELECT id, title, content, time_stamp FROM notes WHERE id = ?1",
                [row_id],
                read_row,
            )
            .optional()?;
        note.transpose()
    }
}

impl NoteGateway for EmbeddedGateway {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn create(&self, draft: &NoteDraft) -> Result<Note, GatewayError> {
        self.with_connection(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let stored_max: Option<i64> =
                tx.query_row("SELECT MAX(time_stamp) FROM notes", [], |row| row.get(0))?;
            let stamp = self.next_stamp(stored_max)?;
            tx.execute(
                "INSERT INTO notes (title, content, time_stamp) VALUES (?1, ?2, ?3)",
                params![draft.title, draft.content, stamp],
            )?;
            let row_id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Note {
                id: note_id(row_id)?,
                title: draft.title.clone(),
                content: draft.content.clone(),
                time_stamp: InstantNanos(i128::from(stamp)),
            })
        })
    }

    fn list(&self) -> Result<Vec<Note>, GatewayError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, time_stamp
                 FROM notes
                 ORDER BY time_stamp DESC, id DESC",
            )?;
            let notes = stmt
                .query_map([], read_row)?
                .collect::<Result<Vec<_>, _>>()?;
            notes.into_iter().collect()
        })
    }

    fn delete_one(&self, id: NoteId) -> Result<(), GatewayError> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM notes WHERE id = ?1", [sql_id(id)?])?;
            if removed == 0 {
                return Err(GatewayError::MissingNote(id));
            }
            Ok(())
        })
    }

    fn delete_all(&self) -> Result<(), GatewayError> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM notes", [])?;
            tracing::debug!(removed, "cleared embedded note table");
            Ok(())
        })
    }

    fn update(&self, id: NoteId, draft: &NoteDraft) -> Result<Note, GatewayError> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE notes SET title = ?1, content = ?2 WHERE id = ?3",
                params![draft.title, draft.content, sql_id(id)?],
            )?;
            if changed == 0 {
                return Err(GatewayError::MissingNote(id));
            }
            let note = Self::fetch(&tx, id)?.ok_or(GatewayError::MissingNote(id))?;
            tx.commit()?;
            Ok(note)
        })
    }
}

fn prepare_connection(conn: &Connection, wal_autocheckpoint: u32) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "wal_autocheckpoint", wal_autocheckpoint)?;
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<Result<Note, GatewayError>> {
    let row_id: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    let content: String = row.get(2)?;
    let stamp: i64 = row.get(3)?;
    Ok(note_id(row_id).map(|id| Note {
        id,
        title,
        content,
        time_stamp: InstantNanos(i128::from(stamp)),
    }))
}

fn note_id(row_id: i64) -> Result<NoteId, GatewayError> {
    u64::try_from(row_id)
        .map(NoteId)
        .map_err(|_| GatewayError::Decode(format!("negative note id {row_id}")))
}

fn sql_id(id: NoteId) -> Result<i64, GatewayError> {
    i64::try_from(id.0).map_err(|_| GatewayError::MissingNote(id))
}
