use rusqlite::Connection;

/// `AUTOINCREMENT` keeps ids from being handed out twice, even once the
/// table has been emptied.
pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            time_stamp INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS notes_time_stamp ON notes(time_stamp);
        "#,
    )
}
