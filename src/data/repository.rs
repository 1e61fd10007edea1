use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, AppError> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_setting_get_and_set() {
        let conn = setup_db();

        assert_eq!(get_setting(&conn, "formatos.last_path").unwrap(), None);

        set_setting(&conn, "formatos.last_path", "legal/contratos").unwrap();
        assert_eq!(
            get_setting(&conn, "formatos.last_path").unwrap().as_deref(),
            Some("legal/contratos")
        );
    }

    #[test]
    fn test_set_setting_upsert() {
        let conn = setup_db();

        set_setting(&conn, "k", "one").unwrap();
        set_setting(&conn, "k", "two").unwrap(); // should upsert

        assert_eq!(get_setting(&conn, "k").unwrap().as_deref(), Some("two"));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
