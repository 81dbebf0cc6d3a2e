use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::AccessToken;

/// The one key the application caches its bearer token under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn get_token(conn: &Connection, key: &str) -> anyhow::Result<Option<AccessToken>> {
    let row = conn
        .query_row(
            "SELECT access_token, token_type, expires_at FROM stored_tokens WHERE key = ?1",
            params![key],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    Ok(row.map(|(access_token, token_type, expires_at)| AccessToken {
        access_token,
        token_type,
        // An unreadable expiry is treated as already expired.
        expires_at: expires_at.map(|s| {
            NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
                .unwrap_or_default()
        }),
    }))
}

pub fn save_token(conn: &Connection, key: &str, token: &AccessToken) -> anyhow::Result<()> {
    let expires_at = token
        .expires_at
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string());
    let updated_at = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO stored_tokens (key, access_token, token_type, expires_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(key) DO UPDATE SET
           access_token = excluded.access_token,
           token_type = excluded.token_type,
           expires_at = excluded.expires_at,
           updated_at = excluded.updated_at",
        params![key, token.access_token, token.token_type, expires_at, updated_at],
    )?;
    Ok(())
}

pub fn delete_token(conn: &Connection, key: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM stored_tokens WHERE key = ?1", params![key])?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn token(value: &str, expires_at: Option<&str>) -> AccessToken {
        AccessToken {
            access_token: value.to_string(),
            token_type: "Bearer".to_string(),
            expires_at: expires_at
                .map(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()),
        }
    }

    #[test]
    fn test_missing_token() {
        let conn = setup_db();
        assert!(get_token(&conn, AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let conn = setup_db();
        let t = token("abc", Some("2025-06-16 10:00:00"));
        save_token(&conn, AUTH_TOKEN_KEY, &t).unwrap();
        assert_eq!(get_token(&conn, AUTH_TOKEN_KEY).unwrap(), Some(t));
    }

    #[test]
    fn test_save_overwrites_single_row() {
        let conn = setup_db();
        save_token(&conn, AUTH_TOKEN_KEY, &token("first", None)).unwrap();
        save_token(&conn, AUTH_TOKEN_KEY, &token("second", None)).unwrap();

        let loaded = get_token(&conn, AUTH_TOKEN_KEY).unwrap().unwrap();
        assert_eq!(loaded.access_token, "second");
        assert!(loaded.expires_at.is_none());

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM stored_tokens", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_delete() {
        let conn = setup_db();
        save_token(&conn, AUTH_TOKEN_KEY, &token("abc", None)).unwrap();
        assert!(delete_token(&conn, AUTH_TOKEN_KEY).unwrap());
        assert!(!delete_token(&conn, AUTH_TOKEN_KEY).unwrap());
        assert!(get_token(&conn, AUTH_TOKEN_KEY).unwrap().is_none());
    }
}
