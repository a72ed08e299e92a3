use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::db::codec::{self, Decoded};
use crate::db::{DBResult, Database};

/////*============== KEY-VALUE QUERIES ==============*/
impl Database {
    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> DBResult<Option<String>> {
        log::trace!("[get] Reading key {key}");
        self.connection()
            .prepare("SELECT value FROM KeyValues WHERE key = :key")?
            .query(rusqlite::named_params! { ":key": key })?
            .next()?
            .map(|row| row.get("value"))
            .transpose()
    }

    /// Stores `value` under `key`, replacing whatever was there.
    pub fn put(&self, key: &str, value: &str) -> DBResult<()> {
        log::trace!("[put] Writing key {key} ({} bytes)", value.len());
        self.connection()
            .prepare(
                "INSERT INTO KeyValues (key, value) VALUES (:key, :value)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )?
            .execute(rusqlite::named_params! { ":key": key, ":value": value })
            .inspect_err(|err| log::error!("[put] Could not write key {key}: {err}"))?;

        Ok(())
    }

    /// Removes `key`. Returns `true` if it existed.
    pub fn remove(&self, key: &str) -> DBResult<bool> {
        log::trace!("[remove] Removing key {key}");
        let removed = self.connection()
            .prepare("DELETE FROM KeyValues WHERE key = :key")?
            .execute(rusqlite::named_params! { ":key": key })?;

        Ok(removed > 0)
    }

    /// All `(key, value)` pairs whose key starts with `prefix`, ordered by key.
    pub fn scan_prefix(&self, prefix: &str) -> DBResult<Vec<(String, String)>> {
        log::trace!("[scan_prefix] Scanning keys starting with '{prefix}'");

        // substr rather than LIKE: keys contain '_' which LIKE treats as a wildcard
        let mut stmt = self.connection().prepare(
            "SELECT key, value
             FROM KeyValues
             WHERE substr(key, 1, length(:prefix)) = :prefix
             ORDER BY key",
        )?;

        let pairs = stmt
            .query_map(rusqlite::named_params! { ":prefix": prefix }, |row| {
                Ok((row.get("key")?, row.get("value")?))
            })?
            .collect::<DBResult<Vec<(String, String)>>>()?;

        Ok(pairs)
    }

    /// Reads and decodes the value under `key`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> DBResult<Decoded<T>> {
        Ok(codec::decode(self.get(key)?.as_deref()))
    }

    /// Encodes `value` and stores it under `key`, replacing the whole record.
    pub fn put_value<T: Serialize>(&self, key: &str, value: &T) -> DBResult<()> {
        let encoded = codec::encode(value)
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
        self.put(key, &encoded)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[test]
    fn test_put_get_overwrite() {
        let db = Database::open_session().unwrap();
        assert_eq!(db.get("a").unwrap(), None);

        db.put("a", "1").unwrap();
        db.put("a", "2").unwrap();
        assert_eq!(db.get("a").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_remove() {
        let db = Database::open_session().unwrap();
        db.put("a", "1").unwrap();

        assert!(db.remove("a").unwrap());
        assert!(!db.remove("a").unwrap());
        assert_eq!(db.get("a").unwrap(), None);
    }

    #[test]
    fn test_scan_prefix_is_literal() {
        let db = Database::open_session().unwrap();
        db.put("he4g_progress_bob", "b").unwrap();
        db.put("he4g_progress_alice", "a").unwrap();
        db.put("he4gXprogressXeve", "x").unwrap();
        db.put("he4g_all_scores", "[]").unwrap();

        let keys: Vec<String> = db.scan_prefix("he4g_progress_").unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        assert_eq!(keys, vec!["he4g_progress_alice", "he4g_progress_bob"]);
    }

    #[test]
    fn test_typed_value_round_trip() {
        use crate::db::codec::Decoded;
        use crate::models::{Subject, SubjectProgress};

        let db = Database::open_session().unwrap();
        let mut progress = SubjectProgress::default();
        progress.get_mut(Subject::Science).record_correct();

        db.put_value("p", &progress).unwrap();
        assert_eq!(db.get_value::<SubjectProgress>("p").unwrap(), Decoded::Loaded(progress));
        assert_eq!(db.get_value::<SubjectProgress>("missing").unwrap(), Decoded::Absent);
    }
}
