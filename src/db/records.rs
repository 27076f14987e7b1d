//! Store for extracted patient records.
//!
//! Bodies are stored exactly as extracted, without the native id. Reads
//! project the row id back into the body under `id`, so callers always
//! see a record that names itself.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::Value;
use uuid::Uuid;

use super::DatabaseError;
use crate::pipeline::types::StructuredRecord;

#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Persist a record and return its new native id.
    ///
    /// Attaches an ingestion timestamp to the record when the extraction
    /// did not already carry one. The native id is generated here and is
    /// deliberately not written into the body.
    pub fn insert(&self, record: &mut StructuredRecord) -> Result<String, DatabaseError> {
        if !record.contains_key("timestamp") {
            record.insert(
                "timestamp".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }

        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(record)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO patient_records (id, body) VALUES (?1, ?2)",
            params![id, body],
        )?;
        Ok(id)
    }

    /// Resolve one identifier against three locations, in order: native
    /// row id (only probed when the identifier has UUID syntax), the
    /// extracted `patientDemographics.patientId`, then
    /// `patientDemographics.firstName`.
    ///
    /// A syntactically valid UUID that matches no row still falls
    /// through to the later strategies.
    pub fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<StructuredRecord>, DatabaseError> {
        let conn = self.lock()?;

        if Uuid::parse_str(identifier).is_ok() {
            if let Some(record) = query_one(
                &conn,
                "SELECT id, body FROM patient_records WHERE id = ?1",
                identifier,
            )? {
                return Ok(Some(record));
            }
        }

        if let Some(record) = query_one(
            &conn,
            "SELECT id, body FROM patient_records
             WHERE json_extract(body, '$.patientDemographics.patientId') = ?1",
            identifier,
        )? {
            return Ok(Some(record));
        }

        query_one(
            &conn,
            "SELECT id, body FROM patient_records
             WHERE json_extract(body, '$.patientDemographics.firstName') = ?1",
            identifier,
        )
    }

    /// Most recently ingested records first.
    pub fn list_recent(&self, limit: u32) -> Result<Vec<StructuredRecord>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, body FROM patient_records
             ORDER BY json_extract(body, '$.timestamp') DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, body) = row?;
            records.push(record_from_row(id, &body)?);
        }
        Ok(records)
    }

    /// Replace fields of one record and report whether a row changed.
    ///
    /// The target is addressed by native id when the identifier has UUID
    /// syntax, otherwise by `patientDemographics.patientId`. Unlike
    /// lookup there is no fallthrough between the two. Each key in
    /// `changes` overwrites that field wholesale, nested objects
    /// included, and a `null` value is stored as `null`. An empty
    /// `changes` map updates nothing and reports false.
    pub fn update_by_identifier(
        &self,
        identifier: &str,
        changes: &StructuredRecord,
    ) -> Result<bool, DatabaseError> {
        let conn = self.lock()?;

        // Pin the target row first: a change that rewrites
        // patientDemographics would otherwise detach a patientId-addressed
        // row while its fields are still being applied.
        let native_id = match resolve_native_id(&conn, identifier)? {
            Some(id) => id,
            None => return Ok(false),
        };

        let mut modified = false;
        for (field, value) in changes {
            let encoded = serde_json::to_string(value)?;
            let count = conn.execute(
                "UPDATE patient_records SET body = json_set(body, '$.' || ?2, json(?3))
                 WHERE id = ?1",
                params![native_id, field, encoded],
            )?;
            modified |= count > 0;
        }
        Ok(modified)
    }
}

/// First row matching `sql` for `param`, or `None`.
fn query_one(
    conn: &Connection,
    sql: &str,
    param: &str,
) -> Result<Option<StructuredRecord>, DatabaseError> {
    match conn.query_row(sql, params![param], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    }) {
        Ok((id, body)) => Ok(Some(record_from_row(id, &body)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Native id of the row an update addresses, or `None`.
///
/// UUID-shaped identifiers probe the row id, anything else the
/// extracted patientId. No first-name strategy here.
fn resolve_native_id(
    conn: &Connection,
    identifier: &str,
) -> Result<Option<String>, DatabaseError> {
    let sql = if Uuid::parse_str(identifier).is_ok() {
        "SELECT id FROM patient_records WHERE id = ?1"
    } else {
        "SELECT id FROM patient_records
         WHERE json_extract(body, '$.patientDemographics.patientId') = ?1"
    };
    match conn.query_row(sql, params![identifier], |row| row.get(0)) {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Parse a stored body and project the native id into it.
fn record_from_row(id: String, body: &str) -> Result<StructuredRecord, DatabaseError> {
    let value: Value = serde_json::from_str(body)?;
    let mut record = match value {
        Value::Object(map) => map,
        _ => return Err(DatabaseError::MalformedBody { id }),
    };
    record.insert("id".to_string(), Value::String(id));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn store() -> RecordStore {
        let db = Database::open_in_memory().expect("in-memory db");
        RecordStore::new(db.connection())
    }

    fn record_json(value: Value) -> StructuredRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn demographics(first: &str, patient_id: Option<&str>) -> StructuredRecord {
        let mut demo = serde_json::json!({ "firstName": first, "lastName": "Harper" });
        if let Some(pid) = patient_id {
            demo["patientId"] = Value::String(pid.to_string());
        }
        record_json(serde_json::json!({ "patientDemographics": demo }))
    }

    #[test]
    fn insert_attaches_timestamp_and_returns_uuid() {
        let store = store();
        let mut record = demographics("Ann", None);

        let id = store.insert(&mut record).unwrap();
        Uuid::parse_str(&id).expect("native id is a uuid");
        assert!(record.contains_key("timestamp"));

        // Round trip: what comes back is the inserted record plus the
        // projected native id.
        let found = store.find_by_identifier(&id).unwrap().expect("row");
        let mut expected = record.clone();
        expected.insert("id".to_string(), Value::String(id));
        assert_eq!(found, expected);
    }

    #[test]
    fn insert_keeps_a_timestamp_the_record_already_carries() {
        let store = store();
        let mut record = demographics("Ann", None);
        record.insert(
            "timestamp".to_string(),
            Value::String("2026-01-05T09:30:00+00:00".to_string()),
        );

        store.insert(&mut record).unwrap();
        assert_eq!(record["timestamp"], "2026-01-05T09:30:00+00:00");
    }

    #[test]
    fn stored_body_omits_the_native_id() {
        let store = store();
        let mut record = demographics("Ann", None);
        let id = store.insert(&mut record).unwrap();

        let conn = store.conn.lock().unwrap();
        let body: String = conn
            .query_row(
                "SELECT body FROM patient_records WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();

        let stored: Value = serde_json::from_str(&body).unwrap();
        assert!(stored.get("id").is_none());
        assert!(stored.get("timestamp").is_some());
    }

    #[test]
    fn find_resolves_patient_id_and_first_name() {
        let store = store();
        store.insert(&mut demographics("Ann", Some("P-1001"))).unwrap();
        store.insert(&mut demographics("Grace", None)).unwrap();

        let by_pid = store.find_by_identifier("P-1001").unwrap().expect("row");
        assert_eq!(by_pid["patientDemographics"]["firstName"], "Ann");

        let by_name = store.find_by_identifier("Grace").unwrap().expect("row");
        assert_eq!(by_name["patientDemographics"]["firstName"], "Grace");
    }

    #[test]
    fn valid_uuid_with_no_native_match_falls_through() {
        let store = store();
        let foreign_uuid = Uuid::new_v4().to_string();
        store
            .insert(&mut demographics("Ann", Some(&foreign_uuid)))
            .unwrap();

        // UUID syntax probes the native id first, misses, and still
        // reaches the patientId strategy.
        let found = store.find_by_identifier(&foreign_uuid).unwrap().expect("row");
        assert_eq!(found["patientDemographics"]["patientId"], foreign_uuid);
    }

    #[test]
    fn unknown_identifier_returns_none() {
        let store = store();
        store.insert(&mut demographics("Ann", None)).unwrap();
        assert!(store.find_by_identifier("nobody").unwrap().is_none());
    }

    #[test]
    fn list_recent_orders_newest_first_and_limits() {
        let store = store();
        for (first, ts) in [
            ("Ann", "2026-01-01T08:00:00+00:00"),
            ("Grace", "2026-01-03T08:00:00+00:00"),
            ("Lena", "2026-01-02T08:00:00+00:00"),
        ] {
            let mut record = demographics(first, None);
            record.insert("timestamp".to_string(), Value::String(ts.to_string()));
            store.insert(&mut record).unwrap();
        }

        let recent = store.list_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0]["patientDemographics"]["firstName"], "Grace");
        assert_eq!(recent[1]["patientDemographics"]["firstName"], "Lena");
    }

    #[test]
    fn update_replaces_a_top_level_field_wholesale() {
        let store = store();
        let mut record = demographics("Ann", Some("P-1001"));
        let id = store.insert(&mut record).unwrap();

        let changes = record_json(serde_json::json!({
            "patientDemographics": { "gender": "female" }
        }));
        assert!(store.update_by_identifier(&id, &changes).unwrap());

        // The demographics block is swapped out whole; none of the old
        // name fields survive.
        let updated = store.find_by_identifier(&id).unwrap().expect("row");
        assert_eq!(
            updated["patientDemographics"],
            serde_json::json!({ "gender": "female" })
        );
    }

    #[test]
    fn update_by_patient_id_when_identifier_is_not_a_uuid() {
        let store = store();
        store.insert(&mut demographics("Ann", Some("P-1001"))).unwrap();

        let changes = record_json(serde_json::json!({ "clinicalNotes": "BP rechecked" }));
        assert!(store.update_by_identifier("P-1001", &changes).unwrap());

        let updated = store.find_by_identifier("P-1001").unwrap().expect("row");
        assert_eq!(updated["clinicalNotes"], "BP rechecked");
    }

    #[test]
    fn update_applies_every_field_when_demographics_are_swapped() {
        let store = store();
        let id = store.insert(&mut demographics("Ann", Some("P-1001"))).unwrap();

        // The demographics swap drops the addressing patientId; fields
        // applied after it must still reach the same row.
        let changes = record_json(serde_json::json!({
            "patientDemographics": { "gender": "female" },
            "vitalSigns": { "heartRate": 72 }
        }));
        assert!(store.update_by_identifier("P-1001", &changes).unwrap());

        let updated = store.find_by_identifier(&id).unwrap().expect("row");
        assert_eq!(updated["vitalSigns"]["heartRate"], 72);
        assert!(updated["patientDemographics"].get("patientId").is_none());
    }

    #[test]
    fn update_does_not_fall_through_to_first_name() {
        let store = store();
        store.insert(&mut demographics("Casey", None)).unwrap();

        let changes = record_json(serde_json::json!({ "clinicalNotes": "unreached" }));
        assert!(!store.update_by_identifier("Casey", &changes).unwrap());
    }

    #[test]
    fn update_with_null_stores_null() {
        let store = store();
        let mut record = demographics("Ann", Some("P-1001"));
        record.insert("clinicalNotes".to_string(), Value::String("stale".into()));
        let id = store.insert(&mut record).unwrap();

        let changes = record_json(serde_json::json!({ "clinicalNotes": null }));
        assert!(store.update_by_identifier(&id, &changes).unwrap());

        // An explicit null is stored as a value, not treated as a delete.
        let updated = store.find_by_identifier(&id).unwrap().expect("row");
        assert_eq!(updated.get("clinicalNotes"), Some(&Value::Null));
    }

    #[test]
    fn update_of_unknown_identifier_reports_no_change() {
        let store = store();
        let changes = record_json(serde_json::json!({ "clinicalNotes": "x" }));
        assert!(!store.update_by_identifier("P-404", &changes).unwrap());
    }

    #[test]
    fn non_object_body_is_reported_as_malformed() {
        let store = store();
        let id = Uuid::new_v4().to_string();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO patient_records (id, body) VALUES (?1, ?2)",
                params![id, "[1, 2, 3]"],
            )
            .unwrap();
        }

        let err = store.find_by_identifier(&id).unwrap_err();
        assert!(matches!(err, DatabaseError::MalformedBody { .. }));
    }
}
