use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{to_i64, to_u64},
};
use crate::models::StatusRecord;

fn row_to_record(row: &Row) -> Result<StatusRecord> {
    let at_target: i64 = row.get("at_target")?;
    let distance_meters: i64 = row.get("distance_meters")?;
    let sequence: i64 = row.get("sequence")?;

    Ok(StatusRecord {
        at_target: at_target != 0,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        distance_meters: to_u64(distance_meters, "distance_meters")?,
        sampled_at_epoch_millis: row.get("sampled_at_epoch_millis")?,
        server_timestamp: row.get("server_timestamp")?,
        sequence: to_u64(sequence, "sequence")?,
    })
}

impl Database {
    /// Replaces every column of the row for `key`, inserting it if absent.
    pub async fn upsert_status_record(&self, key: &str, record: &StatusRecord) -> Result<()> {
        let key = key.to_string();
        let record = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO status_records (
                    key,
                    at_target,
                    latitude,
                    longitude,
                    distance_meters,
                    sampled_at_epoch_millis,
                    server_timestamp,
                    sequence
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(key) DO UPDATE SET
                    at_target = excluded.at_target,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude,
                    distance_meters = excluded.distance_meters,
                    sampled_at_epoch_millis = excluded.sampled_at_epoch_millis,
                    server_timestamp = excluded.server_timestamp,
                    sequence = excluded.sequence",
                params![
                    key,
                    record.at_target,
                    record.latitude,
                    record.longitude,
                    to_i64(record.distance_meters)?,
                    record.sampled_at_epoch_millis,
                    record.server_timestamp,
                    to_i64(record.sequence)?,
                ],
            )
            .with_context(|| format!("failed to upsert status record {key}"))?;
            Ok(())
        })
        .await
    }

    pub async fn get_status_record(&self, key: &str) -> Result<Option<StatusRecord>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    at_target,
                    latitude,
                    longitude,
                    distance_meters,
                    sampled_at_epoch_millis,
                    server_timestamp,
                    sequence
                FROM status_records
                WHERE key = ?1",
            )?;

            let row = stmt
                .query_row(params![key], |row| Ok(row_to_record(row)))
                .optional()?;
            row.transpose()
        })
        .await
    }
}
