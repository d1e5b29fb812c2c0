//! Report storage: reports and the chats attached to them.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use crate::model::{ChatMessage, Sender, TripReport, TripReportWithChat};

use super::{ReportStore, Result, Storage, StorageError, parse_timestamp};

impl ReportStore for Storage {
    fn save_report(&self, report: &TripReport, chat: &[ChatMessage]) -> Result<()> {
        report.validate()?;
        let conn = self.connect()?;
        let tx = conn.unchecked_transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM report WHERE id = ?1",
                [report.id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Err(StorageError::ReportAlreadyExists(report.id));
        }

        tx.execute(
            "INSERT INTO report (id, user_id, date, created_ms, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                report.id.to_string(),
                &report.user_id,
                report.date.to_string(),
                report.created_at.as_millisecond(),
                serde_json::to_string(report)?,
            ],
        )?;
        for (seq, message) in chat.iter().enumerate() {
            tx.execute(
                "INSERT INTO chat_message (id, report_id, seq, sender, text, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    message.id.to_string(),
                    report.id.to_string(),
                    i64::try_from(seq).unwrap_or(i64::MAX),
                    message.sender.as_str(),
                    &message.text,
                    message.sent_at.to_string(),
                ],
            )?;
        }
        tx.commit()?;

        debug!(id = %report.id, messages = chat.len(), "report saved");
        Ok(())
    }

    fn list_reports(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<TripReport>> {
        let conn = self.connect()?;
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = conn.prepare(
            "SELECT body FROM report WHERE user_id = ?1
             ORDER BY created_ms DESC, rowid DESC LIMIT ?2",
        )?;
        let bodies = stmt
            .query_map(rusqlite::params![user_id, limit], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        bodies.iter().map(|body| decode_report(body)).collect()
    }

    fn list_chat_for(&self, report_id: Uuid) -> Result<Vec<ChatMessage>> {
        let conn = self.connect()?;
        ensure_report(&conn, report_id)?;
        let mut stmt = conn.prepare(
            "SELECT id, sender, text, sent_at FROM chat_message
             WHERE report_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map([report_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, sender, text, sent_at)| {
                Ok(ChatMessage {
                    id: id
                        .parse()
                        .map_err(|e| StorageError::Corrupt(format!("invalid message id: {e}")))?,
                    sender: parse_sender(&sender)?,
                    text,
                    sent_at: parse_timestamp(&sent_at, "sent_at")?,
                })
            })
            .collect()
    }
}

impl Storage {
    /// Loads a single report.
    pub fn load_report(&self, id: Uuid) -> Result<TripReport> {
        let conn = self.connect()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM report WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let body = body.ok_or(StorageError::ReportNotFound(id))?;
        decode_report(&body)
    }

    /// Ids of a user's reports that start with `prefix`.
    pub fn find_report_ids(&self, user_id: &str, prefix: &str) -> Result<Vec<Uuid>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM report
             WHERE user_id = ?1 AND substr(id, 1, length(?2)) = ?2
             ORDER BY created_ms DESC",
        )?;
        let ids = stmt
            .query_map(rusqlite::params![user_id, prefix.to_lowercase()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids.iter()
            .map(|id| {
                id.parse()
                    .map_err(|e| StorageError::Corrupt(format!("invalid report id: {e}")))
            })
            .collect()
    }

    /// A user's reports, newest first, each with its chat.
    pub fn reports_with_chat(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TripReportWithChat>> {
        self.list_reports(user_id, limit)?
            .into_iter()
            .map(|report| {
                let messages = self.list_chat_for(report.id)?;
                Ok(TripReportWithChat { report, messages })
            })
            .collect()
    }
}

fn ensure_report(conn: &Connection, id: Uuid) -> Result<()> {
    conn.query_row(
        "SELECT 1 FROM report WHERE id = ?1",
        [id.to_string()],
        |_| Ok(()),
    )
    .optional()?
    .ok_or(StorageError::ReportNotFound(id))
}

fn decode_report(body: &str) -> Result<TripReport> {
    let report: TripReport = serde_json::from_str(body)?;
    report
        .validate()
        .map_err(|e| StorageError::Corrupt(format!("stored report {}: {e}", report.id)))?;
    Ok(report)
}

fn parse_sender(value: &str) -> Result<Sender> {
    match value {
        "user" => Ok(Sender::User),
        "assistant" => Ok(Sender::Assistant),
        other => Err(StorageError::Corrupt(format!("unknown sender: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use jiff::Timestamp;
    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::model::{Catch, STATUS_COMPLETED, TripError, TripType};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("juka")).unwrap();
        (dir, storage)
    }

    fn sample_report(user_id: &str) -> TripReport {
        TripReport {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            date: date(2024, 5, 11),
            start_time: None,
            end_time: None,
            duration_minutes: None,
            catches: vec![Catch {
                species: "Lubina".into(),
                count: 3,
                observation: None,
            }],
            total_count: 3,
            trip_type: TripType::Shore,
            rods: 2,
            location: None,
            photos: vec![],
            transcript: None,
            user_info: BTreeMap::new(),
            created_at: Timestamp::now(),
            status: STATUS_COMPLETED.into(),
        }
    }

    fn sample_chat() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("Hoy pesqué 3 lubinas desde la orilla"),
            ChatMessage::assistant("¿Con cuántas cañas pescaste?"),
            ChatMessage::user("2"),
        ]
    }

    #[test]
    fn save_and_load_report() {
        let (_dir, storage) = test_storage();
        let report = sample_report("marina");

        storage.save_report(&report, &[]).unwrap();
        let loaded = storage.load_report(report.id).unwrap();

        assert_eq!(loaded, report);
    }

    #[test]
    fn save_duplicate_report_fails() {
        let (_dir, storage) = test_storage();
        let report = sample_report("marina");

        storage.save_report(&report, &[]).unwrap();
        let err = storage.save_report(&report, &[]).unwrap_err();

        assert!(matches!(err, StorageError::ReportAlreadyExists(_)));
    }

    #[test]
    fn save_invalid_report_fails() {
        let (_dir, storage) = test_storage();
        let mut report = sample_report("marina");
        report.total_count = 7;

        let err = storage.save_report(&report, &[]).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidReport(TripError::TotalMismatch { total: 7, sum: 3 })
        ));
        assert!(storage.list_reports("marina", None).unwrap().is_empty());
    }

    #[test]
    fn load_nonexistent_report_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load_report(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::ReportNotFound(_)));
    }

    #[test]
    fn list_reports_newest_first_per_user() {
        let (_dir, storage) = test_storage();

        let mut old = sample_report("marina");
        old.created_at = Timestamp::new(1_000_000_000, 0).unwrap();
        let mut new = sample_report("marina");
        new.created_at = Timestamp::new(2_000_000_000, 0).unwrap();
        let other = sample_report("pablo");

        // Save out of order to verify sorting.
        storage.save_report(&old, &[]).unwrap();
        storage.save_report(&other, &[]).unwrap();
        storage.save_report(&new, &[]).unwrap();

        let reports = storage.list_reports("marina", None).unwrap();
        let ids: Vec<Uuid> = reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);

        let limited = storage.list_reports("marina", Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, new.id);
    }

    #[test]
    fn chat_round_trips_in_order() {
        let (_dir, storage) = test_storage();
        let report = sample_report("marina");
        let chat = sample_chat();

        storage.save_report(&report, &chat).unwrap();
        let loaded = storage.list_chat_for(report.id).unwrap();

        assert_eq!(loaded, chat);
    }

    #[test]
    fn chat_for_nonexistent_report_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.list_chat_for(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::ReportNotFound(_)));
    }

    #[test]
    fn reports_with_chat_attach_messages() {
        let (_dir, storage) = test_storage();
        let with_chat = sample_report("marina");
        let mut without = sample_report("marina");
        without.created_at = Timestamp::new(1_000_000_000, 0).unwrap();

        storage.save_report(&with_chat, &sample_chat()).unwrap();
        storage.save_report(&without, &[]).unwrap();

        let all = storage.reports_with_chat("marina", None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].has_chat());
        assert_eq!(all[0].messages.len(), 3);
        assert!(!all[1].has_chat());
    }

    #[test]
    fn find_report_ids_by_prefix() {
        let (_dir, storage) = test_storage();
        let report = sample_report("marina");
        storage.save_report(&report, &[]).unwrap();

        let prefix = &report.id.to_string()[..8];
        assert_eq!(
            storage.find_report_ids("marina", prefix).unwrap(),
            vec![report.id]
        );
        assert!(storage.find_report_ids("pablo", prefix).unwrap().is_empty());
    }

    #[test]
    fn prefix_lookup_treats_wildcards_literally() {
        let (_dir, storage) = test_storage();
        let report = sample_report("marina");
        storage.save_report(&report, &[]).unwrap();

        for prefix in ["%", "_", "%-", "________"] {
            assert!(
                storage.find_report_ids("marina", prefix).unwrap().is_empty(),
                "{prefix} matched"
            );
        }
        let upper = report.id.to_string()[..6].to_uppercase();
        assert_eq!(
            storage.find_report_ids("marina", &upper).unwrap(),
            vec![report.id]
        );
    }
}
