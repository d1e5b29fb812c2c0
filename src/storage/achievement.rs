//! Achievement storage: unlocks per user.

use jiff::Timestamp;
use tracing::debug;

use crate::model::UnlockedAchievement;

use super::{AchievementStore, Result, Storage, parse_timestamp};

impl AchievementStore for Storage {
    fn has_completed_survey(&self, user_id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM survey_response WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn unlock_achievements(
        &self,
        user_id: &str,
        ids: &[&str],
        at: Timestamp,
    ) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let tx = conn.unchecked_transaction()?;
        let mut unlocked = Vec::new();
        for id in ids {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO achievement
                     (user_id, achievement_id, unlocked_at, unlocked_ms)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, id, at.to_string(), at.as_millisecond()],
            )?;
            if inserted > 0 {
                unlocked.push((*id).to_string());
            }
        }
        tx.commit()?;
        if !unlocked.is_empty() {
            debug!(user_id, ?unlocked, "achievements unlocked");
        }
        Ok(unlocked)
    }

    fn load_achievements(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT achievement_id, unlocked_at FROM achievement WHERE user_id = ?1
             ORDER BY unlocked_ms, rowid",
        )?;
        let rows = stmt
            .query_map([user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(achievement_id, unlocked_at)| {
                Ok(UnlockedAchievement {
                    achievement_id,
                    unlocked_at: parse_timestamp(&unlocked_at, "unlocked_at")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("juka")).unwrap();
        (dir, storage)
    }

    #[test]
    fn unlock_reports_only_new_ids() {
        let (_dir, storage) = test_storage();
        let at = Timestamp::now();

        let first = storage
            .unlock_achievements("marina", &["first-trip", "ten-catches"], at)
            .unwrap();
        assert_eq!(first, vec!["first-trip", "ten-catches"]);

        let again = storage
            .unlock_achievements("marina", &["first-trip", "five-species"], at)
            .unwrap();
        assert_eq!(again, vec!["five-species"]);
    }

    #[test]
    fn unlocks_keep_their_first_timestamp() {
        let (_dir, storage) = test_storage();
        let early = Timestamp::new(1_000_000_000, 0).unwrap();

        storage
            .unlock_achievements("marina", &["first-trip"], early)
            .unwrap();
        storage
            .unlock_achievements("marina", &["first-trip"], Timestamp::now())
            .unwrap();

        let held = storage.load_achievements("marina").unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].unlocked_at, early);
    }

    #[test]
    fn load_orders_by_unlock_time() {
        let (_dir, storage) = test_storage();
        let whole: Timestamp = "2024-05-11T10:00:00Z".parse().unwrap();
        let fraction: Timestamp = "2024-05-11T10:00:00.5Z".parse().unwrap();
        let later: Timestamp = "2024-05-11T10:00:01Z".parse().unwrap();

        storage
            .unlock_achievements("marina", &["ten-catches"], later)
            .unwrap();
        storage
            .unlock_achievements("marina", &["five-species"], fraction)
            .unwrap();
        storage
            .unlock_achievements("marina", &["first-trip"], whole)
            .unwrap();

        let held: Vec<_> = storage
            .load_achievements("marina")
            .unwrap()
            .into_iter()
            .map(|a| a.achievement_id)
            .collect();
        assert_eq!(held, vec!["first-trip", "five-species", "ten-catches"]);
    }

    #[test]
    fn achievements_are_per_user() {
        let (_dir, storage) = test_storage();
        storage
            .unlock_achievements("marina", &["first-trip"], Timestamp::now())
            .unwrap();

        assert!(storage.load_achievements("pablo").unwrap().is_empty());
    }
}
