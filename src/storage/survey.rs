//! Survey storage: the latest set of answers per user.

use std::collections::BTreeMap;

use jiff::Timestamp;
use tracing::debug;

use crate::model::Answer;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Replaces a user's survey responses with `answers`.
    pub fn save_survey(
        &self,
        user_id: &str,
        answers: &BTreeMap<u32, Answer>,
        submitted_at: Timestamp,
    ) -> Result<()> {
        let conn = self.connect()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM survey_response WHERE user_id = ?1", [user_id])?;
        for (question_id, answer) in answers {
            tx.execute(
                "INSERT INTO survey_response (user_id, question_id, answer, submitted_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    user_id,
                    question_id,
                    serde_json::to_string(answer)?,
                    submitted_at.to_string(),
                ],
            )?;
        }
        tx.commit()?;
        debug!(user_id, answers = answers.len(), "survey saved");
        Ok(())
    }

    /// A user's stored survey answers, by question id.
    pub fn load_survey(&self, user_id: &str) -> Result<BTreeMap<u32, Answer>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT question_id, answer FROM survey_response WHERE user_id = ?1
             ORDER BY question_id",
        )?;
        let rows = stmt
            .query_map([user_id], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut answers = BTreeMap::new();
        for (question_id, json) in rows {
            let answer: Answer = serde_json::from_str(&json)?;
            if answer.question_id != question_id {
                return Err(StorageError::Corrupt(format!(
                    "answer for question {} stored under {question_id}",
                    answer.question_id
                )));
            }
            answers.insert(question_id, answer);
        }
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::AnswerValue;
    use crate::storage::AchievementStore;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("juka")).unwrap();
        (dir, storage)
    }

    fn sample_answers() -> BTreeMap<u32, Answer> {
        BTreeMap::from([
            (1, Answer::new(1, AnswerValue::SingleChoice("Semanal".into()))),
            (4, Answer::new(4, AnswerValue::Scale(4))),
            (5, Answer::new(5, AnswerValue::YesNo(true))),
        ])
    }

    #[test]
    fn save_and_load_survey() {
        let (_dir, storage) = test_storage();
        let answers = sample_answers();

        storage
            .save_survey("marina", &answers, Timestamp::now())
            .unwrap();

        assert_eq!(storage.load_survey("marina").unwrap(), answers);
        assert!(storage.has_completed_survey("marina").unwrap());
        assert!(!storage.has_completed_survey("pablo").unwrap());
    }

    #[test]
    fn saving_again_replaces_previous_answers() {
        let (_dir, storage) = test_storage();
        storage
            .save_survey("marina", &sample_answers(), Timestamp::now())
            .unwrap();

        let retake = BTreeMap::from([(4, Answer::new(4, AnswerValue::Scale(2)))]);
        storage.save_survey("marina", &retake, Timestamp::now()).unwrap();

        assert_eq!(storage.load_survey("marina").unwrap(), retake);
    }

    #[test]
    fn load_survey_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.load_survey("marina").unwrap().is_empty());
    }
}
