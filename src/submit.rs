use tracing::{debug, info};

use crate::api::AppState;
use crate::clock::{format_timestamp, jst_now};
use crate::db::models::{AnswerSet, ReviewRecord};
use crate::error::AppError;

/// Drafts a review for `answers` and archives both. Nothing is archived
/// unless generation succeeded.
pub async fn submit_answers(state: &AppState, answers: AnswerSet) -> Result<String, AppError> {
    info!(answers = answers.len(), "Received survey submission");
    debug!(?answers, "Submitted answers");

    // 1. Load the current catalog and settings
    let questions = state.questions.read_questions()?;
    let settings = state.settings.read_settings()?;

    // 2. Draft the review
    let review = state
        .generator
        .generate(&answers, &questions, &settings)
        .await?;
    debug!(%review, "Generated review");

    // 3. Archive answers and text together
    let record = ReviewRecord::new(format_timestamp(&jst_now()), answers, review.clone());
    state.archive.append_response(&record)?;
    info!(record_id = %record.id, "Submission archived");

    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionKeys;
    use crate::db::models::{Question, QuestionType, SettingsUpdate};
    use crate::db::{Database, DbError};
    use crate::review::testing::StubGenerator;
    use crate::store::{QuestionCatalog, ResponseArchive, SettingsStore};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingArchive {
        appended: Mutex<Vec<ReviewRecord>>,
    }

    impl ResponseArchive for RecordingArchive {
        fn append_response(&self, record: &ReviewRecord) -> Result<(), DbError> {
            self.appended.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn list_responses(&self, limit: usize) -> Result<Vec<ReviewRecord>, DbError> {
            Ok(self.appended.lock().unwrap().iter().rev().take(limit).cloned().collect())
        }
    }

    fn state_with(generator: Arc<StubGenerator>) -> (AppState, Arc<RecordingArchive>) {
        let db = Arc::new(Database::in_memory().unwrap());
        db.replace_questions(&[Question {
            id: "worry".into(),
            label: "入会前の悩み".into(),
            kind: QuestionType::Text,
            options: Vec::new(),
            ai_use: true,
            step: 1,
        }])
        .unwrap();
        db.write_settings(&SettingsUpdate {
            shop_name: Some("テストジム".into()),
            ..Default::default()
        })
        .unwrap();

        let archive = Arc::new(RecordingArchive::default());
        let mut state = AppState::new(
            db,
            generator,
            SessionKeys::new(b"secret", Duration::from_secs(60)),
        );
        state.archive = archive.clone() as Arc<dyn ResponseArchive>;
        (state, archive)
    }

    #[tokio::test]
    async fn successful_submission_is_archived_with_all_answers() {
        let stub = Arc::new(StubGenerator::replying("とても良いジムです。"));
        let (state, archive) = state_with(stub);
        let answers: AnswerSet = [("worry", "体重"), ("not_in_catalog", "保存される")]
            .into_iter()
            .collect();

        let review = submit_answers(&state, answers.clone()).await.unwrap();

        assert_eq!(review, "とても良いジムです。");
        let appended = archive.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].answers, answers);
        assert_eq!(appended[0].generated_text, review);
        assert_eq!(appended[0].created_at.len(), "2024/06/01 10:00:00".len());
    }

    #[tokio::test]
    async fn failed_generation_archives_nothing() {
        let (state, archive) = state_with(Arc::new(StubGenerator::failing()));
        let answers: AnswerSet = [("worry", "体重")].into_iter().collect();

        let err = submit_answers(&state, answers).await.unwrap_err();

        assert!(matches!(err, AppError::ExternalService(_)));
        assert!(archive.appended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompt_uses_stored_shop_name() {
        let stub = Arc::new(StubGenerator::replying("ok"));
        let (state, _archive) = state_with(stub.clone());

        submit_answers(&state, AnswerSet::new()).await.unwrap();

        let prompts = stub.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("あなたはテストジムに通う会員（30代・不明）です。"));
    }
}
