//! Collaborator interfaces the survey core talks to.
//!
//! `Database` implements all of them; tests swap in fakes.

use crate::db::models::{PoolQuestion, Question, ReviewRecord, SettingsUpdate, ShopSettings};
use crate::db::DbError;

pub trait SettingsStore: Send + Sync {
    fn read_settings(&self) -> Result<ShopSettings, DbError>;

    /// Writes only the keys present in `update`.
    fn write_settings(&self, update: &SettingsUpdate) -> Result<(), DbError>;
}

pub trait QuestionCatalog: Send + Sync {
    fn read_questions(&self) -> Result<Vec<Question>, DbError>;

    /// Overwrites the whole catalog; the given order becomes the catalog order.
    fn replace_questions(&self, questions: &[Question]) -> Result<(), DbError>;
}

pub trait QuestionPool: Send + Sync {
    fn read_question_pool(&self) -> Result<Vec<PoolQuestion>, DbError>;

    fn replace_question_pool(&self, questions: &[PoolQuestion]) -> Result<(), DbError>;
}

/// Append-only log of submissions.
pub trait ResponseArchive: Send + Sync {
    fn append_response(&self, record: &ReviewRecord) -> Result<(), DbError>;

    /// Newest first.
    fn list_responses(&self, limit: usize) -> Result<Vec<ReviewRecord>, DbError>;
}
