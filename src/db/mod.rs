pub mod models;

use crate::store::{QuestionCatalog, QuestionPool, ResponseArchive, SettingsStore};
use models::{
    join_options, split_options, AnswerSet, PoolQuestion, Question, QuestionType, ReviewRecord,
    SettingKey, SettingsUpdate, ShopSettings,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored answers are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate question id: {0}")]
    DuplicateQuestion(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// SQLite stand-in for the shop's spreadsheet. Each table plays one sheet.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir).ok();
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS questions (
                position INTEGER NOT NULL,
                id TEXT NOT NULL UNIQUE,
                label TEXT NOT NULL,
                type TEXT NOT NULL,
                options TEXT NOT NULL DEFAULT '',
                ai_use INTEGER NOT NULL DEFAULT 0,
                step INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS question_pool (
                position INTEGER NOT NULL,
                id TEXT NOT NULL UNIQUE,
                label TEXT NOT NULL,
                type TEXT NOT NULL,
                options TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS responses (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                answers_json TEXT NOT NULL,
                generated_text TEXT NOT NULL,
                schema_version INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Stores `password` as the admin password unless a non-blank one is
    /// already set.
    pub fn seed_admin_password(&self, password: &str) -> Result<bool> {
        let conn = self.lock();
        let changed = conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value
             WHERE trim(settings.value) = ''",
            params![SettingKey::AdminPassword.as_str(), password],
        )?;
        Ok(changed > 0)
    }

    pub fn get_setting(&self, key: SettingKey) -> Result<Option<String>> {
        let conn = self.lock();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

fn ensure_unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DbError::DuplicateQuestion(id.to_string()));
        }
    }
    Ok(())
}

// ── Settings ──

impl SettingsStore for Database {
    fn read_settings(&self) -> Result<ShopSettings> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut settings = ShopSettings::default();
        for row in rows {
            let (key, value) = row?;
            if let Some(key) = SettingKey::parse(&key) {
                settings.set(key, &value);
            }
        }
        Ok(settings)
    }

    fn write_settings(&self, update: &SettingsUpdate) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for (key, value) in update.entries() {
            tx.execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![key.as_str(), value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

// ── Question catalog ──

impl QuestionCatalog for Database {
    fn read_questions(&self) -> Result<Vec<Question>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, label, type, options, ai_use, step FROM questions ORDER BY position ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(2)?;
            let options: String = row.get(3)?;
            let step: i64 = row.get(5)?;
            Ok(Question {
                id: row.get(0)?,
                label: row.get(1)?,
                kind: QuestionType::parse(&kind),
                options: split_options(&options),
                ai_use: row.get(4)?,
                step: u32::try_from(step).ok().filter(|s| *s >= 1).unwrap_or(1),
            })
        })?;
        let questions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(questions)
    }

    fn replace_questions(&self, questions: &[Question]) -> Result<()> {
        ensure_unique_ids(questions.iter().map(|q| q.id.as_str()))?;

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM questions", [])?;
        for (position, q) in questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO questions (position, id, label, type, options, ai_use, step)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    position as i64,
                    q.id,
                    q.label,
                    q.kind.as_str(),
                    join_options(&q.options),
                    q.ai_use,
                    q.step.max(1),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

// ── Question pool ──

impl QuestionPool for Database {
    fn read_question_pool(&self) -> Result<Vec<PoolQuestion>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, label, type, options, category FROM question_pool ORDER BY position ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(2)?;
            let options: String = row.get(3)?;
            Ok(PoolQuestion {
                id: row.get(0)?,
                label: row.get(1)?,
                kind: QuestionType::parse(&kind),
                options: split_options(&options),
                category: row.get(4)?,
            })
        })?;
        let questions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(questions)
    }

    fn replace_question_pool(&self, questions: &[PoolQuestion]) -> Result<()> {
        ensure_unique_ids(questions.iter().map(|q| q.id.as_str()))?;

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM question_pool", [])?;
        for (position, q) in questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO question_pool (position, id, label, type, options, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    position as i64,
                    q.id,
                    q.label,
                    q.kind.as_str(),
                    join_options(&q.options),
                    q.category,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

// ── Responses ──

impl ResponseArchive for Database {
    fn append_response(&self, record: &ReviewRecord) -> Result<()> {
        let answers_json = serde_json::to_string(&record.answers)?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO responses (id, created_at, answers_json, generated_text, schema_version)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.created_at,
                answers_json,
                record.generated_text,
                record.schema_version,
            ],
        )?;
        Ok(())
    }

    fn list_responses(&self, limit: usize) -> Result<Vec<ReviewRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, answers_json, generated_text, schema_version
             FROM responses ORDER BY rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, created_at, answers_json, generated_text, schema_version) = row?;
            let answers: AnswerSet = serde_json::from_str(&answers_json)?;
            records.push(ReviewRecord {
                id,
                created_at,
                answers,
                generated_text,
                schema_version,
            });
        }
        Ok(records)
    }
}
