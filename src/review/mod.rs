//! Review drafting: answers in, marketing review text out.
//!
//! The age bucket picks the register, only AI-eligible answered questions
//! reach the prompt, and the backend's text is returned as-is.

pub mod age;
pub mod prompt;

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::jst_today;
use crate::db::models::{AnswerSet, Question, ShopSettings};
use crate::llm::{LlmError, TextGenerator};
use prompt::{GenerationContext, TARGET_LENGTH};

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Invalid birth date: {0}")]
    InvalidBirthDate(String),
    #[error("Generation backend failed: {0}")]
    Backend(#[from] LlmError),
}

#[derive(Clone)]
pub struct ReviewGenerator {
    backend: Arc<dyn TextGenerator>,
}

impl ReviewGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    /// Drafts a review as of today's date in Japan.
    pub async fn generate(
        &self,
        answers: &AnswerSet,
        questions: &[Question],
        settings: &ShopSettings,
    ) -> Result<String, ReviewError> {
        self.generate_on(answers, questions, settings, jst_today()).await
    }

    pub async fn generate_on(
        &self,
        answers: &AnswerSet,
        questions: &[Question],
        settings: &ShopSettings,
        today: NaiveDate,
    ) -> Result<String, ReviewError> {
        let context = GenerationContext::build(answers, questions, settings, today)?;
        debug!(
            age = %context.age_label,
            bucket = ?context.age_bucket,
            keywords = context.keyword_hint.is_some(),
            "Built review prompt"
        );

        let text = self.backend.generate(&context.render()).await?;

        let chars = text.chars().count();
        if !TARGET_LENGTH.contains(&chars) {
            warn!(chars, "Generated review is outside the target length");
        }
        Ok(text)
    }
}
