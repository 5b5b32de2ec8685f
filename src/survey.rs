//! Wizard layout and the per-step required-field check.
//!
//! The submit path never calls into this; clients use it to decide whether a
//! step may advance.

use serde::{Deserialize, Serialize};

use crate::db::models::{AnswerSet, Question};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SurveyLayout {
    pub total_steps: u32,
    pub steps: Vec<u32>,
}

impl SurveyLayout {
    pub fn from_questions(questions: &[Question]) -> Self {
        let mut steps: Vec<u32> = questions.iter().map(|q| q.step.max(1)).collect();
        steps.sort_unstable();
        steps.dedup();
        Self {
            total_steps: steps.last().copied().unwrap_or(1),
            steps,
        }
    }
}

pub fn questions_for_step(
    questions: &[Question],
    step: u32,
) -> impl Iterator<Item = &Question> + '_ {
    questions.iter().filter(move |q| q.step == step)
}

/// Labels of the questions on `step` that still lack an answer. Checkbox
/// answers count as present once at least one option is selected.
pub fn missing_answers(questions: &[Question], answers: &AnswerSet, step: u32) -> Vec<String> {
    questions_for_step(questions, step)
        .filter(|q| answers.get(&q.id).is_none())
        .map(|q| q.label.clone())
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct StepCheckRequest {
    pub step: u32,
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StepCheck {
    pub valid: bool,
    pub missing: Vec<String>,
}

impl StepCheck {
    pub fn run(questions: &[Question], request: &StepCheckRequest) -> Self {
        let missing = missing_answers(questions, &request.answers, request.step);
        Self {
            valid: missing.is_empty(),
            missing,
        }
    }
}
