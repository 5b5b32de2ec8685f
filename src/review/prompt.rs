use chrono::NaiveDate;

use super::age::{AgeBucket, AgeProfile};
use super::ReviewError;
use crate::db::models::{AnswerSet, Question, ShopSettings};

pub const DEFAULT_SHOP_NAME: &str = "このジム";
pub const UNKNOWN_GENDER: &str = "不明";
pub const BIRTH_QUESTION_ID: &str = "birth";
pub const GENDER_QUESTION_ID: &str = "gender";

/// Target length of the review body, in characters.
pub const TARGET_LENGTH: std::ops::RangeInclusive<usize> = 150..=200;

/// Everything the prompt is built from. Derived per request, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationContext {
    pub shop_name: String,
    pub age_label: String,
    pub age_bucket: AgeBucket,
    pub gender_label: String,
    pub qa_narrative: String,
    pub keyword_hint: Option<String>,
}

impl GenerationContext {
    pub fn build(
        answers: &AnswerSet,
        questions: &[Question],
        settings: &ShopSettings,
        today: NaiveDate,
    ) -> Result<Self, ReviewError> {
        let shop_name = settings
            .shop_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SHOP_NAME)
            .to_string();
        let keyword_hint = settings
            .keywords
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let age = AgeProfile::from_birth_answer(answers.get(BIRTH_QUESTION_ID), today)?;
        let gender_label = answers
            .get(GENDER_QUESTION_ID)
            .unwrap_or(UNKNOWN_GENDER)
            .to_string();

        Ok(Self {
            shop_name,
            age_label: age.label,
            age_bucket: age.bucket,
            gender_label,
            qa_narrative: qa_narrative(answers, questions),
            keyword_hint,
        })
    }

    pub fn tone(&self) -> &'static str {
        self.age_bucket.tone()
    }

    /// The instruction payload sent to the generation backend.
    pub fn render(&self) -> String {
        let mut rules = vec![
            format!("・性格・トーン：{}", self.tone()),
            format!(
                "・文字数：{}文字〜{}文字程度。",
                TARGET_LENGTH.start(),
                TARGET_LENGTH.end()
            ),
            "・『です・ます』調で。".to_string(),
            format!("・{}", self.age_bucket.emoji_rule()),
            "・嘘は書かず、回答にある内容だけを自然に膨らませてください。".to_string(),
        ];
        if let Some(keywords) = &self.keyword_hint {
            rules.push(format!(
                "・以下のキーワードから1つ以上を選び、文脈に合わせて自然な形で文章に含めてください：{keywords}"
            ));
        }

        format!(
            "あなたは{shop}に通う会員（{age}・{gender}）です。以下のアンケート回答を元に、Googleマップに投稿するクチコミ文章を作成してください。

【入力データ】
{qa}

【書き方のルール】
{rules}

【文章の構成】
1. 入会前の悩みや不安
2. カウンセリングや体験での安心感
3. 具体的な成果や今の気持ち

出力はクチコミの本文のみにしてください。見出しやラベルは付けないでください。",
            shop = self.shop_name,
            age = self.age_label,
            gender = self.gender_label,
            qa = self.qa_narrative,
            rules = rules.join("\n"),
        )
    }
}

/// Question/answer lines for the AI-eligible questions that were answered,
/// in catalog order. Nothing else from the answer set reaches the prompt.
pub fn qa_narrative(answers: &AnswerSet, questions: &[Question]) -> String {
    questions
        .iter()
        .filter(|q| q.ai_use)
        .filter_map(|q| {
            answers
                .get(&q.id)
                .map(|answer| format!("・質問「{}」\n  回答：「{}」", q.label, answer))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::QuestionType;

    fn question(id: &str, label: &str, ai_use: bool) -> Question {
        Question {
            id: id.to_string(),
            label: label.to_string(),
            kind: QuestionType::Text,
            options: Vec::new(),
            ai_use,
            step: 1,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn catalog() -> Vec<Question> {
        vec![
            question("birth", "生年月日", false),
            question("gender", "性別", true),
            question("worry", "入会前の悩み", true),
        ]
    }

    #[test]
    fn example_submission_builds_expected_context() {
        let answers: AnswerSet = [
            ("birth", "1999-01-01"),
            ("gender", "女性"),
            ("worry", "production value"),
        ]
        .into_iter()
        .collect();

        let ctx = GenerationContext::build(&answers, &catalog(), &ShopSettings::default(), today())
            .unwrap();

        assert_eq!(ctx.shop_name, DEFAULT_SHOP_NAME);
        assert_eq!(ctx.age_label, "25歳");
        assert_eq!(ctx.age_bucket, AgeBucket::Adult);
        assert_eq!(ctx.gender_label, "女性");
        assert_eq!(
            ctx.qa_narrative,
            "・質問「性別」\n  回答：「女性」\n・質問「入会前の悩み」\n  回答：「production value」"
        );
        assert!(!ctx.qa_narrative.contains("1999-01-01"));
    }

    #[test]
    fn narrative_follows_catalog_order_and_skips_blank_answers() {
        let questions = vec![
            question("worry", "悩み", true),
            question("result", "成果", true),
            question("gender", "性別", true),
            question("memo", "メモ", false),
        ];
        let answers: AnswerSet = [
            ("gender", "男性"),
            ("worry", "体重"),
            ("result", "  "),
            ("memo", "内部用"),
            ("unlisted", "漏れない"),
        ]
        .into_iter()
        .collect();

        let narrative = qa_narrative(&answers, &questions);
        let worry = narrative.find("悩み").unwrap();
        let gender = narrative.find("性別").unwrap();
        assert!(worry < gender);
        assert!(!narrative.contains("成果"));
        assert!(!narrative.contains("内部用"));
        assert!(!narrative.contains("漏れない"));
    }

    #[test]
    fn empty_answers_default_gender_and_age() {
        let ctx = GenerationContext::build(&AnswerSet::new(), &catalog(), &ShopSettings::default(), today())
            .unwrap();
        assert_eq!(ctx.gender_label, UNKNOWN_GENDER);
        assert_eq!(ctx.age_label, "30代");
        assert_eq!(ctx.tone(), AgeBucket::Adult.tone());
        assert_eq!(ctx.qa_narrative, "");
    }

    #[test]
    fn keyword_directive_only_when_keywords_set() {
        let answers = AnswerSet::new();
        let without = GenerationContext::build(&answers, &[], &ShopSettings::default(), today())
            .unwrap()
            .render();
        assert!(!without.contains("キーワード"));

        let blank = ShopSettings {
            keywords: Some("   ".into()),
            ..Default::default()
        };
        let blank_prompt = GenerationContext::build(&answers, &[], &blank, today())
            .unwrap()
            .render();
        assert!(!blank_prompt.contains("キーワード"));

        let with = ShopSettings {
            keywords: Some("ダイエット,姿勢改善".into()),
            ..Default::default()
        };
        let prompt = GenerationContext::build(&answers, &[], &with, today())
            .unwrap()
            .render();
        assert!(prompt.contains("以下のキーワードから1つ以上を選び"));
        assert!(prompt.contains("ダイエット,姿勢改善"));
    }

    #[test]
    fn rendered_prompt_carries_every_directive() {
        let settings = ShopSettings {
            shop_name: Some("ABCパーソナルジム".into()),
            ..Default::default()
        };
        let answers: AnswerSet = [("birth", "2003-01-01"), ("gender", "男性")]
            .into_iter()
            .collect();
        let prompt = GenerationContext::build(&answers, &catalog(), &settings, today())
            .unwrap()
            .render();

        assert!(prompt.starts_with("あなたはABCパーソナルジムに通う会員（21歳・男性）です。"));
        assert!(prompt.contains(AgeBucket::Young.tone()));
        assert!(prompt.contains("150文字〜200文字"));
        assert!(prompt.contains("『です・ます』調"));
        assert!(prompt.contains("絵文字は1つまで使用可。"));
        assert!(prompt.contains("嘘は書かず"));
        assert!(prompt.contains("1. 入会前の悩みや不安"));
        assert!(prompt.contains("2. カウンセリングや体験での安心感"));
        assert!(prompt.contains("3. 具体的な成果や今の気持ち"));
        assert!(prompt.contains("出力はクチコミの本文のみ"));
    }

    #[test]
    fn senior_prompt_forbids_exclamation_and_emoji() {
        let answers: AnswerSet = [("birth", "1970-01-01")].into_iter().collect();
        let prompt = GenerationContext::build(&answers, &[], &ShopSettings::default(), today())
            .unwrap()
            .render();
        assert!(prompt.contains(AgeBucket::Senior.tone()));
        assert!(prompt.contains("絵文字は使わない。"));
    }
}
