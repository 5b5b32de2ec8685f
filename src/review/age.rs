use chrono::{Datelike, NaiveDate};

use super::ReviewError;

/// Age label used when no birth date was answered.
pub const DEFAULT_AGE_LABEL: &str = "30代";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    /// 24 and under.
    Young,
    /// 25 to 44, and the fallback when the age is unknown.
    Adult,
    /// 45 and over.
    Senior,
}

impl AgeBucket {
    pub fn from_age(age: i32) -> Self {
        if age <= 24 {
            AgeBucket::Young
        } else if age >= 45 {
            AgeBucket::Senior
        } else {
            AgeBucket::Adult
        }
    }

    pub fn tone(&self) -> &'static str {
        match self {
            AgeBucket::Young => "少しラフで熱量が高い感じ。文末に「！」を使っても良い（1回まで）。",
            AgeBucket::Adult => "常識ある大人の書き方。基本は「。」で終わる。「！」は控えめに。",
            AgeBucket::Senior => "非常に丁寧で落ち着いた、品のある書き方。「！」は使わない。",
        }
    }

    pub fn emoji_rule(&self) -> &'static str {
        match self {
            AgeBucket::Young => "絵文字は1つまで使用可。",
            AgeBucket::Adult | AgeBucket::Senior => "絵文字は使わない。",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeProfile {
    pub label: String,
    pub bucket: AgeBucket,
}

impl AgeProfile {
    pub fn unknown() -> Self {
        Self {
            label: DEFAULT_AGE_LABEL.to_string(),
            bucket: AgeBucket::Adult,
        }
    }

    pub fn from_birth_answer(answer: Option<&str>, today: NaiveDate) -> Result<Self, ReviewError> {
        let Some(answer) = answer else {
            return Ok(Self::unknown());
        };
        let birth = parse_birth_date(answer)?;
        if birth > today {
            return Err(ReviewError::InvalidBirthDate(answer.to_string()));
        }
        let age = age_on(birth, today);
        Ok(Self {
            label: format!("{age}歳"),
            bucket: AgeBucket::from_age(age),
        })
    }
}

pub fn parse_birth_date(value: &str) -> Result<NaiveDate, ReviewError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .map_err(|_| ReviewError::InvalidBirthDate(value.to_string()))
}

/// Whole years between `birth` and `today`, minus one if this year's
/// birthday has not happened yet.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
