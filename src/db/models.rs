use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

// ── Questions ──

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Text,
    Textarea,
    Date,
    Radio,
    Checkbox,
    Rating,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Textarea => "textarea",
            QuestionType::Date => "date",
            QuestionType::Radio => "radio",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Rating => "rating",
        }
    }

    /// Unknown type names fall back to a plain text input.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "textarea" => QuestionType::Textarea,
            "date" => QuestionType::Date,
            "radio" => QuestionType::Radio,
            "checkbox" => QuestionType::Checkbox,
            "rating" => QuestionType::Rating,
            _ => QuestionType::Text,
        }
    }
}

fn default_step() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub ai_use: bool,
    #[serde(default = "default_step")]
    pub step: u32,
}

/// Candidate question the admin can pick from when building the survey.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PoolQuestion {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub category: String,
}

/// Options are stored as one comma separated cell.
pub fn join_options(options: &[String]) -> String {
    options.join(",")
}

pub fn split_options(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|opt| opt.trim().to_string())
        .filter(|opt| !opt.is_empty())
        .collect()
}

// ── Answers ──

/// One respondent's answers keyed by question id.
///
/// Multi-select answers arrive either already joined or as an array; arrays
/// are joined with `", "`. Numbers and booleans are stringified and nulls
/// are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSet(BTreeMap<String, String>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.0.insert(id.into(), value.into());
    }

    /// Returns the answer only when it carries some text.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0
            .get(id)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn answer_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(answer_text).collect();
            Some(parts.join(", "))
        }
        other @ Value::Object(_) => Some(other.to_string()),
    }
}

impl Serialize for AnswerSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnswerSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .filter_map(|(k, v)| answer_text(v).map(|v| (k, v)))
                .collect(),
        ))
    }
}

// ── Settings ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ShopName,
    GoogleMapUrl,
    Keywords,
    AdminPassword,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::ShopName,
        SettingKey::GoogleMapUrl,
        SettingKey::Keywords,
        SettingKey::AdminPassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::ShopName => "shop_name",
            SettingKey::GoogleMapUrl => "google_map_url",
            SettingKey::Keywords => "keywords",
            SettingKey::AdminPassword => "admin_password",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

/// Shop configuration. Every key may be missing; empty values count as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShopSettings {
    pub shop_name: Option<String>,
    pub google_map_url: Option<String>,
    pub keywords: Option<String>,
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
}

impl ShopSettings {
    pub fn get(&self, key: SettingKey) -> Option<&str> {
        match key {
            SettingKey::ShopName => self.shop_name.as_deref(),
            SettingKey::GoogleMapUrl => self.google_map_url.as_deref(),
            SettingKey::Keywords => self.keywords.as_deref(),
            SettingKey::AdminPassword => self.admin_password.as_deref(),
        }
    }

    pub fn set(&mut self, key: SettingKey, value: &str) {
        let value = Some(value.to_string()).filter(|v| !v.trim().is_empty());
        match key {
            SettingKey::ShopName => self.shop_name = value,
            SettingKey::GoogleMapUrl => self.google_map_url = value,
            SettingKey::Keywords => self.keywords = value,
            SettingKey::AdminPassword => self.admin_password = value,
        }
    }

    pub fn public(&self) -> PublicSettings {
        PublicSettings {
            shop_name: self.shop_name.clone().unwrap_or_default(),
            google_map_url: self.google_map_url.clone().unwrap_or_default(),
            keywords: self.keywords.clone().unwrap_or_default(),
        }
    }
}

/// Settings as exposed to survey clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicSettings {
    pub shop_name: String,
    pub google_map_url: String,
    pub keywords: String,
}

/// Partial settings write. Keys left as `None` keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub google_map_url: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl SettingsUpdate {
    /// True when the update would store a blank admin password.
    pub fn clears_admin_password(&self) -> bool {
        self.admin_password
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
    }

    pub fn entries(&self) -> Vec<(SettingKey, &str)> {
        SettingKey::ALL
            .into_iter()
            .filter_map(|key| {
                let value = match key {
                    SettingKey::ShopName => self.shop_name.as_deref(),
                    SettingKey::GoogleMapUrl => self.google_map_url.as_deref(),
                    SettingKey::Keywords => self.keywords.as_deref(),
                    SettingKey::AdminPassword => self.admin_password.as_deref(),
                };
                value.map(|v| (key, v))
            })
            .collect()
    }
}

// ── Archive ──

/// Current layout of archived answers: a key/value object.
pub const ARCHIVE_SCHEMA_VERSION: i64 = 2;

/// Column order of the legacy positional answer sheet.
pub const ARCHIVE_COLUMNS: &[&str] = &[
    "birth",
    "gender",
    "how_found",
    "other_gyms",
    "worry",
    "worry_detail",
    "why_choose",
    "anxiety",
    "first_impression",
    "frequency",
    "duration",
    "result_physical",
    "result_mental",
    "satisfaction",
    "recommend",
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReviewRecord {
    pub id: String,
    pub created_at: String,
    pub answers: AnswerSet,
    pub generated_text: String,
    pub schema_version: i64,
}

impl ReviewRecord {
    pub fn new(created_at: String, answers: AnswerSet, generated_text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at,
            answers,
            generated_text,
            schema_version: ARCHIVE_SCHEMA_VERSION,
        }
    }

    /// Projects the record onto the legacy sheet layout:
    /// timestamp, the fixed answer columns, then the generated text.
    pub fn legacy_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(ARCHIVE_COLUMNS.len() + 2);
        row.push(self.created_at.clone());
        for column in ARCHIVE_COLUMNS {
            row.push(self.answers.get(column).unwrap_or_default().to_string());
        }
        row.push(self.generated_text.clone());
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answers_normalise_arrays_and_scalars() {
        let answers: AnswerSet = serde_json::from_value(json!({
            "worry": ["体力", "姿勢"],
            "satisfaction": 5,
            "recommend": true,
            "other_gyms": null,
            "gender": "女性"
        }))
        .unwrap();

        assert_eq!(answers.get("worry"), Some("体力, 姿勢"));
        assert_eq!(answers.get("satisfaction"), Some("5"));
        assert_eq!(answers.get("recommend"), Some("true"));
        assert_eq!(answers.get("other_gyms"), None);
        assert_eq!(answers.len(), 4);
    }

    #[test]
    fn blank_answers_read_as_missing() {
        let answers: AnswerSet = [("worry", "  "), ("gender", "")].into_iter().collect();
        assert_eq!(answers.get("worry"), None);
        assert_eq!(answers.get("gender"), None);
    }

    #[test]
    fn question_defaults_when_fields_missing() {
        let q: Question = serde_json::from_value(json!({"id": "worry", "label": "悩み"})).unwrap();
        assert_eq!(q.kind, QuestionType::Text);
        assert_eq!(q.step, 1);
        assert!(!q.ai_use);
        assert!(q.options.is_empty());
    }

    #[test]
    fn options_cell_trims_entries() {
        assert_eq!(split_options(" 男性, 女性 ,その他"), vec!["男性", "女性", "その他"]);
        assert!(split_options("").is_empty());
    }

    #[test]
    fn settings_update_only_lists_provided_keys() {
        let update = SettingsUpdate {
            keywords: Some("ダイエット".into()),
            ..Default::default()
        };
        assert_eq!(update.entries(), vec![(SettingKey::Keywords, "ダイエット")]);
    }

    #[test]
    fn blank_admin_password_is_flagged() {
        let blank = SettingsUpdate {
            admin_password: Some(" ".into()),
            ..Default::default()
        };
        assert!(blank.clears_admin_password());
        assert!(!SettingsUpdate::default().clears_admin_password());
    }

    #[test]
    fn admin_password_is_never_serialized() {
        let settings = ShopSettings {
            shop_name: Some("ABCジム".into()),
            admin_password: Some("secret".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert!(value.get("admin_password").is_none());
        assert_eq!(value["shop_name"], "ABCジム");
    }

    #[test]
    fn legacy_row_keeps_fixed_column_order() {
        let answers: AnswerSet = [("gender", "男性"), ("birth", "1990-01-01"), ("extra", "x")]
            .into_iter()
            .collect();
        let record = ReviewRecord::new("2024/06/01 10:00:00".into(), answers, "本文".into());
        let row = record.legacy_row();

        assert_eq!(row.len(), ARCHIVE_COLUMNS.len() + 2);
        assert_eq!(row[0], "2024/06/01 10:00:00");
        assert_eq!(row[1], "1990-01-01");
        assert_eq!(row[2], "男性");
        assert_eq!(row.last().map(String::as_str), Some("本文"));
        assert_eq!(record.schema_version, ARCHIVE_SCHEMA_VERSION);
    }
}
