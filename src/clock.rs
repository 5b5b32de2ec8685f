use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

pub fn jst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

pub fn jst_today() -> NaiveDate {
    jst_now().date_naive()
}

/// Archive timestamp, e.g. `2024/06/01 09:05:00`.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y/%m/%d %H:%M:%S").to_string()
}
