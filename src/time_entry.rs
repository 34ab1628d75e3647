use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 1回分の計測セッション。
///
/// `end_at`が`None`のエントリーは現在計測中のセッションを表す。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
    pub project_color: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl TimeEntry {
    /// セッションの長さを秒で返す。
    ///
    /// 計測中のセッションは0秒とし、終了が開始より前になっている場合も0秒に丸める。
    pub fn duration_seconds(&self) -> u64 {
        match self.end_at {
            Some(end_at) => (end_at - self.start_at).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    /// タグ名を`" | "`で連結した文字列を返す。
    pub fn tag_names(&self) -> String {
        self.tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// 1日分の合計時間。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DailyTotal {
    #[serde(deserialize_with = "deserialize_day")]
    pub day: NaiveDate,
    pub total_seconds: u64,
}

/// 今日の合計時間と計測中かどうか。
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct TodayTotal {
    #[serde(default)]
    pub total_seconds: u64,
    #[serde(default)]
    pub running: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
}

/// ログイン中のユーザー情報。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Me {
    pub email: String,
    pub full_name: String,
    pub avatar_path: Option<String>,
    pub role: Option<String>,
}

impl Me {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// セッションの開始・終了時に送るリクエスト。
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionRequest {
    pub project_id: Option<i64>,
    pub note: Option<String>,
    #[serde(rename = "tags")]
    pub tag_ids: Vec<i64>,
}

impl SessionRequest {
    /// 新しい`SessionRequest`を返す。
    ///
    /// 空のメモは送らない。
    pub fn new(project_id: Option<i64>, note: Option<String>, tag_ids: Vec<i64>) -> Self {
        Self {
            project_id,
            note: note.filter(|note| !note.is_empty()),
            tag_ids,
        }
    }
}

/// 日付を`YYYY-MM-DD`またはISO8601の日時文字列からパースする。
///
/// 日時が渡された場合は日付部分のみを利用する。
fn deserialize_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let date_part = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::{DailyTotal, SessionRequest, Tag, TimeEntry, TodayTotal};

    fn entry(end_offset: Option<i64>) -> TimeEntry {
        let start_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        TimeEntry {
            id: 1,
            start_at,
            end_at: end_offset.map(|secs| start_at + chrono::Duration::seconds(secs)),
            note: None,
            project_id: None,
            project_name: None,
            project_color: None,
            tags: vec![],
        }
    }

    #[rstest]
    #[case::finished(Some(3661), 3661)]
    #[case::running(None, 0)]
    #[case::end_before_start(Some(-30), 0)]
    fn test_duration_seconds(#[case] end_offset: Option<i64>, #[case] expected: u64) {
        assert_eq!(entry(end_offset).duration_seconds(), expected);
    }

    #[test]
    fn test_tag_names() {
        let mut target = entry(None);
        target.tags = vec![
            Tag {
                id: 1,
                name: "dev".to_string(),
                color: None,
            },
            Tag {
                id: 2,
                name: "review".to_string(),
                color: Some("#fff".to_string()),
            },
        ];

        assert_eq!(target.tag_names(), "dev | review");
        assert_eq!(entry(None).tag_names(), "");
    }

    #[rstest]
    #[case::date_only(r#"{"day":"2024-03-05","total_seconds":10}"#)]
    #[case::date_time(r#"{"day":"2024-03-05T00:00:00.000Z","total_seconds":10}"#)]
    fn test_daily_total_day_formats(#[case] json: &str) {
        let total: DailyTotal = serde_json::from_str(json).unwrap();

        assert_eq!(total.day, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(total.total_seconds, 10);
    }

    #[test]
    fn test_today_total_defaults() {
        let today: TodayTotal = serde_json::from_str("{}").unwrap();

        assert_eq!(today, TodayTotal::default());
    }

    #[test]
    fn test_session_request_serialization() {
        let request = SessionRequest::new(Some(3), Some(String::new()), vec![1, 2]);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"project_id": 3, "note": null, "tags": [1, 2]})
        );
    }

    #[test]
    fn test_entry_deserialization_without_tags() {
        let json = r#"{
            "id": 7,
            "start_at": "2024-01-01T09:00:00Z",
            "end_at": null,
            "note": "writing",
            "project_id": null,
            "project_name": null,
            "project_color": null
        }"#;
        let entry: TimeEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.end_at, None);
        assert_eq!(entry.duration_seconds(), 0);
        assert!(entry.tags.is_empty());
        assert_eq!(entry.note.as_deref(), Some("writing"));
    }
}
