use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// 値が無いことを表す表示用の記号。
pub const DASH: &str = "—";

/// 秒数を`HH:MM:SS`形式に変換する。
///
/// 時間の桁数に上限はない。
pub fn format_seconds(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// 日付を`Mon, Jan 01, 2024`の形式に変換する。
pub fn format_date_pretty(day: NaiveDate) -> String {
    day.format("%a, %b %d, %Y").to_string()
}

/// 指定したタイムゾーンでの時刻を`HH:MM`で返す。時刻が無い場合は`—`を返す。
pub fn format_time_or_dash<Tz>(instant: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant
        .map(|instant| instant.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_else(|| DASH.to_string())
}

/// 指定したタイムゾーンでの日付を`YYYY-MM-DD`で返す。
pub fn format_local_date<Tz>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format("%Y-%m-%d").to_string()
}

/// 秒数を小数点以下2桁の時間に変換する。
pub fn format_hours(total_seconds: u64) -> String {
    format!("{:.2}", total_seconds as f64 / 3600.0)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::zero(0, "00:00:00")]
    #[case::mixed(3661, "01:01:01")]
    #[case::one_day(86400, "24:00:00")]
    #[case::over_99_hours(360_000 + 59, "100:00:59")]
    fn test_format_seconds(#[case] input: u64, #[case] expected: &str) {
        assert_eq!(format_seconds(input), expected);
    }

    #[test]
    fn test_format_date_pretty() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert_eq!(format_date_pretty(day), "Mon, Jan 01, 2024");
    }

    #[test]
    fn test_format_time_or_dash() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();

        assert_eq!(format_time_or_dash(Some(instant), &tokyo), "08:30");
        assert_eq!(format_time_or_dash(None, &tokyo), DASH);
    }

    /// タイムゾーンによって日付が変わることを確認する。
    #[test]
    fn test_format_local_date() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();

        assert_eq!(format_local_date(instant, &Utc), "2024-01-01");
        assert_eq!(format_local_date(instant, &tokyo), "2024-01-02");
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(5400), "1.50");
        assert_eq!(format_hours(0), "0.00");
    }
}
