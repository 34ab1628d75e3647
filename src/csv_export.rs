use std::borrow::Cow;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone};
use log::info;

use crate::format::{format_date_pretty, format_local_date, format_seconds, format_time_or_dash};
use crate::time_entry::{DailyTotal, TimeEntry};

/// 出力するCSVのMIMEタイプ。
pub const CSV_MIME_TYPE: &str = "text/csv";

pub const DAILY_TOTALS_HEADERS: [&str; 4] = ["Date", "Pretty", "TotalSeconds", "Formatted"];

pub const ENTRIES_HEADERS: [&str; 9] = [
    "ID",
    "Date",
    "StartAtLocal",
    "EndAtLocal",
    "DurationSeconds",
    "DurationFormatted",
    "Project",
    "Tags",
    "Note",
];

/// CSVの1フィールドをエスケープする。
///
/// カンマ、ダブルクォート、改行のいずれかを含む場合のみダブルクォートで囲み、
/// 中のダブルクォートは2つに重ねる。
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// ヘッダーと行からCSVの文字列を作成する。
///
/// 行の順序は入力のまま。行の区切りは`\n`で、末尾には改行を付けない。
pub fn to_csv<H, F>(headers: &[H], rows: &[Vec<F>]) -> String
where
    H: AsRef<str>,
    F: AsRef<str>,
{
    let header_line = headers
        .iter()
        .map(|header| header.as_ref())
        .collect::<Vec<_>>()
        .join(",");

    std::iter::once(header_line)
        .chain(rows.iter().map(|row| {
            row.iter()
                .map(|field| escape_field(field.as_ref()))
                .collect::<Vec<_>>()
                .join(",")
        }))
        .collect::<Vec<_>>()
        .join("\n")
}

/// CSVをファイルに書き出し、書き出したパスを返す。
///
/// # Arguments
///
/// * `dir` - 出力先のディレクトリ。存在しない場合は作成する
/// * `filename` - 出力するファイル名
/// * `headers` - ヘッダー行
/// * `rows` - データ行
pub fn export_csv<H, F>(
    dir: &Path,
    filename: &str,
    headers: &[H],
    rows: &[Vec<F>],
) -> Result<PathBuf>
where
    H: AsRef<str>,
    F: AsRef<str>,
{
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
    let path = dir.join(filename);
    let content = to_csv(headers, rows);
    fs::write(&path, content.as_bytes())
        .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
    info!("Exported {} rows ({}) to {}", rows.len(), CSV_MIME_TYPE, path.display());

    Ok(path)
}

/// 日付入りのファイル名を返す。
pub fn dated_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y-%m-%d"))
}

/// 日毎の合計時間をCSVの行に変換する。
pub fn daily_totals_rows(history: &[DailyTotal]) -> Vec<Vec<String>> {
    history
        .iter()
        .map(|total| {
            vec![
                total.day.format("%Y-%m-%d").to_string(),
                format_date_pretty(total.day),
                total.total_seconds.to_string(),
                format_seconds(total.total_seconds),
            ]
        })
        .collect()
}

/// セッションをCSVの行に変換する。
///
/// 日付と時刻は`tz`で表示する。プロジェクトとメモが無い場合は空欄とする。
pub fn entries_rows<Tz>(entries: &[TimeEntry], tz: &Tz) -> Vec<Vec<String>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    entries
        .iter()
        .map(|entry| {
            let duration = entry.duration_seconds();
            vec![
                entry.id.to_string(),
                format_local_date(entry.start_at, tz),
                format_time_or_dash(Some(entry.start_at), tz),
                format_time_or_dash(entry.end_at, tz),
                duration.to_string(),
                format_seconds(duration),
                entry.project_name.clone().unwrap_or_default(),
                entry.tag_names(),
                entry.note.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

/// 日毎の合計時間を`daily_totals_<日付>.csv`に書き出す。
pub fn export_daily_totals(
    dir: &Path,
    history: &[DailyTotal],
    today: NaiveDate,
) -> Result<PathBuf> {
    export_csv(
        dir,
        &dated_filename("daily_totals", today),
        &DAILY_TOTALS_HEADERS,
        &daily_totals_rows(history),
    )
}

/// セッション一覧を`sessions_<日付>.csv`に書き出す。
pub fn export_entries<Tz>(
    dir: &Path,
    entries: &[TimeEntry],
    tz: &Tz,
    today: NaiveDate,
) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    export_csv(
        dir,
        &dated_filename("sessions", today),
        &ENTRIES_HEADERS,
        &entries_rows(entries, tz),
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::format::DASH;
    use crate::time_entry::Tag;

    #[rstest]
    #[case::plain("plain", "plain")]
    #[case::comma("a,b", "\"a,b\"")]
    #[case::quote("a,\"b\"", "\"a,\"\"b\"\"\"")]
    #[case::only_quote("say \"hi\"", "\"say \"\"hi\"\"\"")]
    #[case::newline("line1\nline2", "\"line1\nline2\"")]
    #[case::empty("", "")]
    fn test_escape_field(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_field(input), expected);
    }

    #[test]
    fn test_to_csv() {
        let rows = vec![vec!["x", "y,z"]];

        assert_eq!(to_csv(&["A", "B"], &rows), "A,B\nx,\"y,z\"");
    }

    #[test]
    fn test_to_csv_keeps_row_order() {
        let rows = vec![vec!["2"], vec!["1"], vec!["3"]];

        assert_eq!(to_csv(&["N"], &rows), "N\n2\n1\n3");
    }

    #[test]
    fn test_to_csv_header_only() {
        let rows: Vec<Vec<String>> = vec![];

        assert_eq!(to_csv(&DAILY_TOTALS_HEADERS, &rows), "Date,Pretty,TotalSeconds,Formatted");
    }

    #[test]
    fn test_daily_totals_rows() {
        let history = vec![DailyTotal {
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total_seconds: 3661,
        }];

        assert_eq!(
            to_csv(&DAILY_TOTALS_HEADERS, &daily_totals_rows(&history)),
            "Date,Pretty,TotalSeconds,Formatted\n2024-01-01,\"Mon, Jan 01, 2024\",3661,01:01:01"
        );
    }

    fn dummy_entries() -> Vec<TimeEntry> {
        let start_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        vec![
            TimeEntry {
                id: 2,
                start_at: start_at + chrono::Duration::hours(3),
                end_at: None,
                note: None,
                project_id: None,
                project_name: None,
                project_color: None,
                tags: vec![],
            },
            TimeEntry {
                id: 1,
                start_at,
                end_at: Some(start_at + chrono::Duration::seconds(5400)),
                note: Some("review \"auth\", part 2".to_string()),
                project_id: Some(4),
                project_name: Some("Website".to_string()),
                project_color: Some("#7A5CFF".to_string()),
                tags: vec![
                    Tag {
                        id: 1,
                        name: "dev".to_string(),
                        color: None,
                    },
                    Tag {
                        id: 2,
                        name: "review".to_string(),
                        color: None,
                    },
                ],
            },
        ]
    }

    #[test]
    fn test_entries_rows() {
        let rows = entries_rows(&dummy_entries(), &Utc);

        assert_eq!(
            rows[0],
            vec!["2", "2024-01-01", "12:00", DASH, "0", "00:00:00", "", "", ""]
        );
        assert_eq!(
            rows[1],
            vec![
                "1",
                "2024-01-01",
                "09:00",
                "10:30",
                "5400",
                "01:30:00",
                "Website",
                "dev | review",
                "review \"auth\", part 2",
            ]
        );
        assert_eq!(
            to_csv(&ENTRIES_HEADERS, &rows).lines().nth(2).unwrap(),
            "1,2024-01-01,09:00,10:30,5400,01:30:00,Website,dev | review,\"review \"\"auth\"\", part 2\""
        );
    }

    #[test]
    fn test_dated_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(dated_filename("sessions", date), "sessions_2024-03-09.csv");
    }

    /// 同じ入力から同じ内容のファイルが書き出されることを確認する。
    #[test]
    fn test_export_daily_totals_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("timetrack-export-{}", std::process::id()));
        let history = vec![
            DailyTotal {
                day: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                total_seconds: 60,
            },
            DailyTotal {
                day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                total_seconds: 0,
            },
        ];

        let first_path =
            export_daily_totals(&dir, &history, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
                .unwrap();
        let first = fs::read(&first_path).unwrap();
        let second_path =
            export_daily_totals(&dir, &history, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
                .unwrap();
        let second = fs::read(&second_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first_path.file_name().unwrap().to_str().unwrap(),
            "daily_totals_2024-01-02.csv"
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
