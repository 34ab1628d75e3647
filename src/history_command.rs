use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::info;

use crate::api::TrackerRepository;
use crate::csv_export::{export_daily_totals, export_entries};
use crate::datetime;
use crate::time_entry::{DailyTotal, TimeEntry};
use crate::tracker_command::HISTORY_DAYS;

/// `history`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct HistoryArgs {
    #[clap(
        short = 'd',
        long = "days",
        default_value_t = HISTORY_DAYS,
        help = "Number of days to show"
    )]
    pub days: u32,
}

/// `export`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    #[clap(subcommand)]
    pub target: ExportTarget,
}

/// CSVに書き出す対象。
#[derive(Debug, clap::Subcommand)]
pub enum ExportTarget {
    /// Export daily totals as daily_totals_<date>.csv
    Days {
        #[clap(short = 'd', long = "days", default_value_t = HISTORY_DAYS)]
        days: u32,
    },
    /// Export the recent sessions as sessions_<date>.csv
    Sessions,
}

pub struct HistoryCommand<'a, T: TrackerRepository> {
    repository: &'a T,
    offset_minutes: i32,
}

impl<'a, T: TrackerRepository> HistoryCommand<'a, T> {
    /// 新しい`HistoryCommand`を返す。
    pub fn new(repository: &'a T, offset_minutes: i32) -> Self {
        Self {
            repository,
            offset_minutes,
        }
    }

    /// ローカルタイムゾーンの日付で集計した日毎の合計時間を取得する。
    pub async fn history(&self, args: &HistoryArgs) -> Result<Vec<DailyTotal>> {
        let history = self
            .repository
            .read_history(args.days, self.offset_minutes)
            .await
            .context("Failed to retrieve history")?;
        info!("History retrieved successfully.");
        Ok(history)
    }

    /// 直近のセッション一覧を取得する。
    pub async fn entries(&self) -> Result<Vec<TimeEntry>> {
        let entries = self
            .repository
            .read_entries()
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");
        Ok(entries)
    }

    /// 指定した対象をCSVとして`dir`に書き出し、書き出したパスを返す。
    ///
    /// ファイル名の日付はUTCの今日の日付を使う。
    pub async fn export(&self, args: ExportArgs, dir: &Path) -> Result<PathBuf> {
        let today = datetime::now().date_naive();
        match args.target {
            ExportTarget::Days { days } => {
                let history = self.history(&HistoryArgs { days }).await?;
                export_daily_totals(dir, &history, today)
            }
            ExportTarget::Sessions => {
                let entries = self.entries().await?;
                export_entries(dir, &entries, &Local, today)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{ExportArgs, ExportTarget, HistoryArgs, HistoryCommand};
    use crate::api::MockTrackerRepository;
    use crate::datetime::mock_datetime;
    use crate::time_entry::DailyTotal;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("timetrack-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_history() {
        let mut repository = MockTrackerRepository::new();
        repository
            .expect_read_history()
            .withf(|days, offset| *days == 7 && *offset == -60)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let command = HistoryCommand::new(&repository, -60);
        let result = command.history(&HistoryArgs { days: 7 }).await;

        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_days() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap());
        let dir = temp_dir("export-days");
        let mut repository = MockTrackerRepository::new();
        repository
            .expect_read_history()
            .withf(|days, _| *days == 30)
            .times(1)
            .returning(|_, _| {
                Ok(vec![DailyTotal {
                    day: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                    total_seconds: 7200,
                }])
            });

        let command = HistoryCommand::new(&repository, 0);
        let path = command
            .export(
                ExportArgs {
                    target: ExportTarget::Days { days: 30 },
                },
                &dir,
            )
            .await
            .unwrap();

        assert_eq!(path, dir.join("daily_totals_2024-02-01.csv"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Date,Pretty,TotalSeconds,Formatted\n2024-02-01,\"Thu, Feb 01, 2024\",7200,02:00:00"
        );
        fs::remove_dir_all(&dir).unwrap();
        mock_datetime::clear_mock_time();
    }

    /// セッションが無い場合もヘッダーのみのCSVを書き出す。
    #[tokio::test]
    async fn test_export_sessions_empty() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap());
        let dir = temp_dir("export-sessions");
        let mut repository = MockTrackerRepository::new();
        repository
            .expect_read_entries()
            .times(1)
            .returning(|| Ok(vec![]));

        let command = HistoryCommand::new(&repository, 0);
        let path = command
            .export(
                ExportArgs {
                    target: ExportTarget::Sessions,
                },
                &dir,
            )
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "ID,Date,StartAtLocal,EndAtLocal,DurationSeconds,DurationFormatted,Project,Tags,Note"
        );
        fs::remove_dir_all(&dir).unwrap();
        mock_datetime::clear_mock_time();
    }
}
