use anyhow::{Context, Result};
use log::info;

use crate::api::TrackerRepository;
use crate::reports::{ReportRange, ReportSummary};

/// `reports`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct ReportsArgs {
    #[clap(
        short = 'r',
        long = "range",
        default_value = "7",
        help = "Range in days: 7, 30 or 90"
    )]
    pub range: ReportRange,
}

pub struct ReportsCommand<'a, T: TrackerRepository> {
    repository: &'a T,
    offset_minutes: i32,
}

impl<'a, T: TrackerRepository> ReportsCommand<'a, T> {
    /// 新しい`ReportsCommand`を返す。
    pub fn new(repository: &'a T, offset_minutes: i32) -> Self {
        Self {
            repository,
            offset_minutes,
        }
    }

    /// 指定された期間の履歴を取得して集計する。
    pub async fn run(&self, args: ReportsArgs) -> Result<ReportSummary> {
        let history = self
            .repository
            .read_history(args.range.days(), self.offset_minutes)
            .await
            .with_context(|| format!("Failed to retrieve {} days of history", args.range.days()))?;
        info!("Report over {} days: {} entries", args.range.days(), history.len());

        Ok(ReportSummary::from_history(&history))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::{ReportsArgs, ReportsCommand};
    use crate::api::MockTrackerRepository;
    use crate::reports::ReportRange;
    use crate::time_entry::DailyTotal;

    #[rstest]
    #[case(ReportRange::Week, 7)]
    #[case(ReportRange::Quarter, 90)]
    #[tokio::test]
    async fn test_reports_command(#[case] range: ReportRange, #[case] days: u32) {
        let mut repository = MockTrackerRepository::new();
        repository
            .expect_read_history()
            .withf(move |requested, offset| *requested == days && *offset == 120)
            .times(1)
            .returning(|_, _| {
                Ok(vec![DailyTotal {
                    day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    total_seconds: 3600,
                }])
            });

        let command = ReportsCommand::new(&repository, 120);
        let summary = command.run(ReportsArgs { range }).await.unwrap();

        assert_eq!(summary.total_seconds, 3600);
    }
}
