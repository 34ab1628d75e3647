use std::str::FromStr;

use anyhow::{anyhow, Error};
use chrono::{Datelike, Weekday};

use crate::time_entry::DailyTotal;

/// レポートの集計期間。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRange {
    Week,
    Month,
    Quarter,
}

impl ReportRange {
    pub fn days(&self) -> u32 {
        match self {
            ReportRange::Week => 7,
            ReportRange::Month => 30,
            ReportRange::Quarter => 90,
        }
    }
}

impl FromStr for ReportRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7" => Ok(ReportRange::Week),
            "30" => Ok(ReportRange::Month),
            "90" => Ok(ReportRange::Quarter),
            _ => Err(anyhow!("Range must be one of 7, 30 or 90 days: {}", s)),
        }
    }
}

/// 集計結果。時間は全て秒で保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total_seconds: u64,
    /// 1日あたりの平均。日数が0の場合は1日として計算する。
    pub average_seconds: f64,
    /// 最も長く計測した日。全ての日が0秒の場合は`None`。
    pub best_day: Option<DailyTotal>,
    /// 古い日付から順に並べた日毎の合計。
    pub daily: Vec<DailyTotal>,
    /// 月曜から日曜の順に並べた曜日毎の合計。該当する日が無い曜日は含めない。
    pub weekdays: Vec<(Weekday, u64)>,
}

impl ReportSummary {
    /// サーバーから取得した日毎の合計時間を集計する。
    ///
    /// サーバーは新しい日付から順に返すため、逆順にして時系列に並べる。
    pub fn from_history(history: &[DailyTotal]) -> Self {
        let total_seconds = history.iter().map(|total| total.total_seconds).sum::<u64>();
        let count_days = history.len().max(1);
        let average_seconds = total_seconds as f64 / count_days as f64;

        let best_day = history
            .iter()
            .fold(None::<&DailyTotal>, |best, total| match best {
                Some(best) if best.total_seconds >= total.total_seconds => Some(best),
                _ if total.total_seconds > 0 => Some(total),
                _ => best,
            })
            .cloned();

        let daily = history.iter().rev().cloned().collect();

        let mut by_weekday = [0u64; 7];
        let mut seen = [false; 7];
        for total in history {
            let index = total.day.weekday().num_days_from_monday() as usize;
            by_weekday[index] += total.total_seconds;
            seen[index] = true;
        }
        let weekdays = (0..7)
            .filter(|index| seen[*index])
            .map(|index| (WEEKDAYS[index], by_weekday[index]))
            .collect();

        Self {
            total_seconds,
            average_seconds,
            best_day,
            daily,
            weekdays,
        }
    }
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];
