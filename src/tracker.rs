use chrono::{DateTime, Utc};
use log::debug;

use crate::api::TrackerRepository;
use crate::datetime;
use crate::error::ApiError;
use crate::time_entry::TodayTotal;

/// 1日の目標時間(8時間)。
pub const WORKDAY_SECONDS: u64 = 8 * 3600;

/// `refresh`の発行順を表す番号。
///
/// 最後に発行された番号のレスポンスのみを反映する。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

/// サーバーから取得した今日の合計時間と、ローカルの時計を合わせて表示用の経過時間を計算する。
///
/// 計測中は最後に取得した時刻からの経過秒数を合計時間に加算し、停止中は合計時間をそのまま表示する。
/// 最初の`refresh`が完了するまでは停止中の0秒として扱う。
#[derive(Debug, Clone)]
pub struct ElapsedTracker {
    cumulative_seconds: u64,
    running: bool,
    baseline_fetched_at: DateTime<Utc>,
    goal_seconds: u64,
    latest_ticket: u64,
}

impl ElapsedTracker {
    /// 新しい`ElapsedTracker`を返す。
    ///
    /// # Arguments
    ///
    /// * `goal_seconds` - 進捗率の計算に使う1日の目標時間(秒)
    pub fn new(goal_seconds: u64) -> Self {
        Self {
            cumulative_seconds: 0,
            running: false,
            baseline_fetched_at: datetime::now(),
            goal_seconds: goal_seconds.max(1),
            latest_ticket: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 今日の合計時間を取得し、基準時刻を取得完了時刻に更新する。
    ///
    /// 取得に失敗した場合は状態を変更しない。
    pub async fn refresh<T>(&mut self, repository: &T, offset_minutes: i32) -> Result<(), ApiError>
    where
        T: TrackerRepository + ?Sized,
    {
        let ticket = self.begin_refresh();
        let today = repository.read_today(offset_minutes).await?;
        self.apply(ticket, today, datetime::now());
        Ok(())
    }

    /// 新しい取得を開始したことを記録し、その番号を返す。
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.latest_ticket += 1;
        RefreshTicket(self.latest_ticket)
    }

    /// 取得結果を反映する。
    ///
    /// `ticket`より後に別の取得が開始されていた場合は古い結果として破棄し、`false`を返す。
    ///
    /// # Arguments
    ///
    /// * `ticket` - `begin_refresh`で発行された番号
    /// * `today` - サーバーから取得した今日の合計時間
    /// * `received_at` - レスポンスを受け取った時刻
    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        today: TodayTotal,
        received_at: DateTime<Utc>,
    ) -> bool {
        if ticket.0 != self.latest_ticket {
            debug!(
                "Discard stale today total: ticket {} < latest {}",
                ticket.0, self.latest_ticket
            );
            return false;
        }

        self.cumulative_seconds = today.total_seconds;
        self.running = today.running;
        self.baseline_fetched_at = received_at;
        debug!(
            "Applied today total: {}s, running: {}",
            self.cumulative_seconds, self.running
        );
        true
    }

    /// 指定時刻における表示用の経過秒数を返す。
    ///
    /// 基準時刻より前の時刻が渡されても合計時間より小さくはならない。
    pub fn tick(&self, now: DateTime<Utc>) -> u64 {
        if !self.running {
            return self.cumulative_seconds;
        }

        let elapsed = (now - self.baseline_fetched_at).num_milliseconds().max(0) as u64 / 1000;
        self.cumulative_seconds + elapsed
    }

    /// 目標時間に対する進捗率(0〜100)を返す。
    pub fn progress(&self, displayed_seconds: u64) -> u8 {
        progress_percent(displayed_seconds, self.goal_seconds)
    }
}

/// 目標時間に対する進捗率を四捨五入して返す。100を超えない。
pub fn progress_percent(displayed_seconds: u64, goal_seconds: u64) -> u8 {
    let ratio = displayed_seconds as f64 / goal_seconds.max(1) as f64 * 100.0;
    ratio.min(100.0).round() as u8
}
