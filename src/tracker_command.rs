use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::time::Instant;

use crate::api::TrackerRepository;
use crate::console::{today_line, ConsolePresenter};
use crate::datetime;
use crate::error::ApiError;
use crate::time_entry::{DailyTotal, SessionRequest, TimeEntry};
use crate::tracker::ElapsedTracker;

/// 画面を開いた時に取得する履歴の日数。
pub const HISTORY_DAYS: u32 = 60;

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// `today`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct TodayArgs {
    #[clap(
        short = 'w',
        long = "watch",
        help = "Keep updating the elapsed time every second until Ctrl-C"
    )]
    pub watch: bool,
}

/// `start`と`stop`サブコマンドの引数。
#[derive(Debug, Default, clap::Args)]
pub struct SessionArgs {
    #[clap(short = 'p', long = "project", help = "Project ID of the session")]
    pub project: Option<i64>,

    #[clap(short = 't', long = "tag", help = "Tag ID of the session (repeatable)")]
    pub tags: Vec<i64>,

    #[clap(short = 'n', long = "note", help = "What are you working on?")]
    pub note: Option<String>,
}

impl From<SessionArgs> for SessionRequest {
    fn from(args: SessionArgs) -> Self {
        SessionRequest::new(args.project, args.note, args.tags)
    }
}

/// 計測画面の状態。今日の経過時間、日毎の履歴、セッション一覧を保持する。
pub struct TrackerView<'a, T: TrackerRepository> {
    repository: &'a T,
    tracker: ElapsedTracker,
    history: Vec<DailyTotal>,
    entries: Vec<TimeEntry>,
    offset_minutes: i32,
}

impl<'a, T: TrackerRepository> TrackerView<'a, T> {
    /// 新しい`TrackerView`を返す。
    ///
    /// # Arguments
    ///
    /// * `repository` - サーバーと通信するためのリポジトリ
    /// * `goal_seconds` - 1日の目標時間(秒)
    /// * `offset_minutes` - ローカルタイムゾーンのUTCからのオフセット(分)
    pub fn new(repository: &'a T, goal_seconds: u64, offset_minutes: i32) -> Self {
        Self {
            repository,
            tracker: ElapsedTracker::new(goal_seconds),
            history: vec![],
            entries: vec![],
            offset_minutes,
        }
    }

    pub fn history(&self) -> &[DailyTotal] {
        &self.history
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    /// 今日の合計、履歴、セッション一覧を並行して取得する。
    ///
    /// 履歴とセッション一覧の取得に失敗した場合は警告を出して前回の値を残す。
    /// 今日の合計の失敗と認証切れはエラーとして返す。
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let ticket = self.tracker.begin_refresh();
        let (today, history, entries) = tokio::join!(
            self.repository.read_today(self.offset_minutes),
            self.repository.read_history(HISTORY_DAYS, self.offset_minutes),
            self.repository.read_entries(),
        );
        let received_at = datetime::now();

        self.tracker.apply(ticket, today?, received_at);
        if let Some(history) = keep_on_failure(history, "history")? {
            self.history = history;
        }
        if let Some(entries) = keep_on_failure(entries, "sessions")? {
            self.entries = entries;
        }
        Ok(())
    }

    /// 今日の合計のみを取得し直す。
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        self.tracker
            .refresh(self.repository, self.offset_minutes)
            .await
    }

    /// セッションを開始し、全ての表示を取得し直す。
    pub async fn start(&mut self, args: SessionArgs) -> Result<()> {
        let request = SessionRequest::from(args);
        self.repository
            .start_session(&request)
            .await
            .context("Failed to start session")?;
        self.load()
            .await
            .context("Failed to reload after starting session")?;
        info!("Session started: {:?}", request);
        Ok(())
    }

    /// 計測中のセッションを終了し、全ての表示を取得し直す。
    pub async fn stop(&mut self, args: SessionArgs) -> Result<()> {
        let request = SessionRequest::from(args);
        self.repository
            .stop_session(&request)
            .await
            .context("Failed to stop session")?;
        self.load()
            .await
            .context("Failed to reload after stopping session")?;
        info!("Session stopped: {:?}", request);
        Ok(())
    }

    /// 指定時刻の表示値(経過秒数、進捗率、計測中かどうか)を返す。
    pub fn display(&self, now: DateTime<Utc>) -> (u64, u8, bool) {
        let displayed = self.tracker.tick(now);
        (
            displayed,
            self.tracker.progress(displayed),
            self.tracker.is_running(),
        )
    }

    /// 計測画面として履歴、セッション一覧、今日の経過時間を表示する。
    pub fn render(&self, presenter: &mut dyn ConsolePresenter, now: DateTime<Utc>) -> Result<()> {
        presenter.show_history(self.history())?;
        presenter.show_entries(self.entries())?;
        let (displayed, progress, running) = self.display(now);
        presenter.show_today(displayed, progress, running)
    }

    /// Ctrl-Cが押されるまで1秒毎に経過時間を表示し直す。
    ///
    /// 今日の合計は一定間隔でサーバーから取得し直す。
    pub async fn watch<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        let mut last_refresh = Instant::now();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    writeln!(writer).context("Failed to write newline")?;
                    break;
                }
                _ = ticker.tick() => {
                    if last_refresh.elapsed() >= REFRESH_INTERVAL {
                        match self.refresh().await {
                            Ok(()) => {}
                            Err(err) if err.is_unauthorized() => return Err(err.into()),
                            Err(err) => warn!("Failed to refresh today's total: {}", err),
                        }
                        last_refresh = Instant::now();
                    }

                    let (displayed, progress, running) = self.display(datetime::now());
                    write!(writer, "\r{}", today_line(displayed, progress, running))
                        .context("Failed to write today's total")?;
                    writer.flush().context("Failed to flush output")?;
                }
            }
        }

        Ok(())
    }
}

/// 認証切れ以外のエラーは警告に留め、`None`を返す。
fn keep_on_failure<V>(result: Result<V, ApiError>, what: &str) -> Result<Option<V>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_unauthorized() => Err(err),
        Err(err) => {
            warn!("Failed to load {}: {}", what, err);
            Ok(None)
        }
    }
}
