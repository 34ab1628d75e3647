use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::TimeZone;

use crate::format::{
    format_date_pretty, format_hours, format_local_date, format_seconds, format_time_or_dash, DASH,
};
use crate::reports::ReportSummary;
use crate::time_entry::{DailyTotal, Me, Project, Tag, TimeEntry};

const PROGRESS_BAR_WIDTH: usize = 20;
const CHART_WIDTH: usize = 40;

/// Consoleに計測結果を表示するためのtrait。
pub trait ConsolePresenter {
    /// 今日の経過時間と進捗を1行で表示する。
    fn show_today(&mut self, displayed_seconds: u64, progress: u8, running: bool) -> Result<()>;

    /// 日毎の合計時間を表示する。
    fn show_history(&mut self, history: &[DailyTotal]) -> Result<()>;

    /// セッション一覧を表示する。空の場合はその旨を表示する。
    fn show_entries(&mut self, entries: &[TimeEntry]) -> Result<()>;

    fn show_projects(&mut self, projects: &[Project]) -> Result<()>;

    fn show_tags(&mut self, tags: &[Tag]) -> Result<()>;

    /// 集計結果を表示する。
    fn show_report(&mut self, summary: &ReportSummary) -> Result<()>;

    fn show_me(&mut self, me: &Me, avatar_url: &str) -> Result<()>;
}

/// 経過時間、進捗バー、状態を1行にまとめた文字列を返す。
pub fn today_line(displayed_seconds: u64, progress: u8, running: bool) -> String {
    let filled = (progress as usize * PROGRESS_BAR_WIDTH) / 100;
    format!(
        "{} [{}{}] {:>3}% of daily goal | {}",
        format_seconds(displayed_seconds),
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        progress,
        if running { "Active" } else { "Stopped" }
    )
}

/// 計測結果をMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write, Tz: TimeZone> {
    writer: &'a mut W,
    tz: Tz,
}

impl<'a, W: Write, Tz: TimeZone> ConsoleMarkdownList<'a, W, Tz> {
    /// 新しい`ConsoleMarkdownList`を返す。
    ///
    /// # Arguments
    ///
    /// * `writer` - 出力先
    /// * `tz` - 日時を表示するタイムゾーン
    pub fn new(writer: &'a mut W, tz: Tz) -> Self {
        Self { writer, tz }
    }
}

impl<'a, W, Tz> ConsolePresenter for ConsoleMarkdownList<'a, W, Tz>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn show_today(&mut self, displayed_seconds: u64, progress: u8, running: bool) -> Result<()> {
        writeln!(
            self.writer,
            "{}",
            today_line(displayed_seconds, progress, running)
        )
        .context("Failed to write today's total")
    }

    fn show_history(&mut self, history: &[DailyTotal]) -> Result<()> {
        if history.is_empty() {
            writeln!(self.writer, "No history yet.").context("Failed to write history")?;
            return Ok(());
        }

        for total in history {
            writeln!(
                self.writer,
                "- {} ({}): {}",
                total.day.format("%Y-%m-%d"),
                format_date_pretty(total.day),
                format_seconds(total.total_seconds)
            )
            .with_context(|| format!("Failed to write daily total: {:?}", total))?;
        }

        Ok(())
    }

    // セッションをlist形式で表示する。
    fn show_entries(&mut self, entries: &[TimeEntry]) -> Result<()> {
        if entries.is_empty() {
            writeln!(self.writer, "No sessions yet.").context("Failed to write sessions")?;
            return Ok(());
        }

        for entry in entries {
            let project = entry.project_name.as_deref().unwrap_or(DASH);
            let tags = if entry.tags.is_empty() {
                DASH.to_string()
            } else {
                entry.tag_names()
            };
            let note = entry
                .note
                .as_deref()
                .filter(|note| !note.is_empty())
                .unwrap_or(DASH);
            writeln!(
                self.writer,
                "- {} {} ~ {} ({}) [{}] {{{}}}: {}",
                format_local_date(entry.start_at, &self.tz),
                format_time_or_dash(Some(entry.start_at), &self.tz),
                format_time_or_dash(entry.end_at, &self.tz),
                format_seconds(entry.duration_seconds()),
                project,
                tags,
                note
            )
            .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }

        Ok(())
    }

    fn show_projects(&mut self, projects: &[Project]) -> Result<()> {
        if projects.is_empty() {
            writeln!(self.writer, "No projects yet.").context("Failed to write projects")?;
        }
        for project in projects {
            writeln!(
                self.writer,
                "- {}: {} ({})",
                project.id,
                project.name,
                project.color.as_deref().unwrap_or(DASH)
            )
            .with_context(|| format!("Failed to write project: {:?}", project))?;
        }
        Ok(())
    }

    fn show_tags(&mut self, tags: &[Tag]) -> Result<()> {
        if tags.is_empty() {
            writeln!(self.writer, "No tags yet.").context("Failed to write tags")?;
        }
        for tag in tags {
            writeln!(
                self.writer,
                "- {}: {} ({})",
                tag.id,
                tag.name,
                tag.color.as_deref().unwrap_or(DASH)
            )
            .with_context(|| format!("Failed to write tag: {:?}", tag))?;
        }
        Ok(())
    }

    fn show_report(&mut self, summary: &ReportSummary) -> Result<()> {
        let best = summary
            .best_day
            .as_ref()
            .map(|best| {
                format!(
                    "{} ({}h)",
                    format_date_pretty(best.day),
                    format_hours(best.total_seconds)
                )
            })
            .unwrap_or_else(|| "-".to_string());
        writeln!(self.writer, "- Total: {}h", format_hours(summary.total_seconds))?;
        writeln!(
            self.writer,
            "- Average: {:.2}h/day",
            summary.average_seconds / 3600.0
        )?;
        writeln!(self.writer, "- Best day: {}", best)?;

        let max_seconds = summary
            .daily
            .iter()
            .map(|total| total.total_seconds)
            .max()
            .unwrap_or(0)
            .max(1);
        writeln!(self.writer, "## Daily hours")?;
        for total in &summary.daily {
            let width = (total.total_seconds as usize * CHART_WIDTH) / max_seconds as usize;
            writeln!(
                self.writer,
                "{} {:>6} {}",
                total.day.format("%m/%d"),
                format_hours(total.total_seconds),
                "#".repeat(width)
            )?;
        }

        writeln!(self.writer, "## Weekday distribution")?;
        for (weekday, seconds) in &summary.weekdays {
            writeln!(self.writer, "- {}: {}h", weekday, format_hours(*seconds))?;
        }

        Ok(())
    }

    fn show_me(&mut self, me: &Me, avatar_url: &str) -> Result<()> {
        writeln!(self.writer, "- Name: {}", me.full_name)?;
        writeln!(self.writer, "- Email: {}", me.email)?;
        writeln!(
            self.writer,
            "- Role: {}",
            me.role.as_deref().unwrap_or("user")
        )?;
        writeln!(self.writer, "- Avatar: {}", avatar_url)?;
        Ok(())
    }
}
