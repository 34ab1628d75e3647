use std::env;
use std::io;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use fern::colors::{Color, ColoredLevelConfig};
use log::{debug, LevelFilter};

mod api;
mod app;
mod app_state;
mod auth_command;
mod catalog_command;
mod config;
mod console;
mod csv_export;
mod datetime;
mod error;
mod format;
mod history_command;
mod logo_command;
mod preferences;
mod profile_command;
mod reports;
mod reports_command;
mod screen;
mod settings_command;
mod time_entry;
mod tracker;
mod tracker_command;
mod url;
mod validation;

use app::{App, SubCommands};
use config::Config;

/// 時間計測サーバーを操作するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- login --email user@example.com
/// $ cargo run -- start --project 3 --note "Review"
/// $ cargo run -- today --watch
/// $ cargo run -- export days --days 30
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(flatten)]
    config: Config,

    #[clap(
        short = 'v',
        long = "verbose",
        global = true,
        parse(from_occurrences),
        help = "Increase log verbosity (-v info, -vv debug, -vvv trace)"
    )]
    verbose: u8,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// `-v`の数からログレベルを返す。`RUST_LOG`が指定されている場合はそちらを優先する。
fn log_level(verbose: u8) -> LevelFilter {
    if let Some(level) = env::var("RUST_LOG")
        .ok()
        .and_then(|value| LevelFilter::from_str(&value).ok())
    {
        return level;
    }

    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// ログを標準エラー出力に色付きで出力する。
fn setup_logger(level: LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(log_level(args.verbose))?;

    let mut app = App::new(args.config)?;
    let result = app.run(args.subcommand).await;
    debug!("Finished on the {} screen", app.current_screen());

    result
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use log::LevelFilter;
    use rstest::rstest;

    use super::{log_level, Args};
    use crate::app::SubCommands;

    #[rstest]
    #[case(0, LevelFilter::Warn)]
    #[case(1, LevelFilter::Info)]
    #[case(2, LevelFilter::Debug)]
    #[case(5, LevelFilter::Trace)]
    fn test_log_level(#[case] verbose: u8, #[case] expected: LevelFilter) {
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(log_level(verbose), expected);
        }
    }

    #[test]
    fn test_parse_start() {
        let args = Args::try_parse_from([
            "timetrack",
            "-vv",
            "start",
            "--project",
            "3",
            "--tag",
            "1",
            "--tag",
            "2",
            "--note",
            "Review",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        match args.subcommand {
            SubCommands::Start(session) => {
                assert_eq!(session.project, Some(3));
                assert_eq!(session.tags, vec![1, 2]);
                assert_eq!(session.note.as_deref(), Some("Review"));
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_days() {
        let args = Args::try_parse_from(["timetrack", "export", "days", "--days", "30"]).unwrap();

        assert!(matches!(args.subcommand, SubCommands::Export(_)));
    }
}
