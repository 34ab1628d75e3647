use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::tracker::WORKDAY_SECONDS;
use crate::url::parse_base_url;

/// APIサーバーのURLが指定されていない場合に利用するURL。
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

const APP_DIR_NAME: &str = "timetrack";
const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// 全サブコマンドで共通の設定。
///
/// コマンドライン引数か環境変数で指定する。
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    #[clap(
        long = "api-url",
        env = "TIMETRACK_API_URL",
        default_value = DEFAULT_API_URL,
        parse(try_from_str = parse_base_url),
        help = "Base URL of the time tracking server"
    )]
    pub api_url: Url,

    #[clap(
        long = "asset-base-url",
        env = "TIMETRACK_ASSET_BASE_URL",
        parse(try_from_str = parse_base_url),
        help = "Base URL used to resolve relative logo and avatar paths [default: the API URL]"
    )]
    pub asset_base_url: Option<Url>,

    #[clap(
        long = "daily-goal",
        env = "TIMETRACK_DAILY_GOAL",
        default_value_t = WORKDAY_SECONDS,
        help = "Daily goal in seconds used for the progress percentage"
    )]
    pub daily_goal_seconds: u64,

    #[clap(
        long = "export-dir",
        env = "TIMETRACK_EXPORT_DIR",
        default_value = ".",
        parse(from_os_str),
        help = "Directory CSV exports are written to"
    )]
    pub export_dir: PathBuf,

    #[clap(
        long = "home",
        env = "TIMETRACK_HOME",
        parse(from_os_str),
        help = "Directory holding the local preferences [default: <config dir>/timetrack]"
    )]
    pub home: Option<PathBuf>,
}

impl Config {
    /// 相対パスのロゴやアバターを解決するためのベースURLを返す。
    pub fn asset_base_url(&self) -> &str {
        self.asset_base_url
            .as_ref()
            .unwrap_or(&self.api_url)
            .as_str()
    }

    /// 設定を保存するファイルのパスを返す。
    pub fn preferences_path(&self) -> Result<PathBuf> {
        let home = match &self.home {
            Some(home) => home.clone(),
            None => dirs::config_dir()
                .context("Cannot determine config directory")?
                .join(APP_DIR_NAME),
        };
        Ok(home.join(PREFERENCES_FILE_NAME))
    }
}
