use anyhow::{Context, Result};
use log::{info, warn};

use crate::api::TrackerRepository;
use crate::app_state::AppState;
use crate::url::{resolve_asset, DEFAULT_LOGO_PATH};

/// `logo`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct LogoArgs {
    #[clap(subcommand)]
    pub action: Option<LogoAction>,
}

#[derive(Debug, clap::Subcommand)]
pub enum LogoAction {
    /// Show the logo currently in effect (default)
    Show,
    /// Drop the locally stored logo and fall back to the server's
    Reset,
}

/// ブランドロゴを扱うコマンド。管理者のみが使う。
pub struct LogoCommand<'a, T: TrackerRepository> {
    repository: &'a T,
    state: &'a AppState,
    asset_base_url: &'a str,
}

impl<'a, T: TrackerRepository> LogoCommand<'a, T> {
    pub fn new(repository: &'a T, state: &'a AppState, asset_base_url: &'a str) -> Self {
        Self {
            repository,
            state,
            asset_base_url,
        }
    }

    /// 表示に使うロゴのURLを返す。
    ///
    /// 端末に保存したロゴ、サーバーのロゴ、既定のロゴの順に使う。
    /// サーバーから取得できない場合は警告を出して既定のロゴを使う。
    pub async fn current(&self) -> Result<String> {
        let local = self.state.logo()?;
        if local.as_deref().map_or(false, |url| !url.is_empty()) {
            return Ok(resolve_asset(
                self.asset_base_url,
                &[local.as_deref()],
                DEFAULT_LOGO_PATH,
            ));
        }

        let remote = match self.repository.read_logo().await {
            Ok(remote) => remote,
            Err(err) if err.is_unauthorized() => {
                return Err(err).context("Failed to load logo");
            }
            Err(err) => {
                warn!("Failed to load logo: {}", err);
                None
            }
        };
        Ok(resolve_asset(
            self.asset_base_url,
            &[remote.as_deref()],
            DEFAULT_LOGO_PATH,
        ))
    }

    /// 端末に保存したロゴを削除する。削除後はホーム画面に戻る。
    pub fn reset(&self) -> Result<()> {
        self.state.set_logo(None)?;
        info!("Logo reset to default");
        Ok(())
    }
}
