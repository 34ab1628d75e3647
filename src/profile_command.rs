use anyhow::{bail, Context, Result};
use log::info;

use crate::api::TrackerRepository;
use crate::app_state::AppState;
use crate::auth_command::resolve_password;
use crate::time_entry::Me;
use crate::url::{resolve_asset, to_absolute_url, DEFAULT_AVATAR_PATH};
use crate::validation::{validate_confirmation, validate_full_name, validate_password};

/// `profile`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct ProfileArgs {
    #[clap(short = 'n', long = "name", help = "New full name")]
    pub full_name: Option<String>,

    #[clap(
        short = 'p',
        long = "password",
        help = "New password. The confirmation is prompted when --confirm is omitted"
    )]
    pub password: Option<String>,

    #[clap(short = 'c', long = "confirm", requires = "password")]
    pub confirm: Option<String>,
}

pub struct ProfileCommand<'a, T: TrackerRepository> {
    repository: &'a T,
    state: &'a AppState,
    asset_base_url: &'a str,
}

impl<'a, T: TrackerRepository> ProfileCommand<'a, T> {
    /// 新しい`ProfileCommand`を返す。
    ///
    /// # Arguments
    ///
    /// * `repository` - サーバーと通信するためのリポジトリ
    /// * `state` - アバターのURLを保存するアプリケーションの状態
    /// * `asset_base_url` - 相対パスの画像を解決するためのURL
    pub fn new(repository: &'a T, state: &'a AppState, asset_base_url: &'a str) -> Self {
        Self {
            repository,
            state,
            asset_base_url,
        }
    }

    /// ログイン中のユーザー情報と表示に使うアバターのURLを返す。
    pub async fn me(&self) -> Result<(Me, String)> {
        let me = self
            .repository
            .read_me()
            .await
            .context("Failed to load profile")?;
        let avatar_url = self.remember_avatar(&me)?;
        Ok((me, avatar_url))
    }

    /// 名前やパスワードを検証してから更新する。
    pub async fn update(&self, args: ProfileArgs) -> Result<(Me, String)> {
        let full_name = match args.full_name {
            Some(full_name) => {
                validate_full_name(&full_name)?;
                Some(full_name.trim().to_string())
            }
            None => None,
        };
        let password = match args.password {
            Some(password) => {
                validate_password(&password)?;
                let confirm = resolve_password(args.confirm, "Confirm password: ")?;
                validate_confirmation(&password, &confirm)?;
                Some(password)
            }
            None => None,
        };
        if full_name.is_none() && password.is_none() {
            bail!("Nothing to update. Use --name or --password");
        }

        let me = self
            .repository
            .update_profile(full_name, password)
            .await
            .context("Failed to update profile")?;
        info!("Profile updated for {}", me.email);
        let avatar_url = self.remember_avatar(&me)?;
        Ok((me, avatar_url))
    }

    fn remember_avatar(&self, me: &Me) -> Result<String> {
        let avatar_url = to_absolute_url(self.asset_base_url, me.avatar_path.as_deref());
        let avatar_url = (!avatar_url.is_empty()).then_some(avatar_url);
        if avatar_url != self.state.avatar()? {
            self.state.set_avatar(avatar_url.as_deref())?;
        }

        Ok(resolve_asset(
            self.asset_base_url,
            &[avatar_url.as_deref()],
            DEFAULT_AVATAR_PATH,
        ))
    }
}
