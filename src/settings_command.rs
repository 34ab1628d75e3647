use anyhow::{bail, Result};
use log::info;

use crate::app_state::AppState;
use crate::preferences::Theme;

/// `settings`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct SettingsArgs {
    #[clap(subcommand)]
    pub action: Option<SettingsAction>,
}

#[derive(Debug, clap::Subcommand)]
pub enum SettingsAction {
    /// Show the current language and theme (default)
    Show,
    /// Set the display language, e.g. `en` or `ar`
    Language { code: String },
    /// Set the theme: light, dark or system. Cycles to the next one when omitted
    Theme { theme: Option<Theme> },
}

/// 現在の設定値。
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub language: String,
    pub theme: Theme,
}

pub struct SettingsCommand<'a> {
    state: &'a AppState,
}

impl<'a> SettingsCommand<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// 設定を変更した後の設定値を返す。
    pub fn run(&self, args: SettingsArgs) -> Result<Settings> {
        match args.action {
            None | Some(SettingsAction::Show) => {}
            Some(SettingsAction::Language { code }) => {
                let code = code.trim();
                if code.is_empty() {
                    bail!("Language code is required");
                }
                self.state.set_language(code)?;
                info!("Language set to {}", code);
            }
            Some(SettingsAction::Theme { theme }) => {
                let theme = match theme {
                    Some(theme) => theme,
                    None => self.state.theme()?.cycle(),
                };
                self.state.set_theme(theme)?;
                info!("Theme set to {}", theme);
            }
        }

        Ok(Settings {
            language: self.state.language()?,
            theme: self.state.theme()?,
        })
    }
}
