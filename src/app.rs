use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, warn};
use tokio::sync::broadcast;

use crate::api::{ApiClient, TrackerRepository};
use crate::app_state::{AppState, PreferenceChange};
use crate::auth_command::{AuthCommand, GoogleLoginArgs, LoginArgs, RegisterArgs};
use crate::catalog_command::{CatalogArgs, CatalogCommand};
use crate::config::Config;
use crate::console::{ConsoleMarkdownList, ConsolePresenter};
use crate::datetime;
use crate::error::ApiError;
use crate::history_command::{ExportArgs, HistoryArgs, HistoryCommand};
use crate::logo_command::{LogoAction, LogoArgs, LogoCommand};
use crate::preferences::PreferenceStore;
use crate::profile_command::{ProfileArgs, ProfileCommand};
use crate::reports_command::{ReportsArgs, ReportsCommand};
use crate::screen::{Navigator, Screen};
use crate::settings_command::{SettingsArgs, SettingsCommand};
use crate::tracker_command::{SessionArgs, TodayArgs, TrackerView};

/// サブコマンドを表す列挙型。
#[derive(Debug, clap::Subcommand)]
pub enum SubCommands {
    /// Log in with email and password
    Login(LoginArgs),
    /// Log in with a Google ID token
    Google(GoogleLoginArgs),
    /// Create a new account
    Register(RegisterArgs),
    /// Forget the stored credential
    Logout,
    /// Show the logged in user
    Me,
    /// Update the full name or password
    Profile(ProfileArgs),
    /// Show today's elapsed time and progress towards the daily goal
    Today(TodayArgs),
    /// Start a session
    Start(SessionArgs),
    /// Stop the running session
    Stop(SessionArgs),
    /// Show daily totals
    History(HistoryArgs),
    /// Show the recent sessions
    Entries,
    /// Export daily totals or sessions as CSV
    Export(ExportArgs),
    /// Show KPIs and charts over 7, 30 or 90 days
    Reports(ReportsArgs),
    /// List or create projects
    Projects(CatalogArgs),
    /// List or create tags
    Tags(CatalogArgs),
    /// Show or reset the brand logo (admins only)
    Logo(LogoArgs),
    /// Show or change the language and theme
    Settings(SettingsArgs),
}

/// サブコマンドを表示する画面を返す。画面を持たないコマンドは`None`。
pub fn screen_for(command: &SubCommands) -> Option<Screen> {
    match command {
        SubCommands::Login(_) | SubCommands::Google(_) | SubCommands::Register(_) => {
            Some(Screen::Login)
        }
        SubCommands::Logout | SubCommands::Settings(_) => None,
        SubCommands::Me
        | SubCommands::Profile(_)
        | SubCommands::Projects(_)
        | SubCommands::Tags(_) => Some(Screen::Home),
        SubCommands::Today(_)
        | SubCommands::Start(_)
        | SubCommands::Stop(_)
        | SubCommands::History(_)
        | SubCommands::Entries
        | SubCommands::Export(_) => Some(Screen::Tracker),
        SubCommands::Reports(_) => Some(Screen::Reports),
        SubCommands::Logo(_) => Some(Screen::AdminLogo),
    }
}

/// エラーの原因に認証切れが含まれているかを返す。
pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<ApiError>()
            .map_or(false, ApiError::is_unauthorized)
    })
}

/// 標準出力に表示するための`ConsolePresenter`を渡して`f`を実行する。
fn present<F>(f: F) -> Result<()>
where
    F: FnOnce(&mut dyn ConsolePresenter) -> Result<()>,
{
    let mut stdout = io::stdout().lock();
    let mut presenter = ConsoleMarkdownList::new(&mut stdout, Local);
    f(&mut presenter)
}

/// サブコマンドを実行するアプリケーション。
pub struct App {
    config: Config,
    state: AppState,
    navigator: Navigator,
    changes: broadcast::Receiver<PreferenceChange>,
}

impl App {
    /// 設定ファイルを読み込み、ログイン状態に応じた画面から開始する。
    pub fn new(config: Config) -> Result<Self> {
        let store = PreferenceStore::new(config.preferences_path()?);
        debug!("Preferences: {}", store.path().display());
        let state = AppState::new(store);
        let changes = state.subscribe();
        let navigator = Navigator::new(state.is_logged_in()?);

        Ok(Self {
            config,
            state,
            navigator,
            changes,
        })
    }

    pub fn current_screen(&self) -> Screen {
        self.navigator.current()
    }

    /// サブコマンドを実行する。
    ///
    /// 認証切れの場合は保存したトークンを削除し、ログイン画面に戻る。
    pub async fn run(&mut self, command: SubCommands) -> Result<()> {
        let result = self.dispatch(command).await;
        if let Err(err) = &result {
            if is_unauthorized(err) && self.state.is_logged_in()? {
                warn!("Session expired. Logging out.");
                self.state.logout()?;
            }
        }
        self.drain_changes();
        result
    }

    fn drain_changes(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            debug!("Preference changed: {:?}", change);
            self.navigator.handle(&change);
        }
        debug!("Current screen: {}", self.navigator.current());
    }

    fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.config.api_url, self.state.token()?))
    }

    async fn open(&mut self, screen: Screen, client: &ApiClient) -> Result<()> {
        if screen == Screen::AdminLogo && self.navigator.current() != Screen::Login {
            let me = client.read_me().await.context("Failed to load profile")?;
            self.navigator.set_admin(me.is_admin());
        }
        self.navigator.open(screen)?;
        Ok(())
    }

    async fn dispatch(&mut self, command: SubCommands) -> Result<()> {
        let client = self.client()?;
        if let Some(screen) = screen_for(&command) {
            self.open(screen, &client).await?;
        }

        let offset_minutes = datetime::local_offset_minutes();
        let asset_base_url = self.config.asset_base_url();

        match command {
            SubCommands::Login(args) => {
                AuthCommand::new(&client, &self.state).login(args).await?
            }
            SubCommands::Google(args) => {
                AuthCommand::new(&client, &self.state)
                    .login_google(args)
                    .await?
            }
            SubCommands::Register(args) => {
                AuthCommand::new(&client, &self.state)
                    .register(args)
                    .await?;
                writeln!(io::stdout(), "Account created. Run `timetrack login` to continue.")?;
            }
            SubCommands::Logout => AuthCommand::new(&client, &self.state).logout()?,
            SubCommands::Me => {
                let (me, avatar_url) = ProfileCommand::new(&client, &self.state, asset_base_url)
                    .me()
                    .await?;
                present(|p| p.show_me(&me, &avatar_url))?;
            }
            SubCommands::Profile(args) => {
                let (me, avatar_url) = ProfileCommand::new(&client, &self.state, asset_base_url)
                    .update(args)
                    .await?;
                present(|p| p.show_me(&me, &avatar_url))?;
            }
            SubCommands::Today(args) => {
                let mut view =
                    TrackerView::new(&client, self.config.daily_goal_seconds, offset_minutes);
                view.load().await.context("Failed to load today's total")?;
                if args.watch {
                    present(|p| {
                        p.show_history(view.history())?;
                        p.show_entries(view.entries())
                    })?;
                    view.watch(&mut io::stdout()).await?;
                } else {
                    present(|p| view.render(p, datetime::now()))?;
                }
            }
            SubCommands::Start(args) => {
                let mut view =
                    TrackerView::new(&client, self.config.daily_goal_seconds, offset_minutes);
                view.start(args).await?;
                present(|p| view.render(p, datetime::now()))?;
            }
            SubCommands::Stop(args) => {
                let mut view =
                    TrackerView::new(&client, self.config.daily_goal_seconds, offset_minutes);
                view.stop(args).await?;
                present(|p| view.render(p, datetime::now()))?;
            }
            SubCommands::History(args) => {
                let history = HistoryCommand::new(&client, offset_minutes)
                    .history(&args)
                    .await?;
                present(|p| p.show_history(&history))?;
            }
            SubCommands::Entries => {
                let entries = HistoryCommand::new(&client, offset_minutes)
                    .entries()
                    .await?;
                present(|p| p.show_entries(&entries))?;
            }
            SubCommands::Export(args) => {
                let path = HistoryCommand::new(&client, offset_minutes)
                    .export(args, &self.config.export_dir)
                    .await?;
                writeln!(io::stdout(), "{}", path.display())?;
            }
            SubCommands::Reports(args) => {
                let summary = ReportsCommand::new(&client, offset_minutes)
                    .run(args)
                    .await?;
                present(|p| p.show_report(&summary))?;
            }
            SubCommands::Projects(args) => {
                let projects = CatalogCommand::new(&client).projects(args).await?;
                present(|p| p.show_projects(&projects))?;
            }
            SubCommands::Tags(args) => {
                let tags = CatalogCommand::new(&client).tags(args).await?;
                present(|p| p.show_tags(&tags))?;
            }
            SubCommands::Logo(args) => {
                let command = LogoCommand::new(&client, &self.state, asset_base_url);
                match args.action {
                    None | Some(LogoAction::Show) => {
                        writeln!(io::stdout(), "{}", command.current().await?)?;
                    }
                    Some(LogoAction::Reset) => command.reset()?,
                }
            }
            SubCommands::Settings(args) => {
                let settings = SettingsCommand::new(&self.state).run(args)?;
                let mut stdout = io::stdout();
                writeln!(stdout, "- Language: {}", settings.language)?;
                writeln!(stdout, "- Theme: {}", settings.theme)?;
            }
        }

        Ok(())
    }
}
