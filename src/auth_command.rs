use anyhow::{Context, Result};
use log::info;

use crate::api::AuthRepository;
use crate::app_state::AppState;
use crate::validation::{
    validate_confirmation, validate_email, validate_full_name, validate_password,
};

/// `login`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    #[clap(short = 'e', long = "email")]
    pub email: String,

    #[clap(
        short = 'p',
        long = "password",
        help = "Password. Prompted without echo when omitted"
    )]
    pub password: Option<String>,
}

/// `register`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct RegisterArgs {
    #[clap(short = 'e', long = "email")]
    pub email: String,

    #[clap(short = 'n', long = "name", help = "Full name")]
    pub full_name: String,

    #[clap(
        short = 'p',
        long = "password",
        help = "Password. Prompted twice without echo when omitted"
    )]
    pub password: Option<String>,
}

/// `google`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct GoogleLoginArgs {
    #[clap(help = "ID token issued by Google Sign-In")]
    pub id_token: String,
}

/// パスワードが指定されていない場合は入力を求める。
pub fn resolve_password(password: Option<String>, prompt: &str) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password(prompt).context("Failed to read password"),
    }
}

pub struct AuthCommand<'a, A: AuthRepository> {
    auth: &'a A,
    state: &'a AppState,
}

impl<'a, A: AuthRepository> AuthCommand<'a, A> {
    /// 新しい`AuthCommand`を返す。
    ///
    /// # Arguments
    ///
    /// * `auth` - 認証を行うリポジトリ
    /// * `state` - トークンを保存するアプリケーションの状態
    pub fn new(auth: &'a A, state: &'a AppState) -> Self {
        Self { auth, state }
    }

    /// 入力値を検証してからログインし、トークンを保存する。
    pub async fn login(&self, args: LoginArgs) -> Result<()> {
        validate_email(&args.email)?;
        let password = resolve_password(args.password, "Password: ")?;
        validate_password(&password)?;

        let token = self
            .auth
            .login(&args.email, &password)
            .await
            .context("Login failed")?;
        self.state.login(&token)?;
        info!("Logged in as {}", args.email);
        Ok(())
    }

    /// 入力値を検証してからアカウントを作成する。ログインはしない。
    pub async fn register(&self, args: RegisterArgs) -> Result<()> {
        validate_full_name(&args.full_name)?;
        validate_email(&args.email)?;
        let (password, confirmation) = match args.password {
            Some(password) => (password.clone(), password),
            None => (
                resolve_password(None, "Password: ")?,
                resolve_password(None, "Confirm password: ")?,
            ),
        };
        validate_password(&password)?;
        validate_confirmation(&password, &confirmation)?;

        self.auth
            .register(&args.email, &password, args.full_name.trim())
            .await
            .context("Account creation failed")?;
        info!("Account created for {}", args.email);
        Ok(())
    }

    /// GoogleのIDトークンでログインし、トークンを保存する。
    pub async fn login_google(&self, args: GoogleLoginArgs) -> Result<()> {
        let id_token = args.id_token.trim();
        if id_token.is_empty() {
            anyhow::bail!("Google login failed: no credential");
        }

        let token = self
            .auth
            .login_google(id_token)
            .await
            .context("Google login failed")?;
        self.state.login(&token)?;
        info!("Logged in with Google");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.state.logout()?;
        info!("Logged out");
        Ok(())
    }
}
