use std::fmt;

use log::debug;

use crate::app_state::PreferenceChange;

/// 表示中の画面。常にいずれか1つのみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    Tracker,
    Reports,
    AdminLogo,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Login => "login",
            Screen::Home => "home",
            Screen::Tracker => "tracker",
            Screen::Reports => "reports",
            Screen::AdminLogo => "admin logo",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Not logged in. Run `timetrack login` to authenticate.")]
    NotLoggedIn,
    #[error("Only admins can access Brand Logo settings.")]
    AdminOnly,
}

/// 画面の遷移を管理する。
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Screen,
    logged_in: bool,
    is_admin: bool,
}

impl Navigator {
    /// ログイン状態に応じて、ログイン画面かホーム画面から開始する。
    pub fn new(logged_in: bool) -> Self {
        Self {
            current: if logged_in { Screen::Home } else { Screen::Login },
            logged_in,
            is_admin: false,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    /// ユーザー情報を取得した後に管理者かどうかを設定する。
    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    /// 指定した画面に遷移する。
    ///
    /// 未ログインの場合はログイン画面以外に遷移できない。管理画面は管理者のみ。
    pub fn open(&mut self, target: Screen) -> Result<Screen, NavigationError> {
        if target != Screen::Login && !self.logged_in {
            self.current = Screen::Login;
            return Err(NavigationError::NotLoggedIn);
        }
        if target == Screen::AdminLogo && !self.is_admin {
            return Err(NavigationError::AdminOnly);
        }

        debug!("Navigate: {} -> {}", self.current, target);
        self.current = target;
        Ok(self.current)
    }

    /// 他の画面を閉じてホーム画面に戻る。
    pub fn go_home(&mut self) {
        if self.logged_in {
            self.current = Screen::Home;
        }
    }

    /// 設定値の変更に応じて画面を切り替える。
    pub fn handle(&mut self, change: &PreferenceChange) {
        match change {
            PreferenceChange::LoggedIn => {
                self.logged_in = true;
                self.current = Screen::Home;
            }
            PreferenceChange::LoggedOut => {
                self.logged_in = false;
                self.is_admin = false;
                self.current = Screen::Login;
            }
            PreferenceChange::LogoChanged(_) => self.go_home(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{NavigationError, Navigator, Screen};
    use crate::app_state::PreferenceChange;

    #[rstest]
    #[case(Screen::Home)]
    #[case(Screen::Tracker)]
    #[case(Screen::Reports)]
    #[case(Screen::AdminLogo)]
    fn test_open_requires_login(#[case] target: Screen) {
        let mut navigator = Navigator::new(false);

        assert_eq!(navigator.open(target), Err(NavigationError::NotLoggedIn));
        assert_eq!(navigator.current(), Screen::Login);
    }

    #[test]
    fn test_admin_logo_requires_admin() {
        let mut navigator = Navigator::new(true);
        navigator.open(Screen::Tracker).unwrap();

        assert_eq!(
            navigator.open(Screen::AdminLogo),
            Err(NavigationError::AdminOnly)
        );
        assert_eq!(navigator.current(), Screen::Tracker);

        navigator.set_admin(true);
        assert_eq!(navigator.open(Screen::AdminLogo), Ok(Screen::AdminLogo));
    }

    #[test]
    fn test_logo_change_returns_home() {
        let mut navigator = Navigator::new(true);
        navigator.set_admin(true);
        navigator.open(Screen::AdminLogo).unwrap();

        navigator.handle(&PreferenceChange::LogoChanged(None));

        assert_eq!(navigator.current(), Screen::Home);
    }

    #[test]
    fn test_logout_and_login() {
        let mut navigator = Navigator::new(true);
        navigator.set_admin(true);
        navigator.open(Screen::Reports).unwrap();

        navigator.handle(&PreferenceChange::LoggedOut);
        assert_eq!(navigator.current(), Screen::Login);
        assert_eq!(
            navigator.open(Screen::Reports),
            Err(NavigationError::NotLoggedIn)
        );

        navigator.handle(&PreferenceChange::LoggedIn);
        assert_eq!(navigator.current(), Screen::Home);
        assert_eq!(
            navigator.open(Screen::AdminLogo),
            Err(NavigationError::AdminOnly)
        );
    }
}
