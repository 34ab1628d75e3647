use anyhow::Result;
use log::debug;
use tokio::sync::broadcast;

use crate::preferences::{PreferenceStore, Theme};

const CHANNEL_CAPACITY: usize = 16;

/// 設定値の変更通知。
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceChange {
    LoggedIn,
    LoggedOut,
    LanguageChanged(String),
    ThemeChanged(Theme),
    LogoChanged(Option<String>),
    AvatarChanged(Option<String>),
}

/// 画面間で共有するアプリケーションの状態。
///
/// 設定値の変更は保存した後に購読者へ通知する。
#[derive(Debug)]
pub struct AppState {
    store: PreferenceStore,
    events: broadcast::Sender<PreferenceChange>,
}

impl AppState {
    pub fn new(store: PreferenceStore) -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// 変更通知を購読する。購読後の変更のみ受け取る。
    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.events.subscribe()
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.store.load_token()
    }

    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self.token()?.is_some())
    }

    pub fn login(&self, token: &str) -> Result<()> {
        self.store.save_token(token)?;
        self.publish(PreferenceChange::LoggedIn);
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.store.clear_token()?;
        self.publish(PreferenceChange::LoggedOut);
        Ok(())
    }

    pub fn language(&self) -> Result<String> {
        self.store.load_language()
    }

    pub fn set_language(&self, language: &str) -> Result<()> {
        self.store.save_language(language)?;
        self.publish(PreferenceChange::LanguageChanged(language.to_string()));
        Ok(())
    }

    pub fn theme(&self) -> Result<Theme> {
        self.store.load_theme()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.save_theme(theme)?;
        self.publish(PreferenceChange::ThemeChanged(theme));
        Ok(())
    }

    pub fn logo(&self) -> Result<Option<String>> {
        self.store.load_logo()
    }

    pub fn set_logo(&self, logo_url: Option<&str>) -> Result<()> {
        self.store.save_logo(logo_url)?;
        self.publish(PreferenceChange::LogoChanged(logo_url.map(str::to_string)));
        Ok(())
    }

    pub fn avatar(&self) -> Result<Option<String>> {
        self.store.load_avatar()
    }

    pub fn set_avatar(&self, avatar_url: Option<&str>) -> Result<()> {
        self.store.save_avatar(avatar_url)?;
        self.publish(PreferenceChange::AvatarChanged(avatar_url.map(str::to_string)));
        Ok(())
    }

    fn publish(&self, change: PreferenceChange) {
        // 購読者がいない場合の送信失敗は無視する
        if self.events.send(change.clone()).is_err() {
            debug!("No subscriber for {:?}", change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppState, PreferenceChange};
    use crate::preferences::test_support::temp_preferences_path;
    use crate::preferences::{PreferenceStore, Theme};

    #[test]
    fn test_changes_are_published() {
        let state = AppState::new(PreferenceStore::new(temp_preferences_path()));
        let mut receiver = state.subscribe();

        state.login("abc").unwrap();
        state.set_theme(Theme::Dark).unwrap();
        state.set_logo(Some("/uploads/logo.png")).unwrap();
        state.logout().unwrap();

        assert_eq!(receiver.try_recv().unwrap(), PreferenceChange::LoggedIn);
        assert_eq!(
            receiver.try_recv().unwrap(),
            PreferenceChange::ThemeChanged(Theme::Dark)
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            PreferenceChange::LogoChanged(Some("/uploads/logo.png".to_string()))
        );
        assert_eq!(receiver.try_recv().unwrap(), PreferenceChange::LoggedOut);
        assert!(receiver.try_recv().is_err());
        assert!(!state.is_logged_in().unwrap());
        assert_eq!(state.theme().unwrap(), Theme::Dark);
    }

    #[test]
    fn test_publish_without_subscriber() {
        let state = AppState::new(PreferenceStore::new(temp_preferences_path()));

        state.set_language("ar").unwrap();

        assert_eq!(state.language().unwrap(), "ar");
    }
}
