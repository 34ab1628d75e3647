use std::collections::BTreeMap;
use std::fmt;
use std::fs;
#[cfg(unix)]
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Error, Result};
use log::debug;

const TOKEN_KEY: &str = "token";
const LANGUAGE_KEY: &str = "lang";
const THEME_KEY: &str = "theme";
const LOGO_KEY: &str = "app_logo";
const AVATAR_KEY: &str = "avatar_url";

pub const DEFAULT_LANGUAGE: &str = "en";

/// 表示テーマ。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// light → dark → system → light の順に切り替える。
    pub fn cycle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::System,
            Theme::System => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(anyhow!("Theme must be one of light, dark or system: {}", s)),
        }
    }
}

/// ローカルに保存する設定値。
///
/// 値は全て文字列のキーと値の組としてJSONファイルに保存する。
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// 新しい`PreferenceStore`を返す。ファイルは最初の保存時に作成する。
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_token(&self) -> Result<Option<String>> {
        self.get(TOKEN_KEY)
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        self.set(TOKEN_KEY, Some(token))
    }

    pub fn clear_token(&self) -> Result<()> {
        self.set(TOKEN_KEY, None)
    }

    /// 表示言語のコードを返す。未設定の場合は`en`。
    pub fn load_language(&self) -> Result<String> {
        Ok(self
            .get(LANGUAGE_KEY)?
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()))
    }

    pub fn save_language(&self, language: &str) -> Result<()> {
        self.set(LANGUAGE_KEY, Some(language))
    }

    /// テーマを返す。未設定または不明な値の場合は`system`。
    pub fn load_theme(&self) -> Result<Theme> {
        Ok(self
            .get(THEME_KEY)?
            .and_then(|theme| theme.parse().ok())
            .unwrap_or_default())
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.set(THEME_KEY, Some(&theme.to_string()))
    }

    pub fn load_logo(&self) -> Result<Option<String>> {
        self.get(LOGO_KEY)
    }

    /// ロゴのURLを保存する。`None`の場合は削除する。
    pub fn save_logo(&self, logo_url: Option<&str>) -> Result<()> {
        self.set(LOGO_KEY, logo_url)
    }

    pub fn load_avatar(&self) -> Result<Option<String>> {
        self.get(AVATAR_KEY)
    }

    pub fn save_avatar(&self, avatar_url: Option<&str>) -> Result<()> {
        self.set(AVATAR_KEY, avatar_url)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.read_all()?;
        Ok(values
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }

    fn set(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut values = self.read_all()?;
        match value {
            Some(value) => values.insert(key.to_string(), value.to_string()),
            None => values.remove(key),
        };
        debug!("Save preference: {}", key);
        self.write_all(&values)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences at {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse preferences at {}", self.path.display()))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(values).context("Failed to serialize preferences")?;
        secure_write(&self.path, &content)
            .with_context(|| format!("Failed to write preferences at {}", self.path.display()))
    }
}

/// トークンを含むため、unixでは所有者のみ読み書きできるように保存する。
fn secure_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, content)?;
    }

    Ok(())
}

#[cfg(test)]
pub mod test_support {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// テストごとに重複しない設定ファイルのパスを返す。
    pub fn temp_preferences_path() -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir()
            .join(format!("timetrack-test-{}-{}", std::process::id(), id))
            .join("preferences.json")
    }
}
