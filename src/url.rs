use anyhow::{bail, Context, Result};
use reqwest::Url;

/// サーバーやアセットのベースURLを解析する。`http`と`https`のみ受け付ける。
pub fn parse_base_url(value: &str) -> Result<Url> {
    let url = Url::parse(value.trim()).with_context(|| format!("Invalid base URL: {}", value))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Base URL must use http or https: {}", value);
    }
    Ok(url)
}

/// サーバーが返す相対パスを絶対URLに変換する。
///
/// 空のパスは空文字列、`http://`や`https://`で始まるURLはそのまま返す。
/// それ以外は`base`の後ろにパスを連結する。
pub fn to_absolute_url(base: &str, path: Option<&str>) -> String {
    let Some(path) = path.filter(|path| !path.is_empty()) else {
        return String::new();
    };
    if is_absolute(path) {
        return path.to_string();
    }

    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// 取得できない場合に使うロゴ画像のパス。
pub const DEFAULT_LOGO_PATH: &str = "/uploads/logo-default.png";
/// 取得できない場合に使うアバター画像のパス。
pub const DEFAULT_AVATAR_PATH: &str = "/uploads/avatar-default.png";

/// 候補の中で最初に空でないものを絶対URLにして返す。無ければ`default_path`を使う。
pub fn resolve_asset(base: &str, candidates: &[Option<&str>], default_path: &str) -> String {
    let path = candidates
        .iter()
        .flatten()
        .find(|path| !path.is_empty())
        .copied()
        .unwrap_or(default_path);
    to_absolute_url(base, Some(path))
}

fn is_absolute(url: &str) -> bool {
    let lower = url
        .get(..8)
        .map(|prefix| prefix.to_ascii_lowercase())
        .unwrap_or_else(|| url.to_ascii_lowercase());
    lower.starts_with("http://") || lower.starts_with("https://")
}
