use reqwest::StatusCode;

/// サーバーとの通信で発生するエラー。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 認証情報が無い、または期限切れ。
    #[error("Not logged in or session expired. Run `timetrack login` to authenticate.")]
    Unauthorized,

    /// サーバーが2xx以外を返した。
    #[error("{message} (status {status})")]
    Remote { status: StatusCode, message: String },

    /// 接続やレスポンスのデコードに失敗した。
    #[error("Failed to communicate with the time tracking server: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
