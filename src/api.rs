use async_trait::async_trait;
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::{
    header::CONTENT_TYPE, multipart::Form, Client, RequestBuilder, Response, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use crate::error::ApiError;
use crate::time_entry::{DailyTotal, Me, Project, SessionRequest, Tag, TimeEntry, TodayTotal};

/// 計測セッションを扱うAPIのリポジトリ。
///
/// 全ての呼び出しに認証情報が必要となる。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TrackerRepository {
    /// 今日の合計時間と計測中かどうかを取得する。
    ///
    /// # Arguments
    ///
    /// * `offset_minutes` - 1日の境界を計算するためのUTCからのオフセット(分)
    async fn read_today(&self, offset_minutes: i32) -> Result<TodayTotal, ApiError>;

    /// 直近`days`日分の日毎の合計時間を取得する。
    async fn read_history(
        &self,
        days: u32,
        offset_minutes: i32,
    ) -> Result<Vec<DailyTotal>, ApiError>;

    /// 直近のセッション一覧を取得する。
    async fn read_entries(&self) -> Result<Vec<TimeEntry>, ApiError>;

    /// セッションを開始する。計測中のセッションがある場合はサーバーがエラーを返す。
    async fn start_session(&self, request: &SessionRequest) -> Result<(), ApiError>;

    /// 計測中のセッションを終了する。
    async fn stop_session(&self, request: &SessionRequest) -> Result<(), ApiError>;

    async fn read_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn create_project(&self, name: &str, color: &str) -> Result<Project, ApiError>;

    async fn read_tags(&self) -> Result<Vec<Tag>, ApiError>;

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, ApiError>;

    async fn read_me(&self) -> Result<Me, ApiError>;

    /// 名前やパスワードを更新する。指定しなかった項目は変更しない。
    async fn update_profile(
        &self,
        full_name: Option<String>,
        password: Option<String>,
    ) -> Result<Me, ApiError>;

    /// サーバーに登録されているロゴのパスを取得する。
    async fn read_logo(&self) -> Result<Option<String>, ApiError>;
}

/// 認証を行うためのリポジトリ。認証情報は不要。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthRepository {
    /// メールアドレスとパスワードでログインし、トークンを返す。
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;

    async fn register(&self, email: &str, password: &str, full_name: &str)
        -> Result<(), ApiError>;

    /// GoogleのIDトークンでログインし、トークンを返す。
    async fn login_google(&self, id_token: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<DailyTotal>,
}

#[derive(Debug, Deserialize)]
struct EntriesResponse {
    #[serde(default)]
    entries: Vec<TimeEntry>,
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct LogoResponse {
    #[serde(rename = "logoUrl")]
    logo_url: Option<String>,
}

/// エラー時にサーバーが返すボディ。
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// 時間計測サーバーと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let api_url = parse_base_url("http://localhost:4000")?;
/// let client = ApiClient::new(&api_url, Some(token));
/// let today = client.read_today(540).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// 新しい`ApiClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `api_url` - 解析済みのサーバーのベースURL。パスを含む場合はその下にエンドポイントを連結する
    /// * `token` - ログイン済みの場合のトークン
    pub fn new(api_url: &Url, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.as_str().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// トークンを付与する。トークンが無い場合は通信せずにエラーとする。
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::Unauthorized)?;
        Ok(request.bearer_auth(token))
    }

    /// 認証が必要なリクエストを送る。401と403は`ApiError::Unauthorized`とする。
    async fn send(
        &self,
        request: RequestBuilder,
        fallback_message: &str,
    ) -> Result<Response, ApiError> {
        let response = self.authorized(request)?.send().await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(ApiError::Unauthorized);
        }
        check_status(response, fallback_message).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback_message: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request, fallback_message).await?;
        Ok(response.json::<T>().await?)
    }

    /// 認証が不要なリクエストを送る。
    async fn send_public(
        &self,
        request: RequestBuilder,
        fallback_message: &str,
    ) -> Result<Response, ApiError> {
        let response = request.send().await?;
        check_status(response, fallback_message).await
    }
}

/// 2xx以外のレスポンスをサーバーのメッセージ付きのエラーに変換する。
async fn check_status(response: Response, fallback_message: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback_message.to_string());
    debug!("Request failed with status {}: {}", status, message);
    Err(ApiError::Remote { status, message })
}

#[async_trait]
impl TrackerRepository for ApiClient {
    async fn read_today(&self, offset_minutes: i32) -> Result<TodayTotal, ApiError> {
        let today = self
            .get_json::<TodayTotal>(
                self.client
                    .get(self.endpoint("/time/today"))
                    .query(&[("offsetMinutes", offset_minutes)]),
                "Failed to load today's total",
            )
            .await?;
        debug!("Today: {:?}", today);
        Ok(today)
    }

    async fn read_history(
        &self,
        days: u32,
        offset_minutes: i32,
    ) -> Result<Vec<DailyTotal>, ApiError> {
        let response = self
            .get_json::<HistoryResponse>(
                self.client
                    .get(self.endpoint("/time/history"))
                    .query(&[("days", days as i64), ("offsetMinutes", offset_minutes as i64)]),
                "Failed to load history",
            )
            .await?;
        info!("Length of history: {}", response.history.len());
        Ok(response.history)
    }

    async fn read_entries(&self) -> Result<Vec<TimeEntry>, ApiError> {
        let response = self
            .get_json::<EntriesResponse>(
                self.client.get(self.endpoint("/time/entries")),
                "Failed to load sessions",
            )
            .await?;
        info!("Length of time entries: {}", response.entries.len());
        Ok(response.entries)
    }

    async fn start_session(&self, request: &SessionRequest) -> Result<(), ApiError> {
        self.send(
            self.client
                .post(self.endpoint("/time/start"))
                .header(CONTENT_TYPE, "application/json")
                .json(request),
            "Failed to start session",
        )
        .await?;
        info!("Session started.");
        Ok(())
    }

    async fn stop_session(&self, request: &SessionRequest) -> Result<(), ApiError> {
        self.send(
            self.client
                .post(self.endpoint("/time/end"))
                .header(CONTENT_TYPE, "application/json")
                .json(request),
            "Failed to stop session",
        )
        .await?;
        info!("Session stopped.");
        Ok(())
    }

    async fn read_projects(&self) -> Result<Vec<Project>, ApiError> {
        let response = self
            .get_json::<ProjectsResponse>(
                self.client.get(self.endpoint("/projects")),
                "Failed to load projects",
            )
            .await?;
        Ok(response.projects)
    }

    async fn create_project(&self, name: &str, color: &str) -> Result<Project, ApiError> {
        self.get_json(
            self.client
                .post(self.endpoint("/projects"))
                .json(&json!({ "name": name.trim(), "color": color })),
            "Failed to create project",
        )
        .await
    }

    async fn read_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let response = self
            .get_json::<TagsResponse>(
                self.client.get(self.endpoint("/tags")),
                "Failed to load tags",
            )
            .await?;
        Ok(response.tags)
    }

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, ApiError> {
        self.get_json(
            self.client
                .post(self.endpoint("/tags"))
                .json(&json!({ "name": name.trim(), "color": color })),
            "Failed to create tag",
        )
        .await
    }

    async fn read_me(&self) -> Result<Me, ApiError> {
        self.get_json(
            self.client.get(self.endpoint("/user/me")),
            "Failed to load profile",
        )
        .await
    }

    async fn update_profile(
        &self,
        full_name: Option<String>,
        password: Option<String>,
    ) -> Result<Me, ApiError> {
        let mut form = Form::new();
        if let Some(full_name) = full_name {
            form = form.text("full_name", full_name);
        }
        if let Some(password) = password {
            form = form.text("password", password);
        }

        self.get_json(
            self.client
                .put(self.endpoint("/user/update"))
                .multipart(form),
            "Update failed",
        )
        .await
    }

    async fn read_logo(&self) -> Result<Option<String>, ApiError> {
        let response = self
            .get_json::<LogoResponse>(
                self.client.get(self.endpoint("/admin/logo")),
                "Failed to load logo",
            )
            .await?;
        Ok(response.logo_url.filter(|url| !url.is_empty()))
    }
}

#[async_trait]
impl AuthRepository for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .send_public(
                self.client
                    .post(self.endpoint("/auth/login"))
                    .json(&json!({ "email": email, "password": password })),
                "Login failed",
            )
            .await?;
        let token = response.json::<TokenResponse>().await?;
        Ok(token.token)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(), ApiError> {
        self.send_public(
            self.client.post(self.endpoint("/auth/register")).json(&json!({
                "email": email,
                "password": password,
                "fullName": full_name,
            })),
            "Account creation failed",
        )
        .await?;
        Ok(())
    }

    async fn login_google(&self, id_token: &str) -> Result<String, ApiError> {
        let response = self
            .send_public(
                self.client
                    .post(self.endpoint("/auth/google"))
                    .json(&json!({ "idToken": id_token })),
                "Google login failed",
            )
            .await?;
        let token = response.json::<TokenResponse>().await?;
        Ok(token.token)
    }
}
