use crate::models::{BlockInfo, FileTreeNode, Notebook};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    /// The kernel answered, but with a non-zero `code`.
    Kernel,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    pub(crate) fn kernel(code: i64, msg: &str, path: &str) -> Self {
        Self {
            kind: ApiErrorKind::Kernel,
            message: format!("{path} returned code {code}: {msg}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub api_token: Option<String>,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://127.0.0.1:6806".to_string();

        let Some(window) = web_sys::window() else {
            return Self {
                api_url: default_api_url,
                api_token: None,
            };
        };

        // `window.ENV` overrides are meant for development against a remote kernel.
        let env_string = |key: &str| -> Option<String> {
            let env = window.get("ENV")?;
            if env.is_undefined() || !env.is_object() {
                return None;
            }
            js_sys::Reflect::get(&env, &key.into())
                .ok()
                .and_then(|v| v.as_string())
                .filter(|s| !s.trim().is_empty())
        };

        let api_url = env_string("API_URL")
            .or_else(|| window.location().origin().ok())
            .filter(|origin| origin.starts_with("http"))
            .unwrap_or(default_api_url);

        Self {
            api_url,
            api_token: env_string("API_TOKEN"),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard kernel reply: `{ "code": 0, "msg": "", "data": ... }`.
#[derive(Deserialize, Debug)]
pub(crate) struct KernelResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> KernelResponse<T> {
    pub(crate) fn into_result(self, path: &str) -> ApiResult<T> {
        if self.code != 0 {
            return Err(ApiError::kernel(self.code, &self.msg, path));
        }
        self.data
            .ok_or_else(|| ApiError::parse(format!("{path} returned no data")))
    }
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct ListDocsByPathRequest<'a> {
    pub notebook: &'a str,
    pub path: &'a str,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub(crate) struct ListDocsByPathData {
    #[serde(default)]
    pub files: Vec<FileTreeNode>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub(crate) struct NotebooksData {
    #[serde(default)]
    pub notebooks: Vec<Notebook>,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct BlockInfoRequest<'a> {
    pub id: &'a str,
}

pub(crate) const LS_NOTEBOOKS: &str = "/api/notebook/lsNotebooks";
pub(crate) const LIST_DOCS_BY_PATH: &str = "/api/filetree/listDocsByPath";
pub(crate) const GET_BLOCK_INFO: &str = "/api/block/getBlockInfo";

/// Read-only view of the host's document tree.
///
/// Implemented by [`ApiClient`] against the kernel and by in-memory fakes in tests.
/// Responses are treated as authoritative: listing order is the host's display order.
pub(crate) trait DocTreeSource {
    async fn list_notebooks(&self) -> ApiResult<Vec<Notebook>>;

    async fn list_docs_by_path(&self, notebook: &str, path: &str)
        -> ApiResult<Vec<FileTreeNode>>;

    async fn get_block_info(&self, id: &str) -> ApiResult<BlockInfo>;

    /// Resolves after `ms` milliseconds. Bounds the overall tree walk.
    async fn sleep(&self, ms: u32);
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    #[cfg(test)]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn from_env() -> Self {
        let env = EnvConfig::new();
        Self {
            base_url: env.api_url,
            token: env.api_token,
        }
    }

    pub(crate) fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Token {t}"))
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        auth: Option<String>,
    ) -> reqwest::RequestBuilder {
        if let Some(auth) = auth {
            req = req.header("Authorization", auth);
        }
        req
    }

    async fn request_api<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let req = Self::with_auth_headers(client.post(url), self.get_auth_header()).json(body);

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            let envelope: KernelResponse<T> = res.json().await.map_err(ApiError::parse)?;
            envelope.into_result(path)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, path))
        }
    }

    /// Plain GET for static plugin assets (language packs).
    pub async fn fetch_text(&self, path: &str) -> ApiResult<String> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let req = Self::with_auth_headers(client.get(url), self.get_auth_header());

        let res = req.send().await.map_err(ApiError::network)?;
        if res.status().is_success() {
            res.text().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, path))
        }
    }
}

impl DocTreeSource for ApiClient {
    async fn list_notebooks(&self) -> ApiResult<Vec<Notebook>> {
        let data: NotebooksData = self
            .request_api(LS_NOTEBOOKS, &serde_json::json!({}))
            .await?;
        Ok(data.notebooks)
    }

    async fn list_docs_by_path(
        &self,
        notebook: &str,
        path: &str,
    ) -> ApiResult<Vec<FileTreeNode>> {
        // No `sort` field: the kernel then applies the notebook's configured sort mode,
        // which is exactly the order the file tree shows.
        let data: ListDocsByPathData = self
            .request_api(LIST_DOCS_BY_PATH, &ListDocsByPathRequest { notebook, path })
            .await?;
        Ok(data.files)
    }

    async fn get_block_info(&self, id: &str) -> ApiResult<BlockInfo> {
        self.request_api(GET_BLOCK_INFO, &BlockInfoRequest { id })
            .await
    }

    async fn sleep(&self, ms: u32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(win) = web_sys::window() {
                let _ = win
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}
