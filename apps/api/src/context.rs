//! # リクエストコンテキスト
//!
//! 1 リクエスト分の入力（クエリ、JSON ボディ、フォーム、添付ファイル）と
//! 呼び出し元アイデンティティをまとめて保持する。
//!
//! ## パラメータログの重複抑止
//!
//! 各入力ソース（クエリ / JSON / フォーム）は最初にアクセスされた時点で
//! 一度だけログに出力される。同一リクエスト内で何度アクセスしても
//! ログは繰り返されない。機微キー（既定では `password`）の値は
//! `****` にマスクされる。
//!
//! ## JSON ボディの寛容なパース
//!
//! ボディが JSON オブジェクトとして解釈できない場合（不正な JSON、
//! 配列やスカラーのトップレベル）、エラーにはせず空のマップとして扱う。
//! ボディを使わないエンドポイントが壊れたボディで失敗しないための措置。

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use bytes::Bytes;
use serde_json::{Map, Value};
use torii_domain::{user::UserId, version::ApiVersion};

/// バージョン識別子を運ぶパラメータキー
const API_VERSION_KEY: &str = "api_version";

/// なりすまし対象を運ぶパラメータキー
const USER_ID_KEY: &str = "user_id";

/// 既定でマスクされる機微キー
const DEFAULT_SENSITIVE_KEYS: [&str; 1] = ["password"];

/// パラメータの入力ソース
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSource {
    /// URL クエリ文字列
    Query,
    /// JSON ボディ
    Json,
    /// フォームボディ
    Form,
}

impl ParamSource {
    fn label(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Json => "json",
            Self::Form => "form",
        }
    }
}

/// アップロードされたファイル
#[derive(Debug, Clone)]
pub struct FileBlob {
    filename: Option<String>,
    content: Bytes,
}

impl FileBlob {
    /// ファイル名と内容からファイルを作成する
    pub fn new(filename: Option<String>, content: Bytes) -> Self {
        Self { filename, content }
    }

    /// ファイル名（送信されていれば）
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// ファイル内容
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// ファイルサイズ（バイト数）
    pub fn size_in_bytes(&self) -> usize {
        self.content.len()
    }
}

/// 1 リクエスト分の入力とアイデンティティ
pub struct RequestContext {
    caller: UserId,
    original_caller: UserId,
    language: Option<String>,
    explicit_version: Option<ApiVersion>,
    query: Map<String, Value>,
    json_body: Map<String, Value>,
    form_body: Map<String, Value>,
    files: HashMap<String, FileBlob>,
    sensitive_keys: HashSet<String>,
    logged_sources: Mutex<HashSet<ParamSource>>,
}

impl RequestContext {
    /// 呼び出し元を指定して空のコンテキストを作成する
    pub fn new(caller: UserId) -> Self {
        Self {
            original_caller: caller.clone(),
            caller,
            language: None,
            explicit_version: None,
            query: Map::new(),
            json_body: Map::new(),
            form_body: Map::new(),
            files: HashMap::new(),
            sensitive_keys: DEFAULT_SENSITIVE_KEYS
                .iter()
                .map(ToString::to_string)
                .collect(),
            logged_sources: Mutex::new(HashSet::new()),
        }
    }

    /// クエリパラメータを設定する
    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    /// JSON ボディを設定する
    pub fn with_json_body(mut self, json_body: Map<String, Value>) -> Self {
        self.json_body = json_body;
        self
    }

    /// フォームボディを設定する
    pub fn with_form_body(mut self, form_body: Map<String, Value>) -> Self {
        self.form_body = form_body;
        self
    }

    /// 添付ファイルを設定する
    pub fn with_files(mut self, files: HashMap<String, FileBlob>) -> Self {
        self.files = files;
        self
    }

    /// 交渉済み言語を設定する
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// パラメータより優先される明示的なバージョン指定を設定する
    pub fn with_explicit_version(mut self, version: impl Into<ApiVersion>) -> Self {
        self.explicit_version = Some(version.into());
        self
    }

    /// 生のボディバイト列を JSON オブジェクトとして寛容にパースする
    ///
    /// オブジェクト以外（不正な JSON、配列、スカラー）は空のマップになる。
    pub fn parse_json_body(raw: &[u8]) -> Map<String, Value> {
        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => Map::new(),
        }
    }

    /// 現在の呼び出し元（なりすまし後はなりすまし先）
    pub fn caller(&self) -> &UserId {
        &self.caller
    }

    /// 元の呼び出し元（なりすましの影響を受けない）
    pub fn original_caller(&self) -> &UserId {
        &self.original_caller
    }

    /// なりすまし成立後に呼び出し元を切り替える
    ///
    /// `original_caller` は変更されない。
    pub fn switch_caller(&mut self, target: UserId) {
        self.caller = target;
    }

    /// 交渉済み言語
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// 明示的なバージョン指定
    pub fn explicit_version(&self) -> Option<&ApiVersion> {
        self.explicit_version.as_ref()
    }

    /// 機微キー集合を差し替える
    pub fn set_sensitive_keys(&mut self, keys: impl IntoIterator<Item = String>) {
        self.sensitive_keys = keys.into_iter().collect();
    }

    /// クエリパラメータ（初回アクセス時に一度だけログ出力）
    pub fn query(&self) -> &Map<String, Value> {
        self.log_parameters(ParamSource::Query, &self.query);
        &self.query
    }

    /// JSON ボディ（初回アクセス時に一度だけログ出力）
    pub fn json_body(&self) -> &Map<String, Value> {
        self.log_parameters(ParamSource::Json, &self.json_body);
        &self.json_body
    }

    /// フォームボディ（初回アクセス時に一度だけログ出力）
    pub fn form_body(&self) -> &Map<String, Value> {
        self.log_parameters(ParamSource::Form, &self.form_body);
        &self.form_body
    }

    /// 添付ファイル
    pub fn files(&self) -> &HashMap<String, FileBlob> {
        &self.files
    }

    /// リクエストパラメータからバージョン識別子を取り出す
    ///
    /// クエリを優先し、次にボディ（JSON ボディが非空ならそれを、
    /// 空ならフォームボディを）から `api_version` を探す。
    pub fn version_from_params(&self) -> Option<ApiVersion> {
        if let Some(value) = self.query().get(API_VERSION_KEY) {
            return ApiVersion::from_param(value);
        }

        let body = if self.json_body.is_empty() {
            self.form_body()
        } else {
            self.json_body()
        };

        body.get(API_VERSION_KEY).and_then(ApiVersion::from_param)
    }

    /// なりすまし対象のユーザー ID を取り出す
    ///
    /// クエリを優先し、次に JSON ボディから `user_id` を探す。
    /// 文字列値のみを受け付ける。
    pub fn impersonation_target(&self) -> Option<UserId> {
        let value = self
            .query()
            .get(USER_ID_KEY)
            .or_else(|| self.json_body().get(USER_ID_KEY))?;

        value.as_str().map(UserId::from)
    }

    /// パラメータを機微キーをマスクしてログに出力する
    ///
    /// 同一ソースは 1 リクエストにつき一度しか出力されない。
    fn log_parameters(&self, source: ParamSource, params: &Map<String, Value>) {
        let Ok(mut logged) = self.logged_sources.lock() else {
            return;
        };
        if !logged.insert(source) {
            return;
        }
        drop(logged);

        if params.is_empty() {
            return;
        }

        let masked: Map<String, Value> = params
            .iter()
            .map(|(key, value)| {
                if self.sensitive_keys.contains(key) {
                    (key.clone(), Value::String("****".to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect();

        tracing::info!(
            source = source.label(),
            params = %serde_json::Value::Object(masked),
            "リクエストパラメータ"
        );
    }
}
