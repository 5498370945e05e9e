//! # エンドポイント実行コア
//!
//! 1 リクエストの実行ループを状態機械として実装する:
//!
//! ```text
//! START → なりすまし確認（任意） → バージョン解決 → ハンドラ実行 → 応答構築
//! ```
//!
//! なりすまし確認とバージョン解決は、失敗エンベロープを携えて応答構築へ
//! 直接短絡できる。ハンドラ実行は失敗境界に包まれ、例外分類を HTTP
//! ステータスに写像し、成功時は保留中のトランザクションをコミット、
//! どの失敗経路でもロールバックする。エラーがこの境界の外に
//! 漏れることはない。
//!
//! ## なりすまし（Impersonation）
//!
//! エンドポイントが明示的に許可した場合のみ、`user_id` パラメータで
//! 指定された別ユーザーとしてリクエストを実行できる:
//!
//! - 対象ユーザーが存在しない → 403
//! - 呼び出し元自身への指定 → ロール確認なしで成功（実質 no-op）
//! - それ以外 → 呼び出し元に [`SYSTEM_MANAGER`] ロールが必要
//!
//! 切り替えはセッション全体の入れ替え（権限状態の再読込を含む）として
//! 行われる。詳細は [`torii_infra::identity`] を参照。

mod respond;
mod validate;

use std::{collections::HashSet, pin::Pin, sync::Arc};

use torii_domain::{
    user::{SYSTEM_MANAGER, UserId},
    version::{ApiVersion, VersionTable},
};
use torii_infra::{ErrorCodeRegistry, db::TransactionControl, identity::IdentityStore};
use torii_shared::ResponseEnvelope;

use crate::{context::RequestContext, error::ApiError, usecase::TranslationService};

pub use respond::RespondArgs;
pub use validate::ParamType;

/// ハンドラが返す Future（リクエストコンテキストを借用する）
pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResponseEnvelope, ApiError>> + Send + 'a>>;

/// バージョン付きハンドラの実体
pub type Handler = Arc<dyn for<'a> Fn(&'a RequestContext) -> HandlerFuture<'a> + Send + Sync>;

/// エンドポイントが依存する外部コラボレータ一式
#[derive(Clone)]
pub struct EndpointDeps {
    /// アイデンティティ/セッションストア
    pub identity: Arc<dyn IdentityStore>,
    /// リクエストスコープのトランザクション制御
    pub transaction: Arc<dyn TransactionControl>,
    /// エラーコード登録簿
    pub error_codes: Arc<dyn ErrorCodeRegistry>,
    /// 翻訳サービス
    pub translator: TranslationService,
}

/// バージョン付きハンドラを束ねるエンドポイント
///
/// 1 エンドポイント定義につき 1 インスタンス。リクエストごとの状態は
/// すべて [`RequestContext`] が持ち、この型自体は再利用できる。
pub struct Endpoint {
    name: String,
    sensitive_keys: Option<HashSet<String>>,
    impersonate_user: bool,
    versions: VersionTable<Handler>,
    default_handler: Handler,
    deps: EndpointDeps,
}

/// [`Endpoint`] のビルダー
pub struct EndpointBuilder {
    name: String,
    sensitive_keys: Option<HashSet<String>>,
    impersonate_user: bool,
    versions: VersionTable<Handler>,
    default_handler: Option<Handler>,
    deps: EndpointDeps,
}

/// バージョン指定がないリクエストに使われる組み込みハンドラ
///
/// 空のデータを持つ成功エンベロープを返す。
fn builtin_default(_ctx: &RequestContext) -> HandlerFuture<'_> {
    Box::pin(async {
        Ok(ResponseEnvelope::ok(Some(serde_json::Value::Object(
            serde_json::Map::new(),
        ))))
    })
}

impl Endpoint {
    /// ビルダーを作成する
    pub fn builder(name: impl Into<String>, deps: EndpointDeps) -> EndpointBuilder {
        EndpointBuilder {
            name: name.into(),
            sensitive_keys: None,
            impersonate_user: false,
            versions: VersionTable::new(),
            default_handler: None,
            deps,
        }
    }

    /// エンドポイント名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1 リクエストを最初から最後まで実行する
    ///
    /// どの経路を通ってもエンベロープを返す。エラーがこのメソッドの
    /// 外に伝播することはない。
    #[tracing::instrument(skip_all, fields(endpoint = %self.name))]
    pub async fn run(&self, ctx: &mut RequestContext) -> ResponseEnvelope {
        tracing::info!("START {}", self.name);

        if let Some(keys) = &self.sensitive_keys {
            ctx.set_sensitive_keys(keys.iter().cloned());
        }

        let envelope = self.dispatch(ctx).await;

        tracing::info!(code = envelope.code, "END {}", self.name);
        envelope
    }

    async fn dispatch(&self, ctx: &mut RequestContext) -> ResponseEnvelope {
        if self.impersonate_user
            && let Err(err) = self.impersonate(ctx).await
        {
            return self.failure_envelope(Some(ctx), err).await;
        }

        let requested = ctx
            .explicit_version()
            .cloned()
            .or_else(|| ctx.version_from_params());

        match requested {
            Some(version) => match self.versions.resolve(&version) {
                Some(handler) => {
                    let handler = handler.clone();
                    self.execute(ctx, &handler).await
                }
                None => {
                    tracing::info!(
                        version = %version,
                        "要求されたバージョンに一致するハンドラがありません"
                    );
                    self.respond_with(
                        Some(ctx),
                        RespondArgs {
                            message: format!("Invalid API Version '{version}'"),
                            code: Some(400),
                            error_code: "InvalidVersion".to_string(),
                            ..Default::default()
                        },
                    )
                    .await
                }
            },
            None => {
                tracing::debug!("バージョン指定なし。既定ハンドラを実行します");
                let handler = self.default_handler.clone();
                self.execute(ctx, &handler).await
            }
        }
    }

    /// なりすまし要求を処理する
    ///
    /// `user_id` パラメータがなければ何もしない（なりすまし要求なし）。
    async fn impersonate(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let Some(target) = ctx.impersonation_target() else {
            return Ok(());
        };

        if !self.deps.identity.user_exists(&target).await? {
            tracing::error!(target = %target, "なりすまし対象のユーザーが存在しません");
            return Err(ApiError::Forbidden(format!(
                "なりすまし対象のユーザーが存在しません: {target}"
            )));
        }

        if ctx.caller() == &target {
            tracing::debug!("呼び出し元自身へのなりすまし要求。何もしません");
            return Ok(());
        }

        let roles = self.deps.identity.current_user_roles().await?;
        if !roles.contains(SYSTEM_MANAGER) {
            tracing::error!(
                caller = %ctx.caller(),
                target = %target,
                "なりすましに必要なロールがありません"
            );
            return Err(ApiError::Forbidden(format!(
                "他ユーザーへのなりすましには {SYSTEM_MANAGER} ロールが必要です"
            )));
        }

        tracing::info!(caller = %ctx.caller(), target = %target, "なりすましを実行します");
        self.deps.identity.set_current_user(&target).await?;
        ctx.switch_caller(target);

        Ok(())
    }

    /// ハンドラを失敗境界の中で実行する
    ///
    /// ハンドラの実行前にトランザクションを開始し、成功時はコミット、
    /// 失敗時は [`Self::failure_envelope`] がロールバックする。
    async fn execute(&self, ctx: &mut RequestContext, handler: &Handler) -> ResponseEnvelope {
        if let Err(err) = self.deps.transaction.begin().await {
            return self.failure_envelope(Some(ctx), err.into()).await;
        }

        match handler(&*ctx).await {
            Ok(envelope) => {
                if let Err(err) = self.deps.transaction.commit().await {
                    return self.failure_envelope(Some(ctx), err.into()).await;
                }
                envelope
            }
            Err(err) => self.failure_envelope(Some(ctx), err).await,
        }
    }

    /// 失敗をエンベロープに写像する
    ///
    /// どの失敗経路でも保留中のトランザクションをロールバックする。
    /// ロールバック自体の失敗は応答を変えない（ログのみ）。
    async fn failure_envelope(
        &self,
        ctx: Option<&RequestContext>,
        err: ApiError,
    ) -> ResponseEnvelope {
        match &err {
            ApiError::Infra(infra) => {
                tracing::error!(
                    error = %infra,
                    span_trace = %infra.span_trace(),
                    "ハンドラ実行が失敗しました"
                );
            }
            _ => tracing::error!(error = %err, "ハンドラ実行が失敗しました"),
        }

        if let Err(rollback_err) = self.deps.transaction.rollback().await {
            tracing::error!(
                error = %rollback_err,
                "保留中トランザクションのロールバックに失敗しました"
            );
        }

        // 業務例外のみ、例外メッセージ自体が利用者向けメッセージになる
        let message = match &err {
            ApiError::Business(msg) => msg.clone(),
            _ => String::new(),
        };

        self.respond_with(
            ctx,
            RespondArgs {
                message,
                code: Some(err.http_status()),
                developer_message: err.to_string(),
                error: Some(&err),
                ..Default::default()
            },
        )
        .await
    }
}

impl EndpointBuilder {
    /// ログでマスクする機微キー集合を差し替える
    pub fn sensitive_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// なりすまし要求の受け付けを許可する
    pub fn impersonate_user(mut self, allowed: bool) -> Self {
        self.impersonate_user = allowed;
        self
    }

    /// バージョン付きハンドラを登録する
    pub fn version(mut self, tag: impl Into<ApiVersion>, handler: Handler) -> Self {
        self.versions = self.versions.register(tag, handler);
        self
    }

    /// バージョン指定がない場合のハンドラを設定する
    pub fn default_handler(mut self, handler: Handler) -> Self {
        self.default_handler = Some(handler);
        self
    }

    /// エンドポイントを組み立てる
    pub fn build(self) -> Endpoint {
        Endpoint {
            name: self.name,
            sensitive_keys: self.sensitive_keys,
            impersonate_user: self.impersonate_user,
            versions: self.versions,
            default_handler: self
                .default_handler
                .unwrap_or_else(|| Arc::new(builtin_default)),
            deps: self.deps,
        }
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{testing::*, *};

    fn marker_handler(_ctx: &RequestContext) -> HandlerFuture<'_> {
        Box::pin(async { Ok(ResponseEnvelope::ok(Some(json!({ "marker": "default" })))) })
    }

    fn v2_handler(_ctx: &RequestContext) -> HandlerFuture<'_> {
        Box::pin(async { Ok(ResponseEnvelope::ok(Some(json!({ "marker": "v2" })))) })
    }

    fn echo_caller(ctx: &RequestContext) -> HandlerFuture<'_> {
        Box::pin(async move {
            Ok(ResponseEnvelope::ok(Some(
                json!({ "caller": ctx.caller().as_str() }),
            )))
        })
    }

    fn validation_failure(_ctx: &RequestContext) -> HandlerFuture<'_> {
        Box::pin(async { Err(ApiError::Validation("amount が不正です".into())) })
    }

    fn forbidden_failure(_ctx: &RequestContext) -> HandlerFuture<'_> {
        Box::pin(async { Err(ApiError::Forbidden("閲覧権限がありません".into())) })
    }

    fn business_failure(_ctx: &RequestContext) -> HandlerFuture<'_> {
        Box::pin(async { Err(ApiError::Business("Stock is insufficient".into())) })
    }

    fn context() -> RequestContext {
        RequestContext::new(UserId::new("alice@example.com"))
    }

    fn context_with_query(query: serde_json::Value) -> RequestContext {
        let serde_json::Value::Object(map) = query else {
            panic!("クエリはオブジェクトで指定する");
        };
        context().with_query(map)
    }

    #[tokio::test]
    async fn test_バージョン指定なしは既定ハンドラのエンベロープをそのまま返す() {
        let test = plain_deps();
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .default_handler(Arc::new(marker_handler))
            .version(2, Arc::new(v2_handler))
            .build();
        let mut ctx = context();

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.data, Some(json!({ "marker": "default" })));
        assert!(!envelope.is_error());
    }

    #[tokio::test]
    async fn test_文字列バージョンは整数タグの登録に解決される() {
        let test = plain_deps();
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .default_handler(Arc::new(marker_handler))
            .version(2, Arc::new(v2_handler))
            .build();
        let mut ctx = context_with_query(json!({ "api_version": "2" }));

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.data, Some(json!({ "marker": "v2" })));
    }

    #[tokio::test]
    async fn test_未登録バージョンは400のinvalid_versionになる() {
        let test = plain_deps();
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .version(2, Arc::new(v2_handler))
            .build();
        let mut ctx = context_with_query(json!({ "api_version": 9 }));

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 400);
        assert_eq!(envelope.error_code, "InvalidVersion");
        assert_eq!(envelope.message, "Invalid API Version '9'");
    }

    #[tokio::test]
    async fn test_成功経路はトランザクションをコミットする() {
        let test = plain_deps();
        let transaction = test.transaction.clone();
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .default_handler(Arc::new(marker_handler))
            .build();
        let mut ctx = context();

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 200);
        assert_eq!(transaction.begin_count(), 1);
        assert_eq!(transaction.commit_count(), 1);
        // 成功時に開始したトランザクションが放置されないこと
        assert_eq!(transaction.rollback_count(), 0);
    }

    #[tokio::test]
    async fn test_ハンドラ失敗はロールバックして417を返す() {
        let test = plain_deps();
        let transaction = test.transaction.clone();
        let endpoint = Endpoint::builder("orders.create", test.deps)
            .default_handler(Arc::new(validation_failure))
            .build();
        let mut ctx = context();

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 417);
        assert_eq!(envelope.error_code, "ValidationError");
        assert_eq!(transaction.commit_count(), 0);
        assert_eq!(transaction.rollback_count(), 1);
    }

    #[tokio::test]
    async fn test_登録簿にエントリがないエラーコードは汎用メッセージになる() {
        let test = plain_deps();
        let endpoint = Endpoint::builder("orders.get", test.deps)
            .default_handler(Arc::new(forbidden_failure))
            .build();
        let mut ctx = context();

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 403);
        assert_eq!(envelope.error_code, "Forbidden");
        assert_eq!(envelope.message, "Server Error (Forbidden)");
    }

    #[tokio::test]
    async fn test_登録簿のメッセージが使われ指定ステータスが優先される() {
        let test = test_deps(
            MockIdentityStore::new("alice@example.com", &[], &[]),
            MapRegistry::new(&[("ValidationError", "Invalid input", 422)]),
            MapTranslationStore::default(),
        );
        let endpoint = Endpoint::builder("orders.create", test.deps)
            .default_handler(Arc::new(validation_failure))
            .build();
        let mut ctx = context();

        let envelope = endpoint.run(&mut ctx).await;

        // 登録簿の推奨ステータスより実行境界の 417 が優先される
        assert_eq!(envelope.code, 417);
        assert_eq!(envelope.message, "Invalid input");
    }

    #[tokio::test]
    async fn test_業務例外は例外メッセージがそのまま利用者向けになる() {
        let test = plain_deps();
        let endpoint = Endpoint::builder("orders.submit", test.deps)
            .default_handler(Arc::new(business_failure))
            .build();
        let mut ctx = context();

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 417);
        assert_eq!(envelope.error_code, "BusinessError");
        assert_eq!(envelope.message, "Stock is insufficient");
    }

    #[tokio::test]
    async fn test_自分自身へのなりすましはロールなしで成功する() {
        let test = test_deps(
            MockIdentityStore::new("alice@example.com", &[], &["alice@example.com"]),
            MapRegistry::default(),
            MapTranslationStore::default(),
        );
        let identity = test.identity.clone();
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .impersonate_user(true)
            .default_handler(Arc::new(echo_caller))
            .build();
        let mut ctx = context_with_query(json!({ "user_id": "alice@example.com" }));

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.data, Some(json!({ "caller": "alice@example.com" })));
        // アイデンティティの切り替えは発生しない
        assert_eq!(identity.active_user(), UserId::new("alice@example.com"));
    }

    #[tokio::test]
    async fn test_ロールなしの他ユーザーなりすましは403になる() {
        let test = test_deps(
            MockIdentityStore::new(
                "alice@example.com",
                &[],
                &["alice@example.com", "bob@example.com"],
            ),
            MapRegistry::default(),
            MapTranslationStore::default(),
        );
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .impersonate_user(true)
            .default_handler(Arc::new(echo_caller))
            .build();
        let mut ctx = context_with_query(json!({ "user_id": "bob@example.com" }));

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 403);
        assert_eq!(envelope.error_code, "Forbidden");
    }

    #[tokio::test]
    async fn test_system_managerは他ユーザーになりすませる() {
        let test = test_deps(
            MockIdentityStore::new(
                "admin@example.com",
                &[SYSTEM_MANAGER],
                &["admin@example.com", "bob@example.com"],
            ),
            MapRegistry::default(),
            MapTranslationStore::default(),
        );
        let identity = test.identity.clone();
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .impersonate_user(true)
            .default_handler(Arc::new(echo_caller))
            .build();
        let mut ctx = RequestContext::new(UserId::new("admin@example.com"));
        ctx = ctx.with_query(
            serde_json::from_str(r#"{ "user_id": "bob@example.com" }"#).unwrap(),
        );

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.data, Some(json!({ "caller": "bob@example.com" })));
        assert_eq!(identity.active_user(), UserId::new("bob@example.com"));
        assert_eq!(ctx.original_caller(), &UserId::new("admin@example.com"));
    }

    #[tokio::test]
    async fn test_存在しないユーザーへのなりすましは403になる() {
        let test = test_deps(
            MockIdentityStore::new("admin@example.com", &[SYSTEM_MANAGER], &["admin@example.com"]),
            MapRegistry::default(),
            MapTranslationStore::default(),
        );
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .impersonate_user(true)
            .default_handler(Arc::new(echo_caller))
            .build();
        let mut ctx = context_with_query(json!({ "user_id": "ghost@example.com" }));

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.code, 403);
        assert_eq!(envelope.error_code, "Forbidden");
    }

    #[tokio::test]
    async fn test_なりすまし未許可のエンドポイントはuser_idを無視する() {
        let test = plain_deps();
        let identity = test.identity.clone();
        let endpoint = Endpoint::builder("orders.list", test.deps)
            .default_handler(Arc::new(echo_caller))
            .build();
        let mut ctx = context_with_query(json!({ "user_id": "bob@example.com" }));

        let envelope = endpoint.run(&mut ctx).await;

        assert_eq!(envelope.data, Some(json!({ "caller": "alice@example.com" })));
        assert_eq!(identity.active_user(), UserId::new("alice@example.com"));
    }
}
