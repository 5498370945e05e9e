//! # ステータスエンドポイント
//!
//! バージョン付きディスパッチの最小構成例。`POST /api/status` を
//! `api_version` パラメータで v1 / v2 に振り分ける。バージョン指定が
//! なければ v1 相当の応答を返す。
//!
//! コラボレータ（トランザクション、セッション、登録簿、翻訳ストア）は
//! リクエストごとに組み立てる。エンドポイント定義そのものは状態を
//! 持たないが、トランザクションとセッションはリクエストスコープであるため。

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Json,
};
use bytes::Bytes;
use redis::aio::ConnectionManager;
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use torii_domain::user::UserId;
use torii_infra::{
    db::PgRequestTransaction,
    error_code_registry::PostgresErrorCodeRegistry,
    identity::{IdentityStore, SessionIdentityStore},
    translation_store::PostgresTranslationStore,
};
use torii_shared::ResponseEnvelope;

use crate::{
    context::RequestContext,
    endpoint::{Endpoint, EndpointDeps, HandlerFuture},
    params,
    usecase::TranslationService,
};

/// セッション ID を運ぶリクエストヘッダ
const SESSION_HEADER: &str = "x-session-id";

/// アプリケーション全体で共有される接続
#[derive(Clone)]
pub struct ApiState {
    /// PostgreSQL 接続プール
    pub pool: PgPool,
    /// Redis 接続
    pub redis: ConnectionManager,
}

fn status_v1(_ctx: &RequestContext) -> HandlerFuture<'_> {
    Box::pin(async { Ok(ResponseEnvelope::ok(Some(json!({ "status": "ok" })))) })
}

fn status_v2(ctx: &RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        Ok(ResponseEnvelope::ok(Some(json!({
            "status": "ok",
            "caller": ctx.caller().as_str(),
            "offset": params::paging_offset(ctx.query()),
            "count": params::paging_count(ctx.query()),
        }))))
    })
}

/// `POST /api/status`
pub async fn run_status(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> (StatusCode, Json<ResponseEnvelope>) {
    let identity = Arc::new(SessionIdentityStore::new(
        state.redis.clone(),
        state.pool.clone(),
        session_id(&headers),
    ));

    // セッションがなければゲストとして実行する
    let caller = identity
        .current_user()
        .await
        .unwrap_or_else(|_| UserId::new("Guest"));

    let deps = EndpointDeps {
        identity,
        transaction: Arc::new(PgRequestTransaction::new(state.pool.clone())),
        error_codes: Arc::new(PostgresErrorCodeRegistry::new(state.pool.clone())),
        translator: TranslationService::new(Arc::new(PostgresTranslationStore::new(
            state.pool.clone(),
        ))),
    };

    let endpoint = Endpoint::builder("system.status", deps)
        .impersonate_user(true)
        .version(1, Arc::new(status_v1))
        .version(2, Arc::new(status_v2))
        .default_handler(Arc::new(status_v1))
        .build();

    let query_map: Map<String, Value> = query
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    let mut ctx = RequestContext::new(caller)
        .with_query(query_map)
        .with_json_body(RequestContext::parse_json_body(&body));
    if let Some(language) = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
    {
        ctx = ctx.with_language(language);
    }

    let envelope = match endpoint.require_non_negative(&ctx, ctx.query()).await {
        Ok(()) => endpoint.run(&mut ctx).await,
        Err(envelope) => envelope,
    };

    into_response(envelope)
}

fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous")
        .to_string()
}

/// エンベロープの `code` を HTTP ステータスにも反映する
fn into_response(envelope: ResponseEnvelope) -> (StatusCode, Json<ResponseEnvelope>) {
    let status =
        StatusCode::from_u16(envelope.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope))
}
