//! # API サーバー
//!
//! バージョン付きディスパッチとレスポンス翻訳を担う内部 API 層の
//! エントリーポイント。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `REDIS_URL` | **Yes** | Redis 接続 URL（セッションストア） |
//!
//! ## 起動方法
//!
//! ```bash
//! API_PORT=3000 DATABASE_URL=postgres://... REDIS_URL=redis://... \
//!     cargo run -p torii-api
//! ```

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use torii_api::{
    config::ApiConfig,
    handler::{ApiState, health_check, run_status},
};
use torii_infra::db;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// API サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,torii=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 設定読み込み
    let config = ApiConfig::from_env().expect("設定の読み込みに失敗しました");

    tracing::info!("API サーバーを起動します: {}:{}", config.host, config.port);

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("データベース接続に失敗しました");
    tracing::info!("データベースに接続しました");

    // Redis 接続（セッションストア）
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).expect("Redis URL が不正です");
    let redis = redis::aio::ConnectionManager::new(redis_client)
        .await
        .expect("Redis 接続に失敗しました");
    tracing::info!("Redis に接続しました");

    let state = Arc::new(ApiState { pool, redis });

    // ルーター構築
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/status", post(run_status))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("アドレスのパースに失敗しました");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("API サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
