//! # ヘルスチェックハンドラ

use axum::response::Json;
use torii_shared::HealthResponse;

/// ヘルスチェック
///
/// 死活監視用。依存コンポーネントの状態は確認しない。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
