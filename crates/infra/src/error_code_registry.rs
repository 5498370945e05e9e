//! # エラーコード登録簿
//!
//! エラーコードに対する表示メッセージと推奨 HTTP ステータスの検索を
//! 担当するストア。
//!
//! エラーコードにエントリがない場合、呼び出し側は汎用メッセージ
//! `Server Error (<code>)` にフォールバックする。登録簿の欠落は
//! エラーではない。
//!
//! ## テーブル
//!
//! ```sql
//! CREATE TABLE error_codes (
//!     code        TEXT PRIMARY KEY,
//!     message     TEXT NOT NULL,
//!     http_status INTEGER NOT NULL
//! );
//! ```

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::InfraError;

/// エラーコード登録簿のエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodeEntry {
    /// 利用者向け表示メッセージ（翻訳前）
    pub message: String,
    /// 推奨 HTTP ステータスコード
    pub http_status: u16,
}

/// エラーコード登録簿トレイト
#[async_trait]
pub trait ErrorCodeRegistry: Send + Sync {
    /// エラーコードに対応するエントリを検索する
    ///
    /// エントリが存在しない場合は `Ok(None)`（エラーではない）。
    async fn lookup(&self, code: &str) -> Result<Option<ErrorCodeEntry>, InfraError>;
}

/// PostgreSQL 実装のエラーコード登録簿
#[derive(Debug, Clone)]
pub struct PostgresErrorCodeRegistry {
    pool: PgPool,
}

impl PostgresErrorCodeRegistry {
    /// 新しい登録簿インスタンスを作成する
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ErrorCodeRegistry for PostgresErrorCodeRegistry {
    async fn lookup(&self, code: &str) -> Result<Option<ErrorCodeEntry>, InfraError> {
        let row: Option<(String, i32)> = sqlx::query_as(
            r#"
            SELECT message, http_status
            FROM error_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(message, http_status)| ErrorCodeEntry {
            message,
            // 範囲外の値が登録されていた場合は 500 として扱う
            http_status: u16::try_from(http_status).unwrap_or(500),
        }))
    }
}
