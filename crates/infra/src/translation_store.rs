//! # 翻訳ストア
//!
//! 対訳（原文 → 訳文）の検索を担当するストア。
//!
//! ## 設計方針
//!
//! - **一括検索**: N+1 問題を避けるため、ツリーから抽出したキー集合を
//!   `= ANY($1)` で一度に問い合わせる
//! - **部分一致を許容**: 対訳が存在しないキーは結果マップに含まれない。
//!   これはエラーではなく、呼び出し側が原文にフォールバックする
//! - **読み取り専用**: このコアはストアに書き込まない。並行読み取りのみ
//!
//! ## テーブル
//!
//! ```sql
//! CREATE TABLE translations (
//!     source_text     TEXT NOT NULL,
//!     language        TEXT NOT NULL,
//!     translated_text TEXT NOT NULL,
//!     PRIMARY KEY (source_text, language)
//! );
//! ```

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::InfraError;

/// 翻訳ストアトレイト
///
/// 対訳検索の契約。インフラ層で具体的な実装を提供し、
/// 翻訳サービスから利用する。
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// 単一の原文に対する訳文を検索する
    ///
    /// # 戻り値
    ///
    /// - `Ok(Some(訳文))`: 対訳が存在する場合
    /// - `Ok(None)`: 対訳が存在しない場合（エラーではない）
    /// - `Err(_)`: ストア自体の障害（リクエスト全体を失敗させる）
    async fn lookup(&self, key: &str, language: &str) -> Result<Option<String>, InfraError>;

    /// 原文キー集合に対する訳文を一括検索する
    ///
    /// 対訳が見つかったキーのみを含むマップを返す。
    /// 空集合を渡した場合は空のマップを返す。
    async fn lookup_many(
        &self,
        keys: &BTreeSet<String>,
        language: &str,
    ) -> Result<HashMap<String, String>, InfraError>;
}

/// PostgreSQL 実装の翻訳ストア
#[derive(Debug, Clone)]
pub struct PostgresTranslationStore {
    pool: PgPool,
}

impl PostgresTranslationStore {
    /// 新しいストアインスタンスを作成する
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TranslationStore for PostgresTranslationStore {
    async fn lookup(&self, key: &str, language: &str) -> Result<Option<String>, InfraError> {
        let translated: Option<String> = sqlx::query_scalar(
            r#"
            SELECT translated_text
            FROM translations
            WHERE source_text = $1 AND language = $2
            "#,
        )
        .bind(key)
        .bind(language)
        .fetch_optional(&self.pool)
        .await?;

        Ok(translated)
    }

    async fn lookup_many(
        &self,
        keys: &BTreeSet<String>,
        language: &str,
    ) -> Result<HashMap<String, String>, InfraError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<String> = keys.iter().cloned().collect();
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT source_text, translated_text
            FROM translations
            WHERE source_text = ANY($1) AND language = $2
            "#,
        )
        .bind(&keys)
        .bind(language)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
