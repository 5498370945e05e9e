//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **HTTP ステータスへのマッピング**: 実行境界でステータスコードに変換可能
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 417 Expectation Failed | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | リソースが存在しない |
//! | `BadRequest` | 400 Bad Request | リクエスト構造の不備 |
//! | `Forbidden` | 403 Forbidden | 権限不足・なりすまし拒否 |
//! | `Business` | 417 Expectation Failed | 業務例外（ドメイン固有） |
//!
//! バリデーション失敗が 417 になるのは上流システムとの互換要件であり、
//! 意図的に 400 とは区別している。

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// 実行境界（エンドポイントの `execute`）がこのエラーを受け取り、
/// 統一エンベロープに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// リソースが見つからない
    ///
    /// 指定された識別子のリソースが存在しない場合に使用する。
    /// `entity_type` には対象の種類（"User", "Translation" など）を指定し、
    /// エラーメッセージを具体的にする。
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// リソースの種類（コンパイル時に決定される `&'static str`）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id: String,
    },

    /// 不正なリクエスト
    ///
    /// リクエストの構造自体に問題がある場合に使用する。
    /// 値の検証失敗（`Validation`）とは区別する。
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 権限エラー
    ///
    /// 認可（Authorization）の失敗を表す。なりすまし要求の拒否にも使用する。
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 業務例外
    ///
    /// 上記に分類できないドメイン固有の業務エラー。
    /// 実行境界では文字列化したメッセージが開発者向けメッセージになる。
    #[error("業務例外: {0}")]
    Business(String),
}
