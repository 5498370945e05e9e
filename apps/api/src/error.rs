//! # API 層エラー定義
//!
//! エンドポイント実行中に発生しうるすべての失敗を集約するエラー型。
//! ハンドラはこの型で失敗を返し、実行境界が統一エンベロープに写像する。
//!
//! ## エラー種別と応答の対応
//!
//! | 種別 | HTTP | errorCode |
//! |------|------|-----------|
//! | `Validation` | 417 | `ValidationError` |
//! | `NotFound` | 404 | `NotFound` |
//! | `BadRequest` | 400 | `BadRequest` |
//! | `Forbidden` | 403 | `Forbidden` |
//! | `Business` | 417 | `BusinessError` |
//! | `Infra` / `Internal` | 500 | `InternalError` |
//!
//! バリデーション失敗と業務例外が 417 になるのは既存クライアントとの
//! 互換要件であり、意図的に 400 とは区別している。

use thiserror::Error;
use torii_domain::DomainError;
use torii_infra::InfraError;

/// エンドポイント実行中に発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// 入力値の検証失敗
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// リソースが存在しない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// リクエスト構造の不備
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 権限不足・なりすまし拒否
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// ドメイン固有の業務例外
    ///
    /// 実行境界では文字列化したメッセージが開発者向けメッセージになる。
    #[error("業務例外: {0}")]
    Business(String),

    /// インフラ層の障害
    #[error("インフラエラー: {0}")]
    Infra(#[from] InfraError),

    /// 分類できない内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl ApiError {
    /// 応答に使用する HTTP ステータスコード
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Business(_) => 417,
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::Forbidden(_) => 403,
            Self::Infra(_) | Self::Internal(_) => 500,
        }
    }

    /// 応答の `errorCode` に使用する種別名
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound(_) => "NotFound",
            Self::BadRequest(_) => "BadRequest",
            Self::Forbidden(_) => "Forbidden",
            Self::Business(_) => "BusinessError",
            Self::Infra(_) | Self::Internal(_) => "InternalError",
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(source: DomainError) -> Self {
        match source {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::NotFound { .. } => Self::NotFound(source.to_string()),
            DomainError::BadRequest(msg) => Self::BadRequest(msg),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
            DomainError::Business(msg) => Self::Business(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ApiError::Validation("空の値".into()), 417, "ValidationError")]
    #[case(ApiError::NotFound("User".into()), 404, "NotFound")]
    #[case(ApiError::BadRequest("型不一致".into()), 400, "BadRequest")]
    #[case(ApiError::Forbidden("権限なし".into()), 403, "Forbidden")]
    #[case(ApiError::Business("在庫不足".into()), 417, "BusinessError")]
    #[case(ApiError::Internal("panic 相当".into()), 500, "InternalError")]
    fn test_ステータスとエラーコードの対応(
        #[case] error: ApiError,
        #[case] status: u16,
        #[case] kind: &str,
    ) {
        assert_eq!(error.http_status(), status);
        assert_eq!(error.kind_name(), kind);
    }

    #[test]
    fn test_ドメインエラーからの変換は種別を保存する() {
        let domain = DomainError::Forbidden("なりすまし拒否".into());
        let api: ApiError = domain.into();

        assert!(matches!(api, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_インフラエラーは内部エラー扱いになる() {
        let api: ApiError = InfraError::unexpected("接続断").into();

        assert_eq!(api.http_status(), 500);
        assert_eq!(api.kind_name(), "InternalError");
    }
}
