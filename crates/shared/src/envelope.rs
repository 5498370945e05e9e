//! # レスポンスエンベロープ
//!
//! すべてのエンドポイントが返す統一レスポンス形式を提供する。
//!
//! ## ワイヤ形式
//!
//! ```json
//! {
//!   "message": "利用者向けメッセージ",
//!   "data": { "任意の構造": "..." },
//!   "errorCode": "",
//!   "code": 200,
//!   "developer_message": "開発者向けメッセージ"
//! }
//! ```
//!
//! ## 不変条件
//!
//! - `code` は常に設定される（HTTP ステータス）
//! - `errorCode` が非空であればこのレスポンスは失敗を表す

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 統一レスポンスエンベロープ
///
/// 成功・失敗を問わず、エンドポイントが外部に返す唯一のワイヤ契約。
/// フィールド名は既存クライアントとの互換のため `errorCode`（camelCase）と
/// `developer_message`（snake_case）が混在する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// 利用者向けメッセージ（翻訳済み）
    pub message:           String,
    /// 任意の構造化ペイロード
    pub data:              Option<Value>,
    /// エラーコード（成功時は空文字列）
    #[serde(rename = "errorCode")]
    pub error_code:        String,
    /// HTTP ステータスコード
    pub code:              u16,
    /// 開発者向けメッセージ（翻訳されない）
    pub developer_message: String,
}

impl ResponseEnvelope {
    /// 成功レスポンスを作成する
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            message: String::new(),
            data,
            error_code: String::new(),
            code: 200,
            developer_message: String::new(),
        }
    }

    /// 失敗レスポンスを作成する
    pub fn error(code: u16, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            developer_message: message.clone(),
            message,
            data: None,
            error_code: error_code.into(),
            code,
        }
    }

    /// このレスポンスが失敗を表すか判定する
    pub fn is_error(&self) -> bool {
        !self.error_code.is_empty()
    }
}
