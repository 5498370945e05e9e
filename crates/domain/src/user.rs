//! # ユーザー識別子とロール
//!
//! 呼び出し元アイデンティティを表す値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: [`UserId`] は文字列をラップし、型安全性を確保
//! - **不透明な識別子**: ユーザー ID はアイデンティティストアが発行する
//!   不透明な文字列（実運用ではメールアドレス形式）であり、
//!   このクレートは形式を解釈しない
//!
//! ## ロール
//!
//! 他ユーザーへのなりすましには [`SYSTEM_MANAGER`] ロールが必要となる。
//! ロールの集合はアイデンティティストアから取得され、文字列名で比較する。

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// 他ユーザーへのなりすましを許可する特権ロール名
pub const SYSTEM_MANAGER: &str = "System Manager";

/// ユーザー ID（一意識別子）
///
/// アイデンティティストアが発行する不透明な文字列識別子。
/// Newtype パターンで型安全性を確保。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct UserId(String);

impl UserId {
    /// 既存の識別子文字列からユーザー ID を作成する
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_ユーザーidは文字列として比較できる() {
        let a = UserId::new("user@example.com");
        let b = UserId::from("user@example.com");

        assert_eq!(a, b);
        assert_eq!(a.as_str(), "user@example.com");
    }

    #[test]
    fn test_displayは内部文字列をそのまま出力する() {
        let id = UserId::new("hub@example.com");
        assert_eq!(format!("{id}"), "hub@example.com");
    }
}
