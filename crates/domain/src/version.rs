//! # API バージョン登録表
//!
//! エンドポイントごとのバージョン付きハンドラ登録と解決ロジックを定義する。
//!
//! ## 設計方針
//!
//! - **明示的な登録表**: 実行時リフレクションではなく、構築時に
//!   バージョン識別子とハンドラの対応を宣言順で登録する
//! - **文字列比較**: バージョン識別子は整数・文字列の両方を受け付けるため、
//!   文字列形式に正規化して比較する（`"2"` と `2` は同一バージョン）
//! - **重複タグの扱い**: 同一バージョンが複数登録された場合、最初に
//!   登録されたものを採用し、設定ミスとして警告ログを出す。
//!   この「先勝ち」挙動は上流システムから引き継いだ仕様であり、
//!   解決自体は成功する

use derive_more::Display;
use serde_json::Value;

/// API バージョン識別子
///
/// 整数（`2`）と文字列（`"2"`）のどちらで宣言されても文字列形式で
/// 保持・比較する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct ApiVersion(String);

impl ApiVersion {
    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// リクエストパラメータ値からバージョン識別子を取り出す
    ///
    /// 文字列と数値のみをバージョンとして受け付ける。
    /// それ以外の型（配列、オブジェクト、真偽値など）は `None`。
    pub fn from_param(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl From<i64> for ApiVersion {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for ApiVersion {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ApiVersion {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// バージョン付きハンドラの登録表
///
/// 宣言順を保持する。`H` はハンドラ表現（関数ポインタ、クロージャ、
/// `Arc<dyn Fn>` など）で、この型は解決のみを担い呼び出しには関与しない。
#[derive(Debug, Default)]
pub struct VersionTable<H> {
    entries: Vec<(ApiVersion, H)>,
}

impl<H> VersionTable<H> {
    /// 空の登録表を作成する
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// バージョンとハンドラの対応を登録する
    ///
    /// 登録順は保持され、重複バージョンの解決時に意味を持つ。
    pub fn register(mut self, version: impl Into<ApiVersion>, handler: H) -> Self {
        self.entries.push((version.into(), handler));
        self
    }

    /// 登録済みエントリ数を返す
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 登録表が空か判定する
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 要求されたバージョンに対応するハンドラを解決する
    ///
    /// - 一致なし → `None`（呼び出し元が「無効なバージョン」応答に写像する）
    /// - 複数一致 → 最初に登録されたものを返し、設定ミスとして警告を出す
    pub fn resolve(&self, requested: &ApiVersion) -> Option<&H> {
        let mut matches = self
            .entries
            .iter()
            .filter(|(version, _)| version == requested);

        let first = matches.next()?;
        if matches.next().is_some() {
            tracing::warn!(
                version = %requested,
                "同一 API バージョンに複数のハンドラが登録されています。最初の登録を使用します"
            );
        }

        Some(&first.1)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_整数と文字列のバージョン識別子は同一視される() {
        assert_eq!(ApiVersion::from(2), ApiVersion::from("2"));
    }

    #[rstest]
    #[case(json!("2"), Some("2"))]
    #[case(json!(2), Some("2"))]
    #[case(json!(2.5), Some("2.5"))]
    #[case(json!(null), None)]
    #[case(json!([1]), None)]
    #[case(json!(true), None)]
    fn test_パラメータ値からのバージョン抽出(
        #[case] value: Value,
        #[case] expected: Option<&str>,
    ) {
        let version = ApiVersion::from_param(&value);
        assert_eq!(version.as_ref().map(ApiVersion::as_str), expected);
    }

    #[test]
    fn test_整数タグ登録に対して文字列バージョンが解決できる() {
        let table = VersionTable::new().register(2, "v2-handler");

        assert_eq!(table.resolve(&ApiVersion::from("2")), Some(&"v2-handler"));
    }

    #[test]
    fn test_一致しないバージョンはnoneを返す() {
        let table = VersionTable::new().register(1, "v1");

        assert_eq!(table.resolve(&ApiVersion::from("99")), None);
    }

    #[test]
    fn test_重複登録時は最初のハンドラが採用される() {
        let table = VersionTable::new()
            .register("2", "first")
            .register(2, "second");

        assert_eq!(table.resolve(&ApiVersion::from(2)), Some(&"first"));
    }

    #[test]
    fn test_空の登録表は常にnoneを返す() {
        let table: VersionTable<()> = VersionTable::new();

        assert!(table.is_empty());
        assert_eq!(table.resolve(&ApiVersion::from(1)), None);
    }
}
