//! # パラメータ検証ヘルパー
//!
//! 検証失敗を例外ではなく「失敗エンベロープ」として返す。呼び出し側
//! （ハンドラ）が `?` ではなく `match` / early-return で短絡するか
//! どうかを選べる。副作用はログ出力のみ。
//!
//! ## 数値ゼロの扱い
//!
//! [`Endpoint::require_non_empty_values`] は、いずれかの値が数値ゼロ
//! （`0` / `0.0`、文字列形含む）だった時点で検査全体を成功として
//! 打ち切る。他のキーが欠けていても報告されない。上流システムから
//! 引き継いだ挙動であり、既存クライアントが依存しているため保存する。

use serde_json::{Map, Value};
use torii_shared::ResponseEnvelope;

use super::{Endpoint, RespondArgs};
use crate::context::RequestContext;

/// パラメータ値として許可される型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// 文字列
    String,
    /// 数値
    Number,
    /// 真偽値
    Boolean,
    /// 配列
    Array,
    /// オブジェクト
    Object,
}

impl ParamType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// 値が「空」（falsy）か判定する
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// 値が数値ゼロか判定する（文字列形の `"0"` / `"0.0"` を含む)
fn is_numeric_zero(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => matches!(s.as_str(), "0" | "0.0"),
        _ => false,
    }
}

/// 値を数値として解釈する（数値と数字文字列の両方を受け付ける）
fn as_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl Endpoint {
    /// 必須パラメータと代替グループの存在を検証する
    ///
    /// 代替グループは、メンバーのいずれか 1 つが非 null で存在すれば
    /// 満たされる。失敗時は欠けている必須名と未充足グループを
    /// **すべて** 列挙した 400 エンベロープを返す。
    pub async fn require_parameters(
        &self,
        ctx: &RequestContext,
        params: &Map<String, Value>,
        required: &[&str],
        alternative_groups: &[&[&str]],
    ) -> Result<(), ResponseEnvelope> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| params.get(*name).is_none_or(Value::is_null))
            .collect();

        let unsatisfied: Vec<String> = alternative_groups
            .iter()
            .filter(|group| {
                !group
                    .iter()
                    .any(|name| params.get(*name).is_some_and(|v| !v.is_null()))
            })
            .map(|group| group.join(" | "))
            .collect();

        if missing.is_empty() && unsatisfied.is_empty() {
            return Ok(());
        }

        let mut message = String::new();
        if !missing.is_empty() {
            message.push_str(&format!(
                "Required parameters are missing: {}",
                missing.join(", ")
            ));
        }
        if !unsatisfied.is_empty() {
            if !message.is_empty() {
                message.push_str(". ");
            }
            message.push_str(&format!(
                "Specify at least one of the following: {}",
                unsatisfied.join(", ")
            ));
        }

        tracing::warn!(%message, "必須パラメータ検証に失敗しました");
        Err(self
            .respond_with(
                Some(ctx),
                RespondArgs {
                    message,
                    code: Some(400),
                    error_code: "ArgumentNotFound".to_string(),
                    ..Default::default()
                },
            )
            .await)
    }

    /// 指定キーの値が空でないことを検証する
    ///
    /// いずれかの値が数値ゼロだった時点で検査全体が成功として
    /// 打ち切られる（モジュールドキュメント参照）。
    pub async fn require_non_empty_values(
        &self,
        ctx: &RequestContext,
        params: &Map<String, Value>,
        names: &[&str],
    ) -> Result<(), ResponseEnvelope> {
        let mut empty = Vec::new();

        for name in names {
            let value = params.get(*name);

            if value.is_some_and(is_numeric_zero) {
                return Ok(());
            }

            if value.is_none_or(is_empty_value) {
                empty.push(*name);
            }
        }

        if empty.is_empty() {
            return Ok(());
        }

        let message = format!("These arguments can't be empty: {}", empty.join(", "));
        tracing::warn!(%message, "値の非空検証に失敗しました");
        Err(self
            .respond_with(
                Some(ctx),
                RespondArgs {
                    message,
                    code: Some(400),
                    error_code: "ValuesNotFound".to_string(),
                    ..Default::default()
                },
            )
            .await)
    }

    /// すべての値の型が許可リストに含まれることを検証する
    ///
    /// 空（falsy）の値は検査対象外。`check_digit_strings` が有効で
    /// 文字列が許可されている場合、文字列値はさらに数値として
    /// 解釈できなければならない。
    pub async fn require_type(
        &self,
        ctx: &RequestContext,
        params: &Map<String, Value>,
        allowed: &[ParamType],
        check_digit_strings: bool,
    ) -> Result<(), ResponseEnvelope> {
        let strings_allowed = allowed.contains(&ParamType::String);
        let mut wrong = Vec::new();

        for (name, value) in params {
            if is_empty_value(value) {
                continue;
            }

            if !allowed.iter().any(|t| t.matches(value)) {
                wrong.push(name.as_str());
                continue;
            }

            let digit_check_failed = strings_allowed
                && check_digit_strings
                && matches!(value, Value::String(s) if s.trim().parse::<f64>().is_err());
            if digit_check_failed {
                wrong.push(name.as_str());
            }
        }

        if wrong.is_empty() {
            return Ok(());
        }

        let developer_message = format!("[{}] have wrong input type", wrong.join(", "));
        tracing::warn!(%developer_message, "型検証に失敗しました");
        Err(self
            .respond_with(
                Some(ctx),
                RespondArgs {
                    code: Some(400),
                    error_code: "BadRequest".to_string(),
                    developer_message,
                    ..Default::default()
                },
            )
            .await)
    }

    /// すべての数値が非負であることを検証する
    ///
    /// 数値として解釈できない値は検査対象外。
    pub async fn require_non_negative(
        &self,
        ctx: &RequestContext,
        params: &Map<String, Value>,
    ) -> Result<(), ResponseEnvelope> {
        let negative: Vec<&str> = params
            .iter()
            .filter(|(_, value)| as_numeric(value).is_some_and(|n| n < 0.0))
            .map(|(name, _)| name.as_str())
            .collect();

        if negative.is_empty() {
            return Ok(());
        }

        let developer_message = format!("[{}] value shouldn't be negative", negative.join(", "));
        tracing::warn!(%developer_message, "非負検証に失敗しました");
        Err(self
            .respond_with(
                Some(ctx),
                RespondArgs {
                    code: Some(400),
                    error_code: "BadRequest".to_string(),
                    developer_message,
                    ..Default::default()
                },
            )
            .await)
    }
}
