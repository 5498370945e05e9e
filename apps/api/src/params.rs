//! # パラメータ値ヘルパー
//!
//! リクエストパラメータの値取り出しとページング・日付の補助関数。
//! クライアントは数値を文字列で送ってくることがあるため、
//! 整数取り出しは両方の形を受け付ける。

use serde_json::{Map, Value};

/// ページング開始位置の既定値
const DEFAULT_PAGING_OFFSET: i64 = 0;

/// ページング件数の既定値
const DEFAULT_PAGING_COUNT: i64 = 20;

/// パラメータから整数値を取り出す
///
/// 数値（整数部のみ）と数字文字列の両方を受け付ける。
/// キーが存在しない、または整数として解釈できない場合は `default`。
pub fn int_value(params: &Map<String, Value>, name: &str, default: i64) -> i64 {
    match params.get(name) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// ページング開始位置（`offset`）を取り出す
///
/// 未指定・不正値は 0。負数も 0 に丸める。
pub fn paging_offset(params: &Map<String, Value>) -> i64 {
    int_value(params, "offset", DEFAULT_PAGING_OFFSET).max(0)
}

/// ページング件数（`count`）を取り出す
///
/// 未指定・不正値は 20。0 以下は既定値に戻す。
pub fn paging_count(params: &Map<String, Value>) -> i64 {
    let count = int_value(params, "count", DEFAULT_PAGING_COUNT);
    if count <= 0 { DEFAULT_PAGING_COUNT } else { count }
}

/// 日付文字列の集合が指定フォーマットに従うか検証する
///
/// `format` は chrono の書式指定（例: `%Y-%m-%d`）。
pub fn validate_date_format<'a>(dates: impl IntoIterator<Item = &'a str>, format: &str) -> bool {
    dates
        .into_iter()
        .all(|date| chrono::NaiveDate::parse_from_str(date, format).is_ok())
}
