//! # ツリーウォーカー
//!
//! 任意のビジターを駆動して `serde_json::Value` のツリーをその場で
//! 書き換える再帰走査エンジン。
//!
//! ## 走査規則
//!
//! - ルートノードは種別にかかわらず `key = None` で訪問される
//! - マップのエントリはエントリのキーを渡して再帰する
//! - シーケンスの要素は `key = None` で再帰する（添字はフィルタ可能な
//!   キーとして伝播しない）。このため、除外キー直下のシーケンスは
//!   シーケンス自体が再帰されず、内部の文字列も除外される
//! - 文字列リーフは末尾空白を除去した形でビジターに渡され、ビジターが
//!   返した値が除去済み文字列と異なる場合のみ置換される。それ以外は
//!   元の（末尾空白を含む）値がそのまま残る
//! - 数値・真偽値・null は訪問されず、変更されない

use serde_json::Value;

use crate::translate::visitor::ObjectVisitor;

/// ビジターを駆動してツリーをその場で書き換える
pub fn walk(value: &mut Value, visitor: &mut dyn ObjectVisitor) {
    dispatch(None, value, visitor);
}

fn dispatch(key: Option<&str>, value: &mut Value, visitor: &mut dyn ObjectVisitor) {
    match value {
        Value::Object(map) => {
            if visitor.visit_map(key, map) {
                for (entry_key, entry_value) in map.iter_mut() {
                    dispatch(Some(entry_key), entry_value, visitor);
                }
            }
        }
        Value::Array(seq) => {
            if visitor.visit_seq(key, seq) {
                for element in seq.iter_mut() {
                    // 添字はフィルタ可能なキーではないため None を渡す
                    dispatch(None, element, visitor);
                }
            }
        }
        Value::String(s) => {
            let replacement = visitor.visit_str(key, s.trim_end());
            if let Some(new_value) = replacement
                && new_value != s.trim_end()
            {
                *s = new_value;
            }
        }
        // 数値・真偽値・null は訪問対象外
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;
    use crate::translate::visitor::{
        KeyExtractionVisitor,
        SubstitutionVisitor,
        TranslationFilter,
    };

    fn extract(value: &Value, filter: TranslationFilter) -> BTreeSet<String> {
        let mut visitor = KeyExtractionVisitor::new(filter);
        let mut value = value.clone();
        walk(&mut value, &mut visitor);
        visitor.into_keys()
    }

    #[test]
    fn test_ネスト構造から文字列リーフを抽出する() {
        let value = json!({
            "status": "Open",
            "items": [
                { "label": "First" },
                { "label": "Second" },
            ],
            "total": 3,
        });

        let keys = extract(&value, TranslationFilter::default());

        assert_eq!(
            keys,
            BTreeSet::from([
                "First".to_string(),
                "Open".to_string(),
                "Second".to_string(),
            ])
        );
    }

    #[test]
    fn test_除外キー配下のマップは丸ごとスキップされる() {
        let value = json!({
            "meta": { "label": "Hidden" },
            "label": "Visible",
        });
        let filter = TranslationFilter::with_exclusions(["meta".to_string()]);

        assert_eq!(extract(&value, filter), BTreeSet::from(["Visible".to_string()]));
    }

    #[test]
    fn test_除外キー直下のシーケンス内文字列も除外される() {
        // シーケンス自体が再帰されないため、要素のキーが None でも除外が効く
        let value = json!({
            "tags": ["Internal", "Secret"],
            "title": "Invoice",
        });
        let filter = TranslationFilter::with_exclusions(["tags".to_string()]);

        assert_eq!(extract(&value, filter), BTreeSet::from(["Invoice".to_string()]));
    }

    #[test]
    fn test_ルートがシーケンスでも走査できる() {
        let value = json!(["One", "Two", 3]);

        assert_eq!(
            extract(&value, TranslationFilter::default()),
            BTreeSet::from(["One".to_string(), "Two".to_string()])
        );
    }

    #[test]
    fn test_置換は対象文字列のみをその場で書き換える() {
        let mut value = json!({
            "status": "Open",
            "id": "Open",
            "count": 2,
        });
        let translations = maplit::hashmap! {
            "Open".to_string() => "مفتوح".to_string(),
        };
        let filter = TranslationFilter::with_exclusions(["id".to_string()]);
        let mut visitor = SubstitutionVisitor::new(translations, filter);

        walk(&mut value, &mut visitor);

        assert_eq!(
            value,
            json!({
                "status": "مفتوح",
                "id": "Open",
                "count": 2,
            })
        );
    }

    #[test]
    fn test_末尾空白つき文字列は除去形で照合される() {
        let mut value = json!({ "status": "Open   " });
        let translations = maplit::hashmap! {
            "Open".to_string() => "مفتوح".to_string(),
        };
        let mut visitor =
            SubstitutionVisitor::new(translations, TranslationFilter::default());

        walk(&mut value, &mut visitor);

        assert_eq!(value, json!({ "status": "مفتوح" }));
    }

    #[test]
    fn test_対訳なしの場合は末尾空白を含む元の値が残る() {
        let mut value = json!({ "status": "Open   " });
        let mut visitor = SubstitutionVisitor::new(
            std::collections::HashMap::new(),
            TranslationFilter::default(),
        );

        walk(&mut value, &mut visitor);

        // visit_str は除去形を返すが、除去形と同一のため置換されない
        assert_eq!(value, json!({ "status": "Open   " }));
    }

    #[test]
    fn test_置換は冪等である() {
        let translations = maplit::hashmap! {
            "Open".to_string() => "مفتوح".to_string(),
        };
        let mut value = json!({ "status": "Open", "items": ["Open"] });

        let mut first = SubstitutionVisitor::new(translations.clone(), TranslationFilter::default());
        walk(&mut value, &mut first);
        let after_first = value.clone();

        let mut second = SubstitutionVisitor::new(translations, TranslationFilter::default());
        walk(&mut value, &mut second);

        assert_eq!(value, after_first);
    }

    #[test]
    fn test_数値と真偽値はそのまま通過する() {
        let mut value = json!({ "count": 42, "active": true, "rate": 0.5, "none": null });
        let mut visitor = KeyExtractionVisitor::new(TranslationFilter::default());

        walk(&mut value, &mut visitor);

        assert_eq!(
            value,
            json!({ "count": 42, "active": true, "rate": 0.5, "none": null })
        );
        assert!(visitor.into_keys().is_empty());
    }
}
