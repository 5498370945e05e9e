//! # メッセージテンプレート置換
//!
//! `$name` / `${name}` 形式の名前付きプレースホルダを置換する。
//!
//! 応答メッセージの描画に使うため、未知のプレースホルダはエラーに
//! せずそのまま残す。`$$` は `$` 1 文字にエスケープされる。

use std::collections::HashMap;

/// プレースホルダ名として有効な文字か判定する
fn is_placeholder_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// テンプレート中の名前付きプレースホルダを置換する
///
/// - `$name` — 英数字とアンダースコアで構成される名前
/// - `${name}` — 区切りが必要な場合の波括弧形式
/// - `$$` — リテラルの `$`
///
/// `params` に存在しない名前のプレースホルダは原文のまま残す。
pub fn substitute(template: &str, params: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        match chars.peek() {
            Some((_, '$')) => {
                chars.next();
                result.push('$');
            }
            Some((_, '{')) => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                match params.get(&name) {
                    Some(value) if closed => result.push_str(value),
                    _ => {
                        // 未知の名前・閉じ忘れは原文のまま
                        result.push_str("${");
                        result.push_str(&name);
                        if closed {
                            result.push('}');
                        }
                    }
                }
            }
            Some((_, next)) if is_placeholder_char(*next) && !next.is_ascii_digit() => {
                let mut name = String::new();
                while let Some((_, inner)) = chars.peek() {
                    if is_placeholder_char(*inner) {
                        name.push(*inner);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match params.get(&name) {
                    Some(value) => result.push_str(value),
                    None => {
                        result.push('$');
                        result.push_str(&name);
                    }
                }
            }
            _ => result.push('$'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Hello $name", "Hello World")]
    #[case("Hello ${name}", "Hello World")]
    #[case("$name$name", "WorldWorld")]
    #[case("no placeholders", "no placeholders")]
    #[case("$$name", "$name")]
    #[case("total: $count items", "total: 3 items")]
    fn test_プレースホルダ置換(#[case] template: &str, #[case] expected: &str) {
        let params = hashmap! {
            "name".to_string() => "World".to_string(),
            "count".to_string() => "3".to_string(),
        };

        assert_eq!(substitute(template, &params), expected);
    }

    #[test]
    fn test_未知のプレースホルダは原文のまま残る() {
        let params = HashMap::new();

        assert_eq!(substitute("Hello $who", &params), "Hello $who");
        assert_eq!(substitute("Hello ${who}", &params), "Hello ${who}");
    }

    #[test]
    fn test_末尾のドル記号は保持される() {
        let params = HashMap::new();

        assert_eq!(substitute("price: 10$", &params), "price: 10$");
    }
}
