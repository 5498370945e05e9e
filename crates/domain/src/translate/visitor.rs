//! # 翻訳ビジター
//!
//! ツリー走査の各ノードで呼び出される訪問インターフェースと、
//! キー抽出・置換の 2 つの具象ビジターを定義する。
//!
//! ## フィルタの意味論
//!
//! [`TranslationFilter`] は除外キー集合（exclusions）と包含キー集合
//! （inclusions）の排他的な組である:
//!
//! - inclusions が非空 → exclusions は **完全に無視** され、
//!   inclusions に含まれないキーがすべて除外される
//! - inclusions が空 → exclusions に含まれるキーが除外される
//!
//! キーはマップの直接の親キーのみが対象となる。シーケンスの添字は
//! フィルタ可能なキーとして扱われない。

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::{Map, Value};

/// オブジェクト階層のビジター
///
/// 3 種類のノード（マップ、シーケンス、文字列リーフ）ごとに訪問メソッドを
/// 持つ。マップ・シーケンスの訪問は配下へ再帰するかどうかを返し、
/// 文字列の訪問は置換値を返せる。
///
/// `key` は直接の親マップにおけるキーであり、ルートおよびシーケンス
/// 要素では `None` が渡される。
pub trait ObjectVisitor {
    /// マップノードを訪問し、エントリへ再帰するかを返す
    fn visit_map(&mut self, key: Option<&str>, map: &Map<String, Value>) -> bool;

    /// シーケンスノードを訪問し、要素へ再帰するかを返す
    fn visit_seq(&mut self, key: Option<&str>, seq: &[Value]) -> bool;

    /// 文字列リーフを訪問し、置換する場合は新しい値を返す
    ///
    /// `value` は末尾空白を除去済みの文字列。`None` を返すと元の値
    /// （末尾空白を含む）がそのまま残る。
    fn visit_str(&mut self, key: Option<&str>, value: &str) -> Option<String>;
}

/// 除外 XOR 包含のキーフィルタ
#[derive(Debug, Clone, Default)]
pub struct TranslationFilter {
    exclusions: HashSet<String>,
    inclusions: HashSet<String>,
}

impl TranslationFilter {
    /// 除外・包含キー集合からフィルタを作成する
    pub fn new(
        exclusions: impl IntoIterator<Item = String>,
        inclusions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            exclusions: exclusions.into_iter().collect(),
            inclusions: inclusions.into_iter().collect(),
        }
    }

    /// 除外キーのみのフィルタを作成する
    pub fn with_exclusions(exclusions: impl IntoIterator<Item = String>) -> Self {
        Self::new(exclusions, [])
    }

    /// 包含キーのみのフィルタを作成する
    pub fn with_inclusions(inclusions: impl IntoIterator<Item = String>) -> Self {
        Self::new([], inclusions)
    }

    /// キーを除外すべきか判定する
    ///
    /// inclusions が非空なら「含まれないキーは除外」、
    /// 空なら「exclusions に含まれるキーは除外」。
    pub fn should_exclude(&self, key: &str) -> bool {
        if self.inclusions.is_empty() {
            self.exclusions.contains(key)
        } else {
            !self.inclusions.contains(key)
        }
    }

    /// ノードのキーが除外対象か判定する（キーなし = 除外されない）
    fn excludes_node(&self, key: Option<&str>) -> bool {
        key.is_some_and(|k| self.should_exclude(k))
    }
}

/// 数字のみで構成される文字列か判定する
///
/// 数字のみの文字列は翻訳対象外（識別子や数量であり自然言語ではない）。
pub fn is_numeric_string(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// 翻訳対象キーを抽出するビジター
///
/// 走査中にツリーを変更せず、翻訳対象となる文字列リーフを重複なく
/// 収集する。集合は決定的な順序（辞書順）で保持され、ストアへの
/// 一括問い合わせにそのまま使える。
#[derive(Debug)]
pub struct KeyExtractionVisitor {
    keys: BTreeSet<String>,
    filter: TranslationFilter,
}

impl KeyExtractionVisitor {
    /// フィルタを指定して抽出ビジターを作成する
    pub fn new(filter: TranslationFilter) -> Self {
        Self {
            keys: BTreeSet::new(),
            filter,
        }
    }

    /// 抽出されたキー集合を取り出す
    pub fn into_keys(self) -> BTreeSet<String> {
        self.keys
    }
}

impl ObjectVisitor for KeyExtractionVisitor {
    fn visit_map(&mut self, key: Option<&str>, _map: &Map<String, Value>) -> bool {
        !self.filter.excludes_node(key)
    }

    fn visit_seq(&mut self, key: Option<&str>, _seq: &[Value]) -> bool {
        !self.filter.excludes_node(key)
    }

    fn visit_str(&mut self, key: Option<&str>, value: &str) -> Option<String> {
        if self.filter.excludes_node(key) {
            tracing::trace!(key = ?key, "除外キーのため抽出をスキップ");
        } else if is_numeric_string(value) {
            tracing::trace!(value, "数字のみの値のため抽出をスキップ");
        } else {
            self.keys.insert(value.to_string());
        }

        // 抽出中はツリーを変更しない
        None
    }
}

/// 対訳でツリーを書き換えるビジター
///
/// 取得済みの対訳マップに基づいて文字列リーフを置換する。
/// 対訳が存在しない文字列は原文のまま残す（エラーではない）。
#[derive(Debug)]
pub struct SubstitutionVisitor {
    translations: HashMap<String, String>,
    filter: TranslationFilter,
}

impl SubstitutionVisitor {
    /// 対訳マップとフィルタから置換ビジターを作成する
    pub fn new(translations: HashMap<String, String>, filter: TranslationFilter) -> Self {
        Self {
            translations,
            filter,
        }
    }
}

impl ObjectVisitor for SubstitutionVisitor {
    fn visit_map(&mut self, key: Option<&str>, _map: &Map<String, Value>) -> bool {
        !self.filter.excludes_node(key)
    }

    fn visit_seq(&mut self, key: Option<&str>, _seq: &[Value]) -> bool {
        !self.filter.excludes_node(key)
    }

    fn visit_str(&mut self, key: Option<&str>, value: &str) -> Option<String> {
        if self.filter.excludes_node(key) {
            return None;
        }

        let translated = self
            .translations
            .get(value)
            .filter(|t| !t.is_empty())
            .map_or_else(|| value.to_string(), ToString::to_string);

        Some(translated)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("12345", true)]
    #[case("0", true)]
    #[case("12a45", false)]
    #[case("", false)]
    #[case("12.5", false)]
    fn test_数字のみ判定(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_numeric_string(value), expected);
    }

    #[test]
    fn test_除外フィルタは該当キーのみ除外する() {
        let filter = TranslationFilter::with_exclusions(["id".to_string(), "name".to_string()]);

        assert!(filter.should_exclude("id"));
        assert!(filter.should_exclude("name"));
        assert!(!filter.should_exclude("title"));
    }

    #[test]
    fn test_包含フィルタが非空なら除外フィルタは完全に無視される() {
        // "title" は両方に現れるが、inclusions が優先される
        let filter = TranslationFilter::new(
            ["title".to_string(), "id".to_string()],
            ["title".to_string()],
        );

        assert!(!filter.should_exclude("title"));
        assert!(filter.should_exclude("id"));
        assert!(filter.should_exclude("anything_else"));
    }

    #[test]
    fn test_抽出ビジターは数字のみの文字列を集めない() {
        let mut visitor = KeyExtractionVisitor::new(TranslationFilter::default());

        visitor.visit_str(Some("count"), "12345");
        visitor.visit_str(Some("label"), "Open");

        let keys = visitor.into_keys();
        assert_eq!(keys, BTreeSet::from(["Open".to_string()]));
    }

    #[test]
    fn test_抽出ビジターは除外キー配下の文字列を集めない() {
        let filter = TranslationFilter::with_exclusions(["id".to_string()]);
        let mut visitor = KeyExtractionVisitor::new(filter);

        visitor.visit_str(Some("id"), "INV-0001");
        visitor.visit_str(Some("status"), "Draft");

        assert_eq!(visitor.into_keys(), BTreeSet::from(["Draft".to_string()]));
    }

    #[test]
    fn test_抽出ビジターは重複を除去する() {
        let mut visitor = KeyExtractionVisitor::new(TranslationFilter::default());

        visitor.visit_str(Some("a"), "Open");
        visitor.visit_str(Some("b"), "Open");

        assert_eq!(visitor.into_keys().len(), 1);
    }

    #[test]
    fn test_置換ビジターは対訳なしの文字列を原文のまま返す() {
        let mut visitor =
            SubstitutionVisitor::new(HashMap::new(), TranslationFilter::default());

        assert_eq!(
            visitor.visit_str(Some("status"), "Open"),
            Some("Open".to_string())
        );
    }

    #[test]
    fn test_置換ビジターは除外キーに対してnoneを返す() {
        let translations = maplit::hashmap! {
            "Open".to_string() => "مفتوح".to_string(),
        };
        let filter = TranslationFilter::with_exclusions(["name".to_string()]);
        let mut visitor = SubstitutionVisitor::new(translations, filter);

        assert_eq!(visitor.visit_str(Some("name"), "Open"), None);
    }

    #[test]
    fn test_置換ビジターは空の対訳を原文扱いにする() {
        let translations = maplit::hashmap! {
            "Open".to_string() => String::new(),
        };
        let mut visitor = SubstitutionVisitor::new(translations, TranslationFilter::default());

        assert_eq!(
            visitor.visit_str(Some("status"), "Open"),
            Some("Open".to_string())
        );
    }
}
