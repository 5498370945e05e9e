//! # オブジェクトツリー翻訳走査
//!
//! レスポンスペイロードに埋め込まれた人間可読文字列を、レスポンス形状に
//! 依存せずに抽出・置換するための汎用走査を提供する。
//!
//! ## 構成
//!
//! - [`visitor`] - ノード種別ごとの訪問インターフェースと具象ビジター
//! - [`walker`] - 任意のビジターを駆動する再帰走査エンジン
//! - [`template`] - `$name` / `${name}` 形式のプレースホルダ置換
//!
//! ## 走査の流れ
//!
//! 1. [`KeyExtractionVisitor`] で翻訳対象文字列の集合を抽出する
//! 2. 上位層が翻訳ストアから対訳を一括取得する
//! 3. [`SubstitutionVisitor`] でツリーを **その場で** 書き換える
//!
//! 翻訳が見つからない文字列は原文のまま残る。これはエラーではない。

pub mod template;
pub mod visitor;
pub mod walker;

pub use visitor::{
    KeyExtractionVisitor, ObjectVisitor, SubstitutionVisitor, TranslationFilter, is_numeric_string,
};
pub use walker::walk;
